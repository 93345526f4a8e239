//! Pull Tetris: drag a waiting piece, let go, and watch where it lands
//!
//! Pixel space with y growing down. Launched pieces fly under gravity and
//! collide one axis at a time with the walls, the floor and settled minos.
//! A piece that stays still long enough snaps onto the 30 px grid and breaks
//! up into minos, which then clear in full rows like ordinary tetris.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer};
use crate::renderer::draw::with_alpha;
use crate::renderer::shapes::{self, piece_color};
use crate::renderer::{Align, DrawList, colors};
use crate::sim::{Board, Countdown, GameRng, IdGen, PieceKind, Rect, RunPhase};

pub const FIELD_WIDTH: f32 = 360.0;
pub const CELL: f32 = 30.0;
pub const COLUMNS: usize = 12;

/// Mino hitbox shrink on each side, keeps resting pieces from snagging
const SKIN: f32 = 0.5;
const MIN_ROWS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullConfig {
    /// Field height in px, rounded down to whole rows
    pub height: f32,
    /// px/frame²
    pub gravity: f32,
    /// Launch velocity (px/frame) per px dragged
    pub launch_scale: f32,
    pub max_speed: f32,
    pub restitution: f32,
    /// Horizontal speed lost on each floor contact
    pub ground_drag: f32,
    /// Below this speed (px/frame) a piece counts as still
    pub rest_speed: f32,
    pub settle_frames: u32,
    /// Holding a drag longer than this drops the piece
    pub hold_timeout: f32,
    /// A settled mino centred above this line ends the run
    pub top_line: f32,
    /// Pieces this far below the floor are gone
    pub discard_margin: f32,
    pub line_points: u64,
    pub max_batch: u32,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            height: 640.0,
            gravity: 0.28,
            launch_scale: 0.08,
            max_speed: 24.0,
            restitution: 0.2,
            ground_drag: 0.5,
            rest_speed: 0.15,
            settle_frames: 40,
            hold_timeout: 1.0,
            top_line: 120.0,
            discard_margin: 100.0,
            line_points: 100,
            max_batch: 4,
        }
    }
}

/// A tetromino outside the grid, either waiting at the top or in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullPiece {
    pub id: u32,
    pub kind: PieceKind,
    /// Centre of the bounding box
    pub pos: Vec2,
    /// px/frame
    pub vel: Vec2,
    /// Mino centres relative to `pos`, in cells
    offsets: Vec<Vec2>,
    still_frames: u32,
}

impl PullPiece {
    pub fn new(id: u32, kind: PieceKind, pos: Vec2) -> Self {
        let cells: Vec<(i32, i32)> = kind.shape().offsets().collect();
        let (min, max) = cells.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(min, max), &(c, r)| {
                let p = Vec2::new(c as f32, r as f32);
                (min.min(p), max.max(p))
            },
        );
        let centre = (min + max + Vec2::ONE) * 0.5;
        let offsets = cells
            .iter()
            .map(|&(c, r)| Vec2::new(c as f32 + 0.5, r as f32 + 0.5) - centre)
            .collect();
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            offsets,
            still_frames: 0,
        }
    }

    /// Mino centres in field coordinates
    pub fn minos(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.offsets.iter().map(move |o| self.pos + *o * CELL)
    }

    /// Distance from `pos` to the outer edge of the widest mino
    pub fn half_width(&self) -> f32 {
        self.offsets.iter().map(|o| o.x.abs()).fold(0.0, f32::max) * CELL + CELL * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.minos()
            .any(|c| Rect::from_center(c, Vec2::splat(CELL)).contains(p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullStage {
    Playing,
    GameOver,
}

#[derive(Debug, Clone)]
pub struct Drag {
    pub piece: u32,
    pub start: Vec2,
    pub current: Vec2,
    hold: Countdown,
}

impl Drag {
    pub fn vector(&self) -> Vec2 {
        self.current - self.start
    }
}

#[derive(Debug, Clone)]
pub struct PullState {
    pub config: PullConfig,
    pub stage: PullStage,
    pub score: u64,
    pub best: u64,
    /// Settled minos, cell (c, r) spans [c*30, c*30+30) × [r*30, r*30+30)
    pub board: Board,
    pub waiting: Vec<PullPiece>,
    pub flying: Vec<PullPiece>,
    /// Kind that leads the next batch
    pub next: PieceKind,
    pub drag: Option<Drag>,
    pub events: Vec<GameEvent>,
    rng: GameRng,
    ids: IdGen,
}

fn rows_for(height: f32) -> usize {
    ((height / CELL).floor().max(0.0) as usize).max(MIN_ROWS)
}

impl PullState {
    pub fn new(config: PullConfig, seed: u64) -> Self {
        let mut rng = GameRng::new(seed);
        let next = rng.pick(&PieceKind::STANDARD).unwrap_or(PieceKind::T);
        let board = Board::new(COLUMNS, rows_for(config.height));
        let mut state = Self {
            config,
            stage: PullStage::Playing,
            score: 0,
            best: 0,
            board,
            waiting: Vec::new(),
            flying: Vec::new(),
            next,
            drag: None,
            events: Vec::new(),
            rng,
            ids: IdGen::default(),
        };
        state.spawn_batch();
        state
    }

    pub fn field_height(&self) -> f32 {
        self.board.height() as f32 * CELL
    }

    pub fn reset(&mut self) {
        self.board = Board::new(COLUMNS, rows_for(self.config.height));
        self.stage = PullStage::Playing;
        self.score = 0;
        self.waiting.clear();
        self.flying.clear();
        self.drag = None;
        self.events.push(GameEvent::Start);
        self.spawn_batch();
        log::info!("pull_tetris: new run, {} rows", self.board.height());
    }

    /// Line up 1 to `max_batch` pieces across the top, led by the announced kind
    pub fn spawn_batch(&mut self) {
        self.drag = None;
        let count = self.rng.range_u32(1, self.config.max_batch.max(1));
        let segment = FIELD_WIDTH / count as f32;
        for i in 0..count {
            let kind = if i == 0 {
                self.next
            } else {
                self.rng.pick(&PieceKind::STANDARD).unwrap_or(PieceKind::O)
            };
            let pos = Vec2::new(segment * (i as f32 + 0.5), 100.0 + (i % 2) as f32 * 70.0);
            let id = self.ids.next_id();
            let mut piece = PullPiece::new(id, kind, pos);
            let half = piece.half_width();
            piece.pos.x = piece.pos.x.clamp(half, FIELD_WIDTH - half);
            self.waiting.push(piece);
        }
        self.next = self.rng.pick(&PieceKind::STANDARD).unwrap_or(PieceKind::T);
        log::debug!("pull_tetris: batch of {}, next {:?}", count, self.next);
    }

    pub fn grab(&mut self, pos: Vec2) {
        if self.stage != PullStage::Playing || self.drag.is_some() {
            return;
        }
        if let Some(piece) = self.waiting.iter().find(|p| p.contains(pos)) {
            self.drag = Some(Drag {
                piece: piece.id,
                start: pos,
                current: pos,
                hold: Countdown::new(self.config.hold_timeout),
            });
        }
    }

    pub fn pull(&mut self, pos: Vec2) {
        if let Some(drag) = self.drag.as_mut() {
            drag.current = pos;
        }
    }

    /// Let go: the piece flies along the drag vector
    pub fn release(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let mut vel = drag.vector() * self.config.launch_scale;
        vel = vel.clamp_length_max(self.config.max_speed);
        self.launch(drag.piece, vel);
        self.events.push(GameEvent::Shoot);
    }

    fn launch(&mut self, id: u32, vel: Vec2) {
        if let Some(i) = self.waiting.iter().position(|p| p.id == id) {
            let mut piece = self.waiting.remove(i);
            piece.vel = vel;
            self.flying.push(piece);
        }
    }

    /// Would a piece with these mino offsets overlap anything at `pos`?
    fn blocked(&self, offsets: &[Vec2], pos: Vec2) -> bool {
        let floor = self.field_height();
        offsets.iter().any(|o| {
            let r = Rect::from_center(pos + *o * CELL, Vec2::splat(CELL - 2.0 * SKIN));
            if r.x < 0.0 || r.right() > FIELD_WIDTH || r.bottom() > floor {
                return true;
            }
            let (c0, c1) = ((r.x / CELL).floor() as i32, (r.right() / CELL).floor() as i32);
            let (r0, r1) = ((r.y / CELL).floor() as i32, (r.bottom() / CELL).floor() as i32);
            (r0..=r1).any(|y| (c0..=c1).any(|x| self.board.is_occupied(x, y)))
        })
    }

    /// Move along one axis in sub-pixel steps, stopping at first contact.
    /// Returns whether something was hit.
    fn sweep(&self, piece: &mut PullPiece, delta: Vec2) -> bool {
        let steps = delta.abs().max_element().ceil().max(1.0) as u32;
        let step = delta / steps as f32;
        for _ in 0..steps {
            let next = piece.pos + step;
            if self.blocked(&piece.offsets, next) {
                return true;
            }
            piece.pos = next;
        }
        false
    }

    fn step_piece(&self, piece: &mut PullPiece, frames: f32) {
        let cfg = &self.config;
        piece.vel.y += cfg.gravity * frames;
        piece.vel = piece.vel.clamp_length_max(cfg.max_speed);
        if self.sweep(piece, Vec2::new(piece.vel.x * frames, 0.0)) {
            piece.vel.x = -piece.vel.x * cfg.restitution;
        }
        if self.sweep(piece, Vec2::new(0.0, piece.vel.y * frames)) {
            if piece.vel.y > 0.0 {
                piece.vel.x *= 1.0 - cfg.ground_drag;
            }
            piece.vel.y = -piece.vel.y * cfg.restitution;
        }
    }

    /// Snap a resting piece onto the grid and break it into minos
    fn settle(&mut self, mut piece: PullPiece) {
        let first = piece.minos().next().unwrap_or(piece.pos);
        let snapped = ((first - CELL * 0.5) / CELL).round() * CELL + CELL * 0.5;
        piece.pos += snapped - first;

        let mut above_field = false;
        for c in piece.minos() {
            let col = ((c.x - CELL * 0.5) / CELL).round() as i32;
            let row = ((c.y - CELL * 0.5) / CELL).round() as i32;
            if row < 0 {
                above_field = true;
            } else if !self.board.is_occupied(col, row) {
                self.board.set(col, row, Some(piece.kind));
            }
        }
        self.events.push(GameEvent::Snap);

        let cleared = self.board.clear_full_rows();
        if cleared > 0 {
            self.score += cleared as u64 * self.config.line_points;
            self.events.push(GameEvent::LineClear(cleared));
            log::debug!("pull_tetris: cleared {} rows", cleared);
        }

        if above_field || self.topped_out() {
            self.game_over();
        }
    }

    fn topped_out(&self) -> bool {
        (0..self.board.height())
            .filter(|&y| (y as f32 + 0.5) * CELL < self.config.top_line)
            .any(|y| self.board.row_has_block(y))
    }

    fn game_over(&mut self) {
        self.stage = PullStage::GameOver;
        self.drag = None;
        self.best = self.best.max(self.score);
        self.events.push(GameEvent::GameOver);
        log::info!("pull_tetris: game over, score {}", self.score);
    }

    fn drop_held(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.launch(drag.piece, Vec2::ZERO);
        }
    }
}

pub fn tick(state: &mut PullState, dt: f32) {
    if state.stage != PullStage::Playing {
        return;
    }
    let frames = dt * 60.0;

    let expired = state.drag.as_mut().is_some_and(|d| d.hold.tick(dt));
    if expired {
        state.drop_held();
    }
    let dragging = state.drag.is_some();

    let floor = state.field_height();
    let mut resting = Vec::new();
    let mut discarded = false;
    let mut flying = std::mem::take(&mut state.flying);
    flying.retain_mut(|piece| {
        state.step_piece(piece, frames);
        if piece.pos.y > floor + state.config.discard_margin {
            discarded = true;
            log::debug!("pull_tetris: piece {} fell out", piece.id);
            return false;
        }
        // Settling waits while the player is aiming
        if dragging {
            return true;
        }
        if piece.vel.length() < state.config.rest_speed {
            piece.still_frames += 1;
        } else {
            piece.still_frames = 0;
        }
        if piece.still_frames >= state.config.settle_frames {
            resting.push(piece.clone());
            return false;
        }
        true
    });
    state.flying = flying;

    let landed = !resting.is_empty();
    for piece in resting {
        state.settle(piece);
        if state.stage != PullStage::Playing {
            return;
        }
    }
    if (landed || discarded) && state.waiting.is_empty() {
        state.spawn_batch();
    }
}

fn draw_piece(list: &mut DrawList, piece: &PullPiece, alpha: f32) {
    let color = with_alpha(piece_color(piece.kind), alpha);
    for c in piece.minos() {
        list.rect(Rect::from_center(c, Vec2::splat(CELL)).inset(1.0), color);
    }
}

pub fn draw(state: &PullState, list: &mut DrawList) {
    list.clear = [0.12, 0.16, 0.23, 1.0];
    shapes::board(list, &state.board, Vec2::ZERO, CELL);
    list.line(
        Vec2::new(0.0, state.config.top_line),
        Vec2::new(FIELD_WIDTH, state.config.top_line),
        with_alpha(colors::BAD, 0.5),
        2.0,
    );

    for piece in &state.waiting {
        let held = state.drag.as_ref().is_some_and(|d| d.piece == piece.id);
        draw_piece(list, piece, if held { 1.0 } else { 0.85 });
    }
    for piece in &state.flying {
        draw_piece(list, piece, 1.0);
    }

    if let Some(drag) = &state.drag {
        list.line(drag.start, drag.current, with_alpha(colors::TEXT, 0.7), 2.0);
        list.line(drag.start, drag.start + drag.vector(), colors::COIN, 3.0);
        list.circle(drag.start, 4.0, colors::BAD);
    }

    list.text(Vec2::new(12.0, 28.0), format!("Score: {}", state.score), 20.0, colors::TEXT, Align::Left);
    list.text(
        Vec2::new(FIELD_WIDTH - 12.0, 28.0),
        format!("Next: {:?}", state.next),
        14.0,
        colors::DIM,
        Align::Right,
    );

    if state.stage == PullStage::GameOver {
        shapes::banner(
            list,
            "GAME OVER",
            &[format!("Score: {}", state.score), "Tap to try again".to_string()],
        );
    }
}

impl Game for PullState {
    fn kind(&self) -> GameKind {
        GameKind::PullTetris
    }

    fn phase(&self) -> RunPhase {
        match self.stage {
            PullStage::Playing => RunPhase::Playing,
            PullStage::GameOver => RunPhase::GameOver,
        }
    }

    fn press(&mut self, action: Action) {
        if self.stage == PullStage::GameOver && action == Action::Confirm {
            self.reset();
        }
    }

    fn pointer(&mut self, pointer: Pointer) {
        match (self.stage, pointer) {
            (PullStage::GameOver, Pointer::Down(_)) => self.reset(),
            (PullStage::Playing, Pointer::Down(pos)) => self.grab(pos),
            (_, Pointer::Move(pos)) => self.pull(pos),
            (_, Pointer::Up(pos)) => {
                self.pull(pos);
                self.release();
            }
        }
    }

    fn tick(&mut self, dt: f32) {
        tick(self, dt);
    }

    fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            best: self.best,
            info: format!("Next: {:?}", self.next),
            message: None,
        }
    }

    fn draw(&self, list: &mut DrawList) {
        draw(self, list);
    }

    fn view_size(&self) -> Vec2 {
        Vec2::new(FIELD_WIDTH, self.field_height())
    }

    /// Height follows the screen's aspect ratio; a field with settled minos
    /// keeps its rows until the next run.
    fn resize(&mut self, size: Vec2) {
        if size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        self.config.height = (size.y * FIELD_WIDTH / size.x).clamp(MIN_ROWS as f32 * CELL, 960.0);
        let rows = rows_for(self.config.height);
        if rows != self.board.height() && self.board.filled_count() == 0 && self.flying.is_empty() {
            self.board = Board::new(COLUMNS, rows);
        }
    }

    fn final_score(&self) -> u64 {
        self.score
    }

    fn set_best(&mut self, best: u64) {
        self.best = self.best.max(best);
    }

    /// Aim the first waiting piece at the lowest column
    fn autoplay(&mut self) {
        if self.stage == PullStage::GameOver {
            self.reset();
            return;
        }
        if self.drag.is_some() || !self.flying.is_empty() {
            return;
        }
        let Some(piece) = self.waiting.first() else {
            return;
        };
        let heights = self.board.column_heights();
        let target = heights
            .iter()
            .enumerate()
            .min_by_key(|&(_, h)| *h)
            .map(|(x, _)| x)
            .unwrap_or(0);
        let target_x = (target as f32 + 0.5) * CELL;
        let grab = piece.minos().next().unwrap_or(piece.pos);
        let aim = Vec2::new((target_x - piece.pos.x) * 0.15, 0.0);
        self.grab(grab);
        self.pull(grab + aim);
        self.release();
    }
}
