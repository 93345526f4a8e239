//! Aesthetic Tetris: no line clears, the finished stack is judged for looks
//!
//! The run ends when a lock reaches the top row or a spawn is blocked. The
//! board is then scored for left-right symmetry, a smooth skyline, few holes
//! and same-colour neighbours.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer, SwipeTracker};
use crate::renderer::{Align, DrawList, colors, shapes};
use crate::sim::{Board, Countdown, GameRng, Piece, PieceKind, Rect, RunPhase};

const VIEW: Vec2 = Vec2::new(400.0, 720.0);
const CELL: f32 = 30.0;
const BOARD_ORIGIN: Vec2 = Vec2::new(50.0, 60.0);
/// Horizontal nudges tried when a rotation collides
const KICKS: [i32; 3] = [0, -1, 1];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AestheticConfig {
    pub gravity: f32,
    pub symmetry_weight: f32,
    pub smoothness_base: i64,
    pub smoothness_step: i64,
    pub cavity_penalty: i64,
    pub harmony_bonus: i64,
}

impl Default for AestheticConfig {
    fn default() -> Self {
        Self {
            gravity: 0.8,
            symmetry_weight: 200.0,
            smoothness_base: 200,
            smoothness_step: 5,
            cavity_penalty: 10,
            harmony_bonus: 2,
        }
    }
}

/// Breakdown shown on the result screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub symmetry_score: i64,
    pub smoothness_score: i64,
    pub cavity_penalty: i64,
    pub color_harmony_score: i64,
    pub total_score: u64,
    /// Fraction of mirrored cell pairs that agree
    pub symmetry_rate: f32,
    /// Sum of neighbouring column height differences
    pub height_diff: u32,
    pub cavities: u32,
    pub same_color_pairs: u32,
}

pub fn score_board(board: &Board, config: &AestheticConfig) -> ScoreReport {
    let (w, h) = (board.width() as i32, board.height() as i32);

    let mut matching = 0u32;
    let mut compared = 0u32;
    for y in 0..h {
        for x in 0..w / 2 {
            if board.is_occupied(x, y) == board.is_occupied(w - 1 - x, y) {
                matching += 1;
            }
            compared += 1;
        }
    }
    let symmetry_rate = if compared == 0 {
        0.0
    } else {
        matching as f32 / compared as f32
    };
    let symmetry_score = (symmetry_rate * config.symmetry_weight).floor() as i64;

    let heights = board.column_heights();
    let height_diff: u32 = heights
        .windows(2)
        .map(|p| p[0].abs_diff(p[1]) as u32)
        .sum();
    let smoothness_score = (config.smoothness_base - height_diff as i64 * config.smoothness_step).max(0);

    let mut cavities = 0u32;
    for x in 0..w {
        let mut covered = false;
        for y in 0..h {
            if board.is_occupied(x, y) {
                covered = true;
            } else if covered {
                cavities += 1;
            }
        }
    }
    let cavity_penalty = cavities as i64 * config.cavity_penalty;

    let mut same_color_pairs = 0u32;
    for y in 0..h {
        for x in 0..w {
            let Some(Some(kind)) = board.get(x, y) else {
                continue;
            };
            if board.get(x + 1, y) == Some(Some(kind)) {
                same_color_pairs += 1;
            }
            if board.get(x, y + 1) == Some(Some(kind)) {
                same_color_pairs += 1;
            }
        }
    }
    let color_harmony_score = same_color_pairs as i64 * config.harmony_bonus;

    let total = (symmetry_score + smoothness_score - cavity_penalty + color_harmony_score).max(0);
    ScoreReport {
        symmetry_score,
        smoothness_score,
        cavity_penalty,
        color_harmony_score,
        total_score: total as u64,
        symmetry_rate,
        height_diff,
        cavities,
        same_color_pairs,
    }
}

#[derive(Debug, Clone)]
pub struct AestheticState {
    pub config: AestheticConfig,
    pub phase: RunPhase,
    pub board: Board,
    pub current: Option<Piece>,
    pub report: Option<ScoreReport>,
    pub best: u64,
    pub events: Vec<GameEvent>,
    gravity: Countdown,
    swipe: SwipeTracker,
    rng: GameRng,
}

impl AestheticState {
    pub fn new(config: AestheticConfig, seed: u64) -> Self {
        Self {
            config,
            phase: RunPhase::Title,
            board: Board::default(),
            current: None,
            report: None,
            best: 0,
            events: Vec::new(),
            gravity: Countdown::idle(),
            swipe: SwipeTracker::default(),
            rng: GameRng::new(seed),
        }
    }

    pub fn start(&mut self) {
        self.board.clear();
        self.report = None;
        self.current = None;
        self.phase = RunPhase::Playing;
        self.events.push(GameEvent::Start);
        self.spawn();
        self.gravity.start(self.config.gravity);
    }

    fn spawn(&mut self) {
        let kind = self.rng.pick(&PieceKind::STANDARD).unwrap_or(PieceKind::T);
        let piece = Piece::spawn(kind, self.board.width());
        if self.board.collides(&piece.shape, piece.x, piece.y) {
            self.finish();
        } else {
            self.current = Some(piece);
        }
    }

    fn finish(&mut self) {
        let report = score_board(&self.board, &self.config);
        self.current = None;
        self.phase = RunPhase::GameOver;
        self.gravity.stop();
        self.best = self.best.max(report.total_score);
        self.report = Some(report);
        self.events.push(GameEvent::GameOver);
        log::info!(
            "aesthetic: total {} (sym {}, smooth {}, holes -{}, harmony {})",
            report.total_score,
            report.symmetry_score,
            report.smoothness_score,
            report.cavity_penalty,
            report.color_harmony_score
        );
    }

    fn place(&mut self) {
        let Some(piece) = self.current.take() else {
            return;
        };
        self.board.lock(&piece);
        self.events.push(GameEvent::Lock);
        if self.board.row_has_block(0) {
            self.finish();
        } else {
            self.spawn();
        }
    }

    pub fn shift(&mut self, dx: i32, dy: i32) {
        if self.phase != RunPhase::Playing {
            return;
        }
        let Some(piece) = self.current.as_mut() else {
            return;
        };
        if piece.try_shift(&self.board, dx, dy) {
            if dx != 0 {
                self.events.push(GameEvent::Move);
            }
        } else if dy > 0 {
            self.place();
        }
    }

    pub fn rotate(&mut self) {
        if self.phase != RunPhase::Playing {
            return;
        }
        let rotated = match self.current.as_mut() {
            Some(piece) => piece.try_rotate(&self.board, &KICKS),
            None => false,
        };
        if rotated {
            self.events.push(GameEvent::Rotate);
        }
    }
}

pub fn tick(state: &mut AestheticState, dt: f32) {
    if state.phase != RunPhase::Playing {
        return;
    }
    if state.gravity.tick(dt) {
        state.shift(0, 1);
        if state.phase == RunPhase::Playing {
            state.gravity.start(state.config.gravity);
        }
    }
}

pub fn draw(state: &AestheticState, list: &mut DrawList) {
    list.label(Vec2::new(VIEW.x * 0.5, 28.0), "AESTHETIC TETRIS", 20.0, colors::ACCENT);
    shapes::board(list, &state.board, BOARD_ORIGIN, CELL);
    // Mirror axis
    let axis_x = BOARD_ORIGIN.x + state.board.width() as f32 * CELL * 0.5;
    list.line(
        Vec2::new(axis_x, BOARD_ORIGIN.y),
        Vec2::new(axis_x, BOARD_ORIGIN.y + state.board.height() as f32 * CELL),
        [1.0, 1.0, 1.0, 0.12],
        1.0,
    );
    if let Some(piece) = &state.current {
        shapes::piece(list, piece, BOARD_ORIGIN, CELL);
    }

    match state.phase {
        RunPhase::Title => shapes::banner(
            list,
            "AESTHETIC TETRIS",
            &["Build something beautiful".to_string(), "Tap to start".to_string()],
        ),
        RunPhase::GameOver => {
            if let Some(r) = &state.report {
                let panel = Rect::new(30.0, 160.0, VIEW.x - 60.0, 360.0);
                list.rect(Rect::new(0.0, 0.0, VIEW.x, VIEW.y), colors::OVERLAY);
                list.rect(panel, [0.1, 0.1, 0.15, 0.95]);
                list.outline(panel, colors::ACCENT, 2.0);
                list.label(Vec2::new(VIEW.x * 0.5, 200.0), "RESULT", 30.0, colors::TEXT);
                let rows = [
                    (
                        format!("Symmetry ({}%)", (r.symmetry_rate * 100.0).round() as u32),
                        format!("+{}", r.symmetry_score),
                    ),
                    (
                        format!("Smoothness (Δ{})", r.height_diff),
                        format!("+{}", r.smoothness_score),
                    ),
                    (format!("Cavities ({})", r.cavities), format!("-{}", r.cavity_penalty)),
                    (
                        format!("Harmony ({} pairs)", r.same_color_pairs),
                        format!("+{}", r.color_harmony_score),
                    ),
                ];
                for (i, (name, value)) in rows.iter().enumerate() {
                    let y = 260.0 + i as f32 * 40.0;
                    list.text(Vec2::new(50.0, y), name.as_str(), 16.0, colors::DIM, Align::Left);
                    list.text(Vec2::new(VIEW.x - 50.0, y), value.as_str(), 16.0, colors::TEXT, Align::Right);
                }
                list.label(
                    Vec2::new(VIEW.x * 0.5, 450.0),
                    format!("TOTAL {}", r.total_score),
                    32.0,
                    colors::COIN,
                );
                list.label(Vec2::new(VIEW.x * 0.5, 495.0), "Tap to retry", 14.0, colors::DIM);
            }
        }
        RunPhase::Playing => {}
    }
}

impl Game for AestheticState {
    fn kind(&self) -> GameKind {
        GameKind::Aesthetic
    }

    fn phase(&self) -> RunPhase {
        self.phase
    }

    fn press(&mut self, action: Action) {
        if !self.phase.is_playing() {
            if action == Action::Confirm {
                self.start();
            }
            return;
        }
        match action {
            Action::Left => self.shift(-1, 0),
            Action::Right => self.shift(1, 0),
            Action::Down => self.shift(0, 1),
            Action::Up | Action::Rotate | Action::Confirm => self.rotate(),
            _ => {}
        }
    }

    fn pointer(&mut self, pointer: Pointer) {
        match pointer {
            Pointer::Down(pos) => {
                if self.phase.is_playing() {
                    self.swipe.begin(pos);
                } else {
                    self.start();
                }
            }
            Pointer::Up(pos) => {
                if let Some(action) = self.swipe.end(pos) {
                    // Tap rotates, swipes move
                    self.press(if action == Action::Confirm { Action::Rotate } else { action });
                }
            }
            Pointer::Move(_) => {}
        }
    }

    fn tick(&mut self, dt: f32) {
        tick(self, dt);
    }

    fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn hud(&self) -> Hud {
        let score = self.report.map(|r| r.total_score).unwrap_or(0);
        Hud {
            score,
            best: self.best,
            info: format!("{} blocks", self.board.filled_count()),
            message: self.report.map(|r| format!("Total {}", r.total_score)),
        }
    }

    fn draw(&self, list: &mut DrawList) {
        draw(self, list);
    }

    fn view_size(&self) -> Vec2 {
        VIEW
    }

    fn final_score(&self) -> u64 {
        self.report.map(|r| r.total_score).unwrap_or(0)
    }

    fn set_best(&mut self, best: u64) {
        self.best = self.best.max(best);
    }

    fn autoplay(&mut self) {
        if !self.phase.is_playing() {
            self.start();
            return;
        }
        // Nudge toward the lowest column so the skyline stays flat
        let heights = self.board.column_heights();
        let Some(piece) = &self.current else {
            return;
        };
        let target = heights
            .iter()
            .enumerate()
            .min_by_key(|&(_, h)| *h)
            .map(|(x, _)| x as i32)
            .unwrap_or(0);
        let min_col = piece.cells().map(|(x, _)| x).min().unwrap_or(0);
        if min_col < target {
            self.shift(1, 0);
        } else if min_col > target {
            self.shift(-1, 0);
        } else {
            self.shift(0, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn fill(board: &mut Board, cells: &[(i32, i32)], kind: PieceKind) {
        for &(x, y) in cells {
            board.set(x, y, Some(kind));
        }
    }

    #[test]
    fn test_empty_board_scores_perfectly_symmetric() {
        let r = score_board(&Board::default(), &AestheticConfig::default());
        assert_eq!(r.symmetry_score, 200);
        assert_eq!(r.smoothness_score, 200);
        assert_eq!(r.cavity_penalty, 0);
        assert_eq!(r.color_harmony_score, 0);
        assert_eq!(r.total_score, 400);
    }

    #[test]
    fn test_report_components() {
        let mut b = Board::default();
        // Column 0 two high with a hole between, column 9 one high
        fill(&mut b, &[(0, 17), (0, 19)], PieceKind::T);
        fill(&mut b, &[(9, 19), (8, 19)], PieceKind::S);
        let r = score_board(&b, &AestheticConfig::default());
        // Rows 17 and 19 disagree once each out of 100 pairs: row 19 has (0,9)
        // matched and (1,8) mismatched; row 17 has (0,9) mismatched.
        assert_eq!(r.symmetry_score, 196);
        // Heights 3,0,...,0,1,1: diffs 3 + 1 = 4
        assert_eq!(r.height_diff, 4);
        assert_eq!(r.smoothness_score, 180);
        assert_eq!(r.cavities, 1);
        assert_eq!(r.cavity_penalty, 10);
        // (8,19)-(9,19) share a kind
        assert_eq!(r.same_color_pairs, 1);
        assert_eq!(r.total_score, 196 + 180 - 10 + 2);
    }

    #[test]
    fn test_total_never_negative() {
        let mut b = Board::default();
        // Checkerboard of holes in the left half
        for y in (1..20).step_by(2) {
            for x in 0..5 {
                b.set(x, y, Some(PieceKind::Z));
            }
        }
        for x in 0..5 {
            b.set(x, 0, Some(PieceKind::L));
        }
        let r = score_board(&b, &AestheticConfig::default());
        assert!(r.cavity_penalty > 0);
        assert!(r.total_score < 400);
    }

    #[test]
    fn test_lock_on_top_row_ends_run() {
        let mut s = AestheticState::new(AestheticConfig::default(), 1);
        s.start();
        let mut o = Piece::spawn(PieceKind::O, 10);
        o.x = 0;
        o.y = 0;
        fill(&mut s.board, &[(0, 2), (1, 2)], PieceKind::J);
        s.current = Some(o);
        s.shift(0, 1);
        assert_eq!(s.phase, RunPhase::GameOver);
        assert!(s.report.is_some());
        assert_eq!(s.final_score(), s.report.unwrap().total_score);
    }

    #[test]
    fn test_rotation_kicks_off_wall() {
        let mut s = AestheticState::new(AestheticConfig::default(), 2);
        s.start();
        let mut t = Piece::spawn(PieceKind::T, 10);
        // Vertical T hugging the left wall: its flat side sits on column 0
        t.shape = t.shape.rotated_cw();
        t.x = -1;
        t.y = 5;
        assert!(!s.board.collides(&t.shape, t.x, t.y));
        s.current = Some(t);
        s.rotate();
        let p = s.current.as_ref().unwrap();
        assert_eq!(p.x, 0);
    }

    #[test]
    fn test_no_lines_are_cleared() {
        let mut s = AestheticState::new(AestheticConfig::default(), 3);
        s.start();
        for x in 0..8 {
            s.board.set(x, 19, Some(PieceKind::I));
        }
        let mut o = Piece::spawn(PieceKind::O, 10);
        o.x = 8;
        o.y = 16;
        s.current = Some(o);
        for _ in 0..5 {
            s.shift(0, 1);
        }
        assert!(s.board.is_row_full(19));
    }

    #[test]
    fn test_gravity_ticks() {
        let mut s = AestheticState::new(AestheticConfig::default(), 4);
        s.start();
        let y0 = s.current.as_ref().unwrap().y;
        for _ in 0..96 {
            tick(&mut s, SIM_DT);
        }
        assert_eq!(s.current.as_ref().unwrap().y, y0 + 2);
    }
}
