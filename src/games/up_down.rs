//! Up Down Choice: sort falling numbers by parity
//!
//! Even numbers go left, odd numbers go right. Blocks fall in the centre lane
//! until the player flicks them; whatever reaches the judgement zone is scored.
//! Positions are in percent of the play field so the game scales with it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer, SWIPE_THRESHOLD};
use crate::renderer::draw::with_alpha;
use crate::renderer::{Align, Color, DrawList, colors, shapes};
use crate::sim::{Countdown, GameRng, IdGen, Rect, RunPhase};

const VIEW: Vec2 = Vec2::new(480.0, 800.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpDownConfig {
    /// Fall speed in percent of the field per frame
    pub initial_speed: f32,
    pub max_speed: f32,
    pub speed_step: f32,
    /// Spawn interval before speed is taken off, seconds
    pub spawn_interval: f32,
    pub min_spawn_interval: f32,
    pub max_misses: u32,
    /// Height of the judgement zone, percent
    pub zone_height: f32,
    /// Block edge, percent of field width
    pub block_size: f32,
    pub countdown_from: u32,
    pub shake_time: f32,
    /// Blocks are dropped once they pass this, percent
    pub despawn_y: f32,
}

impl Default for UpDownConfig {
    fn default() -> Self {
        Self {
            initial_speed: 0.3,
            max_speed: 1.5,
            speed_step: 0.005,
            spawn_interval: 2.0,
            min_spawn_interval: 0.5,
            max_misses: 3,
            zone_height: 20.0,
            block_size: 15.0,
            countdown_from: 3,
            shake_time: 0.3,
            despawn_y: 120.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Center,
    Right,
}

impl Lane {
    /// Lane centre as a fraction of field width
    pub fn fraction(&self) -> f32 {
        match self {
            Lane::Left => 0.25,
            Lane::Center => 0.5,
            Lane::Right => 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockStatus {
    Falling,
    Success,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    pub value: u32,
    pub lane: Lane,
    /// Top edge, percent of field height
    pub y: f32,
    pub status: BlockStatus,
}

impl Block {
    pub fn is_even(&self) -> bool {
        self.value % 2 == 0
    }

    /// Even-left and odd-right are the only correct placements
    pub fn is_correct(&self) -> bool {
        match self.lane {
            Lane::Left => self.is_even(),
            Lane::Right => !self.is_even(),
            Lane::Center => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub size: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Title,
    Countdown(u32),
    Playing,
    GameOver,
}

#[derive(Debug, Clone)]
pub struct UpDownState {
    pub config: UpDownConfig,
    pub stage: Stage,
    pub score: u64,
    pub best: u64,
    pub misses: u32,
    pub combo: u32,
    pub speed: f32,
    pub blocks: Vec<Block>,
    pub particles: Vec<Particle>,
    pub shake: Countdown,
    pub events: Vec<GameEvent>,
    beat: Countdown,
    spawn: Countdown,
    swipe_from: Option<Vec2>,
    rng: GameRng,
    ids: IdGen,
}

impl UpDownState {
    pub fn new(config: UpDownConfig, seed: u64) -> Self {
        Self {
            speed: config.initial_speed,
            config,
            stage: Stage::Title,
            score: 0,
            best: 0,
            misses: 0,
            combo: 0,
            blocks: Vec::new(),
            particles: Vec::new(),
            shake: Countdown::idle(),
            events: Vec::new(),
            beat: Countdown::idle(),
            spawn: Countdown::idle(),
            swipe_from: None,
            rng: GameRng::new(seed),
            ids: IdGen::default(),
        }
    }

    pub fn start(&mut self) {
        self.stage = Stage::Countdown(self.config.countdown_from);
        self.score = 0;
        self.misses = 0;
        self.combo = 0;
        self.speed = self.config.initial_speed;
        self.blocks.clear();
        self.particles.clear();
        self.shake.stop();
        self.spawn.stop();
        self.ids = IdGen::default();
        self.beat.start(1.0);
        self.events.push(GameEvent::Count);
        log::info!("up-down: countdown");
    }

    pub fn spawn_interval(&self) -> f32 {
        (self.config.spawn_interval - self.speed).max(self.config.min_spawn_interval)
    }

    fn spawn_block(&mut self) {
        let id = self.ids.next_id();
        let value = self.rng.range_u32(1, 100);
        self.blocks.push(Block {
            id,
            value,
            lane: Lane::Center,
            y: -10.0,
            status: BlockStatus::Falling,
        });
        log::debug!("up-down: block {} = {}", id, value);
    }

    /// Top edge where judgement happens
    pub fn zone_top(&self) -> f32 {
        100.0 - self.config.zone_height
    }

    /// Flick the lowest undecided block above the zone
    pub fn flick(&mut self, lane: Lane) {
        if self.stage != Stage::Playing {
            return;
        }
        let zone = self.zone_top();
        let target = self
            .blocks
            .iter_mut()
            .filter(|b| b.status == BlockStatus::Falling && b.y < zone)
            .max_by(|a, b| a.y.total_cmp(&b.y));
        if let Some(block) = target {
            block.lane = lane;
            self.events.push(GameEvent::Move);
        }
    }

    fn burst(&mut self, lane: Lane, success: bool) {
        let origin = Vec2::new(VIEW.x * lane.fraction(), VIEW.y * (1.0 - self.config.zone_height / 100.0));
        let (count, top_speed, palette) = if success {
            (30, 5.0, [colors::GOOD, colors::TEXT])
        } else {
            (50, 8.0, [colors::BAD, [0.72, 0.11, 0.11, 1.0]])
        };
        for _ in 0..count {
            let angle = self.rng.range_f32(0.0, std::f32::consts::TAU);
            let speed = self.rng.range_f32(2.0, 2.0 + top_speed);
            let color = palette[self.rng.index(2)];
            let size = self.rng.range_f32(2.0, 6.0);
            self.particles.push(Particle {
                pos: origin,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life: 1.0,
                size,
                color,
            });
        }
    }

    fn game_over(&mut self) {
        self.stage = Stage::GameOver;
        self.events.push(GameEvent::GameOver);
        log::info!("up-down: game over, score {}", self.score);
    }
}

pub fn tick(state: &mut UpDownState, dt: f32) {
    let frames = dt * 60.0;

    for p in &mut state.particles {
        p.pos += p.vel * frames;
        p.vel.y += 0.1 * frames;
        p.life -= 0.02 * frames;
        p.size *= 0.95f32.powf(frames);
    }
    state.particles.retain(|p| p.life > 0.0);
    state.shake.tick(dt);

    match state.stage {
        Stage::Countdown(n) => {
            if state.beat.tick(dt) {
                if n > 1 {
                    state.stage = Stage::Countdown(n - 1);
                    state.beat.start(1.0);
                    state.events.push(GameEvent::Count);
                } else {
                    state.stage = Stage::Playing;
                    state.events.push(GameEvent::Go);
                    state.spawn_block();
                    state.spawn.start(state.spawn_interval());
                }
            }
            return;
        }
        Stage::Playing => {}
        _ => return,
    }

    if state.spawn.tick(dt) {
        state.spawn_block();
        state.spawn.start(state.spawn_interval());
    }

    let step = state.speed * frames;
    let zone = state.zone_top();
    let mut misses = 0;
    let mut hits = 0;
    let mut judged = Vec::new();
    for block in &mut state.blocks {
        if block.status != BlockStatus::Falling || block.y + step <= zone {
            continue;
        }
        if block.is_correct() {
            block.status = BlockStatus::Success;
            hits += 1;
        } else {
            block.status = BlockStatus::Miss;
            misses += 1;
        }
        judged.push((block.lane, block.status == BlockStatus::Success));
    }
    for (lane, success) in judged {
        state.burst(lane, success);
    }

    if misses > 0 {
        state.events.push(GameEvent::Miss);
        state.combo = 0;
        state.shake.start(state.config.shake_time);
        state.misses += misses;
        if state.misses >= state.config.max_misses {
            state.game_over();
        }
    }

    if hits > 0 {
        state.events.push(GameEvent::Correct);
        state.combo += hits;
        if state.combo > 1 && state.combo % 5 == 0 {
            state.events.push(GameEvent::Combo);
        }
        state.score += hits as u64 + (state.combo / 10) as u64;
        let multiplier = 1.0 + (state.score / 100) as f32 * 0.1;
        state.speed = (state.speed + state.config.speed_step * multiplier).min(state.config.max_speed);
        if state.score > state.best {
            state.best = state.score;
        }
    }

    for block in &mut state.blocks {
        block.y += step;
    }
    let limit = state.config.despawn_y;
    state.blocks.retain(|b| b.y < limit);
}

pub fn draw(state: &UpDownState, list: &mut DrawList) {
    if state.shake.is_running() {
        let t = state.shake.remaining() * 60.0;
        list.shake = Vec2::new((t * 2.1).sin() * 5.0, 0.0);
    }

    // Lane hints
    list.rect(Rect::new(0.0, 0.0, VIEW.x * 0.5, VIEW.y), [0.2, 0.35, 0.9, 0.08]);
    list.rect(Rect::new(VIEW.x * 0.5, 0.0, VIEW.x * 0.5, VIEW.y), [0.9, 0.2, 0.25, 0.08]);
    list.label(Vec2::new(VIEW.x * 0.25, VIEW.y - 40.0), "EVEN", 24.0, [0.4, 0.6, 1.0, 1.0]);
    list.label(Vec2::new(VIEW.x * 0.75, VIEW.y - 40.0), "ODD", 24.0, [1.0, 0.45, 0.45, 1.0]);

    let zone_y = VIEW.y * state.zone_top() / 100.0;
    list.line(Vec2::new(0.0, zone_y), Vec2::new(VIEW.x, zone_y), with_alpha(colors::TEXT, 0.4), 2.0);

    let size = VIEW.x * state.config.block_size / 100.0;
    for block in &state.blocks {
        let center_x = VIEW.x * block.lane.fraction();
        let top = VIEW.y * block.y / 100.0;
        let rect = Rect::new(center_x - size * 0.5, top, size, size);
        match block.status {
            BlockStatus::Falling => {
                list.rect(rect, colors::TEXT);
                list.label(rect.center(), block.value.to_string(), size * 0.45, colors::BACKGROUND);
            }
            BlockStatus::Success => {
                list.rect(rect, with_alpha(colors::GOOD, 0.4));
                list.label(rect.center() - Vec2::new(0.0, size), "PERFECT!", 26.0, colors::GOOD);
            }
            BlockStatus::Miss => {
                list.rect(rect, with_alpha(colors::BAD, 0.5));
                list.label(rect.center(), block.value.to_string(), size * 0.45, colors::TEXT);
                list.label(rect.center() - Vec2::new(0.0, size), "MISS!", 26.0, colors::BAD);
            }
        }
    }

    for p in &state.particles {
        list.circle(p.pos, p.size, with_alpha(p.color, p.life));
    }

    list.text(Vec2::new(20.0, 30.0), format!("SCORE {}", state.score), 22.0, colors::TEXT, Align::Left);
    list.text(
        Vec2::new(VIEW.x - 20.0, 30.0),
        format!("MISS {}/{}", state.misses, state.config.max_misses),
        22.0,
        colors::BAD,
        Align::Right,
    );
    if state.combo > 1 {
        list.label(Vec2::new(VIEW.x * 0.5, 70.0), format!("{} COMBO", state.combo), 26.0, colors::COIN);
    }

    match state.stage {
        Stage::Title => shapes::banner(
            list,
            "UP DOWN CHOICE",
            &["Even ← / Odd →".to_string(), "Tap to start".to_string()],
        ),
        Stage::Countdown(n) => list.label(VIEW * 0.5, n.to_string(), 120.0, colors::TEXT),
        Stage::GameOver => shapes::banner(
            list,
            "GAME OVER",
            &[
                format!("Score {}", state.score),
                format!("Best {}", state.best),
                "Tap to retry".to_string(),
            ],
        ),
        Stage::Playing => {}
    }
}

impl Game for UpDownState {
    fn kind(&self) -> GameKind {
        GameKind::UpDown
    }

    fn phase(&self) -> RunPhase {
        match self.stage {
            Stage::Title => RunPhase::Title,
            Stage::Countdown(_) | Stage::Playing => RunPhase::Playing,
            Stage::GameOver => RunPhase::GameOver,
        }
    }

    fn press(&mut self, action: Action) {
        match action {
            Action::Left => self.flick(Lane::Left),
            Action::Right => self.flick(Lane::Right),
            Action::Confirm if matches!(self.stage, Stage::Title | Stage::GameOver) => self.start(),
            _ => {}
        }
    }

    fn pointer(&mut self, pointer: Pointer) {
        match pointer {
            Pointer::Down(pos) => {
                if matches!(self.stage, Stage::Title | Stage::GameOver) {
                    self.start();
                } else {
                    self.swipe_from = Some(pos);
                }
            }
            Pointer::Move(pos) => {
                if let Some(from) = self.swipe_from {
                    let dx = pos.x - from.x;
                    if dx.abs() > SWIPE_THRESHOLD {
                        self.flick(if dx > 0.0 { Lane::Right } else { Lane::Left });
                        self.swipe_from = None;
                    }
                }
            }
            Pointer::Up(_) => self.swipe_from = None,
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
            info: format!("Miss {}/{}", self.misses, self.config.max_misses),
            message: None,
        }
    }

    fn draw(&self, list: &mut DrawList) {
        draw(self, list);
    }

    fn view_size(&self) -> Vec2 {
        VIEW
    }

    fn final_score(&self) -> u64 {
        self.score
    }

    fn set_best(&mut self, best: u64) {
        self.best = self.best.max(best);
    }

    fn autoplay(&mut self) {
        match self.stage {
            Stage::Title | Stage::GameOver => self.start(),
            Stage::Playing => {
                let zone = self.zone_top();
                let target = self
                    .blocks
                    .iter()
                    .filter(|b| b.status == BlockStatus::Falling && b.y < zone)
                    .max_by(|a, b| a.y.total_cmp(&b.y))
                    .copied();
                if let Some(block) = target.filter(|b| b.lane == Lane::Center) {
                    self.flick(if block.is_even() { Lane::Left } else { Lane::Right });
                }
            }
            Stage::Countdown(_) => {}
        }
    }
}
