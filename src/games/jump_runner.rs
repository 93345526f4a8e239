//! Tap Jump Runner: a side scroller with triple jump
//!
//! World units are pixels with y measured up from the ground line. The player
//! stands at a fixed x while obstacles and coins scroll left at `speed`.
//! Per-frame constants are scaled by `frame_scale` (elapsed ms / 16.66).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer};
use crate::renderer::{DrawList, colors, shapes};
use crate::sim::{GameRng, HitStop, IdGen, Rect, RunPhase};

const VIEW: Vec2 = Vec2::new(800.0, 400.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub gravity: f32,
    pub jump_force: f32,
    pub initial_speed: f32,
    pub max_speed: f32,
    /// Speed gained per millisecond
    pub acceleration: f32,
    pub ground_height: f32,
    pub player_x: f32,
    pub player_size: f32,
    pub max_jumps: u32,
    pub obstacle_width: f32,
    pub obstacle_height_small: f32,
    pub obstacle_height_large: f32,
    pub flying_bottom: f32,
    pub pit_width: f32,
    pub coin_size: f32,
    pub coin_freeze: f32,
    /// Falling this far below the ground inside a pit ends the run
    pub pit_depth: f32,
    pub milestone_every: f32,
    /// Horizontal / vertical slack on obstacle hits
    pub forgiveness: Vec2,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            gravity: 0.6,
            jump_force: 12.0,
            initial_speed: 20.0,
            max_speed: 80.0,
            acceleration: 0.0002,
            ground_height: 50.0,
            player_x: 50.0,
            player_size: 40.0,
            max_jumps: 3,
            obstacle_width: 40.0,
            obstacle_height_small: 40.0,
            obstacle_height_large: 70.0,
            flying_bottom: 100.0,
            pit_width: 100.0,
            coin_size: 30.0,
            coin_freeze: 0.15,
            pit_depth: 100.0,
            milestone_every: 500.0,
            forgiveness: Vec2::new(10.0, 5.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Ground,
    Flying,
    Pit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    /// Left edge
    pub x: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: u32,
    /// Bottom-left corner
    pub pos: Vec2,
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Player {
    /// Feet height above the ground line
    pub y: f32,
    pub velocity: f32,
    pub jump_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tap: start from the title, jump while playing, back to title after a crash
    pub tap: bool,
}

#[derive(Debug, Clone)]
pub struct RunnerState {
    pub config: RunnerConfig,
    pub phase: RunPhase,
    pub player: Player,
    pub speed: f32,
    pub distance: f32,
    pub coins: u32,
    pub score: u64,
    pub best: u64,
    pub obstacles: Vec<Obstacle>,
    pub coin_items: Vec<Coin>,
    pub hit_stop: HitStop,
    pub events: Vec<GameEvent>,
    pub input: TickInput,
    pub width: f32,
    last_milestone: u32,
    rng: GameRng,
    ids: IdGen,
}

impl RunnerState {
    pub fn new(config: RunnerConfig, seed: u64) -> Self {
        Self {
            speed: config.initial_speed,
            config,
            phase: RunPhase::Title,
            player: Player::default(),
            distance: 0.0,
            coins: 0,
            score: 0,
            best: 0,
            obstacles: Vec::new(),
            coin_items: Vec::new(),
            hit_stop: HitStop::default(),
            events: Vec::new(),
            input: TickInput::default(),
            width: VIEW.x,
            last_milestone: 0,
            rng: GameRng::new(seed),
            ids: IdGen::default(),
        }
    }

    fn player_rect(&self) -> Rect {
        let c = &self.config;
        Rect::new(c.player_x, self.player.y, c.player_size, c.player_size)
    }

    fn obstacle_rect(&self, o: &Obstacle) -> Rect {
        let bottom = match o.kind {
            ObstacleKind::Flying => self.config.flying_bottom,
            _ => 0.0,
        };
        Rect::new(o.x, bottom, o.width, o.height)
    }

    fn over_pit(&self) -> bool {
        let centre = self.config.player_x + self.config.player_size / 2.0;
        self.obstacles
            .iter()
            .any(|o| o.kind == ObstacleKind::Pit && centre > o.x && centre < o.x + o.width)
    }

    fn make_obstacle(&mut self, kind: ObstacleKind, x: f32, height: f32) -> Obstacle {
        let width = match kind {
            ObstacleKind::Pit => self.config.pit_width,
            _ => self.config.obstacle_width,
        };
        Obstacle {
            id: self.ids.next_id(),
            kind,
            x,
            width,
            height,
        }
    }

    fn start(&mut self) {
        self.phase = RunPhase::Playing;
        self.score = 0;
        self.distance = 0.0;
        self.coins = 0;
        self.speed = self.config.initial_speed;
        self.player = Player::default();
        self.hit_stop.clear();
        self.last_milestone = 0;
        self.coin_items.clear();
        self.obstacles.clear();

        // Opening course: small ground blocks, the odd flyer or pit
        let mut x = self.width + 200.0;
        for _ in 0..3 {
            let r = self.rng.unit();
            let (kind, height) = if r > 0.8 {
                (ObstacleKind::Pit, 50.0)
            } else if r > 0.6 {
                (ObstacleKind::Flying, 40.0)
            } else {
                (ObstacleKind::Ground, self.config.obstacle_height_small)
            };
            let o = self.make_obstacle(kind, x, height);
            self.obstacles.push(o);
            x += 500.0 + self.rng.unit() * 200.0;
        }
        self.events.push(GameEvent::Start);
        log::info!("runner: start");
    }

    fn jump(&mut self) {
        if self.player.jump_count < self.config.max_jumps {
            self.player.velocity = self.config.jump_force;
            self.player.jump_count += 1;
            self.events.push(GameEvent::Jump);
        }
    }

    fn game_over(&mut self) {
        self.phase = RunPhase::GameOver;
        self.events.push(GameEvent::Crash);
        self.events.push(GameEvent::GameOver);
        if self.score > self.best {
            self.best = self.score;
            self.events.push(GameEvent::NewRecord);
        }
        log::info!("runner: game over at {:.0}, score {}", self.distance, self.score);
    }

    fn spawn(&mut self) {
        let spawn_x = self.width + 100.0;
        let gap = self.rng.unit() * 300.0 + 300.0;
        let clear = match self.obstacles.last() {
            None => true,
            Some(last) => spawn_x - last.x > gap,
        };
        if !clear {
            return;
        }

        let r = self.rng.unit();
        let (kind, height) = if r > 0.9 {
            (ObstacleKind::Pit, 50.0)
        } else if r > 0.7 {
            (ObstacleKind::Flying, 40.0)
        } else if self.rng.chance(0.5) {
            (ObstacleKind::Ground, self.config.obstacle_height_small)
        } else {
            (ObstacleKind::Ground, self.config.obstacle_height_large)
        };
        let o = self.make_obstacle(kind, spawn_x, height);
        log::debug!("runner: spawn {:?} #{}", o.kind, o.id);
        self.obstacles.push(o);

        if kind != ObstacleKind::Pit && self.rng.chance(0.5) {
            let x = spawn_x + 50.0 + self.rng.unit() * 100.0;
            let y = self.rng.unit() * 150.0 + 50.0;
            let id = self.ids.next_id();
            self.coin_items.push(Coin {
                id,
                pos: Vec2::new(x, y),
                size: self.config.coin_size,
            });
        }
    }
}

/// Advance the runner by one tick
pub fn tick(state: &mut RunnerState, input: &TickInput, dt: f32) {
    if input.tap {
        match state.phase {
            RunPhase::Title => state.start(),
            RunPhase::Playing => state.jump(),
            RunPhase::GameOver => state.phase = RunPhase::Title,
        }
    }

    if state.phase != RunPhase::Playing {
        return;
    }
    if state.hit_stop.tick(dt) {
        return;
    }

    let c = state.config.clone();
    let dt_ms = dt * 1000.0;
    let frame_scale = dt_ms / 16.66;

    if state.speed < c.max_speed {
        state.speed += c.acceleration * dt_ms;
    }
    state.distance += state.speed * frame_scale;
    state.score = (state.distance / 10.0).floor() as u64 + state.coins as u64 * 10;

    let milestone = (state.distance / c.milestone_every).floor() as u32;
    if milestone > state.last_milestone {
        state.last_milestone = milestone;
        state.events.push(GameEvent::Milestone);
    }

    let mut y = state.player.y + state.player.velocity * frame_scale;
    let mut vel = state.player.velocity - c.gravity * frame_scale;
    let in_pit = state.over_pit();
    if !in_pit && y <= 0.0 {
        y = 0.0;
        vel = 0.0;
        state.player.jump_count = 0;
    } else if in_pit && y <= -c.pit_depth {
        state.game_over();
        return;
    }
    state.player.y = y;
    state.player.velocity = vel;

    state.spawn();

    let shift = state.speed * frame_scale;
    for o in &mut state.obstacles {
        o.x -= shift;
    }
    state.obstacles.retain(|o| o.x + o.width > -200.0);
    for coin in &mut state.coin_items {
        coin.pos.x -= shift;
    }
    state.coin_items.retain(|coin| coin.pos.x + coin.size > -200.0);

    let player = state.player_rect();
    // Shrinking the player by the forgiveness margin is the same test as
    // shrinking every obstacle by it
    let hitbox = player.inset_xy(c.forgiveness.x, c.forgiveness.y);
    let hit = state
        .obstacles
        .iter()
        .filter(|o| o.kind != ObstacleKind::Pit)
        .any(|o| hitbox.overlaps(&state.obstacle_rect(o)));
    if hit {
        state.game_over();
        return;
    }

    let before = state.coin_items.len();
    state
        .coin_items
        .retain(|coin| !player.overlaps(&Rect::new(coin.pos.x, coin.pos.y, coin.size, coin.size)));
    let got = (before - state.coin_items.len()) as u32;
    if got > 0 {
        state.coins += got;
        state.hit_stop.trigger(c.coin_freeze);
        state.events.push(GameEvent::Coin);
    }
}

fn bot_wants_jump(state: &RunnerState) -> bool {
    let c = &state.config;
    let front = c.player_x + c.player_size;
    let on_ground = state.player.jump_count == 0;
    state.obstacles.iter().any(|o| {
        let dx = o.x - front;
        match o.kind {
            ObstacleKind::Ground => on_ground && dx > 0.0 && dx < state.speed * 4.0,
            ObstacleKind::Pit => on_ground && dx > 0.0 && dx < state.speed * 2.0,
            ObstacleKind::Flying => false,
        }
    })
}

pub fn draw(state: &RunnerState, list: &mut DrawList) {
    let c = &state.config;
    let ground_y = VIEW.y - c.ground_height;
    let to_screen = |r: Rect| Rect::new(r.x, ground_y - r.bottom(), r.w, r.h);

    list.clear = [0.53, 0.78, 0.96, 1.0];
    list.rect(Rect::new(0.0, ground_y, VIEW.x, c.ground_height), [0.45, 0.3, 0.18, 1.0]);

    for o in &state.obstacles {
        match o.kind {
            ObstacleKind::Pit => {
                list.rect(Rect::new(o.x, ground_y, o.width, c.ground_height), [0.05, 0.05, 0.08, 1.0]);
            }
            ObstacleKind::Ground => list.rect(to_screen(state.obstacle_rect(o)), colors::HAZARD),
            ObstacleKind::Flying => list.rect(to_screen(state.obstacle_rect(o)), colors::ACCENT),
        }
    }
    for coin in &state.coin_items {
        let r = to_screen(Rect::new(coin.pos.x, coin.pos.y, coin.size, coin.size));
        list.circle(r.center(), coin.size / 2.0, colors::COIN);
    }
    list.rect(to_screen(state.player_rect()), colors::PLAYER);

    match state.phase {
        RunPhase::Title => shapes::banner(list, "TAP JUMP RUNNER", &["Tap to start".to_string()]),
        RunPhase::GameOver => shapes::banner(
            list,
            "GAME OVER",
            &[format!("Score {}", state.score), "Tap to continue".to_string()],
        ),
        RunPhase::Playing => {}
    }
}

impl Game for RunnerState {
    fn kind(&self) -> GameKind {
        GameKind::JumpRunner
    }

    fn phase(&self) -> RunPhase {
        self.phase
    }

    fn press(&mut self, action: Action) {
        if matches!(action, Action::Confirm | Action::Up) {
            self.input.tap = true;
        }
    }

    fn pointer(&mut self, pointer: Pointer) {
        if let Pointer::Down(_) = pointer {
            self.input.tap = true;
        }
    }

    fn tick(&mut self, dt: f32) {
        let input = std::mem::take(&mut self.input);
        tick(self, &input, dt);
    }

    fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            best: self.best,
            info: format!("{:.0} m  ·  {} coins", self.distance / 10.0, self.coins),
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
        if self.phase == RunPhase::Playing && bot_wants_jump(self) {
            self.input.tap = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn tap() -> TickInput {
        TickInput { tap: true }
    }

    fn started(seed: u64) -> RunnerState {
        let mut s = RunnerState::new(RunnerConfig::default(), seed);
        tick(&mut s, &tap(), SIM_DT);
        s
    }

    #[test]
    fn test_start_lays_out_opening_course() {
        let s = started(1);
        assert_eq!(s.phase, RunPhase::Playing);
        assert!(s.obstacles.len() >= 3);
        // Opening obstacles are never tall
        for o in s.obstacles.iter().take(3) {
            assert!(o.kind == ObstacleKind::Pit || o.height == 40.0);
        }
    }

    #[test]
    fn test_triple_jump_limit() {
        let mut s = started(2);
        s.obstacles.clear();
        for _ in 0..3 {
            tick(&mut s, &tap(), SIM_DT);
        }
        assert_eq!(s.player.jump_count, 3);
        let v = s.player.velocity;
        tick(&mut s, &tap(), SIM_DT);
        assert_eq!(s.player.jump_count, 3);
        assert!(s.player.velocity < v);
    }

    #[test]
    fn test_landing_resets_jumps() {
        let mut s = started(3);
        s.obstacles.clear();
        tick(&mut s, &tap(), SIM_DT);
        assert!(s.player.y > 0.0);
        for _ in 0..200 {
            tick(&mut s, &TickInput::default(), SIM_DT);
            s.obstacles.clear();
            s.coin_items.clear();
        }
        assert_eq!(s.player.y, 0.0);
        assert_eq!(s.player.jump_count, 0);
    }

    #[test]
    fn test_ground_obstacle_hit() {
        let mut s = started(4);
        s.obstacles.clear();
        let id = s.ids.next_id();
        s.obstacles.push(Obstacle {
            id,
            kind: ObstacleKind::Ground,
            x: 60.0,
            width: 40.0,
            height: 40.0,
        });
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.phase, RunPhase::GameOver);
        assert!(s.events.contains(&GameEvent::Crash));
    }

    #[test]
    fn test_runs_under_flyer() {
        let mut s = started(5);
        s.obstacles.clear();
        s.obstacles.push(Obstacle {
            id: 1,
            kind: ObstacleKind::Flying,
            x: 60.0,
            width: 40.0,
            height: 40.0,
        });
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.phase, RunPhase::Playing);
    }

    #[test]
    fn test_falls_into_pit() {
        let mut s = started(6);
        s.obstacles.clear();
        s.obstacles.push(Obstacle {
            id: 1,
            kind: ObstacleKind::Pit,
            x: -20.0,
            width: 100_000.0,
            height: 50.0,
        });
        for _ in 0..200 {
            tick(&mut s, &TickInput::default(), SIM_DT);
            if s.phase == RunPhase::GameOver {
                break;
            }
        }
        assert_eq!(s.phase, RunPhase::GameOver);
    }

    #[test]
    fn test_coin_pickup_and_hit_stop() {
        let mut s = started(7);
        s.obstacles.clear();
        s.coin_items.push(Coin {
            id: 1,
            pos: Vec2::new(55.0, 5.0),
            size: 30.0,
        });
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.coins, 1);
        let d = s.distance;
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.distance, d);
    }

    #[test]
    fn test_score_formula_and_milestone() {
        let mut s = started(8);
        s.obstacles.clear();
        s.coins = 2;
        s.distance = 499.0;
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert!(s.distance > 500.0);
        assert_eq!(s.score, (s.distance / 10.0).floor() as u64 + 20);
        assert!(s.events.contains(&GameEvent::Milestone));
    }

    #[test]
    fn test_tap_after_game_over_returns_to_title() {
        let mut s = started(9);
        s.phase = RunPhase::GameOver;
        tick(&mut s, &tap(), SIM_DT);
        assert_eq!(s.phase, RunPhase::Title);
    }
}
