//! Lane Race: a pixel-space three-lane road
//!
//! Screen pixels with y growing down. The road is centred and at most 600 px
//! wide; cones and coins drop into one of three lanes on fixed intervals.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer};
use crate::renderer::{DrawList, colors, shapes};
use crate::sim::{GameRng, IdGen, Rect, RunPhase};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneRaceConfig {
    pub lane_count: u32,
    pub max_road_width: f32,
    pub car_size: Vec2,
    /// Car centre height as a fraction of the screen
    pub car_y_ratio: f32,
    /// Pixels per tick while a steering key is held
    pub car_key_speed: f32,
    pub drag_factor: f32,
    /// Keyboard steering keeps this far from the screen edge
    pub key_margin: f32,
    /// Scroll speed in px/s once a run starts
    pub scroll_speed: f32,
    pub obstacle_interval: f32,
    pub obstacle_size: Vec2,
    pub obstacle_spawn_y: f32,
    pub obstacle_despawn_margin: f32,
    /// Car hitbox inset against obstacles
    pub obstacle_inset: f32,
    pub coin_interval: f32,
    pub coin_chance: f32,
    pub coin_size: Vec2,
    pub coin_spawn_y: f32,
    pub coin_despawn_margin: f32,
    /// Points per coin
    pub coin_value: u64,
}

impl Default for LaneRaceConfig {
    fn default() -> Self {
        Self {
            lane_count: 3,
            max_road_width: 600.0,
            car_size: Vec2::new(60.0, 100.0),
            car_y_ratio: 0.8,
            car_key_speed: 8.0,
            drag_factor: 1.5,
            key_margin: 20.0,
            scroll_speed: 3000.0,
            obstacle_interval: 0.45,
            obstacle_size: Vec2::new(50.0, 50.0),
            obstacle_spawn_y: -100.0,
            obstacle_despawn_margin: 100.0,
            obstacle_inset: 10.0,
            coin_interval: 0.8,
            coin_chance: 0.7,
            coin_size: Vec2::new(30.0, 30.0),
            coin_spawn_y: -50.0,
            coin_despawn_margin: 50.0,
            coin_value: 1,
        }
    }
}

/// Something scrolling down a lane (cone or coin)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneEntity {
    pub id: u32,
    pub lane: u32,
    /// Centre
    pub pos: Vec2,
    pub size: Vec2,
}

impl LaneEntity {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }
}

/// Held keys for the car
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Drag distance since the last tick, in px
    pub drag: f32,
    pub start: bool,
}

#[derive(Debug, Clone)]
pub struct LaneRaceState {
    pub config: LaneRaceConfig,
    pub phase: RunPhase,
    pub screen: Vec2,
    pub car_x: f32,
    pub scroll_speed: f32,
    pub coins: u32,
    pub best: u64,
    pub cones: Vec<LaneEntity>,
    pub coin_items: Vec<LaneEntity>,
    pub background_offset: f32,
    pub events: Vec<GameEvent>,
    pub input: TickInput,
    obstacle_timer: f32,
    coin_timer: f32,
    drag_from: Option<f32>,
    rng: GameRng,
    ids: IdGen,
}

impl LaneRaceState {
    pub fn new(config: LaneRaceConfig, seed: u64) -> Self {
        let screen = Vec2::new(400.0, 700.0);
        Self {
            config,
            phase: RunPhase::Title,
            screen,
            car_x: screen.x / 2.0,
            scroll_speed: 0.0,
            coins: 0,
            best: 0,
            cones: Vec::new(),
            coin_items: Vec::new(),
            background_offset: 0.0,
            events: Vec::new(),
            input: TickInput::default(),
            obstacle_timer: 0.0,
            coin_timer: 0.0,
            drag_from: None,
            rng: GameRng::new(seed),
            ids: IdGen::default(),
        }
    }

    pub fn road_width(&self) -> f32 {
        self.screen.x.min(self.config.max_road_width)
    }

    fn side_width(&self) -> f32 {
        (self.screen.x - self.road_width()) / 2.0
    }

    pub fn lane_width(&self) -> f32 {
        self.road_width() / self.config.lane_count as f32
    }

    /// Centre x of a lane
    pub fn lane_x(&self, lane: u32) -> f32 {
        let lw = self.lane_width();
        self.side_width() + lane as f32 * lw + lw / 2.0
    }

    pub fn car_y(&self) -> f32 {
        self.screen.y * self.config.car_y_ratio
    }

    pub fn car_rect(&self) -> Rect {
        Rect::from_center(Vec2::new(self.car_x, self.car_y()), self.config.car_size)
    }

    pub fn score(&self) -> u64 {
        self.coins as u64 * self.config.coin_value
    }

    fn clamp_car(&mut self, margin: f32) {
        let half = self.config.car_size.x / 2.0;
        let lo = half + margin;
        let hi = (self.screen.x - half - margin).max(lo);
        self.car_x = self.car_x.clamp(lo, hi);
    }

    fn start(&mut self) {
        self.phase = RunPhase::Playing;
        self.scroll_speed = self.config.scroll_speed;
        self.cones.clear();
        self.coin_items.clear();
        self.coins = 0;
        // Both spawners fire on the first tick
        self.obstacle_timer = self.config.obstacle_interval;
        self.coin_timer = self.config.coin_interval;
        self.car_x = self.screen.x / 2.0;
        self.events.push(GameEvent::Start);
        log::info!("lane race: start ({}x{})", self.screen.x, self.screen.y);
    }

    fn game_over(&mut self) {
        self.phase = RunPhase::GameOver;
        self.scroll_speed = 0.0;
        self.events.push(GameEvent::Crash);
        self.events.push(GameEvent::GameOver);
        let score = self.score();
        if score > self.best {
            self.best = score;
            self.events.push(GameEvent::NewRecord);
        }
        log::info!("lane race: game over with {} coins", self.coins);
    }

    fn spawn_in_random_lane(&mut self, y: f32, size: Vec2) -> LaneEntity {
        let lane = self.rng.range_u32(0, self.config.lane_count.saturating_sub(1));
        LaneEntity {
            id: self.ids.next_id(),
            lane,
            pos: Vec2::new(self.lane_x(lane), y),
            size,
        }
    }
}

/// Advance the race by one tick
pub fn tick(state: &mut LaneRaceState, input: &TickInput, dt: f32) {
    if input.start && state.phase != RunPhase::Playing {
        state.start();
    }

    // Frame-rate independent scaling of the per-frame constants
    let frames = dt * 60.0;
    state.background_offset = (state.background_offset + state.scroll_speed / 60.0 * frames) % 100.0;

    if state.phase != RunPhase::Playing {
        return;
    }

    let c = state.config.clone();

    let mut dx = 0.0;
    if input.left {
        dx -= c.car_key_speed * frames;
    }
    if input.right {
        dx += c.car_key_speed * frames;
    }
    if dx != 0.0 {
        state.car_x += dx;
        state.clamp_car(c.key_margin);
    }
    if input.drag != 0.0 {
        state.car_x += input.drag * c.drag_factor;
        state.clamp_car(0.0);
    }

    let step = state.scroll_speed / 60.0 * frames;

    state.obstacle_timer += dt;
    if state.obstacle_timer >= c.obstacle_interval {
        state.obstacle_timer = 0.0;
        let cone = state.spawn_in_random_lane(c.obstacle_spawn_y, c.obstacle_size);
        log::debug!("lane race: cone #{} in lane {}", cone.id, cone.lane);
        state.cones.push(cone);
    }

    let limit = state.screen.y + c.obstacle_despawn_margin;
    for cone in &mut state.cones {
        cone.pos.y += step;
    }
    state.cones.retain(|cone| cone.pos.y <= limit);

    let car_hitbox = state.car_rect().inset(c.obstacle_inset);
    if state.cones.iter().any(|cone| car_hitbox.overlaps(&cone.rect())) {
        state.game_over();
        return;
    }

    state.coin_timer += dt;
    if state.coin_timer >= c.coin_interval {
        state.coin_timer = 0.0;
        if state.rng.chance(c.coin_chance) {
            let coin = state.spawn_in_random_lane(c.coin_spawn_y, c.coin_size);
            state.coin_items.push(coin);
        }
    }

    let limit = state.screen.y + c.coin_despawn_margin;
    for coin in &mut state.coin_items {
        coin.pos.y += step;
    }
    state.coin_items.retain(|coin| coin.pos.y <= limit);

    let car = state.car_rect();
    let before = state.coin_items.len();
    state.coin_items.retain(|coin| !car.overlaps(&coin.rect()));
    let got = (before - state.coin_items.len()) as u32;
    if got > 0 {
        state.coins += got;
        state.events.push(GameEvent::Coin);
    }
}

pub fn draw(state: &LaneRaceState, list: &mut DrawList) {
    list.clear = colors::GRASS;
    let road = Rect::new(state.side_width(), 0.0, state.road_width(), state.screen.y);
    list.rect(road, colors::ROAD);

    let dash = 60.0;
    let offset = state.background_offset / 100.0 * dash * 2.0;
    for lane in 1..state.config.lane_count {
        let x = road.x + lane as f32 * state.lane_width();
        let mut y = -dash * 2.0 + offset;
        while y < state.screen.y {
            list.rect(Rect::new(x - 3.0, y, 6.0, dash), colors::LANE_MARK);
            y += dash * 2.0;
        }
    }

    for coin in &state.coin_items {
        list.circle(coin.pos, coin.size.x / 2.0, colors::COIN);
    }
    for cone in &state.cones {
        let r = cone.rect();
        list.rect(r, colors::CONE);
        list.rect(Rect::new(r.x, r.center().y - 4.0, r.w, 8.0), colors::TEXT);
    }
    list.rect(state.car_rect(), colors::HAZARD);

    match state.phase {
        RunPhase::Title => shapes::banner(list, "LANE RACE", &["Tap to start".to_string()]),
        RunPhase::GameOver => shapes::banner(
            list,
            "GAME OVER",
            &[
                format!("Score {}", state.score()),
                format!("{} coins", state.coins),
            ],
        ),
        RunPhase::Playing => {}
    }
}

impl Game for LaneRaceState {
    fn kind(&self) -> GameKind {
        GameKind::LaneRace
    }

    fn phase(&self) -> RunPhase {
        self.phase
    }

    fn press(&mut self, action: Action) {
        match action {
            Action::Left => self.input.left = true,
            Action::Right => self.input.right = true,
            Action::Confirm => self.input.start = true,
            _ => {}
        }
    }

    fn release(&mut self, action: Action) {
        match action {
            Action::Left => self.input.left = false,
            Action::Right => self.input.right = false,
            _ => {}
        }
    }

    fn pointer(&mut self, pointer: Pointer) {
        match pointer {
            Pointer::Down(p) => {
                self.drag_from = Some(p.x);
                if self.phase != RunPhase::Playing {
                    self.input.start = true;
                }
            }
            Pointer::Move(p) => {
                if let Some(from) = self.drag_from {
                    self.input.drag += p.x - from;
                    self.drag_from = Some(p.x);
                }
            }
            Pointer::Up(_) => self.drag_from = None,
        }
    }

    fn tick(&mut self, dt: f32) {
        let input = self.input.clone();
        tick(self, &input, dt);
        // Held keys persist; one-shots are consumed
        self.input.drag = 0.0;
        self.input.start = false;
    }

    fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn hud(&self) -> Hud {
        Hud {
            score: self.score(),
            best: self.best,
            info: format!("COINS: {}", self.coins),
            message: None,
        }
    }

    fn draw(&self, list: &mut DrawList) {
        draw(self, list);
    }

    fn view_size(&self) -> Vec2 {
        self.screen
    }

    fn resize(&mut self, size: Vec2) {
        self.screen = size.max(Vec2::ONE);
        self.clamp_car(0.0);
    }

    fn final_score(&self) -> u64 {
        self.score()
    }

    fn set_best(&mut self, best: u64) {
        self.best = self.best.max(best);
    }

    fn autoplay(&mut self) {
        if self.phase != RunPhase::Playing {
            return;
        }
        let car_y = self.car_y();
        let threatened = |lane: u32| {
            self.cones
                .iter()
                .any(|c| c.lane == lane && c.pos.y < car_y && c.pos.y > car_y - 400.0)
        };
        let here = (0..self.config.lane_count)
            .min_by(|&a, &b| {
                (self.lane_x(a) - self.car_x)
                    .abs()
                    .partial_cmp(&(self.lane_x(b) - self.car_x).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        let target = if threatened(here) {
            (0..self.config.lane_count)
                .filter(|&l| !threatened(l))
                .min_by_key(|&l| l.abs_diff(here))
                .unwrap_or(here)
        } else {
            here
        };
        let tx = self.lane_x(target);
        self.input.left = tx < self.car_x - 4.0;
        self.input.right = tx > self.car_x + 4.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn started(seed: u64) -> LaneRaceState {
        let mut s = LaneRaceState::new(LaneRaceConfig::default(), seed);
        s.resize(Vec2::new(800.0, 600.0));
        let input = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut s, &input, SIM_DT);
        s
    }

    #[test]
    fn test_lane_geometry() {
        let mut s = LaneRaceState::new(LaneRaceConfig::default(), 1);
        s.resize(Vec2::new(800.0, 600.0));
        assert_eq!(s.road_width(), 600.0);
        assert_eq!(s.lane_x(0), 200.0);
        assert_eq!(s.lane_x(1), 400.0);
        assert_eq!(s.lane_x(2), 600.0);

        s.resize(Vec2::new(300.0, 600.0));
        assert_eq!(s.lane_x(0), 50.0);
    }

    #[test]
    fn test_start_spawns_first_cone() {
        let s = started(2);
        assert_eq!(s.phase, RunPhase::Playing);
        assert_eq!(s.scroll_speed, 3000.0);
        assert_eq!(s.cones.len(), 1);
        // Spawned at -100 then moved 50 px
        assert!((s.cones[0].pos.y - -50.0).abs() < 1e-3);
        assert!([200.0, 400.0, 600.0].contains(&s.cones[0].pos.x));
    }

    #[test]
    fn test_cone_hit_ends_run() {
        let mut s = started(3);
        s.cones.clear();
        s.cones.push(LaneEntity {
            id: 99,
            lane: 1,
            pos: Vec2::new(s.car_x, s.car_y() - 60.0),
            size: Vec2::new(50.0, 50.0),
        });
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.phase, RunPhase::GameOver);
        assert_eq!(s.scroll_speed, 0.0);
    }

    #[test]
    fn test_cone_inset_forgives_graze() {
        let mut s = started(4);
        s.cones.clear();
        s.scroll_speed = 0.0;
        // Overlaps the raw car box by 5 px but not the inset hitbox
        let half = s.config.car_size.x / 2.0;
        s.cones.push(LaneEntity {
            id: 1,
            lane: 0,
            pos: Vec2::new(s.car_x - half - 25.0 + 5.0, s.car_y()),
            size: Vec2::new(50.0, 50.0),
        });
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.phase, RunPhase::Playing);
    }

    #[test]
    fn test_coin_collect() {
        let mut s = started(5);
        s.cones.clear();
        s.scroll_speed = 0.0;
        s.coin_items.push(LaneEntity {
            id: 7,
            lane: 1,
            pos: Vec2::new(s.car_x, s.car_y()),
            size: Vec2::new(30.0, 30.0),
        });
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.coins, 1);
        assert_eq!(s.score(), 1);
        assert!(s.events.contains(&GameEvent::Coin));
    }

    #[test]
    fn test_each_coin_adds_one_point() {
        let mut s = started(12);
        s.cones.clear();
        s.scroll_speed = 0.0;
        for id in 0..3 {
            s.coin_items.push(LaneEntity {
                id,
                lane: 1,
                pos: Vec2::new(s.car_x, s.car_y()),
                size: Vec2::new(30.0, 30.0),
            });
            tick(&mut s, &TickInput::default(), SIM_DT);
            assert_eq!(s.score(), id as u64 + 1);
        }
        assert_eq!(s.hud().score, 3);
    }

    #[test]
    fn test_key_steer_clamps_to_margin() {
        let mut s = started(6);
        s.scroll_speed = 0.0;
        s.cones.clear();
        let input = TickInput {
            left: true,
            ..Default::default()
        };
        for _ in 0..200 {
            tick(&mut s, &input, SIM_DT);
            s.cones.clear();
        }
        assert_eq!(s.car_x, 30.0 + 20.0);
    }

    #[test]
    fn test_spawns_always_land_in_lane_centres() {
        let mut s = started(8);
        // Park the car far below the screen
        s.config.car_y_ratio = 10.0;
        let centres: Vec<f32> = (0..3).map(|l| s.lane_x(l)).collect();
        for _ in 0..600 {
            tick(&mut s, &TickInput::default(), SIM_DT);
            for e in s.cones.iter().chain(s.coin_items.iter()) {
                assert!(centres.contains(&e.pos.x));
            }
        }
    }
}
