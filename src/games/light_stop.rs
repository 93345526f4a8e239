//! Light Stop: wait for the light, then hit it as fast as possible

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer};
use crate::renderer::draw::with_alpha;
use crate::renderer::{Align, DrawList, colors, shapes};
use crate::sim::{Countdown, GameRng, Rect, RunPhase};

const VIEW: Vec2 = Vec2::new(480.0, 640.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightStopConfig {
    /// Shortest wait before the light turns on, in ms
    pub min_delay_ms: u32,
    /// Width of the random wait window, in ms
    pub delay_spread_ms: u32,
}

impl Default for LightStopConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            delay_spread_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightPhase {
    Idle,
    Waiting,
    Active,
    Success,
    Failure,
}

#[derive(Debug, Clone)]
pub struct LightStopState {
    pub config: LightStopConfig,
    pub phase: LightPhase,
    /// Consecutive successes
    pub streak: u32,
    pub best_streak: u32,
    /// Fastest reaction in ms
    pub best_time: Option<u32>,
    pub reaction_time: Option<u32>,
    /// Seconds since the light turned on
    pub active_for: f32,
    pub events: Vec<GameEvent>,
    wait: Countdown,
    rng: GameRng,
}

impl LightStopState {
    pub fn new(config: LightStopConfig, seed: u64) -> Self {
        Self {
            config,
            phase: LightPhase::Idle,
            streak: 0,
            best_streak: 0,
            best_time: None,
            reaction_time: None,
            active_for: 0.0,
            events: Vec::new(),
            wait: Countdown::idle(),
            rng: GameRng::new(seed),
        }
    }

    fn begin_wait(&mut self) {
        let spread = self.config.delay_spread_ms;
        let jitter = if spread == 0 {
            0
        } else {
            self.rng.range_u32(0, spread - 1)
        };
        let delay_ms = self.config.min_delay_ms + jitter;
        self.wait.start(delay_ms as f32 / 1000.0);
        self.phase = LightPhase::Waiting;
        self.reaction_time = None;
        self.active_for = 0.0;
        self.events.push(GameEvent::Start);
        self.events.push(GameEvent::DroneStart);
        log::debug!("light stop: waiting {}ms", delay_ms);
    }

    pub fn interact(&mut self) {
        match self.phase {
            LightPhase::Idle | LightPhase::Success => self.begin_wait(),
            LightPhase::Failure => {
                self.streak = 0;
                self.begin_wait();
            }
            LightPhase::Waiting => {
                self.wait.stop();
                self.phase = LightPhase::Failure;
                self.events.push(GameEvent::Fail);
                self.events.push(GameEvent::DroneStop);
                log::info!("light stop: too early, streak {}", self.streak);
            }
            LightPhase::Active => {
                let ms = (self.active_for * 1000.0).round() as u32;
                self.reaction_time = Some(ms);
                self.best_time = Some(self.best_time.map_or(ms, |b| b.min(ms)));
                self.streak += 1;
                self.best_streak = self.best_streak.max(self.streak);
                self.phase = LightPhase::Success;
                self.events.push(GameEvent::Correct);
                log::info!("light stop: {}ms, streak {}", ms, self.streak);
            }
        }
    }
}

pub fn tick(state: &mut LightStopState, dt: f32) {
    match state.phase {
        LightPhase::Waiting => {
            if state.wait.tick(dt) {
                state.phase = LightPhase::Active;
                state.active_for = 0.0;
                state.events.push(GameEvent::DroneStop);
            }
        }
        LightPhase::Active => state.active_for += dt,
        _ => {}
    }
}

pub fn draw(state: &LightStopState, list: &mut DrawList) {
    list.clear = match state.phase {
        LightPhase::Failure => [0.23, 0.05, 0.06, 1.0],
        LightPhase::Success => [0.04, 0.2, 0.09, 1.0],
        _ => colors::BACKGROUND,
    };
    let center = Vec2::new(VIEW.x * 0.5, VIEW.y * 0.45);
    let lamp = match state.phase {
        LightPhase::Active => colors::GOOD,
        LightPhase::Waiting => colors::BAD,
        _ => colors::WALL,
    };
    list.circle(center, 110.0, with_alpha(lamp, 0.25));
    list.circle(center, 90.0, lamp);

    list.text(
        Vec2::new(20.0, 30.0),
        format!("STREAK {}", state.streak),
        22.0,
        colors::TEXT,
        Align::Left,
    );
    list.text(
        Vec2::new(VIEW.x - 20.0, 30.0),
        format!("MAX {}", state.best_streak),
        22.0,
        colors::DIM,
        Align::Right,
    );
    if let Some(best) = state.best_time {
        list.label(Vec2::new(VIEW.x * 0.5, 64.0), format!("BEST {}ms", best), 18.0, colors::COIN);
    }

    let caption = Vec2::new(VIEW.x * 0.5, VIEW.y * 0.75);
    match state.phase {
        LightPhase::Idle => shapes::banner(list, "LIGHT STOP", &["Tap to start".to_string()]),
        LightPhase::Waiting => list.label(caption, "...", 40.0, colors::DIM),
        LightPhase::Active => list.label(caption, "TAP!", 56.0, colors::GOOD),
        LightPhase::Success => {
            let ms = state.reaction_time.unwrap_or(0);
            list.label(caption, format!("{}ms", ms), 48.0, colors::TEXT);
            list.label(caption + Vec2::new(0.0, 50.0), "Tap for next", 18.0, colors::DIM);
        }
        LightPhase::Failure => {
            list.rect(Rect::new(0.0, 0.0, VIEW.x, VIEW.y), with_alpha(colors::BAD, 0.1));
            list.label(caption, "TOO EARLY!", 44.0, colors::BAD);
            list.label(caption + Vec2::new(0.0, 50.0), "Tap to retry", 18.0, colors::DIM);
        }
    }
}

impl Game for LightStopState {
    fn kind(&self) -> GameKind {
        GameKind::LightStop
    }

    fn phase(&self) -> RunPhase {
        match self.phase {
            LightPhase::Idle => RunPhase::Title,
            LightPhase::Failure => RunPhase::GameOver,
            _ => RunPhase::Playing,
        }
    }

    fn press(&mut self, action: Action) {
        if action == Action::Confirm {
            self.interact();
        }
    }

    fn pointer(&mut self, pointer: Pointer) {
        if let Pointer::Down(_) = pointer {
            self.interact();
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
            score: self.streak as u64,
            best: self.best_streak as u64,
            info: self
                .best_time
                .map(|t| format!("Best {}ms", t))
                .unwrap_or_default(),
            message: self.reaction_time.map(|t| format!("{}ms", t)),
        }
    }

    fn draw(&self, list: &mut DrawList) {
        draw(self, list);
    }

    fn view_size(&self) -> Vec2 {
        VIEW
    }

    fn final_score(&self) -> u64 {
        self.streak as u64
    }

    fn set_best(&mut self, best: u64) {
        self.best_streak = self.best_streak.max(best.min(u32::MAX as u64) as u32);
    }

    fn autoplay(&mut self) {
        match self.phase {
            LightPhase::Active if self.active_for >= 0.25 => self.interact(),
            LightPhase::Idle | LightPhase::Success | LightPhase::Failure => self.interact(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn run_until_active(s: &mut LightStopState) -> u32 {
        let mut ticks = 0;
        while s.phase == LightPhase::Waiting {
            tick(s, SIM_DT);
            ticks += 1;
            assert!(ticks < 10_000);
        }
        ticks
    }

    #[test]
    fn test_wait_is_between_one_and_four_seconds() {
        for seed in 0..20 {
            let mut s = LightStopState::new(LightStopConfig::default(), seed);
            s.interact();
            assert_eq!(s.phase, LightPhase::Waiting);
            let ticks = run_until_active(&mut s);
            assert!((59..=241).contains(&ticks), "seed {} waited {} ticks", seed, ticks);
            assert_eq!(s.phase, LightPhase::Active);
        }
    }

    #[test]
    fn test_early_press_fails() {
        let mut s = LightStopState::new(LightStopConfig::default(), 1);
        s.streak = 4;
        s.interact();
        s.interact();
        assert_eq!(s.phase, LightPhase::Failure);
        assert_eq!(s.phase(), RunPhase::GameOver);
        assert_eq!(s.final_score(), 4);
        // The pending light must never come on
        for _ in 0..300 {
            tick(&mut s, SIM_DT);
        }
        assert_eq!(s.phase, LightPhase::Failure);
        // Retry resets the streak
        s.interact();
        assert_eq!(s.streak, 0);
        assert_eq!(s.phase, LightPhase::Waiting);
    }

    #[test]
    fn test_reaction_time_and_best() {
        let mut s = LightStopState::new(LightStopConfig::default(), 2);
        s.interact();
        run_until_active(&mut s);
        for _ in 0..18 {
            tick(&mut s, SIM_DT);
        }
        s.interact();
        assert_eq!(s.phase, LightPhase::Success);
        assert_eq!(s.reaction_time, Some(300));
        assert_eq!(s.best_time, Some(300));
        assert_eq!(s.streak, 1);

        s.interact();
        run_until_active(&mut s);
        for _ in 0..30 {
            tick(&mut s, SIM_DT);
        }
        s.interact();
        assert_eq!(s.reaction_time, Some(500));
        assert_eq!(s.best_time, Some(300));
        assert_eq!(s.streak, 2);
        assert_eq!(s.best_streak, 2);
    }

    #[test]
    fn test_drone_events_bracket_the_wait() {
        let mut s = LightStopState::new(LightStopConfig::default(), 3);
        s.interact();
        let ev = s.take_events();
        assert!(ev.contains(&GameEvent::DroneStart));
        run_until_active(&mut s);
        assert_eq!(s.take_events(), vec![GameEvent::DroneStop]);
    }
}
