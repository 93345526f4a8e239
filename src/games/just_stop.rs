//! Just Stop Zero: stop a falling timer as close to 0.00 as possible
//!
//! Each cleared round tightens the allowed error. Missing the window ends the
//! streak; clearing it queues the next round automatically.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer};
use crate::renderer::{DrawList, colors, shapes};
use crate::sim::{RunPhase, Schedule};

const VIEW: Vec2 = Vec2::new(480.0, 640.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JustStopConfig {
    pub initial_time: f32,
    pub perfect_threshold: f32,
    pub great_threshold: f32,
    pub good_threshold: f32,
    /// Allowed error by combo; the last entry repeats
    pub level_thresholds: Vec<f32>,
    pub auto_restart_delay: f32,
    pub perfect_bonus: u64,
    pub combo_bonus: u64,
}

impl Default for JustStopConfig {
    fn default() -> Self {
        Self {
            initial_time: 3.0,
            perfect_threshold: 0.005,
            great_threshold: 0.05,
            good_threshold: 0.10,
            level_thresholds: vec![0.30, 0.20, 0.10, 0.08, 0.06, 0.04, 0.02, 0.005],
            auto_restart_delay: 1.2,
            perfect_bonus: 5000,
            combo_bonus: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    Perfect,
    Great,
    Good,
    Bad,
}

impl Rank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Perfect => "PERFECT",
            Rank::Great => "GREAT",
            Rank::Good => "GOOD",
            Rank::Bad => "BAD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopResult {
    /// Absolute distance from zero in seconds
    pub diff: f32,
    pub score: u64,
    pub is_new_record: bool,
    pub just_stop: bool,
    pub rank: Rank,
}

/// Screens of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Title,
    Playing,
    Result,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    AutoStart,
}

#[derive(Debug, Clone)]
pub struct JustStopState {
    pub config: JustStopConfig,
    pub screen: Screen,
    pub time_left: f32,
    pub combo: u32,
    pub best: u64,
    /// Best stop of the current run, reset when a run starts over
    pub run_best: u64,
    pub result: Option<StopResult>,
    pub events: Vec<GameEvent>,
    timers: Schedule<Timer>,
}

impl JustStopState {
    pub fn new(config: JustStopConfig) -> Self {
        Self {
            time_left: config.initial_time,
            config,
            screen: Screen::Title,
            combo: 0,
            best: 0,
            run_best: 0,
            result: None,
            events: Vec::new(),
            timers: Schedule::new(),
        }
    }

    /// Allowed error for the current combo
    pub fn threshold(&self) -> f32 {
        let t = &self.config.level_thresholds;
        let i = (self.combo as usize).min(t.len().saturating_sub(1));
        t.get(i).copied().unwrap_or(0.1)
    }

    /// 1-based level shown to the player
    pub fn level(&self) -> usize {
        (self.combo as usize).min(self.config.level_thresholds.len().saturating_sub(1)) + 1
    }

    pub fn rank_for(&self, diff: f32) -> Rank {
        let c = &self.config;
        if diff < c.perfect_threshold {
            Rank::Perfect
        } else if diff < c.great_threshold {
            Rank::Great
        } else if diff < c.good_threshold {
            Rank::Good
        } else {
            Rank::Bad
        }
    }

    /// Start a round. Any pending auto start is dropped.
    pub fn start(&mut self) {
        if matches!(self.screen, Screen::Title | Screen::GameOver) {
            self.run_best = 0;
        }
        self.timers.cancel_all();
        self.screen = Screen::Playing;
        self.result = None;
        self.time_left = self.config.initial_time;
        self.events.push(GameEvent::Count);
    }

    /// Judge a stop at `final_time` (seconds left on the clock)
    pub fn stop(&mut self, final_time: f32) {
        let diff = final_time.abs();
        let rank = self.rank_for(diff);
        let just_stop = rank == Rank::Perfect;
        self.time_left = final_time;

        if diff >= self.threshold() {
            log::info!("just stop: missed by {:.3}s at combo {}", diff, self.combo);
            self.screen = Screen::GameOver;
            self.combo = 0;
            self.result = Some(StopResult {
                diff,
                score: 0,
                is_new_record: false,
                just_stop,
                rank: Rank::Bad,
            });
            self.events.push(GameEvent::GameOver);
            return;
        }

        let mut score = (1000.0 - diff * 10000.0).floor().max(0.0) as u64;
        if rank == Rank::Perfect {
            score += self.config.perfect_bonus;
        }
        self.events.push(match rank {
            Rank::Perfect => GameEvent::Perfect,
            Rank::Great => GameEvent::Great,
            Rank::Good | Rank::Bad => GameEvent::Good,
        });
        score += self.combo as u64 * self.config.combo_bonus;
        self.run_best = self.run_best.max(score);

        let is_new_record = score > self.best;
        if is_new_record {
            self.best = score;
            self.events.push(GameEvent::NewRecord);
        }
        self.combo += 1;
        self.screen = Screen::Result;
        self.result = Some(StopResult {
            diff,
            score,
            is_new_record,
            just_stop,
            rank,
        });
        log::info!("just stop: {} ({:.3}s) score {}", rank.as_str(), diff, score);
        self.timers.after(self.config.auto_restart_delay, Timer::AutoStart);
    }

    /// The single button: stop while running, otherwise start a round
    pub fn interact(&mut self) {
        match self.screen {
            Screen::Playing => {
                let t = self.time_left;
                self.stop(t);
                self.events.push(GameEvent::Stop);
            }
            _ => self.start(),
        }
    }
}

pub fn tick(state: &mut JustStopState, dt: f32) {
    let mut restarted = false;
    for timer in state.timers.tick(dt) {
        match timer {
            Timer::AutoStart => {
                state.start();
                restarted = true;
            }
        }
    }

    // A fresh round shows the full clock for one frame
    if state.screen == Screen::Playing && !restarted {
        state.time_left -= dt;
        if state.time_left < -state.threshold() {
            let t = state.time_left;
            state.stop(t);
        }
    }
}

pub fn draw(state: &JustStopState, list: &mut DrawList) {
    let mid = VIEW * 0.5;
    let running = state.screen == Screen::Playing;
    let clock_color = if running { colors::TEXT } else { colors::COIN };
    list.label(mid, format!("{:.2}", state.time_left), 120.0, clock_color);
    list.label(
        Vec2::new(mid.x, 60.0),
        format!("LEVEL {}  ±{:.3}s", state.level(), state.threshold()),
        22.0,
        colors::DIM,
    );
    if state.combo > 0 {
        list.label(Vec2::new(mid.x, 100.0), format!("{} COMBO", state.combo), 26.0, colors::ACCENT);
    }

    match state.screen {
        Screen::Title => shapes::banner(list, "JUST STOP 0.00", &["Tap to start".to_string()]),
        Screen::Result => {
            if let Some(r) = &state.result {
                let mut text = format!("{}  +{}", r.rank.as_str(), r.score);
                if r.is_new_record {
                    text.push_str("  NEW RECORD!");
                }
                list.label(Vec2::new(mid.x, mid.y + 110.0), text, 28.0, colors::GOOD);
            }
        }
        Screen::GameOver => {
            let diff = state.result.map(|r| r.diff).unwrap_or(0.0);
            shapes::banner(
                list,
                "GAME OVER",
                &[format!("Off by {:.2}s", diff), "Tap to retry".to_string()],
            );
        }
        Screen::Playing => {}
    }
}

impl Game for JustStopState {
    fn kind(&self) -> GameKind {
        GameKind::JustStop
    }

    fn phase(&self) -> RunPhase {
        match self.screen {
            Screen::Title => RunPhase::Title,
            Screen::Playing | Screen::Result => RunPhase::Playing,
            Screen::GameOver => RunPhase::GameOver,
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
            score: self.run_best,
            best: self.best,
            info: format!("Combo {}", self.combo),
            message: self.result.map(|r| r.rank.as_str().to_string()),
        }
    }

    fn draw(&self, list: &mut DrawList) {
        draw(self, list);
    }

    fn view_size(&self) -> Vec2 {
        VIEW
    }

    fn final_score(&self) -> u64 {
        self.run_best
    }

    fn set_best(&mut self, best: u64) {
        self.best = self.best.max(best);
    }

    fn autoplay(&mut self) {
        match self.screen {
            Screen::Playing if self.time_left <= 0.0 => self.interact(),
            Screen::Title | Screen::GameOver => self.interact(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn playing() -> JustStopState {
        let mut s = JustStopState::new(JustStopConfig::default());
        s.interact();
        s
    }

    #[test]
    fn test_rank_table() {
        let s = JustStopState::new(JustStopConfig::default());
        assert_eq!(s.rank_for(0.004), Rank::Perfect);
        assert_eq!(s.rank_for(0.03), Rank::Great);
        assert_eq!(s.rank_for(0.07), Rank::Good);
        assert_eq!(s.rank_for(0.2), Rank::Bad);
    }

    #[test]
    fn test_thresholds_tighten_with_combo() {
        let mut s = JustStopState::new(JustStopConfig::default());
        assert_eq!(s.threshold(), 0.30);
        s.combo = 3;
        assert_eq!(s.threshold(), 0.08);
        s.combo = 50;
        assert_eq!(s.threshold(), 0.005);
        assert_eq!(s.level(), 8);
    }

    #[test]
    fn test_perfect_scoring() {
        let mut s = playing();
        s.combo = 2;
        s.stop(0.0);
        let r = s.result.unwrap();
        assert_eq!(r.rank, Rank::Perfect);
        assert!(r.just_stop);
        assert_eq!(r.score, 1000 + 5000 + 200);
        assert_eq!(s.combo, 3);
        assert_eq!(s.screen, Screen::Result);
        assert!(r.is_new_record);
    }

    #[test]
    fn test_score_floor_is_zero() {
        let mut s = playing();
        s.stop(-0.25);
        let r = s.result.unwrap();
        assert_eq!(r.rank, Rank::Bad);
        assert_eq!(r.score, 0);
        assert_eq!(s.screen, Screen::Result);
    }

    #[test]
    fn test_miss_ends_streak() {
        let mut s = playing();
        s.combo = 4;
        s.best = 9999;
        s.stop(0.07);
        assert_eq!(s.screen, Screen::GameOver);
        assert_eq!(s.combo, 0);
        assert_eq!(s.result.unwrap().score, 0);
    }

    #[test]
    fn test_auto_restart_after_result() {
        let mut s = playing();
        s.stop(0.01);
        assert_eq!(s.screen, Screen::Result);
        for _ in 0..71 {
            tick(&mut s, SIM_DT);
        }
        assert_eq!(s.screen, Screen::Result);
        tick(&mut s, SIM_DT);
        assert_eq!(s.screen, Screen::Playing);
        assert_eq!(s.time_left, 3.0);
        tick(&mut s, SIM_DT);
        assert!(s.time_left < 3.0);
    }

    #[test]
    fn test_run_score_is_best_stop_of_this_run() {
        let mut s = playing();
        s.best = 6000;
        s.stop(0.01);
        let first = s.result.unwrap().score;
        s.interact();
        s.stop(0.04);
        assert_eq!(s.final_score(), first);
        assert_eq!(s.hud().score, first);
        assert_eq!(s.best, 6000);

        s.interact();
        s.stop(1.5);
        assert_eq!(s.screen, Screen::GameOver);
        assert_eq!(s.final_score(), first);

        // Retry starts a new run from zero
        s.interact();
        assert_eq!(s.final_score(), 0);
        s.stop(2.0);
        assert_eq!(s.phase(), RunPhase::GameOver);
        assert_eq!(s.final_score(), 0);
        assert_eq!(s.hud().score, 0);
    }

    #[test]
    fn test_manual_start_cancels_auto_restart() {
        let mut s = playing();
        s.stop(0.01);
        s.interact();
        assert_eq!(s.screen, Screen::Playing);
        // Stop again; the first round's timer must not restart us early
        s.stop(0.01);
        for _ in 0..60 {
            tick(&mut s, SIM_DT);
        }
        assert_eq!(s.screen, Screen::Result);
    }

    #[test]
    fn test_overrun_auto_fails() {
        let mut s = playing();
        s.combo = 7;
        for _ in 0..400 {
            tick(&mut s, SIM_DT);
            if s.screen != Screen::Playing {
                break;
            }
        }
        assert_eq!(s.screen, Screen::GameOver);
        assert!(s.time_left < -0.005);
    }
}
