//! Timed rock-paper-scissors rounds
//!
//! A round counts down, opens a short input window and then shows the result
//! before looping. Results accumulate in a `JankenHistory` that the owner reads
//! and resets.

use serde::{Deserialize, Serialize};

use super::GameEvent;
use crate::sim::{Countdown, GameRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    pub const ALL: [Hand; 3] = [Hand::Rock, Hand::Paper, Hand::Scissors];

    pub fn beats(&self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors) | (Hand::Paper, Hand::Rock) | (Hand::Scissors, Hand::Paper)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Hand::Rock => "ROCK",
            Hand::Paper => "PAPER",
            Hand::Scissors => "SCISSORS",
        }
    }

    /// Hand that beats this one
    pub fn counter(&self) -> Hand {
        match self {
            Hand::Rock => Hand::Paper,
            Hand::Paper => Hand::Scissors,
            Hand::Scissors => Hand::Rock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JankenResult {
    Win,
    Lose,
    Draw,
    /// No hand inside the input window; counts as a loss
    Timeout,
}

impl JankenResult {
    pub fn label(&self) -> &'static str {
        match self {
            JankenResult::Win => "WIN!",
            JankenResult::Lose => "LOSE",
            JankenResult::Draw => "DRAW",
            JankenResult::Timeout => "TIMEOUT",
        }
    }
}

pub fn judge(player: Hand, cpu: Hand) -> JankenResult {
    if player == cpu {
        JankenResult::Draw
    } else if player.beats(cpu) {
        JankenResult::Win
    } else {
        JankenResult::Lose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JankenLog {
    pub seq: u32,
    pub result: JankenResult,
    pub player: Option<Hand>,
    pub cpu: Hand,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JankenHistory {
    pub wins: u32,
    /// Includes timeouts
    pub loses: u32,
    pub draws: u32,
    pub total: u32,
    /// Newest first
    pub logs: Vec<JankenLog>,
}

impl JankenHistory {
    pub fn record(&mut self, log: JankenLog, keep: usize) {
        match log.result {
            JankenResult::Win => self.wins += 1,
            JankenResult::Lose | JankenResult::Timeout => self.loses += 1,
            JankenResult::Draw => self.draws += 1,
        }
        self.total += 1;
        self.logs.insert(0, log);
        self.logs.truncate(keep);
    }

    /// None until at least one round was played
    pub fn win_rate(&self) -> Option<f32> {
        if self.total == 0 {
            None
        } else {
            Some(self.wins as f32 / self.total as f32)
        }
    }

    pub fn is_winning(&self) -> bool {
        self.win_rate().is_some_and(|r| r > 0.5)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JankenConfig {
    pub countdown_from: u32,
    pub beat: f32,
    pub input_window: f32,
    pub result_time: f32,
    pub log_len: usize,
}

impl Default for JankenConfig {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            beat: 1.0,
            input_window: 1.0,
            result_time: 1.5,
            log_len: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JankenPhase {
    Idle,
    Countdown(u32),
    /// Hands accepted
    Input,
    Result,
}

#[derive(Debug, Clone)]
pub struct Janken {
    pub config: JankenConfig,
    pub phase: JankenPhase,
    /// Chosen at round start, hidden until the result
    pub cpu_hand: Option<Hand>,
    pub player_hand: Option<Hand>,
    pub result: Option<JankenResult>,
    pub history: JankenHistory,
    timer: Countdown,
    seq: u32,
}

impl Janken {
    pub fn new(config: JankenConfig) -> Self {
        Self {
            config,
            phase: JankenPhase::Idle,
            cpu_hand: None,
            player_hand: None,
            result: None,
            history: JankenHistory::default(),
            timer: Countdown::idle(),
            seq: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase != JankenPhase::Idle
    }

    pub fn start_round(&mut self, rng: &mut GameRng, events: &mut Vec<GameEvent>) {
        self.cpu_hand = rng.pick(&Hand::ALL);
        self.player_hand = None;
        self.result = None;
        self.phase = JankenPhase::Countdown(self.config.countdown_from);
        self.timer.start(self.config.beat);
        events.push(GameEvent::Count);
    }

    /// Go idle and forget every result
    pub fn stop(&mut self) {
        self.phase = JankenPhase::Idle;
        self.timer.stop();
        self.cpu_hand = None;
        self.player_hand = None;
        self.result = None;
        self.history.reset();
    }

    /// Throw a hand. Only counts inside the input window.
    pub fn play(&mut self, hand: Hand, events: &mut Vec<GameEvent>) -> Option<JankenResult> {
        if self.phase != JankenPhase::Input {
            return None;
        }
        let cpu = self.cpu_hand?;
        let result = judge(hand, cpu);
        self.player_hand = Some(hand);
        self.finish(result, cpu, events);
        Some(result)
    }

    fn finish(&mut self, result: JankenResult, cpu: Hand, events: &mut Vec<GameEvent>) {
        self.seq += 1;
        self.history.record(
            JankenLog {
                seq: self.seq,
                result,
                player: self.player_hand,
                cpu,
            },
            self.config.log_len,
        );
        self.result = Some(result);
        self.phase = JankenPhase::Result;
        self.timer.start(self.config.result_time);
        events.push(match result {
            JankenResult::Win => GameEvent::Win,
            JankenResult::Draw => GameEvent::Draw,
            JankenResult::Lose | JankenResult::Timeout => GameEvent::Lose,
        });
    }

    pub fn tick(&mut self, dt: f32, rng: &mut GameRng, events: &mut Vec<GameEvent>) {
        if !self.timer.tick(dt) {
            return;
        }
        match self.phase {
            JankenPhase::Countdown(n) if n > 1 => {
                self.phase = JankenPhase::Countdown(n - 1);
                self.timer.start(self.config.beat);
                events.push(GameEvent::Count);
            }
            JankenPhase::Countdown(_) => {
                self.phase = JankenPhase::Input;
                self.timer.start(self.config.input_window);
                events.push(GameEvent::Go);
            }
            JankenPhase::Input => {
                if let Some(cpu) = self.cpu_hand {
                    self.finish(JankenResult::Timeout, cpu, events);
                }
            }
            JankenPhase::Result => self.start_round(rng, events),
            JankenPhase::Idle => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn run(j: &mut Janken, rng: &mut GameRng, ticks: u32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            j.tick(SIM_DT, rng, &mut events);
        }
        events
    }

    #[test]
    fn test_judge_table() {
        assert_eq!(judge(Hand::Rock, Hand::Scissors), JankenResult::Win);
        assert_eq!(judge(Hand::Paper, Hand::Rock), JankenResult::Win);
        assert_eq!(judge(Hand::Scissors, Hand::Paper), JankenResult::Win);
        assert_eq!(judge(Hand::Rock, Hand::Paper), JankenResult::Lose);
        for h in Hand::ALL {
            assert_eq!(judge(h, h), JankenResult::Draw);
            assert_eq!(judge(h.counter(), h), JankenResult::Win);
        }
    }

    #[test]
    fn test_round_flow_and_timeout() {
        let mut rng = GameRng::new(1);
        let mut j = Janken::new(JankenConfig::default());
        let mut ev = Vec::new();
        j.start_round(&mut rng, &mut ev);
        assert_eq!(j.phase, JankenPhase::Countdown(3));
        // Too early
        assert_eq!(j.play(Hand::Rock, &mut ev), None);
        run(&mut j, &mut rng, 180);
        assert_eq!(j.phase, JankenPhase::Input);
        run(&mut j, &mut rng, 60);
        assert_eq!(j.phase, JankenPhase::Result);
        assert_eq!(j.result, Some(JankenResult::Timeout));
        assert_eq!(j.history.loses, 1);
        assert_eq!(j.history.total, 1);
        run(&mut j, &mut rng, 90);
        assert_eq!(j.phase, JankenPhase::Countdown(3));
    }

    #[test]
    fn test_play_in_window() {
        let mut rng = GameRng::new(2);
        let mut j = Janken::new(JankenConfig::default());
        let mut ev = Vec::new();
        j.start_round(&mut rng, &mut ev);
        run(&mut j, &mut rng, 180);
        let cpu = j.cpu_hand.unwrap();
        assert_eq!(j.play(cpu.counter(), &mut ev), Some(JankenResult::Win));
        assert_eq!(j.history.wins, 1);
        assert!(j.history.is_winning());
        // Window closed after the first hand
        assert_eq!(j.play(cpu.counter(), &mut ev), None);
    }

    #[test]
    fn test_history_keeps_five_newest() {
        let mut h = JankenHistory::default();
        for seq in 1..=7 {
            h.record(
                JankenLog {
                    seq,
                    result: JankenResult::Draw,
                    player: Some(Hand::Rock),
                    cpu: Hand::Rock,
                },
                5,
            );
        }
        assert_eq!(h.logs.len(), 5);
        assert_eq!(h.logs[0].seq, 7);
        assert_eq!(h.draws, 7);
        assert_eq!(h.win_rate(), Some(0.0));
        assert!(!h.is_winning());
        h.reset();
        assert_eq!(h.win_rate(), None);
    }

    #[test]
    fn test_stop_clears() {
        let mut rng = GameRng::new(3);
        let mut j = Janken::new(JankenConfig::default());
        let mut ev = Vec::new();
        j.start_round(&mut rng, &mut ev);
        j.history.wins = 3;
        j.history.total = 3;
        j.stop();
        assert!(!j.is_running());
        assert_eq!(j.history.total, 0);
        assert!(run(&mut j, &mut rng, 300).is_empty());
    }
}
