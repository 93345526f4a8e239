//! The mini-games
//!
//! Each module owns one game: its tuning `Config`, its state, a `tick` that
//! advances one fixed step, and a `draw` that emits a `DrawList`. The frame
//! driver only talks to games through the `Game` trait.

pub mod aesthetic;
pub mod door;
pub mod janken;
pub mod janken_tetris;
pub mod jump_runner;
pub mod just_stop;
pub mod lane_race;
pub mod light_stop;
pub mod pull_tetris;
pub mod punch;
pub mod scroll_race;
pub mod up_down;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::platform::input::{Action, Pointer};
use crate::renderer::DrawList;
use crate::sim::RunPhase;

/// Something happened that the presentation layer may want to react to
/// (sound, flash). Games push these during `tick`/input and the driver
/// drains them once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Start,
    Coin,
    Crash,
    Jump,
    Milestone,
    /// Timer stopped by the player
    Stop,
    Perfect,
    Great,
    Good,
    Fail,
    NewRecord,
    /// Countdown beat (3, 2, 1)
    Count,
    Go,
    Correct,
    Miss,
    Combo,
    Dodge,
    Damage,
    Punch,
    Reveal,
    Safe,
    Win,
    Lose,
    Draw,
    Move,
    Rotate,
    Lock,
    LineClear(u32),
    Shoot,
    Snap,
    DroneStart,
    DroneStop,
    GameOver,
}

/// Text shown around the canvas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hud {
    pub score: u64,
    pub best: u64,
    /// Game-specific line (combo, lives, floor...)
    pub info: String,
    /// Centre message (title prompt, result)
    pub message: Option<String>,
}

/// Catalogue of every game on the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    ScrollRace,
    LaneRace,
    JumpRunner,
    JustStop,
    LightStop,
    Punch,
    UpDown,
    Door,
    JankenTetris,
    Aesthetic,
    PullTetris,
}

impl GameKind {
    pub const ALL: [GameKind; 11] = [
        GameKind::ScrollRace,
        GameKind::LaneRace,
        GameKind::JumpRunner,
        GameKind::JustStop,
        GameKind::LightStop,
        GameKind::Punch,
        GameKind::UpDown,
        GameKind::Door,
        GameKind::JankenTetris,
        GameKind::Aesthetic,
        GameKind::PullTetris,
    ];

    /// URL-friendly identifier, also used as the storage key suffix
    pub fn id(&self) -> &'static str {
        match self {
            GameKind::ScrollRace => "background-scroll-race",
            GameKind::LaneRace => "background-scroll-race-v2",
            GameKind::JumpRunner => "tap-jump-runner",
            GameKind::JustStop => "just-stop-zero",
            GameKind::LightStop => "light-stop",
            GameKind::Punch => "reading-punch-boxing",
            GameKind::UpDown => "up-down-choice",
            GameKind::Door => "door-choice",
            GameKind::JankenTetris => "tetris-janken",
            GameKind::Aesthetic => "tetris-aesthetic",
            GameKind::PullTetris => "pull-tetris",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.id() == id)
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::ScrollRace => "Scroll Race",
            GameKind::LaneRace => "Lane Race",
            GameKind::JumpRunner => "Tap Jump Runner",
            GameKind::JustStop => "Just Stop Zero",
            GameKind::LightStop => "Light Stop",
            GameKind::Punch => "Reading Punch",
            GameKind::UpDown => "Up Down Choice",
            GameKind::Door => "Door Choice",
            GameKind::JankenTetris => "Janken Tetris",
            GameKind::Aesthetic => "Aesthetic Tetris",
            GameKind::PullTetris => "Pull Tetris",
        }
    }

    pub fn blurb(&self) -> &'static str {
        match self {
            GameKind::ScrollRace => "Dodge traffic, grab coins",
            GameKind::LaneRace => "Three lanes, no brakes",
            GameKind::JumpRunner => "Tap to jump, up to three times",
            GameKind::JustStop => "Stop the timer at 0.00",
            GameKind::LightStop => "Press the moment it turns green",
            GameKind::Punch => "Read the telegraph, dodge the punch",
            GameKind::UpDown => "Even left, odd right",
            GameKind::Door => "One door is safe",
            GameKind::JankenTetris => "Win at janken, get good blocks",
            GameKind::Aesthetic => "Stack for beauty",
            GameKind::PullTetris => "Pull, aim, release",
        }
    }

    /// Create a fresh game with default tuning
    pub fn create(&self, seed: u64) -> Box<dyn Game> {
        match self {
            GameKind::ScrollRace => Box::new(scroll_race::RaceState::new(Default::default(), seed)),
            GameKind::LaneRace => Box::new(lane_race::LaneRaceState::new(Default::default(), seed)),
            GameKind::JumpRunner => Box::new(jump_runner::RunnerState::new(Default::default(), seed)),
            GameKind::JustStop => Box::new(just_stop::JustStopState::new(Default::default())),
            GameKind::LightStop => Box::new(light_stop::LightStopState::new(Default::default(), seed)),
            GameKind::Punch => Box::new(punch::PunchState::new(Default::default(), seed)),
            GameKind::UpDown => Box::new(up_down::UpDownState::new(Default::default(), seed)),
            GameKind::Door => Box::new(door::DoorState::new(Default::default(), seed)),
            GameKind::JankenTetris => {
                Box::new(janken_tetris::JankenTetrisState::new(Default::default(), seed))
            }
            GameKind::Aesthetic => Box::new(aesthetic::AestheticState::new(Default::default(), seed)),
            GameKind::PullTetris => Box::new(pull_tetris::PullState::new(Default::default(), seed)),
        }
    }
}

/// Seam between the frame driver and a game
pub trait Game {
    fn kind(&self) -> GameKind;

    fn phase(&self) -> RunPhase;

    /// Key or button pressed
    fn press(&mut self, action: Action);

    /// Key or button released
    fn release(&mut self, _action: Action) {}

    /// Pointer event in the game's logical coordinates
    fn pointer(&mut self, _pointer: Pointer) {}

    /// Advance one fixed step
    fn tick(&mut self, dt: f32);

    /// Drain events produced since the last call
    fn take_events(&mut self) -> Vec<GameEvent>;

    fn hud(&self) -> Hud;

    fn draw(&self, list: &mut DrawList);

    /// Logical size of the play field
    fn view_size(&self) -> Vec2;

    /// Screen size changed (logical pixels)
    fn resize(&mut self, _size: Vec2) {}

    /// Score submitted to the leaderboard when a run ends
    fn final_score(&self) -> u64;

    /// Seed the in-game best from the persisted leaderboard
    fn set_best(&mut self, best: u64);

    /// Feed inputs a simple bot would choose. Used by demo mode.
    fn autoplay(&mut self) {}
}
