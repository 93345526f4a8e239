//! Patopo Arcade - a collection of small browser mini-games
//!
//! Core modules:
//! - `arcade`: Platform-free frame driver (menu, fixed timestep, leaderboards)
//! - `sim`: Deterministic primitives (rects, seeded RNG, timers, block grid)
//! - `games`: One module per mini-game, behind the `Game` trait
//! - `renderer`: Draw lists, painted with Canvas 2D on the web
//! - `platform`: Browser/native input abstraction
//! - `persistence`: Key-value storage with a versioned JSON envelope

pub mod arcade;
#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod games;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use arcade::Arcade;
pub use games::{Game, GameEvent, GameKind, Hud};
pub use highscores::HighScores;
pub use settings::Settings;

/// Crate-wide constants
pub mod consts {
    /// Fixed simulation timestep, one 60 Hz animation frame
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;
}
