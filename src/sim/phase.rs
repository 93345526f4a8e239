//! The title → playing → gameover lifecycle most games share

use serde::{Deserialize, Serialize};

/// Coarse run phase of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunPhase {
    /// Waiting for the player to start
    #[default]
    Title,
    /// Active gameplay
    Playing,
    /// Run ended, showing results
    GameOver,
}

impl RunPhase {
    pub fn is_playing(&self) -> bool {
        matches!(self, RunPhase::Playing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Title => "title",
            RunPhase::Playing => "playing",
            RunPhase::GameOver => "gameover",
        }
    }
}
