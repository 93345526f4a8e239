//! Deterministic simulation primitives
//!
//! Shared by every game module. This module must stay pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod grid;
pub mod phase;
pub mod rect;
pub mod rng;
pub mod timer;

pub use grid::{BOARD_HEIGHT, BOARD_WIDTH, Board, Piece, PieceKind, Shape};
pub use phase::RunPhase;
pub use rect::Rect;
pub use rng::GameRng;
pub use timer::{Countdown, HitStop, Schedule};

/// Hands out entity ids, stable for an entity's lifetime
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u32,
}

impl IdGen {
    pub fn next_id(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}
