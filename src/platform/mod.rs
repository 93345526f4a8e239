//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (keys, pointer gestures)
//! - Time and run seeds

pub mod input;

pub use input::{Action, Pointer, SwipeTracker, action_for_key};

/// Wall-clock milliseconds, used for seeds and leaderboard timestamps
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Fresh seed for a new run
pub fn run_seed() -> u64 {
    now_ms() as u64
}
