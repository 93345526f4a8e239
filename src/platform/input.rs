//! Input mapping
//!
//! Browser keys and pointer gestures become a small set of `Action`s so game
//! code never sees DOM strings.

use glam::Vec2;

/// Logical input understood by every game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    /// Space / Enter / tap
    Confirm,
    Rotate,
    /// Numbered choice (janken hand, door)
    Choice(u8),
    Back,
    Pause,
}

/// Pointer gesture in game-logical coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pointer {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
}

/// Map a `KeyboardEvent.key` value to an action
pub fn action_for_key(key: &str) -> Option<Action> {
    match key {
        "ArrowLeft" | "a" | "A" => Some(Action::Left),
        "ArrowRight" | "d" | "D" => Some(Action::Right),
        "ArrowUp" | "w" | "W" => Some(Action::Up),
        "ArrowDown" | "s" | "S" => Some(Action::Down),
        " " | "Enter" => Some(Action::Confirm),
        "x" | "X" | "r" | "R" => Some(Action::Rotate),
        "1" => Some(Action::Choice(0)),
        "2" => Some(Action::Choice(1)),
        "3" => Some(Action::Choice(2)),
        "Escape" => Some(Action::Back),
        "p" | "P" => Some(Action::Pause),
        _ => None,
    }
}

/// Minimum travel before a drag counts as a swipe
pub const SWIPE_THRESHOLD: f32 = 30.0;

/// Tracks one pointer from down to up and classifies the gesture
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start: Option<Vec2>,
}

impl SwipeTracker {
    pub fn begin(&mut self, pos: Vec2) {
        self.start = Some(pos);
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    /// Finish the gesture. Returns the dominant swipe direction, or
    /// `Confirm` for a tap that stayed under the threshold.
    pub fn end(&mut self, pos: Vec2) -> Option<Action> {
        let start = self.start.take()?;
        let d = pos - start;
        if d.x.abs() < SWIPE_THRESHOLD && d.y.abs() < SWIPE_THRESHOLD {
            return Some(Action::Confirm);
        }
        if d.x.abs() >= d.y.abs() {
            Some(if d.x < 0.0 { Action::Left } else { Action::Right })
        } else {
            Some(if d.y < 0.0 { Action::Up } else { Action::Down })
        }
    }

    pub fn cancel(&mut self) {
        self.start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(action_for_key("ArrowLeft"), Some(Action::Left));
        assert_eq!(action_for_key(" "), Some(Action::Confirm));
        assert_eq!(action_for_key("2"), Some(Action::Choice(1)));
        assert_eq!(action_for_key("F5"), None);
    }

    #[test]
    fn test_swipe_directions() {
        let mut t = SwipeTracker::default();
        t.begin(Vec2::new(100.0, 100.0));
        assert_eq!(t.end(Vec2::new(40.0, 110.0)), Some(Action::Left));
        t.begin(Vec2::new(100.0, 100.0));
        assert_eq!(t.end(Vec2::new(105.0, 180.0)), Some(Action::Down));
        t.begin(Vec2::new(100.0, 100.0));
        assert_eq!(t.end(Vec2::new(110.0, 90.0)), Some(Action::Confirm));
        assert_eq!(t.end(Vec2::ZERO), None);
    }
}
