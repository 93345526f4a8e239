//! Tick-driven timers
//!
//! Delayed transitions (telegraph windows, result screens, auto restarts) are
//! owned by the game state and advanced by `dt` each tick, so resetting a game
//! drops every pending delay with it.

use serde::{Deserialize, Serialize};

/// Slack for float accumulation: a 1 s timer driven by sixty 1/60 s ticks
/// must fire on the 60th tick.
const EPSILON: f32 = 1e-4;

/// One-shot countdown that remembers its full duration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Countdown {
    duration: f32,
    remaining: f32,
    running: bool,
}

impl Countdown {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            remaining: duration,
            running: true,
        }
    }

    /// A countdown that is not running
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn start(&mut self, duration: f32) {
        *self = Self::new(duration);
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Fraction elapsed in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining / self.duration).clamp(0.0, 1.0)
    }

    /// Advance; returns true exactly once, on the tick the countdown expires
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.running {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= EPSILON {
            self.remaining = 0.0;
            self.running = false;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Pending<E> {
    remaining: f32,
    seq: u64,
    event: E,
}

/// A set of delayed events, each firing exactly once unless cancelled
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule<E> {
    pending: Vec<Pending<E>>,
    next_seq: u64,
}

impl<E> Default for Schedule<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<E> Schedule<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` to fire after `delay` seconds
    pub fn after(&mut self, delay: f32, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            remaining: delay.max(0.0),
            seq,
            event,
        });
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn cancel_where(&mut self, mut pred: impl FnMut(&E) -> bool) {
        self.pending.retain(|p| !pred(&p.event));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, mut pred: impl FnMut(&E) -> bool) -> bool {
        self.pending.iter().any(|p| pred(&p.event))
    }

    /// Advance all timers and return the events that came due, earliest first
    pub fn tick(&mut self, dt: f32) -> Vec<E> {
        for p in &mut self.pending {
            p.remaining -= dt;
        }
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].remaining <= EPSILON {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| {
            a.remaining
                .partial_cmp(&b.remaining)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        });
        due.into_iter().map(|p| p.event).collect()
    }
}

/// Brief freeze of game advancement after an impact
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HitStop {
    remaining: f32,
}

impl HitStop {
    /// Start (or extend) a freeze of `secs`
    pub fn trigger(&mut self, secs: f32) {
        self.remaining = self.remaining.max(secs);
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }

    /// Consume `dt` of freeze time. Returns true if this tick is frozen.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= EPSILON {
            self.remaining = 0.0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    #[test]
    fn test_countdown_fires_once() {
        let mut c = Countdown::new(1.0);
        let mut fired = 0;
        for _ in 0..120 {
            if c.tick(SIM_DT) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert!(!c.is_running());
    }

    #[test]
    fn test_countdown_fires_on_exact_tick() {
        let mut c = Countdown::new(1.0);
        for _ in 0..59 {
            assert!(!c.tick(SIM_DT));
        }
        assert!(c.tick(SIM_DT));
    }

    #[test]
    fn test_countdown_progress() {
        let mut c = Countdown::new(2.0);
        c.tick(0.5);
        assert!((c.progress() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_schedule_order_and_once() {
        let mut s = Schedule::new();
        s.after(0.3, "late");
        s.after(0.1, "early");
        s.after(0.1, "early2");
        assert!(s.tick(0.05).is_empty());
        assert_eq!(s.tick(0.3), vec!["early", "early2", "late"]);
        assert!(s.tick(1.0).is_empty());
        assert!(s.is_empty());
    }

    #[test]
    fn test_schedule_cancel() {
        let mut s = Schedule::new();
        s.after(0.1, 1);
        s.after(0.1, 2);
        s.cancel_where(|e| *e == 1);
        assert_eq!(s.tick(0.2), vec![2]);

        s.after(0.1, 3);
        s.cancel_all();
        assert!(s.tick(0.2).is_empty());
    }

    #[test]
    fn test_hit_stop_freezes_for_duration() {
        let mut h = HitStop::default();
        h.trigger(0.1);
        let frozen = (0..20).filter(|_| h.tick(SIM_DT)).count();
        assert_eq!(frozen, 6);
        assert!(!h.is_active());
    }
}
