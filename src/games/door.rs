//! Door Choice: two doors, one is safe. Climb as high as luck allows.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer};
use crate::renderer::draw::with_alpha;
use crate::renderer::{Align, DrawList, colors, shapes};
use crate::sim::{GameRng, Rect, RunPhase, Schedule};

const VIEW: Vec2 = Vec2::new(480.0, 640.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorConfig {
    pub door_count: usize,
    pub safe_chance: f32,
    /// Door swing time before the outcome shows
    pub reveal_delay: f32,
    pub resolve_delay: f32,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            door_count: 2,
            safe_chance: 0.5,
            reveal_delay: 0.8,
            resolve_delay: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorOutcome {
    Safe,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorStage {
    Choosing,
    Opening,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Reveal,
    Resolve,
}

#[derive(Debug, Clone)]
pub struct DoorState {
    pub config: DoorConfig,
    pub stage: DoorStage,
    pub floor: u64,
    pub best: u64,
    pub selected: Option<usize>,
    /// Rolled on selection, shown once revealed
    pub outcome: Option<DoorOutcome>,
    pub revealed: bool,
    /// Time since the door was picked
    pub opening_for: f32,
    pub events: Vec<GameEvent>,
    timers: Schedule<Timer>,
    rng: GameRng,
}

impl DoorState {
    pub fn new(config: DoorConfig, seed: u64) -> Self {
        Self {
            config,
            stage: DoorStage::Choosing,
            floor: 0,
            best: 0,
            selected: None,
            outcome: None,
            revealed: false,
            opening_for: 0.0,
            events: Vec::new(),
            timers: Schedule::new(),
            rng: GameRng::new(seed),
        }
    }

    pub fn reset(&mut self) {
        self.timers.cancel_all();
        self.stage = DoorStage::Choosing;
        self.floor = 0;
        self.selected = None;
        self.outcome = None;
        self.revealed = false;
        self.opening_for = 0.0;
        self.events.push(GameEvent::Start);
    }

    /// Open a door. Ignored while a door is already opening or the index is unknown.
    pub fn choose(&mut self, door: usize) {
        if self.stage != DoorStage::Choosing || door >= self.config.door_count {
            return;
        }
        let outcome = if self.rng.chance(self.config.safe_chance) {
            DoorOutcome::Safe
        } else {
            DoorOutcome::Out
        };
        self.selected = Some(door);
        self.outcome = Some(outcome);
        self.revealed = false;
        self.opening_for = 0.0;
        self.stage = DoorStage::Opening;
        self.timers.after(self.config.reveal_delay, Timer::Reveal);
        self.timers.after(self.config.resolve_delay, Timer::Resolve);
        self.events.push(GameEvent::Reveal);
        log::debug!("door: floor {} picked {} -> {:?}", self.floor, door, outcome);
    }

    fn door_rect(&self, door: usize) -> Rect {
        let n = self.config.door_count.max(1) as f32;
        let slot = VIEW.x / n;
        let w = (slot * 0.7).min(160.0);
        let h = w * 1.8;
        let cx = slot * (door as f32 + 0.5);
        Rect::from_center(Vec2::new(cx, VIEW.y * 0.55), Vec2::new(w, h))
    }

    fn door_at(&self, pos: Vec2) -> Option<usize> {
        (0..self.config.door_count).find(|&d| self.door_rect(d).contains(pos))
    }
}

pub fn tick(state: &mut DoorState, dt: f32) {
    if state.stage != DoorStage::Opening {
        return;
    }
    state.opening_for += dt;
    for timer in state.timers.tick(dt) {
        match timer {
            Timer::Reveal => {
                state.revealed = true;
                state.events.push(match state.outcome {
                    Some(DoorOutcome::Safe) => GameEvent::Safe,
                    _ => GameEvent::Fail,
                });
            }
            Timer::Resolve => match state.outcome {
                Some(DoorOutcome::Safe) => {
                    state.floor += 1;
                    state.stage = DoorStage::Choosing;
                    state.selected = None;
                    state.outcome = None;
                    state.revealed = false;
                }
                _ => {
                    state.stage = DoorStage::GameOver;
                    state.best = state.best.max(state.floor);
                    state.events.push(GameEvent::GameOver);
                    log::info!("door: out on floor {}", state.floor);
                }
            },
        }
    }
}

pub fn draw(state: &DoorState, list: &mut DrawList) {
    list.clear = [0.05, 0.05, 0.08, 1.0];
    let swing = (state.opening_for / state.config.reveal_delay.max(0.01)).clamp(0.0, 1.0);

    for door in 0..state.config.door_count {
        let frame = state.door_rect(door);
        list.rect(frame.inset(-10.0), colors::WALL);
        let picked = state.selected == Some(door);
        if picked && state.revealed {
            let light = match state.outcome {
                Some(DoorOutcome::Safe) => colors::GOOD,
                _ => colors::BAD,
            };
            list.rect(frame, with_alpha(light, 0.8));
            let text = match state.outcome {
                Some(DoorOutcome::Safe) => "SAFE",
                _ => "OUT",
            };
            list.label(frame.center(), text, 40.0, colors::TEXT);
        } else {
            list.rect(frame, [0.02, 0.02, 0.03, 1.0]);
        }
        // Leaf narrows as it swings open
        let open = if picked { swing } else { 0.0 };
        let leaf = Rect::new(frame.x, frame.y, frame.w * (1.0 - open * 0.85), frame.h);
        if leaf.w > 1.0 && !(picked && state.revealed && open >= 1.0) {
            list.rect(leaf, [0.45, 0.28, 0.14, 1.0]);
            list.circle(Vec2::new(leaf.right() - 14.0, leaf.center().y), 6.0, colors::COIN);
        }
        list.label(
            Vec2::new(frame.center().x, frame.bottom() + 30.0),
            (door + 1).to_string(),
            20.0,
            colors::DIM,
        );
    }

    list.text(Vec2::new(20.0, 36.0), format!("{}F", state.floor), 36.0, colors::TEXT, Align::Left);
    list.text(
        Vec2::new(VIEW.x - 20.0, 36.0),
        format!("BEST {}F", state.best),
        18.0,
        colors::COIN,
        Align::Right,
    );

    match state.stage {
        DoorStage::Choosing => list.label(
            Vec2::new(VIEW.x * 0.5, VIEW.y - 30.0),
            "Choose your door...",
            16.0,
            with_alpha(colors::TEXT, 0.7),
        ),
        DoorStage::GameOver => shapes::banner(
            list,
            "GAME OVER",
            &[format!("Reached floor {}", state.floor), "Tap to retry".to_string()],
        ),
        DoorStage::Opening => {}
    }
}

impl Game for DoorState {
    fn kind(&self) -> GameKind {
        GameKind::Door
    }

    fn phase(&self) -> RunPhase {
        match self.stage {
            DoorStage::GameOver => RunPhase::GameOver,
            _ => RunPhase::Playing,
        }
    }

    fn press(&mut self, action: Action) {
        match (self.stage, action) {
            (DoorStage::GameOver, Action::Confirm) => self.reset(),
            (_, Action::Left) => self.choose(0),
            (_, Action::Right) => self.choose(1),
            (_, Action::Choice(i)) => self.choose(i as usize),
            _ => {}
        }
    }

    fn pointer(&mut self, pointer: Pointer) {
        if let Pointer::Down(pos) = pointer {
            if self.stage == DoorStage::GameOver {
                self.reset();
            } else if let Some(door) = self.door_at(pos) {
                self.choose(door);
            }
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
            score: self.floor,
            best: self.best,
            info: format!("{}F", self.floor),
            message: None,
        }
    }

    fn draw(&self, list: &mut DrawList) {
        draw(self, list);
    }

    fn view_size(&self) -> Vec2 {
        VIEW
    }

    fn final_score(&self) -> u64 {
        self.floor
    }

    fn set_best(&mut self, best: u64) {
        self.best = self.best.max(best);
    }

    fn autoplay(&mut self) {
        match self.stage {
            DoorStage::Choosing => {
                let door = self.rng.index(self.config.door_count.max(1));
                self.choose(door);
            }
            DoorStage::GameOver => self.reset(),
            DoorStage::Opening => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn run(s: &mut DoorState, ticks: u32) {
        for _ in 0..ticks {
            tick(s, SIM_DT);
        }
    }

    #[test]
    fn test_safe_door_climbs() {
        let mut s = DoorState::new(
            DoorConfig {
                safe_chance: 1.0,
                ..Default::default()
            },
            1,
        );
        s.choose(1);
        assert_eq!(s.stage, DoorStage::Opening);
        run(&mut s, 47);
        assert!(!s.revealed);
        run(&mut s, 1);
        assert!(s.revealed);
        assert!(s.take_events().contains(&GameEvent::Safe));
        run(&mut s, 72);
        assert_eq!(s.floor, 1);
        assert_eq!(s.stage, DoorStage::Choosing);
        assert_eq!(s.selected, None);
    }

    #[test]
    fn test_out_door_ends_run() {
        let mut s = DoorState::new(
            DoorConfig {
                safe_chance: 0.0,
                ..Default::default()
            },
            2,
        );
        s.floor = 6;
        s.choose(0);
        run(&mut s, 120);
        assert_eq!(s.stage, DoorStage::GameOver);
        assert_eq!(s.best, 6);
        assert_eq!(s.final_score(), 6);
        s.press(Action::Confirm);
        assert_eq!(s.floor, 0);
        assert_eq!(s.stage, DoorStage::Choosing);
        assert_eq!(s.best, 6);
    }

    #[test]
    fn test_choice_ignored_while_opening_or_out_of_range() {
        let mut s = DoorState::new(DoorConfig::default(), 3);
        s.choose(5);
        assert_eq!(s.stage, DoorStage::Choosing);
        s.choose(0);
        s.choose(1);
        assert_eq!(s.selected, Some(0));
    }

    #[test]
    fn test_pointer_hits_door() {
        let mut s = DoorState::new(DoorConfig::default(), 4);
        let right = s.door_rect(1).center();
        s.pointer(Pointer::Down(Vec2::new(right.x, 10.0)));
        assert_eq!(s.selected, None);
        s.pointer(Pointer::Down(right));
        assert_eq!(s.selected, Some(1));
    }

    #[test]
    fn test_odds_are_even() {
        let mut s = DoorState::new(DoorConfig::default(), 5);
        let mut safe = 0;
        for _ in 0..1000 {
            s.stage = DoorStage::Choosing;
            s.choose(0);
            if s.outcome == Some(DoorOutcome::Safe) {
                safe += 1;
            }
        }
        assert!((400..600).contains(&safe), "safe {}", safe);
    }
}
