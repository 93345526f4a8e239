//! Frame driver shared by the web and native entry points
//!
//! Owns the menu, the running game, pause state and the leaderboards. The
//! platform layer feeds it actions, pointer events and real frame time, then
//! paints whatever `draw` produces and plays the returned events.

use std::collections::HashMap;

use glam::Vec2;

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::games::{Game, GameEvent, GameKind, Hud};
use crate::highscores::HighScores;
use crate::persistence::KeyValueStore;
use crate::platform::{self, Action, Pointer};
use crate::renderer::draw::with_alpha;
use crate::renderer::{Align, DrawList, colors, shapes};
use crate::settings::Settings;
use crate::sim::{Rect, RunPhase};

/// Logical size of the menu screen
pub const MENU_VIEW: Vec2 = Vec2::new(480.0, 640.0);
const MENU_TOP: f32 = 110.0;
const MENU_ROW: f32 = 44.0;

enum Screen {
    Menu { selected: usize },
    Playing { game: Box<dyn Game>, paused: bool },
}

pub struct Arcade {
    pub settings: Settings,
    /// Bots drive the game (demo mode)
    pub autoplay: bool,
    screen: Screen,
    scores: HashMap<GameKind, HighScores>,
    store: Box<dyn KeyValueStore>,
    accumulator: f32,
    last_phase: RunPhase,
    /// Rank of the most recent submitted score
    last_rank: Option<usize>,
    seed: u64,
    events: Vec<GameEvent>,
}

impl Arcade {
    pub fn new(store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        let settings = Settings::load(store.as_ref());
        let scores = GameKind::ALL
            .iter()
            .map(|&kind| (kind, HighScores::load(store.as_ref(), kind)))
            .collect();
        let selected = settings
            .last_game
            .and_then(|k| GameKind::ALL.iter().position(|&g| g == k))
            .unwrap_or(0);
        Self {
            settings,
            autoplay: false,
            screen: Screen::Menu { selected },
            scores,
            store,
            accumulator: 0.0,
            last_phase: RunPhase::Title,
            last_rank: None,
            seed,
            events: Vec::new(),
        }
    }

    /// Next run seed (splitmix64 step)
    fn next_seed(&mut self) -> u64 {
        self.seed = self.seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.seed;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn is_menu(&self) -> bool {
        matches!(self.screen, Screen::Menu { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.screen, Screen::Playing { paused: true, .. })
    }

    pub fn selected(&self) -> Option<GameKind> {
        match self.screen {
            Screen::Menu { selected } => GameKind::ALL.get(selected).copied(),
            Screen::Playing { .. } => None,
        }
    }

    pub fn current(&self) -> Option<&dyn Game> {
        match &self.screen {
            Screen::Playing { game, .. } => Some(game.as_ref()),
            Screen::Menu { .. } => None,
        }
    }

    pub fn current_kind(&self) -> Option<GameKind> {
        self.current().map(|g| g.kind())
    }

    pub fn scores(&self, kind: GameKind) -> Option<&HighScores> {
        self.scores.get(&kind)
    }

    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    pub fn save_settings(&mut self) {
        self.settings.save(self.store.as_mut());
    }

    /// Start `kind` with a fresh seed
    pub fn launch(&mut self, kind: GameKind) {
        let seed = self.next_seed();
        self.launch_seeded(kind, seed);
    }

    pub fn launch_seeded(&mut self, kind: GameKind, seed: u64) {
        let mut game = kind.create(seed);
        if let Some(best) = self.scores.get(&kind).and_then(|s| s.top_score()) {
            game.set_best(best);
        }
        self.last_phase = game.phase();
        self.accumulator = 0.0;
        self.last_rank = None;
        self.screen = Screen::Playing {
            game,
            paused: false,
        };
        if self.settings.last_game != Some(kind) {
            self.settings.last_game = Some(kind);
            self.settings.save(self.store.as_mut());
        }
        log::info!("Launched {} (seed {})", kind.id(), seed);
    }

    pub fn back_to_menu(&mut self) {
        let selected = self
            .current_kind()
            .and_then(|k| GameKind::ALL.iter().position(|&g| g == k))
            .unwrap_or(0);
        self.screen = Screen::Menu { selected };
        self.events.push(GameEvent::DroneStop);
    }

    pub fn set_paused(&mut self, pause: bool) {
        if let Screen::Playing { paused, .. } = &mut self.screen {
            if *paused != pause {
                *paused = pause;
                log::info!("{}", if pause { "Paused" } else { "Resumed" });
            }
        }
    }

    /// Tab hidden or window blurred: pause a run in progress
    pub fn auto_pause(&mut self) {
        let running = self
            .current()
            .is_some_and(|g| g.phase().is_playing());
        if running && !self.is_paused() {
            self.set_paused(true);
            self.events.push(GameEvent::DroneStop);
            log::info!("Auto-paused");
        }
    }

    pub fn press(&mut self, action: Action) {
        match &mut self.screen {
            Screen::Menu { selected } => {
                let n = GameKind::ALL.len();
                match action {
                    Action::Up | Action::Left => *selected = (*selected + n - 1) % n,
                    Action::Down | Action::Right => *selected = (*selected + 1) % n,
                    Action::Confirm => {
                        let kind = GameKind::ALL[*selected % n];
                        self.launch(kind);
                    }
                    _ => {}
                }
            }
            Screen::Playing { game, paused } => match action {
                Action::Back => self.back_to_menu(),
                Action::Pause => {
                    let pause = !*paused;
                    self.set_paused(pause);
                }
                Action::Confirm if *paused => self.set_paused(false),
                _ if *paused => {}
                _ => game.press(action),
            },
        }
    }

    pub fn release(&mut self, action: Action) {
        if let Screen::Playing {
            game,
            paused: false,
        } = &mut self.screen
        {
            game.release(action);
        }
    }

    pub fn pointer(&mut self, pointer: Pointer) {
        match &mut self.screen {
            Screen::Menu { .. } => {
                if let Pointer::Down(pos) = pointer {
                    if let Some(i) = menu_item_at(pos) {
                        self.launch(GameKind::ALL[i]);
                    }
                }
            }
            Screen::Playing { paused: true, .. } => {
                if let Pointer::Down(_) = pointer {
                    self.set_paused(false);
                }
            }
            Screen::Playing { game, .. } => game.pointer(pointer),
        }
    }

    /// Screen size changed, in CSS pixels
    pub fn resize(&mut self, size: Vec2) {
        if let Screen::Playing { game, .. } = &mut self.screen {
            game.resize(size);
        }
    }

    /// Advance by real frame time. Returns the events produced.
    pub fn frame(&mut self, dt: f32) -> Vec<GameEvent> {
        let dt = dt.clamp(0.0, 0.1);
        let Screen::Playing {
            game,
            paused: false,
        } = &mut self.screen
        else {
            self.accumulator = 0.0;
            return std::mem::take(&mut self.events);
        };

        self.accumulator += dt;
        let mut substeps = 0;
        let mut finished = None;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            if self.autoplay {
                game.autoplay();
            }
            game.tick(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            self.events.extend(game.take_events());

            let phase = game.phase();
            if phase != self.last_phase {
                if phase == RunPhase::GameOver {
                    finished = Some((game.kind(), game.final_score()));
                }
                self.last_phase = phase;
            }
        }
        // Drop backlog we could not catch up on
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        if let Some((kind, score)) = finished {
            self.record_score(kind, score);
        }
        std::mem::take(&mut self.events)
    }

    /// Submit a finished run to its leaderboard
    pub fn record_score(&mut self, kind: GameKind, score: u64) -> Option<usize> {
        let table = self.scores.entry(kind).or_default();
        let rank = table.add_score(score, platform::now_ms());
        if let Some(r) = rank {
            table.save(self.store.as_mut(), kind);
            log::info!("{}: score {} ranked #{}", kind.id(), score, r);
            if r == 1 {
                self.events.push(GameEvent::NewRecord);
            }
        }
        self.last_rank = rank;
        rank
    }

    pub fn hud(&self) -> Option<Hud> {
        self.current().map(|g| g.hud())
    }

    pub fn view_size(&self) -> Vec2 {
        self.current().map(|g| g.view_size()).unwrap_or(MENU_VIEW)
    }

    pub fn draw(&self) -> DrawList {
        let mut list = DrawList::new(self.view_size());
        match &self.screen {
            Screen::Menu { selected } => self.draw_menu(&mut list, *selected),
            Screen::Playing { game, paused } => {
                game.draw(&mut list);
                if !self.settings.effective_screen_shake() {
                    list.shake = Vec2::ZERO;
                }
                if *paused {
                    shapes::banner(&mut list, "PAUSED", &["Tap or press Space to resume".to_string()]);
                } else if let (RunPhase::GameOver, Some(rank)) = (game.phase(), self.last_rank) {
                    list.label(
                        Vec2::new(list.view.x * 0.5, list.view.y * 0.25),
                        format!("RANK #{}", rank),
                        22.0,
                        colors::COIN,
                    );
                }
            }
        }
        list
    }

    fn draw_menu(&self, list: &mut DrawList, selected: usize) {
        list.label(Vec2::new(MENU_VIEW.x * 0.5, 50.0), "PATOPO GAMES", 34.0, colors::TEXT);
        for (i, kind) in GameKind::ALL.iter().enumerate() {
            let row = menu_item_rect(i);
            let active = i == selected;
            list.rect(
                row,
                if active {
                    with_alpha(colors::ACCENT, 0.35)
                } else {
                    [1.0, 1.0, 1.0, 0.05]
                },
            );
            if active {
                list.outline(row, colors::ACCENT, 2.0);
            }
            let mid = row.center().y;
            list.text(Vec2::new(row.x + 12.0, mid - 7.0), kind.title(), 16.0, colors::TEXT, Align::Left);
            list.text(Vec2::new(row.x + 12.0, mid + 10.0), kind.blurb(), 11.0, colors::DIM, Align::Left);
            if let Some(best) = self.scores.get(kind).and_then(|s| s.top_score()) {
                list.text(
                    Vec2::new(row.right() - 12.0, mid),
                    format!("BEST {}", best),
                    13.0,
                    colors::COIN,
                    Align::Right,
                );
            }
        }
    }
}

fn menu_item_rect(i: usize) -> Rect {
    Rect::new(30.0, MENU_TOP + i as f32 * MENU_ROW, MENU_VIEW.x - 60.0, MENU_ROW - 6.0)
}

/// Menu row under a point in menu coordinates
pub fn menu_item_at(pos: Vec2) -> Option<usize> {
    (0..GameKind::ALL.len()).find(|&i| menu_item_rect(i).contains(pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn arcade() -> Arcade {
        Arcade::new(Box::new(MemoryStore::default()), 42)
    }

    #[test]
    fn test_menu_navigation_wraps() {
        let mut a = arcade();
        assert_eq!(a.selected(), Some(GameKind::ScrollRace));
        a.press(Action::Up);
        assert_eq!(a.selected(), Some(GameKind::PullTetris));
        a.press(Action::Down);
        a.press(Action::Down);
        assert_eq!(a.selected(), Some(GameKind::LaneRace));
        a.press(Action::Confirm);
        assert_eq!(a.current_kind(), Some(GameKind::LaneRace));
        assert_eq!(a.settings.last_game, Some(GameKind::LaneRace));
    }

    #[test]
    fn test_menu_rows_hit_test() {
        let row = menu_item_rect(3).center();
        assert_eq!(menu_item_at(row), Some(3));
        assert_eq!(menu_item_at(Vec2::new(5.0, 5.0)), None);
        let mut a = arcade();
        a.pointer(Pointer::Down(menu_item_rect(7).center()));
        assert_eq!(a.current_kind(), Some(GameKind::Door));
    }

    #[test]
    fn test_pause_freezes_ticks() {
        let mut a = arcade();
        a.launch_seeded(GameKind::LightStop, 1);
        a.press(Action::Confirm);
        a.press(Action::Pause);
        assert!(a.is_paused());
        let before = format!("{:?}", a.hud());
        for _ in 0..120 {
            a.frame(SIM_DT);
        }
        assert_eq!(format!("{:?}", a.hud()), before);
        a.press(Action::Confirm);
        assert!(!a.is_paused());
    }

    #[test]
    fn test_back_returns_to_menu_on_same_row() {
        let mut a = arcade();
        a.launch(GameKind::Punch);
        a.press(Action::Back);
        assert!(a.is_menu());
        assert_eq!(a.selected(), Some(GameKind::Punch));
    }

    #[test]
    fn test_frame_caps_substeps() {
        let mut a = arcade();
        a.launch_seeded(GameKind::JustStop, 3);
        a.frame(1.0);
        assert!(a.accumulator <= SIM_DT + 1e-6);
    }

    #[test]
    fn test_record_score_ranks_and_flags_record() {
        let mut a = arcade();
        assert_eq!(a.record_score(GameKind::Door, 4), Some(1));
        assert_eq!(a.record_score(GameKind::Door, 2), Some(2));
        assert_eq!(a.record_score(GameKind::Door, 0), None);
        assert_eq!(a.scores(GameKind::Door).and_then(|s| s.top_score()), Some(4));
        let events = a.frame(SIM_DT);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::NewRecord).count(), 1);
    }

    #[test]
    fn test_menu_draws_every_game() {
        let a = arcade();
        let list = a.draw();
        assert_eq!(list.view, MENU_VIEW);
        assert!(list.len() >= GameKind::ALL.len() * 3);
    }
}
