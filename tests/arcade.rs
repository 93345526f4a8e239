//! Driver-level flow: menu, runs, leaderboards surviving a reload.

use std::cell::RefCell;
use std::rc::Rc;

use patopo_arcade::consts::SIM_DT;
use patopo_arcade::persistence::{KeyValueStore, MemoryStore, StorageError};
use patopo_arcade::platform::Action;
use patopo_arcade::sim::RunPhase;
use patopo_arcade::{Arcade, GameEvent, GameKind, HighScores};

/// Store handle that outlives the arcade it is boxed into
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<MemoryStore>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.borrow_mut().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.0.borrow_mut().remove(key)
    }
}

/// Keep picking the left door until the run ends. Returns the floor reached.
fn play_door(arcade: &mut Arcade, seed: u64) -> u64 {
    arcade.launch_seeded(GameKind::Door, seed);
    for _ in 0..60 * 600 {
        arcade.press(Action::Choice(0));
        arcade.frame(SIM_DT);
        let game = arcade.current().expect("door running");
        if game.phase() == RunPhase::GameOver {
            return game.final_score();
        }
    }
    panic!("door run never ended");
}

#[test]
fn test_scores_survive_reload() {
    let store = SharedStore::default();
    let mut arcade = Arcade::new(Box::new(store.clone()), 1);

    let floors: Vec<u64> = (1..=20).map(|seed| play_door(&mut arcade, seed)).collect();
    let best = floors.iter().copied().max().unwrap_or(0);
    assert!(best > 0, "twenty runs all fell through the first door");
    assert_eq!(arcade.scores(GameKind::Door).and_then(|s| s.top_score()), Some(best));
    assert!(store.get(&HighScores::storage_key(GameKind::Door)).unwrap().is_some());

    let reloaded = Arcade::new(Box::new(store.clone()), 2);
    assert_eq!(reloaded.scores(GameKind::Door).and_then(|s| s.top_score()), Some(best));
    // Last opened game is preselected
    assert_eq!(reloaded.selected(), Some(GameKind::Door));
}

#[test]
fn test_best_is_seeded_into_new_runs() {
    let store = SharedStore::default();
    let mut arcade = Arcade::new(Box::new(store), 5);
    arcade.record_score(GameKind::Punch, 12);
    arcade.launch(GameKind::Punch);
    assert_eq!(arcade.hud().map(|h| h.best), Some(12));
}

#[test]
fn test_autoplay_demo_reaches_game_over() {
    let mut arcade = Arcade::new(Box::new(MemoryStore::default()), 9);
    arcade.autoplay = true;
    arcade.launch_seeded(GameKind::Door, 9);
    let mut overs = 0;
    for _ in 0..60 * 120 {
        overs += arcade
            .frame(SIM_DT)
            .iter()
            .filter(|e| **e == GameEvent::GameOver)
            .count();
        if overs > 0 {
            break;
        }
    }
    assert!(overs > 0);
}

#[test]
fn test_menu_to_game_and_back() {
    let mut arcade = Arcade::new(Box::new(MemoryStore::default()), 3);
    assert!(arcade.is_menu());
    for _ in 0..4 {
        arcade.press(Action::Down);
    }
    arcade.press(Action::Confirm);
    assert_eq!(arcade.current_kind(), Some(GameKind::LightStop));
    assert_eq!(arcade.view_size(), arcade.current().map(|g| g.view_size()).unwrap_or_default());

    let events = {
        arcade.press(Action::Back);
        arcade.frame(SIM_DT)
    };
    assert!(arcade.is_menu());
    assert!(events.contains(&GameEvent::DroneStop));
}

#[test]
fn test_pointless_run_leaves_table_alone() {
    let mut arcade = Arcade::new(Box::new(MemoryStore::default()), 4);
    arcade.record_score(GameKind::JustStop, 6000);
    arcade.launch_seeded(GameKind::JustStop, 1);
    arcade.press(Action::Confirm);
    arcade.frame(SIM_DT);
    // Nearly three seconds early: a miss worth nothing
    arcade.press(Action::Confirm);
    for _ in 0..3 {
        arcade.frame(SIM_DT);
    }
    assert_eq!(arcade.current().map(|g| g.phase()), Some(RunPhase::GameOver));
    assert_eq!(arcade.current().map(|g| g.final_score()), Some(0));
    let scores: Vec<u64> = arcade
        .scores(GameKind::JustStop)
        .map(|t| t.entries.iter().map(|e| e.score).collect())
        .unwrap_or_default();
    assert_eq!(scores, vec![6000]);
}

#[test]
fn test_recorded_score_matches_run_score_for_every_game() {
    let mut ended = Vec::new();
    for kind in GameKind::ALL {
        let mut arcade = Arcade::new(Box::new(MemoryStore::default()), 21);
        arcade.autoplay = true;
        arcade.launch_seeded(kind, 21);
        let mut last = RunPhase::Title;
        let mut finals = Vec::new();
        for _ in 0..60 * 180 {
            let phase = arcade.current().map(|g| g.phase()).expect("game running");
            if phase == RunPhase::Title {
                arcade.press(Action::Confirm);
            }
            arcade.frame(SIM_DT);
            let game = arcade.current().expect("game running");
            let phase = game.phase();
            if phase == RunPhase::GameOver && last != RunPhase::GameOver {
                assert_eq!(game.final_score(), game.hud().score, "{} run score", kind.id());
                finals.push(game.final_score());
            }
            last = phase;
        }
        if let Some(best) = finals.iter().copied().filter(|&s| s > 0).max() {
            assert_eq!(
                arcade.scores(kind).and_then(|t| t.top_score()),
                Some(best),
                "{} leaderboard",
                kind.id()
            );
        }
        if !finals.is_empty() {
            ended.push(kind);
        }
    }
    assert!(ended.contains(&GameKind::Door));
}
