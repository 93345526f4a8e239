//! Janken Tetris: win rock-paper-scissors to earn friendly blocks
//!
//! Janken rounds loop under the board. Every spawn looks at the win rate since
//! the previous spawn: better than even gives an I or O, anything else one of
//! the awkward shapes. The history is cleared after each spawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::janken::{Hand, Janken, JankenConfig, JankenPhase, JankenResult};
use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer};
use crate::renderer::draw::with_alpha;
use crate::renderer::{Align, DrawList, colors, shapes};
use crate::sim::{Board, Countdown, GameRng, Piece, PieceKind, Rect, RunPhase};

const VIEW: Vec2 = Vec2::new(400.0, 820.0);
const CELL: f32 = 30.0;
const BOARD_ORIGIN: Vec2 = Vec2::new(50.0, 50.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JankenTetrisConfig {
    pub gravity: f32,
    pub line_points: u64,
    pub janken: JankenConfig,
}

impl Default for JankenTetrisConfig {
    fn default() -> Self {
        Self {
            gravity: 0.8,
            line_points: 100,
            janken: JankenConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JankenTetrisState {
    pub config: JankenTetrisConfig,
    pub phase: RunPhase,
    pub board: Board,
    pub current: Option<Piece>,
    pub score: u64,
    pub best: u64,
    pub lines: u32,
    pub janken: Janken,
    pub events: Vec<GameEvent>,
    gravity: Countdown,
    rng: GameRng,
}

impl JankenTetrisState {
    pub fn new(config: JankenTetrisConfig, seed: u64) -> Self {
        Self {
            janken: Janken::new(config.janken.clone()),
            config,
            phase: RunPhase::Title,
            board: Board::default(),
            current: None,
            score: 0,
            best: 0,
            lines: 0,
            events: Vec::new(),
            gravity: Countdown::idle(),
            rng: GameRng::new(seed),
        }
    }

    pub fn start(&mut self) {
        self.board.clear();
        self.score = 0;
        self.lines = 0;
        self.current = None;
        self.phase = RunPhase::Playing;
        self.janken.stop();
        self.janken.start_round(&mut self.rng, &mut self.events);
        self.events.push(GameEvent::Start);
        self.spawn();
        self.gravity.start(self.config.gravity);
        log::info!("janken tetris: start");
    }

    /// Block pool the next spawn draws from
    pub fn next_pool(&self) -> &'static [PieceKind] {
        if self.janken.history.is_winning() {
            &PieceKind::FRIENDLY
        } else {
            &PieceKind::AWKWARD
        }
    }

    fn spawn(&mut self) {
        let pool = self.next_pool();
        let kind = self.rng.pick(pool).unwrap_or(PieceKind::O);
        self.janken.history.reset();
        let piece = Piece::spawn(kind, self.board.width());
        if self.board.collides(&piece.shape, piece.x, piece.y) {
            self.current = None;
            self.game_over();
        } else {
            log::debug!("janken tetris: spawn {:?}", kind);
            self.current = Some(piece);
        }
    }

    fn game_over(&mut self) {
        self.phase = RunPhase::GameOver;
        self.best = self.best.max(self.score);
        self.janken.stop();
        self.gravity.stop();
        self.events.push(GameEvent::GameOver);
        log::info!("janken tetris: game over, score {}", self.score);
    }

    fn place(&mut self) {
        let Some(piece) = self.current.take() else {
            return;
        };
        self.board.lock(&piece);
        self.events.push(GameEvent::Lock);
        let cleared = self.board.clear_full_rows();
        if cleared > 0 {
            self.lines += cleared;
            self.score += cleared as u64 * self.config.line_points;
            self.events.push(GameEvent::LineClear(cleared));
        }
        self.spawn();
    }

    /// Shift the falling piece. A blocked downward move locks it.
    pub fn shift(&mut self, dx: i32, dy: i32) {
        if self.phase != RunPhase::Playing {
            return;
        }
        let Some(piece) = self.current.as_mut() else {
            return;
        };
        if piece.try_shift(&self.board, dx, dy) {
            if dx != 0 {
                self.events.push(GameEvent::Move);
            }
        } else if dy > 0 {
            self.place();
        }
    }

    /// Rotate in place, no wall kicks
    pub fn rotate(&mut self) {
        if self.phase != RunPhase::Playing {
            return;
        }
        let rotated = match self.current.as_mut() {
            Some(piece) => piece.try_rotate(&self.board, &[0]),
            None => false,
        };
        if rotated {
            self.events.push(GameEvent::Rotate);
        }
    }

    pub fn throw(&mut self, hand: Hand) -> Option<JankenResult> {
        if self.phase != RunPhase::Playing {
            return None;
        }
        self.janken.play(hand, &mut self.events)
    }

    fn hand_button(index: usize) -> Rect {
        let w = 100.0;
        let gap = (VIEW.x - w * 3.0) / 4.0;
        Rect::new(gap + index as f32 * (w + gap), 740.0, w, 60.0)
    }
}

pub fn tick(state: &mut JankenTetrisState, dt: f32) {
    if state.phase != RunPhase::Playing {
        return;
    }
    state.janken.tick(dt, &mut state.rng, &mut state.events);
    if state.gravity.tick(dt) {
        state.shift(0, 1);
        if state.phase == RunPhase::Playing {
            state.gravity.start(state.config.gravity);
        }
    }
}

pub fn draw(state: &JankenTetrisState, list: &mut DrawList) {
    list.text(Vec2::new(16.0, 24.0), "Tetris x Janken", 18.0, colors::TEXT, Align::Left);
    list.text(
        Vec2::new(VIEW.x - 16.0, 24.0),
        format!("Score: {}", state.score),
        18.0,
        colors::COIN,
        Align::Right,
    );

    shapes::board(list, &state.board, BOARD_ORIGIN, CELL);
    if let Some(piece) = &state.current {
        shapes::piece(list, piece, BOARD_ORIGIN, CELL);
    }

    // Janken panel
    let panel = Rect::new(0.0, 660.0, VIEW.x, VIEW.y - 660.0);
    list.rect(panel, [0.12, 0.13, 0.18, 1.0]);
    list.line(Vec2::new(0.0, panel.y), Vec2::new(VIEW.x, panel.y), [0.23, 0.51, 0.96, 1.0], 4.0);

    let history = &state.janken.history;
    let rate = history.win_rate().map(|r| (r * 100.0).round() as u32).unwrap_or(0);
    let good = history.is_winning();
    let rate_color = if good { colors::GOOD } else { colors::BAD };
    list.text(
        Vec2::new(12.0, 680.0),
        format!("Win {}% ({}W {}L)", rate, history.wins, history.loses),
        14.0,
        rate_color,
        Align::Left,
    );
    list.text(
        Vec2::new(VIEW.x - 12.0, 680.0),
        if good { "Next: GOOD" } else { "Next: BAD" },
        14.0,
        rate_color,
        Align::Right,
    );

    let janken = &state.janken;
    let (status, status_color) = match janken.phase {
        JankenPhase::Countdown(n) => (n.to_string(), colors::COIN),
        JankenPhase::Input => ("PON!".to_string(), colors::BAD),
        JankenPhase::Result => (
            janken.result.map(|r| r.label()).unwrap_or("").to_string(),
            match janken.result {
                Some(JankenResult::Win) => colors::COIN,
                Some(JankenResult::Draw) => colors::DIM,
                _ => colors::BAD,
            },
        ),
        JankenPhase::Idle => ("...".to_string(), colors::DIM),
    };
    list.label(Vec2::new(VIEW.x * 0.5, 710.0), status, 28.0, status_color);
    let cpu = match (janken.phase, janken.cpu_hand) {
        (JankenPhase::Result, Some(h)) => h.label(),
        (JankenPhase::Input, _) => "?",
        _ => "CPU",
    };
    list.label(Vec2::new(60.0, 710.0), cpu, 14.0, colors::TEXT);
    list.label(
        Vec2::new(VIEW.x - 60.0, 710.0),
        janken.player_hand.map(|h| h.label()).unwrap_or("YOU"),
        14.0,
        colors::TEXT,
    );

    let open = janken.phase == JankenPhase::Input;
    for (i, hand) in Hand::ALL.iter().enumerate() {
        let r = JankenTetrisState::hand_button(i);
        let fill = if open { colors::PLAYER } else { with_alpha(colors::WALL, 0.6) };
        list.rect(r, fill);
        list.label(r.center(), hand.label(), 14.0, colors::TEXT);
    }

    // Recent rounds, newest first
    for (i, log) in history.logs.iter().enumerate() {
        let y = 60.0 + i as f32 * 16.0;
        let text = format!(
            "{} {} {}",
            log.player.map(|h| h.label()).unwrap_or("-"),
            log.result.label(),
            log.cpu.label()
        );
        list.text(Vec2::new(VIEW.x - 4.0, y), text, 9.0, colors::DIM, Align::Right);
    }

    match state.phase {
        RunPhase::Title => shapes::banner(
            list,
            "TETRIS x JANKEN",
            &["Win janken for good blocks".to_string(), "Tap to start".to_string()],
        ),
        RunPhase::GameOver => shapes::banner(
            list,
            "GAME OVER",
            &[format!("Score {}", state.score), "Tap to retry".to_string()],
        ),
        RunPhase::Playing => {}
    }
}

impl Game for JankenTetrisState {
    fn kind(&self) -> GameKind {
        GameKind::JankenTetris
    }

    fn phase(&self) -> RunPhase {
        self.phase
    }

    fn press(&mut self, action: Action) {
        if !self.phase.is_playing() {
            if action == Action::Confirm {
                self.start();
            }
            return;
        }
        match action {
            Action::Left => self.shift(-1, 0),
            Action::Right => self.shift(1, 0),
            Action::Down => self.shift(0, 1),
            Action::Up | Action::Rotate | Action::Confirm => self.rotate(),
            Action::Choice(i) => {
                if let Some(&hand) = Hand::ALL.get(i as usize) {
                    self.throw(hand);
                }
            }
            _ => {}
        }
    }

    fn pointer(&mut self, pointer: Pointer) {
        let Pointer::Down(pos) = pointer else {
            return;
        };
        if !self.phase.is_playing() {
            self.start();
            return;
        }
        if let Some(i) = (0..3).find(|&i| Self::hand_button(i).contains(pos)) {
            self.throw(Hand::ALL[i]);
            return;
        }
        let board = Rect::new(
            BOARD_ORIGIN.x,
            BOARD_ORIGIN.y,
            self.board.width() as f32 * CELL,
            self.board.height() as f32 * CELL,
        );
        if board.contains(pos) {
            let third = board.w / 3.0;
            if pos.x < board.x + third {
                self.shift(-1, 0);
            } else if pos.x > board.right() - third {
                self.shift(1, 0);
            } else {
                self.rotate();
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
        let h = &self.janken.history;
        Hud {
            score: self.score,
            best: self.best,
            info: format!("{}W {}L {}D", h.wins, h.loses, h.draws),
            message: self.janken.result.map(|r| r.label().to_string()),
        }
    }

    fn draw(&self, list: &mut DrawList) {
        draw(self, list);
    }

    fn view_size(&self) -> Vec2 {
        VIEW
    }

    fn final_score(&self) -> u64 {
        self.score
    }

    fn set_best(&mut self, best: u64) {
        self.best = self.best.max(best);
    }

    fn autoplay(&mut self) {
        if !self.phase.is_playing() {
            self.start();
            return;
        }
        if self.janken.phase != JankenPhase::Input {
            return;
        }
        if let Some(cpu) = self.janken.cpu_hand {
            self.throw(cpu.counter());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::games::janken::{JankenLog, JankenResult};

    fn win(state: &mut JankenTetrisState) {
        state.janken.history.record(
            JankenLog {
                seq: 0,
                result: JankenResult::Win,
                player: Some(Hand::Rock),
                cpu: Hand::Scissors,
            },
            5,
        );
    }

    #[test]
    fn test_pool_follows_win_rate() {
        let mut s = JankenTetrisState::new(JankenTetrisConfig::default(), 1);
        assert_eq!(s.next_pool(), &PieceKind::AWKWARD);
        win(&mut s);
        assert_eq!(s.next_pool(), &PieceKind::FRIENDLY);
    }

    #[test]
    fn test_spawn_uses_pool_and_resets_history() {
        let mut s = JankenTetrisState::new(JankenTetrisConfig::default(), 2);
        s.start();
        let first = s.current.as_ref().unwrap().kind;
        assert!(PieceKind::AWKWARD.contains(&first));
        win(&mut s);
        s.current = None;
        s.spawn();
        let second = s.current.as_ref().unwrap().kind;
        assert!(PieceKind::FRIENDLY.contains(&second));
        assert_eq!(s.janken.history.total, 0);
    }

    #[test]
    fn test_gravity_drops_and_locks() {
        let mut s = JankenTetrisState::new(JankenTetrisConfig::default(), 3);
        s.start();
        let y0 = s.current.as_ref().unwrap().y;
        for _ in 0..48 {
            tick(&mut s, SIM_DT);
        }
        assert_eq!(s.current.as_ref().unwrap().y, y0 + 1);
        for _ in 0..40 {
            s.shift(0, 1);
        }
        assert!(s.board.filled_count() > 0);
        assert!(s.current.is_some());
    }

    #[test]
    fn test_line_clear_scores() {
        let mut s = JankenTetrisState::new(JankenTetrisConfig::default(), 4);
        s.start();
        for x in 0..10 {
            if x != 4 && x != 5 {
                s.board.set(x, 19, Some(PieceKind::T));
                s.board.set(x, 18, Some(PieceKind::T));
            }
        }
        let mut o = Piece::spawn(PieceKind::O, 10);
        o.x = 4;
        s.current = Some(o);
        for _ in 0..30 {
            s.shift(0, 1);
            if s.score > 0 {
                break;
            }
        }
        assert_eq!(s.lines, 2);
        assert_eq!(s.score, 200);
    }

    #[test]
    fn test_blocked_spawn_ends_game() {
        let mut s = JankenTetrisState::new(JankenTetrisConfig::default(), 5);
        s.start();
        for y in 0..4 {
            for x in 0..10 {
                s.board.set(x, y, Some(PieceKind::J));
            }
        }
        s.current = None;
        s.spawn();
        assert_eq!(s.phase, RunPhase::GameOver);
        assert!(!s.janken.is_running());
    }

    #[test]
    fn test_rotation_without_kick_fails_at_wall() {
        let mut s = JankenTetrisState::new(JankenTetrisConfig::default(), 6);
        s.start();
        let mut i = Piece::spawn(PieceKind::I, 10);
        i.shape = i.shape.rotated_cw();
        i.x = -2;
        i.y = 5;
        assert!(!s.board.collides(&i.shape, i.x, i.y));
        s.current = Some(i.clone());
        s.rotate();
        assert_eq!(s.current.as_ref().unwrap().shape, i.shape);
    }

    #[test]
    fn test_hand_buttons_throw() {
        let mut s = JankenTetrisState::new(JankenTetrisConfig::default(), 7);
        s.start();
        for _ in 0..180 {
            tick(&mut s, SIM_DT);
        }
        assert_eq!(s.janken.phase, JankenPhase::Input);
        let center = JankenTetrisState::hand_button(1).center();
        s.pointer(Pointer::Down(center));
        assert_eq!(s.janken.player_hand, Some(Hand::Paper));
        assert_eq!(s.janken.history.total, 1);
    }
}
