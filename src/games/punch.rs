//! Reading Punch: watch the wind-up, slip the punch
//!
//! The enemy telegraphs which hand is coming. Dodging to that side during the
//! telegraph scores by how late the read was; the wrong side or no read at all
//! costs a heart.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Game, GameEvent, GameKind, Hud};
use crate::platform::input::{Action, Pointer};
use crate::renderer::draw::with_alpha;
use crate::renderer::{Align, DrawList, colors, shapes};
use crate::sim::{GameRng, HitStop, IdGen, Rect, RunPhase, Schedule};

const VIEW: Vec2 = Vec2::new(480.0, 720.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchConfig {
    pub max_hp: u32,
    pub initial_telegraph: f32,
    pub min_telegraph: f32,
    /// Telegraph shortening per level
    pub telegraph_step: f32,
    /// Chance the next punch switches hands
    pub alternate_chance: f32,
    pub first_turn_delay: f32,
    pub attack_time: f32,
    pub dodge_cooldown: f32,
    pub hit_cooldown: f32,
    pub wrong_side_delay: f32,
    pub damage_recover_delay: f32,
    pub hit_stop: f32,
    pub popup_life: f32,
    pub perfect_points: u64,
    pub good_points: u64,
    pub early_points: u64,
    pub combo_points: u64,
    pub points_per_level: u64,
}

impl Default for PunchConfig {
    fn default() -> Self {
        Self {
            max_hp: 3,
            initial_telegraph: 1.2,
            min_telegraph: 0.5,
            telegraph_step: 0.08,
            alternate_chance: 0.7,
            first_turn_delay: 1.0,
            attack_time: 0.3,
            dodge_cooldown: 0.5,
            hit_cooldown: 1.0,
            wrong_side_delay: 0.1,
            damage_recover_delay: 0.5,
            hit_stop: 0.15,
            popup_life: 1.0,
            perfect_points: 300,
            good_points: 100,
            early_points: 50,
            combo_points: 10,
            points_per_level: 1000,
        }
    }
}

/// Which hand the enemy throws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyPhase {
    Idle,
    Telegraph,
    Attack,
    Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub punch: Option<Side>,
    pub phase: EnemyPhase,
    /// Time spent in the current phase
    pub elapsed: f32,
    pub duration: f32,
}

impl Enemy {
    fn idle() -> Self {
        Self {
            punch: None,
            phase: EnemyPhase::Idle,
            elapsed: 0.0,
            duration: 0.0,
        }
    }

    fn enter(&mut self, phase: EnemyPhase, duration: f32) {
        self.phase = phase;
        self.elapsed = 0.0;
        self.duration = duration;
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerPose {
    Idle,
    Dodge(Side),
    Hit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DodgeRank {
    Perfect,
    Good,
    Early,
}

impl DodgeRank {
    pub fn text(&self) -> &'static str {
        match self {
            DodgeRank::Perfect => "PERFECT!!",
            DodgeRank::Good => "NICE!",
            DodgeRank::Early => "EARLY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Popup {
    pub id: u32,
    pub rank: DodgeRank,
    pub points: u64,
    pub age: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Timer {
    /// Begin a new telegraph
    Turn,
    /// Telegraph ran out
    Strike,
    /// Dodged punch swings through
    Whiff,
    /// Wrong-side dodge gets caught
    Counter,
    Recover(f32),
    Down,
}

#[derive(Debug, Clone)]
pub struct PunchState {
    pub config: PunchConfig,
    pub phase: RunPhase,
    pub hp: u32,
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub level: u32,
    pub best: u64,
    pub enemy: Enemy,
    pub pose: PlayerPose,
    /// Player already committed this telegraph
    pub dodged: bool,
    pub last_punch: Option<Side>,
    pub popups: Vec<Popup>,
    pub hit_stop: HitStop,
    pub events: Vec<GameEvent>,
    timers: Schedule<Timer>,
    rng: GameRng,
    ids: IdGen,
}

impl PunchState {
    pub fn new(config: PunchConfig, seed: u64) -> Self {
        Self {
            hp: config.max_hp,
            config,
            phase: RunPhase::Title,
            score: 0,
            combo: 0,
            max_combo: 0,
            level: 1,
            best: 0,
            enemy: Enemy::idle(),
            pose: PlayerPose::Idle,
            dodged: false,
            last_punch: None,
            popups: Vec::new(),
            hit_stop: HitStop::default(),
            events: Vec::new(),
            timers: Schedule::new(),
            rng: GameRng::new(seed),
            ids: IdGen::default(),
        }
    }

    pub fn telegraph_time(&self) -> f32 {
        let c = &self.config;
        (c.initial_telegraph - (self.level.saturating_sub(1)) as f32 * c.telegraph_step)
            .max(c.min_telegraph)
    }

    pub fn start(&mut self) {
        self.timers.cancel_all();
        self.phase = RunPhase::Playing;
        self.hp = self.config.max_hp;
        self.score = 0;
        self.combo = 0;
        self.max_combo = 0;
        self.level = 1;
        self.enemy = Enemy::idle();
        self.pose = PlayerPose::Idle;
        self.popups.clear();
        self.hit_stop.clear();
        self.last_punch = None;
        self.dodged = false;
        self.timers.after(self.config.first_turn_delay, Timer::Turn);
        self.events.push(GameEvent::Start);
        log::info!("punch: start");
    }

    fn next_punch(&mut self) -> Side {
        let switch = self.rng.chance(self.config.alternate_chance);
        match self.last_punch {
            Some(Side::Right) if switch => Side::Left,
            Some(Side::Right) => Side::Right,
            Some(Side::Left) if switch => Side::Right,
            Some(Side::Left) => Side::Left,
            None => {
                if self.rng.chance(0.5) {
                    Side::Left
                } else {
                    Side::Right
                }
            }
        }
    }

    fn begin_turn(&mut self) {
        if self.hp == 0 {
            return;
        }
        let side = self.next_punch();
        self.last_punch = Some(side);
        self.dodged = false;
        self.pose = PlayerPose::Idle;
        self.enemy.punch = Some(side);
        self.enemy.enter(EnemyPhase::Telegraph, self.telegraph_time());
        self.timers.after(self.enemy.duration, Timer::Strike);
        self.events.push(GameEvent::Reveal);
    }

    fn take_damage(&mut self) {
        self.pose = PlayerPose::Hit;
        self.combo = 0;
        self.hit_stop.trigger(self.config.hit_stop);
        self.hp = self.hp.saturating_sub(1);
        self.events.push(GameEvent::Damage);
        if self.hp == 0 {
            self.timers.after(self.config.damage_recover_delay, Timer::Down);
        } else {
            self.timers.after(
                self.config.damage_recover_delay,
                Timer::Recover(self.config.hit_cooldown),
            );
        }
    }

    /// Slip to one side. Only the first read of a telegraph counts.
    pub fn dodge(&mut self, side: Side) {
        if self.phase != RunPhase::Playing
            || self.enemy.phase != EnemyPhase::Telegraph
            || self.dodged
        {
            return;
        }
        self.dodged = true;
        self.pose = PlayerPose::Dodge(side);
        self.timers.cancel_where(|t| *t == Timer::Strike);

        if self.enemy.punch != Some(side) {
            self.timers.after(self.config.wrong_side_delay, Timer::Counter);
            return;
        }

        let rank = self.rank_for(self.enemy.progress());
        let base = match rank {
            DodgeRank::Perfect => self.config.perfect_points,
            DodgeRank::Good => self.config.good_points,
            DodgeRank::Early => self.config.early_points,
        };
        if rank == DodgeRank::Perfect {
            self.hit_stop.trigger(self.config.hit_stop);
            self.events.push(GameEvent::Perfect);
        } else {
            self.events.push(GameEvent::Dodge);
        }

        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        let points = base + self.combo as u64 * self.config.combo_points;
        self.score += points;
        self.level = (self.score / self.config.points_per_level.max(1)) as u32 + 1;
        let id = self.ids.next_id();
        self.popups.push(Popup {
            id,
            rank,
            points,
            age: 0.0,
        });
        self.timers.after(0.05, Timer::Whiff);
    }

    /// Judge a correct read by telegraph progress
    pub fn rank_for(&self, progress: f32) -> DodgeRank {
        if self.level <= 2 {
            if progress > 0.5 {
                DodgeRank::Perfect
            } else {
                DodgeRank::Good
            }
        } else if progress > 0.7 {
            DodgeRank::Perfect
        } else if progress < 0.3 {
            DodgeRank::Early
        } else {
            DodgeRank::Good
        }
    }

    fn fire(&mut self, timer: Timer) {
        match timer {
            Timer::Turn => self.begin_turn(),
            Timer::Strike => {
                self.enemy.enter(EnemyPhase::Attack, self.config.attack_time);
                self.events.push(GameEvent::Punch);
                if self.dodged {
                    self.timers.after(self.config.attack_time, Timer::Recover(self.config.dodge_cooldown));
                } else {
                    self.take_damage();
                }
            }
            Timer::Whiff => {
                self.enemy.enter(EnemyPhase::Attack, self.config.attack_time);
                self.events.push(GameEvent::Punch);
                self.timers
                    .after(self.config.attack_time, Timer::Recover(self.config.dodge_cooldown));
            }
            Timer::Counter => {
                self.enemy.enter(EnemyPhase::Attack, self.config.attack_time);
                self.events.push(GameEvent::Punch);
                self.take_damage();
            }
            Timer::Recover(secs) => {
                self.enemy.enter(EnemyPhase::Cooldown, secs);
                self.timers.after(secs, Timer::Turn);
            }
            Timer::Down => {
                self.phase = RunPhase::GameOver;
                self.best = self.best.max(self.score);
                self.events.push(GameEvent::GameOver);
                log::info!("punch: down, score {} max combo {}", self.score, self.max_combo);
            }
        }
    }
}

pub fn tick(state: &mut PunchState, dt: f32) {
    // Hit-stop only dims the frame; punch timing keeps running
    state.hit_stop.tick(dt);

    let life = state.config.popup_life;
    for popup in &mut state.popups {
        popup.age += dt;
    }
    state.popups.retain(|p| p.age < life);

    if state.phase != RunPhase::Playing {
        return;
    }
    state.enemy.elapsed += dt;
    for timer in state.timers.tick(dt) {
        state.fire(timer);
    }
}

fn glove_rect(state: &PunchState, side: Side) -> Rect {
    let base_x = match side {
        Side::Left => VIEW.x * 0.3,
        Side::Right => VIEW.x * 0.7,
    };
    let mut center = Vec2::new(base_x, 300.0);
    let mut size = 60.0;
    if state.enemy.punch == Some(side) {
        match state.enemy.phase {
            EnemyPhase::Telegraph => {
                center.y -= 20.0;
                size *= 1.2;
            }
            EnemyPhase::Attack => {
                center.y += 150.0 * state.enemy.progress().max(0.5);
                size *= 2.5;
            }
            _ => {}
        }
    }
    Rect::from_center(center, Vec2::splat(size))
}

pub fn draw(state: &PunchState, list: &mut DrawList) {
    if state.hit_stop.is_active() {
        list.clear = [0.2, 0.2, 0.2, 1.0];
    }

    // Ring floor
    for i in 0..8 {
        let y = 420.0 + i as f32 * 40.0;
        list.line(Vec2::new(0.0, y), Vec2::new(VIEW.x, y), colors::GRID, 1.0);
    }

    // Enemy
    let head = Vec2::new(VIEW.x * 0.5, 200.0);
    list.circle(head, 70.0, [0.55, 0.15, 0.15, 1.0]);
    for side in [Side::Left, Side::Right] {
        let active = state.enemy.punch == Some(side);
        let color = match (active, state.enemy.phase) {
            (true, EnemyPhase::Telegraph) => [0.98, 0.45, 0.09, 1.0],
            (true, EnemyPhase::Attack) => colors::HAZARD,
            _ => [0.7, 0.12, 0.12, 1.0],
        };
        let r = glove_rect(state, side);
        if active && state.enemy.phase == EnemyPhase::Telegraph {
            list.rect(r.inset(-8.0), with_alpha(color, 0.35));
        }
        list.rect(r, color);
    }

    // Timing bar
    if state.enemy.phase == EnemyPhase::Telegraph {
        let bar = Rect::new(VIEW.x * 0.5 - 128.0, 90.0, 256.0, 16.0);
        list.rect(bar, colors::WALL);
        list.rect(
            Rect::new(bar.x + bar.w * 0.7, bar.y, bar.w * 0.3, bar.h),
            with_alpha(colors::GOOD, 0.4),
        );
        list.rect(
            Rect::new(bar.x, bar.y, bar.w * state.enemy.progress(), bar.h),
            colors::COIN,
        );
        list.label(bar.center(), "TIMING", 10.0, colors::TEXT);
    }

    // Player
    let px = match state.pose {
        PlayerPose::Dodge(Side::Left) => VIEW.x * 0.5 - 96.0,
        PlayerPose::Dodge(Side::Right) => VIEW.x * 0.5 + 96.0,
        _ => VIEW.x * 0.5,
    };
    let player_color = match state.pose {
        PlayerPose::Hit => with_alpha(colors::PLAYER, 0.5),
        _ => colors::PLAYER,
    };
    list.circle(Vec2::new(px, 600.0), 50.0, player_color);

    // HUD
    list.text(Vec2::new(20.0, 30.0), format!("SCORE {}", state.score), 24.0, colors::TEXT, Align::Left);
    for i in 0..state.config.max_hp {
        let c = if i < state.hp {
            colors::BAD
        } else {
            with_alpha(colors::DIM, 0.3)
        };
        list.circle(Vec2::new(VIEW.x - 30.0 - i as f32 * 40.0, 30.0), 14.0, c);
    }
    if state.combo > 1 {
        list.label(Vec2::new(VIEW.x * 0.5, 60.0), format!("{} COMBO!", state.combo), 28.0, colors::COIN);
    }

    for popup in &state.popups {
        let color = match popup.rank {
            DodgeRank::Perfect => colors::COIN,
            DodgeRank::Good => colors::GOOD,
            DodgeRank::Early => [0.55, 0.75, 1.0, 1.0],
        };
        let age = popup.age / state.config.popup_life;
        let pos = Vec2::new(VIEW.x * 0.5, VIEW.y * 0.4);
        shapes::popup(list, pos, popup.rank.text(), 44.0, color, age);
        shapes::popup(list, pos + Vec2::new(0.0, 44.0), &format!("+{}", popup.points), 28.0, colors::TEXT, age);
    }

    match state.phase {
        RunPhase::Title => shapes::banner(
            list,
            "READING PUNCH",
            &["Dodge with ← →".to_string(), "Tap to start".to_string()],
        ),
        RunPhase::GameOver => shapes::banner(
            list,
            "K.O.",
            &[
                format!("Score {}", state.score),
                format!("Max combo {}", state.max_combo),
                "Tap to retry".to_string(),
            ],
        ),
        RunPhase::Playing => {}
    }
}

impl Game for PunchState {
    fn kind(&self) -> GameKind {
        GameKind::Punch
    }

    fn phase(&self) -> RunPhase {
        self.phase
    }

    fn press(&mut self, action: Action) {
        match action {
            Action::Left => self.dodge(Side::Left),
            Action::Right => self.dodge(Side::Right),
            Action::Confirm if !self.phase.is_playing() => self.start(),
            _ => {}
        }
    }

    fn pointer(&mut self, pointer: Pointer) {
        if let Pointer::Down(pos) = pointer {
            if !self.phase.is_playing() {
                self.start();
            } else if pos.x < VIEW.x * 0.5 {
                self.dodge(Side::Left);
            } else {
                self.dodge(Side::Right);
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
            score: self.score,
            best: self.best,
            info: format!("HP {}  Lv {}", self.hp, self.level),
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
        self.score
    }

    fn set_best(&mut self, best: u64) {
        self.best = self.best.max(best);
    }

    fn autoplay(&mut self) {
        match self.phase {
            RunPhase::Playing => {
                let ready = self.enemy.phase == EnemyPhase::Telegraph
                    && !self.dodged
                    && self.enemy.progress() > 0.75;
                if let (true, Some(side)) = (ready, self.enemy.punch) {
                    self.dodge(side);
                }
            }
            _ => self.start(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn run(s: &mut PunchState, secs: f32) {
        let n = (secs / SIM_DT).round() as u32;
        for _ in 0..n {
            tick(s, SIM_DT);
        }
    }

    fn in_telegraph(seed: u64) -> PunchState {
        let mut s = PunchState::new(PunchConfig::default(), seed);
        s.start();
        run(&mut s, 1.0);
        assert_eq!(s.enemy.phase, EnemyPhase::Telegraph);
        s
    }

    #[test]
    fn test_telegraph_time_by_level() {
        let mut s = PunchState::new(PunchConfig::default(), 1);
        assert!((s.telegraph_time() - 1.2).abs() < 1e-6);
        s.level = 3;
        assert!((s.telegraph_time() - 1.04).abs() < 1e-6);
        s.level = 50;
        assert_eq!(s.telegraph_time(), 0.5);
    }

    #[test]
    fn test_rank_by_level() {
        let mut s = PunchState::new(PunchConfig::default(), 1);
        assert_eq!(s.rank_for(0.6), DodgeRank::Perfect);
        assert_eq!(s.rank_for(0.1), DodgeRank::Good);
        s.level = 3;
        assert_eq!(s.rank_for(0.8), DodgeRank::Perfect);
        assert_eq!(s.rank_for(0.5), DodgeRank::Good);
        assert_eq!(s.rank_for(0.1), DodgeRank::Early);
    }

    #[test]
    fn test_punches_tend_to_alternate() {
        let mut s = PunchState::new(PunchConfig::default(), 9);
        s.last_punch = Some(Side::Left);
        let mut switches = 0;
        for _ in 0..1000 {
            s.last_punch = Some(Side::Left);
            if s.next_punch() == Side::Right {
                switches += 1;
            }
        }
        assert!((600..800).contains(&switches), "switched {}", switches);
    }

    #[test]
    fn test_correct_dodge_scores_and_cancels_strike() {
        let mut s = in_telegraph(3);
        let side = s.enemy.punch.unwrap();
        run(&mut s, 0.8);
        s.dodge(side);
        assert_eq!(s.combo, 1);
        // PERFECT at level 1: 300 + 1 * 10
        assert_eq!(s.score, 310);
        assert_eq!(s.popups.len(), 1);
        // Second read in the same telegraph is ignored
        s.dodge(side);
        assert_eq!(s.score, 310);
        run(&mut s, 1.0);
        assert_eq!(s.hp, 3);
    }

    #[test]
    fn test_wrong_side_takes_damage() {
        let mut s = in_telegraph(4);
        let wrong = match s.enemy.punch.unwrap() {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        };
        s.combo = 5;
        s.dodge(wrong);
        assert_eq!(s.hp, 3);
        run(&mut s, 0.1);
        assert_eq!(s.hp, 2);
        assert_eq!(s.combo, 0);
        assert!(s.hit_stop.is_active());
        assert_eq!(s.pose, PlayerPose::Hit);
    }

    #[test]
    fn test_no_read_costs_a_heart_and_loop_continues() {
        let mut s = in_telegraph(5);
        run(&mut s, 1.2);
        assert_eq!(s.hp, 2);
        assert_eq!(s.enemy.phase, EnemyPhase::Attack);
        // 0.5 s recover + 1 s cooldown, then a new telegraph
        run(&mut s, 1.5);
        assert_eq!(s.enemy.phase, EnemyPhase::Telegraph);
    }

    #[test]
    fn test_three_misses_knock_out() {
        let mut s = PunchState::new(PunchConfig::default(), 6);
        s.start();
        run(&mut s, 20.0);
        assert_eq!(s.phase, RunPhase::GameOver);
        assert_eq!(s.hp, 0);
    }

    #[test]
    fn test_popups_expire() {
        let mut s = in_telegraph(7);
        let side = s.enemy.punch.unwrap();
        s.dodge(side);
        run(&mut s, 0.5);
        assert_eq!(s.popups.len(), 1);
        run(&mut s, 0.6);
        assert!(s.popups.is_empty());
    }

    #[test]
    fn test_restart_drops_pending_turns() {
        let mut s = in_telegraph(8);
        s.start();
        assert_eq!(s.enemy.phase, EnemyPhase::Idle);
        run(&mut s, 0.9);
        assert_eq!(s.hp, 3);
        assert_eq!(s.enemy.phase, EnemyPhase::Idle);
    }
}
