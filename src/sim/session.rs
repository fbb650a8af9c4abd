//! Game session orchestrator
//!
//! Owns the Menu → Playing → GameOver state machine, runs the per-step
//! bounds and collision checks, turns entity notices into score and coins,
//! keeps difficulty in sync with score, drives the spawners, and reports
//! finished sessions to the stats store.
//!
//! Nothing here fails outward: missing collaborators skip their checks,
//! invalid transitions are no-ops, and store errors are logged and dropped.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use glam::Vec2;

use super::collision::{first_obstacle_hit, out_of_bounds};
use super::difficulty::{Difficulty, DifficultyScaler};
use super::events::{EventBus, GameEvent, SubscriptionId};
use super::spawner::{ObstacleSpawner, PickupSpawner};
use super::state::{Flyer, SessionState, World};
use super::tick::{EntityNotice, FixedStep, TickInput, step_entities};
use crate::consts::SIM_DT;
use crate::persistence::StatsStore;
use crate::stats::{AggregateStatistics, SessionRecord, SessionSummary};
use crate::tuning::Tuning;

/// Wall-clock source for session timing
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// `chrono::Utc` wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Work postponed until the current step has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    StartGame,
}

/// One player's game session
pub struct GameSession {
    tuning: Tuning,
    state: SessionState,
    score: u32,
    coins_collected: u32,
    obstacles_passed: u32,
    started_at: DateTime<Utc>,
    scaler: DifficultyScaler,
    world: World,
    obstacle_spawner: ObstacleSpawner,
    pickup_spawner: Option<PickupSpawner>,
    store: Option<Box<dyn StatsStore>>,
    clock: Box<dyn Clock>,
    events: EventBus<GameEvent>,
    deferred: VecDeque<Deferred>,
    stepper: FixedStep,
    frame: u64,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("state", &self.state)
            .field("score", &self.score)
            .field("coins_collected", &self.coins_collected)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Fully wired session in the Menu state, without a store
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let base = Difficulty::base(&tuning.difficulty);
        Self {
            state: SessionState::Menu,
            score: 0,
            coins_collected: 0,
            obstacles_passed: 0,
            started_at: Utc::now(),
            scaler: DifficultyScaler::new(tuning.difficulty),
            world: World::new(Some(Flyer::new(spawn_point(&tuning)))),
            obstacle_spawner: ObstacleSpawner::new(base.spawn_interval, tuning.obstacle, seed),
            pickup_spawner: Some(PickupSpawner::new(
                base.spawn_interval,
                tuning.obstacle,
                tuning.pickup,
                seed,
            )),
            store: None,
            clock: Box::new(SystemClock),
            events: EventBus::new(),
            deferred: VecDeque::new(),
            stepper: FixedStep::new(),
            frame: 0,
            tuning,
        }
    }

    /// Report finished sessions to `store`
    pub fn with_store(mut self, store: Box<dyn StatsStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run without bonus pickups
    pub fn without_pickups(mut self) -> Self {
        self.pickup_spawner = None;
        self
    }

    /// Run without a flyer (spectator/attract mode); flyer checks are skipped
    pub fn without_flyer(mut self) -> Self {
        self.world.flyer = None;
        self
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn coins_collected(&self) -> u32 {
        self.coins_collected
    }

    pub fn obstacles_passed(&self) -> u32 {
        self.obstacles_passed
    }

    pub fn difficulty(&self) -> &Difficulty {
        self.scaler.current()
    }

    /// 1..=10 display level
    pub fn difficulty_level(&self) -> u8 {
        self.scaler.level()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Steps executed since construction
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn has_pending_start(&self) -> bool {
        self.deferred.contains(&Deferred::StartGame)
    }

    /// Aggregate stats from the store, if one is wired and reachable
    pub fn statistics(&self) -> Option<AggregateStatistics> {
        let store = self.store.as_ref()?;
        store
            .statistics()
            .inspect_err(|e| log::warn!("Statistics unavailable: {}", e))
            .ok()
    }

    /// Newest-first session history, empty when no store is reachable
    pub fn recent_sessions(&self, limit: usize) -> Vec<SessionRecord> {
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };
        store.recent_sessions(limit).unwrap_or_else(|e| {
            log::warn!("Session history unavailable: {}", e);
            Vec::new()
        })
    }

    /// Begin a new session. No-op while already playing.
    pub fn start_game(&mut self) {
        if self.state == SessionState::Playing {
            return;
        }

        self.state = SessionState::Playing;
        self.score = 0;
        self.coins_collected = 0;
        self.obstacles_passed = 0;
        self.started_at = self.clock.now();

        self.scaler.reset();
        let interval = self.scaler.current().spawn_interval;

        let spawn = spawn_point(&self.tuning);
        if let Some(flyer) = self.world.flyer.as_mut() {
            flyer.revive(spawn);
        }

        self.obstacle_spawner.clear_all(&mut self.world);
        self.obstacle_spawner.set_spawn_interval(interval);
        self.obstacle_spawner.start_spawning();
        if let Some(spawner) = self.pickup_spawner.as_mut() {
            spawner.clear_all(&mut self.world);
            spawner.set_spawn_interval(interval);
            spawner.start_spawning();
        }

        log::info!("Session started (frame {})", self.frame);
        self.events.emit(&GameEvent::GameStarted);
        self.events.emit(&GameEvent::ScoreChanged { score: 0 });
        self.events.emit(&GameEvent::CoinsChanged { total: 0 });
    }

    /// Finish the running session. No-op unless playing.
    pub fn end_game(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }

        self.state = SessionState::GameOver;

        self.obstacle_spawner.stop_spawning();
        if let Some(spawner) = self.pickup_spawner.as_mut() {
            spawner.stop_spawning();
        }

        let elapsed = self.clock.now() - self.started_at;
        let duration_secs = (elapsed.num_milliseconds().max(0) as f64) / 1000.0;
        let summary = SessionSummary::new(
            self.score,
            self.obstacles_passed,
            self.coins_collected,
            duration_secs,
        );

        if let Some(store) = self.store.as_mut() {
            if let Err(e) = store.save_session(&summary) {
                log::warn!("Session not saved: {}", e);
            }
        }

        log::info!(
            "Session over: score {}, coins {}, {:.1}s",
            summary.score(),
            summary.coins_collected(),
            summary.duration_secs()
        );
        self.events.emit(&GameEvent::GameOver {
            final_score: self.score,
        });
    }

    /// End the running session (if any) and start a fresh one after the
    /// current step.
    pub fn restart_game(&mut self) {
        if self.state == SessionState::Playing {
            self.end_game();
        }
        if !self.has_pending_start() {
            self.deferred.push_back(Deferred::StartGame);
        }
    }

    /// Abandon everything and go back to the menu. Nothing is saved.
    pub fn return_to_menu(&mut self) {
        self.state = SessionState::Menu;
        self.deferred.clear();

        self.obstacle_spawner.stop_spawning();
        self.obstacle_spawner.clear_all(&mut self.world);
        if let Some(spawner) = self.pickup_spawner.as_mut() {
            spawner.stop_spawning();
            spawner.clear_all(&mut self.world);
        }

        let spawn = spawn_point(&self.tuning);
        if let Some(flyer) = self.world.flyer.as_mut() {
            flyer.revive(spawn);
        }

        self.score = 0;
        self.coins_collected = 0;
        self.obstacles_passed = 0;
        self.scaler.reset();
    }

    /// Run as many fixed steps as `frame_dt` covers
    pub fn advance(&mut self, input: &TickInput, frame_dt: f32) -> u32 {
        let steps = self.stepper.advance(frame_dt);
        for _ in 0..steps {
            self.step(input, SIM_DT);
        }
        steps
    }

    /// One fixed simulation step.
    ///
    /// Order: entities move, spawners run, entity notices are handled,
    /// session checks run, removed entities are swept, deferred work runs.
    pub fn step(&mut self, input: &TickInput, dt: f32) {
        self.frame += 1;

        if self.state != SessionState::Menu {
            let notices = step_entities(
                &mut self.world,
                input,
                self.scaler.current(),
                &self.tuning,
                dt,
            );

            self.obstacle_spawner.update(dt, &mut self.world);
            let last_gap_y = self.obstacle_spawner.last_gap_y();
            if let Some(spawner) = self.pickup_spawner.as_mut() {
                spawner.update(dt, &mut self.world, last_gap_y);
            }

            for notice in notices {
                match notice {
                    EntityNotice::ObstaclePassed(_) => self.on_obstacle_passed(),
                    EntityNotice::PickupCollected(_) => self.on_pickup_collected(),
                    EntityNotice::FlyerDied => log::debug!("Flyer died (frame {})", self.frame),
                }
            }

            if self.state == SessionState::Playing {
                self.check_frame();
            }

            self.world.sweep();
        }

        self.run_deferred();
    }

    /// Per-step session checks while playing
    fn check_frame(&mut self) {
        let Some(flyer) = self.world.flyer.as_ref() else {
            return;
        };

        if !flyer.is_alive() {
            self.end_game();
            return;
        }

        let arena = &self.tuning.arena;
        if let Some(flyer) = self.world.flyer.as_mut() {
            if out_of_bounds(flyer.pos.y, arena) && flyer.kill() {
                // Picked up by the alive check on the next step
                log::debug!("Flyer left the playfield at y={:.1}", flyer.pos.y);
            }
        }

        self.check_obstacle_collision();
    }

    fn check_obstacle_collision(&mut self) {
        let Some(flyer) = self.world.flyer.as_mut() else {
            return;
        };
        if !flyer.is_alive() {
            return;
        }

        let hit = first_obstacle_hit(
            flyer.pos,
            self.tuning.flyer.radius,
            self.world.obstacles.iter().filter(|o| !o.is_removed()).map(|o| o.pos),
            &self.tuning.obstacle,
        );
        if hit.is_some() {
            flyer.kill();
            self.end_game();
        }
    }

    fn on_obstacle_passed(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }

        self.score += 1;
        self.obstacles_passed += 1;

        let difficulty = self.scaler.update(self.score);
        self.obstacle_spawner.set_spawn_interval(difficulty.spawn_interval);
        if let Some(spawner) = self.pickup_spawner.as_mut() {
            spawner.set_spawn_interval(difficulty.spawn_interval);
        }

        log::debug!(
            "Score {} -> speed {:.0}, interval {:.2}s",
            self.score,
            difficulty.scroll_speed,
            difficulty.spawn_interval
        );
        self.events.emit(&GameEvent::ScoreChanged { score: self.score });
    }

    fn on_pickup_collected(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }

        self.coins_collected += 1;
        self.events.emit(&GameEvent::CoinsChanged {
            total: self.coins_collected,
        });
    }

    fn run_deferred(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            match task {
                Deferred::StartGame => self.start_game(),
            }
        }
    }
}

fn spawn_point(tuning: &Tuning) -> Vec2 {
    Vec2::new(tuning.flyer.spawn_x, tuning.flyer.spawn_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, StoreError};
    use chrono::TimeDelta;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Clock advanced by hand
    #[derive(Clone)]
    struct ManualClock(Rc<Cell<DateTime<Utc>>>);

    impl ManualClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(Utc::now())))
        }

        fn advance_secs(&self, secs: i64) {
            self.0.set(self.0.get() + TimeDelta::seconds(secs));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    /// Store that shares its state with the test
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl StatsStore for SharedStore {
        fn save_session(&mut self, summary: &SessionSummary) -> Result<(), StoreError> {
            self.0.borrow_mut().save_session(summary)
        }
        fn statistics(&self) -> Result<AggregateStatistics, StoreError> {
            self.0.borrow().statistics()
        }
        fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
            self.0.borrow().recent_sessions(limit)
        }
        fn reset(&mut self) -> Result<(), StoreError> {
            self.0.borrow_mut().reset()
        }
    }

    /// Store that is always down
    struct BrokenStore;

    impl StatsStore for BrokenStore {
        fn save_session(&mut self, _: &SessionSummary) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk unplugged".into()))
        }
        fn statistics(&self) -> Result<AggregateStatistics, StoreError> {
            Err(StoreError::Unavailable("disk unplugged".into()))
        }
        fn recent_sessions(&self, _: usize) -> Result<Vec<SessionRecord>, StoreError> {
            Err(StoreError::Unavailable("disk unplugged".into()))
        }
        fn reset(&mut self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk unplugged".into()))
        }
    }

    fn record_events(session: &mut GameSession) -> Rc<RefCell<Vec<GameEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        session.subscribe(move |e| sink.borrow_mut().push(*e));
        log
    }

    /// Quiet session: no pickups, no gravity, so nothing happens unless a
    /// test arranges it
    fn calm_session() -> GameSession {
        let mut tuning = Tuning::default();
        tuning.flyer.gravity = 0.0;
        GameSession::new(tuning, 42).without_pickups()
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn flyer(session: &mut GameSession) -> &mut Flyer {
        session.world.flyer.as_mut().unwrap()
    }

    #[test]
    fn test_initial_state_is_menu() {
        let session = GameSession::new(Tuning::default(), 1);
        assert_eq!(session.state(), SessionState::Menu);
        assert_eq!(session.score(), 0);
        assert_eq!(session.difficulty_level(), 1);
    }

    #[test]
    fn test_menu_does_not_simulate() {
        let mut session = GameSession::new(Tuning::default(), 1);
        let y = session.world().flyer.as_ref().unwrap().pos.y;
        for _ in 0..60 {
            session.step(&idle(), SIM_DT);
        }
        assert_eq!(session.world().flyer.as_ref().unwrap().pos.y, y);
        assert!(session.world().obstacles.is_empty());
    }

    #[test]
    fn test_start_emits_events_in_order() {
        let mut session = calm_session();
        let events = record_events(&mut session);
        session.start_game();
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(
            *events.borrow(),
            [
                GameEvent::GameStarted,
                GameEvent::ScoreChanged { score: 0 },
                GameEvent::CoinsChanged { total: 0 },
            ]
        );
    }

    #[test]
    fn test_start_is_idempotent_while_playing() {
        let mut session = calm_session();
        session.start_game();
        session.on_obstacle_passed();
        session.on_obstacle_passed();
        flyer(&mut session).pos.y = 400.0;
        let events = record_events(&mut session);

        session.start_game();
        assert_eq!(session.score(), 2);
        assert_eq!(session.world().flyer.as_ref().unwrap().pos.y, 400.0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_first_obstacle_spawns_on_first_step() {
        let mut session = calm_session();
        session.start_game();
        session.step(&idle(), SIM_DT);
        assert_eq!(session.world().obstacles.len(), 1);
        assert_eq!(session.world().obstacles[0].pos.x, 2000.0);
    }

    #[test]
    fn test_score_drives_difficulty() {
        let mut session = calm_session();
        session.start_game();
        let events = record_events(&mut session);
        for _ in 0..50 {
            session.on_obstacle_passed();
        }
        assert_eq!(session.score(), 50);
        assert_eq!(session.obstacles_passed(), 50);
        assert!((session.difficulty().scroll_speed - 300.0).abs() < 1e-3);
        assert!((session.difficulty().spawn_interval - 2.0).abs() < 1e-3);
        assert_eq!(
            session.obstacle_spawner.spawn_interval(),
            session.difficulty().spawn_interval
        );
        assert_eq!(events.borrow().len(), 50);
        assert_eq!(events.borrow()[49], GameEvent::ScoreChanged { score: 50 });
    }

    #[test]
    fn test_passing_obstacle_scores() {
        let mut session = calm_session();
        session.start_game();
        let tuning = *session.tuning();
        session.world.spawn_obstacle(Vec2::new(tuning.obstacle.passed_x + 0.5, 540.0));
        session.step(&idle(), SIM_DT);
        assert_eq!(session.score(), 1);
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn test_end_game_saves_and_notifies() {
        let clock = ManualClock::new();
        let store = SharedStore::default();
        let mut session = calm_session()
            .with_clock(Box::new(clock.clone()))
            .with_store(Box::new(store.clone()));
        let events = record_events(&mut session);

        session.start_game();
        for _ in 0..10 {
            session.on_obstacle_passed();
        }
        for _ in 0..3 {
            session.on_pickup_collected();
        }
        clock.advance_secs(42);
        session.end_game();

        assert_eq!(session.state(), SessionState::GameOver);
        assert_eq!(
            events.borrow().last(),
            Some(&GameEvent::GameOver { final_score: 10 })
        );
        assert!(!session.obstacle_spawner.is_spawning());

        let stats = store.statistics().unwrap();
        assert_eq!(stats.high_score, 10);
        assert_eq!(stats.total_games_played, 1);
        assert_eq!(stats.average_score, 10);
        assert_eq!(stats.total_coins_collected, 3);

        let history = session.recent_sessions(10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].duration_secs, 42.0);
        assert_eq!(history[0].coins_collected, 3);
    }

    #[test]
    fn test_end_game_twice_saves_once() {
        let store = SharedStore::default();
        let mut session = calm_session().with_store(Box::new(store.clone()));
        session.start_game();
        session.end_game();
        session.end_game();
        assert_eq!(store.statistics().unwrap().total_games_played, 1);
    }

    #[test]
    fn test_end_game_from_menu_is_noop() {
        let mut session = calm_session();
        let events = record_events(&mut session);
        session.end_game();
        assert_eq!(session.state(), SessionState::Menu);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_store_failure_does_not_block_game_over() {
        let mut session = calm_session().with_store(Box::new(BrokenStore));
        let events = record_events(&mut session);
        session.start_game();
        session.end_game();
        assert_eq!(session.state(), SessionState::GameOver);
        assert_eq!(
            events.borrow().last(),
            Some(&GameEvent::GameOver { final_score: 0 })
        );
        assert!(session.statistics().is_none());
        assert!(session.recent_sessions(10).is_empty());
    }

    #[test]
    fn test_events_after_end_are_ignored() {
        let mut session = calm_session();
        session.start_game();
        session.on_obstacle_passed();
        session.end_game();

        session.on_obstacle_passed();
        session.on_pickup_collected();
        assert_eq!(session.score(), 1);
        assert_eq!(session.coins_collected(), 0);

        // Obstacles still scrolling on the game-over screen can't score
        let tuning = *session.tuning();
        session.world.spawn_obstacle(Vec2::new(tuning.obstacle.passed_x + 0.5, 540.0));
        session.step(&idle(), SIM_DT);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_no_spawns_after_end() {
        let mut session = GameSession::new(Tuning::default(), 9);
        session.start_game();
        session.end_game();
        for _ in 0..(10.0 / SIM_DT) as u32 {
            session.step(&idle(), SIM_DT);
        }
        assert!(session.world().obstacles.is_empty());
        assert!(session.world().pickups.is_empty());
    }

    #[test]
    fn test_restart_is_deferred_one_step() {
        let mut session = calm_session();
        session.start_game();
        session.on_obstacle_passed();
        session.on_obstacle_passed();
        let events = record_events(&mut session);

        session.restart_game();
        assert_eq!(session.state(), SessionState::GameOver);
        assert!(session.has_pending_start());

        session.step(&idle(), SIM_DT);
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.score(), 0);
        assert!(session.world().flyer.as_ref().unwrap().is_alive());
        assert_eq!(
            events.borrow()[..2],
            [
                GameEvent::GameOver { final_score: 2 },
                GameEvent::GameStarted
            ]
        );
    }

    #[test]
    fn test_restart_queues_single_start() {
        let mut session = calm_session();
        let events = record_events(&mut session);
        session.restart_game();
        session.restart_game();
        session.step(&idle(), SIM_DT);
        let starts = events
            .borrow()
            .iter()
            .filter(|e| **e == GameEvent::GameStarted)
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_restart_revives_dead_flyer_and_clears_world() {
        let mut session = calm_session();
        session.start_game();
        for _ in 0..10 {
            session.step(&idle(), SIM_DT);
        }
        assert!(!session.world().obstacles.is_empty());
        flyer(&mut session).kill();
        session.step(&idle(), SIM_DT);
        assert_eq!(session.state(), SessionState::GameOver);

        session.restart_game();
        session.step(&idle(), SIM_DT);
        assert_eq!(session.state(), SessionState::Playing);
        let flyer = session.world().flyer.as_ref().unwrap();
        assert!(flyer.is_alive());
        assert_eq!(flyer.pos, Vec2::new(200.0, 540.0));
        assert!(session.world().obstacles.is_empty());
    }

    #[test]
    fn test_out_of_bounds_ends_game_next_step() {
        let mut session = calm_session();
        session.start_game();
        flyer(&mut session).pos.y = -100.0;

        session.step(&idle(), SIM_DT);
        assert!(!session.world().flyer.as_ref().unwrap().is_alive());
        assert_eq!(session.state(), SessionState::Playing);

        session.step(&idle(), SIM_DT);
        assert_eq!(session.state(), SessionState::GameOver);
    }

    #[test]
    fn test_ground_death_ends_game_same_step() {
        let mut session = GameSession::new(Tuning::default(), 3).without_pickups();
        session.start_game();
        let mut steps = 0;
        while session.state() == SessionState::Playing {
            session.step(&idle(), SIM_DT);
            steps += 1;
            assert!(steps < 600, "flyer should hit the ground");
        }
        let flyer = session.world().flyer.as_ref().unwrap();
        assert!(flyer.on_floor());
        assert_eq!(session.state(), SessionState::GameOver);
    }

    #[test]
    fn test_polled_collision_ends_game_immediately() {
        let mut session = calm_session();
        session.start_game();
        // After one step the lower barrier's top-left corner sits at about
        // (215, 555), diagonally 21px from the flyer's centre: no circle
        // contact, but the box poll sees the span [520, 560] leave the gap.
        session.world.spawn_obstacle(Vec2::new(320.25, 445.0));
        session.step(&idle(), SIM_DT);
        assert!(!session.world().obstacles[0].has_hit_flyer());
        assert_eq!(session.state(), SessionState::GameOver);
        assert!(!session.world().flyer.as_ref().unwrap().is_alive());
    }

    #[test]
    fn test_flyer_inside_gap_survives() {
        let mut session = calm_session();
        session.start_game();
        // Gap [330, 750] around the flyer's span [520, 560]
        session.world.spawn_obstacle(Vec2::new(200.0, 640.0));
        for _ in 0..30 {
            session.step(&idle(), SIM_DT);
        }
        assert_eq!(session.state(), SessionState::Playing);
        assert!(session.world().flyer.as_ref().unwrap().is_alive());
    }

    #[test]
    fn test_collected_pickup_counts() {
        let mut session = calm_session();
        let events = record_events(&mut session);
        session.start_game();
        session.world.spawn_pickup(Vec2::new(205.0, 540.0));
        session.step(&idle(), SIM_DT);
        assert_eq!(session.coins_collected(), 1);
        assert!(session.world().pickups.is_empty());
        assert_eq!(
            events.borrow().last(),
            Some(&GameEvent::CoinsChanged { total: 1 })
        );
    }

    #[test]
    fn test_return_to_menu_resets_without_saving() {
        let store = SharedStore::default();
        let mut session = calm_session().with_store(Box::new(store.clone()));
        session.start_game();
        for _ in 0..5 {
            session.step(&idle(), SIM_DT);
        }
        session.on_obstacle_passed();
        session.restart_game();

        session.return_to_menu();
        assert_eq!(session.state(), SessionState::Menu);
        assert_eq!(session.score(), 0);
        assert!(!session.has_pending_start());
        assert!(session.world().obstacles.is_empty());
        assert!(session.world().flyer.as_ref().unwrap().is_alive());

        session.step(&idle(), SIM_DT);
        assert_eq!(session.state(), SessionState::Menu);
        // Only the restart's end_game wrote a record
        assert_eq!(store.statistics().unwrap().total_games_played, 1);
    }

    #[test]
    fn test_return_to_menu_resets_difficulty() {
        let mut session = calm_session();
        session.start_game();
        for _ in 0..42 {
            session.on_obstacle_passed();
        }
        assert_eq!(session.difficulty_level(), 6);

        session.return_to_menu();
        assert_eq!(session.difficulty_level(), 1);
        assert_eq!(
            *session.difficulty(),
            Difficulty::base(&session.tuning().difficulty)
        );
    }

    #[test]
    fn test_missing_flyer_skips_checks() {
        let mut session = GameSession::new(Tuning::default(), 5).without_flyer();
        session.start_game();
        for _ in 0..600 {
            session.step(&TickInput { lift: true, autopilot: true }, SIM_DT);
        }
        assert_eq!(session.state(), SessionState::Playing);
        assert!(!session.world().obstacles.is_empty());
    }

    #[test]
    fn test_advance_runs_fixed_steps() {
        let mut session = calm_session();
        session.start_game();
        let steps = session.advance(&idle(), 1.0 / 60.0 + SIM_DT * 0.1);
        assert_eq!(steps, 2);
        assert_eq!(session.frame(), 2);
    }

    #[test]
    fn test_autopilot_scores() {
        let mut session = GameSession::new(Tuning::default(), 2024).without_pickups();
        session.start_game();
        let input = TickInput {
            lift: false,
            autopilot: true,
        };
        for _ in 0..(30.0 / SIM_DT) as u32 {
            session.step(&input, SIM_DT);
            if session.state() != SessionState::Playing {
                break;
            }
        }
        assert!(session.score() > 0, "autopilot should clear some gates");
    }
}
