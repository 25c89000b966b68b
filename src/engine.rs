//=========================================================================
// Engine
//
// The loop driver for a real-time simulation.
//
// Owns the ordered subsystem collection, the optional fixed-rate physics
// subsystem, and the active session, and drives three phases:
//
//   startup()  — subsystems in registration order, then physics,
//                then the session
//   run()      — the timestepping main loop
//   shutdown() — the session, then physics, then subsystems in
//                reverse registration order
//
// Notes:
// Everything runs on the caller's thread. `run` borrows the engine
// mutably for its whole duration, so registration during an active loop
// cannot compile; the only cross-thread surface is the stop handle.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{info, warn};

//=== Internal Dependencies ===============================================

use crate::core::clock::FrameClock;
use crate::core::config::LoopConfig;
use crate::core::control::{CommandQueue, LoopControl, StopHandle};
use crate::core::session::Session;
use crate::core::subsystem::{Subsystem, SubsystemError};
use crate::core::timestep::Timestep;

//=== StartupError ========================================================

/// Failure raised while starting the engine.
#[derive(Debug)]
pub enum StartupError {
    /// No active session was installed before startup.
    MissingSession,

    /// A collaborator's own startup failure, propagated unmodified.
    Subsystem {
        /// Name of the failing subsystem or session.
        name: &'static str,
        /// The failure as the collaborator raised it.
        source: SubsystemError,
    },
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSession => {
                write!(f, "No active session was installed before startup")
            }
            Self::Subsystem { name, source } => {
                write!(f, "Subsystem `{}` failed to start: {}", name, source)
            }
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingSession => None,
            Self::Subsystem { source, .. } => {
                let source: &(dyn std::error::Error + 'static) = &**source;
                Some(source)
            }
        }
    }
}

//=== Engine ==============================================================

/// The loop driver.
///
/// Construct exactly one in the entry point, register collaborators, and
/// hand a [`StopHandle`] to anything that needs to end the run. The
/// engine exclusively owns every registered subsystem, the physics slot,
/// and the session; [`Engine::shutdown`] (or dropping the engine) is the
/// single release point.
///
/// # Lifecycle
///
/// ```no_run
/// use cadence_engine::prelude::*;
///
/// struct Audio;
/// impl Subsystem for Audio {
///     fn name(&self) -> &'static str { "audio" }
///     fn update(&mut self, _dt: f32) {}
/// }
///
/// struct Levels;
/// impl Session for Levels {
///     fn name(&self) -> &'static str { "levels" }
///     fn update(&mut self, _dt: f32) {}
/// }
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut engine = Engine::new();
///     engine.add(Box::new(Audio));
///     engine.set_session(Box::new(Levels));
///
///     engine.startup()?;
///     engine.run(LoopConfig::new().with_frame_cap(144)?);
///     engine.shutdown();
///     Ok(())
/// }
/// ```
pub struct Engine {
    subsystems: Vec<Box<dyn Subsystem>>,
    physics: Option<Box<dyn Subsystem>>,
    session: Option<Box<dyn Session>>,
    commands: CommandQueue,
    running: bool,
    time: f64,
}

impl Engine {
    //--- Construction -----------------------------------------------------

    /// Creates an empty engine.
    ///
    /// Register subsystems with [`Engine::add`], at most one physics
    /// subsystem with [`Engine::add_physics`], and exactly one session
    /// with [`Engine::set_session`] before calling [`Engine::startup`].
    pub fn new() -> Self {
        Self {
            subsystems: Vec::new(),
            physics: None,
            session: None,
            commands: CommandQueue::new(),
            running: true,
            time: 0.0,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Appends a subsystem to the registration sequence.
    ///
    /// Registration order is significant: it is the startup order and
    /// the reverse of the shutdown order. No deduplication is performed.
    pub fn add(&mut self, subsystem: Box<dyn Subsystem>) {
        self.subsystems.push(subsystem);
    }

    /// Installs the physics subsystem, stepped at the fixed physics rate
    /// instead of once per frame.
    ///
    /// Replaces and releases any previously installed physics subsystem.
    /// Without one, no fixed-rate stepping occurs.
    pub fn add_physics(&mut self, physics: Box<dyn Subsystem>) {
        if let Some(previous) = self.physics.replace(physics) {
            warn!(
                "Physics subsystem `{}` was already installed and has been replaced",
                previous.name()
            );
        }
    }

    /// Installs the active session.
    ///
    /// Exactly one session drives gameplay per run; which implementation
    /// that is gets decided here, once, rather than branching inside the
    /// loop. Replaces and releases any previously installed session.
    pub fn set_session(&mut self, session: Box<dyn Session>) {
        if let Some(previous) = self.session.replace(session) {
            warn!(
                "Session `{}` was already installed and has been replaced",
                previous.name()
            );
        }
    }

    //--- Lifecycle --------------------------------------------------------

    /// Starts every subsystem in registration order, then physics, then
    /// the session.
    ///
    /// # Errors
    ///
    /// The first failing collaborator aborts the remaining startup calls
    /// and its error is propagated unmodified inside
    /// [`StartupError::Subsystem`]. Collaborators that already started
    /// are released by calling [`Engine::shutdown`].
    pub fn startup(&mut self) -> Result<(), StartupError> {
        if self.session.is_none() {
            return Err(StartupError::MissingSession);
        }

        for subsystem in &mut self.subsystems {
            info!("Starting subsystem `{}`", subsystem.name());
            subsystem.startup().map_err(|source| StartupError::Subsystem {
                name: subsystem.name(),
                source,
            })?;
        }

        if let Some(physics) = self.physics.as_mut() {
            info!("Starting physics subsystem `{}`", physics.name());
            physics.startup().map_err(|source| StartupError::Subsystem {
                name: physics.name(),
                source,
            })?;
        }

        if let Some(session) = self.session.as_mut() {
            info!("Starting session `{}`", session.name());
            session.on_start().map_err(|source| StartupError::Subsystem {
                name: session.name(),
                source,
            })?;
        }

        Ok(())
    }

    /// Stops the session, then releases physics, then every subsystem in
    /// reverse registration order.
    ///
    /// Idempotent: a second call finds the slots empty and does nothing.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            info!("Stopping session `{}`", session.name());
            session.on_stop();
        }

        if let Some(physics) = self.physics.take() {
            info!("Shutting down physics subsystem `{}`", physics.name());
            drop(physics);
        }

        while let Some(subsystem) = self.subsystems.pop() {
            info!("Shutting down subsystem `{}`", subsystem.name());
            drop(subsystem);
        }
    }

    //--- Control ----------------------------------------------------------

    /// Ends the run at the next loop-condition check.
    ///
    /// The in-flight frame, including all subsystem, physics, and session
    /// updates already underway, completes before the loop exits.
    pub fn end_game(&mut self) {
        self.running = false;
    }

    /// Creates a stop handle for collaborators that need to end the run
    /// from inside an update or from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.commands.handle()
    }

    /// Total simulation time in seconds accumulated by the loop.
    ///
    /// The sum of every measured frame delta; monotonically
    /// non-decreasing while the loop runs.
    pub fn current_time(&self) -> f64 {
        self.time
    }

    //--- Main Loop --------------------------------------------------------

    /// Runs the timestepping main loop until a stop is requested.
    ///
    /// Each frame measures the wall-clock delta (spinning up to the
    /// minimum frame time when capped), updates every subsystem with it,
    /// steps physics zero or more times by the fixed step, and updates
    /// the session. The physics cadence is decoupled from the frame
    /// cadence: step size stays deterministic regardless of frame-rate
    /// variance.
    pub fn run(&mut self, config: LoopConfig) {
        let mut clock = FrameClock::start(config.min_frame_time());
        let mut timestep = Timestep::new(config.fixed_step());

        info!(
            "Entering main loop (physics: {} Hz, frame cap: {:?})",
            config.physics_rate(),
            config.frame_cap()
        );

        while self.running {
            if let LoopControl::Exit = self.commands.drain() {
                self.running = false;
                continue;
            }

            let dt = clock.next_frame();
            let dt_secs = dt.as_secs_f32();

            self.time += dt.as_secs_f64();
            timestep.accumulate(dt);

            self.update(dt_secs);

            if timestep.clamp_backlog() {
                warn!(
                    "Frame stalled ({} ms); physics backlog clamped to a single step",
                    dt.as_millis()
                );
            }

            if let Some(physics) = self.physics.as_mut() {
                while timestep.consume_step() {
                    physics.update(timestep.fixed_delta());
                }
            }

            if let Some(session) = self.session.as_mut() {
                session.update(dt_secs);
            }
        }

        info!(
            "Main loop exited after {:.3} s of simulation time",
            self.time
        );
    }

    //--- Per-Frame Update -------------------------------------------------

    /// Updates every registered subsystem, in registration order.
    ///
    /// Unconditional: every subsystem sees every frame.
    pub fn update(&mut self, dt: f32) {
        for subsystem in &mut self.subsystems {
            subsystem.update(dt);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Container drop order would release subsystems front-to-back;
        // shutdown enforces the reverse-registration contract instead.
        self.shutdown();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type EventLog = Rc<RefCell<Vec<String>>>;

    fn new_log() -> EventLog {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn events(log: &EventLog) -> Vec<String> {
        log.borrow().clone()
    }

    //--- Recorder Subsystem -----------------------------------------------

    struct Recorder {
        name: &'static str,
        log: EventLog,
        fail_startup: bool,
        deltas: Rc<RefCell<Vec<f32>>>,
    }

    impl Recorder {
        fn new(name: &'static str, log: &EventLog) -> Self {
            Self {
                name,
                log: log.clone(),
                fail_startup: false,
                deltas: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn failing(name: &'static str, log: &EventLog) -> Self {
            let mut recorder = Self::new(name, log);
            recorder.fail_startup = true;
            recorder
        }
    }

    impl Subsystem for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn startup(&mut self) -> Result<(), SubsystemError> {
            self.log.borrow_mut().push(format!("startup {}", self.name));
            if self.fail_startup {
                return Err("refused to start".into());
            }
            Ok(())
        }

        fn update(&mut self, dt: f32) {
            self.log.borrow_mut().push(format!("update {}", self.name));
            self.deltas.borrow_mut().push(dt);
        }
    }

    impl Drop for Recorder {
        fn drop(&mut self) {
            self.log.borrow_mut().push(format!("drop {}", self.name));
        }
    }

    //--- Recorder Session -------------------------------------------------

    struct StopAfter {
        log: EventLog,
        frames_left: u32,
        handle: Rc<RefCell<Option<StopHandle>>>,
        total_dt: Rc<RefCell<f64>>,
    }

    impl StopAfter {
        fn new(frames: u32, log: &EventLog) -> Self {
            Self {
                log: log.clone(),
                frames_left: frames,
                handle: Rc::new(RefCell::new(None)),
                total_dt: Rc::new(RefCell::new(0.0)),
            }
        }
    }

    impl Session for StopAfter {
        fn name(&self) -> &'static str {
            "session"
        }

        fn on_start(&mut self) -> Result<(), SubsystemError> {
            self.log.borrow_mut().push("start session".to_string());
            Ok(())
        }

        fn update(&mut self, dt: f32) {
            self.log.borrow_mut().push("update session".to_string());
            *self.total_dt.borrow_mut() += f64::from(dt);

            self.frames_left -= 1;
            if self.frames_left == 0 {
                if let Some(handle) = self.handle.borrow().as_ref() {
                    handle.request_stop();
                }
            }
        }

        fn on_stop(&mut self) {
            self.log.borrow_mut().push("stop session".to_string());
        }
    }

    fn engine_with_session(frames: u32, log: &EventLog) -> (Engine, Rc<RefCell<f64>>) {
        let session = StopAfter::new(frames, log);
        let handle_slot = session.handle.clone();
        let total_dt = session.total_dt.clone();

        let mut engine = Engine::new();
        engine.set_session(Box::new(session));
        *handle_slot.borrow_mut() = Some(engine.stop_handle());

        (engine, total_dt)
    }

    //--- Lifecycle Ordering -----------------------------------------------

    #[test]
    fn startup_runs_in_registration_order_with_physics_and_session_last() {
        let log = new_log();
        let (mut engine, _) = engine_with_session(1, &log);
        engine.add(Box::new(Recorder::new("a", &log)));
        engine.add(Box::new(Recorder::new("b", &log)));
        engine.add_physics(Box::new(Recorder::new("physics", &log)));

        engine.startup().unwrap();

        assert_eq!(
            events(&log),
            ["startup a", "startup b", "startup physics", "start session"]
        );
    }

    #[test]
    fn shutdown_releases_in_reverse_registration_order() {
        let log = new_log();
        let (mut engine, _) = engine_with_session(1, &log);
        engine.add(Box::new(Recorder::new("a", &log)));
        engine.add(Box::new(Recorder::new("b", &log)));
        engine.add(Box::new(Recorder::new("c", &log)));
        engine.add_physics(Box::new(Recorder::new("physics", &log)));

        engine.startup().unwrap();
        log.borrow_mut().clear();
        engine.shutdown();

        assert_eq!(
            events(&log),
            ["stop session", "drop physics", "drop c", "drop b", "drop a"]
        );
    }

    #[test]
    fn shutdown_is_idempotent() {
        let log = new_log();
        let (mut engine, _) = engine_with_session(1, &log);
        engine.add(Box::new(Recorder::new("a", &log)));

        engine.startup().unwrap();
        engine.shutdown();
        let after_first = events(&log);

        engine.shutdown();
        assert_eq!(events(&log), after_first);
    }

    #[test]
    fn dropping_the_engine_releases_in_reverse_order() {
        let log = new_log();
        let (mut engine, _) = engine_with_session(1, &log);
        engine.add(Box::new(Recorder::new("a", &log)));
        engine.add(Box::new(Recorder::new("b", &log)));

        engine.startup().unwrap();
        log.borrow_mut().clear();
        drop(engine);

        assert_eq!(events(&log), ["stop session", "drop b", "drop a"]);
    }

    //--- Startup Failures -------------------------------------------------

    #[test]
    fn startup_without_a_session_is_rejected() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.startup(),
            Err(StartupError::MissingSession)
        ));
    }

    #[test]
    fn a_failing_subsystem_aborts_the_remaining_startup_calls() {
        let log = new_log();
        let (mut engine, _) = engine_with_session(1, &log);
        engine.add(Box::new(Recorder::new("a", &log)));
        engine.add(Box::new(Recorder::failing("b", &log)));
        engine.add(Box::new(Recorder::new("c", &log)));

        let error = engine.startup().unwrap_err();
        assert!(matches!(
            error,
            StartupError::Subsystem { name: "b", .. }
        ));
        assert_eq!(events(&log), ["startup a", "startup b"]);

        // Already-started subsystems are still released in reverse order.
        log.borrow_mut().clear();
        engine.shutdown();
        assert_eq!(events(&log), ["stop session", "drop c", "drop b", "drop a"]);
    }

    //--- Registration -----------------------------------------------------

    #[test]
    fn installing_physics_twice_replaces_and_releases_the_first() {
        let log = new_log();
        let mut engine = Engine::new();
        engine.add_physics(Box::new(Recorder::new("solver-1", &log)));
        engine.add_physics(Box::new(Recorder::new("solver-2", &log)));

        assert_eq!(events(&log), ["drop solver-1"]);
    }

    #[test]
    fn update_hits_every_subsystem_in_registration_order() {
        let log = new_log();
        let mut engine = Engine::new();
        engine.add(Box::new(Recorder::new("a", &log)));
        engine.add(Box::new(Recorder::new("b", &log)));

        engine.update(0.016);

        assert_eq!(events(&log), ["update a", "update b"]);
    }

    //--- Main Loop --------------------------------------------------------

    #[test]
    fn a_stop_request_completes_the_current_frame_before_exiting() {
        let log = new_log();
        let (mut engine, _) = engine_with_session(1, &log);
        engine.add(Box::new(Recorder::new("a", &log)));
        engine.add(Box::new(Recorder::new("b", &log)));

        engine.startup().unwrap();
        log.borrow_mut().clear();
        engine.run(LoopConfig::new());

        // The stop fires during frame 1's session update; the frame still
        // completes and frame 2 never begins.
        assert_eq!(events(&log), ["update a", "update b", "update session"]);
    }

    #[test]
    fn every_frame_updates_subsystems_then_session() {
        let log = new_log();
        let (mut engine, _) = engine_with_session(3, &log);
        engine.add(Box::new(Recorder::new("a", &log)));

        engine.startup().unwrap();
        log.borrow_mut().clear();
        engine.run(LoopConfig::new());

        let expected: Vec<String> = (0..3)
            .flat_map(|_| ["update a".to_string(), "update session".to_string()])
            .collect();
        assert_eq!(events(&log), expected);
    }

    #[test]
    fn end_game_before_run_skips_the_loop_entirely() {
        let log = new_log();
        let (mut engine, _) = engine_with_session(1, &log);
        engine.add(Box::new(Recorder::new("a", &log)));

        engine.startup().unwrap();
        log.borrow_mut().clear();
        engine.end_game();
        engine.run(LoopConfig::new());

        assert!(events(&log).is_empty());
    }

    #[test]
    fn physics_receives_the_fixed_step_not_the_frame_delta() {
        let log = new_log();
        let (mut engine, _) = engine_with_session(4, &log);

        let physics = Recorder::new("physics", &log);
        let deltas = physics.deltas.clone();
        engine.add_physics(Box::new(physics));

        engine.startup().unwrap();
        // 30 fps frames against a 60 Hz cadence guarantee at least one
        // fixed step per frame.
        let config = LoopConfig::new().with_frame_cap(30).unwrap();
        engine.run(config);

        let seen = deltas.borrow();
        assert!(!seen.is_empty(), "Physics should have been stepped");
        let fixed = config.fixed_step().as_secs_f32();
        for dt in seen.iter() {
            assert!(
                (dt - fixed).abs() < 1e-6,
                "Physics delta ({dt}) should equal the fixed step ({fixed})"
            );
        }
    }

    #[test]
    fn current_time_accumulates_the_measured_frame_deltas() {
        let log = new_log();
        let (mut engine, total_dt) = engine_with_session(3, &log);

        engine.startup().unwrap();
        let config = LoopConfig::new().with_frame_cap(200).unwrap();
        engine.run(config);

        let time = engine.current_time();
        // Three capped frames cover at least three minimum frame times.
        assert!(time >= 3.0 * (1.0 / 200.0));
        // And the counter is exactly the sum the session observed.
        assert!((time - *total_dt.borrow()).abs() < 1e-3);
    }
}
