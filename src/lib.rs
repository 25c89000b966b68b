//=========================================================================
// Cadence Engine — Library Root
//
// This crate is the driving loop of an interactive real-time simulation:
// wall-clock frame timing, a fixed-rate physics cadence decoupled from
// the per-frame cadence, and deterministic startup/shutdown ordering for
// independently pluggable subsystems.
//
// Responsibilities:
// - Expose the loop driver (`Engine`) and its timing configuration
// - Define the `Subsystem` and `Session` contracts the driver consumes
// - Keep frame timing internals (clock, accumulator) private
//
// Typical usage:
// ```no_run
// use cadence_engine::prelude::*;
//
// let mut engine = Engine::new();
// engine.set_session(/* the selected session */);
// engine.startup()?;
// engine.run(LoopConfig::new());
// engine.shutdown();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the loop machinery: configuration, the subsystem and
// session contracts, and stop signalling. It is exposed publicly for
// engine-level extensibility, but application code will mostly use the
// top-level `Engine` facade through the prelude.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `engine` defines the loop driver itself and is re-exported below.
//
mod engine;

//--- Public Exports ------------------------------------------------------
//
// Re-exports the driver surface so users can simply
// `use cadence_engine::Engine;` without knowing the module structure.
//
pub use crate::core::{ConfigError, LoopConfig, Session, StopHandle, Subsystem, SubsystemError};
pub use crate::engine::{Engine, StartupError};
