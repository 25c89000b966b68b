//=========================================================================
// Session Contract
//=========================================================================
//
// The single gameplay/editor collaborator attached to the loop driver.
//
// Exactly one session is active per run; which implementation that is
// gets decided in the entry point, not inside the loop.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::subsystem::SubsystemError;

//=== Session Trait =======================================================

/// The active session driven once per frame by the engine.
///
/// Lifecycle hooks have default empty implementations; only `update` is
/// required. The session starts after every subsystem and stops before
/// any of them.
///
/// # Examples
///
/// ```rust
/// use cadence_engine::prelude::*;
///
/// struct Levels;
///
/// impl Session for Levels {
///     fn name(&self) -> &'static str {
///         "levels"
///     }
///
///     fn update(&mut self, _dt: f32) {
///         // Advance the current level.
///     }
/// }
/// ```
pub trait Session {
    /// Name used in lifecycle logs and startup failure reports.
    fn name(&self) -> &'static str;

    /// Called once, after all subsystems have started.
    ///
    /// Default implementation does nothing.
    fn on_start(&mut self) -> Result<(), SubsystemError> {
        Ok(())
    }

    /// Per-frame update with the measured frame delta in seconds.
    fn update(&mut self, dt: f32);

    /// Called once at shutdown, before any subsystem is released.
    ///
    /// Default implementation does nothing.
    fn on_stop(&mut self) {}
}
