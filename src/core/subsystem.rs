//=========================================================================
// Subsystem Contract
//=========================================================================
//
// The unit the loop driver orchestrates: started once in registration
// order, updated every frame, released in reverse registration order.
//
// A physics subsystem implements the same contract; the driver steps it
// with the fixed physics delta instead of the frame delta.
//
//=========================================================================

//=== SubsystemError ======================================================

/// Error raised from a subsystem's own startup.
///
/// The driver does not interpret the failure; it is propagated unmodified
/// inside [`crate::StartupError`], tagged with the subsystem's name.
pub type SubsystemError = Box<dyn std::error::Error + Send + Sync>;

//=== Subsystem Trait =====================================================

/// A unit driven by the engine's main loop.
///
/// Subsystems are owned exclusively by the engine once registered and
/// release their resources on drop. Only `update` is required; `startup`
/// defaults to a no-op.
///
/// # Examples
///
/// ```rust
/// use cadence_engine::prelude::*;
///
/// struct Audio;
///
/// impl Subsystem for Audio {
///     fn name(&self) -> &'static str {
///         "audio"
///     }
///
///     fn update(&mut self, _dt: f32) {
///         // Mix one frame of sound.
///     }
/// }
/// ```
pub trait Subsystem {
    /// Name used in lifecycle logs and startup failure reports.
    fn name(&self) -> &'static str;

    /// One-time initialization, invoked in registration order.
    ///
    /// A failure here aborts the remaining startup sequence; subsystems
    /// that already started are released by [`crate::Engine::shutdown`].
    fn startup(&mut self) -> Result<(), SubsystemError> {
        Ok(())
    }

    /// Per-frame update.
    ///
    /// `dt` is the measured frame delta in seconds. A physics subsystem
    /// receives the fixed step instead, zero or more times per frame.
    fn update(&mut self, dt: f32);
}
