//=========================================================================
// Loop Configuration
//=========================================================================
//
// Validated timing parameters for the main loop.
//
// Rates are checked at configuration time so the loop itself never has
// to guard against a zero divisor mid-frame.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

//=== ConfigError =========================================================

/// Loop configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A target frame rate of zero frames per second was requested.
    ZeroFrameRate,

    /// A physics rate of zero steps per second was requested.
    ZeroPhysicsRate,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroFrameRate => write!(f, "Target frame rate must be positive"),
            Self::ZeroPhysicsRate => write!(f, "Physics rate must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

//=== LoopConfig ==========================================================

/// Timing parameters for [`crate::Engine::run`].
///
/// Defaults to an uncapped frame rate and a 60 Hz physics cadence.
/// The frame cap is opt-in: without one the loop runs as fast as the
/// driving thread allows and only the physics cadence is fixed.
///
/// # Examples
///
/// ```rust
/// use cadence_engine::core::config::LoopConfig;
///
/// let config = LoopConfig::new()
///     .with_frame_cap(144)?
///     .with_physics_rate(120)?;
///
/// assert_eq!(config.frame_cap(), Some(144));
/// assert_eq!(config.physics_rate(), 120);
/// # Ok::<(), cadence_engine::core::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    frame_cap: Option<u32>,
    physics_rate: u32,
}

impl LoopConfig {
    /// Default physics cadence in fixed steps per second.
    pub const DEFAULT_PHYSICS_RATE: u32 = 60;

    //--- Construction -----------------------------------------------------

    /// Creates a configuration with no frame cap and the default
    /// physics rate.
    pub fn new() -> Self {
        Self {
            frame_cap: None,
            physics_rate: Self::DEFAULT_PHYSICS_RATE,
        }
    }

    /// Caps the frame rate at `fps` frames per second.
    ///
    /// The loop enforces the cap by spinning until the minimum frame
    /// time has elapsed, trading CPU for timing precision.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroFrameRate`] if `fps` is zero.
    pub fn with_frame_cap(mut self, fps: u32) -> Result<Self, ConfigError> {
        if fps == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        self.frame_cap = Some(fps);
        Ok(self)
    }

    /// Sets the fixed physics cadence to `hz` steps per second.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroPhysicsRate`] if `hz` is zero.
    pub fn with_physics_rate(mut self, hz: u32) -> Result<Self, ConfigError> {
        if hz == 0 {
            return Err(ConfigError::ZeroPhysicsRate);
        }
        self.physics_rate = hz;
        Ok(self)
    }

    //--- Accessors --------------------------------------------------------

    /// The target frame rate, or `None` when uncapped.
    pub fn frame_cap(&self) -> Option<u32> {
        self.frame_cap
    }

    /// The fixed physics cadence in steps per second.
    pub fn physics_rate(&self) -> u32 {
        self.physics_rate
    }

    /// Minimum wall-clock duration of one frame, or `None` when uncapped.
    pub(crate) fn min_frame_time(&self) -> Option<Duration> {
        self.frame_cap
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)))
    }

    /// Duration of one fixed physics step.
    pub(crate) fn fixed_step(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.physics_rate))
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::new()
    }
}

//=== Tests ===============================================================
