//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use cadence_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Loop driver
pub use crate::engine::{Engine, StartupError};

// Timing configuration
pub use crate::core::config::{ConfigError, LoopConfig};

// Contracts driven by the loop
pub use crate::core::session::Session;
pub use crate::core::subsystem::{Subsystem, SubsystemError};

// Stop signalling
pub use crate::core::StopHandle;
