//! Cooperative prescribed performance control module
//!
//! Each cycle the object state is estimated from both arms, the position and
//! velocity loop errors are passed through the performance envelopes and
//! barrier transform, and the resulting object level input is shared between
//! the arms and mapped onto joint torques.
//!
//! The immutable configuration (`Params`) and the evolving state
//! (`CtrlState`) are kept apart, `law::cycle` takes both explicitly.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod ctrl_state;
pub mod law;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use ctrl_state::*;
pub use params::*;
pub use state::*;

use crate::arm_kin::ArmKinError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during CoopCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum CoopCtrlError {
    #[error("Kinematics error: {0}")]
    Kinematics(#[from] ArmKinError),

    #[error("The control loop has not been started")]
    NotStarted,

    #[error("The control loop is shut down")]
    ShutDown,
}

/// Possible errors that can occur while initialising CoopCtrl.
#[derive(Debug, thiserror::Error)]
pub enum CoopCtrlInitError {
    #[error("Could not load the parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Could not create the archive: {0}")]
    ArchiveError(#[from] util::archive::ArchiveError),
}
