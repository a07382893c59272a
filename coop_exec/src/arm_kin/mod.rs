//! Arm kinematics module
//!
//! Forward kinematics and velocity Jacobians of the two planar three link
//! arms. Arm 2 is mounted facing arm 1, so everything it reports is mirrored
//! into the arm 1 (inertial) frame.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod kinematics;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use kinematics::*;
pub use params::*;

use comms_if::eqpt::arm::ArmId;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Smallest Jacobian determinant magnitude accepted before the inversion is
/// considered ill-conditioned.
pub const MIN_JACOBIAN_DET: f64 = 1e-6;

/// Position of the second actuated joint above which the arm is approaching
/// the Jacobian singularity. The driver shuts the arm down a little further
/// on, this is only used to warn the operator.
///
/// Units: radians
pub const SINGULARITY_WARN_Q2_RAD: f64 = -0.55;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during kinematics calculations.
#[derive(Debug, thiserror::Error)]
pub enum ArmKinError {
    #[error("Jacobian of {0} is ill-conditioned (det = {1:.3e}) at q = {2:?}")]
    SingularJacobian(ArmId, f64, [f64; 3]),
}
