//! # Trajectory Messages
//!
//! The target configuration of the grasped object published by the trajectory source.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Target configuration of the object, expressed in the arm 1 inertial frame.
///
/// Each field is `[x, y, orientation]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TargetConfiguration {
    /// Units: meters, meters, radians
    pub pos: [f64; 3],

    /// Units: meters/second, meters/second, radians/second
    pub vel: [f64; 3],

    /// Units: meters/second^2, meters/second^2, radians/second^2
    pub acc: [f64; 3],
}
