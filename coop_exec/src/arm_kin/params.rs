//! Geometry parameters for the arm kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Link geometry shared by both arms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmGeometry {
    /// Length of the first link along its own x axis.
    ///
    /// Units: meters
    pub l1_x_m: f64,

    /// Offset of the first link along its own y axis.
    ///
    /// Units: meters
    pub l1_y_m: f64,

    /// Length of the second link.
    ///
    /// Units: meters
    pub l2_m: f64,

    /// Length of the third link, up to the end effector origin.
    ///
    /// Units: meters
    pub l3_m: f64,

    /// Distance between the two arm bases along the arm 1 x axis.
    ///
    /// Units: meters
    pub arm_2_base_offset_x_m: f64,
}

impl Default for ArmGeometry {
    fn default() -> Self {
        Self {
            l1_x_m: 0.141924,
            l1_y_m: -0.047767,
            l2_m: 0.14203,
            l3_m: 0.15036,
            arm_2_base_offset_x_m: 0.603,
        }
    }
}
