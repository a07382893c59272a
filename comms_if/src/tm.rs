//! # Telemetry Messages
//!
//! Control signal diagnostics published every control cycle for external monitoring.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of values in a control signals packet.
pub const NUM_CTRL_SIGNALS: usize = 12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Envelope values and raw errors of one control cycle.
///
/// `data` layout is
/// `[rho_v_x, e_v_x, rho_v_y, e_v_y, rho_v_theta, e_v_theta,
///   rho_s_x, e_s_x, rho_s_y, e_s_y, rho_s_theta, e_s_theta]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ControlSignals {
    /// Time since the envelope epoch.
    ///
    /// Units: seconds
    pub time_s: f64,

    pub data: [f64; NUM_CTRL_SIGNALS],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ControlSignals {
    /// Interleave the envelope diagonals with the raw errors of each loop.
    pub fn new(
        time_s: f64,
        rho_v: [f64; 3],
        e_v: [f64; 3],
        rho_s: [f64; 3],
        e_s: [f64; 3],
    ) -> Self {
        let mut data = [0f64; NUM_CTRL_SIGNALS];

        for i in 0..3 {
            data[2 * i] = rho_v[i];
            data[2 * i + 1] = e_v[i];
            data[6 + 2 * i] = rho_s[i];
            data[6 + 2 * i + 1] = e_s[i];
        }

        Self { time_s, data }
    }
}
