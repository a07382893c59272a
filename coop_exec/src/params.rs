//! # Cooperative Executable Parameters
//!
//! This module provide parameters for the cooperative control executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoopExecParams {

    /// Rate of the control loop
    ///
    /// Units: hertz
    pub control_rate_hz: f64,

    /// If true the control signals of every cycle are archived to the session
    pub archive_signals: bool
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CoopExecParams {
    fn default() -> Self {
        Self {
            control_rate_hz: 120.0,
            archive_signals: false
        }
    }
}

impl CoopExecParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.control_rate_hz > 0.0 && self.control_rate_hz.is_finite()) {
            return Err(format!("control_rate_hz must be positive, got {}", self.control_rate_hz))
        }

        Ok(())
    }

    /// Target length of one control cycle.
    pub fn cycle_period_s(&self) -> f64 {
        1.0 / self.control_rate_hz
    }
}
