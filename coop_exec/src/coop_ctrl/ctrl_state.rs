//! Evolving state of the control loop

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use super::CoopCtrlError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Lifecycle of the control loop.
///
/// The only transitions are `Initialising -> Running` once, before the
/// periodic loop starts, and any state to `ShutDown`. `ShutDown` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    Initialising,
    Running,
    ShutDown,
}

impl Default for LoopState {
    fn default() -> Self {
        LoopState::Initialising
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State carried from one control cycle to the next.
#[derive(Debug, Clone, Default)]
pub struct CtrlState {
    loop_state: LoopState,

    /// Time the performance envelopes are evaluated from.
    ///
    /// Units: seconds
    envelope_epoch_s: f64,

    envelope_restarted: bool,

    /// Whether each arm was in the singularity warning band last cycle.
    pub(crate) near_singularity: [bool; 2],

    pub(crate) num_cycles: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlState {
    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Number of cycles computed since the loop started.
    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    /// Move from `Initialising` to `Running`, starting the envelope clock at
    /// `time_s`.
    pub fn start(&mut self, time_s: f64) -> Result<(), CoopCtrlError> {
        match self.loop_state {
            LoopState::Initialising => {
                self.envelope_epoch_s = time_s;
                self.loop_state = LoopState::Running;
                info!("Control loop running, envelope epoch at {:.3} s", time_s);
                Ok(())
            }
            LoopState::Running => {
                warn!("Control loop already running, start ignored");
                Ok(())
            }
            LoopState::ShutDown => Err(CoopCtrlError::ShutDown),
        }
    }

    /// Enter the terminal `ShutDown` state.
    pub fn shut_down(&mut self) {
        if self.loop_state != LoopState::ShutDown {
            info!("Control loop shut down");
            self.loop_state = LoopState::ShutDown;
        }
    }

    /// Time since the envelope epoch.
    pub fn envelope_time_s(&self, time_s: f64) -> f64 {
        (time_s - self.envelope_epoch_s).max(0.0)
    }

    pub fn envelope_restarted(&self) -> bool {
        self.envelope_restarted
    }

    /// Move the envelope epoch to `offset_s` before `time_s`. Only the first
    /// call has any effect.
    pub(crate) fn restart_envelope(&mut self, time_s: f64, offset_s: f64) {
        if !self.envelope_restarted {
            self.envelope_epoch_s = time_s - offset_s;
            self.envelope_restarted = true;
            info!(
                "First target received, envelope epoch moved to {:.3} s",
                self.envelope_epoch_s
            );
        }
    }
}
