//! # Safety supervisor
//!
//! Checks every torque command against the hardware ceiling before it is
//! published. A violation suppresses the command, requests a security stop of
//! both arms and shuts the control loop down for good.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, warn};

// Internal
use crate::coop_ctrl::{CtrlState, LoopState, OutputData, StatusReport};
use comms_if::eqpt::arm::{ArmId, TorqueDems};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Command side of the link to one arm driver.
pub trait ArmLink {
    fn arm_id(&self) -> ArmId;

    /// Publish torque demands to the driver.
    fn send_torques(&mut self, dems: &TorqueDems) -> Result<(), ArmLinkError>;

    /// Ask the driver to stop immediately. Must return within a bounded time.
    fn security_stop(&mut self, reason: &str) -> Result<(), ArmLinkError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Torque ceiling supervisor.
#[derive(Debug, Clone, Copy)]
pub struct SafetySupervisor {
    torque_ceiling: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Outcome of supervising one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
    /// The demands were within the ceiling and have been published.
    Published,

    /// Nothing was published and the loop is shut down.
    ShutDown,
}

#[derive(Debug, thiserror::Error)]
pub enum ArmLinkError {
    #[error("Could not send torque demands to {0}: {1}")]
    SendFailed(ArmId, String),

    #[error("Security stop of {0} failed: {1}")]
    StopFailed(ArmId, String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SafetySupervisor {
    pub fn new(torque_ceiling: f64) -> Self {
        Self { torque_ceiling }
    }

    /// Find the first arm whose actuated torque norm exceeds the ceiling.
    ///
    /// A norm that is not a number counts as a violation.
    pub fn check(&self, torque_dems: &[TorqueDems; 2]) -> Option<(ArmId, f64)> {
        ArmId::ALL.iter().find_map(|arm_id| {
            let norm = torque_norm(&torque_dems[arm_id.index()]);

            if norm <= self.torque_ceiling {
                None
            }
            else {
                Some((*arm_id, norm))
            }
        })
    }

    /// Publish the cycle's demands if they are safe, otherwise stop both arms
    /// and shut the loop down.
    pub fn supervise<A: ArmLink>(
        &self,
        output: &OutputData,
        report: &StatusReport,
        state: &mut CtrlState,
        arms: &mut [A],
    ) -> SafetyVerdict {
        if state.loop_state() == LoopState::ShutDown {
            return SafetyVerdict::ShutDown;
        }

        if let Some((arm_id, norm)) = self.check(&output.torque_dems) {
            error!(
                "Torque norm of {} is {:.3}, above the ceiling of {:.3}. Shutting down.\n    \
                torques: {:?}\n    norms: {:?}\n    u_arm: {:?}\n    \
                jacobians: {:?}\n    q: {:?}",
                arm_id,
                norm,
                self.torque_ceiling,
                report.torques,
                report.torque_norms,
                report.u_arm,
                report.arm_jacobians,
                report.q_rad
            );

            state.shut_down();
            stop_all(
                arms,
                &format!("torque norm of {} above ceiling ({:.3})", arm_id, norm),
            );

            return SafetyVerdict::ShutDown;
        }

        for arm in arms.iter_mut() {
            if let Err(e) = arm.send_torques(&output.torque_dems[arm.arm_id().index()]) {
                warn!("{}", e);
            }
        }

        SafetyVerdict::Published
    }
}

/// Request a security stop of every arm. A failure on one arm is logged and
/// does not prevent the request to the others.
pub fn stop_all<A: ArmLink>(arms: &mut [A], reason: &str) {
    for arm in arms.iter_mut() {
        match arm.security_stop(reason) {
            Ok(()) => warn!("{} acknowledged the security stop", arm.arm_id()),
            Err(e) => warn!("{}", e),
        }
    }
}

/// Norm of the actuated joint torques, excluding the gripper slot.
pub fn torque_norm(dems: &TorqueDems) -> f64 {
    dems.act_torques().iter().map(|t| t * t).sum::<f64>().sqrt()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
