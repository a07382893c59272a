//! Parameters structure for CoopCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Internal
use crate::arm_kin::ArmGeometry;
use crate::ppc::{BarrierLimits, Envelope};
use comms_if::{eqpt::arm::ArmId, traj::TargetConfiguration};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Allowed deviation of `c1 + c2` from one.
pub const LOAD_SHARING_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for cooperative control.
///
/// Loaded once at init and never modified afterwards. Any field missing from
/// the parameter file takes its default value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- GEOMETRY ----

    pub geometry: ArmGeometry,

    pub grasp: GraspParams,

    // ---- CONTROL LAW ----

    pub load_sharing: LoadSharing,

    pub gains: Gains,

    /// Envelope on the object position error.
    pub pos_envelope: Envelope,

    /// Envelope on the object velocity error.
    pub vel_envelope: Envelope,

    pub barrier: BarrierParams,

    pub compensation: Compensation,

    /// Arm whose object estimate closes the loop. The other estimate is only
    /// reported.
    pub feedback_arm: ArmId,

    pub envelope_restart: EnvelopeRestart,

    // ---- OUTPUTS ----

    pub safety: SafetyParams,

    pub gripper_closed: PerArm<f64>,

    /// Target used until the first target configuration is received.
    pub initial_target: TargetConfiguration,
}

/// A value for each of the two arms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerArm<T> {
    pub arm_1: T,
    pub arm_2: T,
}

/// Position of the object relative to each end effector.
///
/// Frame: End effector
/// Units: meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraspParams {
    pub arm_1_offset_m_ee: [f64; 3],
    pub arm_2_offset_m_ee: [f64; 3],
}

/// Share of the cooperative effort taken by each arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSharing {
    pub c1: f64,
    pub c2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    /// Position loop gain.
    pub g_s: f64,

    /// Velocity loop gain.
    pub g_v: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrierParams {
    pub pos_limit: f64,
    pub pos_warn: f64,
    pub vel_limit: f64,
    pub vel_warn: f64,
}

/// Diagonals of the static friction and gravity feed-forward matrices.
///
/// Units: torque units
pub type Compensation = PerArm<[f64; 3]>;

/// Optional restart of the envelope clock when the first target arrives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeRestart {
    pub enabled: bool,

    /// The envelope epoch is placed this far before the arrival time.
    ///
    /// Units: seconds
    pub offset_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyParams {
    /// Largest accepted norm of either arm's torque vector.
    ///
    /// Units: torque units
    pub torque_ceiling: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            geometry: ArmGeometry::default(),
            grasp: GraspParams {
                arm_1_offset_m_ee: [-0.044, 0.0, 0.0],
                arm_2_offset_m_ee: [-0.044, 0.0, 0.0],
            },
            load_sharing: LoadSharing { c1: 0.5, c2: 0.5 },
            gains: Gains {
                g_s: 0.07,
                g_v: 14.0,
            },
            pos_envelope: Envelope::default_position(),
            vel_envelope: Envelope::default_velocity(),
            barrier: BarrierParams {
                pos_limit: BarrierLimits::POSITION.clamp,
                pos_warn: BarrierLimits::POSITION.warn,
                vel_limit: BarrierLimits::VELOCITY.clamp,
                vel_warn: BarrierLimits::VELOCITY.warn,
            },
            compensation: Compensation {
                arm_1: [0.4, 0.7, 0.2],
                arm_2: [0.3, 0.6, 0.15],
            },
            feedback_arm: ArmId::Arm1,
            envelope_restart: EnvelopeRestart {
                enabled: false,
                offset_s: 2.0,
            },
            safety: SafetyParams {
                torque_ceiling: 10.0,
            },
            gripper_closed: PerArm {
                arm_1: 1.0,
                arm_2: 1.0,
            },
            initial_target: TargetConfiguration {
                pos: [0.301, 0.11, 0.0],
                vel: [0.0; 3],
                acc: [0.0; 3],
            },
        }
    }
}

impl<T: Copy> PerArm<T> {
    pub fn get(&self, arm_id: ArmId) -> T {
        match arm_id {
            ArmId::Arm1 => self.arm_1,
            ArmId::Arm2 => self.arm_2,
        }
    }
}

impl Params {
    /// Check the parameters for values the control law cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        let ls = &self.load_sharing;
        if !(0.0..=1.0).contains(&ls.c1) || !(0.0..=1.0).contains(&ls.c2) {
            return Err(format!(
                "load sharing coefficients must be in [0, 1], got c1 = {}, c2 = {}",
                ls.c1, ls.c2
            ));
        }
        if (ls.c1 + ls.c2 - 1.0).abs() > LOAD_SHARING_TOLERANCE {
            return Err(format!(
                "load sharing coefficients must sum to 1, got c1 + c2 = {}",
                ls.c1 + ls.c2
            ));
        }

        self.pos_envelope
            .validate()
            .map_err(|e| format!("pos_envelope {}", e))?;
        self.vel_envelope
            .validate()
            .map_err(|e| format!("vel_envelope {}", e))?;

        self.pos_limits()
            .validate()
            .map_err(|e| format!("position barrier {}", e))?;
        self.vel_limits()
            .validate()
            .map_err(|e| format!("velocity barrier {}", e))?;

        if !(self.gains.g_s > 0.0 && self.gains.g_v > 0.0) {
            return Err(format!("gains must be positive, got {:?}", self.gains));
        }

        if !(self.safety.torque_ceiling > 0.0) {
            return Err(format!(
                "torque ceiling must be positive, got {}",
                self.safety.torque_ceiling
            ));
        }

        if self.envelope_restart.enabled && !(self.envelope_restart.offset_s >= 0.0) {
            return Err(format!(
                "envelope restart offset must not be negative, got {}",
                self.envelope_restart.offset_s
            ));
        }

        Ok(())
    }

    pub fn pos_limits(&self) -> BarrierLimits {
        BarrierLimits {
            clamp: self.barrier.pos_limit,
            warn: self.barrier.pos_warn,
        }
    }

    pub fn vel_limits(&self) -> BarrierLimits {
        BarrierLimits {
            clamp: self.barrier.vel_limit,
            warn: self.barrier.vel_warn,
        }
    }

    pub fn load_share(&self, arm_id: ArmId) -> f64 {
        match arm_id {
            ArmId::Arm1 => self.load_sharing.c1,
            ArmId::Arm2 => self.load_sharing.c2,
        }
    }

    pub fn grasp_offset_m_ee(&self, arm_id: ArmId) -> Vector3<f64> {
        match arm_id {
            ArmId::Arm1 => Vector3::from(self.grasp.arm_1_offset_m_ee),
            ArmId::Arm2 => Vector3::from(self.grasp.arm_2_offset_m_ee),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_load_sharing_sum() {
        let mut p = Params::default();
        p.load_sharing = LoadSharing { c1: 0.7, c2: 0.4 };
        assert!(p.validate().is_err());

        p.load_sharing = LoadSharing { c1: 0.7, c2: 0.3 };
        assert!(p.validate().is_ok());

        p.load_sharing = LoadSharing { c1: 1.2, c2: -0.2 };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_bad_ceiling_and_barrier() {
        let mut p = Params::default();
        p.safety.torque_ceiling = 0.0;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.barrier.pos_warn = 0.99995;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_partial_file() {
        let p: Params = util::params::load_str(
            r#"
            feedback_arm = "Arm2"

            [load_sharing]
            c1 = 0.6
            c2 = 0.4

            [gains]
            g_s = 0.1
            g_v = 10.0
            "#,
        )
        .unwrap();

        assert_eq!(p.feedback_arm, ArmId::Arm2);
        assert_eq!(p.load_share(ArmId::Arm1), 0.6);
        assert_eq!(p.gains.g_v, 10.0);
        assert_eq!(p.pos_envelope, Envelope::default_position());
        assert_eq!(p.safety.torque_ceiling, 10.0);
        assert!(p.validate().is_ok());
    }
}
