//! # Arm Equipment Communications Module
//!
//! Messages exchanged with the arm servo drivers. Each driver publishes its joint positions and
//! velocities, subscribes to torque demands and serves a security stop request.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of slots in the joint position vector published by the driver.
pub const NUM_JOINT_POSES: usize = 6;

/// Number of slots in the joint velocity vector published by the driver.
pub const NUM_JOINT_VELS: usize = 5;

/// Number of slots in the torque demand vector accepted by the driver.
pub const NUM_TORQUE_SLOTS: usize = 6;

/// Number of actuated, control relevant joints.
pub const NUM_ACT_JOINTS: usize = 3;

/// Index of the first actuated joint in the pose, velocity and torque vectors. The actuated
/// joints occupy this index and the two following it.
pub const FIRST_ACT_JOINT: usize = 1;

/// Index of the gripper flag in the joint position and torque vectors.
pub const GRIPPER_SLOT: usize = 5;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Latest known joint state of one arm.
///
/// Holds only the most recent sample of each stream, no history is retained.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct JointState {
    /// Joint positions.
    ///
    /// Indices 1 to 3 are the actuated joints, index 5 is the gripper open (0) or closed (1)
    /// flag.
    ///
    /// Units: radians
    pub poses_rad: [f64; NUM_JOINT_POSES],

    /// Joint velocities, indices 1 to 3 are the actuated joints.
    ///
    /// Units: radians/second
    pub vels_rads: [f64; NUM_JOINT_VELS],
}

/// Torque demands sent to an arm driver.
///
/// Slot layout is `[unused, joint2, joint3, joint4, unused, gripper_flag]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct TorqueDems {
    pub torques: [f64; NUM_TORQUE_SLOTS],
}

/// Request sent to a driver asking it to stop immediately.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SecurityStopRequest {
    /// Human readable reason for the stop, logged by the driver.
    pub reason: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Identifies one of the two cooperating arms.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ArmId {
    Arm1,
    Arm2,
}

/// Sensor data published by an arm driver.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum ArmSensData {
    /// Joint positions in radians
    JointPoses([f64; NUM_JOINT_POSES]),

    /// Joint velocities in radians/second
    JointVels([f64; NUM_JOINT_VELS]),
}

/// Response from the driver to a security stop request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum SecurityStopResponse {
    /// The driver received the request and is shutting down.
    Ack,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmId {
    /// Both arms, in order.
    pub const ALL: [ArmId; 2] = [ArmId::Arm1, ArmId::Arm2];

    /// Zero based index of the arm.
    pub fn index(&self) -> usize {
        match self {
            ArmId::Arm1 => 0,
            ArmId::Arm2 => 1,
        }
    }
}

impl std::fmt::Display for ArmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArmId::Arm1 => write!(f, "arm_1"),
            ArmId::Arm2 => write!(f, "arm_2"),
        }
    }
}

impl JointState {
    /// Positions of the actuated joints.
    pub fn act_poses_rad(&self) -> [f64; NUM_ACT_JOINTS] {
        let mut q = [0f64; NUM_ACT_JOINTS];
        q.copy_from_slice(&self.poses_rad[FIRST_ACT_JOINT..FIRST_ACT_JOINT + NUM_ACT_JOINTS]);
        q
    }

    /// Velocities of the actuated joints.
    pub fn act_vels_rads(&self) -> [f64; NUM_ACT_JOINTS] {
        let mut q_dot = [0f64; NUM_ACT_JOINTS];
        q_dot.copy_from_slice(&self.vels_rads[FIRST_ACT_JOINT..FIRST_ACT_JOINT + NUM_ACT_JOINTS]);
        q_dot
    }
}

impl TorqueDems {
    /// Build the demands from the actuated joint torques and the gripper flag. All other slots
    /// are zero.
    pub fn from_act_torques(act_torques: [f64; NUM_ACT_JOINTS], gripper_flag: f64) -> Self {
        let mut torques = [0f64; NUM_TORQUE_SLOTS];
        torques[FIRST_ACT_JOINT..FIRST_ACT_JOINT + NUM_ACT_JOINTS].copy_from_slice(&act_torques);
        torques[GRIPPER_SLOT] = gripper_flag;

        Self { torques }
    }

    /// Torques of the actuated joints.
    pub fn act_torques(&self) -> [f64; NUM_ACT_JOINTS] {
        let mut tau = [0f64; NUM_ACT_JOINTS];
        tau.copy_from_slice(&self.torques[FIRST_ACT_JOINT..FIRST_ACT_JOINT + NUM_ACT_JOINTS]);
        tau
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_torque_dems_layout() {
        let dems = TorqueDems::from_act_torques([0.4, -0.7, 0.2], 1.0);

        assert_eq!(dems.torques, [0.0, 0.4, -0.7, 0.2, 0.0, 1.0]);
        assert_eq!(dems.act_torques(), [0.4, -0.7, 0.2]);
    }

    #[test]
    fn test_joint_state_act_joints() {
        let state = JointState {
            poses_rad: [0.0, 0.1, -0.9, 0.3, 0.0, 1.0],
            vels_rads: [0.0, 0.01, 0.02, 0.03, 0.0],
        };

        assert_eq!(state.act_poses_rad(), [0.1, -0.9, 0.3]);
        assert_eq!(state.act_vels_rads(), [0.01, 0.02, 0.03]);
    }

    #[test]
    fn test_sens_data_wire_format() {
        let msg = serde_json::to_string(&ArmSensData::JointVels([0.0, 1.0, 2.0, 3.0, 0.0]))
            .unwrap();

        assert_eq!(msg, r#"{"JointVels":[0.0,1.0,2.0,3.0,0.0]}"#);
    }
}
