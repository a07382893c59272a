//! Cooperative object state estimation
//!
//! Each arm holds the object rigidly at a known offset, so the object pose
//! and velocity can be recovered from either end effector. The grasp
//! Jacobian maps end effector velocity to object velocity.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

// Internal
use crate::arm_kin::EeState;
use comms_if::eqpt::arm::ArmId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Estimate of the object state obtained from one arm.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ObjectEstimate {
    /// `[x, y, orientation]` in the inertial frame.
    ///
    /// Units: meters, meters, radians
    pub pose: Vector3<f64>,

    /// Object velocity in the inertial frame.
    ///
    /// Units: meters/second, meters/second, radians/second
    pub vel: Vector3<f64>,

    /// Maps this arm's end effector velocity to the object velocity.
    pub grasp_jacobian: Matrix3<f64>,

    /// Inverse of `grasp_jacobian`.
    pub grasp_jacobian_inv: Matrix3<f64>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Rotation of the end effector frame of the given arm into the inertial
/// frame.
///
/// Arm 2 is flipped about its y axis relative to arm 1, which is applied on
/// top of the rotation about z.
pub fn ee_rotation(arm_id: ArmId, theta_rad: f64) -> Matrix3<f64> {
    let (s, c) = theta_rad.sin_cos();
    let rot_z = Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);

    match arm_id {
        ArmId::Arm1 => rot_z,
        ArmId::Arm2 => rot_z * Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, -1.0)),
    }
}

/// Grasp Jacobian for the given lever arm from the object to the end
/// effector.
pub fn grasp_jacobian(lever_m: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        1.0, 0.0, lever_m[1],
        0.0, 1.0, -lever_m[0],
        0.0, 0.0, 1.0,
    )
}

/// Inverse of the grasp Jacobian. Its determinant is always one so the
/// inverse exists for any lever arm.
pub fn grasp_jacobian_inv(lever_m: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        1.0, 0.0, -lever_m[1],
        0.0, 1.0, lever_m[0],
        0.0, 0.0, 1.0,
    )
}

/// Estimate the object state from one arm's end effector state.
///
/// `grasp_offset_m_ee` is the position of the object relative to the end
/// effector, expressed in the end effector frame.
pub fn estimate_object(
    arm_id: ArmId,
    ee: &EeState,
    grasp_offset_m_ee: &Vector3<f64>,
) -> ObjectEstimate {
    let rot = ee_rotation(arm_id, ee.pose[2]);
    let ee_pos = Vector3::new(ee.pose[0], ee.pose[1], 0.0);

    // The object shares the end effector orientation
    let mut pose = ee_pos - rot * grasp_offset_m_ee;
    pose[2] = ee.pose[2];

    let lever_m = Vector3::new(ee.pose[0] - pose[0], ee.pose[1] - pose[1], 0.0);
    let grasp_jacobian = grasp_jacobian(&lever_m);

    ObjectEstimate {
        pose,
        vel: grasp_jacobian * ee.vel,
        grasp_jacobian,
        grasp_jacobian_inv: grasp_jacobian_inv(&lever_m),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
