//! Forward kinematics and Jacobians

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

// Internal
use super::{ArmGeometry, ArmKinError, MIN_JACOBIAN_DET, SINGULARITY_WARN_Q2_RAD};
use comms_if::eqpt::arm::{ArmId, JointState, NUM_ACT_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic model of one arm, expressed in the arm 1 inertial frame.
#[derive(Debug, Clone, Copy)]
pub struct ArmKinematics {
    arm_id: ArmId,
    geom: ArmGeometry,
}

/// End effector state of one arm in the arm 1 inertial frame.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EeState {
    /// `[x, y, orientation]`
    ///
    /// Units: meters, meters, radians
    pub pose: Vector3<f64>,

    /// `[x_dot, y_dot, orientation_dot]`
    ///
    /// Units: meters/second, meters/second, radians/second
    pub vel: Vector3<f64>,
}

/// Everything the controller needs from one arm's kinematics on one cycle.
#[derive(Debug, Clone, Copy)]
pub struct ArmKinState {
    /// Actuated joint positions the state was evaluated at.
    pub q_rad: [f64; NUM_ACT_JOINTS],

    pub ee: EeState,

    /// Velocity Jacobian in the inertial frame.
    pub jacobian: Matrix3<f64>,

    /// Inverse of `jacobian`.
    pub jacobian_inv: Matrix3<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmKinematics {
    pub fn new(arm_id: ArmId, geom: ArmGeometry) -> Self {
        Self { arm_id, geom }
    }

    pub fn arm_id(&self) -> ArmId {
        self.arm_id
    }

    /// End effector pose in the arm's own base frame.
    pub fn local_pose(&self, q: &[f64; NUM_ACT_JOINTS]) -> Vector3<f64> {
        let g = &self.geom;
        let q1 = q[0];
        let q12 = q[0] + q[1];
        let q123 = q12 + q[2];

        Vector3::new(
            g.l1_x_m * q1.cos() - g.l1_y_m * q1.sin()
                + g.l2_m * q12.cos()
                + g.l3_m * q123.cos(),
            g.l1_x_m * q1.sin() + g.l1_y_m * q1.cos()
                + g.l2_m * q12.sin()
                + g.l3_m * q123.sin(),
            q123,
        )
    }

    /// End effector pose in the inertial frame.
    ///
    /// Arm 2 faces arm 1, so its local pose is mirrored about the y axis and
    /// shifted by the base offset.
    pub fn pose(&self, q: &[f64; NUM_ACT_JOINTS]) -> Vector3<f64> {
        let local = self.local_pose(q);

        match self.arm_id {
            ArmId::Arm1 => local,
            ArmId::Arm2 => Vector3::new(
                self.geom.arm_2_base_offset_x_m - local[0],
                local[1],
                -local[2],
            ),
        }
    }

    /// Velocity Jacobian mapping joint rates to the inertial end effector
    /// velocity.
    pub fn jacobian(&self, q: &[f64; NUM_ACT_JOINTS]) -> Matrix3<f64> {
        let g = &self.geom;
        let (s1, c1) = q[0].sin_cos();
        let (s12, c12) = (q[0] + q[1]).sin_cos();
        let (s123, c123) = (q[0] + q[1] + q[2]).sin_cos();

        let mut jac = Matrix3::new(
            -g.l1_x_m * s1 - g.l1_y_m * c1 - g.l2_m * s12 - g.l3_m * s123,
            -g.l2_m * s12 - g.l3_m * s123,
            -g.l3_m * s123,
            g.l1_x_m * c1 - g.l1_y_m * s1 + g.l2_m * c12 + g.l3_m * c123,
            g.l2_m * c12 + g.l3_m * c123,
            g.l3_m * c123,
            1.0,
            1.0,
            1.0,
        );

        // The mirror negates x and the orientation
        if self.arm_id == ArmId::Arm2 {
            for j in 0..NUM_ACT_JOINTS {
                jac[(0, j)] = -jac[(0, j)];
                jac[(2, j)] = -jac[(2, j)];
            }
        }

        jac
    }

    /// Invert the Jacobian, failing if it is ill-conditioned.
    pub fn jacobian_inv(
        &self,
        q: &[f64; NUM_ACT_JOINTS],
        jacobian: &Matrix3<f64>,
    ) -> Result<Matrix3<f64>, ArmKinError> {
        let det = jacobian.determinant();

        if !det.is_finite() || det.abs() < MIN_JACOBIAN_DET {
            return Err(ArmKinError::SingularJacobian(self.arm_id, det, *q));
        }

        jacobian
            .try_inverse()
            .ok_or(ArmKinError::SingularJacobian(self.arm_id, det, *q))
    }

    /// Evaluate the full kinematic state of the arm for the given joints.
    pub fn eval(&self, joints: &JointState) -> Result<ArmKinState, ArmKinError> {
        let q_rad = joints.act_poses_rad();
        let q_dot = Vector3::from(joints.act_vels_rads());

        let jacobian = self.jacobian(&q_rad);
        let jacobian_inv = self.jacobian_inv(&q_rad, &jacobian)?;

        Ok(ArmKinState {
            q_rad,
            ee: EeState {
                pose: self.pose(&q_rad),
                vel: jacobian * q_dot,
            },
            jacobian,
            jacobian_inv,
        })
    }
}

/// Returns true if the arm is close to the elbow singularity the driver
/// guards against.
pub fn near_singularity(q: &[f64; NUM_ACT_JOINTS]) -> bool {
    q[1] > SINGULARITY_WARN_Q2_RAD
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    const Q_CAL: [f64; 3] = [0.0, -1.2, 0.6];

    #[test]
    fn test_zero_pose() {
        let kin = ArmKinematics::new(ArmId::Arm1, ArmGeometry::default());
        let g = ArmGeometry::default();

        let pose = kin.pose(&[0.0, 0.0, 0.0]);

        assert_relative_eq!(pose[0], g.l1_x_m + g.l2_m + g.l3_m);
        assert_relative_eq!(pose[1], g.l1_y_m);
        assert_relative_eq!(pose[2], 0.0);
    }

    #[test]
    fn test_arm_2_mirrored() {
        let g = ArmGeometry::default();
        let kin_1 = ArmKinematics::new(ArmId::Arm1, g);
        let kin_2 = ArmKinematics::new(ArmId::Arm2, g);

        let p1 = kin_1.pose(&Q_CAL);
        let p2 = kin_2.pose(&Q_CAL);

        assert_relative_eq!(p2[0], g.arm_2_base_offset_x_m - p1[0]);
        assert_relative_eq!(p2[1], p1[1]);
        assert_relative_eq!(p2[2], -p1[2]);
    }

    /// The analytic Jacobian must agree with a finite difference of the
    /// forward kinematics, for both the plain and the mirrored arm.
    #[test]
    fn test_jacobian_matches_fk() {
        let h = 1e-7;

        for arm_id in ArmId::ALL.iter() {
            let kin = ArmKinematics::new(*arm_id, ArmGeometry::default());
            let jac = kin.jacobian(&Q_CAL);

            for j in 0..3 {
                let mut q_p = Q_CAL;
                let mut q_m = Q_CAL;
                q_p[j] += h;
                q_m[j] -= h;

                let col = (kin.pose(&q_p) - kin.pose(&q_m)) / (2.0 * h);

                for i in 0..3 {
                    assert_relative_eq!(jac[(i, j)], col[i], epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_jacobian_inverse() {
        let kin = ArmKinematics::new(ArmId::Arm2, ArmGeometry::default());
        let jac = kin.jacobian(&Q_CAL);
        let jac_inv = kin.jacobian_inv(&Q_CAL, &jac).unwrap();

        let v = Vector3::new(0.01, -0.02, 0.3);
        let round = jac * (jac_inv * v);

        assert_relative_eq!(round, v, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_jacobian_rejected() {
        // Without the first link the first two Jacobian columns coincide
        let geom = ArmGeometry {
            l1_x_m: 0.0,
            l1_y_m: 0.0,
            ..ArmGeometry::default()
        };
        let kin = ArmKinematics::new(ArmId::Arm1, geom);
        let q = [0.3, 0.0, 0.2];
        let jac = kin.jacobian(&q);

        match kin.jacobian_inv(&q, &jac) {
            Err(ArmKinError::SingularJacobian(ArmId::Arm1, _, q_err)) => {
                assert_eq!(q_err, q)
            }
            r => panic!("Expected a singular Jacobian, got {:?}", r),
        }
    }

    #[test]
    fn test_eval_velocity() {
        let kin = ArmKinematics::new(ArmId::Arm1, ArmGeometry::default());
        let joints = JointState {
            poses_rad: [0.0, Q_CAL[0], Q_CAL[1], Q_CAL[2], 0.0, 1.0],
            vels_rads: [0.0, 0.1, -0.2, 0.05, 0.0],
        };

        let state = kin.eval(&joints).unwrap();

        assert_eq!(state.q_rad, Q_CAL);
        assert_relative_eq!(
            state.ee.vel,
            kin.jacobian(&Q_CAL) * Vector3::new(0.1, -0.2, 0.05)
        );
    }

    #[test]
    fn test_near_singularity() {
        assert!(!near_singularity(&[0.0, -1.2, 0.0]));
        assert!(near_singularity(&[0.0, -0.5, 0.0]));
    }
}
