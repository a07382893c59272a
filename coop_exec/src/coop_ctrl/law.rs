//! The cooperative prescribed performance control law
//!
//! One call of `cycle` runs the whole pipeline for one control period:
//!
//! 1. Forward kinematics and Jacobians of both arms.
//! 2. Object state estimation from each arm.
//! 3. Position loop: `e_s` through the position envelope and barrier gives
//!    the desired object velocity `v_des = -g_s rho_s^-1 R_s eps_s`.
//! 4. Velocity loop: `e_v = v_obj - v_des` gives the object input
//!    `u_o = rho_v^-1 R_v eps_v`.
//! 5. Allocation `u_arm = -c_arm g_v J_grasp^T u_o` and torque mapping
//!    `tau = J_arm^T u_arm + K_arm sign(q_dot_dir)`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use nalgebra::Vector3;

// Internal
use super::{
    state::matrix_rows, CoopCtrlError, CtrlState, InputData, LoopState, OutputData, Params,
    StatusReport,
};
use crate::{
    arm_kin::{self, ArmKinematics},
    coop_est,
    ppc::barrier,
};
use comms_if::{eqpt::arm::{ArmId, TorqueDems}, tm::ControlSignals};
use util::maths::sign_vec3;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute one control cycle.
///
/// Fails without touching the outputs if the loop is not running or either
/// arm Jacobian cannot be inverted.
pub fn cycle(
    params: &Params,
    state: &mut CtrlState,
    input: &InputData,
) -> Result<(OutputData, StatusReport), CoopCtrlError> {
    match state.loop_state() {
        LoopState::Running => (),
        LoopState::Initialising => return Err(CoopCtrlError::NotStarted),
        LoopState::ShutDown => return Err(CoopCtrlError::ShutDown),
    }

    let mut report = StatusReport {
        inputs_stale: input.inputs_stale,
        ..Default::default()
    };

    // ---- KINEMATICS ----

    let kin = [
        ArmKinematics::new(ArmId::Arm1, params.geometry).eval(&input.arm_joints[0])?,
        ArmKinematics::new(ArmId::Arm2, params.geometry).eval(&input.arm_joints[1])?,
    ];

    for arm_id in ArmId::ALL.iter() {
        let i = arm_id.index();
        let near = arm_kin::near_singularity(&kin[i].q_rad);

        if near && !state.near_singularity[i] {
            warn!(
                "{} is approaching the elbow singularity (q = {:?})",
                arm_id, kin[i].q_rad
            );
        }

        state.near_singularity[i] = near;
        report.near_singularity[i] = near;
        report.q_rad[i] = kin[i].q_rad;
        report.arm_jacobians[i] = matrix_rows(&kin[i].jacobian);
    }

    // ---- ESTIMATION ----

    let est = [
        coop_est::estimate_object(
            ArmId::Arm1,
            &kin[0].ee,
            &params.grasp_offset_m_ee(ArmId::Arm1),
        ),
        coop_est::estimate_object(
            ArmId::Arm2,
            &kin[1].ee,
            &params.grasp_offset_m_ee(ArmId::Arm2),
        ),
    ];
    let fb = &est[params.feedback_arm.index()];

    for i in 0..2 {
        report.obj_pose[i] = to_array(&est[i].pose);
        report.obj_vel[i] = to_array(&est[i].vel);
    }
    report.est_disagreement_m =
        (est[0].pose[0] - est[1].pose[0]).hypot(est[0].pose[1] - est[1].pose[1]);

    // ---- ENVELOPES ----

    if params.envelope_restart.enabled && input.target_received {
        state.restart_envelope(input.time_s, params.envelope_restart.offset_s);
    }

    let t_s = state.envelope_time_s(input.time_s);
    let rho_s = params.pos_envelope.eval(t_s);
    let rho_v = params.vel_envelope.eval(t_s);
    report.envelope_time_s = t_s;

    // ---- POSITION LOOP ----

    let e_s = fb.pose - Vector3::from(input.target.pos);
    let pos_bar = barrier::transform(&e_s, &rho_s, &params.pos_limits());
    let v_des = -params.gains.g_s * pos_bar.scaled(&rho_s);

    // Desired joint direction of each arm, only its sign is used
    let q_dot_dir = [
        kin[0].jacobian_inv * (est[0].grasp_jacobian_inv * -e_s),
        kin[1].jacobian_inv * (est[1].grasp_jacobian_inv * -e_s),
    ];

    // ---- VELOCITY LOOP ----

    let e_v = fb.vel - v_des;
    let vel_bar = barrier::transform(&e_v, &rho_v, &params.vel_limits());
    let u_o = vel_bar.scaled(&rho_v);

    report.xi_s = to_array(&pos_bar.xi);
    report.xi_v = to_array(&vel_bar.xi);
    report.v_des = to_array(&v_des);
    report.u_o = to_array(&u_o);

    if pos_bar.warn || vel_bar.warn {
        report.numeric_instability = true;
        warn!(
            "Normalised error at the barrier limit:\n    \
            xi_s: {:?}\n    xi_v: {:?}\n    \
            e_s: {:?}\n    e_v: {:?}\n    \
            rho_s: {:?}\n    rho_v: {:?}\n    v_des: {:?}",
            report.xi_s,
            report.xi_v,
            to_array(&e_s),
            to_array(&e_v),
            to_array(&rho_s),
            to_array(&rho_v),
            report.v_des
        );
    }

    // ---- ALLOCATION AND TORQUES ----

    let mut torque_dems = [TorqueDems::default(); 2];

    for arm_id in ArmId::ALL.iter() {
        let i = arm_id.index();

        let u_arm = -params.load_share(*arm_id)
            * params.gains.g_v
            * (est[i].grasp_jacobian.transpose() * u_o);

        let comp = Vector3::from(params.compensation.get(*arm_id));
        let tau = kin[i].jacobian.transpose() * u_arm
            + comp.component_mul(&sign_vec3(&q_dot_dir[i]));

        report.u_arm[i] = to_array(&u_arm);
        report.torques[i] = to_array(&tau);
        report.torque_norms[i] = tau.norm();

        torque_dems[i] =
            TorqueDems::from_act_torques(to_array(&tau), params.gripper_closed.get(*arm_id));
    }

    trace!(
        "CoopCtrl torques:\n    arm_1: {:?}\n    arm_2: {:?}",
        report.torques[0],
        report.torques[1]
    );

    state.num_cycles += 1;

    let output = OutputData {
        torque_dems,
        ctrl_signals: ControlSignals::new(
            t_s,
            to_array(&rho_v),
            to_array(&e_v),
            to_array(&rho_s),
            to_array(&e_s),
        ),
    };

    Ok((output, report))
}

fn to_array(v: &Vector3<f64>) -> [f64; 3] {
    [v[0], v[1], v[2]]
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use comms_if::{eqpt::arm::JointState, traj::TargetConfiguration};

    fn joints(q: [f64; 3], q_dot: [f64; 3]) -> JointState {
        JointState {
            poses_rad: [0.0, q[0], q[1], q[2], 0.0, 1.0],
            vels_rads: [0.0, q_dot[0], q_dot[1], q_dot[2], 0.0],
        }
    }

    fn input(target: [f64; 3]) -> InputData {
        InputData {
            time_s: 0.0,
            arm_joints: [
                joints([0.2, -1.3, 0.9], [0.0; 3]),
                joints([0.2, -1.3, 0.9], [0.0; 3]),
            ],
            target: TargetConfiguration {
                pos: target,
                vel: [0.0; 3],
                acc: [0.0; 3],
            },
            target_received: true,
            inputs_stale: false,
        }
    }

    fn running() -> CtrlState {
        let mut s = CtrlState::default();
        s.start(0.0).unwrap();
        s
    }

    #[test]
    fn test_not_running() {
        let params = Params::default();
        let mut state = CtrlState::default();

        assert!(matches!(
            cycle(&params, &mut state, &input([0.3, 0.1, 0.0])),
            Err(CoopCtrlError::NotStarted)
        ));

        state.shut_down();
        assert!(matches!(
            cycle(&params, &mut state, &input([0.3, 0.1, 0.0])),
            Err(CoopCtrlError::ShutDown)
        ));
    }

    #[test]
    fn test_signals_layout() {
        let params = Params::default();
        let mut state = running();

        let (out, report) = cycle(&params, &mut state, &input([0.3, 0.1, 0.0])).unwrap();
        let e_s_x = report.obj_pose[0][0] - 0.3;

        assert_relative_eq!(out.ctrl_signals.data[6], 0.1, epsilon = 1e-12);
        assert_relative_eq!(out.ctrl_signals.data[7], e_s_x);
        assert_relative_eq!(out.ctrl_signals.data[0], 30.0, epsilon = 1e-12);
        assert_eq!(state.num_cycles(), 1);
    }

    #[test]
    fn test_gripper_and_unused_slots() {
        let mut params = Params::default();
        params.gripper_closed.arm_2 = 0.0;
        let mut state = running();

        let (out, _) = cycle(&params, &mut state, &input([0.3, 0.1, 0.0])).unwrap();

        for dems in out.torque_dems.iter() {
            assert_eq!(dems.torques[0], 0.0);
            assert_eq!(dems.torques[4], 0.0);
        }
        assert_eq!(out.torque_dems[0].torques[5], 1.0);
        assert_eq!(out.torque_dems[1].torques[5], 0.0);
    }

    /// With identical grasp Jacobians the allocated inputs are in the ratio
    /// of the load sharing coefficients.
    #[test]
    fn test_load_sharing_symmetry() {
        let mut params = Params::default();
        params.load_sharing.c1 = 0.3;
        params.load_sharing.c2 = 0.7;
        // Zero grasp offsets give both arms the identity grasp Jacobian
        params.grasp.arm_1_offset_m_ee = [0.0; 3];
        params.grasp.arm_2_offset_m_ee = [0.0; 3];
        let mut state = running();

        let (_, report) = cycle(&params, &mut state, &input([0.3, 0.1, 0.2])).unwrap();

        for k in 0..3 {
            assert_relative_eq!(
                report.u_arm[0][k] / 0.3,
                report.u_arm[1][k] / 0.7,
                epsilon = 1e-9
            );
        }
        assert!(report.u_o.iter().any(|v| v.abs() > 0.0));
    }

    #[test]
    fn test_feedback_arm_selection() {
        let mut params = Params::default();
        params.feedback_arm = ArmId::Arm2;
        let mut state = running();

        let (out, report) = cycle(&params, &mut state, &input([0.3, 0.1, 0.0])).unwrap();

        assert_relative_eq!(out.ctrl_signals.data[7], report.obj_pose[1][0] - 0.3);
        assert_relative_eq!(
            report.est_disagreement_m,
            (report.obj_pose[0][0] - report.obj_pose[1][0])
                .hypot(report.obj_pose[0][1] - report.obj_pose[1][1])
        );
    }

    #[test]
    fn test_envelope_restart() {
        let mut params = Params::default();
        params.envelope_restart.enabled = true;
        let mut state = running();

        let mut inp = input([0.3, 0.1, 0.0]);
        inp.time_s = 7.0;
        let (out, _) = cycle(&params, &mut state, &inp).unwrap();

        assert_relative_eq!(out.ctrl_signals.time_s, 2.0);

        // Without a target the clock keeps running from the loop start
        let mut params = Params::default();
        params.envelope_restart.enabled = true;
        let mut state = running();
        inp.target_received = false;
        let (out, _) = cycle(&params, &mut state, &inp).unwrap();

        assert_relative_eq!(out.ctrl_signals.time_s, 7.0);
    }

    #[test]
    fn test_singular_arm_rejected() {
        let mut params = Params::default();
        params.geometry.l1_x_m = 0.0;
        params.geometry.l1_y_m = 0.0;
        let mut state = running();

        assert!(matches!(
            cycle(&params, &mut state, &input([0.3, 0.1, 0.0])),
            Err(CoopCtrlError::Kinematics(_))
        ));
        assert_eq!(state.num_cycles(), 0);
    }
}
