//! Full control cycle scenarios

use approx::assert_relative_eq;
use nalgebra::Vector3;

use comms_if::{
    eqpt::arm::{ArmId, JointState},
    traj::TargetConfiguration,
};
use coop_lib::{
    arm_kin::ArmKinematics,
    coop_ctrl::{CoopCtrl, InputData, LoopState, Params},
    coop_est,
    ppc::{barrier, BarrierLimits, Envelope},
};
use util::module::State;

/// Joint positions both arms rest at.
const REST_Q: [f64; 3] = [0.0, -1.2, 0.6];

fn at_rest() -> JointState {
    JointState {
        poses_rad: [0.0, REST_Q[0], REST_Q[1], REST_Q[2], 0.0, 1.0],
        vels_rads: [0.0; 5],
    }
}

/// Object pose estimated from arm 1 at rest.
fn rest_object_pose(params: &Params) -> Vector3<f64> {
    let kin = ArmKinematics::new(ArmId::Arm1, params.geometry)
        .eval(&at_rest())
        .unwrap();

    coop_est::estimate_object(
        ArmId::Arm1,
        &kin.ee,
        &params.grasp_offset_m_ee(ArmId::Arm1),
    )
    .pose
}

fn input(target_pos: Vector3<f64>) -> InputData {
    InputData {
        time_s: 0.0,
        arm_joints: [at_rest(), at_rest()],
        target: TargetConfiguration {
            pos: [target_pos[0], target_pos[1], target_pos[2]],
            vel: [0.0; 3],
            acc: [0.0; 3],
        },
        target_received: true,
        inputs_stale: false,
    }
}

fn started(params: Params) -> CoopCtrl {
    let mut ctrl = CoopCtrl::from_params(params).unwrap();
    ctrl.start(0.0).unwrap();
    assert_eq!(ctrl.loop_state(), LoopState::Running);
    ctrl
}

/// At rest on target every error is zero and the torques reduce to the
/// compensation term, which is zero for a zero desired direction.
#[test]
fn scenario_a_at_rest_on_target() {
    let params = Params::default();
    let target = rest_object_pose(&params);
    let mut ctrl = started(params);

    let (output, report) = ctrl.proc(&input(target)).unwrap();

    for k in 0..6 {
        assert_eq!(output.ctrl_signals.data[2 * k + 1], 0.0);
    }
    assert_eq!(report.xi_s, [0.0; 3]);
    assert_eq!(report.xi_v, [0.0; 3]);
    assert_eq!(report.u_o, [0.0; 3]);
    assert!(!report.numeric_instability);

    for dems in output.torque_dems.iter() {
        assert_eq!(dems.act_torques(), [0.0; 3]);
        assert_eq!(dems.torques[5], 1.0);
    }
}

#[test]
fn scenario_b_half_envelope() {
    let params = Params::default();
    let target = rest_object_pose(&params) - Vector3::new(0.05, 0.0, 0.0);
    let mut ctrl = started(params);

    let (output, report) = ctrl.proc(&input(target)).unwrap();

    assert_relative_eq!(output.ctrl_signals.data[6], 0.1, epsilon = 1e-12);
    assert_relative_eq!(report.xi_s[0], 0.5, epsilon = 1e-9);
    assert_relative_eq!(barrier::barrier(report.xi_s[0]), 3f64.ln(), epsilon = 1e-8);
    assert!(!report.numeric_instability);

    // Direct transform with the same numbers
    let out = barrier::transform(
        &Vector3::new(0.05, 0.0, 0.0),
        &Envelope::default_position().eval(0.0),
        &BarrierLimits::POSITION,
    );
    assert_relative_eq!(out.eps[0], 3f64.ln(), epsilon = 1e-12);
}

#[test]
fn scenario_c_saturated_error() {
    let out = barrier::transform(
        &Vector3::new(0.15, 0.0, 0.0),
        &Vector3::new(0.1, 0.1, 1.0),
        &BarrierLimits::POSITION,
    );

    assert_relative_eq!(out.xi[0], 1.5, epsilon = 1e-12);
    assert_relative_eq!(out.eps[0], barrier::barrier(0.9999));
    assert!(out.eps[0].is_finite() && out.eps[0] > 9.0);
    assert!(out.r[0].is_finite());
    assert!(out.warn);
}

#[test]
fn scenario_c_full_cycle_stays_finite() {
    let params = Params::default();
    let target = rest_object_pose(&params) - Vector3::new(0.15, 0.0, 0.0);
    let mut ctrl = started(params);

    let (output, report) = ctrl.proc(&input(target)).unwrap();

    assert!(report.numeric_instability);
    assert_relative_eq!(report.xi_s[0], 1.5, epsilon = 1e-9);
    for dems in output.torque_dems.iter() {
        assert!(dems.torques.iter().all(|t| t.is_finite()));
    }
}

/// The envelopes shrink with time since the loop started.
#[test]
fn envelope_follows_cycle_time() {
    let params = Params::default();
    let target = rest_object_pose(&params);
    let mut ctrl = started(params);

    let mut inp = input(target);
    let mut prev = std::f64::INFINITY;

    for i in 0..50 {
        inp.time_s = i as f64 * 0.5;
        let (output, _) = ctrl.proc(&inp).unwrap();

        let rho_s_x = output.ctrl_signals.data[6];
        assert!(rho_s_x < prev || i == 0);
        assert!(rho_s_x >= 0.02);
        prev = rho_s_x;
    }

    assert_eq!(ctrl.ctrl_state().num_cycles(), 50);
}
