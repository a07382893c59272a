//! # Cooperative Control Cycle Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::{eqpt::arm::JointState, traj::TargetConfiguration};
use coop_lib::coop_ctrl::{law, CtrlState, InputData, Params};

fn coop_ctrl_cycle_benchmark(c: &mut Criterion) {
    let params = Params::default();
    let joints = JointState {
        poses_rad: [0.0, 0.1, -1.2, 0.6, 0.0, 1.0],
        vels_rads: [0.0, 0.02, -0.01, 0.03, 0.0],
    };
    let input = InputData {
        time_s: 1.5,
        arm_joints: [joints, joints],
        target: TargetConfiguration {
            pos: [0.32, 0.12, 0.05],
            vel: [0.0; 3],
            acc: [0.0; 3],
        },
        target_received: true,
        inputs_stale: false,
    };

    let mut state = CtrlState::default();
    state.start(0.0).unwrap();

    c.bench_function("coop_ctrl_cycle", |b| {
        b.iter(|| law::cycle(black_box(&params), &mut state, black_box(&input)).unwrap())
    });
}

criterion_group!(benches, coop_ctrl_cycle_benchmark);
criterion_main!(benches);
