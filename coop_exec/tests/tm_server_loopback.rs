//! TmServer publishing to a monitor over tcp

use std::time::{Duration, Instant};

use comms_if::{
    net::{zmq, ArmEndpoints, NetParams},
    tm::ControlSignals,
};
use coop_lib::tm_server::TmServer;

fn net_params(signals_endpoint: &str) -> NetParams {
    let arm = |n: u8| ArmEndpoints {
        joint_poses_endpoint: format!("inproc://tm_arm_{}_poses", n),
        joint_vels_endpoint: format!("inproc://tm_arm_{}_vels", n),
        torque_endpoint: format!("inproc://tm_arm_{}_torque", n),
        security_stop_endpoint: format!("inproc://tm_arm_{}_stop", n),
    };

    NetParams {
        arm_1: arm(1),
        arm_2: arm(2),
        target_endpoint: "inproc://tm_target".into(),
        ctrl_signals_endpoint: signals_endpoint.into(),
        security_stop_timeout_ms: 500,
        connect_timeout_ms: 100,
    }
}

#[test]
fn control_signals_reach_a_monitor() {
    let ctx = zmq::Context::new();
    let params = net_params("tcp://127.0.0.1:15391");

    let mut server = TmServer::new(&ctx, &params).unwrap();

    let monitor = ctx.socket(zmq::SUB).unwrap();
    monitor.set_subscribe(b"").unwrap();
    monitor.set_rcvtimeo(20).unwrap();
    monitor.set_linger(0).unwrap();
    monitor.connect(&params.ctrl_signals_endpoint).unwrap();

    let signals = ControlSignals::new(
        1.5,
        [30.0, 30.0, 50.0],
        [0.1, -0.2, 0.3],
        [0.1, 0.1, 1.0],
        [0.01, -0.02, 0.03],
    );

    // Publish every cycle until the subscription has propagated
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        assert!(server.send(&signals).unwrap());

        if let Ok(Ok(s)) = monitor.recv_string(0) {
            assert_eq!(serde_json::from_str::<ControlSignals>(&s).unwrap(), signals);
            break
        }

        assert!(Instant::now() < deadline, "control signals never arrived");
    }

    assert!(server.num_sent() > 0);
}
