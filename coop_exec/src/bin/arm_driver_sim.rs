//! # Arm Driver Stand-in
//!
//! Binds the driver side sockets of one arm so that `coop_exec` can be run without hardware. The
//! arm is held at a fixed joint configuration, received torque demands are logged once a second
//! and a security stop request is acknowledged before exiting.
//!
//! Usage: `arm_driver_sim <arm_1|arm_2>`

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{eyre::{eyre, WrapErr}, Report};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

use comms_if::{
    eqpt::arm::{ArmId, ArmSensData, SecurityStopRequest, SecurityStopResponse, TorqueDems},
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
};
use coop_lib::safety::torque_norm;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Publication period of the joint streams, roughly the real driver rate.
const PUB_PERIOD: Duration = Duration::from_millis(7);

/// Joint positions the arm is held at.
///
/// Units: radians
const HOLD_POSES_RAD: [f64; 6] = [0.0, 0.0, -1.2, 0.6, 0.0, 1.0];

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    let arm_id = match env::args().nth(1).as_deref() {
        Some("arm_1") => ArmId::Arm1,
        Some("arm_2") => ArmId::Arm2,
        _ => return Err(eyre!("Usage: arm_driver_sim <arm_1|arm_2>")),
    };

    let net_params: NetParams = util::params::load("net.toml")
        .wrap_err("Could not load net params")?;
    let endpoints = match arm_id {
        ArmId::Arm1 => &net_params.arm_1,
        ArmId::Arm2 => &net_params.arm_2,
    };

    let ctx = zmq::Context::new();
    let server = || SocketOptions {
        bind: true,
        block_on_first_connect: false,
        linger: 0,
        ..Default::default()
    };

    let poses_socket = MonitoredSocket::new(
        &ctx, zmq::PUB, server(), &endpoints.joint_poses_endpoint
    ).wrap_err("Could not bind the joint poses socket")?;
    let vels_socket = MonitoredSocket::new(
        &ctx, zmq::PUB, server(), &endpoints.joint_vels_endpoint
    ).wrap_err("Could not bind the joint vels socket")?;
    let torque_socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        SocketOptions {
            conflate: true,
            recv_timeout: 0,
            ..server()
        },
        &endpoints.torque_endpoint
    ).wrap_err("Could not bind the torque socket")?;
    let stop_socket = MonitoredSocket::new(
        &ctx,
        zmq::REP,
        SocketOptions {
            recv_timeout: 0,
            ..server()
        },
        &endpoints.security_stop_endpoint
    ).wrap_err("Could not bind the security stop socket")?;

    let poses_msg = serde_json::to_string(&ArmSensData::JointPoses(HOLD_POSES_RAD))?;
    let vels_msg = serde_json::to_string(&ArmSensData::JointVels([0.0; 5]))?;

    println!("{} driver stand-in running", arm_id);

    let mut last_report = Instant::now();

    loop {
        poses_socket.send(&poses_msg, 0)?;
        vels_socket.send(&vels_msg, 0)?;

        if let Ok(Ok(s)) = torque_socket.recv_string(0) {
            if last_report.elapsed() > Duration::from_secs(1) {
                match serde_json::from_str::<TorqueDems>(&s) {
                    Ok(d) => println!("torques: {:?} (norm {:.3})", d.torques, torque_norm(&d)),
                    Err(e) => println!("invalid torque demands: {}", e),
                }
                last_report = Instant::now();
            }
        }

        if let Ok(Ok(s)) = stop_socket.recv_string(0) {
            match serde_json::from_str::<SecurityStopRequest>(&s) {
                Ok(req) => println!("Security stop requested: {}", req.reason),
                Err(e) => println!("Malformed security stop request ({}), stopping anyway", e),
            }

            stop_socket.send(&serde_json::to_string(&SecurityStopResponse::Ack)?, 0)?;
            break
        }

        thread::sleep(PUB_PERIOD);
    }

    println!("{} driver stand-in stopped", arm_id);

    Ok(())
}
