//! # Arm Client
//!
//! Connects the controller to one arm driver. The driver publishes joint positions and velocities
//! on two streams, which a background thread copies into latest value cells. Torque demands are
//! published back and a security stop is a request/response exchange bounded by a timeout.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    thread::{self, JoinHandle}
};
use log::{error, warn};

use crate::{
    latest_value::LatestValue,
    safety::{ArmLink, ArmLinkError}
};
use comms_if::{
    eqpt::arm::{
        ArmId, ArmSensData, JointState, SecurityStopRequest, SecurityStopResponse, TorqueDems,
        NUM_JOINT_POSES, NUM_JOINT_VELS
    },
    net::{ArmEndpoints, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions, zmq}
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Poll timeout of the background thread, bounds how long it takes to notice a shutdown.
const BG_POLL_MS: i64 = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ArmClient {
    arm_id: ArmId,

    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,

    joint_poses: LatestValue<[f64; NUM_JOINT_POSES]>,
    joint_vels: LatestValue<[f64; NUM_JOINT_VELS]>,

    torque_socket: MonitoredSocket,
    stop_socket: MonitoredSocket,

    stop_timeout_ms: i32
}

/// Snapshot of an arm's sensor streams.
#[derive(Debug, Clone, Copy)]
pub struct ArmSnapshot {
    pub joints: JointState,

    /// Number of joint position messages received so far
    pub num_poses: u64,

    /// Number of joint velocity messages received so far
    pub num_vels: u64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ArmClientError {
    #[error("Socket error on the {0} {1} socket: {2}")]
    SocketError(ArmId, &'static str, MonitoredSocketError),

    #[error("Could not start the {0} background thread: {1}")]
    ThreadError(ArmId, std::io::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmClient {
    /// Connect to the driver of the given arm.
    ///
    /// Does not wait for the driver, until its first messages arrive the joint state is all zero.
    pub fn new(ctx: &zmq::Context, arm_id: ArmId, params: &NetParams) -> Result<Self, ArmClientError> {
        let endpoints: &ArmEndpoints = match arm_id {
            ArmId::Arm1 => &params.arm_1,
            ArmId::Arm2 => &params.arm_2
        };

        let sub_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: params.connect_timeout_ms,
            conflate: true,
            linger: 0,
            ..Default::default()
        };

        let poses_socket = MonitoredSocket::new(
            ctx, zmq::SUB, sub_options.clone(), &endpoints.joint_poses_endpoint
        ).map_err(|e| ArmClientError::SocketError(arm_id, "joint poses", e))?;

        let vels_socket = MonitoredSocket::new(
            ctx, zmq::SUB, sub_options, &endpoints.joint_vels_endpoint
        ).map_err(|e| ArmClientError::SocketError(arm_id, "joint vels", e))?;

        let torque_socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            SocketOptions {
                block_on_first_connect: false,
                connect_timeout: params.connect_timeout_ms,
                linger: 0,
                send_timeout: 0,
                ..Default::default()
            },
            &endpoints.torque_endpoint
        ).map_err(|e| ArmClientError::SocketError(arm_id, "torque", e))?;

        // Relaxed and correlated so that a timed out request doesn't wedge the socket
        let stop_socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            SocketOptions {
                block_on_first_connect: false,
                connect_timeout: params.connect_timeout_ms,
                req_correlate: true,
                req_relaxed: true,
                linger: 0,
                recv_timeout: params.security_stop_timeout_ms,
                send_timeout: params.security_stop_timeout_ms,
                ..Default::default()
            },
            &endpoints.security_stop_endpoint
        ).map_err(|e| ArmClientError::SocketError(arm_id, "security stop", e))?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let joint_poses = LatestValue::new([0f64; NUM_JOINT_POSES]);
        let joint_vels = LatestValue::new([0f64; NUM_JOINT_VELS]);

        let bg_run_clone = bg_run.clone();
        let joint_poses_clone = joint_poses.clone();
        let joint_vels_clone = joint_vels.clone();

        let bg_jh = thread::Builder::new()
            .name(format!("{}_client", arm_id))
            .spawn(move || bg_thread(
                arm_id,
                poses_socket,
                vels_socket,
                bg_run_clone,
                joint_poses_clone,
                joint_vels_clone
            ))
            .map_err(|e| ArmClientError::ThreadError(arm_id, e))?;

        Ok(Self {
            arm_id,
            bg_jh: Some(bg_jh),
            bg_run,
            joint_poses,
            joint_vels,
            torque_socket,
            stop_socket,
            stop_timeout_ms: params.security_stop_timeout_ms
        })
    }

    /// Copy out the latest joint state.
    pub fn snapshot(&self) -> ArmSnapshot {
        let poses = self.joint_poses.get();
        let vels = self.joint_vels.get();

        ArmSnapshot {
            joints: JointState {
                poses_rad: poses.value,
                vels_rads: vels.value
            },
            num_poses: poses.num_updates,
            num_vels: vels.num_updates
        }
    }
}

impl ArmLink for ArmClient {
    fn arm_id(&self) -> ArmId {
        self.arm_id
    }

    fn send_torques(&mut self, dems: &TorqueDems) -> Result<(), ArmLinkError> {
        let msg = serde_json::to_string(dems)
            .map_err(|e| ArmLinkError::SendFailed(self.arm_id, e.to_string()))?;

        self.torque_socket.send(&msg, 0)
            .map_err(|e| ArmLinkError::SendFailed(self.arm_id, e.to_string()))
    }

    fn security_stop(&mut self, reason: &str) -> Result<(), ArmLinkError> {
        let stop_err = |msg: String| ArmLinkError::StopFailed(self.arm_id, msg);

        let req = serde_json::to_string(&SecurityStopRequest { reason: reason.into() })
            .map_err(|e| stop_err(e.to_string()))?;

        self.stop_socket.send(&req, 0)
            .map_err(|e| stop_err(format!("could not send the request: {}", e)))?;

        let rep = match self.stop_socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(stop_err("non UTF-8 response".into())),
            Err(zmq::Error::EAGAIN) => return Err(stop_err(
                format!("no response within {} ms", self.stop_timeout_ms)
            )),
            Err(e) => return Err(stop_err(format!("could not receive the response: {}", e)))
        };

        match serde_json::from_str(&rep) {
            Ok(SecurityStopResponse::Ack) => Ok(()),
            Err(e) => Err(stop_err(format!("invalid response: {}", e)))
        }
    }
}

impl Drop for ArmClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            jh.join().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, copies each message from the driver into the matching cell.
fn bg_thread(
    arm_id: ArmId,
    poses_socket: MonitoredSocket,
    vels_socket: MonitoredSocket,
    run: Arc<AtomicBool>,
    joint_poses: LatestValue<[f64; NUM_JOINT_POSES]>,
    joint_vels: LatestValue<[f64; NUM_JOINT_VELS]>
) {
    while run.load(Ordering::Relaxed) {
        let mut items = [
            poses_socket.as_poll_item(zmq::POLLIN),
            vels_socket.as_poll_item(zmq::POLLIN)
        ];

        match zmq::poll(&mut items, BG_POLL_MS) {
            Ok(0) => continue,
            Ok(_) => (),
            Err(e) => {
                error!("Error polling the {} driver sockets: {}", arm_id, e);
                break
            }
        }

        let readable = [items[0].is_readable(), items[1].is_readable()];

        for (socket, ready) in [&poses_socket, &vels_socket].iter().zip(readable.iter()) {
            if !ready {
                continue
            }

            match recv_sens_data(arm_id, socket) {
                Some(ArmSensData::JointPoses(p)) => joint_poses.set(p),
                Some(ArmSensData::JointVels(v)) => joint_vels.set(v),
                None => ()
            }
        }
    }
}

/// Receive one sensor message without blocking.
fn recv_sens_data(arm_id: ArmId, socket: &MonitoredSocket) -> Option<ArmSensData> {
    let msg = match socket.recv_string(zmq::DONTWAIT) {
        Ok(Ok(s)) => s,
        Ok(Err(_)) => {
            warn!("Non UTF-8 message from the {} driver", arm_id);
            return None
        },
        Err(zmq::Error::EAGAIN) => return None,
        Err(e) => {
            warn!("Error receiving from the {} driver: {}", arm_id, e);
            return None
        }
    };

    match serde_json::from_str(&msg) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!("Error deserialising message from the {} driver: {}", arm_id, e);
            None
        }
    }
}
