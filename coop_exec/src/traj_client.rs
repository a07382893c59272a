//! # Trajectory Client
//!
//! Subscribes to the target configuration published by the trajectory source. Until the first
//! target arrives the configured initial target is reported.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    thread::{self, JoinHandle}
};
use log::{error, warn};

use crate::latest_value::{LatestValue, Sample};
use comms_if::{
    net::{MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions, zmq},
    traj::TargetConfiguration
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout of the background thread, bounds how long it takes to notice a shutdown.
const BG_RECV_TIMEOUT_MS: i32 = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct TrajClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    target: LatestValue<TargetConfiguration>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrajClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not start the background thread: {0}")]
    ThreadError(std::io::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrajClient {
    /// Subscribe to the trajectory source. Does not wait for the source to come up.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        initial_target: TargetConfiguration
    ) -> Result<Self, TrajClientError> {
        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            SocketOptions {
                block_on_first_connect: false,
                connect_timeout: params.connect_timeout_ms,
                conflate: true,
                linger: 0,
                recv_timeout: BG_RECV_TIMEOUT_MS,
                ..Default::default()
            },
            &params.target_endpoint
        ).map_err(TrajClientError::SocketError)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let target = LatestValue::new(initial_target);

        let bg_run_clone = bg_run.clone();
        let target_clone = target.clone();

        let bg_jh = thread::Builder::new()
            .name("traj_client".into())
            .spawn(move || bg_thread(socket, bg_run_clone, target_clone))
            .map_err(TrajClientError::ThreadError)?;

        Ok(Self {
            bg_jh: Some(bg_jh),
            bg_run,
            target
        })
    }

    /// Latest target configuration.
    pub fn target(&self) -> Sample<TargetConfiguration> {
        self.target.get()
    }
}

impl Drop for TrajClient {
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

/// Background thread, replaces the held target whenever the source publishes a new one.
fn bg_thread(
    socket: MonitoredSocket,
    run: Arc<AtomicBool>,
    target: LatestValue<TargetConfiguration>
) {
    while run.load(Ordering::Relaxed) {
        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message from the trajectory source");
                continue
            },
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving from the trajectory source: {}", e);
                break
            }
        };

        match serde_json::from_str(&msg) {
            Ok(t) => target.set(t),
            Err(e) => warn!("Error deserialising the target configuration: {}", e)
        }
    }
}
