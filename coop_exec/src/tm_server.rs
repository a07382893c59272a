//! # TM Server
//!
//! Publishes the control signals of every cycle for external monitoring. The
//! stream is best effort, a cycle's signals are lost if no monitor is
//! subscribed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions, zmq},
    tm::ControlSignals
};
use log::info;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct TmServer {
    socket: MonitoredSocket,

    /// Monitor connection state seen on the previous send, used to log transitions
    monitor_connected: bool,

    num_sent: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmServerError {
    #[error("Cannot bind the control signals socket: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the control signals: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the control signals: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmServer {
    /// Bind the control signals endpoint. Does not wait for a monitor.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TmServerError> {
        let socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            SocketOptions {
                bind: true,
                block_on_first_connect: false,
                linger: 0,
                send_timeout: 0,
                ..Default::default()
            },
            &params.ctrl_signals_endpoint
        ).map_err(TmServerError::SocketError)?;

        Ok(Self {
            socket,
            monitor_connected: false,
            num_sent: 0,
        })
    }

    /// Publish one cycle's control signals.
    ///
    /// PUB drops the message itself when no monitor is subscribed, so every
    /// cycle is sent. Returns `Ok(false)` if the send would have blocked.
    pub fn send(&mut self, signals: &ControlSignals) -> Result<bool, TmServerError> {
        let connected = self.socket.connected();
        if connected != self.monitor_connected {
            match connected {
                true => info!("Control signals monitor connected"),
                false => info!(
                    "Control signals monitor disconnected after {} messages", self.num_sent
                ),
            }
            self.monitor_connected = connected;
        }

        let packet = serde_json::to_string(signals)
            .map_err(TmServerError::SerializationError)?;

        match self.socket.send(&packet, 0) {
            Ok(()) => {
                self.num_sent += 1;
                Ok(true)
            },
            // A slow monitor must never hold up the control loop
            Err(zmq::Error::EAGAIN) => Ok(false),
            Err(e) => Err(TmServerError::SendError(e)),
        }
    }

    /// Number of control signal messages published so far.
    pub fn num_sent(&self) -> u64 {
        self.num_sent
    }
}
