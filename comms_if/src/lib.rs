//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the cooperative
//! manipulation software: the messages exchanged with the arm drivers, the
//! trajectory source and monitoring clients, and the network layer used to
//! carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message definitions for equipment (the arm drivers)
pub mod eqpt;

/// Network module
pub mod net;

/// Object trajectory messages
pub mod traj;

/// Telemetry (control signal diagnostics) messages
pub mod tm;
