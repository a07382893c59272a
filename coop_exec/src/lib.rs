//! # Cooperative control library.
//!
//! This library allows other crates in the workspace, as well as the integration tests and
//! benchmarks, to access items defined inside the cooperative control crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm kinematics - forward kinematics and Jacobians of both arms
pub mod arm_kin;

/// Cooperative estimation - object pose and velocity from each end effector
pub mod coop_est;

/// Prescribed performance primitives - envelopes and the barrier transform
pub mod ppc;

/// Cooperative control - the per cycle control law
pub mod coop_ctrl;

/// Safety supervisor - torque ceiling check and security stop
pub mod safety;

/// Latest value cells shared between the ingress threads and the control loop
pub mod latest_value;

/// Arm client - joint state ingress, torque demands and security stop for one driver
pub mod arm_client;

/// Trajectory client - receives target configurations
pub mod traj_client;

/// Telemetry server - publishes the control signals
pub mod tm_server;

/// Data store - the executable's per cycle data
pub mod data_store;

/// Executable parameters
pub mod params;
