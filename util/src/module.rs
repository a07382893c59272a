//! Cyclic module interface
//!
//! The executive owns its modules through the data store and drives them
//! with a fixed pattern: `init` once after the session is opened, then
//! `proc` once per control cycle with a snapshot of that cycle's inputs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A module processed by the executive's control loop.
pub trait State {
    /// What `init` needs, typically a parameter file name.
    type InitData;
    type InitError;

    /// Per cycle input snapshot.
    type InputData;
    /// Per cycle output, handed on to the safety supervisor and publishers.
    type OutputData;
    /// Per cycle diagnostics.
    type StatusReport;
    type ProcError;

    /// Load parameters and prepare any archives in the session directory.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one cycle.
    ///
    /// Errors are per cycle: the executive decides whether a failed cycle is
    /// skipped or ends the run.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
