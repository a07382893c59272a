//! Prescribed performance primitives
//!
//! A performance envelope is a decaying per axis bound on an error signal.
//! The barrier transform maps the error, normalised by the envelope, onto an
//! unbounded signal which grows without limit as the error approaches the
//! envelope.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod barrier;
pub mod envelope;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use barrier::*;
pub use envelope::*;
