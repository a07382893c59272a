//! Common support for the cooperative manipulation executables
//!
//! Sessions, logging, parameter files, CSV archives and the cyclic module
//! interface. Nothing in here knows about arms or control laws.

pub mod archive;
pub mod host;
pub mod logger;
pub mod maths;
pub mod module;
pub mod params;
pub mod session;
pub mod time;
