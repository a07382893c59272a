//! Session management
//!
//! A session is one run of an executable. It owns a timestamped directory
//! under `$COOP_SW_ROOT/sessions` holding the log file, the archives and a
//! copy of every parameter set the run was configured with.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

// Internal imports
use crate::{host, time};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Wall clock time at which the session was opened. Set exactly once per
/// process.
static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// strftime format of the timestamp suffix of the session directory.
const DIR_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the sub directory holding the recorded parameters.
const PARAMS_DIR_NAME: &str = "params";

/// Name of the sub directory holding the archives.
const ARCH_DIR_NAME: &str = "arch";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Paths belonging to the current session.
#[derive(Clone, Debug)]
pub struct Session {
    /// Directory of this session
    pub session_root: PathBuf,

    /// Directory of the session's CSV archives
    pub arch_root: PathBuf,

    /// Directory in which the effective parameters are recorded
    pub params_root: PathBuf,

    /// Log file of the session
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("COOP_SW_ROOT is not set, cannot locate the sessions directory")]
    SwRootNotSet,

    #[error("Cannot create {0:?}: {1}")]
    CannotCreateDir(PathBuf, std::io::Error),

    #[error("A session has already been opened by this process ({0})")]
    AlreadyOpen(conquer_once::TryInitError),

    #[error("The session epoch is not available")]
    NoEpoch,

    #[error("Cannot serialise the {0} parameters: {1}")]
    ParamsSerialise(String, serde_json::Error),

    #[error("Cannot write the {0} parameters: {1}")]
    ParamsWrite(String, std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Open the session of this process.
    ///
    /// The session directory is `$COOP_SW_ROOT/{sessions_dir}/{exec_name}_{timestamp}`.
    /// Only one session may be opened per process since the log timestamps
    /// are all relative to its epoch.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(SessionError::AlreadyOpen)?;

        let stamp = get_epoch()
            .ok_or(SessionError::NoEpoch)?
            .format(DIR_TIMESTAMP_FORMAT);

        let session_root = host::get_coop_sw_root()
            .map_err(|_| SessionError::SwRootNotSet)?
            .join(sessions_dir)
            .join(format!("{}_{}", exec_name, stamp));

        let arch_root = session_root.join(ARCH_DIR_NAME);
        let params_root = session_root.join(PARAMS_DIR_NAME);

        for dir in [&session_root, &arch_root, &params_root].iter() {
            fs::create_dir_all(dir)
                .map_err(|e| SessionError::CannotCreateDir(dir.to_path_buf(), e))?;
        }

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
            arch_root,
            params_root,
        })
    }

    /// Record the parameters a module is actually running with.
    ///
    /// Defaults filled in by serde are included, so the record is complete
    /// even when the source file only overrode a few values. The record is
    /// written as `{name}.json` in the session's params directory.
    pub fn record_params<P: Serialize>(
        &self,
        name: &str,
        params: &P,
    ) -> Result<PathBuf, SessionError> {
        let text = serde_json::to_string_pretty(params)
            .map_err(|e| SessionError::ParamsSerialise(name.into(), e))?;

        let path = self.params_root.join(format!("{}.json", name));
        fs::write(&path, text).map_err(|e| SessionError::ParamsWrite(name.into(), e))?;

        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds elapsed since the session was opened, `NaN` before that.
pub fn get_elapsed_seconds() -> f64 {
    get_epoch()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
        .unwrap_or(std::f64::NAN)
}

/// The session epoch, if a session has been opened.
pub fn get_epoch() -> Option<&'static DateTime<Utc>> {
    SESSION_EPOCH.get()
}
