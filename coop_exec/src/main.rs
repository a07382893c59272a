//! Main cooperative control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Connect to both arm drivers and the trajectory source
//!     - Start the control loop (INITIALISING -> RUNNING)
//!     - Main loop:
//!         - Snapshot of every ingress stream
//!         - Cooperative control processing
//!         - Safety supervision and torque publication
//!         - Telemetry and archiving
//!     - Security stop of both arms on shutdown
//!
//! # Modules
//!
//! All modules (e.g. `coop_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::{eqpt::arm::ArmId, net::NetParams};
use coop_lib::{
    arm_client::ArmClient,
    coop_ctrl::{CoopCtrlError, LoopState},
    data_store::DataStore,
    params::CoopExecParams,
    safety::{self, SafetySupervisor, SafetyVerdict},
    tm_server::TmServer,
    traj_client::TrajClient,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, error, info, warn};
use std::env;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default parameter file of the control law.
const DEFAULT_COOP_CTRL_PARAMS: &str = "coop_ctrl.toml";

/// Number of consecutive control law failures reported individually before
/// they are only counted.
const MAX_REPORTED_CTRL_ERRORS: u64 = 10;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "coop_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Cooperative Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    let exec_params: CoopExecParams = util::params::load(
        "coop_exec.toml"
    ).wrap_err("Could not load exec params")?;
    exec_params.validate()
        .map_err(|e| eyre!("Invalid exec params: {}", e))?;

    info!("Exec parameters loaded");

    // An optional single argument overrides the control law parameter file
    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let coop_ctrl_params = match args.len() {
        1 => String::from(DEFAULT_COOP_CTRL_PARAMS),
        2 => args[1].clone(),
        n => return Err(eyre!(
            "Expected either zero or one argument, found {}", n - 1
        ))
    };

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.coop_ctrl.init(coop_ctrl_params.clone(), &session)
        .wrap_err("Failed to initialise CoopCtrl")?;
    info!("CoopCtrl init complete ({})", coop_ctrl_params);

    let supervisor = SafetySupervisor::new(
        ds.coop_ctrl.params().safety.torque_ceiling
    );

    info!("Module initialisation complete\n");

    // ---- RECORD EFFECTIVE PARAMETERS ----

    session.record_params("net", &net_params)
        .wrap_err("Failed to record the net params")?;
    session.record_params("coop_exec", &exec_params)
        .wrap_err("Failed to record the exec params")?;
    session.record_params("coop_ctrl", ds.coop_ctrl.params())
        .wrap_err("Failed to record the CoopCtrl params")?;
    debug!("Effective parameters recorded in {:?}", session.params_root);

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let mut arm_clients = [
        ArmClient::new(&zmq_ctx, ArmId::Arm1, &net_params)
            .wrap_err("Failed to initialise the arm 1 client")?,
        ArmClient::new(&zmq_ctx, ArmId::Arm2, &net_params)
            .wrap_err("Failed to initialise the arm 2 client")?,
    ];
    info!("ArmClients initialised");

    let traj_client = TrajClient::new(
        &zmq_ctx,
        &net_params,
        ds.coop_ctrl.params().initial_target
    ).wrap_err("Failed to initialise the TrajClient")?;
    info!("TrajClient initialised");

    let mut tm_server = TmServer::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise TmServer")?;
    info!("TmServer initialised");

    info!("Network initialisation complete");

    // ---- EXTERNAL STOP ----

    let running = Arc::new(AtomicBool::new(true));
    let running_handle = running.clone();

    ctrlc::set_handler(move || {
        running_handle.store(false, Ordering::Release);
    }).wrap_err("Failed to set the stop signal handler")?;

    // ---- MAIN LOOP ----

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s());
    let exec_start = Instant::now();

    ds.coop_ctrl.start(0.0)
        .wrap_err("Failed to start the control loop")?;

    info!("Begining main loop at {:.1} Hz\n", exec_params.control_rate_hz);

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- EXTERNAL STOP ----

        if !running.load(Ordering::Acquire) {
            info!("Stop signal received");
            ds.coop_ctrl.ctrl_state_mut().shut_down();
            safety::stop_all(&mut arm_clients, "controller stopped by the operator");
            break
        }

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start((cycle_start_instant - exec_start).as_secs_f64());

        // ---- DATA INPUT ----

        ds.set_inputs(
            [arm_clients[0].snapshot(), arm_clients[1].snapshot()],
            traj_client.target()
        );

        // ---- CONTROL ALGORITHM PROCESSING ----

        let input = match ds.coop_ctrl_input {
            Some(i) => i,
            None => return Err(eyre!("No CoopCtrl input assembled"))
        };

        match ds.coop_ctrl.proc(&input) {
            Ok((o, r)) => {
                ds.coop_ctrl_output = Some(o);
                ds.coop_ctrl_status_rpt = r;
                ds.num_consec_ctrl_errors = 0;
            },
            Err(CoopCtrlError::ShutDown) => break,
            Err(e) => {
                // Nothing is published this cycle, the drivers hold their last demand
                ds.num_consec_ctrl_errors += 1;
                if ds.num_consec_ctrl_errors <= MAX_REPORTED_CTRL_ERRORS {
                    warn!("Error during CoopCtrl processing: {}", e);
                }
            }
        };

        // ---- SAFETY AND OUTPUT ----

        if let Some(ref output) = ds.coop_ctrl_output {
            let verdict = supervisor.supervise(
                output,
                &ds.coop_ctrl_status_rpt,
                ds.coop_ctrl.ctrl_state_mut(),
                &mut arm_clients
            );

            // ---- TELEMETRY ----

            if let Err(e) = tm_server.send(&output.ctrl_signals) {
                warn!("TmServer error: {}", e);
            }

            if verdict == SafetyVerdict::ShutDown {
                error!("Safety shutdown, status report:\n{:#?}", ds.coop_ctrl_status_rpt);
                break
            }
        }

        // ---- WRITE ARCHIVES ----

        if exec_params.archive_signals {
            if let Err(e) = ds.coop_ctrl.write() {
                warn!("Could not archive the control signals: {}", e);
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                ds.num_consec_cycle_overruns += 1;
                warn!(
                    "Cycle overran by {:.06} s ({} consecutive)",
                    (cycle_dur - cycle_period).as_secs_f64(),
                    ds.num_consec_cycle_overruns
                );
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    if ds.coop_ctrl.loop_state() != LoopState::ShutDown {
        ds.coop_ctrl.ctrl_state_mut().shut_down();
    }

    info!(
        "End of execution after {} cycles ({} control cycles computed)",
        ds.num_cycles,
        ds.coop_ctrl.ctrl_state().num_cycles()
    );
    info!("{} control signal messages published", tm_server.num_sent());

    Ok(())
}
