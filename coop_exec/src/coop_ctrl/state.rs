//! Implementations for the CoopCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Matrix3;
use serde::Serialize;

// Internal
use super::{law, CoopCtrlError, CoopCtrlInitError, CtrlState, LoopState, Params};
use comms_if::{
    eqpt::arm::{JointState, TorqueDems},
    tm::ControlSignals,
    traj::TargetConfiguration,
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Cooperative control module state
#[derive(Default)]
pub struct CoopCtrl {
    params: Params,

    state: CtrlState,

    report: StatusReport,

    output: Option<OutputData>,
    arch_ctrl_signals: Archiver,
}

/// Input data to cooperative control, a consistent snapshot of every
/// ingress stream taken at the top of the cycle.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Monotonic time of the cycle.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Latest joint state of each arm, indexed by `ArmId::index`.
    pub arm_joints: [JointState; 2],

    /// Latest target configuration, or the initial target if none has been
    /// received yet.
    pub target: TargetConfiguration,

    /// True once at least one target configuration has been received.
    pub target_received: bool,

    /// True if any sensor stream has not delivered its first sample yet.
    pub inputs_stale: bool,
}

/// Output of one control cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutputData {
    /// Torque demands for each arm, indexed by `ArmId::index`.
    pub torque_dems: [TorqueDems; 2],

    pub ctrl_signals: ControlSignals,
}

/// Status report for CoopCtrl processing.
///
/// Carries the intermediate signals of the cycle so that an instability or a
/// safety shutdown can be analysed afterwards.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// Units: seconds
    pub envelope_time_s: f64,

    /// A normalised error reached the barrier warning band.
    pub numeric_instability: bool,

    pub inputs_stale: bool,

    pub near_singularity: [bool; 2],

    pub xi_s: [f64; 3],
    pub xi_v: [f64; 3],

    /// Desired object velocity from the position loop.
    pub v_des: [f64; 3],

    /// Object pose estimated from each arm.
    pub obj_pose: [[f64; 3]; 2],

    /// Object velocity estimated from each arm.
    pub obj_vel: [[f64; 3]; 2],

    /// Distance between the two object position estimates.
    ///
    /// Units: meters
    pub est_disagreement_m: f64,

    /// Object level control input.
    pub u_o: [f64; 3],

    /// Input allocated to each arm's end effector.
    pub u_arm: [[f64; 3]; 2],

    pub q_rad: [[f64; 3]; 2],

    /// Arm Jacobians, row major.
    pub arm_jacobians: [[[f64; 3]; 3]; 2],

    pub torques: [[f64; 3]; 2],

    pub torque_norms: [f64; 2],
}

/// Flat record of the control signals for the CSV archive.
#[derive(Serialize)]
struct CtrlSignalsRecord {
    time_s: f64,
    rho_v_x: f64,
    e_v_x: f64,
    rho_v_y: f64,
    e_v_y: f64,
    rho_v_theta: f64,
    e_v_theta: f64,
    rho_s_x: f64,
    e_s_x: f64,
    rho_s_y: f64,
    e_s_y: f64,
    rho_s_theta: f64,
    e_s_theta: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CoopCtrl {
    /// Create the module directly from parameters, without a session.
    pub fn from_params(params: Params) -> Result<Self, CoopCtrlInitError> {
        params.validate().map_err(CoopCtrlInitError::InvalidParams)?;

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn ctrl_state(&self) -> &CtrlState {
        &self.state
    }

    pub fn ctrl_state_mut(&mut self) -> &mut CtrlState {
        &mut self.state
    }

    pub fn loop_state(&self) -> LoopState {
        self.state.loop_state()
    }

    /// Start the control loop, see `CtrlState::start`.
    pub fn start(&mut self, time_s: f64) -> Result<(), CoopCtrlError> {
        self.state.start(time_s)
    }

    /// Latest status report.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }
}

impl State for CoopCtrl {
    type InitData = String;
    type InitError = CoopCtrlInitError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = CoopCtrlError;

    /// Initialise the CoopCtrl module.
    ///
    /// Expected init data is the name of the parameter file under the
    /// params directory.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        let params: Params = params::load(&init_data)?;
        *self = Self::from_params(params)?;

        self.arch_ctrl_signals = Archiver::from_path(
            session, "coop_ctrl/ctrl_signals.csv"
        )?;

        Ok(())
    }

    /// Perform one cycle of cooperative control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let (output, report) = law::cycle(&self.params, &mut self.state, input_data)?;

        self.output = Some(output);
        self.report = report;

        Ok((output, report))
    }
}

impl Archived for CoopCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if let Some(ref o) = self.output {
            self.arch_ctrl_signals.serialise(CtrlSignalsRecord::from(&o.ctrl_signals))?;
        }

        Ok(())
    }
}

impl From<&ControlSignals> for CtrlSignalsRecord {
    fn from(s: &ControlSignals) -> Self {
        let d = &s.data;
        Self {
            time_s: s.time_s,
            rho_v_x: d[0],
            e_v_x: d[1],
            rho_v_y: d[2],
            e_v_y: d[3],
            rho_v_theta: d[4],
            e_v_theta: d[5],
            rho_s_x: d[6],
            e_s_x: d[7],
            rho_s_y: d[8],
            e_s_y: d[9],
            rho_s_theta: d[10],
            e_s_theta: d[11],
        }
    }
}

/// Row major copy of a matrix, for reporting.
pub(crate) fn matrix_rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    let mut rows = [[0f64; 3]; 3];
    for (i, row) in rows.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = m[(i, j)];
        }
    }
    rows
}
