//! # Data Store

use log::info;

use crate::{
    arm_client::ArmSnapshot,
    coop_ctrl::{self, CoopCtrl},
    latest_value::Sample,
};
use comms_if::{eqpt::arm::ArmId, traj::TargetConfiguration};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Names of the ingress streams, in the order of `DataStore::streams_received`.
const STREAM_NAMES: [&str; NUM_STREAMS] = [
    "arm_1 joint poses",
    "arm_1 joint vels",
    "arm_2 joint poses",
    "arm_2 joint vels",
    "target configuration",
];

const NUM_STREAMS: usize = 5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Monotonic time of the current cycle since the executable started
    pub time_s: f64,

    // CoopCtrl
    pub coop_ctrl: CoopCtrl,
    pub coop_ctrl_input: Option<coop_ctrl::InputData>,
    pub coop_ctrl_output: Option<coop_ctrl::OutputData>,
    pub coop_ctrl_status_rpt: coop_ctrl::StatusReport,

    /// Whether each ingress stream has delivered its first message
    pub streams_received: [bool; NUM_STREAMS],

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive cycles in which the control law failed
    pub num_consec_ctrl_errors: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears the previous cycle's control data and sets the cycle time.
    pub fn cycle_start(&mut self, time_s: f64) {
        self.time_s = time_s;

        self.coop_ctrl_input = None;
        self.coop_ctrl_output = None;
        self.coop_ctrl_status_rpt = coop_ctrl::StatusReport::default();
    }

    /// Assemble the control input from this cycle's snapshot of the ingress streams.
    ///
    /// Logs the arrival of the first message on each stream.
    pub fn set_inputs(
        &mut self,
        arms: [ArmSnapshot; 2],
        target: Sample<TargetConfiguration>,
    ) {
        let received = [
            arms[ArmId::Arm1.index()].num_poses > 0,
            arms[ArmId::Arm1.index()].num_vels > 0,
            arms[ArmId::Arm2.index()].num_poses > 0,
            arms[ArmId::Arm2.index()].num_vels > 0,
            target.received(),
        ];

        for i in 0..NUM_STREAMS {
            if received[i] && !self.streams_received[i] {
                info!("First {} message received", STREAM_NAMES[i]);
            }
            self.streams_received[i] = received[i];
        }

        self.coop_ctrl_input = Some(coop_ctrl::InputData {
            time_s: self.time_s,
            arm_joints: [arms[0].joints, arms[1].joints],
            target: target.value,
            target_received: target.received(),
            inputs_stale: !received[..4].iter().all(|r| *r),
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::arm::JointState;

    fn snapshot(num: u64) -> ArmSnapshot {
        ArmSnapshot {
            joints: JointState::default(),
            num_poses: num,
            num_vels: num,
        }
    }

    fn target(num_updates: u64) -> Sample<TargetConfiguration> {
        Sample {
            value: TargetConfiguration {
                pos: [0.301, 0.11, 0.0],
                vel: [0.0; 3],
                acc: [0.0; 3],
            },
            num_updates,
        }
    }

    #[test]
    fn test_stale_inputs() {
        let mut ds = DataStore::default();
        ds.cycle_start(0.5);

        ds.set_inputs([snapshot(3), snapshot(0)], target(0));
        let input = ds.coop_ctrl_input.unwrap();

        assert!(input.inputs_stale);
        assert!(!input.target_received);
        assert_eq!(input.time_s, 0.5);
        assert_eq!(ds.streams_received, [true, true, false, false, false]);

        ds.cycle_start(0.6);
        assert!(ds.coop_ctrl_input.is_none());

        ds.set_inputs([snapshot(4), snapshot(1)], target(1));
        let input = ds.coop_ctrl_input.unwrap();

        assert!(!input.inputs_stale);
        assert!(input.target_received);
    }
}
