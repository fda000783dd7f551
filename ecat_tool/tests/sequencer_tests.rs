//! Drive sequencer integration tests against the simulated bus.

use ecat_common::config::{SequencerConfig, ToolConfig};
use ecat_common::drive::motion::{Direction, MotionRequest};
use ecat_common::drive::objects::{CONTROL_WORD, PROFILE_VELOCITY, STATUS_WORD, TARGET_POSITION};
use ecat_common::drive::state::{DriveState, PowerState};
use ecat_common::od::client::OdError;
use ecat_tool::clients::simulation::{AccessKind, SimulatedMaster};
use ecat_tool::command::CommandEnv;
use ecat_tool::commands::build_registry;
use ecat_tool::context::ExecutionContext;
use ecat_tool::sequencer::{DriveSequencer, SequenceError, SequenceStep};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const INIT_WORDS: [u64; 4] = [0x00FF, 0x0006, 0x0007, 0x000F];

fn sequencer_config() -> SequencerConfig {
    SequencerConfig {
        verify_transitions: true,
        max_status_polls: 3,
        poll_interval_ms: 0,
    }
}

fn with_env<R>(
    master: &mut SimulatedMaster,
    sequencer: &SequencerConfig,
    f: impl FnOnce(&mut CommandEnv<'_>) -> R,
) -> R {
    let registry = build_registry();
    let mut input = Cursor::new(Vec::new());
    let mut output = Vec::new();
    let mut env = CommandEnv {
        registry: &registry,
        client: master,
        sequencer,
        input: &mut input,
        output: &mut output,
        running: Arc::new(AtomicBool::new(true)),
    };
    f(&mut env)
}

fn written_words(master: &SimulatedMaster) -> Vec<u64> {
    master
        .accesses(AccessKind::Download)
        .iter()
        .filter(|e| e.address == CONTROL_WORD)
        .map(|e| e.value)
        .collect()
}

fn initialized(config: &ToolConfig) -> SimulatedMaster {
    let mut master = SimulatedMaster::from_config(config);
    let seq_config = sequencer_config();
    with_env(&mut master, &seq_config, |env| {
        DriveSequencer::new(&seq_config)
            .initialize(&ExecutionContext::default(), env)
            .unwrap();
    });
    master.clear_journal();
    master
}

#[test]
fn init_writes_four_control_words_each_followed_by_status_read() {
    let mut master = SimulatedMaster::from_config(&ToolConfig::default());
    let config = sequencer_config();
    let mut sequencer = DriveSequencer::new(&config);

    with_env(&mut master, &config, |env| {
        sequencer.initialize(&ExecutionContext::default(), env)
    })
    .unwrap();

    assert_eq!(written_words(&master), INIT_WORDS.to_vec());
    let journal = master.journal();
    assert_eq!(journal.len(), 8);
    for pair in journal.chunks(2) {
        assert_eq!(pair[0].kind, AccessKind::Download);
        assert_eq!(pair[0].address, CONTROL_WORD);
        assert_eq!(pair[1].kind, AccessKind::Upload);
        assert_eq!(pair[1].address, STATUS_WORD);
    }

    assert_eq!(sequencer.step(), SequenceStep::OperationEnabled);
    assert_eq!(sequencer.state(), DriveState::OperationEnabled);
    let report = sequencer.report();
    assert_eq!(report.control_words(), vec![0x00FF, 0x0006, 0x0007, 0x000F]);
    assert!(report.transitions.iter().all(|t| t.verified));
    assert_eq!(report.last().unwrap().state, PowerState::OperationEnabled);
}

#[test]
fn init_is_identical_from_any_prior_state() {
    let mut faulted = ToolConfig::default();
    faulted.simulation.slaves[0].initial_fault = true;

    for config in [ToolConfig::default(), faulted] {
        let mut master = SimulatedMaster::from_config(&config);
        let seq_config = sequencer_config();
        for _ in 0..2 {
            master.clear_journal();
            with_env(&mut master, &seq_config, |env| {
                DriveSequencer::new(&seq_config).initialize(&ExecutionContext::default(), env)
            })
            .unwrap();
            assert_eq!(written_words(&master), INIT_WORDS.to_vec());
        }
        assert_eq!(
            master.drive(0).unwrap().power_state(),
            PowerState::OperationEnabled
        );
    }
}

#[test]
fn move_writes_target_velocity_then_arms_and_triggers() {
    let mut master = initialized(&ToolConfig::default());
    let config = sequencer_config();
    let request = MotionRequest {
        target_position: 50000,
        direction: Direction::Reverse,
        profile_velocity: 1000,
    };

    let mut sequencer = DriveSequencer::new(&config);
    with_env(&mut master, &config, |env| {
        sequencer.execute_move(&request, &ExecutionContext::default(), env)
    })
    .unwrap();

    let order: Vec<(AccessKind, u16)> = master
        .journal()
        .iter()
        .map(|e| (e.kind, e.address.index))
        .collect();
    assert_eq!(
        order,
        vec![
            (AccessKind::Download, 0x607A),
            (AccessKind::Download, 0x6081),
            (AccessKind::Download, 0x6040),
            (AccessKind::Upload, 0x6041),
            (AccessKind::Download, 0x6040),
            (AccessKind::Upload, 0x6041),
        ]
    );

    let downloads = master.accesses(AccessKind::Download);
    assert_eq!(downloads[0].value, 0xFFFF_3CB0);
    assert_eq!(downloads[1].value, 1000);
    assert_eq!(downloads[2].value, 0x006F);
    assert_eq!(downloads[3].value, 0x007F);

    assert_eq!(sequencer.step(), SequenceStep::MotionTriggered);
    assert_eq!(master.drive(0).unwrap().position(), -50000);
}

#[test]
fn failed_target_write_aborts_the_move() {
    let mut master = initialized(&ToolConfig::default());
    master.inject_failure(
        AccessKind::Download,
        TARGET_POSITION,
        OdError::Aborted { code: 0x0609_0030 },
    );
    let config = sequencer_config();
    let request = MotionRequest {
        target_position: 100,
        direction: Direction::Forward,
        profile_velocity: 10,
    };

    let result = with_env(&mut master, &config, |env| {
        DriveSequencer::new(&config).execute_move(&request, &ExecutionContext::default(), env)
    });

    match result {
        Err(SequenceError::Access { op, address, .. }) => {
            assert_eq!(op, "download");
            assert_eq!(address, TARGET_POSITION);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    let journal = master.journal();
    assert_eq!(journal.len(), 1);
    assert!(!journal[0].ok);
    assert!(written_words(&master).is_empty());
}

#[test]
fn failed_velocity_write_skips_arm_and_trigger() {
    let mut master = initialized(&ToolConfig::default());
    master.inject_failure(
        AccessKind::Download,
        PROFILE_VELOCITY,
        OdError::Unreachable("cable".to_string()),
    );
    let config = sequencer_config();
    let request = MotionRequest {
        target_position: 100,
        direction: Direction::Forward,
        profile_velocity: 10,
    };

    let result = with_env(&mut master, &config, |env| {
        DriveSequencer::new(&config).execute_move(&request, &ExecutionContext::default(), env)
    });
    assert!(result.is_err());

    let downloads = master.accesses(AccessKind::Download);
    assert_eq!(downloads.len(), 2);
    assert_eq!(downloads[0].address, TARGET_POSITION);
    assert!(downloads[0].ok);
    assert_eq!(downloads[1].address, PROFILE_VELOCITY);
    assert!(master.accesses(AccessKind::Upload).is_empty());
}

#[test]
fn unconfirmed_transition_times_out() {
    let mut master = SimulatedMaster::from_config(&ToolConfig::default());
    master.drive_mut(0).unwrap().set_frozen(true);
    let config = sequencer_config();

    let result = with_env(&mut master, &config, |env| {
        DriveSequencer::new(&config).initialize(&ExecutionContext::default(), env)
    });

    match result {
        Err(SequenceError::TransitionTimeout {
            step, state, polls, ..
        }) => {
            assert_eq!(step, SequenceStep::ShutdownRequested);
            assert_eq!(state, PowerState::SwitchOnDisabled);
            assert_eq!(polls, 3);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(written_words(&master), vec![0x00FF, 0x0006]);
    assert_eq!(master.accesses(AccessKind::Upload).len(), 4);
}

#[test]
fn force_continues_past_unconfirmed_transitions() {
    let mut master = SimulatedMaster::from_config(&ToolConfig::default());
    master.drive_mut(0).unwrap().set_frozen(true);
    let config = sequencer_config();
    let ctx = ExecutionContext {
        force: true,
        ..ExecutionContext::default()
    };

    let mut sequencer = DriveSequencer::new(&config);
    with_env(&mut master, &config, |env| sequencer.initialize(&ctx, env)).unwrap();

    assert_eq!(written_words(&master), INIT_WORDS.to_vec());
    let verified: Vec<bool> = sequencer
        .report()
        .transitions
        .iter()
        .map(|t| t.verified)
        .collect();
    assert_eq!(verified, vec![true, false, false, false]);
    assert!(sequencer.report().to_string().contains("[unverified]"));
}

#[test]
fn without_verification_status_is_read_once() {
    let mut master = SimulatedMaster::from_config(&ToolConfig::default());
    master.drive_mut(0).unwrap().set_frozen(true);
    let config = SequencerConfig {
        verify_transitions: false,
        ..sequencer_config()
    };

    let mut sequencer = DriveSequencer::new(&config);
    with_env(&mut master, &config, |env| {
        sequencer.initialize(&ExecutionContext::default(), env)
    })
    .unwrap();

    assert_eq!(written_words(&master), INIT_WORDS.to_vec());
    assert_eq!(master.accesses(AccessKind::Upload).len(), 4);
    assert!(sequencer.report().transitions.iter().all(|t| t.polls == 1));
}

#[test]
fn unreachable_device_fails_first_write() {
    let mut master = SimulatedMaster::from_config(&ToolConfig::default());
    master.set_unresponsive(true);
    let config = sequencer_config();

    let result = with_env(&mut master, &config, |env| {
        DriveSequencer::new(&config).initialize(&ExecutionContext::default(), env)
    });

    let err = result.unwrap_err();
    assert!(matches!(err, SequenceError::Access { op: "download", .. }));
    assert!(err.to_string().contains("unreachable"));
    assert_eq!(master.journal().len(), 1);
}
