//! Drive state sequencer.
//!
//! Brings a CiA 402 drive into "operation enabled" and issues profile-position
//! moves. Every dictionary access is dispatched through the command registry
//! as a `download` or `upload` command, one at a time. The first failing
//! access aborts the remaining steps; nothing already written is undone.

mod steps;

pub use steps::SequenceStep;

use crate::command::{CommandEnv, CommandError, CommandOutput};
use crate::command_registry::ResolutionError;
use crate::context::ExecutionContext;
use ecat_common::config::SequencerConfig;
use ecat_common::drive::motion::MotionRequest;
use ecat_common::drive::objects::{CONTROL_WORD, PROFILE_VELOCITY, STATUS_WORD, TARGET_POSITION};
use ecat_common::drive::state::{DriveState, PowerState};
use ecat_common::drive::words::StatusWord;
use ecat_common::od::types::{DictionaryAddress, format_hex, format_word};
use serde::Serialize;
use std::fmt;
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error types for drive sequences.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// Access command not available in the registry.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A dictionary access failed.
    #[error("{op} of {address} failed: {source}")]
    Access {
        /// `download` or `upload`.
        op: &'static str,
        /// Entry accessed.
        address: DictionaryAddress,
        /// Underlying command failure.
        source: Box<CommandError>,
    },

    /// Status word never confirmed the transition.
    #[error(
        "Drive did not reach '{step}' after {polls} status reads (status {status:#06x}, {state})"
    )]
    TransitionTimeout {
        /// Step that was not confirmed.
        step: SequenceStep,
        /// Last status word read.
        status: u16,
        /// State decoded from the last status word.
        state: PowerState,
        /// Number of status reads.
        polls: u32,
    },

    /// Access command returned something other than a value.
    #[error("Unexpected output from {op} of {address}")]
    UnexpectedOutput {
        /// Access command name.
        op: &'static str,
        /// Entry accessed.
        address: DictionaryAddress,
    },
}

/// One dictionary access issued by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRecord {
    /// `download` or `upload`.
    pub op: &'static str,
    /// Entry accessed.
    pub address: DictionaryAddress,
    /// Value written or read.
    pub value: u64,
}

/// One control-word transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    /// Step entered.
    pub step: SequenceStep,
    /// Control word written.
    pub control_word: u16,
    /// Last status word read afterwards.
    pub status: u16,
    /// State decoded from `status`.
    pub state: PowerState,
    /// Status reads issued.
    pub polls: u32,
    /// Whether the status confirmed the step.
    pub verified: bool,
}

/// Everything a sequence did, in issue order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SequenceReport {
    /// Every access, in issue order.
    pub accesses: Vec<AccessRecord>,
    /// Every control-word transition, in issue order.
    pub transitions: Vec<TransitionRecord>,
}

impl SequenceReport {
    /// Control words written, in issue order.
    pub fn control_words(&self) -> Vec<u16> {
        self.transitions.iter().map(|t| t.control_word).collect()
    }

    /// Last transition, if any.
    pub fn last(&self) -> Option<&TransitionRecord> {
        self.transitions.last()
    }
}

impl fmt::Display for SequenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.transitions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{} -> {:#06x} {} ({})",
                format_word(t.control_word),
                t.status,
                t.state,
                t.step
            )?;
            if !t.verified {
                write!(f, " [unverified]")?;
            }
        }
        Ok(())
    }
}

/// Drives one slave through the power-up and move sequences.
#[derive(Debug, Clone)]
pub struct DriveSequencer {
    config: SequencerConfig,
    step: SequenceStep,
    report: SequenceReport,
}

impl DriveSequencer {
    /// Create a sequencer with the given settings.
    pub fn new(config: &SequencerConfig) -> Self {
        Self {
            config: config.clone(),
            step: SequenceStep::Init,
            report: SequenceReport::default(),
        }
    }

    /// Current step.
    pub fn step(&self) -> SequenceStep {
        self.step
    }

    /// Coarse drive state implied by the current step.
    pub fn state(&self) -> DriveState {
        self.step.drive_state()
    }

    /// Report of everything issued so far.
    pub fn report(&self) -> &SequenceReport {
        &self.report
    }

    /// Consume the sequencer, returning its report.
    pub fn into_report(self) -> SequenceReport {
        self.report
    }

    /// Run the initialization sequence: 0x00FF, 0x0006, 0x0007, 0x000F, each
    /// followed by a status read.
    ///
    /// Always starts over from `Init`, whatever the drive's prior state.
    ///
    /// # Errors
    /// The first failing access, or `TransitionTimeout` if verification is
    /// enabled and not forced.
    pub fn initialize(
        &mut self,
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
    ) -> Result<(), SequenceError> {
        info!("Initializing drive");
        self.step = SequenceStep::Init;
        while self.step != SequenceStep::OperationEnabled {
            self.advance(ctx, env)?;
        }
        info!("Drive operation enabled");
        Ok(())
    }

    /// Run one profile-position move and return once it is triggered.
    ///
    /// Writes the target position, the profile velocity, then arms and
    /// triggers the set-point. Does not wait for the move to complete and
    /// never re-runs initialization.
    ///
    /// # Errors
    /// The first failing access aborts the remaining writes.
    pub fn execute_move(
        &mut self,
        request: &MotionRequest,
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
    ) -> Result<(), SequenceError> {
        if !self.step.accepts_set_point() {
            warn!(step = %self.step, "Move requested before the drive was initialized");
        }
        let target = request.encoded_target();
        info!(
            target_position = request.target_position,
            direction = %request.direction,
            encoded = %format_hex(u64::from(target)),
            profile_velocity = request.profile_velocity,
            "Starting move"
        );

        self.download(ctx, env, TARGET_POSITION, u64::from(target), format_hex)?;
        self.download(
            ctx,
            env,
            PROFILE_VELOCITY,
            u64::from(request.profile_velocity),
            format_hex,
        )?;

        // A new set-point starts from the enabled state, so the trigger bit
        // always sees a rising edge.
        self.step = SequenceStep::OperationEnabled;
        self.advance(ctx, env)?;
        self.advance(ctx, env)?;
        Ok(())
    }

    /// Write the control word that leaves the current step and observe the
    /// status word.
    fn advance(
        &mut self,
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
    ) -> Result<(), SequenceError> {
        let (Some(word), Some(next)) = (self.step.control_word(), self.step.next()) else {
            return Ok(());
        };

        debug!(from = %self.step, to = %next, control_word = %format_word(word), "Transition");
        self.download(ctx, env, CONTROL_WORD, u64::from(word), |v| {
            format_word(v as u16)
        })?;
        let record = self.observe(next, word, ctx, env)?;
        self.report.transitions.push(record);
        self.step = next;
        Ok(())
    }

    /// Read the status word after a transition, polling if verification is on.
    fn observe(
        &mut self,
        step: SequenceStep,
        control_word: u16,
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
    ) -> Result<TransitionRecord, SequenceError> {
        let verify = self.config.verify_transitions;
        let max_polls = if verify {
            self.config.max_status_polls.max(1)
        } else {
            1
        };

        let mut polls = 0;
        loop {
            let status = self.read_status(ctx, env)?;
            polls += 1;
            let state = PowerState::from_raw(status);
            let record = TransitionRecord {
                step,
                control_word,
                status,
                state,
                polls,
                verified: verify && step.expected(state),
            };

            if !verify || record.verified {
                debug!(%step, status = %format_word(status), %state, polls, "Status observed");
                return Ok(record);
            }
            if polls >= max_polls {
                if ctx.force {
                    warn!(%step, status = %format_word(status), %state, polls, "Transition not confirmed, continuing (forced)");
                    return Ok(record);
                }
                return Err(SequenceError::TransitionTimeout {
                    step,
                    status,
                    state,
                    polls,
                });
            }
            thread::sleep(self.config.poll_interval());
        }
    }

    fn read_status(
        &mut self,
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
    ) -> Result<u16, SequenceError> {
        match self.dispatch("upload", STATUS_WORD, None, ctx, env)? {
            CommandOutput::Value { raw, .. } => {
                self.record("upload", STATUS_WORD, raw);
                let status = StatusWord::from_reply(raw).map_err(|e| SequenceError::Access {
                    op: "upload",
                    address: STATUS_WORD,
                    source: Box::new(CommandError::Device(e)),
                })?;
                Ok(status.bits())
            }
            _ => Err(SequenceError::UnexpectedOutput {
                op: "upload",
                address: STATUS_WORD,
            }),
        }
    }

    fn download(
        &mut self,
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
        address: DictionaryAddress,
        value: u64,
        format: impl Fn(u64) -> String,
    ) -> Result<(), SequenceError> {
        self.dispatch("download", address, Some(format(value)), ctx, env)?;
        self.record("download", address, value);
        Ok(())
    }

    /// Resolve an access command by name and run it for one entry.
    fn dispatch(
        &self,
        op: &'static str,
        address: DictionaryAddress,
        value: Option<String>,
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
    ) -> Result<CommandOutput, SequenceError> {
        let registry = env.registry;
        let command = registry.resolve_one(op)?;

        let mut args = vec![
            format!("0x{:04X}", address.index),
            address.subindex.to_string(),
        ];
        args.extend(value);

        let access_ctx = ctx.with_data_type(address.data_type);
        command
            .execute(&args, &access_ctx, env)
            .map_err(|source| SequenceError::Access {
                op,
                address,
                source: Box::new(source),
            })
    }

    fn record(&mut self, op: &'static str, address: DictionaryAddress, value: u64) {
        self.report.accesses.push(AccessRecord { op, address, value });
    }
}
