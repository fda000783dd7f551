//! `move` - initialize a drive and run one profile-position move.

use super::{usage_error, write_report};
use crate::command::{Command, CommandEnv, CommandError, CommandOutput};
use crate::command_registry::numeric_info;
use crate::context::ExecutionContext;
use crate::sequencer::DriveSequencer;
use ecat_common::drive::motion::{Direction, MotionRequest};
use ecat_common::od::types::parse_number;

/// Runs one move on the selected slave.
pub struct MoveCommand;

impl Command for MoveCommand {
    fn name(&self) -> &'static str {
        "move"
    }

    fn brief(&self) -> &'static str {
        "Move a drive to a target position."
    }

    fn synopsis(&self) -> &'static str {
        "<POSITION> <VELOCITY> [forward|reverse]"
    }

    fn description(&self) -> String {
        format!(
            "{}\n\n\
             Initializes the drive, writes the target position (0x607A:00)\n\
             and profile velocity (0x6081:00), then arms (0x006f) and\n\
             triggers (0x007f) the set-point. Returns once the move is\n\
             triggered.\n\n\
             Arguments:\n  \
               POSITION  is the target position, a signed 32 bit number.\n  \
               VELOCITY  is the profile velocity, an unsigned 32 bit number.\n  \
               DIRECTION is 'forward' (default) or 'reverse'. Reverse\n            \
                         transmits the negated target position.\n\n{}",
            self.brief(),
            numeric_info()
        )
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
    ) -> Result<CommandOutput, CommandError> {
        let request = parse_request(args)?;
        let mut sequencer = DriveSequencer::new(env.sequencer);
        sequencer.initialize(ctx, env)?;
        sequencer.execute_move(&request, ctx, env)?;

        let report = sequencer.into_report();
        write_report(ctx, &report)?;
        Ok(CommandOutput::Report(report))
    }
}

fn parse_request(args: &[String]) -> Result<MotionRequest, CommandError> {
    let (position, velocity, direction) = match args {
        [p, v] => (p, v, Direction::Forward),
        [p, v, d] => (p, v, d.parse::<Direction>().map_err(CommandError::Usage)?),
        _ => {
            return Err(CommandError::Usage(format!(
                "'2' or '3' arguments expected, {} given.",
                args.len()
            )));
        }
    };

    let target_position = i32::try_from(parse_number(position).map_err(usage_error)?)
        .map_err(|_| CommandError::Usage(format!("Position '{position}' out of range")))?;
    let profile_velocity = u32::try_from(parse_number(velocity).map_err(usage_error)?)
        .map_err(|_| CommandError::Usage(format!("Velocity '{velocity}' out of range")))?;

    Ok(MotionRequest {
        target_position,
        direction,
        profile_velocity,
    })
}
