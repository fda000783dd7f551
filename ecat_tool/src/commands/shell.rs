//! `shell` - interactive move loop.
//!
//! Initializes the drive once, asks for a profile velocity and a target
//! position, then reads direction codes until `0`, end of input or Ctrl-C.

use super::write_report;
use crate::command::{Command, CommandEnv, CommandError, CommandOutput, expect_args};
use crate::context::ExecutionContext;
use crate::sequencer::DriveSequencer;
use ecat_common::drive::motion::{Direction, MotionRequest};
use ecat_common::od::types::parse_number;
use std::io::{BufRead, Write};
use tracing::{info, warn};

const MENU: &str = "Direction (1 = reverse, 2 = forward, 3 = new parameters, 0 = quit):";

/// Interactive jog loop on the selected slave.
pub struct ShellCommand;

/// Move parameters entered by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Parameters {
    profile_velocity: u32,
    target_position: i32,
}

impl Parameters {
    fn request(self, direction: Direction) -> MotionRequest {
        MotionRequest {
            target_position: self.target_position,
            direction,
            profile_velocity: self.profile_velocity,
        }
    }
}

impl Command for ShellCommand {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn brief(&self) -> &'static str {
        "Move a drive interactively."
    }

    fn description(&self) -> String {
        format!(
            "{}\n\n\
             Initializes the drive, then asks for the profile velocity and\n\
             the target position. Afterwards each line selects an action:\n\n  \
               1  move in reverse (negated target position)\n  \
               2  move forward\n  \
               3  enter new parameters\n  \
               0  quit\n\n\
             End of input or Ctrl-C also quits. A failed move is reported\n\
             and the loop continues.\n",
            self.brief()
        )
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
    ) -> Result<CommandOutput, CommandError> {
        expect_args(args, 0)?;
        let mut sequencer = DriveSequencer::new(env.sequencer);
        sequencer.initialize(ctx, env)?;

        let Some(mut params) = prompt_parameters(env)? else {
            return finish(ctx, sequencer);
        };

        while !env.interrupted() {
            writeln!(env.output, "{MENU}")?;
            let Some(line) = read_line(env)? else {
                break;
            };
            // Ctrl-C while blocked in the read: drop the line.
            if env.interrupted() {
                break;
            }
            let direction = match line.as_str() {
                "1" => Direction::Reverse,
                "2" => Direction::Forward,
                "3" => match prompt_parameters(env)? {
                    Some(p) => {
                        params = p;
                        continue;
                    }
                    None => break,
                },
                "0" => break,
                _ => {
                    writeln!(env.output, "Only 1, 2, 3 or 0 options are permitted")?;
                    continue;
                }
            };

            let request = params.request(direction);
            match sequencer.execute_move(&request, ctx, env) {
                Ok(()) => {
                    if !ctx.is_quiet() {
                        if let Some(last) = sequencer.report().last() {
                            writeln!(env.output, "{:#06x} {}", last.status, last.state)?;
                        }
                    }
                }
                Err(e) => {
                    warn!("Move failed: {e}");
                    writeln!(env.output, "Move failed: {e}")?;
                }
            }
        }

        if env.interrupted() {
            info!("Interrupted, leaving shell");
        }
        finish(ctx, sequencer)
    }
}

fn finish(ctx: &ExecutionContext, sequencer: DriveSequencer) -> Result<CommandOutput, CommandError> {
    write_report(ctx, &sequencer.into_report())?;
    Ok(CommandOutput::None)
}

/// Ask for velocity and target position. `None` on end of input.
fn prompt_parameters(env: &mut CommandEnv<'_>) -> Result<Option<Parameters>, CommandError> {
    let Some(profile_velocity) = prompt_number(env, "Profile velocity:", |v| u32::try_from(v).ok())?
    else {
        return Ok(None);
    };
    let Some(target_position) = prompt_number(env, "Target position:", |v| i32::try_from(v).ok())?
    else {
        return Ok(None);
    };
    Ok(Some(Parameters {
        profile_velocity,
        target_position,
    }))
}

/// Prompt until a number accepted by `convert` is entered.
fn prompt_number<T>(
    env: &mut CommandEnv<'_>,
    prompt: &str,
    convert: impl Fn(i128) -> Option<T>,
) -> Result<Option<T>, CommandError> {
    loop {
        if env.interrupted() {
            return Ok(None);
        }
        writeln!(env.output, "{prompt}")?;
        let Some(line) = read_line(env)? else {
            return Ok(None);
        };
        if env.interrupted() {
            return Ok(None);
        }
        match parse_number(&line).ok().and_then(&convert) {
            Some(value) => return Ok(Some(value)),
            None => writeln!(env.output, "Invalid value '{line}'")?,
        }
    }
}

/// Next trimmed, non-empty input line. `None` on end of input.
fn read_line(env: &mut CommandEnv<'_>) -> Result<Option<String>, CommandError> {
    env.output.flush()?;
    let mut line = String::new();
    loop {
        line.clear();
        if env.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(Some(trimmed.to_string()));
        }
    }
}
