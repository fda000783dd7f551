//! `init` - bring a drive into "operation enabled".

use super::write_report;
use crate::command::{Command, CommandEnv, CommandError, CommandOutput, expect_args};
use crate::context::ExecutionContext;
use crate::sequencer::DriveSequencer;

/// Runs the initialization sequence on the selected slave.
pub struct InitCommand;

impl Command for InitCommand {
    fn name(&self) -> &'static str {
        "init"
    }

    fn brief(&self) -> &'static str {
        "Initialize a drive into operation enabled."
    }

    fn description(&self) -> String {
        format!(
            "{}\n\n\
             Writes the control words 0x00ff (fault reset), 0x0006 (shutdown),\n\
             0x0007 (switch on) and 0x000f (enable operation) to 0x6040:00,\n\
             reading the status word after each write.\n\n\
             With --force, transitions the status word does not confirm are\n\
             reported and skipped instead of aborting the sequence.\n\n\
             With --output-file, the sequence report is written as JSON.\n",
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

        let report = sequencer.into_report();
        write_report(ctx, &report)?;
        Ok(CommandOutput::Report(report))
    }
}
