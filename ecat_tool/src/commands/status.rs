//! `status` - read and decode the CiA 402 status word.

use crate::command::{Command, CommandEnv, CommandError, CommandOutput, expect_args};
use crate::context::ExecutionContext;
use ecat_common::drive::objects::STATUS_WORD;
use ecat_common::drive::state::PowerState;
use ecat_common::drive::words::StatusWord;
use tracing::warn;

/// Prints the status word and the power state it encodes.
pub struct StatusCommand;

impl Command for StatusCommand {
    fn name(&self) -> &'static str {
        "status"
    }

    fn brief(&self) -> &'static str {
        "Show the drive's power state."
    }

    fn description(&self) -> String {
        format!(
            "{}\n\n\
             Reads the status word (0x6041:00) of the selected slave and\n\
             decodes its CiA 402 power state.\n",
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
        let device = ctx.device(env.client)?;
        let status = StatusWord::from_reply(env.client.upload(&device, &STATUS_WORD)?)?;
        let raw = status.bits();
        if status.has_fault() {
            warn!(%device, "Drive reports a fault");
        }
        Ok(CommandOutput::Status {
            raw,
            state: PowerState::from_status(status),
        })
    }
}
