//! `upload` - read one dictionary entry.

use super::{missing_type_error, usage_error};
use crate::command::{Command, CommandEnv, CommandError, CommandOutput, expect_args};
use crate::command_registry::numeric_info;
use crate::context::ExecutionContext;
use ecat_common::od::types::{DictionaryAddress, format_hex, parse_index, parse_subindex};
use tracing::debug;

/// Reads `<INDEX>:<SUBINDEX>` from the selected slave.
pub struct UploadCommand;

impl Command for UploadCommand {
    fn name(&self) -> &'static str {
        "upload"
    }

    fn brief(&self) -> &'static str {
        "Read an SDO entry from a slave."
    }

    fn synopsis(&self) -> &'static str {
        "<INDEX> <SUBINDEX>"
    }

    fn description(&self) -> String {
        format!(
            "{}\n\n\
             This command requires a single slave to be selected.\n\n\
             The data type of the entry must be given with --type. The value\n\
             is printed in hexadecimal, padded to the type's width, followed\n\
             by its decimal interpretation.\n\n\
             Arguments:\n  \
               INDEX    is the SDO index and must be an unsigned 16 bit number.\n  \
               SUBINDEX is the SDO entry subindex and must be an unsigned 8 bit number.\n\n{}",
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
        expect_args(args, 2)?;
        let data_type = ctx.data_type.ok_or_else(missing_type_error)?;
        let index = parse_index(&args[0]).map_err(usage_error)?;
        let subindex = parse_subindex(&args[1]).map_err(usage_error)?;
        let address = DictionaryAddress::new(index, subindex, data_type);

        let device = ctx.device(env.client)?;
        let raw = env.client.upload(&device, &address)?;
        debug!(%device, %address, value = %format_hex(raw), "Upload");
        Ok(CommandOutput::Value { address, raw })
    }
}
