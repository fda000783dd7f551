//! `download` - write one dictionary entry.

use super::{missing_type_error, usage_error};
use crate::command::{Command, CommandEnv, CommandError, CommandOutput, expect_args};
use crate::command_registry::numeric_info;
use crate::context::ExecutionContext;
use ecat_common::od::types::{
    DictionaryAddress, encode_value, format_hex, parse_index, parse_subindex,
};
use tracing::debug;

/// Writes `<VALUE>` to `<INDEX>:<SUBINDEX>` of the selected slave.
pub struct DownloadCommand;

impl Command for DownloadCommand {
    fn name(&self) -> &'static str {
        "download"
    }

    fn brief(&self) -> &'static str {
        "Write an SDO entry to a slave."
    }

    fn synopsis(&self) -> &'static str {
        "<INDEX> <SUBINDEX> <VALUE>"
    }

    fn description(&self) -> String {
        format!(
            "{}\n\n\
             This command requires a single slave to be selected.\n\n\
             The data type of the entry must be given with --type.\n\n\
             Arguments:\n  \
               INDEX    is the SDO index and must be an unsigned 16 bit number.\n  \
               SUBINDEX is the SDO entry subindex and must be an unsigned 8 bit number.\n  \
               VALUE    is the value to download and must correspond to the\n           \
                        entry's data type.\n\n{}",
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
        expect_args(args, 3)?;
        let data_type = ctx.data_type.ok_or_else(missing_type_error)?;
        let index = parse_index(&args[0]).map_err(usage_error)?;
        let subindex = parse_subindex(&args[1]).map_err(usage_error)?;
        let value = encode_value(&args[2], data_type).map_err(usage_error)?;
        let address = DictionaryAddress::new(index, subindex, data_type);

        let device = ctx.device(env.client)?;
        debug!(%device, %address, value = %format_hex(value), "Download");
        env.client.download(&device, &address, value)?;
        Ok(CommandOutput::None)
    }
}
