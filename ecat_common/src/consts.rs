//! System-wide constants for the ecat workspace.
//!
//! Single source of truth for defaults shared by the library and the tool.

/// Selector value meaning "all" (masters, aliases, positions, domains).
pub const SELECT_ALL: &str = "-";

/// Default per-access timeout for dictionary uploads/downloads.
pub const DEFAULT_ACCESS_TIMEOUT_MS: u64 = 1000;

/// Default number of status word polls while verifying a power transition.
pub const DEFAULT_MAX_STATUS_POLLS: u32 = 10;

/// Default pause between two status word polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Default number of accesses the simulated master keeps in its journal.
pub const DEFAULT_JOURNAL_LIMIT: usize = 4096;

/// Default dictionary client driver.
pub const DEFAULT_DRIVER: &str = "simulation";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ecat/tool.toml";

/// Service name used when no configuration overrides it.
pub const TOOL_SERVICE_NAME: &str = "ecat_tool";
