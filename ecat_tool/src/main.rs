//! # ECAT Tool Binary
//!
//! Object dictionary access and CiA 402 drive sequencing from the command
//! line. Commands may be abbreviated to any unambiguous prefix or ordered
//! subsequence of their name.
//!
//! # Usage
//!
//! ```bash
//! # Read the status word of slave 0
//! ecat_tool upload -p 0 -t uint16 0x6041 0
//!
//! # Initialize the drive and move 50000 increments in reverse
//! ecat_tool move -p 0 50000 1000 reverse
//!
//! # Interactive jog loop with a custom configuration
//! ecat_tool --config tool.toml sh
//! ```

use clap::Parser;
use clap::error::ErrorKind;
use ecat_common::config::{ConfigError, ConfigLoader, LogLevel, ToolConfig};
use ecat_common::consts::{DEFAULT_CONFIG_PATH, SELECT_ALL};
use ecat_tool::clients::create_client;
use ecat_tool::command::CommandEnv;
use ecat_tool::commands::build_registry;
use ecat_tool::context::{ContextOptions, ExecutionContext, Verbosity};
use ecat_tool::{CommandOutput, ToolError};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;

/// ECAT Tool - object dictionary access and CiA 402 drive sequencing
#[derive(Parser, Debug)]
#[command(name = "ecat_tool")]
#[command(version)]
#[command(about = "Object dictionary access and CiA 402 drive sequencing")]
#[command(long_about = None)]
#[command(disable_help_flag = true)]
struct Args {
    /// Masters to select
    #[arg(short, long, default_value = SELECT_ALL, allow_hyphen_values = true)]
    master: String,

    /// Slave alias selector
    #[arg(short, long, default_value = SELECT_ALL, allow_hyphen_values = true)]
    alias: String,

    /// Slave position selector
    #[arg(short, long, default_value = SELECT_ALL, allow_hyphen_values = true)]
    position: String,

    /// Domain selector
    #[arg(short, long, default_value = SELECT_ALL, allow_hyphen_values = true)]
    domain: String,

    /// Data type of dictionary accesses
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    data_type: Option<String>,

    /// Write machine-readable output to this file
    #[arg(short, long, value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Output skin
    #[arg(short, long)]
    skin: Option<String>,

    /// Tool configuration (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Force a command
    #[arg(short, long)]
    force: bool,

    /// Output less information
    #[arg(short, long, overrides_with = "verbose")]
    quiet: bool,

    /// Output more information
    #[arg(short, long, overrides_with = "quiet")]
    verbose: bool,

    /// Show help
    #[arg(short, long)]
    help: bool,

    /// Command (may be abbreviated) followed by its arguments
    #[arg(value_name = "COMMAND", allow_negative_numbers = true)]
    command: Vec<String>,
}

impl Args {
    fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    fn context_options(&self) -> ContextOptions {
        ContextOptions {
            masters: self.master.clone(),
            positions: self.position.clone(),
            aliases: self.alias.clone(),
            domains: self.domain.clone(),
            data_type: self.data_type.clone(),
            output_file: self.output_file.clone(),
            skin: self.skin.clone(),
            verbosity: self.verbosity(),
            force: self.force,
        }
    }
}

/// Exit status of a successful run.
const EXIT_SUCCESS: u8 = 0;
/// Exit status of any failure.
const EXIT_FAILURE: u8 = 1;

/// Streams a run reads from and reports to.
struct Console<'a> {
    input: &'a mut dyn BufRead,
    output: &'a mut dyn Write,
    errors: &'a mut dyn Write,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayVersion | ErrorKind::DisplayHelp => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let config = load_config(args.config.as_deref());
    let log_level = config
        .as_ref()
        .map_or(LogLevel::default(), |c| c.shared.log_level);
    let log_json = config.as_ref().is_ok_and(|c| c.shared.log_json);
    setup_tracing(args.verbosity(), log_level, log_json);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received interrupt signal");
        flag.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to install Ctrl-C handler: {e}");
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let mut errors = io::stderr();
    let mut console = Console {
        input: &mut input,
        output: &mut output,
        errors: &mut errors,
    };

    match run(&args, &config, &binary_name(), running, &mut console) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("I/O error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve and run the requested command; returns the exit status.
fn run(
    args: &Args,
    config: &ToolConfig,
    binary: &str,
    running: Arc<AtomicBool>,
    console: &mut Console<'_>,
) -> io::Result<u8> {
    let registry = build_registry();

    let Some((token, command_args)) = args.command.split_first() else {
        if args.help {
            write!(console.output, "{}", registry.usage(binary))?;
            return Ok(EXIT_SUCCESS);
        }
        writeln!(
            console.errors,
            "Please specify a command!\n\n{}",
            registry.usage(binary)
        )?;
        return Ok(EXIT_FAILURE);
    };

    let command = match registry.resolve_one(token) {
        Ok(command) => command,
        Err(e) => {
            writeln!(console.errors, "{e}\n\n{}", registry.usage(binary))?;
            return Ok(EXIT_FAILURE);
        }
    };
    debug!(token = %token, command = command.name(), "Command resolved");

    if args.help {
        write!(console.output, "{}", command.help(binary))?;
        return Ok(EXIT_SUCCESS);
    }

    let ctx = match ExecutionContext::from_options(args.context_options()) {
        Ok(ctx) => ctx,
        Err(e) => {
            writeln!(console.errors, "{e}\n\n{}", command.help(binary))?;
            return Ok(EXIT_FAILURE);
        }
    };

    let mut client = match create_client(config) {
        Ok(client) => client,
        Err(e) => {
            writeln!(console.errors, "{e}")?;
            return Ok(EXIT_FAILURE);
        }
    };

    info!(
        service = %config.shared.service_name,
        command = command.name(),
        "Running command"
    );
    let result = {
        let mut env = CommandEnv {
            registry: &registry,
            client: client.as_mut(),
            sequencer: &config.sequencer,
            input: &mut *console.input,
            output: &mut *console.output,
            running,
        };
        command.execute(command_args, &ctx, &mut env)
    };

    match result {
        Ok(CommandOutput::None) => Ok(EXIT_SUCCESS),
        Ok(output) => {
            writeln!(console.output, "{output}")?;
            Ok(EXIT_SUCCESS)
        }
        Err(e) if e.is_usage() => {
            writeln!(console.errors, "{e}\n\n{}", command.help(binary))?;
            Ok(EXIT_FAILURE)
        }
        Err(e) => {
            writeln!(console.errors, "{e}")?;
            Ok(EXIT_FAILURE)
        }
    }
}

/// Load the configuration from `path`, or from the default location if it
/// exists, or fall back to defaults.
fn load_config(path: Option<&Path>) -> Result<ToolConfig, ToolError> {
    let config = match path {
        Some(path) => ToolConfig::load(path)?,
        None => match ToolConfig::load(Path::new(DEFAULT_CONFIG_PATH)) {
            Ok(config) => config,
            Err(ConfigError::FileNotFound) => ToolConfig::default(),
            Err(e) => return Err(e.into()),
        },
    };
    config.validate()?;
    Ok(config)
}

/// Base name the tool was invoked as, for usage and help texts.
fn binary_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ecat_tool".to_string())
}

/// Setup tracing subscriber; logs go to stderr so command output stays clean.
fn setup_tracing(verbosity: Verbosity, configured: LogLevel, json: bool) {
    let level = match verbosity {
        Verbosity::Quiet => Level::WARN,
        Verbosity::Verbose => Level::DEBUG,
        Verbosity::Normal => configured.into(),
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
}
