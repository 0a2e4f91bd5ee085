#![allow(special_module_name)]
use crate::lib::environment::{Environment, EnvironmentOverrides};
use crate::lib::error::FabgateResult;
use crate::lib::logger::{create_root_logger, LoggingMode};
use anyhow::Error;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

mod commands;
mod lib;
mod server;

/// Enrolls identities with a Fabric certificate authority and evaluates contract functions
/// on their behalf.
#[derive(Parser)]
#[command(name = "fabgate", version, arg_required_else_help = true)]
pub struct CliOpts {
    /// Displays detailed information about operations. -vv also shows protocol traces.
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppresses informational messages. -qq limits to errors only; -qqqq disables them all.
    #[arg(long, short, action = ArgAction::Count, global = true)]
    quiet: u8,

    /// The logging mode to use. You can log to stderr, a file, or both.
    #[arg(long = "log", default_value = "stderr", value_parser = ["stderr", "tee", "file"], global = true)]
    logmode: String,

    /// The file to log to, if logging to a file (see --log).
    #[arg(long, global = true)]
    logfile: Option<String>,

    /// The gateway configuration file.
    #[arg(long, env = "FABGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// The wallet directory, overriding the configuration.
    #[arg(long, global = true)]
    wallet: Option<PathBuf>,

    /// The connection profile, overriding the configuration.
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::FabgateCommand,
}

/// Setup a logger with the proper configuration, based on arguments.
fn setup_logging(opts: &CliOpts) -> std::io::Result<slog::Logger> {
    let verbose_level = opts.verbose as i64 - opts.quiet as i64;

    let mode = match opts.logmode.as_str() {
        "tee" => LoggingMode::Tee(PathBuf::from(opts.logfile.as_deref().unwrap_or("log.txt"))),
        "file" => LoggingMode::File(PathBuf::from(opts.logfile.as_deref().unwrap_or("log.txt"))),
        _ => LoggingMode::Stderr,
    };

    create_root_logger(verbose_level, mode)
}

fn print_error(err: Error) {
    for (level, cause) in err.chain().enumerate() {
        let prefix = if level == 0 { "Error" } else { "Caused by" };
        eprintln!("{prefix}: {cause}");
    }
}

fn inner_main() -> FabgateResult {
    let cli_opts = CliOpts::parse();
    let log = setup_logging(&cli_opts)?;

    let env = Environment::new(
        log,
        EnvironmentOverrides {
            config: cli_opts.config,
            wallet: cli_opts.wallet,
            profile: cli_opts.profile,
        },
    )?;
    slog::trace!(
        env.get_logger(),
        "Trace mode enabled. Lots of logs coming up."
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::exec(&env, cli_opts.command))
}

fn main() {
    let result = inner_main();
    if let Err(err) = result {
        print_error(err);
        std::process::exit(255);
    }
}
