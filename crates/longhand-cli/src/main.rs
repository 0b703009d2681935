//! Longhand CLI: long arithmetic in the terminal
//!
//! ## Usage
//!
//! ```bash
//! longhand calc 945/5                 # Extended long division
//! longhand calc 945/5 --mode short    # Short division
//! longhand calc 100-99 --animate      # Watch the borrows happen
//! longhand factor 360                 # 2^3×3^2×5
//! longhand sqrt 2                     # 1,4142
//! longhand history                    # Recorded operations
//! longhand replay 0                   # Redraw the most recent one
//! ```

use clap::Parser;
use longhand_cli::{Cli, CliConfig, CliError, CliResult, ColorChoice, Runner, Verbosity};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_reported() => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| CliError::runtime(format!("Failed to create runtime: {e}")))?;
    let runner = Runner::new(config)?;
    runtime.block_on(runner.execute(cli.command))
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_config_file(cli.config.clone())
        .with_data_dir(&cli.data_dir)
        .with_log_json(cli.log_json)
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flags
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_directive()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    let installed = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = installed {
        eprintln!("Warning: logging unavailable: {e}");
    }
}
