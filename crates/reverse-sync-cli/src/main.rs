mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use reverse_sync_config::Config;
use std::process::ExitCode;

use cli::{Cli, Commands};
use commands::Status;

/// Exit code for bad arguments and missing inputs, matching clap's usage errors.
const EXIT_INVALID: u8 = 2;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    // RUST_LOG, when set, takes precedence over -v
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let loaded = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    match loaded {
        Some(config) => Ok(config),
        None => {
            log::debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn run(cli: Cli) -> Result<Status> {
    let config = load_config(&cli)?;
    match cli.command {
        Commands::Verify(args) => commands::verify(args, &config),
        Commands::BatchVerify(args) => commands::batch_verify(args, &config),
        Commands::Roundtrip(command) => commands::roundtrip(command),
        Commands::Mapping(args) => commands::mapping(args),
        Commands::Patch(args) => commands::patch(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(Status::Pass) => ExitCode::SUCCESS,
        Ok(Status::Fail) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_INVALID)
        }
    }
}
