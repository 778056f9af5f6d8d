//! The `planets` binary.

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use planets_app::platform::PlatformDirs;
use planets_app::{AppError, run};
use planets_config::{CliArgs, Config};
use tracing::error;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match start(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let chain = error_chain(&err);
            error!(error = %chain, "planets failed");
            eprintln!("error: {chain}");
            ExitCode::FAILURE
        }
    }
}

fn start(args: &CliArgs) -> Result<(), AppError> {
    let dirs = PlatformDirs::resolve_with_override(args.config_dir.as_deref())?;
    dirs.create_dirs()?;

    let config = match Config::load_or_create(&dirs.config_dir) {
        Ok(mut config) => {
            config.apply_cli_overrides(args);
            config
        }
        Err(err) => {
            planets_log::init_logging(None, false, None);
            return Err(err.into());
        }
    };
    planets_log::init_logging(
        Some(&dirs.log_dir),
        cfg!(debug_assertions),
        Some(&config),
    );
    tracing::info!(config_dir = %dirs.config_dir.display(), "planets starting");

    run(&config, args)?;
    Ok(())
}

/// `err` followed by each of its sources, separated by ": ".
fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // thiserror messages often embed their source already.
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
