use anyhow::Context;
use press_core::{PressConfig, PressResult};

use super::args::*;
use crate::exit_codes;

pub mod build;
pub mod bundle;
pub mod clear;
pub mod fingerprint;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(&cli)?;
    match cli.cmd {
        Command::Build(args) => build::run(args, config).await,
        Command::Bundle(args) => bundle::run(args, config).await,
        Command::Fingerprint(args) => fingerprint::run(args, config).await,
        Command::Clear(args) => clear::run(args, config).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<PressConfig> {
    let config = match &cli.config {
        Some(path) => PressConfig::from_yaml_file(path)
            .and_then(PressConfig::merge_env)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => PressConfig::from_env().context("invalid PRESS_* environment")?,
    };
    Ok(match cli.cache {
        Some(strategy) => config.with_cache(strategy),
        None => config,
    })
}

/// Print a core error and pick the exit code for it.
pub(crate) fn report(result: PressResult<()>) -> i32 {
    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_retryable() {
                eprintln!("hint: nothing was cached; rerun once the sources are fixed");
            }
            exit_codes::for_error(&e)
        }
    }
}
