use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

pub mod args;
pub mod run;

pub use args::{Cli, CliCommand, ConfigCliArgs, ConfigCommand, RunCliArgs};
pub use run::{handle_run_command, ProgressObserver};

/// Load an explicit config file, or the default one (created if missing).
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

pub fn handle_config_command(args: ConfigCliArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show { config } => {
            let config = load_config(config.as_deref())?;
            let rendered = toml::to_string_pretty(&config.masked())
                .context("Failed to render config")?;
            println!("{}", rendered);
        }
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}
