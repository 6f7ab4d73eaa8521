use anyhow::Result;
use clap::Parser;
use meetscribe::cli::{handle_config_command, handle_run_command, Cli, CliCommand};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        CliCommand::Run(args) => handle_run_command(args).await,
        CliCommand::Config(args) => handle_config_command(args),
        CliCommand::Version => {
            println!("meetscribe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
