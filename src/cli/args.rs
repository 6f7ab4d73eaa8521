use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meetscribe")]
#[command(about = "Turn a meeting recording into a Markdown report", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Transcribe a recording and write the meeting report
    Run(RunCliArgs),
    /// Inspect the configuration
    Config(ConfigCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct RunCliArgs {
    /// Path to the meeting audio file
    pub audio: PathBuf,
    /// Config file to use instead of the default location
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the output directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
    /// Disable the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ConfigCliArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration with secrets masked
    Show {
        /// Config file to use instead of the default location
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the default config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::parse_from([
            "meetscribe",
            "run",
            "meeting.wav",
            "--out-dir",
            "/tmp/out",
            "--no-progress",
            "-v",
        ]);

        assert!(cli.verbose);
        match cli.command {
            CliCommand::Run(args) => {
                assert_eq!(args.audio, PathBuf::from("meeting.wav"));
                assert_eq!(args.out_dir, Some(PathBuf::from("/tmp/out")));
                assert!(args.no_progress);
                assert!(args.config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::parse_from(["meetscribe", "config", "show", "--config", "a.toml"]);
        match cli.command {
            CliCommand::Config(ConfigCliArgs {
                command: ConfigCommand::Show { config },
            }) => assert_eq!(config, Some(PathBuf::from("a.toml"))),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_audio() {
        assert!(Cli::try_parse_from(["meetscribe", "run"]).is_err());
    }
}
