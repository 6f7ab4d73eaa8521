//! CLI handler for a full pipeline run.

use anyhow::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::app::run_pipeline;
use crate::cli::args::RunCliArgs;
use crate::cli::load_config;
use crate::meeting::{PipelineError, PipelineObserver, PipelinePhase};

/// Handle the run CLI command.
pub async fn handle_run_command(args: RunCliArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = args.out_dir {
        config.output.dir = dir;
    }

    let mut observers: Vec<Box<dyn PipelineObserver>> = Vec::new();
    if !args.no_progress {
        observers.push(Box::new(ProgressObserver::new()));
    }

    let run = run_pipeline(&config, &args.audio, observers).await?;

    println!("{}", run.report_path.display());
    Ok(())
}

/// Spinner showing the stage currently running.
pub struct ProgressObserver {
    pb: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        Self { pb }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn stage_message(phase: PipelinePhase) -> &'static str {
    match phase {
        PipelinePhase::Transcribe => "Transcribing audio...",
        PipelinePhase::DetailedMinutes => "Writing detailed minutes...",
        PipelinePhase::Summarize => "Summarizing...",
        PipelinePhase::ComposeReport => "Composing report...",
        PipelinePhase::Done => "Complete",
        PipelinePhase::Failed => "Failed",
    }
}

#[async_trait]
impl PipelineObserver for ProgressObserver {
    async fn stage_started(&self, phase: PipelinePhase) {
        self.pb.enable_steady_tick(Duration::from_millis(100));
        self.pb.set_message(stage_message(phase));
    }

    async fn run_failed(&self, phase: PipelinePhase, _error: &PipelineError) {
        self.pb
            .abandon_with_message(format!("Failed during {}", phase.as_str()));
    }

    async fn run_completed(&self, elapsed: Duration) {
        self.pb.finish_with_message(format!(
            "{} in {:.1}s",
            stage_message(PipelinePhase::Done),
            elapsed.as_secs_f64()
        ));
    }
}
