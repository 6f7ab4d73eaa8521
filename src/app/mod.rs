use crate::config::Config;
use crate::generation::OpenAIChatGenerator;
use crate::meeting::{LoggingObserver, Orchestrator, PipelineObserver, SystemClock};
use crate::storage::{ArtifactStore, FsArtifactStore};
use crate::transcription::{RemoteTranscriptionJobService, SubtitleClient};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub mod post_run;

pub use post_run::{PostRunCommand, PostRunStatus};

/// A run that reached `Done` and whose report is on disk.
#[derive(Debug)]
pub struct CompletedRun {
    pub task_id: String,
    pub report_path: PathBuf,
    pub report: String,
}

/// Wire the production collaborators from `config` and run the pipeline once.
pub async fn run_pipeline(
    config: &Config,
    audio_path: &Path,
    observers: Vec<Box<dyn PipelineObserver>>,
) -> Result<CompletedRun> {
    info!("Starting meetscribe run for {:?}", audio_path);

    let client = SubtitleClient::new(&config.transcription)
        .context("Failed to build transcription client")?;
    let transcription = Arc::new(RemoteTranscriptionJobService::new(
        client,
        config.transcription.poll_policy(),
    ));
    let generator = Arc::new(
        OpenAIChatGenerator::new(&config.generation)
            .context("Failed to build generation client")?,
    );
    let store = Arc::new(FsArtifactStore::new(
        config.output.dir.clone(),
        config.output.report_file.clone(),
    ));

    let mut orchestrator = Orchestrator::new(
        transcription,
        generator,
        store.clone(),
        Arc::new(SystemClock),
    )
    .with_observer(Box::new(LoggingObserver));
    for observer in observers {
        orchestrator = orchestrator.with_observer(observer);
    }

    let outcome = orchestrator.run(audio_path).await;
    if !outcome.is_done() {
        let stage = outcome
            .failed_stage
            .map(|phase| phase.as_str())
            .unwrap_or("unknown");
        return Err(match outcome.error {
            Some(e) => anyhow!(e).context(format!("Pipeline failed at {} stage", stage)),
            None => anyhow!("Pipeline stopped at {} stage", stage),
        });
    }

    let state = outcome.state;
    let report = state
        .final_report()
        .ok_or_else(|| anyhow!("Pipeline finished without a report"))?
        .to_string();
    let task_id = state
        .task_id()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let report_path = store
        .save_report(&report)
        .context("Failed to save meeting report")?;
    info!("Meeting report written to {:?}", report_path);

    let run = CompletedRun {
        task_id,
        report_path,
        report,
    };
    if let Some(command) = PostRunCommand::from_config(&config.output) {
        command.run(&run, audio_path).await;
    }

    Ok(run)
}
