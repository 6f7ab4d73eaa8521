//! The four pipeline stages.
//!
//! Each stage reads some `MeetingState` fields and writes others:
//!
//! | stage           | reads                               | writes                                   |
//! |-----------------|-------------------------------------|------------------------------------------|
//! | Transcribe      | audio_path                          | task_id, plain_transcript, timed_transcript |
//! | DetailedMinutes | timed_transcript or plain_transcript | detailed_minutes                         |
//! | Summarize       | plain_transcript                    | summary                                  |
//! | ComposeReport   | summary, detailed_minutes           | final_report                             |

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::PipelineError;
use super::state::{MeetingState, StateField};
use super::status::PipelinePhase;
use crate::generation::TextGenerator;
use crate::prompts::{DETAILED_MINUTES_SYSTEM, SUMMARY_SYSTEM};
use crate::storage::ArtifactStore;
use crate::transcription::{TranscriptEncoding, TranscriptionJobService};

#[async_trait]
pub trait Stage: Send + Sync {
    fn phase(&self) -> PipelinePhase;

    async fn run(&self, state: &mut MeetingState) -> Result<(), PipelineError>;
}

/// Source of the report timestamp, allowing a frozen clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

pub struct TranscribeStage {
    transcription: Arc<dyn TranscriptionJobService>,
    store: Arc<dyn ArtifactStore>,
}

impl TranscribeStage {
    pub fn new(
        transcription: Arc<dyn TranscriptionJobService>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            transcription,
            store,
        }
    }
}

#[async_trait]
impl Stage for TranscribeStage {
    fn phase(&self) -> PipelinePhase {
        PipelinePhase::Transcribe
    }

    async fn run(&self, state: &mut MeetingState) -> Result<(), PipelineError> {
        let task_id = self.transcription.create_task(state.audio_path()).await?;
        let transcripts = self.transcription.fetch_transcripts(&task_id).await?;

        if transcripts.plain.trim().is_empty() {
            return Err(PipelineError::TranscriptionTimeout(TranscriptEncoding::Plain));
        }

        self.store.save_transcripts(&task_id, &transcripts)?;

        let preview: String = transcripts.plain.chars().take(200).collect();
        debug!("Transcript preview: {}", preview);

        state.record_transcription(task_id, transcripts)
    }
}

pub struct DetailedMinutesStage {
    generator: Arc<dyn TextGenerator>,
}

impl DetailedMinutesStage {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

/// Timed content wins whenever it is present: the minutes table needs its time ranges.
fn minutes_source(state: &MeetingState) -> Result<(TranscriptEncoding, &str), PipelineError> {
    if let Some(timed) = state.timed_transcript().filter(|t| !t.trim().is_empty()) {
        return Ok((TranscriptEncoding::Timed, timed));
    }
    state
        .plain_transcript()
        .map(|plain| (TranscriptEncoding::Plain, plain))
        .ok_or(PipelineError::MissingInput(StateField::PlainTranscript))
}

#[async_trait]
impl Stage for DetailedMinutesStage {
    fn phase(&self) -> PipelinePhase {
        PipelinePhase::DetailedMinutes
    }

    async fn run(&self, state: &mut MeetingState) -> Result<(), PipelineError> {
        let (encoding, content) = minutes_source(state)?;
        info!(
            "Generating detailed minutes from {} transcript via {}",
            encoding,
            self.generator.name()
        );

        let minutes = self
            .generator
            .generate(DETAILED_MINUTES_SYSTEM, content)
            .await
            .map_err(|e| PipelineError::GenerationFailure(format!("{:#}", e)))?;

        state.record_detailed_minutes(minutes)
    }
}

pub struct SummarizeStage {
    generator: Arc<dyn TextGenerator>,
}

impl SummarizeStage {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Stage for SummarizeStage {
    fn phase(&self) -> PipelinePhase {
        PipelinePhase::Summarize
    }

    async fn run(&self, state: &mut MeetingState) -> Result<(), PipelineError> {
        let content = state
            .plain_transcript()
            .ok_or(PipelineError::MissingInput(StateField::PlainTranscript))?;

        info!("Generating summary via {}", self.generator.name());
        let summary = self
            .generator
            .generate(SUMMARY_SYSTEM, content)
            .await
            .map_err(|e| PipelineError::GenerationFailure(format!("{:#}", e)))?;

        state.record_summary(summary)
    }
}

pub struct ComposeReportStage {
    clock: Arc<dyn Clock>,
}

impl ComposeReportStage {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Assemble the report. Pure apart from the supplied timestamp.
pub fn compose_report(summary: &str, detailed_minutes: &str, generated_at: DateTime<Local>) -> String {
    format!(
        "# 📑 Meeting Report\n\n---\n\n{summary}\n\n---\n\n{detailed_minutes}\n\n---\n\n\
         *This report was generated automatically by meetscribe*\n\
         *Generated at: {}*\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )
}

#[async_trait]
impl Stage for ComposeReportStage {
    fn phase(&self) -> PipelinePhase {
        PipelinePhase::ComposeReport
    }

    async fn run(&self, state: &mut MeetingState) -> Result<(), PipelineError> {
        let summary = state
            .summary()
            .ok_or(PipelineError::MissingInput(StateField::Summary))?;
        let detailed_minutes = state
            .detailed_minutes()
            .ok_or(PipelineError::MissingInput(StateField::DetailedMinutes))?;

        let report = compose_report(summary, detailed_minutes, self.clock.now());
        info!("Report composed: {} chars", report.len());

        state.record_final_report(report)
    }
}
