//! The record threaded through the pipeline stages.
//!
//! Every output field is write-once: a stage that tries to write a field a
//! previous stage already populated gets `PipelineError::AlreadyWritten`.

use std::fmt;
use std::path::{Path, PathBuf};

use super::error::PipelineError;
use crate::transcription::{TaskId, Transcripts};

/// Names of the stage-owned fields, used in contract-violation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    TaskId,
    PlainTranscript,
    TimedTranscript,
    DetailedMinutes,
    Summary,
    FinalReport,
}

impl StateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskId => "task_id",
            Self::PlainTranscript => "plain_transcript",
            Self::TimedTranscript => "timed_transcript",
            Self::DetailedMinutes => "detailed_minutes",
            Self::Summary => "summary",
            Self::FinalReport => "final_report",
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MeetingState {
    audio_path: PathBuf,
    task_id: Option<TaskId>,
    plain_transcript: Option<String>,
    timed_transcript: Option<String>,
    detailed_minutes: Option<String>,
    summary: Option<String>,
    final_report: Option<String>,
}

fn write_once<T>(slot: &mut Option<T>, field: StateField, value: T) -> Result<(), PipelineError> {
    if slot.is_some() {
        return Err(PipelineError::AlreadyWritten(field));
    }
    *slot = Some(value);
    Ok(())
}

impl MeetingState {
    pub fn new(audio_path: impl Into<PathBuf>) -> Self {
        Self {
            audio_path: audio_path.into(),
            task_id: None,
            plain_transcript: None,
            timed_transcript: None,
            detailed_minutes: None,
            summary: None,
            final_report: None,
        }
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    pub fn plain_transcript(&self) -> Option<&str> {
        self.plain_transcript.as_deref()
    }

    /// Written (possibly empty) by the Transcribe stage.
    pub fn timed_transcript(&self) -> Option<&str> {
        self.timed_transcript.as_deref()
    }

    pub fn detailed_minutes(&self) -> Option<&str> {
        self.detailed_minutes.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn final_report(&self) -> Option<&str> {
        self.final_report.as_deref()
    }

    /// Record the Transcribe stage outputs. All three fields are written together.
    pub fn record_transcription(
        &mut self,
        task_id: TaskId,
        transcripts: Transcripts,
    ) -> Result<(), PipelineError> {
        if self.task_id.is_some() {
            return Err(PipelineError::AlreadyWritten(StateField::TaskId));
        }
        if self.plain_transcript.is_some() {
            return Err(PipelineError::AlreadyWritten(StateField::PlainTranscript));
        }
        if self.timed_transcript.is_some() {
            return Err(PipelineError::AlreadyWritten(StateField::TimedTranscript));
        }

        self.task_id = Some(task_id);
        self.plain_transcript = Some(transcripts.plain);
        self.timed_transcript = Some(transcripts.timed);
        Ok(())
    }

    pub fn record_detailed_minutes(&mut self, minutes: String) -> Result<(), PipelineError> {
        write_once(&mut self.detailed_minutes, StateField::DetailedMinutes, minutes)
    }

    pub fn record_summary(&mut self, summary: String) -> Result<(), PipelineError> {
        write_once(&mut self.summary, StateField::Summary, summary)
    }

    pub fn record_final_report(&mut self, report: String) -> Result<(), PipelineError> {
        write_once(&mut self.final_report, StateField::FinalReport, report)
    }
}
