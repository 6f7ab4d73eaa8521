//! Client side of the remote subtitle transcription service.
//!
//! A run creates one task per audio file, then polls two result encodings
//! (plain text and timed SRT) until the service reports them ready.

use std::fmt;
use thiserror::Error;

pub mod job_service;
pub mod jobs_client;
pub mod poll;

pub use job_service::{RemoteTranscriptionJobService, TranscriptionJobService};
pub use jobs_client::{mime_type_for_extension, ResultResponse, SubtitleClient};
pub use poll::{CountingSleeper, PollPolicy, Sleeper, TokioSleeper};

/// Opaque job identifier assigned by the transcription service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result encodings exposed by the subtitle endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptEncoding {
    /// Un-timestamped full text (`type=TXT`).
    Plain,
    /// SRT subtitles with per-utterance time ranges (`type=SRT`).
    Timed,
}

impl TranscriptEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Timed => "timed",
        }
    }

    /// Value of the `type` query parameter.
    pub fn query_value(&self) -> &'static str {
        match self {
            Self::Plain => "TXT",
            Self::Timed => "SRT",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Plain => "txt",
            Self::Timed => "srt",
        }
    }
}

impl fmt::Display for TranscriptEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both transcript encodings of one task. `timed` is empty when the
/// service never delivered it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcripts {
    pub plain: String,
    pub timed: String,
}

impl Transcripts {
    pub fn has_timed(&self) -> bool {
        !self.timed.trim().is_empty()
    }
}

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("Audio upload failed: {0}")]
    UploadFailure(String),

    #[error("Timed out waiting for the {0} transcript")]
    Timeout(TranscriptEncoding),

    #[error("Transcription service rejected the credentials while fetching the {encoding} transcript (HTTP {status})")]
    Rejected {
        encoding: TranscriptEncoding,
        status: u16,
    },

    #[error("Transcription client misconfigured: {0}")]
    Misconfigured(String),
}
