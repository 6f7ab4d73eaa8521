//! Error types for the meeting pipeline.

use std::path::PathBuf;
use thiserror::Error;

use super::state::StateField;
use crate::transcription::{TranscriptEncoding, TranscriptionError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio file unavailable at {path}: {source}")]
    AudioUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Audio upload failed: {0}")]
    UploadFailure(String),

    #[error("Transcription timed out waiting for the {0} transcript")]
    TranscriptionTimeout(TranscriptEncoding),

    #[error("Transcription service rejected the credentials for the {encoding} transcript (HTTP {status})")]
    TranscriptionRejected {
        encoding: TranscriptEncoding,
        status: u16,
    },

    #[error("Transcription client misconfigured: {0}")]
    TranscriptionMisconfigured(String),

    #[error("Text generation failed: {0}")]
    GenerationFailure(String),

    #[error("Failed to write {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stage input {0} has not been populated")]
    MissingInput(StateField),

    #[error("Meeting state field {0} was already written")]
    AlreadyWritten(StateField),
}

impl PipelineError {
    /// Errors that indicate broken stage wiring rather than a runtime failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::MissingInput(_) | Self::AlreadyWritten(_))
    }
}

impl From<TranscriptionError> for PipelineError {
    fn from(err: TranscriptionError) -> Self {
        match err {
            TranscriptionError::UploadFailure(message) => Self::UploadFailure(message),
            TranscriptionError::Timeout(encoding) => Self::TranscriptionTimeout(encoding),
            TranscriptionError::Rejected { encoding, status } => {
                Self::TranscriptionRejected { encoding, status }
            }
            TranscriptionError::Misconfigured(message) => Self::TranscriptionMisconfigured(message),
        }
    }
}
