//! Durable output of a run: transcripts keyed by task id and the final report.

use std::path::PathBuf;
use tracing::info;

use crate::meeting::PipelineError;
use crate::transcription::{TaskId, TranscriptEncoding, Transcripts};

pub trait ArtifactStore: Send + Sync {
    /// Persist both transcripts. An empty timed transcript is skipped.
    fn save_transcripts(
        &self,
        task_id: &TaskId,
        transcripts: &Transcripts,
    ) -> Result<Vec<PathBuf>, PipelineError>;

    /// Persist the final report at the store's well-known report path.
    fn save_report(&self, report: &str) -> Result<PathBuf, PipelineError>;
}

/// Writes artifacts into a single output directory.
pub struct FsArtifactStore {
    dir: PathBuf,
    report_file: String,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, report_file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            report_file: report_file.into(),
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(&self.report_file)
    }

    fn write(&self, path: PathBuf, contents: &str) -> Result<PathBuf, PipelineError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PipelineError::Storage {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, contents).map_err(|source| PipelineError::Storage {
            path: path.clone(),
            source,
        })?;
        info!("Saved {:?} ({} bytes)", path, contents.len());
        Ok(path)
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save_transcripts(
        &self,
        task_id: &TaskId,
        transcripts: &Transcripts,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let mut saved = Vec::with_capacity(2);

        let plain_path = self.dir.join(format!(
            "{}.{}",
            task_id,
            TranscriptEncoding::Plain.file_extension()
        ));
        saved.push(self.write(plain_path, &transcripts.plain)?);

        if transcripts.has_timed() {
            let timed_path = self.dir.join(format!(
                "{}.{}",
                task_id,
                TranscriptEncoding::Timed.file_extension()
            ));
            saved.push(self.write(timed_path, &transcripts.timed)?);
        }

        Ok(saved)
    }

    fn save_report(&self, report: &str) -> Result<PathBuf, PipelineError> {
        self.write(self.report_path(), report)
    }
}
