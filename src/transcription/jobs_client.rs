//! HTTP client for the subtitle transcription API.
//!
//! Provides methods for creating a transcription task and fetching one
//! result encoding. Polling policy lives in `job_service`.

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use super::{TaskId, TranscriptEncoding, TranscriptionError};
use crate::config::TranscriptionConfig;

const TASKS_PATH: &str = "/api/v1/subtitle/tasks";

/// Client for interacting with the subtitle tasks API.
pub struct SubtitleClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    upload_timeout: Duration,
    read_timeout: Duration,
}

/// Response from creating a new transcription task.
#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    id: serde_json::Value,
}

/// Outcome of a single result request that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultResponse {
    /// HTTP 200: the body is the transcript.
    Ready(String),
    /// Any other status: the task is still running (or unknown).
    NotReady(StatusCode),
}

/// Map a file extension to the MIME type sent with the upload.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "opus" => "audio/opus",
        "webm" => "audio/webm",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}

/// Task ids name the transcript files, so they must stay a single path component.
fn is_file_safe_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}

impl SubtitleClient {
    /// Create a client; the connect timeout applies to every request.
    pub fn new(config: &TranscriptionConfig) -> Result<Self, TranscriptionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| TranscriptionError::Misconfigured(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            upload_timeout: Duration::from_secs(config.upload_timeout_seconds),
            read_timeout: Duration::from_secs(config.read_timeout_seconds),
        })
    }

    fn tasks_url(&self) -> String {
        format!("{}{}", self.base_url, TASKS_PATH)
    }

    fn result_url(&self, task_id: &TaskId) -> String {
        format!("{}{}/{}/subtitle", self.base_url, TASKS_PATH, task_id)
    }

    /// Upload the audio file as a multipart attachment and return the task id.
    pub async fn create_task(&self, audio_path: &Path) -> Result<TaskId, TranscriptionError> {
        let file_data = fs::read(audio_path).await.map_err(|e| {
            TranscriptionError::UploadFailure(format!(
                "failed to read audio file {}: {}",
                audio_path.display(),
                e
            ))
        })?;

        let filename = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();

        let mime_type = audio_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| mime_type_for_extension(&e))
            .unwrap_or("application/octet-stream");

        let part = Part::bytes(file_data)
            .file_name(filename)
            .mime_str(mime_type)
            .map_err(|e| TranscriptionError::Misconfigured(e.to_string()))?;
        let form = Form::new().part("audio", part);

        debug!("Uploading {:?} to {}", audio_path, self.tasks_url());

        let response = self
            .client
            .post(self.tasks_url())
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::UploadFailure(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranscriptionError::UploadFailure(e.to_string()))?;

        if !status.is_success() {
            return Err(TranscriptionError::UploadFailure(format!(
                "task creation failed ({}): {}",
                status, body
            )));
        }

        let created: CreateTaskResponse = serde_json::from_str(&body).map_err(|e| {
            TranscriptionError::UploadFailure(format!("failed to parse task response: {}", e))
        })?;

        match created.id {
            serde_json::Value::String(id) if is_file_safe_id(&id) => Ok(TaskId::new(id)),
            serde_json::Value::Number(id) => Ok(TaskId::new(id.to_string())),
            other => Err(TranscriptionError::UploadFailure(format!(
                "task response carried an unusable id: {}",
                other
            ))),
        }
    }

    /// Issue one request for a result encoding.
    ///
    /// Transport failures are returned as-is so the poll loop can classify them.
    pub async fn fetch_result(
        &self,
        task_id: &TaskId,
        encoding: TranscriptEncoding,
    ) -> Result<ResultResponse, reqwest::Error> {
        let response = self
            .client
            .get(self.result_url(task_id))
            .query(&[("type", encoding.query_value())])
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.read_timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(ResultResponse::NotReady(status));
        }

        Ok(ResultResponse::Ready(response.text().await?))
    }
}
