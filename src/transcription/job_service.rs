//! Transcription job service abstraction.
//!
//! Provides a trait for submitting audio to the remote transcription service
//! and collecting both transcript encodings, decoupled from CLI concerns.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::jobs_client::{ResultResponse, SubtitleClient};
use super::poll::{PollPolicy, Sleeper, TokioSleeper};
use super::{TaskId, TranscriptEncoding, Transcripts, TranscriptionError};

/// Attempts between two "still processing" log lines.
const PROGRESS_LOG_EVERY: u32 = 15;

/// Trait for submitting audio to a remote transcription service and getting results.
#[async_trait]
pub trait TranscriptionJobService: Send + Sync {
    async fn create_task(&self, audio_path: &Path) -> Result<TaskId, TranscriptionError>;

    /// Plain text is mandatory; a missing timed transcript comes back empty.
    async fn fetch_transcripts(&self, task_id: &TaskId) -> Result<Transcripts, TranscriptionError>;
}

/// Implementation that polls the subtitle API via `SubtitleClient`.
pub struct RemoteTranscriptionJobService {
    client: SubtitleClient,
    policy: PollPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RemoteTranscriptionJobService {
    pub fn new(client: SubtitleClient, policy: PollPolicy) -> Self {
        Self {
            client,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Poll one encoding until the service answers 200 or the attempt budget runs out.
    ///
    /// Returns `Ok(None)` when the budget is exhausted. Pending statuses and
    /// transport errors each cost one attempt. Rejected credentials and a
    /// request that cannot be built end the loop immediately.
    pub async fn await_result(
        &self,
        task_id: &TaskId,
        encoding: TranscriptEncoding,
    ) -> Result<Option<String>, TranscriptionError> {
        let max_attempts = self.policy.max_attempts;
        info!("Waiting for {} transcript of task {}", encoding, task_id);

        for attempt in 1..=max_attempts {
            match self.client.fetch_result(task_id, encoding).await {
                Ok(ResultResponse::Ready(text)) => {
                    info!(
                        "{} transcript ready after {} attempt(s): {} chars",
                        encoding,
                        attempt,
                        text.len()
                    );
                    return Ok(Some(text));
                }
                Ok(ResultResponse::NotReady(status)) if is_credential_rejection(status) => {
                    return Err(TranscriptionError::Rejected {
                        encoding,
                        status: status.as_u16(),
                    });
                }
                Ok(ResultResponse::NotReady(status)) => {
                    debug!(
                        "{} transcript not ready (HTTP {}, attempt {}/{})",
                        encoding, status, attempt, max_attempts
                    );
                }
                Err(e) if e.is_builder() => {
                    return Err(TranscriptionError::Misconfigured(e.to_string()));
                }
                Err(e) if e.is_timeout() => {
                    debug!(
                        "{} transcript request timed out (attempt {}/{})",
                        encoding, attempt, max_attempts
                    );
                }
                Err(e) => {
                    warn!(
                        "{} transcript request failed (attempt {}/{}): {}",
                        encoding, attempt, max_attempts, e
                    );
                }
            }

            if attempt == max_attempts {
                break;
            }

            if attempt % PROGRESS_LOG_EVERY == 0 {
                info!(
                    "Task {} still processing ({}/{})",
                    task_id, attempt, max_attempts
                );
            }
            self.sleeper.sleep(self.policy.interval).await;
        }

        warn!(
            "{} transcript of task {} not ready after {} attempts",
            encoding, task_id, max_attempts
        );
        Ok(None)
    }
}

fn is_credential_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[async_trait]
impl TranscriptionJobService for RemoteTranscriptionJobService {
    async fn create_task(&self, audio_path: &Path) -> Result<TaskId, TranscriptionError> {
        info!("Submitting file for transcription: {:?}", audio_path);
        let task_id = self.client.create_task(audio_path).await?;
        info!("Transcription task created: {}", task_id);
        Ok(task_id)
    }

    async fn fetch_transcripts(&self, task_id: &TaskId) -> Result<Transcripts, TranscriptionError> {
        let plain = self
            .await_result(task_id, TranscriptEncoding::Plain)
            .await?
            .filter(|text| !text.trim().is_empty())
            .ok_or(TranscriptionError::Timeout(TranscriptEncoding::Plain))?;

        let timed = match self.await_result(task_id, TranscriptEncoding::Timed).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!("No timed transcript for task {}, continuing with plain text only", task_id);
                String::new()
            }
            Err(e) => {
                warn!("Timed transcript unavailable for task {}: {}", task_id, e);
                String::new()
            }
        };

        Ok(Transcripts { plain, timed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranscriptionConfig;
    use crate::transcription::poll::CountingSleeper;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer, max_attempts: u32) -> (RemoteTranscriptionJobService, Arc<CountingSleeper>) {
        let config = TranscriptionConfig {
            base_url: server.uri(),
            ..Default::default()
        };
        service_with(config, max_attempts)
    }

    fn service_with(
        config: TranscriptionConfig,
        max_attempts: u32,
    ) -> (RemoteTranscriptionJobService, Arc<CountingSleeper>) {
        let sleeper = Arc::new(CountingSleeper::new());
        let service = RemoteTranscriptionJobService::new(
            SubtitleClient::new(&config).unwrap(),
            PollPolicy {
                max_attempts,
                interval: Duration::from_secs(2),
            },
        )
        .with_sleeper(sleeper.clone());
        (service, sleeper)
    }

    async fn mount_result(server: &MockServer, kind: &str, status: u16, body: &str, times: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path("/api/v1/subtitle/tasks/t1/subtitle"))
            .and(query_param("type", kind))
            .respond_with(ResponseTemplate::new(status).set_body_string(body));
        match times {
            Some(n) => mock.up_to_n_times(n).mount(server).await,
            None => mock.mount(server).await,
        }
    }

    #[tokio::test]
    async fn test_await_result_after_two_not_found() {
        let server = MockServer::start().await;
        mount_result(&server, "TXT", 404, "", Some(2)).await;
        mount_result(&server, "TXT", 200, "ABC", None).await;

        let (service, sleeper) = service_for(&server, 300);
        let text = service
            .await_result(&TaskId::new("t1"), TranscriptEncoding::Plain)
            .await
            .unwrap();

        assert_eq!(text.as_deref(), Some("ABC"));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
        assert_eq!(sleeper.calls(), 2);
    }

    #[tokio::test]
    async fn test_await_result_exhausts_budget() {
        let server = MockServer::start().await;
        mount_result(&server, "TXT", 404, "", None).await;

        let (service, sleeper) = service_for(&server, 5);
        let text = service
            .await_result(&TaskId::new("t1"), TranscriptEncoding::Plain)
            .await
            .unwrap();

        assert!(text.is_none());
        assert_eq!(server.received_requests().await.unwrap().len(), 5);
        assert_eq!(sleeper.calls(), 4);
    }

    #[tokio::test]
    async fn test_await_result_first_try_does_not_sleep() {
        let server = MockServer::start().await;
        mount_result(&server, "SRT", 200, "1\n00:00:00,000 --> 00:00:01,000\nHi\n", None).await;

        let (service, sleeper) = service_for(&server, 5);
        let text = service
            .await_result(&TaskId::new("t1"), TranscriptEncoding::Timed)
            .await
            .unwrap();

        assert!(text.unwrap().contains("-->"));
        assert_eq!(sleeper.calls(), 0);
    }

    #[tokio::test]
    async fn test_await_result_unauthorized_stops_immediately() {
        let server = MockServer::start().await;
        mount_result(&server, "TXT", 401, "", None).await;

        let (service, sleeper) = service_for(&server, 300);
        let err = service
            .await_result(&TaskId::new("t1"), TranscriptEncoding::Plain)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TranscriptionError::Rejected {
                encoding: TranscriptEncoding::Plain,
                status: 401
            }
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
        assert_eq!(sleeper.calls(), 0);
    }

    #[tokio::test]
    async fn test_await_result_server_error_is_retried() {
        let server = MockServer::start().await;
        mount_result(&server, "TXT", 503, "", Some(1)).await;
        mount_result(&server, "TXT", 200, "done", None).await;

        let (service, sleeper) = service_for(&server, 10);
        let text = service
            .await_result(&TaskId::new("t1"), TranscriptEncoding::Plain)
            .await
            .unwrap();

        assert_eq!(text.as_deref(), Some("done"));
        assert_eq!(sleeper.calls(), 1);
    }

    #[tokio::test]
    async fn test_await_result_read_timeout_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/subtitle/tasks/t1/subtitle"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_result(&server, "TXT", 200, "ok", None).await;

        let config = TranscriptionConfig {
            base_url: server.uri(),
            read_timeout_seconds: 1,
            ..Default::default()
        };
        let (service, sleeper) = service_with(config, 5);
        let text = service
            .await_result(&TaskId::new("t1"), TranscriptEncoding::Plain)
            .await
            .unwrap();

        assert_eq!(text.as_deref(), Some("ok"));
        assert_eq!(sleeper.calls(), 1);
    }

    #[tokio::test]
    async fn test_await_result_connection_refused_exhausts_budget() {
        let config = TranscriptionConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let (service, sleeper) = service_with(config, 3);
        let text = service
            .await_result(&TaskId::new("t1"), TranscriptEncoding::Plain)
            .await
            .unwrap();

        assert!(text.is_none());
        assert_eq!(sleeper.calls(), 2);
    }

    #[tokio::test]
    async fn test_await_result_invalid_base_url_stops_immediately() {
        let config = TranscriptionConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let (service, sleeper) = service_with(config, 300);
        let err = service
            .await_result(&TaskId::new("t1"), TranscriptEncoding::Plain)
            .await
            .unwrap_err();

        assert!(matches!(err, TranscriptionError::Misconfigured(_)));
        assert_eq!(sleeper.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_transcripts_timed_missing_is_not_fatal() {
        let server = MockServer::start().await;
        mount_result(&server, "TXT", 200, "Hello world", None).await;
        mount_result(&server, "SRT", 404, "", None).await;

        let (service, _) = service_for(&server, 3);
        let transcripts = service.fetch_transcripts(&TaskId::new("t1")).await.unwrap();

        assert_eq!(transcripts.plain, "Hello world");
        assert!(transcripts.timed.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_transcripts_timed_rejection_degrades() {
        let server = MockServer::start().await;
        mount_result(&server, "TXT", 200, "Hello world", None).await;
        mount_result(&server, "SRT", 403, "", None).await;

        let (service, _) = service_for(&server, 3);
        let transcripts = service.fetch_transcripts(&TaskId::new("t1")).await.unwrap();

        assert!(transcripts.timed.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_transcripts_plain_timeout_is_fatal() {
        let server = MockServer::start().await;
        mount_result(&server, "TXT", 404, "", None).await;
        mount_result(&server, "SRT", 200, "never fetched", None).await;

        let (service, _) = service_for(&server, 2);
        let err = service
            .fetch_transcripts(&TaskId::new("t1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TranscriptionError::Timeout(TranscriptEncoding::Plain)
        ));
        let requests = server.received_requests().await.unwrap();
        assert!(requests
            .iter()
            .all(|r| r.url.query().unwrap_or_default().contains("TXT")));
    }

    #[tokio::test]
    async fn test_fetch_transcripts_blank_plain_is_fatal() {
        let server = MockServer::start().await;
        mount_result(&server, "TXT", 200, "  \n", None).await;

        let (service, _) = service_for(&server, 2);
        let err = service
            .fetch_transcripts(&TaskId::new("t1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TranscriptionError::Timeout(TranscriptEncoding::Plain)
        ));
    }
}
