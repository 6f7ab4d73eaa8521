//! Meeting pipeline orchestrator.
//!
//! Runs the fixed stage sequence:
//! transcribe → detailed minutes → summarize → compose report → done
//!
//! Collaborators are injected via the constructor.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::error::PipelineError;
use super::observer::PipelineObserver;
use super::stages::{
    Clock, ComposeReportStage, DetailedMinutesStage, Stage, SummarizeStage, TranscribeStage,
};
use super::state::MeetingState;
use super::status::PipelinePhase;
use crate::generation::TextGenerator;
use crate::storage::ArtifactStore;
use crate::transcription::TranscriptionJobService;

/// Result of one pipeline run.
#[derive(Debug)]
pub struct RunOutcome {
    /// `Done` or `Failed`.
    pub phase: PipelinePhase,
    /// Stage that failed or could not start.
    pub failed_stage: Option<PipelinePhase>,
    pub error: Option<PipelineError>,
    /// Fields populated before a failure are kept.
    pub state: MeetingState,
}

impl RunOutcome {
    pub fn is_done(&self) -> bool {
        self.phase == PipelinePhase::Done
    }

    pub fn into_result(self) -> Result<MeetingState, PipelineError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.state),
        }
    }
}

pub struct Orchestrator {
    transcribe: TranscribeStage,
    detailed_minutes: DetailedMinutesStage,
    summarize: SummarizeStage,
    compose_report: ComposeReportStage,
    observers: Vec<Box<dyn PipelineObserver>>,
}

impl Orchestrator {
    pub fn new(
        transcription: Arc<dyn TranscriptionJobService>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn ArtifactStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transcribe: TranscribeStage::new(transcription, store),
            detailed_minutes: DetailedMinutesStage::new(generator.clone()),
            summarize: SummarizeStage::new(generator),
            compose_report: ComposeReportStage::new(clock),
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn PipelineObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn stage(&self, phase: PipelinePhase) -> Option<&dyn Stage> {
        match phase {
            PipelinePhase::Transcribe => Some(&self.transcribe),
            PipelinePhase::DetailedMinutes => Some(&self.detailed_minutes),
            PipelinePhase::Summarize => Some(&self.summarize),
            PipelinePhase::ComposeReport => Some(&self.compose_report),
            PipelinePhase::Done | PipelinePhase::Failed => None,
        }
    }

    /// Run every stage in order, stopping at the first failure.
    pub async fn run(&self, audio_path: impl Into<PathBuf>) -> RunOutcome {
        let started = Instant::now();
        let mut state = MeetingState::new(audio_path);
        info!("Starting meeting pipeline for {:?}", state.audio_path());

        if let Err(error) = check_audio(state.audio_path()).await {
            return self.fail(PipelinePhase::Transcribe, error, state).await;
        }

        let mut phase = PipelinePhase::Transcribe;
        while let Some(stage) = self.stage(phase) {
            for observer in &self.observers {
                observer.stage_started(phase).await;
            }

            debug!("Running {} stage", stage.phase().as_str());
            let stage_started = Instant::now();
            if let Err(error) = stage.run(&mut state).await {
                return self.fail(phase, error, state).await;
            }

            for observer in &self.observers {
                observer
                    .stage_finished(phase, stage_started.elapsed())
                    .await;
            }
            phase = phase.next();
        }

        for observer in &self.observers {
            observer.run_completed(started.elapsed()).await;
        }

        RunOutcome {
            phase,
            failed_stage: None,
            error: None,
            state,
        }
    }

    async fn fail(
        &self,
        phase: PipelinePhase,
        error: PipelineError,
        state: MeetingState,
    ) -> RunOutcome {
        for observer in &self.observers {
            observer.run_failed(phase, &error).await;
        }

        RunOutcome {
            phase: PipelinePhase::Failed,
            failed_stage: Some(phase),
            error: Some(error),
            state,
        }
    }
}

/// The audio must be an openable regular file before any stage runs.
async fn check_audio(path: &Path) -> Result<(), PipelineError> {
    let unavailable = |source| PipelineError::AudioUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(unavailable)?;
    let metadata = file.metadata().await.map_err(unavailable)?;
    if !metadata.is_file() {
        return Err(unavailable(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::stages::FixedClock;
    use crate::transcription::{TaskId, TranscriptEncoding, Transcripts, TranscriptionError};
    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Transcription stub returning canned results.
    struct StubTranscription {
        result: fn() -> Result<Transcripts, TranscriptionError>,
        create_calls: AtomicUsize,
    }

    impl StubTranscription {
        fn new(result: fn() -> Result<Transcripts, TranscriptionError>) -> Self {
            Self {
                result,
                create_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranscriptionJobService for StubTranscription {
        async fn create_task(&self, _audio_path: &Path) -> Result<TaskId, TranscriptionError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(TaskId::new("task-1"))
        }

        async fn fetch_transcripts(&self, _task_id: &TaskId) -> Result<Transcripts, TranscriptionError> {
            (self.result)()
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn generate(&self, _system_prompt: &str, user_content: &str) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push(user_content.to_string());
            Ok(format!("out({})", user_content))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        transcripts: Mutex<Vec<TaskId>>,
    }

    impl ArtifactStore for MemoryStore {
        fn save_transcripts(
            &self,
            task_id: &TaskId,
            _transcripts: &Transcripts,
        ) -> Result<Vec<PathBuf>, PipelineError> {
            self.transcripts.lock().unwrap().push(task_id.clone());
            Ok(Vec::new())
        }

        fn save_report(&self, _report: &str) -> Result<PathBuf, PipelineError> {
            Ok(PathBuf::from("/dev/null"))
        }
    }

    /// Observer recording boundary events as strings.
    #[derive(Clone, Default)]
    struct EventLog(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl PipelineObserver for EventLog {
        async fn stage_started(&self, phase: PipelinePhase) {
            self.0.lock().unwrap().push(format!("start:{}", phase.as_str()));
        }

        async fn stage_finished(&self, phase: PipelinePhase, _elapsed: Duration) {
            self.0.lock().unwrap().push(format!("end:{}", phase.as_str()));
        }

        async fn run_failed(&self, phase: PipelinePhase, _error: &PipelineError) {
            self.0.lock().unwrap().push(format!("failed:{}", phase.as_str()));
        }

        async fn run_completed(&self, _elapsed: Duration) {
            self.0.lock().unwrap().push("completed".to_string());
        }
    }

    fn audio_fixture() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(b"RIFF").unwrap();
        file
    }

    fn orchestrator(
        transcription: Arc<StubTranscription>,
        generator: Arc<RecordingGenerator>,
        log: EventLog,
    ) -> Orchestrator {
        let clock = FixedClock(Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
        Orchestrator::new(
            transcription,
            generator,
            Arc::new(MemoryStore::default()),
            Arc::new(clock),
        )
        .with_observer(Box::new(log))
    }

    fn plain_only() -> Result<Transcripts, TranscriptionError> {
        Ok(Transcripts {
            plain: "Hello world".to_string(),
            timed: String::new(),
        })
    }

    fn plain_timeout() -> Result<Transcripts, TranscriptionError> {
        Err(TranscriptionError::Timeout(TranscriptEncoding::Plain))
    }

    #[tokio::test]
    async fn test_run_reaches_done_in_order() {
        let generator = Arc::new(RecordingGenerator::default());
        let log = EventLog::default();
        let orchestrator = orchestrator(
            Arc::new(StubTranscription::new(plain_only)),
            generator.clone(),
            log.clone(),
        );
        let audio = audio_fixture();

        let outcome = orchestrator.run(audio.path()).await;

        assert!(outcome.is_done());
        assert!(outcome.error.is_none());
        assert!(!outcome.state.final_report().unwrap().is_empty());
        assert_eq!(
            *log.0.lock().unwrap(),
            vec![
                "start:transcribe",
                "end:transcribe",
                "start:detailed_minutes",
                "end:detailed_minutes",
                "start:summarize",
                "end:summarize",
                "start:compose_report",
                "end:compose_report",
                "completed",
            ]
        );
        // Minutes fall back to the plain transcript, then the summary reads it too.
        assert_eq!(
            *generator.calls.lock().unwrap(),
            vec!["Hello world", "Hello world"]
        );
    }

    #[tokio::test]
    async fn test_plain_timeout_fails_before_generation() {
        let generator = Arc::new(RecordingGenerator::default());
        let log = EventLog::default();
        let orchestrator = orchestrator(
            Arc::new(StubTranscription::new(plain_timeout)),
            generator.clone(),
            log.clone(),
        );
        let audio = audio_fixture();

        let outcome = orchestrator.run(audio.path()).await;

        assert_eq!(outcome.phase, PipelinePhase::Failed);
        assert_eq!(outcome.failed_stage, Some(PipelinePhase::Transcribe));
        assert!(matches!(
            outcome.error,
            Some(PipelineError::TranscriptionTimeout(TranscriptEncoding::Plain))
        ));
        assert!(generator.calls.lock().unwrap().is_empty());
        assert!(outcome.state.plain_transcript().is_none());
        assert_eq!(
            *log.0.lock().unwrap(),
            vec!["start:transcribe", "failed:transcribe"]
        );
    }

    #[tokio::test]
    async fn test_missing_audio_fails_before_any_stage() {
        let transcription = Arc::new(StubTranscription::new(plain_only));
        let log = EventLog::default();
        let orchestrator = orchestrator(
            transcription.clone(),
            Arc::new(RecordingGenerator::default()),
            log.clone(),
        );

        let outcome = orchestrator.run("/nonexistent/meeting.wav").await;

        assert_eq!(outcome.phase, PipelinePhase::Failed);
        assert!(matches!(
            outcome.error,
            Some(PipelineError::AudioUnavailable { .. })
        ));
        assert_eq!(transcription.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(*log.0.lock().unwrap(), vec!["failed:transcribe"]);
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn generate(&self, _system_prompt: &str, _user_content: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("model overloaded"))
        }
    }

    #[tokio::test]
    async fn test_generation_failure_stops_later_stages() {
        let log = EventLog::default();
        let orchestrator = Orchestrator::new(
            Arc::new(StubTranscription::new(plain_only)),
            Arc::new(FailingGenerator),
            Arc::new(MemoryStore::default()),
            Arc::new(crate::meeting::stages::SystemClock),
        )
        .with_observer(Box::new(log.clone()));
        let audio = audio_fixture();

        let outcome = orchestrator.run(audio.path()).await;

        assert_eq!(outcome.failed_stage, Some(PipelinePhase::DetailedMinutes));
        assert!(matches!(outcome.error, Some(PipelineError::GenerationFailure(_))));
        assert_eq!(outcome.state.plain_transcript(), Some("Hello world"));
        assert!(outcome.state.summary().is_none());
        assert!(outcome.state.final_report().is_none());
        assert_eq!(
            log.0.lock().unwrap().last().map(String::as_str),
            Some("failed:detailed_minutes")
        );
    }

    #[tokio::test]
    async fn test_directory_is_not_audio() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            Arc::new(StubTranscription::new(plain_only)),
            Arc::new(RecordingGenerator::default()),
            EventLog::default(),
        );

        let outcome = orchestrator.run(dir.path()).await;
        assert!(matches!(
            outcome.into_result(),
            Err(PipelineError::AudioUnavailable { .. })
        ));
    }
}
