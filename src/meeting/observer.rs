//! Stage boundary notifications, kept out of the orchestration logic.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info};

use super::error::PipelineError;
use super::status::PipelinePhase;

/// Receives a callback at every stage boundary. All methods default to no-ops.
#[async_trait]
pub trait PipelineObserver: Send + Sync {
    async fn stage_started(&self, _phase: PipelinePhase) {}

    async fn stage_finished(&self, _phase: PipelinePhase, _elapsed: Duration) {}

    /// `phase` is the stage that failed.
    async fn run_failed(&self, _phase: PipelinePhase, _error: &PipelineError) {}

    async fn run_completed(&self, _elapsed: Duration) {}
}

/// Reports stage boundaries via `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

#[async_trait]
impl PipelineObserver for LoggingObserver {
    async fn stage_started(&self, phase: PipelinePhase) {
        info!("[{}] stage started", phase.as_str());
    }

    async fn stage_finished(&self, phase: PipelinePhase, elapsed: Duration) {
        info!(
            "[{}] stage finished in {:.1}s",
            phase.as_str(),
            elapsed.as_secs_f64()
        );
    }

    async fn run_failed(&self, phase: PipelinePhase, error: &PipelineError) {
        error!("[{}] stage failed: {}", phase.as_str(), error);
    }

    async fn run_completed(&self, elapsed: Duration) {
        info!("Pipeline completed in {:.1}s", elapsed.as_secs_f64());
    }
}
