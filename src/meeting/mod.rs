//! Meeting report pipeline.
//!
//! Transcribes a recording, generates detailed minutes and a summary from
//! the transcript, and composes them into a Markdown report.

pub mod error;
pub mod observer;
pub mod orchestrator;
pub mod stages;
pub mod state;
pub mod status;

pub use error::PipelineError;
pub use observer::{LoggingObserver, PipelineObserver};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use stages::{compose_report, Clock, FixedClock, SystemClock};
pub use state::{MeetingState, StateField};
pub use status::PipelinePhase;
