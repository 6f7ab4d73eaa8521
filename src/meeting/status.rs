//! Pipeline phase machine.

/// Phase of a pipeline run. Stages advance linearly; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Transcribe,
    DetailedMinutes,
    Summarize,
    ComposeReport,
    Done,
    Failed,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::DetailedMinutes => "detailed_minutes",
            Self::Summarize => "summarize",
            Self::ComposeReport => "compose_report",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Phase entered after this one succeeds.
    pub fn next(self) -> Self {
        match self {
            Self::Transcribe => Self::DetailedMinutes,
            Self::DetailedMinutes => Self::Summarize,
            Self::Summarize => Self::ComposeReport,
            Self::ComposeReport => Self::Done,
            Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}
