use crate::quality::QualityReport;
use crate::stack::CombinedFrame;

/// Combination stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Selecting,
    Stacking,
    Weighting,
    Clipping,
    Combining,
    Reporting,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selecting => write!(f, "Selecting frames"),
            Self::Stacking => write!(f, "Building stack"),
            Self::Weighting => write!(f, "Resolving weights"),
            Self::Clipping => write!(f, "Sigma clipping"),
            Self::Combining => write!(f, "Combining"),
            Self::Reporting => write!(f, "Computing statistics"),
        }
    }
}

/// Result of a combination run.
#[derive(Clone, Debug)]
pub struct CombineOutput {
    pub frame: CombinedFrame,
    pub report: QualityReport,
}

/// Thread-safe progress reporting for the combination pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items in
    /// this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `combine_frames` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
