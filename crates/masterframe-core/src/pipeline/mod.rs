pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{combine_frames, combine_frames_reported, combine_masked, combine_stack};
pub use types::{CombineOutput, PipelineStage, ProgressReporter};
