pub mod combine;
mod frame_stack;
mod mask;
pub mod sigma_clip;
pub mod weights;

pub use combine::{CombineFunc, CombinedFrame, Combiner};
pub use frame_stack::FrameStack;
pub use mask::RejectionMask;
pub use sigma_clip::{ClipAxis, ClipConfig, ClipOutcome, ClipState, SigmaClipper};
pub use weights::{FrameWeights, Weighting};
