use tracing::info;

use crate::error::Result;
use crate::frame::Frame;
use crate::quality::QualityReporter;
use crate::stack::{
    CombinedFrame, Combiner, FrameStack, FrameWeights, RejectionMask, SigmaClipper,
};

use super::config::{CombineConfig, Rejection};
use super::types::{CombineOutput, NoOpReporter, PipelineStage, ProgressReporter};

/// Select, stack, clip and combine `frames` into one master frame.
pub fn combine_frames(frames: Vec<Frame>, config: &CombineConfig) -> Result<CombineOutput> {
    combine_frames_reported(frames, config, &NoOpReporter)
}

/// [`combine_frames`] with progress reporting.
///
/// Fails before producing anything if the configuration is invalid, fewer
/// than two frames are selected, or any frame's shape disagrees with the
/// first.
pub fn combine_frames_reported(
    frames: Vec<Frame>,
    config: &CombineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<CombineOutput> {
    config.validate()?;

    let total = frames.len();
    reporter.begin_stage(PipelineStage::Selecting, Some(total));
    let frames = config.selection.select(frames);
    info!(selected = frames.len(), total, "Frames selected for combining");
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Stacking, Some(frames.len()));
    let mut stack = FrameStack::new();
    for (i, frame) in frames.into_iter().enumerate() {
        stack.append(frame)?;
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    let mask = RejectionMask::for_stack(&stack);
    combine_masked(&stack, mask, config, reporter)
}

/// Clip and combine an already-built stack with a fresh mask.
pub fn combine_stack(stack: &FrameStack, config: &CombineConfig) -> Result<CombineOutput> {
    combine_masked(stack, RejectionMask::for_stack(stack), config, &NoOpReporter)
}

/// Clip and combine a stack starting from a seeded rejection mask
/// (e.g. a static bad-pixel map).
///
/// The mask is consumed: the clipping run owns it exclusively, and only the
/// frozen result is read by the combiner and the reporter.
///
/// With a level-based weighting every frame is first rescaled to the first
/// frame's level, and everything downstream works on the rescaled cube.
/// With `pre_clip` each frame is clipped on its own before the stack is.
pub fn combine_masked(
    stack: &FrameStack,
    mut mask: RejectionMask,
    config: &CombineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<CombineOutput> {
    config.validate()?;
    stack.require_combinable()?;

    reporter.begin_stage(PipelineStage::Weighting, Some(stack.size()));
    let weights = FrameWeights::resolve(config.weighting, stack)?;
    let normalized;
    let stack = if config.weighting.normalizes() {
        normalized = stack.scaled(&weights.level_scales())?;
        info!(
            reference = ?weights.as_slice().first(),
            weighting = %config.weighting,
            "Frames normalized to the first frame's level"
        );
        &normalized
    } else {
        stack
    };
    reporter.finish_stage();

    let clip = match config.rejection {
        Rejection::SigmaClip => {
            reporter.begin_stage(PipelineStage::Clipping, None);
            let clipper = SigmaClipper::new(config.clip.clone())?;
            if config.pre_clip {
                let frames = clipper.clip_frames(stack, &mut mask)?;
                info!(
                    rejected = frames.newly_rejected,
                    iterations = frames.iterations,
                    "Per-frame clipping complete"
                );
            }
            let outcome = clipper.clip_stack(stack, &mut mask)?;
            reporter.finish_stage();
            info!(
                state = %outcome.state,
                iterations = outcome.iterations,
                rejected = outcome.newly_rejected,
                degenerate_lanes = outcome.degenerate_lanes,
                "Sigma clipping complete"
            );
            Some(outcome)
        }
        Rejection::None => None,
    };

    reporter.begin_stage(PipelineStage::Combining, None);
    let pixels = Combiner::new(config.combine).combine(stack, &mask, &weights)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Reporting, None);
    let report = QualityReporter::report(stack, &mask)?;
    reporter.finish_stage();

    info!(
        frames = stack.size(),
        method = %config.combine,
        weighting = %config.weighting,
        accepted = report.accepted,
        rejected = report.rejected,
        "Combining complete"
    );

    Ok(CombineOutput {
        frame: CombinedFrame {
            data: pixels.data,
            accepted: pixels.accepted,
            sources: stack.ids(),
            config: config.clone(),
            clip,
            filled_positions: pixels.filled_positions,
        },
        report,
    })
}
