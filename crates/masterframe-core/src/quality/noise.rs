use serde::Serialize;
use tracing::info;

use crate::error::{CombineError, Result};
use crate::frame::Frame;
use crate::stack::sigma_clip::ClipConfig;

use super::report::{FrameReport, QualityReporter};

/// Read noise estimated from the difference of two bias frames.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReadoutNoise {
    /// Diagnostics of the clipped difference image.
    pub difference: FrameReport,
    /// Clipped standard deviation of the difference divided by sqrt(2), in ADU.
    pub read_noise: f64,
}

/// Estimate read noise from two bias frames of equal shape.
pub fn estimate_readout_noise(
    first: &Frame,
    second: &Frame,
    config: &ClipConfig,
) -> Result<ReadoutNoise> {
    if first.data.dim() != second.data.dim() {
        return Err(CombineError::ShapeMismatch {
            index: 1,
            expected: first.data.dim(),
            actual: second.data.dim(),
        });
    }

    let diff = Frame::new(
        &first.data - &second.data,
        format!("{} - {}", first.id(), second.id()),
    );
    let difference = QualityReporter::report_frame(&diff, config)?;
    let std_dev = difference
        .report
        .after
        .stats()
        .map(|s| s.std_dev)
        .ok_or(CombineError::NoValidData)?;
    let read_noise = std_dev / std::f64::consts::SQRT_2;

    info!(
        first = first.id(),
        second = second.id(),
        read_noise,
        "Readout noise estimated"
    );
    Ok(ReadoutNoise {
        difference,
        read_noise,
    })
}
