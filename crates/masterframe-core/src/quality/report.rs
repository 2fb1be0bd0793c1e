use ndarray::{ArrayView3, Axis, Zip};
use serde::Serialize;

use crate::error::Result;
use crate::frame::Frame;
use crate::stack::sigma_clip::{ClipConfig, ClipOutcome, SigmaClipper};
use crate::stack::{FrameStack, RejectionMask};
use crate::stats::DistributionSummary;

/// Diagnostic statistics before and after rejection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualityReport {
    /// Every finite sample.
    pub before: DistributionSummary,
    /// Finite samples the mask accepts.
    pub after: DistributionSummary,
    pub accepted: usize,
    /// Finite samples flagged by the mask.
    pub rejected: usize,
    /// Non-finite samples, excluded from both distributions.
    pub invalid: usize,
}

impl QualityReport {
    pub fn total(&self) -> usize {
        self.accepted + self.rejected + self.invalid
    }
}

/// Single-frame diagnostics: the report plus how clipping went.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub report: QualityReport,
    pub clip: ClipOutcome,
}

/// Read-only producer of [`QualityReport`]s.
pub struct QualityReporter;

impl QualityReporter {
    /// Report on a stack and the mask produced by clipping it.
    pub fn report(stack: &FrameStack, mask: &RejectionMask) -> Result<QualityReport> {
        let cube = stack.stack();
        mask.ensure_matches(&cube)?;
        Ok(Self::report_cube(cube, mask.view()))
    }

    /// Report on any cube/mask pair of equal shape.
    pub fn report_cube(cube: ArrayView3<'_, f64>, mask: ArrayView3<'_, bool>) -> QualityReport {
        debug_assert_eq!(cube.dim(), mask.dim());

        let mut all = Vec::with_capacity(cube.len());
        let mut kept = Vec::with_capacity(cube.len());
        let mut invalid = 0usize;
        Zip::from(&cube).and(&mask).for_each(|&v, &rejected| {
            if !v.is_finite() {
                invalid += 1;
                return;
            }
            all.push(v);
            if !rejected {
                kept.push(v);
            }
        });

        let accepted = kept.len();
        let rejected = all.len() - accepted;
        QualityReport {
            before: DistributionSummary::from_values(&mut all),
            after: DistributionSummary::from_values(&mut kept),
            accepted,
            rejected,
            invalid,
        }
    }

    /// Clip one frame as a single flattened lane and report on it.
    pub fn report_frame(frame: &Frame, config: &ClipConfig) -> Result<FrameReport> {
        let clipper = SigmaClipper::new(config.clone())?;
        let (mask, clip) = clipper.clip_frame(frame.data.view(), None)?;
        let report = Self::report_cube(
            frame.data.view().insert_axis(Axis(0)),
            mask.view().insert_axis(Axis(0)),
        );
        Ok(FrameReport { report, clip })
    }
}
