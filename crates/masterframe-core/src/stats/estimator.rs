use ndarray::{Array2, ArrayView1, ArrayView3, Axis, Zip};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{CombineError, Result};
use crate::stack::RejectionMask;

use super::lane::{CenterFunc, DispersionFunc, LaneStatistics};

/// Per-position center and dispersion maps, shape `(H, W)`.
#[derive(Clone, Debug)]
pub struct PixelEstimates {
    pub center: Array2<f64>,
    pub dispersion: Array2<f64>,
    /// Number of samples each estimate was computed from.
    pub count: Array2<usize>,
}

/// Center, dispersion and sample count of a single lane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneEstimate {
    pub center: f64,
    pub dispersion: f64,
    pub count: usize,
}

/// Masked per-position statistics across the stacking axis of a cube.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatisticsEstimator {
    pub center: CenterFunc,
    pub dispersion: DispersionFunc,
}

impl StatisticsEstimator {
    pub fn new(center: CenterFunc, dispersion: DispersionFunc) -> Self {
        Self { center, dispersion }
    }

    /// Estimate one lane of `(value, rejected)` samples.
    ///
    /// `None` when no sample is both unmasked and finite. `scratch` is reused
    /// between calls to avoid reallocating per lane.
    pub fn estimate_lane<I>(&self, samples: I, scratch: &mut Vec<f64>) -> Option<LaneEstimate>
    where
        I: IntoIterator<Item = (f64, bool)>,
    {
        LaneStatistics::from_samples(samples, scratch).map(|s| LaneEstimate {
            center: s.center(self.center),
            dispersion: s.dispersion(self.dispersion),
            count: s.count,
        })
    }

    /// Estimate every position of `cube` over its unmasked, finite samples.
    ///
    /// Fails with `EmptyPixelStack` at the first position (row-major) that
    /// has no usable sample.
    pub fn estimate(
        &self,
        cube: ArrayView3<'_, f64>,
        mask: &RejectionMask,
    ) -> Result<PixelEstimates> {
        mask.ensure_matches(&cube)?;

        let (n, h, w) = cube.dim();
        let flags = mask.view();
        let estimate_position = |values: ArrayView1<'_, f64>, flags: ArrayView1<'_, bool>| {
            let mut scratch = Vec::with_capacity(n);
            let samples = values.iter().copied().zip(flags.iter().copied());
            self.estimate_lane(samples, &mut scratch)
        };
        let zip = Zip::from(cube.lanes(Axis(0))).and(flags.lanes(Axis(0)));
        let lanes = if h * w >= PARALLEL_PIXEL_THRESHOLD {
            zip.par_map_collect(estimate_position)
        } else {
            zip.map_collect(estimate_position)
        };

        if let Some(((row, col), _)) = lanes.indexed_iter().find(|(_, e)| e.is_none()) {
            return Err(CombineError::EmptyPixelStack { row, col });
        }

        Ok(PixelEstimates {
            center: lanes.map(|e| e.map_or(f64::NAN, |e| e.center)),
            dispersion: lanes.map(|e| e.map_or(f64::NAN, |e| e.dispersion)),
            count: lanes.map(|e| e.map_or(0, |e| e.count)),
        })
    }
}
