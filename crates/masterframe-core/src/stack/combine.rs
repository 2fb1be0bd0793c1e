use std::fmt;

use ndarray::{Array2, ArrayView1, Axis, Zip};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{CombineError, Result};
use crate::io::provenance::Provenance;
use crate::pipeline::config::CombineConfig;
use crate::stack::sigma_clip::ClipOutcome;
use crate::stack::weights::FrameWeights;
use crate::stack::{FrameStack, RejectionMask};
use crate::stats::lane::median_in_place;

/// Reduction applied to the accepted samples of each pixel position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineFunc {
    /// Weighted mean `sum(w*x) / sum(w)`.
    #[default]
    Mean,
    /// Weighted median; the ordinary median when weights are uniform.
    Median,
}

impl fmt::Display for CombineFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::Median => write!(f, "median"),
        }
    }
}

/// Raw output of [`Combiner::combine`].
#[derive(Clone, Debug)]
pub struct CombinedPixels {
    pub data: Array2<f64>,
    /// Accepted sample count per position.
    pub accepted: Array2<u32>,
    /// Positions with no valid sample that received `fill_value`.
    pub filled_positions: usize,
    pub fill_value: Option<f64>,
}

/// Reduces a cube and its frozen rejection mask to one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct Combiner {
    func: CombineFunc,
}

impl Combiner {
    pub fn new(func: CombineFunc) -> Self {
        Self { func }
    }

    pub fn combine(
        &self,
        stack: &FrameStack,
        mask: &RejectionMask,
        weights: &FrameWeights,
    ) -> Result<CombinedPixels> {
        stack.require_combinable()?;
        let cube = stack.stack();
        mask.ensure_matches(&cube)?;
        if weights.len() != stack.size() {
            return Err(CombineError::WeightCountMismatch {
                expected: stack.size(),
                actual: weights.len(),
            });
        }

        let (_, h, w) = cube.dim();
        let func = self.func;
        let uniform = weights.is_uniform();
        let weights = weights.as_slice();
        let combine_position = |values: ArrayView1<'_, f64>, flags: ArrayView1<'_, bool>| {
            combine_lane(values, flags, weights, func, uniform)
        };

        let flags = mask.view();
        let zip = Zip::from(cube.lanes(Axis(0))).and(flags.lanes(Axis(0)));
        let lanes = if h * w >= PARALLEL_PIXEL_THRESHOLD {
            zip.par_map_collect(combine_position)
        } else {
            zip.map_collect(combine_position)
        };

        let accepted = lanes.map(|&(_, count)| count);
        let (sum, valid) = lanes
            .iter()
            .filter_map(|&(v, _)| v)
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        if valid == 0 {
            return Err(CombineError::NoValidData);
        }

        let filled_positions = h * w - valid;
        let fill_value = (filled_positions > 0).then(|| sum / valid as f64);
        if let Some(fill) = fill_value {
            warn!(
                positions = filled_positions,
                fill_value = fill,
                "Positions without valid data filled with the combined mean"
            );
        }
        let data = lanes.map(|&(v, _)| v.or(fill_value).unwrap_or(f64::NAN));

        Ok(CombinedPixels {
            data,
            accepted,
            filled_positions,
            fill_value,
        })
    }
}

fn combine_lane(
    values: ArrayView1<'_, f64>,
    flags: ArrayView1<'_, bool>,
    weights: &[f64],
    func: CombineFunc,
    uniform: bool,
) -> (Option<f64>, u32) {
    let accepted = values
        .iter()
        .zip(flags.iter())
        .zip(weights)
        .filter(|&((v, &rejected), _)| !rejected && v.is_finite())
        .map(|((&v, _), &w)| (v, w));

    match func {
        CombineFunc::Mean => {
            let (mut sum_w, mut sum_wx, mut count) = (0.0, 0.0, 0u32);
            for (v, w) in accepted {
                sum_w += w;
                sum_wx += w * v;
                count += 1;
            }
            ((count > 0).then(|| sum_wx / sum_w), count)
        }
        CombineFunc::Median => {
            let mut pairs: Vec<(f64, f64)> = accepted.collect();
            let count = pairs.len() as u32;
            if pairs.is_empty() {
                return (None, 0);
            }
            let value = if uniform {
                let mut samples: Vec<f64> = pairs.iter().map(|&(v, _)| v).collect();
                median_in_place(&mut samples)
            } else {
                weighted_median(&mut pairs)
            };
            (Some(value), count)
        }
    }
}

/// Median of `(value, weight)` pairs: the first value whose cumulative
/// weight exceeds half the total, averaged with its successor when the
/// cumulative weight lands exactly on the half.
fn weighted_median(pairs: &mut [(f64, f64)]) -> f64 {
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let half = pairs.iter().map(|&(_, w)| w).sum::<f64>() / 2.0;

    let mut cumulative = 0.0;
    for (i, &(v, w)) in pairs.iter().enumerate() {
        cumulative += w;
        if cumulative > half {
            return v;
        }
        if cumulative == half {
            return pairs.get(i + 1).map_or(v, |&(next, _)| (v + next) / 2.0);
        }
    }
    pairs[pairs.len() - 1].0
}

/// A finished master frame plus everything needed to describe how it was made.
#[derive(Clone, Debug)]
pub struct CombinedFrame {
    pub data: Array2<f64>,
    /// Accepted sample count per position.
    pub accepted: Array2<u32>,
    /// Identifiers of the source frames, in stacking order.
    pub sources: Vec<String>,
    pub config: CombineConfig,
    /// Clipping summary, `None` when rejection was disabled.
    pub clip: Option<ClipOutcome>,
    pub filled_positions: usize,
}

impl CombinedFrame {
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn provenance(&self) -> Provenance {
        Provenance::new(self.sources.clone(), &self.config)
    }
}
