use std::fmt;

use ndarray::{Array2, Array3, ArrayView1, ArrayView2, ArrayView3, ArrayViewMut1, ArrayViewMut3, Axis, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
    DEFAULT_COMBINE_MAX_ITERATIONS, DEFAULT_COMBINE_THRESHOLD, DEFAULT_DIAGNOSTIC_MAX_ITERATIONS,
    DEFAULT_DIAGNOSTIC_THRESHOLD, PARALLEL_PIXEL_THRESHOLD,
};
use crate::error::{CombineError, Result};
use crate::stack::{FrameStack, RejectionMask};
use crate::stats::{CenterFunc, DispersionFunc, StatisticsEstimator};

/// Parameters for iterative sigma clipping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipConfig {
    /// Samples further than `threshold_sigma * dispersion` from the center are rejected.
    pub threshold_sigma: f64,
    /// Iteration cap (default: 10).
    pub max_iterations: u32,
    pub center: CenterFunc,
    pub dispersion: DispersionFunc,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            threshold_sigma: DEFAULT_COMBINE_THRESHOLD,
            max_iterations: DEFAULT_COMBINE_MAX_ITERATIONS,
            center: CenterFunc::Median,
            dispersion: DispersionFunc::Std,
        }
    }
}

impl ClipConfig {
    pub fn new(threshold_sigma: f64, max_iterations: u32, center: CenterFunc) -> Self {
        Self {
            threshold_sigma,
            max_iterations,
            center,
            dispersion: DispersionFunc::Std,
        }
    }

    /// Defaults for single-frame diagnostic statistics: mean +/- 5 sigma.
    pub fn diagnostic() -> Self {
        Self::new(
            DEFAULT_DIAGNOSTIC_THRESHOLD,
            DEFAULT_DIAGNOSTIC_MAX_ITERATIONS,
            CenterFunc::Mean,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold_sigma.is_finite() || self.threshold_sigma <= 0.0 {
            return Err(CombineError::InvalidConfig(format!(
                "clipping threshold must be a positive number, got {}",
                self.threshold_sigma
            )));
        }
        Ok(())
    }
}

/// Which samples form one clipping lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipAxis {
    /// One lane per pixel position, running along the stacking axis.
    Stack,
    /// Every sample of the cube in a single lane.
    Flattened,
}

/// Clipping state machine.
///
/// `Degenerate` is non-terminal: it is entered when the floor-of-one guard
/// had to keep a sample, and clipping continues until `Converged` or
/// `MaxIterationsReached`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ClipState {
    Iterating,
    Degenerate,
    Converged,
    MaxIterationsReached,
}

impl ClipState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::MaxIterationsReached)
    }
}

impl fmt::Display for ClipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iterating => write!(f, "Iterating"),
            Self::Degenerate => write!(f, "Degenerate"),
            Self::Converged => write!(f, "Converged"),
            Self::MaxIterationsReached => write!(f, "Max Iterations Reached"),
        }
    }
}

/// Summary of a finished clipping run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ClipOutcome {
    /// `Converged` only if every lane converged.
    pub state: ClipState,
    /// Largest number of iterations any lane ran.
    pub iterations: u32,
    /// Samples rejected by this run (seeded flags excluded).
    pub newly_rejected: usize,
    /// Lanes where the floor-of-one guard fired at least once.
    pub degenerate_lanes: usize,
    /// Lanes without a single finite, unmasked sample.
    pub empty_lanes: usize,
}

impl ClipOutcome {
    pub fn is_degenerate(&self) -> bool {
        self.degenerate_lanes > 0
    }

    /// Fold several runs into one summary, as [`summarize`] does for lanes.
    fn merge(outcomes: impl IntoIterator<Item = ClipOutcome>) -> Self {
        let mut merged = ClipOutcome {
            state: ClipState::Converged,
            iterations: 0,
            newly_rejected: 0,
            degenerate_lanes: 0,
            empty_lanes: 0,
        };
        for outcome in outcomes {
            if outcome.state == ClipState::MaxIterationsReached {
                merged.state = ClipState::MaxIterationsReached;
            }
            merged.iterations = merged.iterations.max(outcome.iterations);
            merged.newly_rejected += outcome.newly_rejected;
            merged.degenerate_lanes += outcome.degenerate_lanes;
            merged.empty_lanes += outcome.empty_lanes;
        }
        merged
    }
}

#[derive(Clone, Copy, Debug)]
struct LaneReport {
    state: ClipState,
    iterations: u32,
    newly_rejected: usize,
    degenerate: bool,
    empty: bool,
}

/// Iterative clipping of one lane. `rejected` is updated in place and only
/// ever gains flags.
struct LaneClipper<'a> {
    values: &'a [f64],
    rejected: &'a mut [bool],
    scratch: Vec<f64>,
    state: ClipState,
    iterations: u32,
    newly_rejected: usize,
    degenerate: bool,
    empty: bool,
}

impl<'a> LaneClipper<'a> {
    fn new(values: &'a [f64], rejected: &'a mut [bool]) -> Self {
        Self {
            values,
            rejected,
            scratch: Vec::with_capacity(values.len()),
            state: ClipState::Iterating,
            iterations: 0,
            newly_rejected: 0,
            degenerate: false,
            empty: false,
        }
    }

    fn run(mut self, config: &ClipConfig, estimator: &StatisticsEstimator) -> LaneReport {
        while !self.state.is_terminal() {
            self.state = self.step(config, estimator);
        }
        LaneReport {
            state: self.state,
            iterations: self.iterations,
            newly_rejected: self.newly_rejected,
            degenerate: self.degenerate,
            empty: self.empty,
        }
    }

    fn step(&mut self, config: &ClipConfig, estimator: &StatisticsEstimator) -> ClipState {
        if self.iterations >= config.max_iterations {
            return ClipState::MaxIterationsReached;
        }

        let samples = self.values.iter().copied().zip(self.rejected.iter().copied());
        let Some(stats) = estimator.estimate_lane(samples, &mut self.scratch) else {
            self.empty = true;
            return ClipState::Converged;
        };
        self.iterations += 1;

        let center = stats.center;
        let spread = stats.dispersion;
        if spread <= 0.0 {
            // Zero dispersion: nothing can be an outlier.
            return ClipState::Converged;
        }
        let limit = config.threshold_sigma * spread;

        let mut candidates: Vec<usize> = self
            .values
            .iter()
            .zip(self.rejected.iter())
            .enumerate()
            .filter(|&(_, (&v, &rejected))| !rejected && v.is_finite() && (v - center).abs() > limit)
            .map(|(i, _)| i)
            .collect();

        if candidates.is_empty() {
            return ClipState::Converged;
        }

        let mut floor_hit = false;
        if candidates.len() == stats.count {
            // Keep the sample closest to the center; ties go to the lowest index.
            let keep = (0..candidates.len()).min_by(|&a, &b| {
                let da = (self.values[candidates[a]] - center).abs();
                let db = (self.values[candidates[b]] - center).abs();
                da.total_cmp(&db)
            });
            if let Some(pos) = keep {
                candidates.remove(pos);
            }
            floor_hit = true;
            self.degenerate = true;
        }

        for &i in &candidates {
            self.rejected[i] = true;
        }
        self.newly_rejected += candidates.len();

        if floor_hit {
            ClipState::Degenerate
        } else {
            ClipState::Iterating
        }
    }
}

fn clip_lane(
    values: &[f64],
    rejected: &mut [bool],
    config: &ClipConfig,
    estimator: &StatisticsEstimator,
) -> LaneReport {
    LaneClipper::new(values, rejected).run(config, estimator)
}

/// Iterative outlier rejection over a cube and its rejection mask.
#[derive(Clone, Debug)]
pub struct SigmaClipper {
    config: ClipConfig,
    estimator: StatisticsEstimator,
}

impl SigmaClipper {
    pub fn new(config: ClipConfig) -> Result<Self> {
        config.validate()?;
        let estimator = StatisticsEstimator::new(config.center, config.dispersion);
        Ok(Self { config, estimator })
    }

    pub fn config(&self) -> &ClipConfig {
        &self.config
    }

    /// Clip every pixel position of a stack along the stacking axis.
    pub fn clip_stack(&self, stack: &FrameStack, mask: &mut RejectionMask) -> Result<ClipOutcome> {
        let cube = stack.stack();
        mask.ensure_matches(&cube)?;
        Ok(self.clip(ClipAxis::Stack, cube, mask.view_mut()))
    }

    /// Clip every frame of a stack on its own, each flattened into one lane,
    /// and fold the per-frame masks into `mask`.
    ///
    /// Frames are clipped in parallel. Flags already set in `mask` seed each
    /// frame's run and are kept.
    pub fn clip_frames(&self, stack: &FrameStack, mask: &mut RejectionMask) -> Result<ClipOutcome> {
        let cube = stack.stack();
        mask.ensure_matches(&cube)?;

        let seeds = mask.view();
        let results = (0..stack.size())
            .into_par_iter()
            .map(|i| {
                let data = cube.index_axis(Axis(0), i);
                let seed = seeds.index_axis(Axis(0), i).to_owned();
                self.clip_frame(data, Some(seed))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut flags = mask.view_mut();
        let mut outcomes = Vec::with_capacity(results.len());
        for (i, (frame_flags, outcome)) in results.into_iter().enumerate() {
            flags.index_axis_mut(Axis(0), i).assign(&frame_flags);
            outcomes.push(outcome);
        }
        Ok(ClipOutcome::merge(outcomes))
    }

    /// Clip a single frame with all of its pixels treated as one lane.
    ///
    /// Returns the final mask, seeded with `initial` when given.
    pub fn clip_frame(
        &self,
        data: ArrayView2<'_, f64>,
        initial: Option<Array2<bool>>,
    ) -> Result<(Array2<bool>, ClipOutcome)> {
        let mut flags = match initial {
            Some(mask) if mask.dim() != data.dim() => {
                return Err(CombineError::ShapeMismatch {
                    index: 0,
                    expected: data.dim(),
                    actual: mask.dim(),
                });
            }
            Some(mask) => mask,
            None => Array2::from_elem(data.dim(), false),
        };

        let outcome = self.clip(
            ClipAxis::Flattened,
            data.insert_axis(Axis(0)),
            flags.view_mut().insert_axis(Axis(0)),
        );
        Ok((flags, outcome))
    }

    /// Clip `cube` along `axis`, updating `mask` in place.
    ///
    /// `mask` must have the cube's shape.
    pub fn clip(
        &self,
        axis: ClipAxis,
        cube: ArrayView3<'_, f64>,
        mut mask: ArrayViewMut3<'_, bool>,
    ) -> ClipOutcome {
        debug_assert_eq!(cube.dim(), mask.dim());

        let outcome = match axis {
            ClipAxis::Flattened => {
                let values: Vec<f64> = cube.iter().copied().collect();
                let mut flags: Vec<bool> = mask.iter().copied().collect();
                let report = clip_lane(&values, &mut flags, &self.config, &self.estimator);
                for (dst, src) in mask.iter_mut().zip(flags) {
                    *dst = src;
                }
                summarize(std::iter::once(report))
            }
            ClipAxis::Stack => {
                let (_, h, w) = cube.dim();
                let config = &self.config;
                let estimator = &self.estimator;
                let clip_position = |values: ArrayView1<'_, f64>, mut flags: ArrayViewMut1<'_, bool>| {
                    let values = values.to_vec();
                    let mut lane = flags.to_vec();
                    let report = clip_lane(&values, &mut lane, config, estimator);
                    for (dst, src) in flags.iter_mut().zip(lane) {
                        *dst = src;
                    }
                    report
                };

                let zip = Zip::from(cube.lanes(Axis(0))).and(mask.lanes_mut(Axis(0)));
                let reports = if h * w >= PARALLEL_PIXEL_THRESHOLD {
                    zip.par_map_collect(clip_position)
                } else {
                    zip.map_collect(clip_position)
                };
                summarize(reports.iter().copied())
            }
        };

        debug!(
            axis = ?axis,
            state = %outcome.state,
            iterations = outcome.iterations,
            rejected = outcome.newly_rejected,
            "Sigma clipping finished"
        );
        if outcome.is_degenerate() {
            debug!(
                lanes = outcome.degenerate_lanes,
                "Floor-of-one guard kept the closest sample"
            );
        }
        outcome
    }
}

fn summarize(reports: impl Iterator<Item = LaneReport>) -> ClipOutcome {
    let mut outcome = ClipOutcome {
        state: ClipState::Converged,
        iterations: 0,
        newly_rejected: 0,
        degenerate_lanes: 0,
        empty_lanes: 0,
    };
    for report in reports {
        if report.state == ClipState::MaxIterationsReached {
            outcome.state = ClipState::MaxIterationsReached;
        }
        outcome.iterations = outcome.iterations.max(report.iterations);
        outcome.newly_rejected += report.newly_rejected;
        outcome.degenerate_lanes += usize::from(report.degenerate);
        outcome.empty_lanes += usize::from(report.empty);
    }
    outcome
}

/// Fresh-mask convenience: clip a stack and return the resulting mask.
pub fn sigma_clip_stack(
    stack: &FrameStack,
    config: &ClipConfig,
) -> Result<(RejectionMask, ClipOutcome)> {
    let clipper = SigmaClipper::new(config.clone())?;
    let mut mask = RejectionMask::for_stack(stack);
    let outcome = clipper.clip_stack(stack, &mut mask)?;
    Ok((mask, outcome))
}

/// Owned-cube variant of [`SigmaClipper::clip`] for callers holding a raw array.
pub fn sigma_clip_cube(
    cube: ArrayView3<'_, f64>,
    mask: &mut Array3<bool>,
    axis: ClipAxis,
    config: &ClipConfig,
) -> Result<ClipOutcome> {
    if mask.dim() != cube.dim() {
        return Err(CombineError::MaskShapeMismatch {
            expected: cube.dim(),
            actual: mask.dim(),
        });
    }
    let clipper = SigmaClipper::new(config.clone())?;
    Ok(clipper.clip(axis, cube, mask.view_mut()))
}
