use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CombineError, Result};
use crate::stack::FrameStack;
use crate::stats::LaneStatistics;

/// How per-frame weights are obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Weighting {
    /// Every frame weighs 1.0.
    #[default]
    Uniform,
    /// Weight declared in each frame's metadata.
    Declared,
    /// Each frame's own mean level.
    FrameMean,
    /// Each frame's own median level (flat-field normalization).
    FrameMedian,
}

impl Weighting {
    /// Level-based weightings also rescale every frame to the first
    /// frame's level before clipping.
    pub fn normalizes(self) -> bool {
        matches!(self, Self::FrameMean | Self::FrameMedian)
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::Declared => write!(f, "declared"),
            Self::FrameMean => write!(f, "frame-mean"),
            Self::FrameMedian => write!(f, "frame-median"),
        }
    }
}

/// Validated per-frame weights: finite and strictly positive.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameWeights(Vec<f64>);

impl FrameWeights {
    pub fn uniform(n: usize) -> Self {
        Self(vec![1.0; n])
    }

    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w <= 0.0)
        {
            return Err(CombineError::InvalidWeight { index, value });
        }
        Ok(Self(values))
    }

    /// Resolve weights for every frame of `stack`.
    pub fn resolve(weighting: Weighting, stack: &FrameStack) -> Result<Self> {
        match weighting {
            Weighting::Uniform => Ok(Self::uniform(stack.size())),
            Weighting::Declared => {
                let values = stack
                    .metadata()
                    .iter()
                    .map(|m| {
                        m.weight
                            .ok_or_else(|| CombineError::MissingWeight { id: m.id.clone() })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::from_values(values)
            }
            Weighting::FrameMean | Weighting::FrameMedian => {
                let values = (0..stack.size())
                    .into_par_iter()
                    .map(|i| {
                        let mut scratch = Vec::new();
                        let level = stack.frame(i).and_then(|frame| {
                            let samples = frame.iter().map(|&v| (v, false));
                            LaneStatistics::from_samples(samples, &mut scratch)
                        });
                        match (level, weighting) {
                            (Some(s), Weighting::FrameMean) => s.mean,
                            (Some(s), _) => s.median,
                            (None, _) => f64::NAN,
                        }
                    })
                    .collect();
                Self::from_values(values)
            }
        }
    }

    /// Factors `w[0] / w[i]` that bring every frame to the first frame's level.
    pub fn level_scales(&self) -> Vec<f64> {
        match self.0.first() {
            Some(&reference) => self.0.iter().map(|&w| reference / w).collect(),
            None => Vec::new(),
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every weight is equal, so weighting cannot change a result.
    pub fn is_uniform(&self) -> bool {
        self.0.windows(2).all(|w| w[0] == w[1])
    }
}
