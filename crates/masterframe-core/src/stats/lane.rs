use std::fmt;

use serde::{Deserialize, Serialize};

/// Central estimate used for clipping and combining.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterFunc {
    Mean,
    #[default]
    Median,
}

impl fmt::Display for CenterFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::Median => write!(f, "median"),
        }
    }
}

/// Dispersion estimate used for clipping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispersionFunc {
    /// Population standard deviation about the mean.
    #[default]
    Std,
}

impl fmt::Display for DispersionFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Std => write!(f, "std"),
        }
    }
}

/// Mean, median and population standard deviation of one lane's accepted,
/// finite samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl LaneStatistics {
    /// Statistics over `(value, rejected)` samples.
    ///
    /// Rejected and non-finite samples are skipped. `scratch` is cleared and
    /// left holding the accepted values in unspecified order. Returns `None`
    /// when no sample survives.
    pub fn from_samples<I>(samples: I, scratch: &mut Vec<f64>) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, bool)>,
    {
        scratch.clear();
        scratch.extend(
            samples
                .into_iter()
                .filter(|&(v, rejected)| !rejected && v.is_finite())
                .map(|(v, _)| v),
        );
        Self::from_values(scratch)
    }

    /// Statistics over already-filtered finite values. Reorders `values`.
    pub fn from_values(values: &mut [f64]) -> Option<Self> {
        let count = values.len();
        if count == 0 {
            return None;
        }

        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Some(Self {
            count,
            mean,
            median: median_in_place(values),
            std_dev: var.sqrt(),
        })
    }

    pub fn center(&self, func: CenterFunc) -> f64 {
        match func {
            CenterFunc::Mean => self.mean,
            CenterFunc::Median => self.median,
        }
    }

    pub fn dispersion(&self, func: DispersionFunc) -> f64 {
        match func {
            DispersionFunc::Std => self.std_dev,
        }
    }
}

/// Median via `select_nth_unstable_by`, averaging the two middle values for
/// even counts. `values` must be non-empty; it is reordered.
pub(crate) fn median_in_place(values: &mut [f64]) -> f64 {
    let n = values.len();
    debug_assert!(n > 0);
    if n == 1 {
        values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        // After partitioning, the lower middle is the maximum of the left half.
        let lower = values[..mid]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (lower + values[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median_in_place(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median_in_place(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median_in_place(&mut [7.0]), 7.0);
    }

    #[test]
    fn rejected_and_nan_samples_are_skipped() {
        let mut scratch = Vec::new();
        let samples = [(1.0, false), (f64::NAN, false), (100.0, true), (3.0, false)];
        let stats = LaneStatistics::from_samples(samples, &mut scratch).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.std_dev, 1.0);
    }

    #[test]
    fn all_excluded_is_none() {
        let mut scratch = Vec::new();
        let samples = [(1.0, true), (f64::INFINITY, false)];
        assert!(LaneStatistics::from_samples(samples, &mut scratch).is_none());
    }
}
