use serde::Serialize;

use super::lane::median_in_place;

/// Descriptive statistics of a flattened value distribution.
///
/// Skewness and kurtosis are the biased moment estimators (g1 and excess
/// g2). A distribution with zero variance reports both as 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DistributionStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl DistributionStats {
    /// Compute over finite `values`; reorders them. `None` when empty.
    pub fn from_values(values: &mut [f64]) -> Option<Self> {
        let count = values.len();
        if count == 0 {
            return None;
        }
        let n = count as f64;

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let mean = values.iter().sum::<f64>() / n;

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for &v in values.iter() {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        m2 /= n;
        m3 /= n;
        m4 /= n;

        let (skewness, kurtosis) = if m2 > 0.0 {
            (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
        } else {
            (0.0, 0.0)
        };

        Some(Self {
            count,
            min,
            max,
            mean,
            median: median_in_place(values),
            std_dev: m2.sqrt(),
            skewness,
            kurtosis,
        })
    }
}

/// A distribution summary, or an explicit marker that nothing was left to
/// describe.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum DistributionSummary {
    Data(DistributionStats),
    NoData,
}

impl DistributionSummary {
    pub fn from_values(values: &mut [f64]) -> Self {
        DistributionStats::from_values(values).map_or(Self::NoData, Self::Data)
    }

    pub fn stats(&self) -> Option<&DistributionStats> {
        match self {
            Self::Data(s) => Some(s),
            Self::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}
