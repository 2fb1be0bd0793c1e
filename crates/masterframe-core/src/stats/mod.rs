pub mod distribution;
pub mod estimator;
pub mod lane;

pub use distribution::{DistributionStats, DistributionSummary};
pub use estimator::{LaneEstimate, PixelEstimates, StatisticsEstimator};
pub use lane::{CenterFunc, DispersionFunc, LaneStatistics};
