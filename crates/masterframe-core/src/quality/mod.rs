pub mod noise;
pub mod report;

pub use noise::{estimate_readout_noise, ReadoutNoise};
pub use report::{FrameReport, QualityReport, QualityReporter};
