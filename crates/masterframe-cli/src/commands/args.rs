use clap::{Args, ValueEnum};
use masterframe_core::frame::FrameKind;
use masterframe_core::pipeline::config::Rejection;
use masterframe_core::stack::{ClipConfig, CombineFunc, Weighting};
use masterframe_core::stats::CenterFunc;

#[derive(Clone, Copy, ValueEnum)]
pub enum RejectionArg {
    None,
    Sigclip,
}

impl From<RejectionArg> for Rejection {
    fn from(arg: RejectionArg) -> Self {
        match arg {
            RejectionArg::None => Rejection::None,
            RejectionArg::Sigclip => Rejection::SigmaClip,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FuncArg {
    Mean,
    Median,
}

impl From<FuncArg> for CenterFunc {
    fn from(arg: FuncArg) -> Self {
        match arg {
            FuncArg::Mean => CenterFunc::Mean,
            FuncArg::Median => CenterFunc::Median,
        }
    }
}

impl From<FuncArg> for CombineFunc {
    fn from(arg: FuncArg) -> Self {
        match arg {
            FuncArg::Mean => CombineFunc::Mean,
            FuncArg::Median => CombineFunc::Median,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WeightingArg {
    Uniform,
    Declared,
    FrameMean,
    FrameMedian,
}

impl From<WeightingArg> for Weighting {
    fn from(arg: WeightingArg) -> Self {
        match arg {
            WeightingArg::Uniform => Weighting::Uniform,
            WeightingArg::Declared => Weighting::Declared,
            WeightingArg::FrameMean => Weighting::FrameMean,
            WeightingArg::FrameMedian => Weighting::FrameMedian,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Bias,
    Dark,
    Flat,
    Light,
}

impl From<KindArg> for FrameKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Bias => FrameKind::Bias,
            KindArg::Dark => FrameKind::Dark,
            KindArg::Flat => FrameKind::Flat,
            KindArg::Light => FrameKind::Light,
        }
    }
}

/// Clipping options shared by the diagnostic commands.
#[derive(Args)]
pub struct ClipArgs {
    /// Rejection threshold in standard deviations
    #[arg(short = 's', long, default_value = "5.0")]
    pub sigma: f64,

    /// Maximum number of clipping iterations
    #[arg(short = 'n', long, default_value = "10")]
    pub maxiters: u32,

    /// Center estimator
    #[arg(long, value_enum, default_value = "mean")]
    pub cenfunc: FuncArg,
}

impl ClipArgs {
    pub fn to_config(&self) -> ClipConfig {
        ClipConfig::new(self.sigma, self.maxiters, self.cenfunc.into())
    }
}
