use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use masterframe_core::frame::Frame;
use masterframe_core::io::image_io::{load_image, provenance_path, save_with_provenance};
use masterframe_core::pipeline::config::CombineConfig;
use masterframe_core::pipeline::{combine_masked, PipelineStage, ProgressReporter};
use masterframe_core::selection::FrameSelector;
use masterframe_core::stack::{FrameStack, RejectionMask};

use super::args::{FuncArg, KindArg, RejectionArg, WeightingArg};
use super::manifest::Manifest;
use crate::summary::{print_combine_summary, print_quality_report};

#[derive(Args)]
pub struct CombineArgs {
    /// Input image files (16-bit grayscale TIFF/PNG)
    pub files: Vec<PathBuf>,

    /// Frame manifest (TOML) listing files with their metadata
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Combine config file (TOML); command-line options override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Outlier rejection
    #[arg(long, value_enum)]
    pub rejection: Option<RejectionArg>,

    /// Rejection threshold in standard deviations
    #[arg(short = 's', long)]
    pub threshold: Option<f64>,

    /// Maximum number of clipping iterations
    #[arg(short = 'n', long)]
    pub maxiters: Option<u32>,

    /// Center estimator used while clipping
    #[arg(long, value_enum)]
    pub cenfunc: Option<FuncArg>,

    /// Reduction of the accepted samples
    #[arg(long, value_enum)]
    pub combine: Option<FuncArg>,

    /// Per-frame weighting
    #[arg(long, value_enum)]
    pub weighting: Option<WeightingArg>,

    /// Only combine frames of this kind
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    /// Only combine frames with this exposure time (seconds)
    #[arg(long)]
    pub exptime: Option<f64>,

    /// Only combine frames taken through this filter
    #[arg(long)]
    pub filter: Option<String>,

    /// Only combine frames observed on this date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Sigma-clip every frame on its own before clipping along the stack
    #[arg(long)]
    pub pre_clip: bool,

    /// Static bad-pixel map; nonzero pixels are rejected in every frame
    #[arg(long)]
    pub bad_pixels: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    pub output: PathBuf,
}

pub fn run(args: &CombineArgs) -> Result<()> {
    let sidecar = provenance_path(&args.output);
    for path in [&args.output, &sidecar] {
        if path.exists() {
            bail!("{} already exists, refusing to overwrite", path.display());
        }
    }

    let config = build_config(args)?;
    let frames = load_frames(args)?;
    print_combine_summary(&config, frames.len(), &args.output);

    let total = frames.len();
    let selected = config.selection.select(frames);
    if selected.len() < total {
        println!("Selected {} of {} frames", selected.len(), total);
    }
    let stack = FrameStack::from_frames(selected)?;
    let mask = match args.bad_pixels {
        Some(ref path) => {
            let map = load_image(path)
                .with_context(|| format!("Failed to load bad-pixel map {}", path.display()))?;
            RejectionMask::with_bad_pixels(&stack, &map.data.mapv(|v| v != 0.0))?
        }
        None => RejectionMask::for_stack(&stack),
    };

    let reporter = BarReporter::new()?;
    let output = combine_masked(&stack, mask, &config, &reporter)?;
    reporter.finish();

    let history = vec![
        format!("masterframe {}", env!("CARGO_PKG_VERSION")),
        format!("command: {}", std::env::args().collect::<Vec<_>>().join(" ")),
    ];
    let sidecar = save_with_provenance(
        &output.frame.data,
        &args.output,
        &output.frame.provenance(),
        &history,
    )?;

    print_quality_report(&output.report, output.frame.clip.as_ref());
    if output.frame.filled_positions > 0 {
        println!(
            "{} position(s) had no accepted sample and were filled",
            output.frame.filled_positions
        );
    }
    println!("\nSaved to {}", args.output.display());
    println!("Provenance written to {}", sidecar.display());
    Ok(())
}

fn build_config(args: &CombineArgs) -> Result<CombineConfig> {
    let mut config = match args.config {
        Some(ref path) => super::config::load(path)?,
        None => CombineConfig::default(),
    };

    if let Some(rejection) = args.rejection {
        config.rejection = rejection.into();
    }
    if let Some(threshold) = args.threshold {
        config.clip.threshold_sigma = threshold;
    }
    if let Some(maxiters) = args.maxiters {
        config.clip.max_iterations = maxiters;
    }
    if let Some(cenfunc) = args.cenfunc {
        config.clip.center = cenfunc.into();
    }
    if let Some(combine) = args.combine {
        config.combine = combine.into();
    }
    if let Some(weighting) = args.weighting {
        config.weighting = weighting.into();
    }
    if args.pre_clip {
        config.pre_clip = true;
    }
    apply_selection(&mut config.selection, args);

    config.validate()?;
    Ok(config)
}

fn apply_selection(selection: &mut FrameSelector, args: &CombineArgs) {
    if let Some(kind) = args.kind {
        selection.kind = Some(kind.into());
    }
    if let Some(exptime) = args.exptime {
        selection.exposure_time = Some(exptime);
    }
    if let Some(ref filter) = args.filter {
        selection.filter = Some(filter.clone());
    }
    if let Some(ref date) = args.date {
        selection.date = Some(date.clone());
    }
}

fn load_frames(args: &CombineArgs) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    if let Some(ref path) = args.manifest {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        frames.extend(Manifest::load(path)?.load_frames(base)?);
    }
    for path in &args.files {
        frames.push(load_image(path).with_context(|| format!("Failed to load {}", path.display()))?);
    }
    if frames.is_empty() {
        bail!("No input frames given (pass files or --manifest)");
    }
    Ok(frames)
}

/// Drives an indicatif bar from the pipeline's stage callbacks.
struct BarReporter {
    pb: ProgressBar,
}

impl BarReporter {
    fn new() -> Result<Self> {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:22} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self { pb })
    }

    fn finish(&self) {
        self.pb.finish_with_message("Done");
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.pb.set_message(stage.to_string());
        self.pb.set_length(total_items.unwrap_or(1) as u64);
        self.pb.set_position(0);
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.pb.length() {
            self.pb.set_position(len);
        }
    }
}
