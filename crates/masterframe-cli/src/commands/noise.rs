use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use masterframe_core::io::image_io::load_image;
use masterframe_core::quality::estimate_readout_noise;

use super::args::ClipArgs;
use crate::summary::print_quality_report;

#[derive(Args)]
pub struct NoiseArgs {
    /// First bias frame
    pub first: PathBuf,

    /// Second bias frame
    pub second: PathBuf,

    #[command(flatten)]
    pub clip: ClipArgs,
}

pub fn run(args: &NoiseArgs) -> Result<()> {
    let config = args.clip.to_config();
    let first = load_image(&args.first)
        .with_context(|| format!("Failed to load {}", args.first.display()))?;
    let second = load_image(&args.second)
        .with_context(|| format!("Failed to load {}", args.second.display()))?;

    let noise = estimate_readout_noise(&first, &second, &config)?;

    print_quality_report(&noise.difference.report, Some(&noise.difference.clip));
    println!("\nReadout noise: {:.3} ADU", noise.read_noise);
    Ok(())
}
