use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use masterframe_core::io::image_io::load_image;
use masterframe_core::quality::QualityReporter;
use masterframe_core::stats::DistributionSummary;

use super::args::ClipArgs;

#[derive(Args)]
pub struct StatsArgs {
    /// Input image files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub clip: ClipArgs,
}

const COLUMNS: [&str; 7] = ["min", "max", "mean", "median", "std", "skew", "kurt"];

pub fn run(args: &StatsArgs) -> Result<()> {
    let config = args.clip.to_config();
    config.validate()?;

    println!(
        "Sigma clipping: threshold {} sigma, maxiters {}, cenfunc {}\n",
        config.threshold_sigma, config.max_iterations, config.center
    );

    print_header();
    for path in &args.files {
        let frame =
            load_image(path).with_context(|| format!("Failed to load {}", path.display()))?;
        let result = QualityReporter::report_frame(&frame, &config)?;
        let report = &result.report;

        println!("{}", frame.id());
        print_row("before", &report.before);
        print_row("after", &report.after);
        println!(
            "{:>11} accepted {}, rejected {}, invalid {} ({}, {} iterations)",
            "",
            report.accepted,
            report.rejected,
            report.invalid,
            result.clip.state,
            result.clip.iterations
        );
    }
    Ok(())
}

fn print_header() {
    print!("{:>11}", "");
    for name in COLUMNS {
        print!("{:>11}", name);
    }
    println!();
    println!("{}", "-".repeat(11 * (COLUMNS.len() + 1)));
}

fn print_row(label: &str, summary: &DistributionSummary) {
    match summary.stats() {
        Some(s) => println!(
            "{:>11}{:>11.3}{:>11.3}{:>11.3}{:>11.3}{:>11.3}{:>11.3}{:>11.3}",
            label, s.min, s.max, s.mean, s.median, s.std_dev, s.skewness, s.kurtosis
        ),
        None => println!("{:>11}{:>11}", label, "no data"),
    }
}
