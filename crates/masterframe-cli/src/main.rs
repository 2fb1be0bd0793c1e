mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "masterframe", about = "Sigma-clipped combination of calibration frames")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine frames into a master frame
    Combine(commands::combine::CombineArgs),
    /// Show per-file statistics before and after clipping
    Stats(commands::stats::StatsArgs),
    /// Estimate read noise from two bias frames
    Noise(commands::noise::NoiseArgs),
    /// Print or save the default combination config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Combine(args) => commands::combine::run(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Noise(args) => commands::noise::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
