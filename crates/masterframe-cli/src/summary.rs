use std::path::Path;

use console::Style;
use masterframe_core::pipeline::config::{CombineConfig, Rejection};
use masterframe_core::quality::QualityReport;
use masterframe_core::stack::ClipOutcome;
use masterframe_core::stats::DistributionSummary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_combine_summary(config: &CombineConfig, frame_count: usize, output: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Master Frame"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(12)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(frame_count)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Rejection"));
    match config.rejection {
        Rejection::SigmaClip => {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Method"),
                s.method.apply_to(config.rejection)
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Threshold"),
                s.value.apply_to(format!("{} sigma", config.clip.threshold_sigma))
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Max iters"),
                s.value.apply_to(config.clip.max_iterations)
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Center"),
                s.method.apply_to(config.clip.center)
            );
            if config.pre_clip {
                println!(
                    "    {:<12}{}",
                    s.label.apply_to("Pre-clip"),
                    s.value.apply_to("per frame")
                );
            }
        }
        Rejection::None => {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Method"),
                s.disabled.apply_to("disabled")
            );
        }
    }
    println!();

    println!("  {}", s.header.apply_to("Combination"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(config.combine)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Weighting"),
        s.method.apply_to(config.weighting)
    );
    if config.weighting.normalizes() {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Normalize"),
            s.value.apply_to("to first frame level")
        );
    }

    let sel = &config.selection;
    if !sel.is_unrestricted() {
        println!();
        println!("  {}", s.header.apply_to("Selection"));
        if let Some(kind) = sel.kind {
            println!("    {:<12}{}", s.label.apply_to("Kind"), s.value.apply_to(kind));
        }
        if let Some(exptime) = sel.exposure_time {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Exposure"),
                s.value.apply_to(format!("{exptime} s"))
            );
        }
        if let Some(ref filter) = sel.filter {
            println!("    {:<12}{}", s.label.apply_to("Filter"), s.value.apply_to(filter));
        }
        if let Some(ref date) = sel.date {
            println!("    {:<12}{}", s.label.apply_to("Date"), s.value.apply_to(date));
        }
    }
    println!();
}

pub fn print_quality_report(report: &QualityReport, clip: Option<&ClipOutcome>) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Statistics"));
    print_distribution(&s, "Before", &report.before);
    print_distribution(&s, "After", &report.after);
    println!(
        "    {:<12}{}",
        s.label.apply_to("Accepted"),
        s.value.apply_to(report.accepted)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Rejected"),
        s.value.apply_to(report.rejected)
    );
    if report.invalid > 0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Invalid"),
            s.disabled.apply_to(report.invalid)
        );
    }

    if let Some(clip) = clip {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Clipping"),
            s.method.apply_to(format!("{} after {} iteration(s)", clip.state, clip.iterations))
        );
        if clip.is_degenerate() {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Degenerate"),
                s.disabled.apply_to(format!("{} position(s)", clip.degenerate_lanes))
            );
        }
    }
}

fn print_distribution(s: &Styles, label: &str, summary: &DistributionSummary) {
    let text = match summary.stats() {
        Some(d) => format!(
            "mean {:.3}  median {:.3}  std {:.3}  min {:.3}  max {:.3}",
            d.mean, d.median, d.std_dev, d.min, d.max
        ),
        None => "no data".to_string(),
    };
    println!("    {:<12}{}", s.label.apply_to(label), s.value.apply_to(text));
}
