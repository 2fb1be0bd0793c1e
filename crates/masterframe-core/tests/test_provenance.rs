#[allow(dead_code)]
mod common;

use common::constant_frames;
use masterframe_core::io::provenance::Provenance;
use masterframe_core::pipeline::combine_frames;
use masterframe_core::pipeline::config::{CombineConfig, Rejection};
use masterframe_core::stack::Weighting;

fn sources() -> Vec<String> {
    vec!["bias_001.fits".to_string(), "bias_002.fits".to_string()]
}

#[test]
fn test_default_provenance_text() {
    let provenance = Provenance::new(sources(), &CombineConfig::default());
    let expected = "\
multiple frames are combined into a single frame
List of combined files:
  bias_001.fits
  bias_002.fits
Options given:
  rejection = sigclip
  threshold = 4.0 sigma
  maxiters  = 10
  cenfunc   = median
  combine   = mean
  weighting = uniform
";
    assert_eq!(provenance.to_string(), expected);
}

#[test]
fn test_provenance_without_rejection_omits_clip_options() {
    let config = CombineConfig {
        rejection: Rejection::None,
        ..Default::default()
    };
    let lines = Provenance::new(sources(), &config).lines();
    assert!(lines.contains(&"  rejection = none".to_string()));
    assert!(!lines.iter().any(|l| l.contains("threshold")));
    assert_eq!(lines.last().unwrap(), "  weighting = uniform");
}

#[test]
fn test_provenance_records_pre_clip_and_normalization() {
    let config = CombineConfig {
        pre_clip: true,
        weighting: Weighting::FrameMedian,
        ..Default::default()
    };
    let text = Provenance::new(sources(), &config).to_string();
    assert!(text.contains("  cenfunc   = median\n  preclip   = per-frame\n"));
    assert!(text.ends_with("  weighting = frame-median\n  normalize = first frame level\n"));

    let config = CombineConfig {
        rejection: Rejection::None,
        pre_clip: true,
        ..Default::default()
    };
    let lines = Provenance::new(sources(), &config).lines();
    assert!(!lines.iter().any(|l| l.contains("preclip")));
    assert!(!lines.iter().any(|l| l.contains("normalize")));
}

#[test]
fn test_provenance_is_deterministic() {
    let config = CombineConfig::default();
    let a = combine_frames(constant_frames(3, 3, &[1.0, 2.0, 3.0]), &config).unwrap();
    let b = combine_frames(constant_frames(3, 3, &[1.0, 2.0, 3.0]), &config).unwrap();
    assert_eq!(a.frame.provenance().to_string(), b.frame.provenance().to_string());
    assert_eq!(a.frame.provenance().sources, vec!["f0", "f1", "f2"]);
}
