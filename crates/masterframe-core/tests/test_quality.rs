#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::{Array2, Array3};

use common::{constant_stack, make_frame, noise_frame};
use masterframe_core::error::CombineError;
use masterframe_core::frame::Frame;
use masterframe_core::quality::{estimate_readout_noise, QualityReporter};
use masterframe_core::stack::sigma_clip::sigma_clip_stack;
use masterframe_core::stack::{ClipConfig, ClipState};
use masterframe_core::stats::CenterFunc;

// ---------------------------------------------------------------------------
// Stack reports
// ---------------------------------------------------------------------------

#[test]
fn test_report_before_and_after_clipping() {
    let stack = constant_stack(2, 2, &[10.0, 10.0, 10.0, 10.0, 100.0]);
    let config = ClipConfig::new(1.5, 10, CenterFunc::Mean);
    let (mask, _) = sigma_clip_stack(&stack, &config).unwrap();

    let report = QualityReporter::report(&stack, &mask).unwrap();
    assert_eq!(report.accepted, 16);
    assert_eq!(report.rejected, 4);
    assert_eq!(report.invalid, 0);
    assert_eq!(report.total(), 20);

    let before = report.before.stats().unwrap();
    assert_eq!(before.count, 20);
    assert_eq!(before.max, 100.0);
    assert_abs_diff_eq!(before.mean, 28.0, epsilon = 1e-12);
    assert!(before.skewness > 0.0);

    let after = report.after.stats().unwrap();
    assert_eq!(after.count, 16);
    assert_eq!(after.max, 10.0);
    assert_eq!(after.std_dev, 0.0);
    assert_eq!(after.skewness, 0.0);
    assert_eq!(after.kurtosis, 0.0);
}

#[test]
fn test_report_counts_non_finite_as_invalid() {
    let mut cube = Array3::from_elem((3, 1, 2), 1.0);
    cube[[0, 0, 0]] = f64::NAN;
    cube[[1, 0, 1]] = f64::NEG_INFINITY;
    let mut mask = Array3::from_elem((3, 1, 2), false);
    mask[[2, 0, 0]] = true;

    let report = QualityReporter::report_cube(cube.view(), mask.view());
    assert_eq!(report.invalid, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.accepted, 3);
    assert_eq!(report.before.stats().unwrap().count, 4);
}

#[test]
fn test_report_all_rejected_is_no_data() {
    let cube = Array3::from_elem((2, 2, 2), 5.0);
    let mask = Array3::from_elem((2, 2, 2), true);
    let report = QualityReporter::report_cube(cube.view(), mask.view());
    assert!(!report.before.is_no_data());
    assert!(report.after.is_no_data());
    assert_eq!(report.accepted, 0);
}

#[test]
fn test_report_mask_shape_checked() {
    let stack = constant_stack(2, 2, &[1.0, 2.0]);
    let mask = masterframe_core::stack::RejectionMask::new((2, 3, 2));
    assert!(matches!(
        QualityReporter::report(&stack, &mask).unwrap_err(),
        CombineError::MaskShapeMismatch { .. }
    ));
}

// ---------------------------------------------------------------------------
// Single-frame reports
// ---------------------------------------------------------------------------

#[test]
fn test_frame_report_removes_hot_pixel() {
    let mut data = Array2::from_elem((10, 10), 100.0);
    data[[0, 0]] = 10_000.0;
    let frame = Frame::new(data, "hot");

    let result = QualityReporter::report_frame(&frame, &ClipConfig::diagnostic()).unwrap();
    assert_eq!(result.clip.state, ClipState::Converged);
    assert_eq!(result.report.rejected, 1);
    assert_eq!(result.report.accepted, 99);
    assert_eq!(result.report.before.stats().unwrap().max, 10_000.0);
    assert_eq!(result.report.after.stats().unwrap().max, 100.0);
}

#[test]
fn test_frame_report_constant_frame() {
    let frame = make_frame(4, 4, 3.0, "flat");
    let result = QualityReporter::report_frame(&frame, &ClipConfig::diagnostic()).unwrap();
    assert_eq!(result.report.before, result.report.after);
    assert_eq!(result.report.rejected, 0);
}

// ---------------------------------------------------------------------------
// Readout noise
// ---------------------------------------------------------------------------

#[test]
fn test_readout_noise_recovers_sigma() {
    let bias0 = noise_frame(64, 64, 1000.0, 5.0, 1, "bias0");
    let bias1 = noise_frame(64, 64, 1000.0, 5.0, 2, "bias1");

    let noise = estimate_readout_noise(&bias0, &bias1, &ClipConfig::diagnostic()).unwrap();
    assert!(
        (noise.read_noise - 5.0).abs() < 0.3,
        "read noise {} too far from 5.0",
        noise.read_noise
    );
    let diff = noise.difference.report.after.stats().unwrap();
    assert!(diff.mean.abs() < 0.5);
}

#[test]
fn test_readout_noise_identical_frames_is_zero() {
    let bias = make_frame(8, 8, 300.0, "bias");
    let noise = estimate_readout_noise(&bias, &bias, &ClipConfig::diagnostic()).unwrap();
    assert_eq!(noise.read_noise, 0.0);
}

#[test]
fn test_readout_noise_shape_mismatch() {
    let a = make_frame(8, 8, 1.0, "a");
    let b = make_frame(8, 6, 1.0, "b");
    let err = estimate_readout_noise(&a, &b, &ClipConfig::diagnostic()).unwrap_err();
    assert!(matches!(err, CombineError::ShapeMismatch { index: 1, .. }));
}

#[test]
fn test_readout_noise_without_data() {
    let a = make_frame(4, 4, f64::NAN, "a");
    let b = make_frame(4, 4, 1.0, "b");
    let err = estimate_readout_noise(&a, &b, &ClipConfig::diagnostic()).unwrap_err();
    assert!(matches!(err, CombineError::NoValidData));
}
