#[allow(dead_code)]
mod common;

use std::sync::Mutex;

use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};

use common::{constant_frames, constant_stack, make_frame, noise_frame, tagged_frame};
use masterframe_core::error::CombineError;
use masterframe_core::frame::{Frame, FrameKind};
use masterframe_core::io::image_io::{load_image, save_tiff};
use masterframe_core::pipeline::config::{CombineConfig, Rejection};
use masterframe_core::pipeline::{
    combine_frames, combine_frames_reported, combine_masked, combine_stack, PipelineStage,
    ProgressReporter,
};
use masterframe_core::stack::{ClipConfig, ClipState, CombineFunc, RejectionMask, Weighting};
use masterframe_core::stats::CenterFunc;

fn outlier_config() -> CombineConfig {
    CombineConfig {
        clip: ClipConfig::new(1.5, 10, CenterFunc::Mean),
        ..Default::default()
    }
}

#[derive(Default)]
struct RecordingReporter {
    stages: Mutex<Vec<PipelineStage>>,
}

impl ProgressReporter for RecordingReporter {
    fn begin_stage(&self, stage: PipelineStage, _total_items: Option<usize>) {
        self.stages.lock().unwrap().push(stage);
    }
}

// ---------------------------------------------------------------------------
// End-to-end combination
// ---------------------------------------------------------------------------

#[test]
fn test_outlier_frame_removed_from_master() {
    let frames = constant_frames(6, 6, &[10.0, 10.0, 10.0, 10.0, 100.0]);
    let output = combine_frames(frames, &outlier_config()).unwrap();

    assert!(output.frame.data.iter().all(|&v| (v - 10.0).abs() < 1e-12));
    assert!(output.frame.accepted.iter().all(|&n| n == 4));
    assert_eq!(output.frame.filled_positions, 0);
    assert_eq!(output.frame.sources.len(), 5);
    let clip = output.frame.clip.unwrap();
    assert_eq!(clip.state, ClipState::Converged);
    assert_eq!(output.report.rejected, 36);
    assert_eq!(output.report.accepted, 144);
}

#[test]
fn test_identical_frames_pass_through() {
    let frame = noise_frame(16, 16, 300.0, 20.0, 99, "a");
    let mut twin = frame.clone();
    twin.metadata.id = "b".into();

    let output = combine_frames(vec![frame.clone(), twin], &CombineConfig::default()).unwrap();
    assert_eq!(output.frame.data, frame.data);
    assert_eq!(output.report.rejected, 0);
    assert!(output.frame.accepted.iter().all(|&n| n == 2));
}

#[test]
fn test_without_rejection_is_plain_mean() {
    let config = CombineConfig {
        rejection: Rejection::None,
        ..outlier_config()
    };
    let frames = constant_frames(2, 2, &[10.0, 10.0, 10.0, 10.0, 100.0]);
    let output = combine_frames(frames, &config).unwrap();
    assert!(output.frame.clip.is_none());
    assert!(output.frame.data.iter().all(|&v| (v - 28.0).abs() < 1e-12));
    assert_eq!(output.report.rejected, 0);
}

#[test]
fn test_median_combination() {
    let config = CombineConfig {
        combine: CombineFunc::Median,
        ..Default::default()
    };
    let frames = constant_frames(2, 2, &[1.0, 2.0, 3.0, 50.0]);
    let output = combine_frames(frames, &config).unwrap();
    assert!(output.frame.data.iter().all(|&v| (v - 2.5).abs() < 1e-12));
}

#[test]
fn test_frame_median_weighting_normalizes_levels() {
    let config = CombineConfig {
        rejection: Rejection::None,
        weighting: Weighting::FrameMedian,
        ..Default::default()
    };
    let frames = constant_frames(2, 2, &[1000.0, 2000.0]);
    let output = combine_frames(frames, &config).unwrap();
    assert!(output.frame.data.iter().all(|&v| v == 1000.0));
}

#[test]
fn test_flats_at_mixed_illumination_are_not_clipped() {
    let pattern = array![[0.875, 1.0, 1.125], [0.75, 1.0, 1.25], [1.0, 1.0, 1.0]];
    let flats: Vec<Frame> = [1000.0, 1000.0, 1000.0, 2000.0, 2000.0]
        .iter()
        .enumerate()
        .map(|(i, &level)| Frame::new(&pattern * level, format!("flat{i}")))
        .collect();
    let clip = ClipConfig::new(1.0, 10, CenterFunc::Median);

    let config = CombineConfig {
        weighting: Weighting::FrameMedian,
        clip: clip.clone(),
        ..Default::default()
    };
    let output = combine_frames(flats.clone(), &config).unwrap();
    assert_eq!(output.report.rejected, 0);
    assert_eq!(output.frame.data, &pattern * 1000.0);

    // Without normalization the brighter frames are rejected on level alone.
    let config = CombineConfig {
        clip,
        ..Default::default()
    };
    let output = combine_frames(flats, &config).unwrap();
    assert_eq!(output.report.rejected, 18);
}

#[test]
fn test_noisy_stack_keeps_level() {
    let frames: Vec<_> = (0..9)
        .map(|i| noise_frame(32, 32, 500.0, 4.0, 7 + i, &format!("n{i}")))
        .collect();
    let output = combine_frames(frames, &CombineConfig::default()).unwrap();
    let mean = output.frame.data.mean().unwrap();
    assert!((mean - 500.0).abs() < 0.5, "mean {mean}");
}

// ---------------------------------------------------------------------------
// Selection and failures
// ---------------------------------------------------------------------------

#[test]
fn test_selection_filters_before_stacking() {
    let mut config = CombineConfig::default();
    config.selection.kind = Some(FrameKind::Bias);

    let frames = vec![
        tagged_frame("b1", Some(FrameKind::Bias), None, None, None),
        tagged_frame("d1", Some(FrameKind::Dark), Some(10.0), None, None),
        tagged_frame("b2", Some(FrameKind::Bias), None, None, None),
        tagged_frame("x", None, None, None, None),
    ];
    let output = combine_frames(frames, &config).unwrap();
    assert_eq!(output.frame.sources, vec!["b1", "b2"]);
}

#[test]
fn test_too_few_selected_frames() {
    let mut config = CombineConfig::default();
    config.selection.kind = Some(FrameKind::Flat);
    let frames = vec![
        tagged_frame("f1", Some(FrameKind::Flat), None, None, None),
        tagged_frame("b1", Some(FrameKind::Bias), None, None, None),
    ];
    let err = combine_frames(frames, &config).unwrap_err();
    assert!(matches!(err, CombineError::InsufficientFrames { count: 1 }));
}

#[test]
fn test_shape_mismatch_aborts_combination() {
    let mut frames = constant_frames(4, 4, &[1.0, 2.0]);
    frames.push(make_frame(4, 3, 3.0, "odd"));
    let err = combine_frames(frames, &CombineConfig::default()).unwrap_err();
    assert!(matches!(err, CombineError::ShapeMismatch { index: 2, .. }));
}

#[test]
fn test_invalid_config_fails_before_any_stage() {
    let mut config = CombineConfig::default();
    config.clip.threshold_sigma = 0.0;
    let reporter = RecordingReporter::default();

    let err = combine_frames_reported(constant_frames(2, 2, &[1.0, 2.0]), &config, &reporter)
        .unwrap_err();
    assert!(matches!(err, CombineError::InvalidConfig(_)));
    assert!(reporter.stages.lock().unwrap().is_empty());
}

#[test]
fn test_missing_declared_weight() {
    let config = CombineConfig {
        weighting: Weighting::Declared,
        ..Default::default()
    };
    let err = combine_frames(constant_frames(2, 2, &[1.0, 2.0]), &config).unwrap_err();
    assert!(matches!(err, CombineError::MissingWeight { .. }));
}

// ---------------------------------------------------------------------------
// Progress and seeded masks
// ---------------------------------------------------------------------------

#[test]
fn test_stages_reported_in_order() {
    let reporter = RecordingReporter::default();
    combine_frames_reported(
        constant_frames(2, 2, &[1.0, 2.0, 3.0]),
        &CombineConfig::default(),
        &reporter,
    )
    .unwrap();
    assert_eq!(
        *reporter.stages.lock().unwrap(),
        vec![
            PipelineStage::Selecting,
            PipelineStage::Stacking,
            PipelineStage::Weighting,
            PipelineStage::Clipping,
            PipelineStage::Combining,
            PipelineStage::Reporting,
        ]
    );

    let reporter = RecordingReporter::default();
    let config = CombineConfig {
        rejection: Rejection::None,
        ..Default::default()
    };
    combine_frames_reported(constant_frames(2, 2, &[1.0, 2.0]), &config, &reporter).unwrap();
    assert!(!reporter.stages.lock().unwrap().contains(&PipelineStage::Clipping));
}

#[test]
fn test_bad_pixels_filled() {
    let stack = constant_stack(3, 3, &[5.0, 5.0, 5.0]);
    let mut bad = Array2::from_elem((3, 3), false);
    bad[[2, 2]] = true;
    let mask = RejectionMask::with_bad_pixels(&stack, &bad).unwrap();

    let reporter = RecordingReporter::default();
    let output = combine_masked(&stack, mask, &CombineConfig::default(), &reporter).unwrap();
    assert_eq!(output.frame.filled_positions, 1);
    assert_eq!(output.frame.accepted[[2, 2]], 0);
    assert_eq!(output.frame.data[[2, 2]], 5.0);
    assert_eq!(output.frame.clip.unwrap().empty_lanes, 1);
    assert_eq!(output.report.rejected, 3);
}

#[test]
fn test_pre_clip_rejects_hot_pixel_stack_clip_misses() {
    let mut hot = make_frame(8, 8, 100.0, "hot");
    hot.data[[1, 1]] = 130.0;
    let frames = vec![hot, make_frame(8, 8, 100.0, "a"), make_frame(8, 8, 100.0, "b")];

    // Along the stack 130 is only 2.1 sigma from the median.
    let output = combine_frames(frames.clone(), &CombineConfig::default()).unwrap();
    assert_abs_diff_eq!(output.frame.data[[1, 1]], 110.0, epsilon = 1e-12);
    assert_eq!(output.report.rejected, 0);

    let config = CombineConfig {
        pre_clip: true,
        ..Default::default()
    };
    let output = combine_frames(frames, &config).unwrap();
    assert_eq!(output.frame.data[[1, 1]], 100.0);
    assert_eq!(output.frame.accepted[[1, 1]], 2);
    assert_eq!(output.report.rejected, 1);
    assert_eq!(output.frame.clip.unwrap().newly_rejected, 0);
    assert!(output
        .frame
        .provenance()
        .lines()
        .contains(&"  preclip   = per-frame".to_string()));
}

#[test]
fn test_combine_stack_matches_combine_frames() {
    let values = [3.0, 4.0, 5.0, 40.0];
    let config = outlier_config();
    let from_stack = combine_stack(&constant_stack(2, 2, &values), &config).unwrap();
    let from_frames = combine_frames(constant_frames(2, 2, &values), &config).unwrap();
    assert_eq!(from_stack.frame.data, from_frames.frame.data);
    assert_eq!(from_stack.report, from_frames.report);
}

// ---------------------------------------------------------------------------
// Files on disk
// ---------------------------------------------------------------------------

#[test]
fn test_combine_frames_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut frames = Vec::new();
    for (i, level) in [200.0, 201.0, 199.0, 200.0, 4000.0].iter().enumerate() {
        let path = dir.path().join(format!("bias_{i:03}.tiff"));
        save_tiff(&Array2::from_elem((8, 8), *level), &path).unwrap();
        frames.push(load_image(&path).unwrap());
    }

    let output = combine_frames(frames, &outlier_config()).unwrap();
    assert_eq!(output.frame.sources[0], "bias_000.tiff");

    let master = dir.path().join("master.tiff");
    save_tiff(&output.frame.data, &master).unwrap();
    let reloaded = load_image(&master).unwrap();
    // 4000 is rejected; the rest average to 200.
    assert!(reloaded.data.iter().all(|&v| v == 200.0));
}
