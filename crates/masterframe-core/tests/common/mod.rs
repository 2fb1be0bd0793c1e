use ndarray::Array2;

use masterframe_core::frame::{Frame, FrameKind, FrameMetadata};
use masterframe_core::stack::FrameStack;

/// Constant-valued frame.
pub fn make_frame(h: usize, w: usize, fill: f64, id: &str) -> Frame {
    Frame::new(Array2::from_elem((h, w), fill), id)
}

/// One constant frame per value, ids `f0`, `f1`, ...
pub fn constant_frames(h: usize, w: usize, values: &[f64]) -> Vec<Frame> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| make_frame(h, w, v, &format!("f{i}")))
        .collect()
}

pub fn constant_stack(h: usize, w: usize, values: &[f64]) -> FrameStack {
    FrameStack::from_frames(constant_frames(h, w, values)).unwrap()
}

/// Frame with metadata for selection tests.
pub fn tagged_frame(
    id: &str,
    kind: Option<FrameKind>,
    exposure_time: Option<f64>,
    filter: Option<&str>,
    date_obs: Option<&str>,
) -> Frame {
    let metadata = FrameMetadata {
        id: id.to_string(),
        weight: None,
        kind,
        exposure_time,
        filter: filter.map(str::to_string),
        date_obs: date_obs.map(str::to_string),
    };
    Frame::with_metadata(Array2::zeros((2, 2)), metadata)
}

/// Deterministic pseudo-random values in [0, 1) (64-bit LCG).
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Approximately normal sample (sum of 12 uniforms).
    pub fn next_gaussian(&mut self, mean: f64, sigma: f64) -> f64 {
        let s: f64 = (0..12).map(|_| self.next_f64()).sum();
        mean + (s - 6.0) * sigma
    }
}

/// Frame of gaussian noise around `mean`.
pub fn noise_frame(h: usize, w: usize, mean: f64, sigma: f64, seed: u64, id: &str) -> Frame {
    let mut rng = Lcg::new(seed);
    let data = Array2::from_shape_simple_fn((h, w), || rng.next_gaussian(mean, sigma));
    Frame::new(data, id)
}
