use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Shape mismatch for frame {index}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        index: usize,
        /// (height, width) established by the first frame.
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Rejection mask shape {actual:?} does not match stack shape {expected:?}")]
    MaskShapeMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error("At least 2 frames are required for combining, got {count}")]
    InsufficientFrames { count: usize },

    #[error("No unmasked samples at pixel ({row}, {col})")]
    EmptyPixelStack { row: usize, col: usize },

    #[error("No pixel position holds valid data")]
    NoValidData,

    #[error("Expected {expected} weights, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },

    #[error("Invalid weight {value} for frame {index}")]
    InvalidWeight { index: usize, value: f64 },

    #[error("Frame '{id}' declares no weight")]
    MissingWeight { id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CombineError>;
