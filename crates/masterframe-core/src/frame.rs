use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// A single grayscale frame.
/// Pixel values are f64 ADU; non-finite values mark unusable pixels.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f64>,
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: Array2<f64>, id: impl Into<String>) -> Self {
        Self {
            data,
            metadata: FrameMetadata::new(id),
        }
    }

    pub fn with_metadata(data: Array2<f64>, metadata: FrameMetadata) -> Self {
        Self { data, metadata }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}

/// Metadata supplied by the frame loader.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    /// Identifier recorded in provenance, usually the source file name.
    pub id: String,
    /// Declared normalization weight.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub kind: Option<FrameKind>,
    /// Exposure time in seconds.
    #[serde(default)]
    pub exposure_time: Option<f64>,
    #[serde(default)]
    pub filter: Option<String>,
    /// Observation date, `YYYY-MM-DD` optionally followed by a time part.
    #[serde(default)]
    pub date_obs: Option<String>,
}

impl FrameMetadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Calibration role of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Bias,
    Dark,
    Flat,
    Light,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bias => write!(f, "BIAS"),
            Self::Dark => write!(f, "DARK"),
            Self::Flat => write!(f, "FLAT"),
            Self::Light => write!(f, "LIGHT"),
        }
    }
}
