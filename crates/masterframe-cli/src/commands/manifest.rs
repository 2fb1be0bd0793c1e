use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use masterframe_core::frame::{Frame, FrameKind, FrameMetadata};
use masterframe_core::io::image_io::load_image_with_metadata;
use serde::Deserialize;

/// A list of frames with their metadata, read from TOML:
///
/// ```toml
/// [[frame]]
/// path = "flat_001.tiff"
/// kind = "flat"
/// filter = "V"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(rename = "frame", default)]
    pub frames: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub path: PathBuf,
    pub id: Option<String>,
    pub kind: Option<FrameKind>,
    pub exptime: Option<f64>,
    pub filter: Option<String>,
    pub date: Option<String>,
    pub weight: Option<f64>,
}

impl ManifestEntry {
    fn metadata(&self) -> FrameMetadata {
        let id = self.id.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        });
        FrameMetadata {
            id,
            weight: self.weight,
            kind: self.kind,
            exposure_time: self.exptime,
            filter: self.filter.clone(),
            date_obs: self.date.clone(),
        }
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid manifest {}", path.display()))
    }

    /// Load every listed frame. Relative paths resolve against `base`.
    pub fn load_frames(&self, base: &Path) -> Result<Vec<Frame>> {
        self.frames
            .iter()
            .map(|entry| {
                let path = if entry.path.is_absolute() {
                    entry.path.clone()
                } else {
                    base.join(&entry.path)
                };
                load_image_with_metadata(&path, entry.metadata())
                    .with_context(|| format!("Failed to load {}", path.display()))
            })
            .collect()
    }
}
