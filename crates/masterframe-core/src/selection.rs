use serde::{Deserialize, Serialize};

use crate::consts::{DATE_PREFIX_LEN, EXPOSURE_TOLERANCE_S};
use crate::frame::{Frame, FrameKind, FrameMetadata};

/// Metadata criteria deciding which frames take part in a combination.
///
/// Every criterion is optional; `None` accepts anything. Which criteria
/// apply depends on the frame kind: bias frames only match on kind, darks
/// also on exposure time, flats and lights additionally on filter. The date
/// criterion applies to every kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSelector {
    pub kind: Option<FrameKind>,
    pub exposure_time: Option<f64>,
    pub filter: Option<String>,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
}

impl FrameSelector {
    /// True when no criterion is set and selection is skipped entirely.
    pub fn is_unrestricted(&self) -> bool {
        self.kind.is_none()
            && self.exposure_time.is_none()
            && self.filter.is_none()
            && self.date.is_none()
    }

    pub fn accepts(&self, meta: &FrameMetadata) -> bool {
        if let Some(ref date) = self.date {
            let observed = meta.date_obs.as_deref().unwrap_or("");
            let observed = observed.get(..DATE_PREFIX_LEN).unwrap_or(observed);
            if observed != date {
                return false;
            }
        }

        let Some(kind) = meta.kind else {
            return false;
        };
        if self.kind.is_some_and(|k| k != kind) {
            return false;
        }

        match kind {
            FrameKind::Bias => true,
            FrameKind::Dark => self.exposure_matches(meta),
            FrameKind::Flat | FrameKind::Light => {
                self.exposure_matches(meta) && self.filter_matches(meta)
            }
        }
    }

    /// Keep the frames this selector accepts, preserving order.
    pub fn select(&self, frames: Vec<Frame>) -> Vec<Frame> {
        if self.is_unrestricted() {
            return frames;
        }
        frames
            .into_iter()
            .filter(|f| self.accepts(&f.metadata))
            .collect()
    }

    fn exposure_matches(&self, meta: &FrameMetadata) -> bool {
        match (self.exposure_time, meta.exposure_time) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => (wanted - actual).abs() <= EXPOSURE_TOLERANCE_S,
            (Some(_), None) => false,
        }
    }

    fn filter_matches(&self, meta: &FrameMetadata) -> bool {
        match (&self.filter, &meta.filter) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted == actual,
            (Some(_), None) => false,
        }
    }
}
