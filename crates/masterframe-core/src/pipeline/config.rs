use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::selection::FrameSelector;
use crate::stack::combine::CombineFunc;
use crate::stack::sigma_clip::ClipConfig;
use crate::stack::weights::Weighting;

/// Everything that decides how a set of frames becomes one master frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    pub rejection: Rejection,
    pub combine: CombineFunc,
    pub weighting: Weighting,
    /// Clip each frame on its own (all pixels as one lane) before clipping
    /// along the stack. Only applies with sigma-clip rejection.
    pub pre_clip: bool,
    pub clip: ClipConfig,
    pub selection: FrameSelector,
}

impl CombineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rejection == Rejection::SigmaClip {
            self.clip.validate()?;
        }
        Ok(())
    }
}

/// Outlier rejection applied before combining.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    #[serde(rename = "none")]
    None,
    #[default]
    #[serde(rename = "sigclip")]
    SigmaClip,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::SigmaClip => write!(f, "sigclip"),
        }
    }
}
