use std::fmt;

use serde::Serialize;

use crate::pipeline::config::{CombineConfig, Rejection};

/// Deterministic record of how a combined frame was produced.
///
/// Identical sources and configuration always render to identical text.
/// Timestamps and command lines belong to the writer, not to this record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Provenance {
    pub sources: Vec<String>,
    pub config: CombineConfig,
}

impl Provenance {
    pub fn new(sources: Vec<String>, config: &CombineConfig) -> Self {
        Self {
            sources,
            config: config.clone(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.sources.len() + 11);
        lines.push("multiple frames are combined into a single frame".to_string());
        lines.push("List of combined files:".to_string());
        lines.extend(self.sources.iter().map(|id| format!("  {id}")));

        let clip = &self.config.clip;
        lines.push("Options given:".to_string());
        lines.push(format!("  rejection = {}", self.config.rejection));
        if self.config.rejection == Rejection::SigmaClip {
            lines.push(format!("  threshold = {:?} sigma", clip.threshold_sigma));
            lines.push(format!("  maxiters  = {}", clip.max_iterations));
            lines.push(format!("  cenfunc   = {}", clip.center));
            if self.config.pre_clip {
                lines.push("  preclip   = per-frame".to_string());
            }
        }
        lines.push(format!("  combine   = {}", self.config.combine));
        lines.push(format!("  weighting = {}", self.config.weighting));
        if self.config.weighting.normalizes() {
            lines.push("  normalize = first frame level".to_string());
        }
        lines
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
