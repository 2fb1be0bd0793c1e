use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

use crate::error::{CombineError, Result};
use crate::frame::{Frame, FrameMetadata};

/// N equally-shaped frames held as one `(N, H, W)` cube.
///
/// The cube is append-only; once built it is only read. Frame metadata is
/// kept in the same order as the cube's stacking axis.
#[derive(Clone, Debug)]
pub struct FrameStack {
    cube: Array3<f64>,
    metadata: Vec<FrameMetadata>,
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStack {
    pub fn new() -> Self {
        Self {
            cube: Array3::zeros((0, 0, 0)),
            metadata: Vec::new(),
        }
    }

    /// Build a stack from frames, failing on the first shape disagreement.
    ///
    /// Nothing is returned on failure, so a partially built stack never
    /// escapes.
    pub fn from_frames<I>(frames: I) -> Result<Self>
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut stack = Self::new();
        for frame in frames {
            stack.append(frame)?;
        }
        Ok(stack)
    }

    /// Append a frame, establishing the stack shape on the first call.
    pub fn append(&mut self, frame: Frame) -> Result<()> {
        let (h, w) = frame.data.dim();
        if h == 0 || w == 0 {
            return Err(CombineError::InvalidDimensions {
                width: w,
                height: h,
            });
        }

        match self.shape() {
            None => {
                self.cube = frame.data.insert_axis(Axis(0));
            }
            Some(expected) => {
                if expected != (h, w) {
                    return Err(CombineError::ShapeMismatch {
                        index: self.size(),
                        expected,
                        actual: (h, w),
                    });
                }
                self.cube
                    .push(Axis(0), frame.data.view())
                    .map_err(|_| CombineError::ShapeMismatch {
                        index: self.metadata.len(),
                        expected,
                        actual: (h, w),
                    })?;
            }
        }

        self.metadata.push(frame.metadata);
        Ok(())
    }

    /// Immutable `(N, H, W)` view of the cube.
    pub fn stack(&self) -> ArrayView3<'_, f64> {
        self.cube.view()
    }

    pub fn size(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// `(height, width)` of every frame, or `None` for an empty stack.
    pub fn shape(&self) -> Option<(usize, usize)> {
        if self.is_empty() {
            None
        } else {
            let (_, h, w) = self.cube.dim();
            Some((h, w))
        }
    }

    pub fn frame(&self, index: usize) -> Option<ArrayView2<'_, f64>> {
        (index < self.size()).then(|| self.cube.index_axis(Axis(0), index))
    }

    pub fn metadata(&self) -> &[FrameMetadata] {
        &self.metadata
    }

    pub fn ids(&self) -> Vec<String> {
        self.metadata.iter().map(|m| m.id.clone()).collect()
    }

    /// A copy of this stack with frame `i` multiplied by `factors[i]`.
    pub fn scaled(&self, factors: &[f64]) -> Result<Self> {
        if factors.len() != self.size() {
            return Err(CombineError::WeightCountMismatch {
                expected: self.size(),
                actual: factors.len(),
            });
        }
        let mut cube = self.cube.clone();
        for (mut frame, &factor) in cube.axis_iter_mut(Axis(0)).zip(factors) {
            frame *= factor;
        }
        Ok(Self {
            cube,
            metadata: self.metadata.clone(),
        })
    }

    /// Fail with `InsufficientFrames` unless the stack can be combined.
    pub fn require_combinable(&self) -> Result<()> {
        if self.size() < 2 {
            return Err(CombineError::InsufficientFrames { count: self.size() });
        }
        Ok(())
    }
}
