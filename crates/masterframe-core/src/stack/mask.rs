use ndarray::{Array2, Array3, ArrayView3, ArrayViewMut3, Axis};

use crate::error::{CombineError, Result};
use crate::stack::FrameStack;

/// Per-sample rejection flags for a `(N, H, W)` cube; `true` = rejected.
///
/// Pixel values and their validity travel separately: the cube is never
/// modified, only this mask is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectionMask {
    flags: Array3<bool>,
}

impl RejectionMask {
    /// An all-accepted mask of the given `(n, height, width)` shape.
    pub fn new(shape: (usize, usize, usize)) -> Self {
        Self {
            flags: Array3::from_elem(shape, false),
        }
    }

    /// An all-accepted mask matching a stack.
    pub fn for_stack(stack: &FrameStack) -> Self {
        Self::new(stack.stack().dim())
    }

    /// A mask seeded from a static bad-pixel map applied to every frame.
    pub fn with_bad_pixels(stack: &FrameStack, bad_pixels: &Array2<bool>) -> Result<Self> {
        let (n, h, w) = stack.stack().dim();
        if bad_pixels.dim() != (h, w) {
            return Err(CombineError::ShapeMismatch {
                index: 0,
                expected: (h, w),
                actual: bad_pixels.dim(),
            });
        }
        let flags = bad_pixels
            .view()
            .insert_axis(Axis(0))
            .broadcast((n, h, w))
            .map(|view| view.to_owned())
            .ok_or(CombineError::ShapeMismatch {
                index: 0,
                expected: (h, w),
                actual: bad_pixels.dim(),
            })?;
        Ok(Self { flags })
    }

    pub fn from_array(flags: Array3<bool>) -> Self {
        Self { flags }
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.flags.dim()
    }

    pub fn view(&self) -> ArrayView3<'_, bool> {
        self.flags.view()
    }

    pub(crate) fn view_mut(&mut self) -> ArrayViewMut3<'_, bool> {
        self.flags.view_mut()
    }

    pub fn into_inner(self) -> Array3<bool> {
        self.flags
    }

    /// Flag of one sample, or `None` outside the mask.
    pub fn is_rejected(&self, frame: usize, row: usize, col: usize) -> Option<bool> {
        self.flags.get([frame, row, col]).copied()
    }

    /// Total number of flagged samples, including seeded ones.
    pub fn rejected_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Fail with `MaskShapeMismatch` unless this mask covers the given cube.
    pub(crate) fn ensure_matches(&self, cube: &ArrayView3<'_, f64>) -> Result<()> {
        if self.dim() != cube.dim() {
            return Err(CombineError::MaskShapeMismatch {
                expected: cube.dim(),
                actual: self.dim(),
            });
        }
        Ok(())
    }
}
