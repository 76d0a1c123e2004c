//! Tunable pipeline parameters.

use crate::error::{Error, Result};

/// Default adaptive threshold neighborhood size.
pub const DEFAULT_BLOCK_SIZE: u32 = 15;
/// Default constant subtracted from the local mean.
pub const DEFAULT_OFFSET: i32 = 7;
/// Default structuring element width.
pub const DEFAULT_DILATE_X: u32 = 15;
/// Default structuring element height.
pub const DEFAULT_DILATE_Y: u32 = 3;
/// Default vertical tolerance against the top and bottom edges.
pub const DEFAULT_Y_THRESHOLD: u32 = 2;
/// Largest structuring element side accepted.
pub const MAX_DILATE: u32 = 511;

/// Parameters controlling binarization, merging and border filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Adaptive threshold neighborhood size. Must be odd and greater than 1.
    pub block_size: u32,
    /// Constant subtracted from the local mean. Higher is stricter.
    pub offset: i32,
    /// Width of the elliptical structuring element.
    pub dilate_x: u32,
    /// Height of the elliptical structuring element.
    pub dilate_y: u32,
    /// A region is an artifact if its box comes within this many pixels of
    /// the top or bottom edge.
    pub y_threshold: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            offset: DEFAULT_OFFSET,
            dilate_x: DEFAULT_DILATE_X,
            dilate_y: DEFAULT_DILATE_Y,
            y_threshold: DEFAULT_Y_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    /// Check every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the block size is even or not
    /// greater than 1, or if either dilation dimension is zero or above
    /// [`MAX_DILATE`].
    pub fn validate(&self) -> Result<()> {
        if self.block_size <= 1 || self.block_size % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "block size must be odd and greater than 1, got {}",
                self.block_size
            )));
        }
        if self.dilate_x == 0 || self.dilate_y == 0 {
            return Err(Error::InvalidConfig(format!(
                "dilation kernel must be at least 1x1, got {}x{}",
                self.dilate_x, self.dilate_y
            )));
        }
        if self.dilate_x > MAX_DILATE || self.dilate_y > MAX_DILATE {
            return Err(Error::InvalidConfig(format!(
                "dilation kernel must be at most {MAX_DILATE}x{MAX_DILATE}, got {}x{}",
                self.dilate_x, self.dilate_y
            )));
        }
        Ok(())
    }
}
