//! Border-artifact classification.

use crate::regions::{BoundingBox, Region};

/// A region tagged with its border-artifact decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRegion {
    /// The extracted region.
    pub region: Region,
    /// Whether the region touches, or nearly touches, the top or bottom edge.
    pub is_artifact: bool,
}

/// Whether a box lies within `y_threshold` pixels of the top or bottom edge
/// of an image `image_height` pixels tall.
///
/// True iff `top <= y_threshold` or `image_height - bottom <= y_threshold`.
/// `bottom` is exclusive, so a box ending on the last row has distance 0.
#[must_use]
pub fn is_border_artifact(bounds: &BoundingBox, image_height: u32, y_threshold: u32) -> bool {
    bounds.top <= y_threshold || image_height.saturating_sub(bounds.bottom) <= y_threshold
}

/// Tag every region with its border-artifact decision.
#[must_use]
pub fn classify(regions: Vec<Region>, image_height: u32, y_threshold: u32) -> Vec<ClassifiedRegion> {
    regions
        .into_iter()
        .map(|region| {
            let is_artifact = is_border_artifact(&region.bounds, image_height, y_threshold);
            ClassifiedRegion {
                region,
                is_artifact,
            }
        })
        .collect()
}
