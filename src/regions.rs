//! External contour extraction.
//!
//! Borders are traced with `imageproc`'s Suzuki-Abe follower. Only
//! outermost components are kept; holes and anything nested inside a hole
//! are dropped.

use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Axis-aligned bounding box in image coordinates.
///
/// `left` and `top` are inclusive, `right` and `bottom` exclusive, so a box
/// around a single pixel at `(x, y)` is `{x, y, x + 1, y + 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// First column covered.
    pub left: u32,
    /// First row covered.
    pub top: u32,
    /// One past the last column covered.
    pub right: u32,
    /// One past the last row covered.
    pub bottom: u32,
}

impl BoundingBox {
    /// Smallest box enclosing `points`, or `None` if there are none.
    ///
    /// Points with negative coordinates are clamped to zero.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn enclosing(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            left: min_x.max(0) as u32,
            top: min_y.max(0) as u32,
            right: max_x.max(0) as u32 + 1,
            bottom: max_y.max(0) as u32 + 1,
        })
    }

    /// Box width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    /// Box height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// A merged connected component: its simplified outline and bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Outer boundary, reduced to the vertices where the trace turns.
    pub contour: Vec<Point<i32>>,
    /// Bounding box of the full traced boundary.
    pub bounds: BoundingBox,
}

/// Extract the outermost connected components of a binary mask.
///
/// Any non-zero pixel is foreground. An empty mask yields no regions.
/// Components touching the image edges are traced like any other.
#[must_use]
pub fn extract_regions(mask: &GrayImage) -> Vec<Region> {
    // The tracer needs a background frame around every component, so trace
    // a one-pixel padded copy and shift the points back.
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut padded, mask, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let points: Vec<Point<i32>> = c
                .points
                .iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            let bounds = BoundingBox::enclosing(&points)?;
            Some(Region {
                contour: simplify_chain(&points),
                bounds,
            })
        })
        .collect()
}

/// Keep only the points where a closed boundary chain changes direction.
///
/// Straight horizontal, vertical and diagonal runs collapse to their end
/// points. Chains of fewer than three points are returned as they are.
#[must_use]
pub fn simplify_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let simplified: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            step(prev, curr) != step(curr, next)
        })
        .map(|i| points[i])
        .collect();

    if simplified.is_empty() {
        // Every step points the same way: a chain that retraces a single
        // point, so any element stands in for the whole.
        vec![points[0]]
    } else {
        simplified
    }
}

fn step(from: Point<i32>, to: Point<i32>) -> (i32, i32) {
    ((to.x - from.x).signum(), (to.y - from.y).signum())
}
