//! Binary dilation with an elliptical structuring element.
//!
//! A wide, flat ellipse bridges horizontal gaps inside one mark (dashes,
//! broken rules, ragged smudges) without gluing together marks that are
//! stacked vertically.

use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_dilate, Mask};

use crate::binarize::FOREGROUND;
use crate::config::MAX_DILATE;

/// An elliptical structuring element anchored at its center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    mask: Mask,
}

impl StructuringElement {
    /// Rasterize an ellipse inscribed in a `width x height` box, anchored at
    /// its center `(width / 2, height / 2)`.
    ///
    /// Row `i` covers columns `c - dx ..= c + dx` where
    /// `dx = round(c * sqrt(1 - (dy / r)^2))`, `dy = i - r`, `r = height / 2`
    /// and `c = width / 2`.
    ///
    /// A height of 1 yields a full horizontal line. OpenCV's
    /// `getStructuringElement` collapses that case to the single center
    /// pixel, which would turn merging off.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or larger than
    /// [`MAX_DILATE`](crate::MAX_DILATE).
    #[must_use]
    #[allow(
        clippy::cast_possible_wrap,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn ellipse(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "structuring element must be non-empty");
        assert!(
            width <= MAX_DILATE && height <= MAX_DILATE,
            "structuring element must fit in {MAX_DILATE}x{MAX_DILATE}"
        );
        let c = (width / 2) as i32;
        let r = (height / 2) as i32;
        let w = width as i32;

        let mut shape = GrayImage::new(width, height);
        for i in 0..height as i32 {
            let dy = i - r;
            let dx = if r == 0 {
                c
            } else {
                let ratio = f64::from(r * r - dy * dy) / f64::from(r * r);
                (f64::from(c) * ratio.sqrt()).round() as i32
            };
            for j in (c - dx).max(0)..(c + dx + 1).min(w) {
                shape.put_pixel(j as u32, i as u32, Luma([FOREGROUND]));
            }
        }

        Self {
            mask: Mask::from_image(&shape, c as u8, r as u8),
        }
    }
}

/// Dilate a binary mask.
///
/// A pixel becomes foreground iff the element, centered on it, covers a
/// foreground pixel. Samples outside the image count as background, so
/// dilation never invents ink at the border.
#[must_use]
pub fn dilate(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    grayscale_dilate(mask, &element.mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u32 = 512;

    /// Offsets covered by `element`, read back by dilating a single pixel.
    fn offsets(element: &StructuringElement) -> Vec<(i32, i32)> {
        let mut seed = GrayImage::new(2 * SEED + 1, 2 * SEED + 1);
        seed.put_pixel(SEED, SEED, Luma([255]));
        dilate(&seed, element)
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == 255)
            .map(|(x, y, _)| (SEED as i32 - x as i32, SEED as i32 - y as i32))
            .collect()
    }

    fn covers(element: &StructuringElement, dx: i32, dy: i32) -> bool {
        offsets(element).contains(&(dx, dy))
    }

    #[test]
    fn default_ellipse_is_a_flat_cross() {
        let element = StructuringElement::ellipse(15, 3);
        let offsets = offsets(&element);
        assert_eq!(offsets.len(), 17);
        for dx in -7..=7 {
            assert!(offsets.contains(&(dx, 0)), "center row misses {dx}");
        }
        assert!(offsets.contains(&(0, -1)));
        assert!(offsets.contains(&(0, 1)));
        assert!(!offsets.contains(&(1, -1)));
        assert!(!offsets.contains(&(-1, 1)));
    }

    #[test]
    fn round_ellipse_tapers_toward_the_poles() {
        let offsets = offsets(&StructuringElement::ellipse(5, 5));
        // rows: dx = 0, 2 (round(2*sqrt(3/4)) = 2), 2, 2, 0
        assert!(offsets.contains(&(0, -2)));
        assert!(!offsets.contains(&(1, -2)));
        assert!(offsets.contains(&(-2, -1)));
        assert!(offsets.contains(&(2, 0)));
        assert!(offsets.contains(&(0, 2)));
        assert_eq!(offsets.len(), 1 + 5 + 5 + 5 + 1);
    }

    #[test]
    fn single_row_element_is_a_line() {
        let offsets = offsets(&StructuringElement::ellipse(7, 1));
        assert_eq!(offsets.len(), 7);
        assert!(offsets.contains(&(-3, 0)));
        assert!(offsets.contains(&(3, 0)));
    }

    #[test]
    fn anchor_is_always_included() {
        for (w, h) in [(1, 1), (2, 2), (15, 3), (4, 9), (1, 6)] {
            assert!(covers(&StructuringElement::ellipse(w, h), 0, 0), "{w}x{h}");
        }
    }

    #[test]
    fn largest_element_can_be_built() {
        let element = StructuringElement::ellipse(MAX_DILATE, 3);
        assert_eq!(offsets(&element).len(), 511 + 2);
    }

    #[test]
    fn empty_mask_stays_empty() {
        let mask = GrayImage::new(20, 20);
        let out = dilate(&mask, &StructuringElement::ellipse(15, 3));
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn single_pixel_grows_into_element_shape() {
        let mut mask = GrayImage::new(30, 10);
        mask.put_pixel(15, 5, Luma([255]));

        let out = dilate(&mask, &StructuringElement::ellipse(15, 3));

        for (x, y, px) in out.enumerate_pixels() {
            let expected = (y == 5 && (8..=22).contains(&x)) || (x == 15 && (4..=6).contains(&y));
            assert_eq!(px[0] == 255, expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn even_sized_element_grows_about_its_anchor() {
        let mut mask = GrayImage::new(12, 12);
        mask.put_pixel(6, 6, Luma([255]));

        // 4x2: r = 1, c = 2, row 0 is dy = -1 with dx = 0; row 1 spans 0..4.
        let out = dilate(&mask, &StructuringElement::ellipse(4, 2));

        let lit: Vec<(u32, u32)> = out
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(lit, vec![(5, 6), (6, 6), (7, 6), (8, 6), (6, 7)]);
    }

    #[test]
    fn output_is_a_superset_of_input() {
        let mask = GrayImage::from_fn(40, 25, |x, y| {
            if (x * 3 + y * 5) % 11 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let out = dilate(&mask, &StructuringElement::ellipse(15, 3));
        for (a, b) in mask.pixels().zip(out.pixels()) {
            if a[0] != 0 {
                assert_eq!(b[0], 255);
            }
        }
    }

    #[test]
    fn bridges_horizontal_gap_but_not_vertical() {
        let mut mask = GrayImage::new(40, 20);
        for x in 5..15 {
            mask.put_pixel(x, 5, Luma([255]));
        }
        for x in 25..35 {
            mask.put_pixel(x, 5, Luma([255]));
        }
        for x in 5..15 {
            mask.put_pixel(x, 10, Luma([255]));
        }

        let out = dilate(&mask, &StructuringElement::ellipse(15, 3));

        assert!((5..35).all(|x| out.get_pixel(x, 5)[0] == 255));
        assert_eq!(out.get_pixel(10, 8)[0], 0);
    }

    #[test]
    fn clips_at_image_border() {
        let mut mask = GrayImage::new(10, 4);
        mask.put_pixel(0, 0, Luma([255]));
        let out = dilate(&mask, &StructuringElement::ellipse(15, 3));
        assert!((0..8).all(|x| out.get_pixel(x, 0)[0] == 255));
        assert_eq!(out.get_pixel(8, 0)[0], 0);
        assert_eq!(out.get_pixel(0, 1)[0], 255);
        assert_eq!(out.get_pixel(1, 1)[0], 0);
    }
}
