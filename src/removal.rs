//! Contour-based erasing and outline rendering.
//!
//! Erasing paints each artifact's filled outline, boundary pixels included,
//! with the paper color. Only the contour geometry is used, never the
//! bounding box.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::regions::Region;

/// Paper color painted over erased artifacts.
pub const BACKGROUND: Luma<u8> = Luma([255]);

/// Outline color used in the diagnostic images.
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Return a copy of `gray` with every region in `regions` filled with
/// [`BACKGROUND`]. The source image is left untouched.
#[must_use]
pub fn erase_regions<'a, I>(gray: &GrayImage, regions: I) -> GrayImage
where
    I: IntoIterator<Item = &'a Region>,
{
    let mut cleaned = gray.clone();
    for region in regions {
        fill_contour(&mut cleaned, &region.contour, BACKGROUND);
    }
    cleaned
}

/// Fill a closed contour, boundary included, with `color`.
pub fn fill_contour(canvas: &mut GrayImage, contour: &[Point<i32>], color: Luma<u8>) {
    let polygon = polygon_vertices(contour);
    match polygon.as_slice() {
        [] => {}
        [p] => put_clipped(canvas, *p, color),
        _ => draw_polygon_mut(canvas, &polygon, color),
    }
}

/// Drop consecutive duplicates and a closing point equal to the first, which
/// the polygon rasterizer rejects.
fn polygon_vertices(contour: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut polygon: Vec<Point<i32>> = Vec::with_capacity(contour.len());
    for &p in contour {
        if polygon.last() != Some(&p) {
            polygon.push(p);
        }
    }
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    polygon
}

#[allow(clippy::cast_sign_loss)]
fn put_clipped(canvas: &mut GrayImage, p: Point<i32>, color: Luma<u8>) {
    if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height() {
        canvas.put_pixel(p.x as u32, p.y as u32, color);
    }
}

/// Draw a closed contour's outline, `thickness` pixels wide.
#[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
pub fn draw_outline(canvas: &mut RgbImage, contour: &[Point<i32>], color: Rgb<u8>, thickness: u32) {
    if contour.is_empty() {
        return;
    }
    let reach = (thickness.max(1) / 2) as i32;
    let n = contour.len();
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];
        for oy in -reach..=reach {
            for ox in -reach..=reach {
                draw_line_segment_mut(
                    canvas,
                    ((a.x + ox) as f32, (a.y + oy) as f32),
                    ((b.x + ox) as f32, (b.y + oy) as f32),
                    color,
                );
            }
        }
    }
}

/// Grayscale image as RGB with every region outlined, 1 px, in
/// [`OUTLINE_COLOR`].
#[must_use]
pub fn contour_overlay<'a, I>(gray: &GrayImage, regions: I) -> RgbImage
where
    I: IntoIterator<Item = &'a Region>,
{
    let mut canvas = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });
    for region in regions {
        draw_outline(&mut canvas, &region.contour, OUTLINE_COLOR, 1);
    }
    canvas
}

/// Black canvas with the given regions outlined, 3 px, in
/// [`OUTLINE_COLOR`].
#[must_use]
pub fn artifact_outlines<'a, I>(width: u32, height: u32, regions: I) -> RgbImage
where
    I: IntoIterator<Item = &'a Region>,
{
    let mut canvas = RgbImage::new(width, height);
    for region in regions {
        draw_outline(&mut canvas, &region.contour, OUTLINE_COLOR, 3);
    }
    canvas
}
