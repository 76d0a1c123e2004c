//! Grayscale conversion and Gaussian adaptive thresholding.
//!
//! Dark ink becomes foreground (`255`), paper becomes background (`0`).
//! A pixel is foreground when it is at least `offset` levels darker than
//! the Gaussian-weighted mean of its `block_size x block_size` neighborhood.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::filter::separable_filter_equal;

/// Mask value for ink-candidate pixels.
pub const FOREGROUND: u8 = 255;
/// Mask value for everything else.
pub const BACKGROUND: u8 = 0;

/// Fixed kernels used for the smallest block sizes.
const SMALL_KERNELS: [&[f32]; 3] = [
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.031_25, 0.109_375, 0.218_75, 0.281_25, 0.218_75, 0.109_375, 0.031_25,
    ],
];

/// Convert a decoded image to 8-bit luma.
///
/// Uses the luminance formula `0.299*R + 0.587*G + 0.114*B`. Images that are
/// already 8-bit grayscale are returned unchanged.
#[must_use]
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    rgb_to_grayscale(&image.to_rgb8())
}

fn rgb_to_grayscale(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let px = rgb.get_pixel(x, y);
        let lum = 0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Luma([lum.round().clamp(0.0, 255.0) as u8])
    })
}

/// Normalized 1-D Gaussian kernel with `size` taps.
///
/// Sizes 3, 5 and 7 use fixed binomial-like tables; larger sizes derive
/// sigma as `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
#[must_use]
pub fn gaussian_kernel(size: usize) -> Vec<f32> {
    if size % 2 == 1 && (3..=7).contains(&size) {
        return SMALL_KERNELS[(size - 3) / 2].to_vec();
    }

    #[allow(clippy::cast_precision_loss)]
    let (center, sigma) = {
        let n = size as f64;
        ((n - 1.0) * 0.5, 0.3 * ((n - 1.0) * 0.5 - 1.0) + 0.8)
    };
    let scale = -0.5 / (sigma * sigma);

    #[allow(clippy::cast_precision_loss)]
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (scale * d * d).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();

    #[allow(clippy::cast_possible_truncation)]
    weights.iter().map(|w| (w / sum) as f32).collect()
}

/// Gaussian-weighted local mean of every pixel, rounded to 8 bits.
///
/// The separable filter runs in `f32` so nothing is truncated between the
/// two passes. Samples outside the image replicate the nearest edge pixel.
#[must_use]
pub fn local_mean(gray: &GrayImage, block_size: u32) -> GrayImage {
    let kernel = gaussian_kernel(block_size as usize);
    let samples: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
            Luma([f32::from(gray.get_pixel(x, y)[0])])
        });
    let mean = separable_filter_equal(&samples, &kernel);

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Luma([mean.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
    })
}

/// Inverted Gaussian adaptive threshold.
///
/// A pixel becomes [`FOREGROUND`] iff `src - mean <= -offset`, where `mean`
/// is the [`local_mean`] over a `block_size` neighborhood. The caller is
/// responsible for `block_size` being odd and greater than 1; see
/// [`PipelineConfig::validate`](crate::PipelineConfig::validate).
#[must_use]
pub fn adaptive_threshold(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    debug_assert!(block_size > 1 && block_size % 2 == 1);
    let mean = local_mean(gray, block_size);

    let mut mask = GrayImage::new(gray.width(), gray.height());
    for ((out, src), avg) in mask.pixels_mut().zip(gray.pixels()).zip(mean.pixels()) {
        let diff = i32::from(src[0]) - i32::from(avg[0]);
        out[0] = if diff <= -offset { FOREGROUND } else { BACKGROUND };
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_sums_to_one() {
        for size in [3, 5, 7, 9, 15, 31] {
            let kernel = gaussian_kernel(size);
            assert_eq!(kernel.len(), size);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "size {size} sums to {sum}");
        }
    }

    #[test]
    fn kernel_is_symmetric_and_peaks_at_center() {
        let kernel = gaussian_kernel(15);
        for i in 0..7 {
            assert!((kernel[i] - kernel[14 - i]).abs() < 1e-7);
            assert!(kernel[i] < kernel[i + 1]);
        }
    }

    #[test]
    fn grayscale_uses_bt601_weights() {
        let mut rgb = RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, image::Rgb([0, 255, 0]));
        rgb.put_pixel(2, 0, image::Rgb([0, 0, 255]));

        let gray = to_grayscale(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 150);
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
    }

    #[test]
    fn grayscale_passes_luma_through() {
        let gray = GrayImage::from_fn(8, 4, |x, y| Luma([(x * 30 + y) as u8]));
        let converted = to_grayscale(&DynamicImage::ImageLuma8(gray.clone()));
        assert_eq!(converted, gray);
    }

    #[test]
    fn local_mean_of_flat_image_is_flat() {
        let gray = GrayImage::from_pixel(20, 10, Luma([180]));
        let mean = local_mean(&gray, 15);
        assert!(mean.pixels().all(|p| p[0] == 180));
    }

    #[test]
    fn local_mean_replicates_the_edge() {
        let gray = GrayImage::from_fn(6, 4, |x, _| Luma([if x == 0 { 0 } else { 200 }]));
        let mean = local_mean(&gray, 3);
        for y in 0..4 {
            assert_eq!(mean.get_pixel(0, y)[0], 50);
            assert_eq!(mean.get_pixel(1, y)[0], 150);
            assert_eq!(mean.get_pixel(5, y)[0], 200);
        }
    }

    #[test]
    fn flat_image_has_no_foreground() {
        let gray = GrayImage::from_pixel(30, 30, Luma([240]));
        let mask = adaptive_threshold(&gray, 15, 7);
        assert!(mask.pixels().all(|p| p[0] == BACKGROUND));
    }

    #[test]
    fn dark_line_becomes_foreground() {
        let mut gray = GrayImage::from_pixel(50, 20, Luma([240]));
        for x in 10..40 {
            gray.put_pixel(x, 10, Luma([20]));
        }

        let mask = adaptive_threshold(&gray, 15, 7);

        assert_eq!(mask.dimensions(), gray.dimensions());
        assert_eq!(mask.get_pixel(25, 10)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(25, 5)[0], BACKGROUND);
        assert_eq!(mask.get_pixel(5, 10)[0], BACKGROUND);
    }

    #[test]
    fn output_is_strictly_binary() {
        let gray = GrayImage::from_fn(40, 40, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let mask = adaptive_threshold(&gray, 5, 2);
        assert!(mask
            .pixels()
            .all(|p| p[0] == FOREGROUND || p[0] == BACKGROUND));
    }

    #[test]
    fn higher_offset_is_stricter() {
        let mut gray = GrayImage::from_pixel(40, 40, Luma([200]));
        for x in 5..35 {
            gray.put_pixel(x, 20, Luma([190]));
        }

        let lenient = adaptive_threshold(&gray, 15, 2);
        let strict = adaptive_threshold(&gray, 15, 50);

        assert_eq!(lenient.get_pixel(20, 20)[0], FOREGROUND);
        assert_eq!(strict.get_pixel(20, 20)[0], BACKGROUND);
    }

    #[test]
    fn mark_on_the_border_is_detected() {
        let mut gray = GrayImage::from_pixel(30, 30, Luma([250]));
        for x in 0..30 {
            gray.put_pixel(x, 0, Luma([10]));
        }
        let mask = adaptive_threshold(&gray, 15, 7);
        assert!((0..30).all(|x| mask.get_pixel(x, 0)[0] == FOREGROUND));
        assert!((0..30).all(|x| mask.get_pixel(x, 3)[0] == BACKGROUND));
    }
}
