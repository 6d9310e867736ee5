//! Adaptive (locally-windowed) binarization.
//!
//! Thresholds each pixel against the mean of its local window minus a
//! constant offset, which tolerates uneven scan lighting without
//! global-threshold bias. `imageproc`'s adaptive threshold exposes no offset
//! constant, so the mean filter is computed here over an integral image.

use image::{GrayImage, Luma};

/// Binarizes `gray` with a local mean threshold.
///
/// `window` is the side length of the square window in pixels (centered on
/// the pixel, clamped at the borders); `offset` is subtracted from the local
/// mean before comparison. Pixels strictly brighter than `mean - offset`
/// become 255, all others 0.
pub fn adaptive_threshold(gray: &GrayImage, window: u32, offset: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let integral = integral_image(gray);
    let radius = (window / 2) as i64;
    let w = width as i64;
    let h = height as i64;

    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        let y0 = (y - radius).max(0);
        let y1 = (y + radius + 1).min(h);
        for x in 0..w {
            let x0 = (x - radius).max(0);
            let x1 = (x + radius + 1).min(w);

            let sum = window_sum(&integral, width, x0, y0, x1, y1);
            let count = ((x1 - x0) * (y1 - y0)) as f32;
            let mean = sum as f32 / count;

            let value = gray.get_pixel(x as u32, y as u32)[0];
            let binary = if value as f32 > mean - offset { 255 } else { 0 };
            out.put_pixel(x as u32, y as u32, Luma([binary]));
        }
    }

    out
}

/// Summed-area table with a zero row/column of padding.
fn integral_image(gray: &GrayImage) -> Vec<u64> {
    let (width, height) = gray.dimensions();
    let stride = width as usize + 1;
    let mut integral = vec![0u64; stride * (height as usize + 1)];

    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += gray.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    integral
}

/// Sum of pixel values over the half-open rectangle `[x0, x1) x [y0, y1)`.
fn window_sum(integral: &[u64], width: u32, x0: i64, y0: i64, x1: i64, y1: i64) -> u64 {
    let stride = width as usize + 1;
    let (x0, y0, x1, y1) = (x0 as usize, y0 as usize, x1 as usize, y1 as usize);
    integral[y1 * stride + x1] + integral[y0 * stride + x0]
        - integral[y0 * stride + x1]
        - integral[y1 * stride + x0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_binarizes_to_white() {
        let gray = GrayImage::from_pixel(32, 32, Luma([180u8]));
        let out = adaptive_threshold(&gray, 11, 2.0);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn dark_text_on_light_background_separates() {
        let mut gray = GrayImage::from_pixel(40, 40, Luma([220u8]));
        for x in 10..30 {
            gray.put_pixel(x, 20, Luma([30u8]));
        }

        let out = adaptive_threshold(&gray, 11, 2.0);
        assert_eq!(out.get_pixel(20, 20)[0], 0);
        assert_eq!(out.get_pixel(20, 5)[0], 255);
    }

    #[test]
    fn already_binary_thin_strokes_are_stable() {
        let mut gray = GrayImage::from_pixel(40, 40, Luma([255u8]));
        for x in 5..35 {
            gray.put_pixel(x, 18, Luma([0u8]));
            gray.put_pixel(x, 19, Luma([0u8]));
        }

        let out = adaptive_threshold(&gray, 11, 2.0);
        assert_eq!(out.as_raw(), gray.as_raw());
    }

    #[test]
    fn empty_image_is_returned_unchanged() {
        let gray = GrayImage::new(0, 0);
        let out = adaptive_threshold(&gray, 11, 2.0);
        assert_eq!(out.dimensions(), (0, 0));
    }
}
