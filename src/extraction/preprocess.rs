//! Morphological preprocessing for page rasters.
//!
//! Pure image-to-image transforms — no I/O, no OCR calls, fully testable.
//! Used by the line detector (closing + binarization) and by the region
//! extractor's low-confidence retry pass (contrast/brightness boost).

use image::{GrayImage, Luma};

/// Foreground is dark ink on light paper: a pixel at or below this value
/// after binarization is foreground.
pub const FOREGROUND: u8 = 0;

/// Background value after binarization.
pub const BACKGROUND: u8 = 255;

/// Morphological dilation of dark pixels with a square kernel.
/// Each output pixel takes the minimum (darkest) value in its neighborhood,
/// thickening candidate line strokes.
pub fn dilate(image: &GrayImage, kernel_size: u32) -> GrayImage {
    neighborhood_op(image, kernel_size, |values| {
        values.iter().copied().min().unwrap_or(BACKGROUND)
    })
}

/// Morphological erosion of dark pixels with a square kernel.
/// Each output pixel takes the maximum (lightest) value in its neighborhood,
/// removing isolated specks left by dilation.
pub fn erode(image: &GrayImage, kernel_size: u32) -> GrayImage {
    neighborhood_op(image, kernel_size, |values| {
        values.iter().copied().max().unwrap_or(BACKGROUND)
    })
}

/// Morphological closing: dilation followed by erosion. Bridges small gaps
/// in printed rules without growing their overall extent.
pub fn close(image: &GrayImage, kernel_size: u32) -> GrayImage {
    erode(&dilate(image, kernel_size), kernel_size)
}

/// Threshold to a two-level image: values <= threshold become FOREGROUND,
/// the rest BACKGROUND.
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] <= threshold { FOREGROUND } else { BACKGROUND };
    }
    out
}

/// Linear contrast stretch around the midpoint plus a brightness offset.
/// Used before the OCR retry pass on low-confidence regions.
pub fn enhance_contrast(image: &GrayImage, factor: f32, brightness: i16) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let v = pixel.0[0] as f32;
        let stretched = (v - 128.0) * factor + 128.0 + brightness as f32;
        pixel.0[0] = stretched.clamp(0.0, 255.0) as u8;
    }
    out
}

/// Crop a pixel-rectangle out of a page raster. Coordinates are clamped to
/// the image bounds; a degenerate rectangle yields a 1x1 background image.
pub fn crop_region(image: &GrayImage, x: f32, y: f32, width: f32, height: f32) -> GrayImage {
    let img_w = image.width();
    let img_h = image.height();
    let x0 = (x.max(0.0) as u32).min(img_w.saturating_sub(1));
    let y0 = (y.max(0.0) as u32).min(img_h.saturating_sub(1));
    let w = (width.max(1.0) as u32).min(img_w - x0).max(1);
    let h = (height.max(1.0) as u32).min(img_h - y0).max(1);

    let mut out = GrayImage::from_pixel(w, h, Luma([BACKGROUND]));
    for oy in 0..h {
        for ox in 0..w {
            out.put_pixel(ox, oy, *image.get_pixel(x0 + ox, y0 + oy));
        }
    }
    out
}

fn neighborhood_op<F>(image: &GrayImage, kernel_size: u32, op: F) -> GrayImage
where
    F: Fn(&[u8]) -> u8,
{
    let radius = (kernel_size / 2) as i64;
    let (w, h) = (image.width() as i64, image.height() as i64);
    let mut out = image.clone();
    let mut values = Vec::with_capacity((kernel_size * kernel_size) as usize);

    for y in 0..h {
        for x in 0..w {
            values.clear();
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx >= 0 && nx < w && ny >= 0 && ny < h {
                        values.push(image.get_pixel(nx as u32, ny as u32).0[0]);
                    }
                }
            }
            out.put_pixel(x as u32, y as u32, Luma([op(&values)]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([255]))
    }

    #[test]
    fn binarize_splits_at_threshold() {
        let mut img = blank(2, 1);
        img.put_pixel(0, 0, Luma([100]));
        img.put_pixel(1, 0, Luma([200]));
        let bin = binarize(&img, 128);
        assert_eq!(bin.get_pixel(0, 0).0[0], FOREGROUND);
        assert_eq!(bin.get_pixel(1, 0).0[0], BACKGROUND);
    }

    #[test]
    fn dilation_thickens_a_stroke() {
        let mut img = blank(5, 5);
        img.put_pixel(2, 2, Luma([0]));
        let dilated = dilate(&img, 3);
        // The 3x3 neighborhood of the center becomes dark
        assert_eq!(dilated.get_pixel(1, 2).0[0], 0);
        assert_eq!(dilated.get_pixel(3, 2).0[0], 0);
        assert_eq!(dilated.get_pixel(2, 1).0[0], 0);
        // Corners of the image stay light
        assert_eq!(dilated.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn erosion_removes_isolated_speck() {
        let mut img = blank(5, 5);
        img.put_pixel(2, 2, Luma([0]));
        let eroded = erode(&img, 3);
        assert_eq!(eroded.get_pixel(2, 2).0[0], 255);
    }

    #[test]
    fn closing_bridges_single_pixel_gap() {
        // Horizontal stroke with a one-pixel hole at x=3
        let mut img = blank(7, 3);
        for x in 0..7 {
            if x != 3 {
                img.put_pixel(x, 1, Luma([0]));
            }
        }
        let closed = close(&img, 3);
        assert_eq!(closed.get_pixel(3, 1).0[0], 0, "Gap should be bridged");
    }

    #[test]
    fn enhance_contrast_stretches_extremes() {
        let mut img = blank(2, 1);
        img.put_pixel(0, 0, Luma([100]));
        img.put_pixel(1, 0, Luma([160]));
        let enhanced = enhance_contrast(&img, 2.0, 0);
        // (100-128)*2+128 = 72, (160-128)*2+128 = 192
        assert_eq!(enhanced.get_pixel(0, 0).0[0], 72);
        assert_eq!(enhanced.get_pixel(1, 0).0[0], 192);
    }

    #[test]
    fn enhance_contrast_clamps_to_byte_range() {
        let mut img = blank(2, 1);
        img.put_pixel(0, 0, Luma([10]));
        img.put_pixel(1, 0, Luma([250]));
        let enhanced = enhance_contrast(&img, 3.0, 20);
        assert_eq!(enhanced.get_pixel(0, 0).0[0], 0);
        assert_eq!(enhanced.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn crop_extracts_requested_area() {
        let mut img = blank(10, 10);
        img.put_pixel(5, 5, Luma([0]));
        let cropped = crop_region(&img, 4.0, 4.0, 3.0, 3.0);
        assert_eq!(cropped.width(), 3);
        assert_eq!(cropped.height(), 3);
        assert_eq!(cropped.get_pixel(1, 1).0[0], 0);
    }

    #[test]
    fn crop_clamps_out_of_bounds_request() {
        let img = blank(10, 10);
        let cropped = crop_region(&img, 8.0, 8.0, 50.0, 50.0);
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.height(), 2);
    }

    #[test]
    fn crop_degenerate_rect_yields_minimal_image() {
        let img = blank(10, 10);
        let cropped = crop_region(&img, 3.0, 3.0, 0.0, 0.0);
        assert_eq!(cropped.width(), 1);
        assert_eq!(cropped.height(), 1);
    }
}
