use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::box_filter;
use imageproc::map::{map_colors, map_colors2};

use crate::error::AlgorithmError;

/// Convert a color frame to grayscale with the 0.299/0.587/0.114 luma
/// weights, rounded to nearest
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    map_colors(img, |Rgb([r, g, b])| {
        let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
        Luma([((weighted + 500) / 1000) as u8])
    })
}

/// Pixel-wise |a - b|
pub fn absolute_difference(a: &GrayImage, b: &GrayImage) -> Result<GrayImage, AlgorithmError> {
    same_dimensions(b.dimensions(), a.dimensions())?;
    Ok(map_colors2(a, b, |p, q| Luma([p[0].abs_diff(q[0])])))
}

/// Per-channel `a - b`, clipped at zero
pub fn saturating_subtract(a: &RgbImage, b: &RgbImage) -> Result<RgbImage, AlgorithmError> {
    same_dimensions(b.dimensions(), a.dimensions())?;
    Ok(map_colors2(a, b, |p, q| {
        Rgb([
            p[0].saturating_sub(q[0]),
            p[1].saturating_sub(q[1]),
            p[2].saturating_sub(q[2]),
        ])
    }))
}

/// Binary threshold: pixels strictly above `threshold` become 255.
/// A threshold of 255 or more clears the whole image.
pub fn threshold_binary(img: &GrayImage, threshold: u16) -> GrayImage {
    map_colors(img, |p| Luma([if u16::from(p[0]) > threshold { 255 } else { 0 }]))
}

/// Normalized box blur with a (2r+1)x(2r+1) kernel
pub fn apply_box_blur(img: &GrayImage, radius: u32) -> GrayImage {
    box_filter(img, radius, radius)
}

/// Foreground mask of the motion between two grayscale frames.
///
/// The difference is thresholded; with `blur > 0` the mask is smoothed and
/// thresholded again so it stays binary.
pub fn motion_mask(
    current: &GrayImage,
    previous: &GrayImage,
    threshold: u16,
    blur: u32,
) -> Result<GrayImage, AlgorithmError> {
    let diff = absolute_difference(current, previous)?;
    let mut mask = threshold_binary(&diff, threshold);
    if blur > 0 {
        mask = threshold_binary(&apply_box_blur(&mask, blur), threshold);
    }
    Ok(mask)
}

/// Number of foreground pixels in a binary mask
pub fn foreground_area(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] > 0).count()
}

fn same_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<(), AlgorithmError> {
    if expected != actual {
        return Err(AlgorithmError::DimensionMismatch { expected, actual });
    }
    if actual.0 == 0 || actual.1 == 0 {
        return Err(AlgorithmError::EmptyFrame);
    }
    Ok(())
}
