use image::GrayImage;
use imageproc::contours::{BorderType, find_contours as trace_borders};

use crate::models::Contour;

/// Outermost contours of a binary mask, in discovery order.
///
/// Discovery follows a raster scan of the mask, so a blob whose top-left
/// border pixel comes later in row-major order appears later in the output.
/// Contours nested inside holes of other blobs are skipped.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    trace_borders::<u32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| Contour {
            points: c.points.into_iter().map(|p| (p.x, p.y)).collect(),
        })
        .collect()
}
