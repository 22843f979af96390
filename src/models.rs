use image::RgbImage;
use serde::{Deserialize, Serialize};

/// One image unit flowing through the pipeline.
///
/// `sample` is the acquisition ordinal assigned by the source. Frames are
/// cloned, never shared, when a stage needs to keep one around.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub sample: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(sample: u64, image: RgbImage) -> Self {
        Self { sample, image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// A 2D position estimate.
///
/// When `valid` is false, `x` and `y` carry no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
    pub valid: bool,
}

impl Position2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, valid: true }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    /// Coordinates, or `None` for an invalid position
    pub fn coords(&self) -> Option<(f64, f64)> {
        self.valid.then_some((self.x, self.y))
    }
}

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Center of the box, half a box past the top-left corner
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + 0.5 * self.width as f64,
            self.y as f64 + 0.5 * self.height as f64,
        )
    }
}

/// An external contour of a binary mask, traced as a closed border
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<(u32, u32)>,
}

impl Contour {
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let (&(x0, y0), rest) = self.points.split_first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }
}
