use image::GrayImage;
use log::{debug, info};

use crate::config::{DifferenceDetectorConfig, DifferenceSettings, StageConfig};
use crate::detection::contours::find_external_contours;
use crate::detection::preprocessing;
use crate::error::{AlgorithmError, ConfigError};
use crate::models::{Frame, Position2D};
use crate::stage::PositionDetector;

/// Motion-based single object detector.
///
/// Compares each frame with the one before it. The first frame only seeds
/// the history and always yields an invalid position.
#[derive(Debug, Clone, Default)]
pub struct DifferenceDetector2D {
    settings: DifferenceSettings,
    last_image: Option<GrayImage>,
    threshold_image: Option<GrayImage>,
    object_position: Position2D,
}

impl DifferenceDetector2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: DifferenceSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn has_history(&self) -> bool {
        self.last_image.is_some()
    }

    pub fn history(&self) -> Option<&GrayImage> {
        self.last_image.as_ref()
    }

    fn seed_history(&mut self, sample: u64, gray: GrayImage) -> Result<Position2D, AlgorithmError> {
        if gray.width() == 0 || gray.height() == 0 {
            return Err(AlgorithmError::EmptyFrame);
        }
        debug!("[diff] Sample {} seeds the history", sample);
        if self.settings.tune {
            self.threshold_image = Some(gray.clone());
        }
        self.last_image = Some(gray);
        self.object_position = Position2D::invalid();
        Ok(self.object_position)
    }

    /// Position reported by the last successful detection
    pub fn object_position(&self) -> Position2D {
        self.object_position
    }
}

/// Center of the bounding box of the first external contour met by a
/// row-major scan, i.e. the topmost blob. Blob area plays no part.
fn locate_object(mask: &GrayImage) -> Position2D {
    find_external_contours(mask)
        .first()
        .and_then(|contour| contour.bounding_box())
        .map(|bbox| {
            let (x, y) = bbox.center();
            Position2D::new(x, y)
        })
        .unwrap_or_else(Position2D::invalid)
}

impl PositionDetector for DifferenceDetector2D {
    fn name(&self) -> &str {
        "diff"
    }

    fn configure(&mut self, config: &StageConfig, key: &str) -> Result<(), ConfigError> {
        let raw: DifferenceDetectorConfig = config.section(key)?;
        self.settings = raw.resolve(key, self.settings)?;
        info!(
            "[{}] blur={} diff_threshold={} tune={}",
            self.name(),
            self.settings.blur,
            self.settings.diff_threshold,
            self.settings.tune
        );
        Ok(())
    }

    fn detect_position(&mut self, frame: &Frame) -> Result<Position2D, AlgorithmError> {
        let gray = preprocessing::to_grayscale(&frame.image);

        // Nothing is committed until every fallible step has succeeded
        let mask = match &self.last_image {
            None => return self.seed_history(frame.sample, gray),
            Some(previous) => preprocessing::motion_mask(
                &gray,
                previous,
                self.settings.diff_threshold,
                self.settings.blur,
            )?,
        };

        self.last_image = Some(gray);
        self.object_position = locate_object(&mask);
        self.threshold_image = self.settings.tune.then_some(mask);

        Ok(self.object_position)
    }

    fn tuning_image(&self) -> Option<&GrayImage> {
        self.threshold_image.as_ref()
    }
}
