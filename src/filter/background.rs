use std::path::Path;

use image::RgbImage;
use log::{info, warn};

use crate::config::{BackgroundSubtractorConfig, StageConfig};
use crate::detection::preprocessing::saturating_subtract;
use crate::error::{AlgorithmError, ConfigError};
use crate::models::Frame;
use crate::stage::FrameFilter;

/// Removes a fixed background from every frame.
///
/// Without a configured background image, the first frame seen becomes the
/// background. Once set, the background never changes.
#[derive(Debug, Clone, Default)]
pub struct BackgroundSubtractor {
    background: Option<RgbImage>,
}

impl BackgroundSubtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(background: RgbImage) -> Self {
        Self {
            background: Some(background),
        }
    }

    pub fn background(&self) -> Option<&RgbImage> {
        self.background.as_ref()
    }

    /// Load the background from disk. On failure the first frame is used
    /// instead.
    pub fn load_background(&mut self, path: &Path) {
        match image::open(path) {
            Ok(img) => {
                info!("[{}] Using background image {}", self.name(), path.display());
                self.background = Some(img.to_rgb8());
            }
            Err(e) => {
                warn!(
                    "[{}] Could not load background image {}: {}. The first frame will be used instead.",
                    self.name(),
                    path.display(),
                    e
                );
                self.background = None;
            }
        }
    }
}

impl FrameFilter for BackgroundSubtractor {
    fn name(&self) -> &str {
        "bsub"
    }

    fn configure(&mut self, config: &StageConfig, key: &str) -> Result<(), ConfigError> {
        let section: BackgroundSubtractorConfig = config.section(key)?;
        if let Some(path) = section.background {
            self.load_background(&path);
        }
        Ok(())
    }

    fn filter(&mut self, frame: &Frame) -> Result<Frame, AlgorithmError> {
        match &self.background {
            Some(background) => Ok(Frame::new(
                frame.sample,
                saturating_subtract(&frame.image, background)?,
            )),
            None => {
                self.background = Some(frame.image.clone());
                Ok(frame.clone())
            }
        }
    }
}
