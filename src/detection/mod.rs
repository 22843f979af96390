pub mod contours;
pub mod difference;
pub mod preprocessing;

use image::GrayImage;

use crate::config::StageConfig;
use crate::error::{AlgorithmError, ConfigError};
use crate::models::{Frame, Position2D};
use crate::stage::PositionDetector;

pub use difference::DifferenceDetector2D;

/// Detector type tag, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DetectorKind {
    /// Difference detector (grey-scale, motion)
    Diff,
}

impl DetectorKind {
    pub fn build(self) -> Detector {
        match self {
            DetectorKind::Diff => Detector::Difference(DifferenceDetector2D::new()),
        }
    }
}

/// Every known position detector
#[derive(Debug, Clone)]
pub enum Detector {
    Difference(DifferenceDetector2D),
}

impl PositionDetector for Detector {
    fn name(&self) -> &str {
        match self {
            Detector::Difference(d) => d.name(),
        }
    }

    fn configure(&mut self, config: &StageConfig, key: &str) -> Result<(), ConfigError> {
        match self {
            Detector::Difference(d) => d.configure(config, key),
        }
    }

    fn detect_position(&mut self, frame: &Frame) -> Result<Position2D, AlgorithmError> {
        match self {
            Detector::Difference(d) => d.detect_position(frame),
        }
    }

    fn tuning_image(&self) -> Option<&GrayImage> {
        match self {
            Detector::Difference(d) => d.tuning_image(),
        }
    }
}
