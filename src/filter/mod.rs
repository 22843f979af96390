pub mod background;

use crate::config::StageConfig;
use crate::error::{AlgorithmError, ConfigError};
use crate::models::Frame;
use crate::stage::FrameFilter;

pub use background::BackgroundSubtractor;

/// Frame filter type tag, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FilterKind {
    /// Background subtraction
    Bsub,
}

impl FilterKind {
    pub fn build(self) -> Filter {
        match self {
            FilterKind::Bsub => Filter::Background(BackgroundSubtractor::new()),
        }
    }
}

/// Every known frame filter
#[derive(Debug, Clone)]
pub enum Filter {
    Background(BackgroundSubtractor),
}

impl FrameFilter for Filter {
    fn name(&self) -> &str {
        match self {
            Filter::Background(f) => f.name(),
        }
    }

    fn configure(&mut self, config: &StageConfig, key: &str) -> Result<(), ConfigError> {
        match self {
            Filter::Background(f) => f.configure(config, key),
        }
    }

    fn filter(&mut self, frame: &Frame) -> Result<Frame, AlgorithmError> {
        match self {
            Filter::Background(f) => f.filter(frame),
        }
    }
}
