pub mod mean;

use crate::config::StageConfig;
use crate::error::ConfigError;
use crate::models::Position2D;
use crate::stage::PositionCombiner;

pub use mean::MeanPosition;

/// Position combiner type tag, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CombinerKind {
    /// Mean of SOURCE positions
    Mean,
}

impl CombinerKind {
    pub fn build(self) -> Combiner {
        match self {
            CombinerKind::Mean => Combiner::Mean(MeanPosition::new()),
        }
    }
}

/// Every known position combiner
#[derive(Debug, Clone)]
pub enum Combiner {
    Mean(MeanPosition),
}

impl PositionCombiner for Combiner {
    fn name(&self) -> &str {
        match self {
            Combiner::Mean(c) => c.name(),
        }
    }

    fn configure(&mut self, config: &StageConfig, key: &str) -> Result<(), ConfigError> {
        match self {
            Combiner::Mean(c) => c.configure(config, key),
        }
    }

    fn combine(&mut self, positions: &[Position2D]) -> Position2D {
        match self {
            Combiner::Mean(c) => c.combine(positions),
        }
    }
}
