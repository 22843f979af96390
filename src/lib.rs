pub mod combiner;
pub mod config;
pub mod decorator;
pub mod detection;
pub mod error;
pub mod filter;
pub mod models;
pub mod stage;
pub mod transport;

pub use combiner::{Combiner, CombinerKind, MeanPosition};
pub use config::{DifferenceSettings, StageConfig};
pub use decorator::{DecorateOptions, Decorator};
pub use detection::{Detector, DetectorKind, DifferenceDetector2D};
pub use error::{AlgorithmError, ConfigError, TransportError};
pub use filter::{BackgroundSubtractor, Filter, FilterKind};
pub use models::{BoundingBox, Contour, Frame, Position2D};
pub use stage::{
    CancellationToken, CombinerStage, DebugConfig, DecoratorStage, DetectorStage, FilterStage,
    FrameFilter, PositionCombiner, PositionDetector, Stage, run,
};
pub use transport::{Endpoint, Sink, Source};
