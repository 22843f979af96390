#![allow(unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from trackpipe for tests
pub use trackpipe::transport::{ChannelSink, ChannelSource, PositionSource, channel};
pub use trackpipe::{
    CancellationToken, Frame, Position2D, Sink, Source, Stage, StageConfig, TransportError, run,
};
