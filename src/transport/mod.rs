//! Endpoints that move frames and positions between stages.
//!
//! Stages only see the [`Source`] and [`Sink`] traits. What an endpoint name
//! refers to is decided here, by the `resolve_*` functions.

mod channel;
mod file;

use std::fmt;
use std::path::Path;

use crate::error::TransportError;
use crate::models::{Frame, Position2D};

pub use channel::{ChannelSink, ChannelSource, channel};
pub use file::{ImageDirSink, ImageDirSource, JsonLinesSink, JsonLinesSource};

/// Endpoint name meaning stdin or stdout for position streams
pub const STDIO: &str = "-";

/// Blocking supplier of units
pub trait Source<T> {
    /// Next unit, or `None` once the stream has ended
    fn acquire(&mut self) -> Result<Option<T>, TransportError>;

    fn name(&self) -> &str;
}

/// Receiver of produced units
pub trait Sink<T> {
    fn publish(&mut self, unit: T) -> Result<(), TransportError>;

    fn name(&self) -> &str;
}

impl<T, S: Source<T> + ?Sized> Source<T> for Box<S> {
    fn acquire(&mut self) -> Result<Option<T>, TransportError> {
        (**self).acquire()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T, S: Sink<T> + ?Sized> Sink<T> for Box<S> {
    fn publish(&mut self, unit: T) -> Result<(), TransportError> {
        (**self).publish(unit)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Opaque name of a source or sink
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Endpoint {
    fn from(name: String) -> Self {
        Self(name)
    }
}

pub type FrameSource = Box<dyn Source<Frame>>;
pub type FrameSink = Box<dyn Sink<Frame>>;
pub type PositionSource = Box<dyn Source<Position2D>>;
pub type PositionSink = Box<dyn Sink<Position2D>>;

/// Frame sources are directories of image files
pub fn resolve_frame_source(endpoint: &Endpoint) -> Result<FrameSource, TransportError> {
    let path = Path::new(endpoint.as_str());
    if !path.is_dir() {
        return Err(TransportError::Unresolvable(endpoint.to_string()));
    }
    Ok(Box::new(ImageDirSource::open(path)?))
}

/// Frame sinks are directories, created if needed
pub fn resolve_frame_sink(endpoint: &Endpoint) -> Result<FrameSink, TransportError> {
    Ok(Box::new(ImageDirSink::create(endpoint.as_str())?))
}

/// Position sources are JSON-lines files, or stdin for `-`
pub fn resolve_position_source(endpoint: &Endpoint) -> Result<PositionSource, TransportError> {
    if endpoint.as_str() == STDIO {
        return Ok(Box::new(JsonLinesSource::stdin()));
    }
    Ok(Box::new(JsonLinesSource::open(endpoint.as_str())?))
}

/// Position sinks are JSON-lines files, or stdout for `-`
pub fn resolve_position_sink(endpoint: &Endpoint) -> Result<PositionSink, TransportError> {
    if endpoint.as_str() == STDIO {
        return Ok(Box::new(JsonLinesSink::stdout()));
    }
    Ok(Box::new(JsonLinesSink::create(endpoint.as_str())?))
}
