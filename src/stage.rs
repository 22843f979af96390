//! Stage roles, the drivers that wire them to endpoints, and the run loop.
//!
//! An algorithm implements one role trait ([`FrameFilter`],
//! [`PositionDetector`] or [`PositionCombiner`]). The matching driver owns
//! the algorithm together with its endpoints and exposes the uniform
//! [`Stage`] contract that [`run`] drives.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::GrayImage;
use log::{debug, info, warn};

use crate::config::StageConfig;
use crate::decorator::Decorator;
use crate::error::{AlgorithmError, ConfigError, TransportError};
use crate::models::{Frame, Position2D};
use crate::transport::{FrameSink, FrameSource, PositionSink, PositionSource};

/// Transforms one frame into another
pub trait FrameFilter {
    fn name(&self) -> &str;

    /// Apply the settings table `key` of `config`. Called at most once,
    /// before the first frame.
    fn configure(&mut self, _config: &StageConfig, _key: &str) -> Result<(), ConfigError> {
        Ok(())
    }

    fn filter(&mut self, frame: &Frame) -> Result<Frame, AlgorithmError>;
}

/// Estimates an object position from one frame
pub trait PositionDetector {
    fn name(&self) -> &str;

    fn configure(&mut self, _config: &StageConfig, _key: &str) -> Result<(), ConfigError> {
        Ok(())
    }

    fn detect_position(&mut self, frame: &Frame) -> Result<Position2D, AlgorithmError>;

    /// Intermediate image worth inspecting while tuning, if tuning is on
    fn tuning_image(&self) -> Option<&GrayImage> {
        None
    }
}

/// Fuses one position from each of several sources
pub trait PositionCombiner {
    fn name(&self) -> &str;

    fn configure(&mut self, _config: &StageConfig, _key: &str) -> Result<(), ConfigError> {
        Ok(())
    }

    fn combine(&mut self, positions: &[Position2D]) -> Position2D;
}

/// Uniform per-iteration contract driven by [`run`]
pub trait Stage {
    fn name(&self) -> &str;

    /// Acquire one unit, transform it, publish the result.
    /// Returns `true` once the source is exhausted.
    fn process(&mut self) -> Result<bool, TransportError>;
}

/// Cooperative cancellation flag shared with an interrupt handler
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cancel `token` on SIGINT / CTRL+C
pub fn install_interrupt_handler(token: &CancellationToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        info!("Interrupt received, finishing current iteration...");
        token.cancel();
    })
}

/// Drive `stage` until the token is cancelled or the source is exhausted.
///
/// The token is only checked between iterations. A transport failure ends
/// the loop like end of stream does. Returns the number of iterations run.
pub fn run<S: Stage + ?Sized>(stage: &mut S, token: &CancellationToken) -> u64 {
    let mut iterations = 0;

    while !token.is_cancelled() {
        iterations += 1;
        match stage.process() {
            Ok(false) => {}
            Ok(true) => {
                debug!("[{}] Source exhausted after {} iterations", stage.name(), iterations);
                break;
            }
            Err(e) => {
                warn!("[{}] Transport failure, stopping: {}", stage.name(), e);
                break;
            }
        }
    }

    iterations
}

/// Debug output location for tuning images
#[derive(Clone, Debug)]
pub struct DebugConfig {
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: PathBuf) -> Result<Self, ConfigError> {
        if output_dir.exists() {
            let mut entries = std::fs::read_dir(&output_dir)
                .map_err(|e| ConfigError::DebugDir(format!("{}: {}", output_dir.display(), e)))?;
            if entries.next().is_some() {
                return Err(ConfigError::DebugDir(format!(
                    "{} is not empty",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)
                .map_err(|e| ConfigError::DebugDir(format!("{}: {}", output_dir.display(), e)))?;
        }

        Ok(Self { output_dir })
    }
}

fn stage_name(algorithm: &str, sources: &[&str], sink: &str) -> String {
    format!("{}[{}->{}]", algorithm, sources.join(","), sink)
}

/// Runs a [`FrameFilter`] between a frame source and a frame sink
pub struct FilterStage<F> {
    name: String,
    filter: F,
    source: FrameSource,
    sink: FrameSink,
}

impl<F: FrameFilter> FilterStage<F> {
    pub fn new(filter: F, source: FrameSource, sink: FrameSink) -> Self {
        let name = stage_name(filter.name(), &[source.name()], sink.name());
        Self {
            name,
            filter,
            source,
            sink,
        }
    }
}

impl<F: FrameFilter> Stage for FilterStage<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self) -> Result<bool, TransportError> {
        let Some(frame) = self.source.acquire()? else {
            return Ok(true);
        };

        let output = match self.filter.filter(&frame) {
            Ok(filtered) => filtered,
            Err(e) => {
                warn!("[{}] Sample {}: {}; passing frame through", self.name, frame.sample, e);
                frame
            }
        };

        self.sink.publish(output)?;
        Ok(false)
    }
}

/// Runs a [`PositionDetector`] between a frame source and a position sink
pub struct DetectorStage<D> {
    name: String,
    detector: D,
    source: FrameSource,
    sink: PositionSink,
    last_position: Position2D,
    debug: Option<DebugConfig>,
}

impl<D: PositionDetector> DetectorStage<D> {
    pub fn new(detector: D, source: FrameSource, sink: PositionSink) -> Self {
        let name = stage_name(detector.name(), &[source.name()], sink.name());
        Self {
            name,
            detector,
            source,
            sink,
            last_position: Position2D::invalid(),
            debug: None,
        }
    }

    /// Save tuning images into the debug directory
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = Some(debug);
        self
    }

    fn save_tuning_image(&self, sample: u64) {
        let (Some(debug), Some(image)) = (&self.debug, self.detector.tuning_image()) else {
            return;
        };
        let path = debug.output_dir.join(format!("{:06}.png", sample));
        match image.save(&path) {
            Ok(()) => debug!("[{}] Debug: saved {}", self.name, path.display()),
            Err(e) => warn!("[{}] Failed to save tuning image {}: {}", self.name, path.display(), e),
        }
    }
}

impl<D: PositionDetector> Stage for DetectorStage<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self) -> Result<bool, TransportError> {
        let Some(frame) = self.source.acquire()? else {
            return Ok(true);
        };

        let position = match self.detector.detect_position(&frame) {
            Ok(position) => {
                self.last_position = position;
                self.save_tuning_image(frame.sample);
                position
            }
            Err(e) => {
                warn!(
                    "[{}] Sample {}: {}; repeating previous position",
                    self.name, frame.sample, e
                );
                self.last_position
            }
        };

        self.sink.publish(position)?;
        Ok(false)
    }
}

/// Runs a [`PositionCombiner`] over several position sources
pub struct CombinerStage<C> {
    name: String,
    combiner: C,
    sources: Vec<PositionSource>,
    sink: PositionSink,
    positions: Vec<Position2D>,
}

impl<C: PositionCombiner> CombinerStage<C> {
    pub fn new(combiner: C, sources: Vec<PositionSource>, sink: PositionSink) -> Self {
        let source_names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        let name = stage_name(combiner.name(), &source_names, sink.name());
        let positions = Vec::with_capacity(sources.len());
        Self {
            name,
            combiner,
            sources,
            sink,
            positions,
        }
    }
}

impl<C: PositionCombiner> Stage for CombinerStage<C> {
    fn name(&self) -> &str {
        &self.name
    }

    /// Exhaustion of any one source exhausts the stage
    fn process(&mut self) -> Result<bool, TransportError> {
        self.positions.clear();
        for source in &mut self.sources {
            match source.acquire()? {
                Some(position) => self.positions.push(position),
                None => return Ok(true),
            }
        }

        let combined = self.combiner.combine(&self.positions);
        self.sink.publish(combined)?;
        Ok(false)
    }
}

/// Runs a [`Decorator`] over a frame source, drawing the latest position
/// from each position source onto every frame
pub struct DecoratorStage {
    name: String,
    decorator: Decorator,
    source: FrameSource,
    position_sources: Vec<PositionSource>,
    sink: FrameSink,
    positions: Vec<Position2D>,
}

impl DecoratorStage {
    pub fn new(
        decorator: Decorator,
        source: FrameSource,
        position_sources: Vec<PositionSource>,
        sink: FrameSink,
    ) -> Self {
        let mut source_names = vec![source.name()];
        source_names.extend(position_sources.iter().map(|s| s.name()));
        let name = stage_name(decorator.name(), &source_names, sink.name());
        let positions = Vec::with_capacity(position_sources.len());
        Self {
            name,
            decorator,
            source,
            position_sources,
            sink,
            positions,
        }
    }
}

impl Stage for DecoratorStage {
    fn name(&self) -> &str {
        &self.name
    }

    /// Exhaustion of the frame source or of any position source exhausts
    /// the stage
    fn process(&mut self) -> Result<bool, TransportError> {
        let Some(frame) = self.source.acquire()? else {
            return Ok(true);
        };

        self.positions.clear();
        for source in &mut self.position_sources {
            match source.acquire()? {
                Some(position) => self.positions.push(position),
                None => return Ok(true),
            }
        }

        let decorated = self.decorator.decorate(&frame, &self.positions);
        self.sink.publish(decorated)?;
        Ok(false)
    }
}
