#![allow(dead_code)]

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

use image::{Rgb, RgbImage};
use tempfile::NamedTempFile;
use trackpipe::transport::{ChannelSource, channel};
use trackpipe::{Frame, Source, StageConfig, TransportError};

/// A frame of uniform grey
pub fn flat_frame(sample: u64, width: u32, height: u32, value: u8) -> Frame {
    Frame::new(sample, RgbImage::from_pixel(width, height, Rgb([value, value, value])))
}

/// A uniform frame with one square block painted at (x, y)
pub fn frame_with_block(
    sample: u64,
    size: (u32, u32),
    background: u8,
    block: (u32, u32, u32),
    value: u8,
) -> Frame {
    let mut frame = flat_frame(sample, size.0, size.1, background);
    paint_block(&mut frame, block, value);
    frame
}

/// Paint a `side`x`side` block with its top-left corner at (x, y)
pub fn paint_block(frame: &mut Frame, (x0, y0, side): (u32, u32, u32), value: u8) {
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            frame.image.put_pixel(x, y, Rgb([value, value, value]));
        }
    }
}

/// Source that yields frames until its `limit`-th acquisition, which
/// reports end of stream
pub struct CountingSource {
    limit: usize,
    acquisitions: Rc<Cell<usize>>,
}

impl CountingSource {
    pub fn new(limit: usize) -> (Self, Rc<Cell<usize>>) {
        let acquisitions = Rc::new(Cell::new(0));
        (
            Self {
                limit,
                acquisitions: acquisitions.clone(),
            },
            acquisitions,
        )
    }
}

impl Source<Frame> for CountingSource {
    fn acquire(&mut self) -> Result<Option<Frame>, TransportError> {
        let n = self.acquisitions.get() + 1;
        self.acquisitions.set(n);
        if n >= self.limit {
            return Ok(None);
        }
        Ok(Some(flat_frame(n as u64, 8, 8, 0)))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Source pre-loaded with `units`, ending once they are consumed
pub fn preloaded<T>(name: &str, units: Vec<T>) -> ChannelSource<T> {
    let (mut sink, source) = channel(name);
    for unit in units {
        trackpipe::Sink::publish(&mut sink, unit).expect("receiver is alive");
    }
    source
}

/// Drain everything left in a source whose senders are gone
pub fn drain<T>(mut source: ChannelSource<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Some(unit) = source.acquire().expect("channel source never fails") {
        out.push(unit);
    }
    out
}

/// Writes `text` to a temporary TOML file
pub fn config_file(text: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config file");
    file.write_all(text.as_bytes())
        .expect("Failed to write temp config file");
    file
}

pub fn load_config(file: &NamedTempFile) -> StageConfig {
    StageConfig::load(file.path()).expect("fixture config parses")
}
