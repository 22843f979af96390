use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{Sink, Source};
use crate::error::TransportError;
use crate::models::{Frame, Position2D};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Reads the image files of a directory in name order, one frame per file
pub struct ImageDirSource {
    name: String,
    files: std::vec::IntoIter<PathBuf>,
    next_sample: u64,
}

impl ImageDirSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, TransportError> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if path.is_file() && is_image {
                files.push(path);
            }
        }
        files.sort();

        Ok(Self {
            name: dir.display().to_string(),
            files: files.into_iter(),
            next_sample: 0,
        })
    }
}

impl Source<Frame> for ImageDirSource {
    fn acquire(&mut self) -> Result<Option<Frame>, TransportError> {
        let Some(path) = self.files.next() else {
            return Ok(None);
        };
        let image = image::open(&path)?.to_rgb8();
        let frame = Frame::new(self.next_sample, image);
        self.next_sample += 1;
        Ok(Some(frame))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Writes each frame as `<sample:06>.png` into a directory
pub struct ImageDirSink {
    name: String,
    dir: PathBuf,
}

impl ImageDirSink {
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, TransportError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            name: dir.display().to_string(),
            dir,
        })
    }
}

impl Sink<Frame> for ImageDirSink {
    fn publish(&mut self, frame: Frame) -> Result<(), TransportError> {
        let path = self.dir.join(format!("{:06}.png", frame.sample));
        frame.image.save(&path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Reads one JSON position per line. Blank lines are skipped.
pub struct JsonLinesSource {
    name: String,
    reader: Box<dyn BufRead>,
    line: String,
}

impl JsonLinesSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::from_reader(path.display().to_string(), BufReader::new(file)))
    }

    pub fn stdin() -> Self {
        Self::from_reader(super::STDIO, BufReader::new(io::stdin()))
    }

    pub fn from_reader(name: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
            line: String::new(),
        }
    }
}

impl Source<Position2D> for JsonLinesSource {
    fn acquire(&mut self) -> Result<Option<Position2D>, TransportError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let record = self.line.trim();
            if !record.is_empty() {
                return Ok(Some(serde_json::from_str(record)?));
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Writes one JSON position per line, flushing after each
pub struct JsonLinesSink {
    name: String,
    writer: Box<dyn Write>,
}

impl JsonLinesSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Ok(Self::from_writer(path.display().to_string(), BufWriter::new(file)))
    }

    pub fn stdout() -> Self {
        Self::from_writer(super::STDIO, io::stdout())
    }

    pub fn from_writer(name: impl Into<String>, writer: impl Write + 'static) -> Self {
        Self {
            name: name.into(),
            writer: Box::new(writer),
        }
    }
}

impl Sink<Position2D> for JsonLinesSink {
    fn publish(&mut self, position: Position2D) -> Result<(), TransportError> {
        serde_json::to_writer(&mut self.writer, &position)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
