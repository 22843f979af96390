use std::path::PathBuf;

use thiserror::Error;

/// Malformed or missing settings. Always fatal, raised before the run loop.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no configuration named {key} was provided in the configuration file {path}")]
    MissingSection { key: String, path: PathBuf },

    #[error("configuration {key} is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{field} value in {key} must be in {expected}, got {value}")]
    InvalidValue {
        key: String,
        field: &'static str,
        expected: &'static str,
        value: i64,
    },

    #[error("debug directory is not usable: {0}")]
    DebugDir(String),
}

/// Failure of the collaborator moving units between stages.
/// The run loop treats it as end of stream.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("malformed position record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("endpoint {0} is disconnected")]
    Disconnected(String),

    #[error("cannot resolve endpoint {0}")]
    Unresolvable(String),
}

/// Mid-iteration processing failure. Recoverable: the iteration falls back
/// and cached state stays as it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlgorithmError {
    #[error("frame is {actual:?} but cached image is {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("frame has no pixels")]
    EmptyFrame,
}
