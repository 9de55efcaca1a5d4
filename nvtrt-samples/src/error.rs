//! Error types for the samples.

use crate::image::ImageError;
use std::fmt;
use std::path::PathBuf;

/// Stage of a sample run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Infer,
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Build => "build",
            Phase::Infer => "infer",
            Phase::Teardown => "teardown",
        })
    }
}

/// Errors raised while building, running or tearing down a sample.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The SDK wrapper reported a failure.
    #[error("TensorRT error: {0}")]
    Trt(#[from] nvtrt::Error),

    /// Reading or writing a test image failed.
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read, parsed or serialized.
    #[error("configuration error: {0}")]
    Config(String),

    /// A data file was not found in any data directory.
    #[error("could not find '{name}' in data directories {searched:?}")]
    MissingFile { name: String, searched: Vec<PathBuf> },

    /// The network or engine does not have the expected shape.
    #[error("unexpected network layout: {0}")]
    Network(String),

    /// `infer` was called before a successful `build`.
    #[error("engine has not been built")]
    NotBuilt,

    /// One or more phases of a run failed.
    #[error("sample {0} failed.")]
    PhaseFailed(Phase),
}
