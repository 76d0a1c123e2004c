//! Error types for the scan-artifact-removal crate.

use std::path::PathBuf;

/// Errors that can occur while cleaning a scanned image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input bytes are not a recognized image.
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        /// File the bytes were read from.
        path: PathBuf,
        /// Underlying codec error.
        source: image::ImageError,
    },

    /// A tunable parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading the input, creating the output directory, or writing an
    /// artifact failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Two inputs in one directory run would write the same artifacts.
    #[error("{} shares the output name `{stem}` with another input", .path.display())]
    OutputConflict {
        /// Input that was not processed.
        path: PathBuf,
        /// File stem both inputs map to.
        stem: String,
    },

    /// Encoding an output artifact failed.
    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        /// Artifact path that could not be written.
        path: PathBuf,
        /// Underlying codec error.
        source: image::ImageError,
    },
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
