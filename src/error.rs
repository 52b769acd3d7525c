//! Error types for uvlab.
//!
//! This module defines the error type shared by the loaders, the unwrappers,
//! the exporter, and the UV canvas.

use std::path::PathBuf;
use thiserror::Error;

use crate::io::Format;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, unwrapping, or exporting a mesh.
#[derive(Error, Debug)]
pub enum Error {
    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references invalid vertex index {index}")]
    InvalidVertexIndex {
        /// The triangle number.
        triangle: usize,
        /// The invalid vertex index.
        index: usize,
    },

    /// Per-vertex attribute count does not match the vertex count.
    #[error("expected {expected} {attribute} entries, found {found}")]
    AttributeCount {
        /// Attribute name.
        attribute: &'static str,
        /// Number of entries required.
        expected: usize,
        /// Number of entries supplied.
        found: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A format parser rejected the input bytes.
    #[error("failed to parse {format:?} data: {message}")]
    Parse {
        /// The format being parsed.
        format: Format,
        /// Error message.
        message: String,
    },

    /// Error saving a file.
    #[error("failed to save {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// The unwrapper could not produce UVs for the input.
    #[error("unwrap failed: {0}")]
    Unwrap(String),

    /// The unwrapper backend failed to load.
    #[error("unwrapper unavailable: {0}")]
    UnwrapperUnavailable(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a parse error for the given format.
    pub fn parse<M: Into<String>>(format: Format, message: M) -> Self {
        Error::Parse {
            format,
            message: message.into(),
        }
    }
}
