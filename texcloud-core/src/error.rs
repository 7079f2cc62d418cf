//! Error types for texcloud

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for texcloud operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot access input {}: {message}", path.display())]
    InputAccess { path: PathBuf, message: String },

    #[error("cannot parse {}: {message}", path.display())]
    MeshParse { path: PathBuf, message: String },

    #[error("cannot load texture {}: {message}", path.display())]
    TextureLoad { path: PathBuf, message: String },

    #[error("coordinate transform failed: {0}")]
    Transform(String),

    #[error("cannot write {}: {message}", path.display())]
    OutputWrite { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Classification of an [`Error`], printed by the command line tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputAccess,
    MeshParse,
    TextureLoad,
    Transform,
    OutputWrite,
    Io,
    InvalidData,
}

impl Error {
    pub fn mesh_parse<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Error::MeshParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an output write error from any displayable cause
    pub fn output_write<P: Into<PathBuf>, E: fmt::Display>(path: P, cause: E) -> Self {
        Error::OutputWrite {
            path: path.into(),
            message: cause.to_string(),
        }
    }

    /// Create a texture load error from any displayable cause
    pub fn texture_load<P: Into<PathBuf>, E: fmt::Display>(path: P, cause: E) -> Self {
        Error::TextureLoad {
            path: path.into(),
            message: cause.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputAccess { .. } => ErrorKind::InputAccess,
            Error::MeshParse { .. } => ErrorKind::MeshParse,
            Error::TextureLoad { .. } => ErrorKind::TextureLoad,
            Error::Transform(_) => ErrorKind::Transform,
            Error::OutputWrite { .. } => ErrorKind::OutputWrite,
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidData(_) => ErrorKind::InvalidData,
        }
    }

    /// Whether a conversion may continue after this error
    ///
    /// Only texture failures are recovered, by falling back to the flat
    /// material color.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::TextureLoad { .. })
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InputAccess => "input-access",
            ErrorKind::MeshParse => "mesh-parse",
            ErrorKind::TextureLoad => "texture-load",
            ErrorKind::Transform => "transform",
            ErrorKind::OutputWrite => "output-write",
            ErrorKind::Io => "io",
            ErrorKind::InvalidData => "invalid-data",
        };
        f.write_str(name)
    }
}
