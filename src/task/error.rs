//! Task error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error class, deciding how far a failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Source syntax or resolution failure; the stage aborts, watch continues.
    Compile,
    /// Invalid setup (missing template, colliding sprite selector); fatal at startup.
    Configuration,
    /// Unreadable or unwritable path.
    Io,
    /// A task panicked.
    Internal,
}

/// Failure of a single task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("compile error in `{}`:\n{message}", path.display())]
    Compile { path: PathBuf, message: String },

    #[error("{0}")]
    Configuration(String),

    #[error("IO error at `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to process image `{}`: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("task panicked: {0}")]
    Panic(String),
}

impl TaskError {
    pub fn compile(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Compile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Map an `io::Error` to a path-annotated task error.
    ///
    /// ```ignore
    /// fs::write(&path, css).map_err(TaskError::io(&path))?;
    /// ```
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Compile { .. } => ErrorClass::Compile,
            Self::Configuration(_) => ErrorClass::Configuration,
            Self::Io { .. } | Self::Image { .. } => ErrorClass::Io,
            Self::Panic(_) => ErrorClass::Internal,
        }
    }
}
