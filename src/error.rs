use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::header::HeaderError;
use crate::index::IndexError;
use crate::record::RecordError;

#[derive(Error, Debug)]
pub enum PvmxError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("{}: {source}", .path.display())]
    Path { path: PathBuf, source: io::Error },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{0} path cannot be empty")]
    EmptyPath(&'static str),
    #[error("Failed to read payload for {name}: {source}")]
    PayloadSource { name: String, source: io::Error },
    #[error("Failed to write extracted payload: {source}")]
    PayloadSink { source: io::Error },
    #[error("No payload was written for dictionary entry {position} ({name})")]
    MissingPayload { position: usize, name: String },
    #[error("Dictionary is already closed; no further entries can be added")]
    DictionaryClosed,
    #[error("Refusing to extract outside the output directory: {0}")]
    UnsafeName(String),
    #[error("Texture name cannot be written to an index line: {0:?}")]
    UnindexableName(String),
}

impl PvmxError {
    /// Attach `path` to a bare IO error so the diagnostic names the file.
    ///
    /// IO errors wrapped inside header/record/index errors are attached as well;
    /// every other variant is returned unchanged.
    pub fn at(self, path: &Path) -> Self {
        let source = match self {
            PvmxError::Io(e)                       => e,
            PvmxError::Header(HeaderError::Io(e))  => e,
            PvmxError::Record(RecordError::Io(e))  => e,
            PvmxError::Index(IndexError::Io(e))    => e,
            other                                  => return other,
        };
        PvmxError::Path { path: path.to_owned(), source }
    }
}

/// `map_err` shorthand for naming the path an IO call touched.
pub trait PathContext<T> {
    fn with_path(self, path: &Path) -> Result<T, PvmxError>;
}

impl<T> PathContext<T> for io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T, PvmxError> {
        self.map_err(|source| PvmxError::Path { path: path.to_owned(), source })
    }
}

impl<T> PathContext<T> for Result<T, PvmxError> {
    fn with_path(self, path: &Path) -> Result<T, PvmxError> {
        self.map_err(|e| e.at(path))
    }
}

pub type Result<T, E = PvmxError> = std::result::Result<T, E>;
