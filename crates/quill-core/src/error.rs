use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the project layer.
///
/// Query paths never produce these: a missing file or an unresolvable link is
/// an empty result, not an error. Only enumeration, metadata parsing and
/// explicit file operations fail.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid metadata record {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid project config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl ProjectError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProjectError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors that mean "nothing there" rather than "something broke".
    pub fn is_not_found(&self) -> bool {
        match self {
            ProjectError::NotFound(_) => true,
            ProjectError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectError>;
