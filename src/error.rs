use std::path::PathBuf;

use crate::types::ObjectKind;
use crate::Hash;

/// error type for cvs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a repository: {0}")]
    NoRepo(PathBuf),

    #[error("repository already exists at {0}")]
    RepoExists(PathBuf),

    #[error("ref not found: {0}")]
    RefNotFound(String),

    #[error("invalid ref name: {0}")]
    InvalidRef(String),

    #[error("object not found: {0}")]
    ObjectNotFound(Hash),

    #[error("corrupt object: hash mismatch for {0}")]
    CorruptObject(Hash),

    #[error("expected {expected} object, found {found}")]
    UnexpectedObjectKind {
        expected: ObjectKind,
        found: ObjectKind,
    },

    #[error("unsupported object format version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid hash: {0}")]
    InvalidHashHex(String),

    #[error("path is outside the working tree: {0}")]
    PathOutsideRepo(PathBuf),

    #[error("file name is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("nothing staged to commit")]
    NothingToCommit,

    #[error("lock contention on repository")]
    LockContention,

    #[error("invalid ignore pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cbor serialization error: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("cbor deserialization error: {0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}

/// map a read failure, turning NotFound into the given error
pub(crate) fn not_found_or_io(source: std::io::Error, path: PathBuf, missing: Error) -> Error {
    if source.kind() == std::io::ErrorKind::NotFound {
        missing
    } else {
        Error::Io { path, source }
    }
}
