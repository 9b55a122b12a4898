//! Error types for sysmetrics-store
//!
//! Every failure path returns a typed variant so RPC callers can decide
//! whether to recreate the record, reconfigure storage, or abandon the upload.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// sysmetrics-store error types
#[derive(Error, Debug)]
pub enum Error {
    /// Serving environment missing, torn down, or its metadata store unreachable
    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),

    /// Storage backend unconfigured for the requested artifact kind
    #[error("invalid configuration: {0}\nSet bucket.system_metrics_bucket in the service config")]
    InvalidConfiguration(String),

    /// No record exists for the given ID (ingestion never creates one)
    #[error("system metrics record '{0}' not found")]
    RecordNotFound(String),

    /// A record with this ID was already saved
    #[error("system metrics record '{0}' already exists")]
    RecordExists(String),

    /// A stream carried chunks for more than one record
    #[error("stream bound to record '{bound}' received a chunk for record '{received}'")]
    MixedRecordIds {
        /// ID the stream was bound to by its first chunk
        bound: String,
        /// Offending ID
        received: String,
    },

    /// A stream closed without sending any chunk
    #[error("stream closed before any system metrics chunk was received")]
    EmptyStream,

    /// Identity computation requested for an unrecognized schema version
    #[error("unsupported system metrics schema version {0}")]
    UnsupportedSchema(i32),

    /// Ingestion session already closed or aborted
    #[error("ingestion session ended: {0}")]
    SessionEnded(String),

    /// Blob write or metadata append failed
    #[error("storage write failed: {0}")]
    StorageWriteFailed(String),

    /// Caller cancelled the request
    #[error("request cancelled by caller")]
    Cancelled,

    /// Metadata store error outside the chunk write path
    #[error("metadata store error: {0}")]
    Metadata(String),

    /// Blob read error
    #[error("blob store error: {0}")]
    Blob(String),

    /// Client stream delivered an error instead of a chunk
    #[error("transport error: {0}")]
    Transport(String),

    /// Config file could not be parsed
    #[error("config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse error category, cheap to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::InvalidEnvironment`]
    InvalidEnvironment,
    /// See [`Error::InvalidConfiguration`]
    InvalidConfiguration,
    /// See [`Error::RecordNotFound`]
    RecordNotFound,
    /// See [`Error::RecordExists`]
    RecordExists,
    /// See [`Error::MixedRecordIds`]
    MixedRecordIds,
    /// See [`Error::EmptyStream`]
    EmptyStream,
    /// See [`Error::UnsupportedSchema`]
    UnsupportedSchema,
    /// See [`Error::SessionEnded`]
    SessionEnded,
    /// See [`Error::StorageWriteFailed`]
    StorageWriteFailed,
    /// See [`Error::Cancelled`]
    Cancelled,
    /// Metadata, blob read, transport, config, IO or serialization failure
    Internal,
}

impl Error {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEnvironment(_) => ErrorKind::InvalidEnvironment,
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::RecordNotFound(_) => ErrorKind::RecordNotFound,
            Self::RecordExists(_) => ErrorKind::RecordExists,
            Self::MixedRecordIds { .. } => ErrorKind::MixedRecordIds,
            Self::EmptyStream => ErrorKind::EmptyStream,
            Self::UnsupportedSchema(_) => ErrorKind::UnsupportedSchema,
            Self::SessionEnded(_) => ErrorKind::SessionEnded,
            Self::StorageWriteFailed(_) => ErrorKind::StorageWriteFailed,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Metadata(_)
            | Self::Blob(_)
            | Self::Transport(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Re-tag a failure from the blob write or metadata append step.
    ///
    /// Cancellation keeps its own category.
    #[must_use]
    pub(crate) fn into_write_failure(self) -> Self {
        match self {
            Self::Cancelled | Self::StorageWriteFailed(_) => self,
            other => Self::StorageWriteFailed(other.to_string()),
        }
    }
}
