//! Fatal errors that abort an ingestion pass

use crate::cx::CxError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that abort an ingestion pass.
///
/// Anything recoverable is recorded as a warning on the network summary
/// instead of surfacing here.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Error reading CX stream: {0}")]
    Stream(#[from] CxError),

    #[error("IO error writing aspect data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    UndefinedIds(String),

    #[error("Element count in the CX input stream exceeded server limit {limit}")]
    ElementLimitExceeded { limit: i64 },

    #[error("No CX metadata found in this CX stream.")]
    MissingMetadata,

    #[error("Idcounter value is not found in metadata of aspect {0}")]
    MissingIdCounter(String),

    #[error("Aspect {0} is not defined in MetaData section.")]
    UndeclaredAspect(String),

    #[error("Network data directory {0} already exists")]
    DirectoryExists(String),
}

/// Result type for ingestion
pub type LoadResult<T> = Result<T, LoadError>;
