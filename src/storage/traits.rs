//! Storage trait definitions

use crate::cx::MetadataCollection;
use crate::loader::NetworkSummary;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence for network summaries.
///
/// Implementations must be thread-safe (Send + Sync) so one store can serve
/// several loading tasks.
pub trait SummaryStore: Send + Sync {
    /// Create an entry for a network that is about to be loaded
    fn register_network(&self, id: &Uuid, created: DateTime<Utc>) -> StorageResult<()>;

    /// Creation time of an existing entry
    fn network_creation_time(&self, id: &Uuid) -> StorageResult<Option<DateTime<Utc>>>;

    /// Save the result of a successful pass and mark the network complete.
    ///
    /// All-or-nothing: a failure leaves the previous entry untouched.
    fn save_network(
        &self,
        summary: &NetworkSummary,
        provenance: Option<&Value>,
        metadata: &MetadataCollection,
    ) -> StorageResult<()>;

    /// Record why loading a network failed
    fn set_error_message(&self, id: &Uuid, message: &str) -> StorageResult<()>;

    fn load_summary(&self, id: &Uuid) -> StorageResult<Option<NetworkSummary>>;

    fn load_metadata(&self, id: &Uuid) -> StorageResult<Option<MetadataCollection>>;

    fn error_message(&self, id: &Uuid) -> StorageResult<Option<String>>;

    fn is_complete(&self, id: &Uuid) -> StorageResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: SummaryStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
