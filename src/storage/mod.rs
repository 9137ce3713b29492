//! Network summary persistence
//!
//! The loader hands its result to a `SummaryStore`. `SqliteStore` is the
//! bundled implementation.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{OpenStore, StorageError, StorageResult, SummaryStore};
