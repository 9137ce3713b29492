//! Single-pass CX ingestion
//!
//! `CxNetworkLoader` streams one network's aspects to disk while tracking
//! identifier integrity, then reconciles the stream's metadata and produces
//! the network summary.

mod engine;
mod error;
mod guard;
mod index;
mod reconcile;
mod summary;
mod task;
mod tracker;
mod writer;

pub use engine::{CxNetworkLoader, LoadOutcome};
pub use error::{LoadError, LoadResult};
pub use guard::{IngestionGuard, DEFAULT_PROGRESS_INTERVAL};
pub use index::{IndexError, IndexResult, NetworkIndexer, NoopIndexer};
pub use reconcile::{merge_metadata, reconcile_metadata};
pub use summary::{NameState, NetworkSummary, PropertyValuePair, SummaryAccumulator, Visibility};
pub use task::NetworkLoadingTask;
pub use tracker::{IdSpace, IdTracker};
pub use writer::{AspectWriter, AspectWriterPool};
