//! cxload: streaming ingestion and validation of CX networks
//!
//! A CX document describes one network as a sequence of typed aspect
//! fragments (nodes, edges, attributes, citations, supports and opaque
//! extension aspects). The loader consumes that stream once, writes each
//! aspect to its own file, checks that every referenced node/edge/citation/
//! support id is defined, and reconciles the stream's declared metadata
//! against what it actually received.
//!
//! # Example
//!
//! ```no_run
//! use cxload::{CxNetworkLoader, CxReader};
//! use uuid::Uuid;
//!
//! let reader = CxReader::from_reader(std::fs::File::open("network.cx")?);
//! let outcome = CxNetworkLoader::new(Uuid::new_v4(), "/tmp/net/aspects").load(reader)?;
//! println!("{} nodes, {} warnings", outcome.summary.node_count, outcome.summary.warnings.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod cx;
pub mod loader;
pub mod storage;

pub use config::{ConfigError, LoaderConfig};
pub use cx::{AspectElement, AspectSource, CxError, CxReader, MemorySource, MetadataCollection};
pub use loader::{
    CxNetworkLoader, LoadError, LoadOutcome, LoadResult, NetworkIndexer, NetworkLoadingTask,
    NetworkSummary,
};
pub use storage::{OpenStore, SqliteStore, StorageError, StorageResult, SummaryStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
