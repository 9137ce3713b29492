//! Search-index hook
//!
//! The loader forwards selected elements to an indexer as it streams. Index
//! failures never affect the pass; they are logged and dropped.

use crate::cx::{ElementAttribute, FunctionTerm, NetworkAttribute, NodeElement};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("index error: {0}")]
pub struct IndexError(pub String);

pub type IndexResult = Result<(), IndexError>;

/// Receives elements worth indexing during a pass
pub trait NetworkIndexer: Send + Sync {
    fn add_node(&self, node: &NodeElement) -> IndexResult;

    fn add_node_attribute(&self, attr: &ElementAttribute) -> IndexResult;

    fn add_network_attribute(&self, attr: &NetworkAttribute) -> IndexResult;

    fn add_function_term(&self, term: &FunctionTerm) -> IndexResult;
}

/// Indexer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndexer;

impl NetworkIndexer for NoopIndexer {
    fn add_node(&self, _node: &NodeElement) -> IndexResult {
        Ok(())
    }

    fn add_node_attribute(&self, _attr: &ElementAttribute) -> IndexResult {
        Ok(())
    }

    fn add_network_attribute(&self, _attr: &NetworkAttribute) -> IndexResult {
        Ok(())
    }

    fn add_function_term(&self, _term: &FunctionTerm) -> IndexResult {
        Ok(())
    }
}
