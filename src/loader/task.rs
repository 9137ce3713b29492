//! Background task wrapper around a single network load

use super::engine::CxNetworkLoader;
use super::error::LoadResult;
use super::index::{NetworkIndexer, NoopIndexer};
use super::summary::NetworkSummary;
use crate::config::LoaderConfig;
use crate::cx::CxReader;
use crate::storage::SummaryStore;
use std::fs::File;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Loads `<data_root>/<id>/network.cx` and records the outcome in the store.
///
/// A failed load leaves its message on the network's store entry.
pub struct NetworkLoadingTask {
    config: LoaderConfig,
    store: Arc<dyn SummaryStore>,
    indexer: Arc<dyn NetworkIndexer>,
}

impl NetworkLoadingTask {
    pub fn new(config: LoaderConfig, store: Arc<dyn SummaryStore>) -> Self {
        Self {
            config,
            store,
            indexer: Arc::new(NoopIndexer),
        }
    }

    pub fn with_indexer(mut self, indexer: Arc<dyn NetworkIndexer>) -> Self {
        self.indexer = indexer;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn run(&self, network_id: Uuid) -> LoadResult<NetworkSummary> {
        let result = self.load(network_id);
        if let Err(e) = &result {
            if let Err(store_err) = self.store.set_error_message(&network_id, &e.to_string()) {
                error!(
                    "Failed to record error message for network {}: {}",
                    network_id, store_err
                );
            }
        }
        result
    }

    fn load(&self, network_id: Uuid) -> LoadResult<NetworkSummary> {
        let file = File::open(self.config.network_file(&network_id))?;
        let reader = CxReader::from_reader(file);
        CxNetworkLoader::from_config(network_id, &self.config)
            .with_indexer(self.indexer.clone())
            .persist(reader, self.store.as_ref())
    }
}
