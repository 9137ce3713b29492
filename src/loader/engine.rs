//! CxNetworkLoader: single-pass ingestion of one network
//!
//! Pass steps:
//! 1. Admit each element through the guard, update id trackers and the
//!    summary accumulator, append it to its aspect file
//! 2. Check identifier integrity (node/edge fatal, citation/support warnings)
//! 3. Merge pre/post metadata and reconcile it against written counts
//! 4. Close the aspect files and hand the summary to the store

use super::error::{LoadError, LoadResult};
use super::guard::{IngestionGuard, DEFAULT_PROGRESS_INTERVAL};
use super::index::{IndexResult, NetworkIndexer, NoopIndexer};
use super::reconcile::{merge_metadata, reconcile_metadata};
use super::summary::{NetworkSummary, SummaryAccumulator};
use super::tracker::{IdSpace, IdTracker};
use super::writer::AspectWriterPool;
use crate::config::LoaderConfig;
use crate::cx::{aspect, AspectElement, AspectSource, ElementId, MetadataCollection};
use crate::storage::SummaryStore;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Everything a successful pass produces
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub summary: NetworkSummary,
    /// Reconciled metadata
    pub metadata: MetadataCollection,
    /// The `provenanceHistory` element, when the stream carried one
    pub provenance: Option<Value>,
    pub subnetwork_ids: BTreeSet<ElementId>,
    /// Elements admitted through the guard
    pub elements_loaded: u64,
}

/// Mutable state of one ingestion pass
struct LoadContext<'a> {
    nodes: IdTracker,
    edges: IdTracker,
    citations: IdTracker,
    supports: IdTracker,
    writers: AspectWriterPool,
    summary: SummaryAccumulator,
    guard: IngestionGuard,
    provenance: Option<Value>,
    indexer: &'a dyn NetworkIndexer,
}

impl<'a> LoadContext<'a> {
    fn new(dir: &Path, guard: IngestionGuard, indexer: &'a dyn NetworkIndexer) -> Self {
        Self {
            nodes: IdTracker::new(IdSpace::Node),
            edges: IdTracker::new(IdSpace::Edge),
            citations: IdTracker::new(IdSpace::Citation),
            supports: IdTracker::new(IdSpace::Support),
            writers: AspectWriterPool::new(dir),
            summary: SummaryAccumulator::new(),
            guard,
            provenance: None,
            indexer,
        }
    }

    fn dispatch(&mut self, element: AspectElement) -> LoadResult<()> {
        let element = match element {
            AspectElement::NetworkStatus(_) => return Ok(()),
            AspectElement::Provenance(provenance) => {
                self.provenance = Some(provenance);
                return Ok(());
            }
            other => other,
        };

        self.guard.admit()?;

        match &element {
            AspectElement::Node(node) => {
                self.nodes.add_defined(node.id);
                log_index_failure(self.indexer.add_node(node));
            }
            AspectElement::Edge(edge) => {
                self.edges.add_defined(edge.id);
                self.nodes.add_referenced(edge.source);
                self.nodes.add_referenced(edge.target);
            }
            AspectElement::NodeAttribute(attr) => {
                self.nodes.add_referenced(attr.property_of);
                log_index_failure(self.indexer.add_node_attribute(attr));
            }
            AspectElement::EdgeAttribute(_) => {}
            AspectElement::NetworkAttribute(attr) => {
                self.summary.add_network_attribute(attr);
                log_index_failure(self.indexer.add_network_attribute(attr));
            }
            AspectElement::Citation(citation) => self.citations.add_defined(citation.id),
            AspectElement::Support(support) => self.supports.add_defined(support.id),
            AspectElement::EdgeCitationLink(links) => {
                links.source_ids.iter().for_each(|id| self.edges.add_referenced(*id));
                links.citation_ids.iter().for_each(|id| self.citations.add_referenced(*id));
            }
            AspectElement::EdgeSupportLink(links) => {
                links.source_ids.iter().for_each(|id| self.edges.add_referenced(*id));
                links.support_ids.iter().for_each(|id| self.supports.add_referenced(*id));
            }
            AspectElement::NodeCitationLink(links) => {
                links.source_ids.iter().for_each(|id| self.nodes.add_referenced(*id));
                links.citation_ids.iter().for_each(|id| self.citations.add_referenced(*id));
            }
            AspectElement::NodeSupportLink(links) => {
                links.source_ids.iter().for_each(|id| self.nodes.add_referenced(*id));
                links.support_ids.iter().for_each(|id| self.supports.add_referenced(*id));
            }
            AspectElement::FunctionTerm(term) => {
                self.nodes.add_referenced(term.node_id);
                log_index_failure(self.indexer.add_function_term(term));
            }
            AspectElement::Opaque { aspect: name, .. } => {
                if name == aspect::SUBNETWORKS || name == aspect::CY_SUBNETWORKS {
                    match element.subnetwork_id() {
                        Some(id) => self.summary.add_subnetwork(id),
                        None => self
                            .summary
                            .warn(format!("Element of aspect {} has no numeric @id.", name)),
                    }
                }
            }
            AspectElement::NetworkStatus(_) | AspectElement::Provenance(_) => {}
        }

        self.writers.write(&element)?;
        Ok(())
    }

    fn check_integrity(&mut self) -> LoadResult<()> {
        for tracker in [&self.nodes, &self.edges, &self.supports, &self.citations] {
            if let Some(message) = tracker.check_undefined() {
                if tracker.space().is_strict() {
                    return Err(LoadError::UndefinedIds(message));
                }
                self.summary.warn(message);
            }
        }
        Ok(())
    }

    fn finish(
        mut self,
        network_id: Uuid,
        pre: Option<MetadataCollection>,
        post: Option<MetadataCollection>,
    ) -> LoadResult<LoadOutcome> {
        let mut metadata = merge_metadata(pre, post).ok_or(LoadError::MissingMetadata)?;

        if let Some(attr) = self.summary.synthetic_name_attribute() {
            debug!(name = %attr.value_text(), "re-emitting subnetwork-scoped name as network name");
            self.writers.write(&AspectElement::NetworkAttribute(attr))?;
            if let Some(count) = metadata
                .get_mut(aspect::NETWORK_ATTRIBUTES)
                .and_then(|entry| entry.element_count.as_mut())
            {
                *count += 1;
            }
        }

        let warnings = reconcile_metadata(&mut metadata, &self.writers.element_counts())?;
        for warning in warnings {
            self.summary.warn(warning);
        }

        self.writers.close_all();

        let elements_loaded = self.guard.count();
        let subnetwork_ids = self.summary.subnetwork_ids().clone();
        let summary = self.summary.into_summary(
            network_id,
            self.nodes.defined_count() as u64,
            self.edges.defined_count() as u64,
            Utc::now(),
        );

        Ok(LoadOutcome {
            summary,
            metadata,
            provenance: self.provenance,
            subnetwork_ids,
            elements_loaded,
        })
    }
}

fn log_index_failure(result: IndexResult) {
    if let Err(e) = result {
        warn!("failed to index element: {}", e);
    }
}

/// Loads one CX network into its aspect directory
pub struct CxNetworkLoader {
    network_id: Uuid,
    aspect_dir: PathBuf,
    element_limit: i64,
    progress_interval: u64,
    remove_partial_on_failure: bool,
    indexer: Arc<dyn NetworkIndexer>,
}

impl CxNetworkLoader {
    /// Loader writing to `aspect_dir`, which must not exist yet
    pub fn new(network_id: Uuid, aspect_dir: impl Into<PathBuf>) -> Self {
        Self {
            network_id,
            aspect_dir: aspect_dir.into(),
            element_limit: -1,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            remove_partial_on_failure: true,
            indexer: Arc::new(NoopIndexer),
        }
    }

    /// Loader for `network_id` laid out under the configured data root
    pub fn from_config(network_id: Uuid, config: &LoaderConfig) -> Self {
        Self::new(network_id, config.aspect_dir(&network_id))
            .with_element_limit(config.server_element_limit)
            .with_progress_interval(config.progress_interval)
            .with_remove_partial_on_failure(config.remove_partial_on_failure)
    }

    /// Negative means unlimited
    pub fn with_element_limit(mut self, limit: i64) -> Self {
        self.element_limit = limit;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_remove_partial_on_failure(mut self, remove: bool) -> Self {
        self.remove_partial_on_failure = remove;
        self
    }

    pub fn with_indexer(mut self, indexer: Arc<dyn NetworkIndexer>) -> Self {
        self.indexer = indexer;
        self
    }

    pub fn network_id(&self) -> Uuid {
        self.network_id
    }

    pub fn aspect_dir(&self) -> &Path {
        &self.aspect_dir
    }

    /// Run one pass over `source`.
    ///
    /// On failure the aspect directory is removed unless configured otherwise.
    /// The source is dropped before this returns on every path.
    pub fn load<S: AspectSource>(&self, mut source: S) -> LoadResult<LoadOutcome> {
        let _span = info_span!("cx_load", network = %self.network_id).entered();

        self.create_aspect_dir()?;
        let result = self.run(&mut source);
        drop(source);

        match &result {
            Ok(outcome) => info!(
                elements = outcome.elements_loaded,
                nodes = outcome.summary.node_count,
                edges = outcome.summary.edge_count,
                warnings = outcome.summary.warnings.len(),
                "CX network loaded"
            ),
            Err(e) => {
                error!("Error occurred when loading network {}: {}", self.network_id, e);
                self.discard_partial();
            }
        }
        result
    }

    /// Run one pass and hand the result to `store`.
    ///
    /// Creation time comes from the store when the network is already known
    /// there; otherwise the load time is used.
    pub fn persist<S: AspectSource>(
        &self,
        source: S,
        store: &dyn SummaryStore,
    ) -> LoadResult<NetworkSummary> {
        let mut outcome = self.load(source)?;

        let saved = store.network_creation_time(&self.network_id).and_then(|created| {
            if let Some(created) = created {
                outcome.summary.creation_time = created;
            }
            store.save_network(
                &outcome.summary,
                outcome.provenance.as_ref(),
                &outcome.metadata,
            )
        });

        if let Err(e) = saved {
            error!("DB error when saving network summary {}: {}", self.network_id, e);
            self.discard_partial();
            return Err(e.into());
        }
        Ok(outcome.summary)
    }

    fn run<S: AspectSource>(&self, source: &mut S) -> LoadResult<LoadOutcome> {
        let pre = source.pre_metadata()?;

        let guard = IngestionGuard::new(self.element_limit)
            .with_progress_interval(self.progress_interval);
        let mut ctx = LoadContext::new(&self.aspect_dir, guard, self.indexer.as_ref());

        while let Some(element) = source.next_element()? {
            ctx.dispatch(element)?;
        }

        ctx.check_integrity()?;

        let post = source.post_metadata()?;
        ctx.finish(self.network_id, pre, post)
    }

    fn create_aspect_dir(&self) -> LoadResult<()> {
        if let Some(parent) = self.aspect_dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match std::fs::create_dir(&self.aspect_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(
                LoadError::DirectoryExists(self.aspect_dir.display().to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    fn discard_partial(&self) {
        if !self.remove_partial_on_failure {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.aspect_dir) {
            warn!(
                dir = %self.aspect_dir.display(),
                "failed to remove partial aspect data: {}", e
            );
        }
    }
}
