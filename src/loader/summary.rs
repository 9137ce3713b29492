//! Network summary derived during ingestion

use crate::cx::{reserved, ElementId, NetworkAttribute};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;
use uuid::Uuid;

const DEFAULT_PROPERTY_TYPE: &str = "string";

/// Network visibility; new networks are private
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
        }
    }
}

/// A network property that is not one of the summary's own fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValuePair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnetwork_id: Option<ElementId>,
    pub predicate_string: String,
    pub value: String,
    pub data_type: String,
}

impl PropertyValuePair {
    pub fn from_attribute(attr: &NetworkAttribute) -> Self {
        Self {
            subnetwork_id: attr.subnetwork,
            predicate_string: attr.name.clone(),
            value: attr.value_text(),
            data_type: attr.data_type().to_string(),
        }
    }

    /// A subnetwork-scoped `name` is always recorded as a string
    fn scoped_name(attr: &NetworkAttribute, value: String) -> Self {
        Self {
            subnetwork_id: attr.subnetwork,
            predicate_string: attr.name.clone(),
            value,
            data_type: DEFAULT_PROPERTY_TYPE.to_string(),
        }
    }
}

/// The record handed to the summary store after a successful pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub external_id: Uuid,
    pub visibility: Visibility,
    pub node_count: u64,
    pub edge_count: u64,
    pub creation_time: DateTime<Utc>,
    pub modification_time: DateTime<Utc>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub properties: Vec<PropertyValuePair>,
    pub warnings: Vec<String>,
}

/// How the network name was captured
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NameState {
    #[default]
    Unset,
    /// From an unscoped `name` attribute
    Canonical(String),
    /// From a subnetwork-scoped `name` attribute; re-emitted unscoped at pass end
    Property(String),
}

impl NameState {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Unset => None,
            Self::Canonical(name) | Self::Property(name) => Some(name),
        }
    }
}

/// Accumulates summary fields from network attributes and opaque aspects
#[derive(Debug, Default)]
pub struct SummaryAccumulator {
    name: NameState,
    description: Option<String>,
    version: Option<String>,
    properties: Vec<PropertyValuePair>,
    subnetwork_ids: BTreeSet<ElementId>,
    warnings: Vec<String>,
}

impl SummaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unscoped `name`, `description` and `version` fill the summary fields,
    /// first value wins and later ones are dropped. Everything else, scoped
    /// reserved names included, becomes a property.
    pub fn add_network_attribute(&mut self, attr: &NetworkAttribute) {
        if attr.is_scoped() {
            if attr.name == reserved::NAME {
                let value = attr.value_text();
                self.properties.push(PropertyValuePair::scoped_name(attr, value.clone()));
                self.name = NameState::Property(value);
            } else {
                self.properties.push(PropertyValuePair::from_attribute(attr));
            }
            return;
        }
        match attr.name.as_str() {
            reserved::NAME => {
                if self.name == NameState::Unset {
                    self.name = NameState::Canonical(attr.value_text());
                }
            }
            reserved::DESCRIPTION => {
                self.description.get_or_insert_with(|| attr.value_text());
            }
            reserved::VERSION => {
                self.version.get_or_insert_with(|| attr.value_text());
            }
            _ => self.properties.push(PropertyValuePair::from_attribute(attr)),
        }
    }

    pub fn add_subnetwork(&mut self, id: ElementId) {
        self.subnetwork_ids.insert(id);
    }

    /// Record a recoverable problem
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn name_state(&self) -> &NameState {
        &self.name
    }

    pub fn name(&self) -> Option<&str> {
        self.name.name()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn properties(&self) -> &[PropertyValuePair] {
        &self.properties
    }

    pub fn subnetwork_ids(&self) -> &BTreeSet<ElementId> {
        &self.subnetwork_ids
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Unscoped `name` attribute to append when the name only arrived scoped
    pub fn synthetic_name_attribute(&self) -> Option<NetworkAttribute> {
        match &self.name {
            NameState::Property(name) => Some(NetworkAttribute::new(reserved::NAME, name.as_str())),
            _ => None,
        }
    }

    /// Build the summary record. Timestamps are filled in by the caller.
    pub fn into_summary(
        self,
        external_id: Uuid,
        node_count: u64,
        edge_count: u64,
        timestamp: DateTime<Utc>,
    ) -> NetworkSummary {
        NetworkSummary {
            external_id,
            visibility: Visibility::Private,
            node_count,
            edge_count,
            creation_time: timestamp,
            modification_time: timestamp,
            name: self.name.name().map(str::to_string),
            description: self.description,
            version: self.version,
            properties: self.properties,
            warnings: self.warnings,
        }
    }
}
