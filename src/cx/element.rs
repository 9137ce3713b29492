//! Typed CX aspect elements
//!
//! Each element is decoded from its aspect fragment and re-serialized when
//! persisted. Fields the loader does not inspect are carried through `extra`,
//! so the written element has the same members as the one received. An
//! attribute value given as `null` is written without its `v` member.

use super::reader::{CxError, CxResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;

/// Element identifier within one identifier space
pub type ElementId = i64;

/// Well-known aspect names on the wire
pub mod aspect {
    pub const NODES: &str = "nodes";
    pub const EDGES: &str = "edges";
    pub const NODE_ATTRIBUTES: &str = "nodeAttributes";
    pub const EDGE_ATTRIBUTES: &str = "edgeAttributes";
    pub const NETWORK_ATTRIBUTES: &str = "networkAttributes";
    pub const CITATIONS: &str = "citations";
    pub const SUPPORTS: &str = "supports";
    pub const EDGE_CITATIONS: &str = "edgeCitations";
    pub const EDGE_SUPPORTS: &str = "edgeSupports";
    pub const NODE_CITATIONS: &str = "nodeCitations";
    pub const NODE_SUPPORTS: &str = "nodeSupports";
    pub const FUNCTION_TERMS: &str = "functionTerms";
    pub const NETWORK_STATUS: &str = "ndexStatus";
    pub const PROVENANCE: &str = "provenanceHistory";
    pub const METADATA: &str = "metaData";
    pub const NUMBER_VERIFICATION: &str = "numberVerification";
    pub const STATUS: &str = "status";
    pub const SUBNETWORKS: &str = "subNetworks";
    pub const CY_SUBNETWORKS: &str = "cySubNetworks";
}

/// Reserved network attribute names
pub mod reserved {
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const VERSION: &str = "version";
}

const DEFAULT_DATA_TYPE: &str = "string";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeElement {
    #[serde(rename = "@id")]
    pub id: ElementId,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub represents: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeElement {
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            name: None,
            represents: None,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeElement {
    #[serde(rename = "@id")]
    pub id: ElementId,
    #[serde(rename = "s")]
    pub source: ElementId,
    #[serde(rename = "t")]
    pub target: ElementId,
    #[serde(rename = "i", default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EdgeElement {
    pub fn new(id: ElementId, source: ElementId, target: ElementId) -> Self {
        Self {
            id,
            source,
            target,
            interaction: None,
            extra: Map::new(),
        }
    }
}

/// Attribute attached to a node or an edge (`po` is the owner id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementAttribute {
    #[serde(rename = "po")]
    pub property_of: ElementId,
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "v", default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<ElementId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ElementAttribute {
    pub fn new(property_of: ElementId, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            property_of,
            name: name.into(),
            value: value.into(),
            data_type: None,
            subnetwork: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkAttribute {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "v", default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<ElementId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NetworkAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            data_type: None,
            subnetwork: None,
            extra: Map::new(),
        }
    }

    pub fn with_subnetwork(mut self, subnetwork: ElementId) -> Self {
        self.subnetwork = Some(subnetwork);
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Declared data type, `string` when absent
    pub fn data_type(&self) -> &str {
        self.data_type.as_deref().unwrap_or(DEFAULT_DATA_TYPE)
    }

    /// `list_of_*` types carry a JSON array value
    pub fn is_single_value(&self) -> bool {
        !self.data_type().starts_with("list_of_")
    }

    /// Scalar text of a single value, or the JSON text of a list value
    pub fn value_text(&self) -> String {
        match (&self.value, self.is_single_value()) {
            (Value::String(s), true) => s.clone(),
            (Value::Null, true) => String::new(),
            (other, _) => other.to_string(),
        }
    }

    pub fn is_scoped(&self) -> bool {
        self.subnetwork.is_some()
    }
}

/// Citation or support definition (the `@id` is all the loader inspects)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedElement {
    #[serde(rename = "@id")]
    pub id: ElementId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdentifiedElement {
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationLinks {
    #[serde(rename = "po")]
    pub source_ids: Vec<ElementId>,
    #[serde(rename = "citations")]
    pub citation_ids: Vec<ElementId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CitationLinks {
    pub fn new(source_ids: Vec<ElementId>, citation_ids: Vec<ElementId>) -> Self {
        Self {
            source_ids,
            citation_ids,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportLinks {
    #[serde(rename = "po")]
    pub source_ids: Vec<ElementId>,
    #[serde(rename = "supports")]
    pub support_ids: Vec<ElementId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SupportLinks {
    pub fn new(source_ids: Vec<ElementId>, support_ids: Vec<ElementId>) -> Self {
        Self {
            source_ids,
            support_ids,
            extra: Map::new(),
        }
    }
}

/// Function term applied to a node (`po`); `args` are kept as given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTerm {
    #[serde(rename = "po")]
    pub node_id: ElementId,
    #[serde(rename = "f")]
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FunctionTerm {
    pub fn new(node_id: ElementId, function: impl Into<String>) -> Self {
        Self {
            node_id,
            function: function.into(),
            args: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// One element of the CX stream, classified by its aspect
#[derive(Debug, Clone, PartialEq)]
pub enum AspectElement {
    Node(NodeElement),
    Edge(EdgeElement),
    NodeAttribute(ElementAttribute),
    EdgeAttribute(ElementAttribute),
    NetworkAttribute(NetworkAttribute),
    Citation(IdentifiedElement),
    Support(IdentifiedElement),
    EdgeCitationLink(CitationLinks),
    EdgeSupportLink(SupportLinks),
    NodeCitationLink(CitationLinks),
    NodeSupportLink(SupportLinks),
    FunctionTerm(FunctionTerm),
    NetworkStatus(Value),
    Provenance(Value),
    Opaque { aspect: String, data: Value },
}

impl AspectElement {
    /// Decode one raw element of the named aspect.
    ///
    /// Unknown aspect names decode to `Opaque` and keep their payload as-is.
    pub fn decode(aspect_name: &str, raw: &[u8]) -> CxResult<Self> {
        let decoded = match aspect_name {
            aspect::NODES => serde_json::from_slice(raw).map(Self::Node),
            aspect::EDGES => serde_json::from_slice(raw).map(Self::Edge),
            aspect::NODE_ATTRIBUTES => serde_json::from_slice(raw).map(Self::NodeAttribute),
            aspect::EDGE_ATTRIBUTES => serde_json::from_slice(raw).map(Self::EdgeAttribute),
            aspect::NETWORK_ATTRIBUTES => serde_json::from_slice(raw).map(Self::NetworkAttribute),
            aspect::CITATIONS => serde_json::from_slice(raw).map(Self::Citation),
            aspect::SUPPORTS => serde_json::from_slice(raw).map(Self::Support),
            aspect::EDGE_CITATIONS => serde_json::from_slice(raw).map(Self::EdgeCitationLink),
            aspect::EDGE_SUPPORTS => serde_json::from_slice(raw).map(Self::EdgeSupportLink),
            aspect::NODE_CITATIONS => serde_json::from_slice(raw).map(Self::NodeCitationLink),
            aspect::NODE_SUPPORTS => serde_json::from_slice(raw).map(Self::NodeSupportLink),
            aspect::FUNCTION_TERMS => serde_json::from_slice(raw).map(Self::FunctionTerm),
            aspect::NETWORK_STATUS => serde_json::from_slice(raw).map(Self::NetworkStatus),
            aspect::PROVENANCE => serde_json::from_slice(raw).map(Self::Provenance),
            other => serde_json::from_slice(raw).map(|data| Self::Opaque {
                aspect: other.to_string(),
                data,
            }),
        };
        decoded.map_err(|source| CxError::MalformedElement {
            aspect: aspect_name.to_string(),
            source,
        })
    }

    /// Aspect name used for routing, writer keying and metadata lookup
    pub fn aspect_name(&self) -> &str {
        match self {
            Self::Node(_) => aspect::NODES,
            Self::Edge(_) => aspect::EDGES,
            Self::NodeAttribute(_) => aspect::NODE_ATTRIBUTES,
            Self::EdgeAttribute(_) => aspect::EDGE_ATTRIBUTES,
            Self::NetworkAttribute(_) => aspect::NETWORK_ATTRIBUTES,
            Self::Citation(_) => aspect::CITATIONS,
            Self::Support(_) => aspect::SUPPORTS,
            Self::EdgeCitationLink(_) => aspect::EDGE_CITATIONS,
            Self::EdgeSupportLink(_) => aspect::EDGE_SUPPORTS,
            Self::NodeCitationLink(_) => aspect::NODE_CITATIONS,
            Self::NodeSupportLink(_) => aspect::NODE_SUPPORTS,
            Self::FunctionTerm(_) => aspect::FUNCTION_TERMS,
            Self::NetworkStatus(_) => aspect::NETWORK_STATUS,
            Self::Provenance(_) => aspect::PROVENANCE,
            Self::Opaque { aspect, .. } => aspect,
        }
    }

    /// Serialize the element payload as it appears inside its aspect array.
    pub fn write_json<W: Write>(&self, out: W) -> serde_json::Result<()> {
        match self {
            Self::Node(e) => serde_json::to_writer(out, e),
            Self::Edge(e) => serde_json::to_writer(out, e),
            Self::NodeAttribute(e) | Self::EdgeAttribute(e) => serde_json::to_writer(out, e),
            Self::NetworkAttribute(e) => serde_json::to_writer(out, e),
            Self::Citation(e) | Self::Support(e) => serde_json::to_writer(out, e),
            Self::EdgeCitationLink(e) | Self::NodeCitationLink(e) => serde_json::to_writer(out, e),
            Self::EdgeSupportLink(e) | Self::NodeSupportLink(e) => serde_json::to_writer(out, e),
            Self::FunctionTerm(e) => serde_json::to_writer(out, e),
            Self::NetworkStatus(v) | Self::Provenance(v) => serde_json::to_writer(out, v),
            Self::Opaque { data, .. } => serde_json::to_writer(out, data),
        }
    }

    /// Subnetwork id declared by a `subNetworks`/`cySubNetworks` element
    pub fn subnetwork_id(&self) -> Option<ElementId> {
        match self {
            Self::Opaque { aspect, data }
                if aspect == aspect::SUBNETWORKS || aspect == aspect::CY_SUBNETWORKS =>
            {
                data.get("@id").and_then(Value::as_i64)
            }
            _ => None,
        }
    }
}
