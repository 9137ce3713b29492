//! Stream metadata: per-aspect declared counts, id counters and consistency groups

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metadata record for one aspect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_counter: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_group: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MetadataElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_count: None,
            id_counter: None,
            consistency_group: None,
            version: None,
            last_update: None,
            properties: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_element_count(mut self, count: u64) -> Self {
        self.element_count = Some(count);
        self
    }

    pub fn with_id_counter(mut self, counter: i64) -> Self {
        self.id_counter = Some(counter);
        self
    }

    pub fn with_consistency_group(mut self, group: i64) -> Self {
        self.consistency_group = Some(group);
        self
    }
}

/// Metadata keyed by aspect name.
///
/// Serializes as the wire array of records, ordered by aspect name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataCollection {
    entries: BTreeMap<String, MetadataElement>,
}

impl MetadataCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `element.name`
    pub fn insert(&mut self, element: MetadataElement) {
        self.entries.insert(element.name.clone(), element);
    }

    pub fn with(mut self, element: MetadataElement) -> Self {
        self.insert(element);
        self
    }

    pub fn get(&self, aspect: &str) -> Option<&MetadataElement> {
        self.entries.get(aspect)
    }

    pub fn get_mut(&mut self, aspect: &str) -> Option<&mut MetadataElement> {
        self.entries.get_mut(aspect)
    }

    pub fn remove(&mut self, aspect: &str) -> Option<MetadataElement> {
        self.entries.remove(aspect)
    }

    pub fn contains(&self, aspect: &str) -> bool {
        self.entries.contains_key(aspect)
    }

    pub fn aspect_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetadataElement> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold a later collection into this one.
    ///
    /// Aspects new to this collection are taken whole. For aspects already
    /// present only `idCounter` and `elementCount` are overridden, and only
    /// when the later record carries them.
    pub fn merge_from(&mut self, later: MetadataCollection) {
        for (name, element) in later.entries {
            match self.entries.get_mut(&name) {
                Some(existing) => {
                    if element.id_counter.is_some() {
                        existing.id_counter = element.id_counter;
                    }
                    if element.element_count.is_some() {
                        existing.element_count = element.element_count;
                    }
                }
                None => {
                    self.entries.insert(name, element);
                }
            }
        }
    }
}

impl FromIterator<MetadataElement> for MetadataCollection {
    fn from_iter<I: IntoIterator<Item = MetadataElement>>(iter: I) -> Self {
        let mut collection = Self::new();
        for element in iter {
            collection.insert(element);
        }
        collection
    }
}

impl Serialize for MetadataCollection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de> Deserialize<'de> for MetadataCollection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = Vec::<MetadataElement>::deserialize(deserializer)?;
        Ok(elements.into_iter().collect())
    }
}
