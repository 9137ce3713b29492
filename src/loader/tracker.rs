//! Defined/referenced id bookkeeping per identifier space

use crate::cx::{aspect, ElementId};
use std::collections::HashSet;
use std::fmt;

/// Independent id namespaces checked for dangling references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdSpace {
    Node,
    Edge,
    Citation,
    Support,
}

impl IdSpace {
    /// The aspect whose elements define ids in this space
    pub fn aspect_name(&self) -> &'static str {
        match self {
            Self::Node => aspect::NODES,
            Self::Edge => aspect::EDGES,
            Self::Citation => aspect::CITATIONS,
            Self::Support => aspect::SUPPORTS,
        }
    }

    /// Dangling references here abort the pass
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Node | Self::Edge)
    }
}

impl fmt::Display for IdSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.aspect_name())
    }
}

/// Tracks which ids of one space were defined and which were referenced.
///
/// Duplicate definitions are not detected.
#[derive(Debug, Clone)]
pub struct IdTracker {
    space: IdSpace,
    defined: HashSet<ElementId>,
    referenced: HashSet<ElementId>,
}

impl IdTracker {
    pub fn new(space: IdSpace) -> Self {
        Self {
            space,
            defined: HashSet::new(),
            referenced: HashSet::new(),
        }
    }

    pub fn space(&self) -> IdSpace {
        self.space
    }

    pub fn add_defined(&mut self, id: ElementId) {
        self.defined.insert(id);
    }

    pub fn add_referenced(&mut self, id: ElementId) {
        self.referenced.insert(id);
    }

    pub fn defined_count(&self) -> usize {
        self.defined.len()
    }

    /// Referenced ids that were never defined, ascending
    pub fn undefined_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self.referenced.difference(&self.defined).copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Describe dangling references, if any
    pub fn check_undefined(&self) -> Option<String> {
        let ids = self.undefined_ids();
        if ids.is_empty() {
            return None;
        }
        let listed: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        Some(format!(
            "Undefined id(s) referenced in aspect {}: [{}]",
            self.space,
            listed.join(", ")
        ))
    }
}
