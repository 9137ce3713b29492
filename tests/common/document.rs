//! CX document builder

use cxload::CxReader;
use serde_json::{json, Map, Value};
use std::io::Cursor;
use std::path::Path;

/// A CX document assembled fragment by fragment
#[derive(Debug, Clone, Default)]
pub struct CxDocument {
    fragments: Vec<Value>,
}

impl CxDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `metaData` fragment
    pub fn metadata(mut self, entries: Vec<Value>) -> Self {
        self.fragments.push(json!({ "metaData": entries }));
        self
    }

    /// Append one aspect fragment
    pub fn aspect(mut self, name: &str, elements: Vec<Value>) -> Self {
        let mut fragment = Map::new();
        fragment.insert(name.to_string(), Value::Array(elements));
        self.fragments.push(Value::Object(fragment));
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.fragments).unwrap()
    }

    pub fn reader(&self) -> CxReader<Cursor<Vec<u8>>> {
        CxReader::new(Cursor::new(self.to_bytes()))
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, self.to_bytes()).unwrap();
    }
}

/// Metadata entry in consistency group 1
pub fn meta(name: &str, count: u64, id_counter: Option<i64>) -> Value {
    let mut entry = json!({
        "name": name,
        "elementCount": count,
        "consistencyGroup": 1,
        "version": "1.0"
    });
    if let Some(counter) = id_counter {
        entry["idCounter"] = json!(counter);
    }
    entry
}

/// Two nodes joined by one edge, with matching metadata
pub fn minimal_network() -> CxDocument {
    CxDocument::new()
        .metadata(vec![meta("nodes", 2, Some(2)), meta("edges", 1, Some(1))])
        .aspect("nodes", vec![json!({"@id": 1}), json!({"@id": 2})])
        .aspect("edges", vec![json!({"@id": 1, "s": 1, "t": 2})])
}
