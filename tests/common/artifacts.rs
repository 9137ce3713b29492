//! Reading back per-aspect artifacts

use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// File name to content for every artifact under `dir`
pub fn read_artifacts(dir: &Path) -> BTreeMap<String, String> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            let content = std::fs::read_to_string(e.path()).unwrap();
            (name, content)
        })
        .collect()
}

pub fn artifact_names(dir: &Path) -> Vec<String> {
    read_artifacts(dir).into_keys().collect()
}
