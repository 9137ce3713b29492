//! Post-pass reconciliation of declared metadata against written elements

use super::error::{LoadError, LoadResult};
use crate::cx::{aspect, MetadataCollection};
use std::collections::{BTreeMap, BTreeSet};

/// Aspects whose metadata must carry an id counter
const ID_BEARING_ASPECTS: [&str; 4] = [
    aspect::NODES,
    aspect::EDGES,
    aspect::CITATIONS,
    aspect::SUPPORTS,
];

/// Combine metadata declared before and after the element stream.
///
/// Post-stream `idCounter`/`elementCount` values win when present.
pub fn merge_metadata(
    pre: Option<MetadataCollection>,
    post: Option<MetadataCollection>,
) -> Option<MetadataCollection> {
    match (pre, post) {
        (Some(mut pre), Some(post)) => {
            pre.merge_from(post);
            Some(pre)
        }
        (pre, post) => pre.or(post),
    }
}

/// Validate `metadata` against the element counts actually written.
///
/// `observed` maps every aspect that had at least one element written to its
/// count. Declared counts are replaced by observed ones; vestigial zero-count
/// entries are dropped. Returns the warnings produced, in aspect-name order,
/// followed by any consistency-group warning.
pub fn reconcile_metadata(
    metadata: &mut MetadataCollection,
    observed: &BTreeMap<String, u64>,
) -> LoadResult<Vec<String>> {
    let mut warnings = Vec::new();
    let mut groups = BTreeSet::new();

    metadata.remove(aspect::NETWORK_STATUS);

    for name in metadata.aspect_names() {
        let actual = observed.get(&name).copied();
        let mut vestigial = false;

        if let Some(entry) = metadata.get_mut(&name) {
            if ID_BEARING_ASPECTS.contains(&name.as_str()) && entry.id_counter.is_none() {
                return Err(LoadError::MissingIdCounter(name));
            }

            let declared = match entry.element_count {
                Some(count) => count,
                None => {
                    warnings.push(format!("ElementCount missing in Metadata of aspect {}", name));
                    let count = actual.unwrap_or(0);
                    if actual.is_some() {
                        warnings.push(format!(
                            "ElementCount in Metadata of aspect {} is set to {} by the server.",
                            name, count
                        ));
                    }
                    entry.element_count = Some(count);
                    count
                }
            };

            match actual {
                None if declared == 0 => {
                    vestigial = true;
                    warnings.push(format!(
                        "Metadata element of aspect {} is removed because the element count is 0.",
                        name
                    ));
                }
                _ => {
                    let received = actual.unwrap_or(0);
                    if received != declared {
                        warnings.push(format!(
                            "Element count mismatch in aspect {}. Metadata declared element count {}, but {} was received in CX.",
                            name, declared, received
                        ));
                        entry.element_count = Some(received);
                    }
                }
            }

            // Removed entries still take part in the group check
            match entry.consistency_group {
                Some(group) => {
                    groups.insert(group);
                }
                None => warnings.push(format!(
                    "Aspect {} doesn't have consistencyGroupId defined in metadata.",
                    name
                )),
            }
        }

        if vestigial {
            metadata.remove(&name);
        }
    }

    if let Some(name) = observed.keys().find(|name| !metadata.contains(name)) {
        return Err(LoadError::UndeclaredAspect(name.clone()));
    }

    if groups.len() != 1 {
        let listed: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
        warnings.push(format!(
            "Unmatched consistencyGroupIds found in Metadata: [{}]",
            listed.join(", ")
        ));
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cx::MetadataElement;

    fn entry(name: &str, count: u64) -> MetadataElement {
        MetadataElement::new(name)
            .with_element_count(count)
            .with_id_counter(count as i64)
            .with_consistency_group(1)
    }

    fn observed(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn merge_prefers_whichever_side_exists() {
        let pre = MetadataCollection::new().with(entry("nodes", 1));
        assert_eq!(merge_metadata(Some(pre.clone()), None), Some(pre.clone()));
        assert_eq!(merge_metadata(None, Some(pre.clone())), Some(pre));
        assert_eq!(merge_metadata(None, None), None);
    }

    #[test]
    fn matching_counts_produce_no_warnings() {
        let mut md = MetadataCollection::new().with(entry("nodes", 2)).with(entry("edges", 1));
        let warnings = reconcile_metadata(&mut md, &observed(&[("nodes", 2), ("edges", 1)])).unwrap();
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn mismatched_count_warns_once_and_takes_observed() {
        let mut md = MetadataCollection::new().with(entry("nodes", 5));
        let warnings = reconcile_metadata(&mut md, &observed(&[("nodes", 2)])).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Element count mismatch in aspect nodes"));
        assert_eq!(md.get("nodes").unwrap().element_count, Some(2));
    }

    #[test]
    fn declared_count_without_elements_is_corrected_to_zero() {
        let mut md = MetadataCollection::new().with(entry("nodes", 0)).with(entry("edges", 4));
        let warnings = reconcile_metadata(&mut md, &observed(&[])).unwrap();
        assert!(warnings.iter().any(|w| w.contains("mismatch in aspect edges")));
        assert_eq!(md.get("edges").unwrap().element_count, Some(0));
        assert!(!md.contains("nodes"));
    }

    #[test]
    fn zero_count_without_writer_is_dropped() {
        let mut md = MetadataCollection::new()
            .with(entry("nodes", 1))
            .with(MetadataElement::new("cyVisualProperties").with_element_count(0).with_consistency_group(1));
        let warnings = reconcile_metadata(&mut md, &observed(&[("nodes", 1)])).unwrap();
        assert!(!md.contains("cyVisualProperties"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("cyVisualProperties is removed"));
    }

    #[test]
    fn zero_count_with_writer_is_kept_with_actual_count() {
        let mut md = MetadataCollection::new().with(entry("nodes", 0));
        let warnings = reconcile_metadata(&mut md, &observed(&[("nodes", 3)])).unwrap();
        assert_eq!(md.get("nodes").unwrap().element_count, Some(3));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("mismatch"));
    }

    #[test]
    fn missing_count_is_filled_from_writer() {
        let mut md = MetadataCollection::new()
            .with(MetadataElement::new("cartesianLayout").with_consistency_group(1));
        let warnings = reconcile_metadata(&mut md, &observed(&[("cartesianLayout", 4)])).unwrap();
        assert_eq!(md.get("cartesianLayout").unwrap().element_count, Some(4));
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("ElementCount missing"));
        assert!(warnings[1].contains("set to 4"));
    }

    #[test]
    fn missing_count_without_writer_is_dropped() {
        let mut md = MetadataCollection::new()
            .with(entry("nodes", 1))
            .with(MetadataElement::new("cyGroups").with_consistency_group(1));
        let warnings = reconcile_metadata(&mut md, &observed(&[("nodes", 1)])).unwrap();
        assert!(!md.contains("cyGroups"));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn missing_id_counter_on_core_aspect_is_fatal() {
        let mut md = MetadataCollection::new()
            .with(MetadataElement::new("edges").with_element_count(1).with_consistency_group(1));
        let err = reconcile_metadata(&mut md, &observed(&[("edges", 1)])).unwrap_err();
        assert!(matches!(err, LoadError::MissingIdCounter(ref name) if name == "edges"));
    }

    #[test]
    fn id_counter_not_required_on_other_aspects() {
        let mut md = MetadataCollection::new()
            .with(MetadataElement::new("networkAttributes").with_element_count(1).with_consistency_group(1));
        assert!(reconcile_metadata(&mut md, &observed(&[("networkAttributes", 1)])).is_ok());
    }

    #[test]
    fn written_aspect_without_metadata_is_fatal() {
        let mut md = MetadataCollection::new().with(entry("nodes", 1));
        let err = reconcile_metadata(&mut md, &observed(&[("nodes", 1), ("edges", 1)])).unwrap_err();
        assert!(matches!(err, LoadError::UndeclaredAspect(ref name) if name == "edges"));
    }

    #[test]
    fn status_metadata_is_removed() {
        let mut md = MetadataCollection::new()
            .with(entry("nodes", 1))
            .with(MetadataElement::new("ndexStatus").with_element_count(1));
        let warnings = reconcile_metadata(&mut md, &observed(&[("nodes", 1)])).unwrap();
        assert!(!md.contains("ndexStatus"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn disagreeing_consistency_groups_warn_once() {
        let mut md = MetadataCollection::new()
            .with(entry("nodes", 1))
            .with(entry("edges", 1).with_consistency_group(2));
        let warnings = reconcile_metadata(&mut md, &observed(&[("nodes", 1), ("edges", 1)])).unwrap();
        assert_eq!(
            warnings,
            vec!["Unmatched consistencyGroupIds found in Metadata: [1, 2]".to_string()]
        );
    }

    #[test]
    fn missing_consistency_group_warns_per_aspect_and_overall() {
        let mut md = MetadataCollection::new()
            .with(MetadataElement::new("nodes").with_element_count(1).with_id_counter(1));
        let warnings = reconcile_metadata(&mut md, &observed(&[("nodes", 1)])).unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("doesn't have consistencyGroupId"));
        assert_eq!(warnings[1], "Unmatched consistencyGroupIds found in Metadata: []");
    }

    #[test]
    fn removed_entry_still_counts_toward_consistency_groups() {
        let mut md = MetadataCollection::new()
            .with(entry("nodes", 1))
            .with(MetadataElement::new("cyGroups").with_element_count(0).with_consistency_group(2));
        let warnings = reconcile_metadata(&mut md, &observed(&[("nodes", 1)])).unwrap();
        assert!(!md.contains("cyGroups"));
        assert_eq!(
            warnings,
            vec![
                "Metadata element of aspect cyGroups is removed because the element count is 0.".to_string(),
                "Unmatched consistencyGroupIds found in Metadata: [1, 2]".to_string(),
            ]
        );
    }
}
