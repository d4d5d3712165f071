//! Alias and merge-key resolution over a fully-built document tree.
//!
//! The document builder already represents an alias as a shared node id (the
//! same index appears more than once in the tree), so there is nothing left
//! to "expand" for plain aliases by the time a document reaches this module.
//! What remains is the reserved `<<` merge key: a mapping pair whose value is
//! an alias to another mapping, or a sequence of such aliases, whose pairs
//! should be imported into the mapping that defines the merge key.

use alloc::vec;
use alloc::vec::Vec;

use crate::{compare, ComposerError, Document, Mark, NodeData, NodePair};

const MERGE_KEY: &str = "<<";

/// Expand every merge key reachable in `document`, then re-resolve parent
/// pointers.
///
/// Applying this function twice in a row is a no-op: once a mapping's merge
/// pairs are expanded, no `<<` key remains to find on the second pass.
pub fn resolve(document: &mut Document) -> Result<(), ComposerError> {
    let node_count = document.nodes.len();
    let mut resolved = vec![false; node_count + 1];
    let mut in_progress = vec![false; node_count + 1];
    for index in 1..=node_count as i32 {
        expand_merge_keys(document, index, &mut resolved, &mut in_progress)?;
    }
    document.resolve_parents();
    Ok(())
}

fn expand_merge_keys(
    document: &mut Document,
    index: i32,
    resolved: &mut [bool],
    in_progress: &mut [bool],
) -> Result<(), ComposerError> {
    if index == 0 || resolved[index as usize] {
        return Ok(());
    }
    if in_progress[index as usize] {
        return composer_error(
            "merge key cycle: a mapping merges from itself, directly or transitively",
            document.get_node(index).map_or(Mark::default(), |n| n.start_mark),
        );
    }

    let is_mapping = matches!(
        document.get_node(index).map(|n| &n.data),
        Some(NodeData::Mapping { .. })
    );
    if !is_mapping {
        resolved[index as usize] = true;
        return Ok(());
    }

    in_progress[index as usize] = true;
    let result = expand_mapping(document, index, resolved, in_progress);
    in_progress[index as usize] = false;
    result?;
    resolved[index as usize] = true;
    Ok(())
}

fn expand_mapping(
    document: &mut Document,
    index: i32,
    resolved: &mut [bool],
    in_progress: &mut [bool],
) -> Result<(), ComposerError> {
    loop {
        let Some(pair_pos) = find_merge_pair(document, index) else {
            return Ok(());
        };

        let pairs = current_pairs(document, index);
        let merge_pair = pairs[pair_pos];
        let sources = merge_sources(document, merge_pair.value)?;

        let mut present: Vec<i32> = pairs
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != pair_pos)
            .map(|(_, pair)| pair.key)
            .collect();

        let mut merged: Vec<NodePair> = Vec::new();
        for source in sources {
            expand_merge_keys(document, source, resolved, in_progress)?;
            let source_pairs = match document.get_node(source).map(|n| &n.data) {
                Some(NodeData::Mapping { pairs, .. }) => pairs.clone(),
                _ => {
                    return composer_error(
                        "merge key value must be a mapping or a sequence of mappings",
                        document.get_node(source).map_or(Mark::default(), |n| n.start_mark),
                    )
                }
            };
            for pair in source_pairs {
                let already_present = present
                    .iter()
                    .any(|&existing| compare::compare(document, existing, document, pair.key));
                if already_present {
                    continue;
                }
                present.push(pair.key);
                merged.push(pair);
            }
        }

        if let Some(NodeData::Mapping { pairs, .. }) = document.get_node_mut(index).map(|n| &mut n.data)
        {
            pairs.remove(pair_pos);
            for (offset, pair) in merged.into_iter().enumerate() {
                pairs.insert(pair_pos + offset, pair);
            }
        }
    }
}

fn current_pairs(document: &Document, index: i32) -> Vec<NodePair> {
    match document.get_node(index).map(|n| &n.data) {
        Some(NodeData::Mapping { pairs, .. }) => pairs.clone(),
        _ => unreachable!("expand_mapping only called on mapping nodes"),
    }
}

fn find_merge_pair(document: &Document, index: i32) -> Option<usize> {
    let NodeData::Mapping { pairs, .. } = document.get_node(index)?.data.clone() else {
        return None;
    };
    pairs.iter().position(|pair| is_merge_key(document, pair.key))
}

fn is_merge_key(document: &Document, key: i32) -> bool {
    matches!(
        document.get_node(key).map(|n| &n.data),
        Some(NodeData::Scalar { value, .. }) if value == MERGE_KEY
    )
}

/// The mapping node ids a merge key's value refers to: a single mapping, or
/// every item of a sequence of mappings.
fn merge_sources(document: &Document, value: i32) -> Result<Vec<i32>, ComposerError> {
    match document.get_node(value).map(|n| &n.data) {
        Some(NodeData::Mapping { .. }) => Ok(vec![value]),
        Some(NodeData::Sequence { items, .. }) => Ok(items.clone()),
        _ => composer_error(
            "merge key value must be a mapping or a sequence of mappings",
            document.get_node(value).map_or(Mark::default(), |n| n.start_mark),
        ),
    }
}

fn composer_error<T>(problem: &'static str, mark: Mark) -> Result<T, ComposerError> {
    Err(ComposerError::Problem { problem, mark })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MappingStyle, ScalarStyle, SequenceStyle};

    fn scalar(doc: &mut Document, value: &str) -> i32 {
        doc.add_scalar(None, value, ScalarStyle::Plain)
    }

    #[test]
    fn merge_key_imports_missing_pairs_in_order() {
        // defaults: {a: 1, b: 2}
        // item: {<<: defaults, b: 20, c: 3}
        let mut doc = Document::new(None, &[], true, true);

        let a = scalar(&mut doc, "a");
        let one = scalar(&mut doc, "1");
        let b = scalar(&mut doc, "b");
        let two = scalar(&mut doc, "2");
        let defaults = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(defaults, a, one);
        doc.yaml_document_append_mapping_pair(defaults, b, two);

        let merge_key = scalar(&mut doc, "<<");
        let b2 = scalar(&mut doc, "b");
        let twenty = scalar(&mut doc, "20");
        let c = scalar(&mut doc, "c");
        let three = scalar(&mut doc, "3");
        let item = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(item, merge_key, defaults);
        doc.yaml_document_append_mapping_pair(item, b2, twenty);
        doc.yaml_document_append_mapping_pair(item, c, three);

        resolve(&mut doc).unwrap();

        let NodeData::Mapping { pairs, .. } = &doc.get_node(item).unwrap().data else {
            panic!("expected mapping");
        };
        assert_eq!(pairs.len(), 3);
        let key_values: Vec<(String, String)> = pairs
            .iter()
            .map(|pair| {
                let key = match &doc.get_node(pair.key).unwrap().data {
                    NodeData::Scalar { value, .. } => value.clone(),
                    _ => panic!("expected scalar key"),
                };
                let value = match &doc.get_node(pair.value).unwrap().data {
                    NodeData::Scalar { value, .. } => value.clone(),
                    _ => panic!("expected scalar value"),
                };
                (key, value)
            })
            .collect();
        assert_eq!(
            key_values,
            vec![
                (String::from("a"), String::from("1")),
                (String::from("b"), String::from("20")),
                (String::from("c"), String::from("3")),
            ]
        );
    }

    #[test]
    fn sequence_of_aliases_merges_earlier_first() {
        let mut doc = Document::new(None, &[], true, true);

        let a = scalar(&mut doc, "a");
        let one = scalar(&mut doc, "1");
        let m1 = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(m1, a, one);

        let a2 = scalar(&mut doc, "a");
        let two = scalar(&mut doc, "2");
        let m2 = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(m2, a2, two);

        let seq = doc.add_sequence(None, SequenceStyle::Flow);
        doc.append_sequence_item(seq, m1);
        doc.append_sequence_item(seq, m2);

        let merge_key = scalar(&mut doc, "<<");
        let item = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(item, merge_key, seq);

        resolve(&mut doc).unwrap();

        let NodeData::Mapping { pairs, .. } = &doc.get_node(item).unwrap().data else {
            panic!("expected mapping");
        };
        assert_eq!(pairs.len(), 1);
        let NodeData::Scalar { value, .. } = &doc.get_node(pairs[0].value).unwrap().data else {
            panic!("expected scalar");
        };
        assert_eq!(value, "1");
    }

    #[test]
    fn self_merge_is_a_cycle_error() {
        let mut doc = Document::new(None, &[], true, true);
        let merge_key = scalar(&mut doc, "<<");
        let m = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(m, merge_key, m);
        assert!(resolve(&mut doc).is_err());
    }
}
