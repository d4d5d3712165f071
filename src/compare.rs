use core::cmp::Ordering;

use crate::{Document, NodeData, NodePair};

/// Deep structural equality between two nodes, each resolved against its own
/// document.
///
/// Scalars compare by their logical text; an empty scalar and an unset
/// (`NoNode`) node compare equal, which lets the `?`/`:` null-key and
/// null-value forms participate in comparisons without special-casing at the
/// call site. Sequences compare element-wise in order. Mappings compare as
/// multisets of pairs: both sides are sorted by the default key ordering and
/// compared pairwise.
pub fn compare(doc_a: &Document, a: i32, doc_b: &Document, b: i32) -> bool {
    let data_a = doc_a.get_node(a).map(|node| &node.data);
    let data_b = doc_b.get_node(b).map(|node| &node.data);

    match (data_a, data_b) {
        (None, None) => true,
        (None, Some(data)) | (Some(data), None) => is_empty(data),
        (Some(NodeData::NoNode), Some(NodeData::NoNode)) => true,
        (Some(NodeData::NoNode), Some(data)) | (Some(data), Some(NodeData::NoNode)) => {
            is_empty(data)
        }
        (Some(NodeData::Scalar { value: va, .. }), Some(NodeData::Scalar { value: vb, .. })) => {
            va == vb
        }
        (
            Some(NodeData::Sequence { items: ia, .. }),
            Some(NodeData::Sequence { items: ib, .. }),
        ) => {
            ia.len() == ib.len()
                && ia
                    .iter()
                    .zip(ib.iter())
                    .all(|(&x, &y)| compare(doc_a, x, doc_b, y))
        }
        (Some(NodeData::Mapping { pairs: pa, .. }), Some(NodeData::Mapping { pairs: pb, .. })) => {
            compare_mappings(doc_a, pa, doc_b, pb)
        }
        _ => false,
    }
}

fn is_empty(data: &NodeData) -> bool {
    match data {
        NodeData::NoNode => true,
        NodeData::Scalar { value, .. } => value.is_empty(),
        NodeData::Sequence { .. } | NodeData::Mapping { .. } => false,
    }
}

fn compare_mappings(doc_a: &Document, pa: &[NodePair], doc_b: &Document, pb: &[NodePair]) -> bool {
    if pa.len() != pb.len() {
        return false;
    }
    let order_a = sorted_order(doc_a, pa);
    let order_b = sorted_order(doc_b, pb);
    order_a.into_iter().zip(order_b).all(|(i, j)| {
        compare(doc_a, pa[i].key, doc_b, pb[j].key) && compare(doc_a, pa[i].value, doc_b, pb[j].value)
    })
}

fn sorted_order(doc: &Document, pairs: &[NodePair]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pairs.len()).collect();
    order.sort_by(|&i, &j| default_order(doc, pairs[i].key, pairs[j].key).then(i.cmp(&j)));
    order
}

/// The default ordering used to line up mapping pairs for comparison, and the
/// default comparator for [`Document::sort_mapping`](crate::Document::sort_mapping):
/// mappings before sequences before scalars, scalars ordered by byte value.
pub fn default_order(doc: &Document, a: i32, b: i32) -> Ordering {
    let rank_a = doc.get_node(a).map_or(2, |node| type_rank(&node.data));
    let rank_b = doc.get_node(b).map_or(2, |node| type_rank(&node.data));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }
    match (
        doc.get_node(a).map(|node| &node.data),
        doc.get_node(b).map(|node| &node.data),
    ) {
        (Some(NodeData::Scalar { value: va, .. }), Some(NodeData::Scalar { value: vb, .. })) => {
            va.as_bytes().cmp(vb.as_bytes())
        }
        _ => Ordering::Equal,
    }
}

fn type_rank(data: &NodeData) -> u8 {
    match data {
        NodeData::Mapping { .. } => 0,
        NodeData::Sequence { .. } => 1,
        NodeData::Scalar { .. } | NodeData::NoNode => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, MappingStyle, ScalarStyle, SequenceStyle};

    #[test]
    fn scalars_compare_by_text() {
        let mut doc = Document::new(None, &[], true, true);
        let a = doc.add_scalar(None, "hello", ScalarStyle::Plain);
        let b = doc.add_scalar(None, "hello", ScalarStyle::Plain);
        let c = doc.add_scalar(None, "world", ScalarStyle::Plain);
        assert!(compare(&doc, a, &doc, b));
        assert!(!compare(&doc, a, &doc, c));
    }

    #[test]
    fn empty_scalar_equals_no_node() {
        let mut doc = Document::new(None, &[], true, true);
        let empty = doc.add_scalar(None, "", ScalarStyle::Plain);
        assert!(compare(&doc, empty, &doc, 0));
        assert!(compare(&doc, 0, &doc, 0));
    }

    #[test]
    fn mappings_compare_regardless_of_pair_order() {
        let mut doc = Document::new(None, &[], true, true);
        let a1 = doc.add_scalar(None, "a", ScalarStyle::Plain);
        let v1 = doc.add_scalar(None, "1", ScalarStyle::Plain);
        let b1 = doc.add_scalar(None, "b", ScalarStyle::Plain);
        let v2 = doc.add_scalar(None, "2", ScalarStyle::Plain);
        let m1 = doc.add_mapping(None, MappingStyle::Block);
        doc.yaml_document_append_mapping_pair(m1, a1, v1);
        doc.yaml_document_append_mapping_pair(m1, b1, v2);

        let b2 = doc.add_scalar(None, "b", ScalarStyle::Plain);
        let w2 = doc.add_scalar(None, "2", ScalarStyle::Plain);
        let a2 = doc.add_scalar(None, "a", ScalarStyle::Plain);
        let w1 = doc.add_scalar(None, "1", ScalarStyle::Plain);
        let m2 = doc.add_mapping(None, MappingStyle::Block);
        doc.yaml_document_append_mapping_pair(m2, b2, w2);
        doc.yaml_document_append_mapping_pair(m2, a2, w1);

        assert!(compare(&doc, m1, &doc, m2));
    }

    #[test]
    fn sequences_are_order_sensitive() {
        let mut doc = Document::new(None, &[], true, true);
        let one = doc.add_scalar(None, "1", ScalarStyle::Plain);
        let two = doc.add_scalar(None, "2", ScalarStyle::Plain);
        let s1 = doc.add_sequence(None, SequenceStyle::Block);
        doc.append_sequence_item(s1, one);
        doc.append_sequence_item(s1, two);
        let s2 = doc.add_sequence(None, SequenceStyle::Block);
        doc.append_sequence_item(s2, two);
        doc.append_sequence_item(s2, one);
        assert!(!compare(&doc, s1, &doc, s2));
    }
}
