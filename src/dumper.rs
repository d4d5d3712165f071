use alloc::string::String;
use alloc::vec;

use crate::emitter::Anchors;
use crate::{
    yaml_emitter_emit, Document, Emitter, EmitterError, Encoding, Event, Node, NodeData,
    DEFAULT_MAPPING_TAG, DEFAULT_SCALAR_TAG, DEFAULT_SEQUENCE_TAG,
};

/// Start a YAML stream.
///
/// This function should be used before [`yaml_emitter_dump()`] is called.
pub fn yaml_emitter_open(emitter: &mut Emitter) -> Result<(), EmitterError> {
    assert!(!emitter.opened);
    let event = Event::stream_start(Encoding::Any);
    yaml_emitter_emit(emitter, event)?;
    emitter.opened = true;
    Ok(())
}

/// Finish a YAML stream.
///
/// This function should be used after [`yaml_emitter_dump()`] is called.
pub fn yaml_emitter_close(emitter: &mut Emitter) -> Result<(), EmitterError> {
    assert!(emitter.opened);
    if emitter.closed {
        return Ok(());
    }
    let event = Event::stream_end();
    yaml_emitter_emit(emitter, event)?;
    emitter.closed = true;
    Ok(())
}

/// Emit a YAML document.
///
/// The document object may be produced by [`Document::load`](crate::Document::load)
/// or built directly with [`Document::new`](crate::Document::new). The emitter
/// takes ownership of the document's nodes for the duration of the call and
/// discards them once emitted, whether or not the call succeeds.
pub fn yaml_emitter_dump(emitter: &mut Emitter, document: &mut Document) -> Result<(), EmitterError> {
    if !emitter.opened {
        if let Err(err) = yaml_emitter_open(emitter) {
            reset_document_and_anchors(emitter, document);
            return Err(err);
        }
    }
    if document.nodes.is_empty() {
        yaml_emitter_close(emitter)?;
    } else {
        assert!(emitter.opened);
        emitter.anchors = vec![Anchors::default(); document.nodes.len()];
        let event = Event::document_start(
            document.version_directive,
            &document.tag_directives,
            document.start_implicit,
        );
        yaml_emitter_emit(emitter, event)?;
        let root = document.root;
        anchor_node(emitter, document, root);
        dump_node(emitter, document, root)?;
        let event = Event::document_end(document.end_implicit);
        yaml_emitter_emit(emitter, event)?;
    }

    reset_document_and_anchors(emitter, document);
    Ok(())
}

fn reset_document_and_anchors(emitter: &mut Emitter, document: &mut Document) {
    document.nodes.clear();
    emitter.anchors.clear();
    emitter.last_anchor_id = 0;
}

fn anchor_node_sub(emitter: &mut Emitter, index: i32) {
    emitter.anchors[index as usize - 1].references += 1;
    if emitter.anchors[index as usize - 1].references == 2 {
        emitter.last_anchor_id += 1;
        emitter.anchors[index as usize - 1].anchor = emitter.last_anchor_id;
    }
}

fn anchor_node(emitter: &mut Emitter, document: &Document, index: i32) {
    let node = &document.nodes[index as usize - 1];
    emitter.anchors[index as usize - 1].references += 1;
    if emitter.anchors[index as usize - 1].references == 1 {
        match &node.data {
            NodeData::Sequence { items, .. } => {
                for item in items {
                    anchor_node_sub(emitter, *item);
                }
            }
            NodeData::Mapping { pairs, .. } => {
                for pair in pairs {
                    anchor_node_sub(emitter, pair.key);
                    anchor_node_sub(emitter, pair.value);
                }
            }
            NodeData::Scalar { .. } | NodeData::NoNode => {}
        }
    } else if emitter.anchors[index as usize - 1].references == 2 {
        emitter.last_anchor_id += 1;
        emitter.anchors[index as usize - 1].anchor = emitter.last_anchor_id;
    }
}

fn generate_anchor(anchor_id: i32) -> String {
    alloc::format!("id{anchor_id:03}")
}

fn dump_node(emitter: &mut Emitter, document: &mut Document, index: i32) -> Result<(), EmitterError> {
    let anchor_id = emitter.anchors[index as usize - 1].anchor;
    let anchor = (anchor_id != 0).then(|| generate_anchor(anchor_id));
    if emitter.anchors[index as usize - 1].serialized {
        return dump_alias(emitter, anchor.expect("serialized node must carry an anchor"));
    }
    emitter.anchors[index as usize - 1].serialized = true;

    let node = core::mem::take(&mut document.nodes[index as usize - 1]);
    match node.data {
        NodeData::Scalar { .. } => dump_scalar(emitter, node, anchor),
        NodeData::Sequence { .. } => dump_sequence(emitter, document, node, anchor),
        NodeData::Mapping { .. } => dump_mapping(emitter, document, node, anchor),
        NodeData::NoNode => unreachable!("empty node reached the dumper"),
    }
}

fn dump_alias(emitter: &mut Emitter, anchor: String) -> Result<(), EmitterError> {
    yaml_emitter_emit(emitter, Event::alias(&anchor))
}

fn dump_scalar(emitter: &mut Emitter, node: Node, anchor: Option<String>) -> Result<(), EmitterError> {
    let plain_implicit = node.tag.as_deref() == Some(DEFAULT_SCALAR_TAG);
    let quoted_implicit = node.tag.as_deref() == Some(DEFAULT_SCALAR_TAG);

    let NodeData::Scalar { value, style } = node.data else {
        unreachable!()
    };
    yaml_emitter_emit(
        emitter,
        Event::scalar(
            anchor.as_deref(),
            node.tag.as_deref(),
            &value,
            plain_implicit,
            quoted_implicit,
            style,
        ),
    )
}

fn dump_sequence(
    emitter: &mut Emitter,
    document: &mut Document,
    node: Node,
    anchor: Option<String>,
) -> Result<(), EmitterError> {
    let implicit = node.tag.as_deref() == Some(DEFAULT_SEQUENCE_TAG);

    let NodeData::Sequence { items, style } = node.data else {
        unreachable!()
    };
    yaml_emitter_emit(
        emitter,
        Event::sequence_start(anchor.as_deref(), node.tag.as_deref(), implicit, style),
    )?;
    for item in items {
        dump_node(emitter, document, item)?;
    }
    yaml_emitter_emit(emitter, Event::sequence_end())
}

fn dump_mapping(
    emitter: &mut Emitter,
    document: &mut Document,
    node: Node,
    anchor: Option<String>,
) -> Result<(), EmitterError> {
    let implicit = node.tag.as_deref() == Some(DEFAULT_MAPPING_TAG);

    let NodeData::Mapping { pairs, style } = node.data else {
        unreachable!()
    };
    yaml_emitter_emit(
        emitter,
        Event::mapping_start(anchor.as_deref(), node.tag.as_deref(), implicit, style),
    )?;
    for pair in pairs {
        dump_node(emitter, document, pair.key)?;
        dump_node(emitter, document, pair.value)?;
    }
    yaml_emitter_emit(emitter, Event::mapping_end())
}
