//! Path expressions over a document tree: `/foo/[1]/bar` addresses a node by
//! walking mapping keys and sequence indices from the root.
//!
//! A path is `'/'? segment ('/' segment)* '/'?`. A segment is either `[n]`
//! (a sequence index, negative counting from the end) or a mapping key.
//! Key segments are unescaped and re-parsed as a one-line YAML document so
//! that a key segment can address a scalar, sequence, or mapping key alike;
//! the parsed key is then matched against candidate keys with
//! [`crate::compare`].

use alloc::string::String;
use alloc::vec::Vec;

use crate::{compare, Document, NodeData, PathError};

/// One element of a parsed path.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    /// A `[n]` sequence index. Negative values count from the end.
    Index(i64),
    /// A mapping key, already unescaped.
    Key(String),
}

/// Resolve `path` against `document`, starting from [`document.root`](Document::root).
///
/// Returns `Ok(None)` if the path is syntactically valid but does not match
/// any node (an unknown key, an out-of-range index, or descending into a
/// scalar). Returns `Err` only for a malformed path.
pub fn node_by_path(document: &Document, path: &str) -> Result<Option<i32>, PathError> {
    let segments = parse_segments(path)?;
    let mut current = document.root;
    for segment in &segments {
        match step(document, current, segment)? {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn step(document: &Document, current: i32, segment: &Segment) -> Result<Option<i32>, PathError> {
    match (document.get_node(current).map(|n| &n.data), segment) {
        (Some(NodeData::Sequence { items, .. }), Segment::Index(i)) => {
            Ok(sequence_index(items.len(), *i).and_then(|pos| items.get(pos).copied()))
        }
        (Some(NodeData::Mapping { pairs, .. }), Segment::Key(key)) => {
            let key_doc = parse_key_document(key)?;
            let key_node = 1_i32;
            Ok(pairs
                .iter()
                .find(|pair| compare::compare(document, pair.key, &key_doc, key_node))
                .map(|pair| pair.value))
        }
        _ => Ok(None),
    }
}

fn sequence_index(len: usize, i: i64) -> Option<usize> {
    if i >= 0 {
        let i = i as usize;
        (i < len).then_some(i)
    } else {
        let from_end = (-i) as usize;
        (from_end <= len).then(|| len - from_end)
    }
}

/// Parse a key segment's text as a standalone YAML document, so that
/// mapping, sequence, and scalar keys can all be matched with
/// [`crate::compare`].
fn parse_key_document(key: &str) -> Result<Document, PathError> {
    let mut parser = crate::yaml_parser_new();
    let mut input = key.as_bytes();
    crate::yaml_parser_set_input_string(&mut parser, &mut input);
    Document::load(&mut parser).map_err(PathError::Composer)
}

/// Parse `path` into its segments.
pub fn parse_segments(path: &str) -> Result<Vec<Segment>, PathError> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    split_unescaped(trimmed)
        .into_iter()
        .map(|raw| parse_segment(&raw))
        .collect()
}

/// Split on `/` that is not escaped, quoted, or inside a flow collection.
fn split_unescaped(path: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    let mut quote: Option<char> = None;
    let mut depth = 0_i32;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '\'' | '"' if quote.is_none() => {
                quote = Some(ch);
                current.push(ch);
            }
            c if Some(c) == quote => {
                quote = None;
                current.push(c);
            }
            '[' | '{' if quote.is_none() => {
                depth += 1;
                current.push(ch);
            }
            ']' | '}' if quote.is_none() => {
                depth -= 1;
                current.push(ch);
            }
            '/' if quote.is_none() && depth == 0 => {
                parts.push(core::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

fn parse_segment(raw: &str) -> Result<Segment, PathError> {
    if let Some(body) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let index: i64 = body
            .parse()
            .map_err(|_| PathError::Problem("path segment is not a valid sequence index"))?;
        return Ok(Segment::Index(index));
    }
    Ok(Segment::Key(unescape_segment(raw)))
}

/// Undo path-level backslash escaping of the characters that are otherwise
/// significant in a path (`/ \ [ ] { } *` and the leading `.`). Quoted
/// segments are passed through untouched: their own quoting is handled when
/// the segment is re-parsed as YAML.
fn unescape_segment(raw: &str) -> String {
    if raw.starts_with('\'') || raw.starts_with('"') {
        return String::from(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// The path segment addressing `index` from its immediate parent, or `None`
/// if `index` is the root or not reachable.
pub fn parent_address(document: &Document, index: i32) -> Option<String> {
    let parent = document.parent_of(index);
    if parent == 0 {
        return None;
    }
    parent_address_within(document, parent, index)
}

fn parent_address_within(document: &Document, parent: i32, index: i32) -> Option<String> {
    match document.get_node(parent).map(|n| &n.data) {
        Some(NodeData::Sequence { items, .. }) => items
            .iter()
            .position(|&item| item == index)
            .map(|pos| alloc::format!("[{pos}]")),
        Some(NodeData::Mapping { pairs, .. }) => pairs
            .iter()
            .find(|pair| pair.value == index)
            .map(|pair| render_scalar_key(document, pair.key)),
        _ => None,
    }
}

/// The full path from the root to `index`, e.g. `/foo/[1]/bar`. The root
/// itself has the path `/`.
pub fn path_of(document: &Document, index: i32) -> String {
    let mut segments = Vec::new();
    let mut current = index;
    loop {
        let parent = document.parent_of(current);
        if parent == 0 {
            break;
        }
        if let Some(segment) = parent_address_within(document, parent, current) {
            segments.push(segment);
        }
        current = parent;
    }
    segments.reverse();
    if segments.is_empty() {
        String::from("/")
    } else {
        let mut out = String::new();
        for segment in segments {
            out.push('/');
            out.push_str(&segment);
        }
        out
    }
}

/// Render a mapping key as a one-line flow key segment: the scalar's text
/// if it needs no quoting for path syntax, or a flow rendering otherwise.
fn render_scalar_key(document: &Document, key: i32) -> String {
    match document.get_node(key).map(|n| &n.data) {
        Some(NodeData::Scalar { value, .. }) => {
            if needs_quoting(value) {
                quote_scalar(value)
            } else {
                value.clone()
            }
        }
        Some(NodeData::Sequence { .. }) | Some(NodeData::Mapping { .. }) => {
            render_flow_oneline(document, key)
        }
        _ => String::new(),
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value.contains('/')
        || value.starts_with('[')
        || value.starts_with('{')
        || value.starts_with('\'')
        || value.starts_with('"')
}

fn quote_scalar(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// A narrow flow-style renderer used only to produce key segments for
/// non-scalar mapping keys. This is not a general emitter: it assumes a
/// small, fully in-memory key and does not handle line wrapping or anchors.
fn render_flow_oneline(document: &Document, index: i32) -> String {
    match document.get_node(index).map(|n| &n.data) {
        Some(NodeData::Scalar { value, .. }) => {
            if needs_quoting(value) {
                quote_scalar(value)
            } else {
                value.clone()
            }
        }
        Some(NodeData::Sequence { items, .. }) => {
            let parts: Vec<String> = items
                .iter()
                .map(|&item| render_flow_oneline(document, item))
                .collect();
            alloc::format!("[{}]", parts.join(", "))
        }
        Some(NodeData::Mapping { pairs, .. }) => {
            let parts: Vec<String> = pairs
                .iter()
                .map(|pair| {
                    alloc::format!(
                        "{}: {}",
                        render_flow_oneline(document, pair.key),
                        render_flow_oneline(document, pair.value)
                    )
                })
                .collect();
            alloc::format!("{{{}}}", parts.join(", "))
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MappingStyle, ScalarStyle, SequenceStyle};

    fn build_foo_doc() -> Document {
        // {foo: [10, {bar: baz}]}
        let mut doc = Document::new(None, &[], true, true);
        let ten = doc.add_scalar(None, "10", ScalarStyle::Plain);
        let bar = doc.add_scalar(None, "bar", ScalarStyle::Plain);
        let baz = doc.add_scalar(None, "baz", ScalarStyle::Plain);
        let inner = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(inner, bar, baz);
        let seq = doc.add_sequence(None, SequenceStyle::Flow);
        doc.append_sequence_item(seq, ten);
        doc.append_sequence_item(seq, inner);
        let foo = doc.add_scalar(None, "foo", ScalarStyle::Plain);
        let root = doc.add_mapping(None, MappingStyle::Block);
        doc.yaml_document_append_mapping_pair(root, foo, seq);
        doc.root = root;
        doc.resolve_parents();
        doc
    }

    #[test]
    fn looks_up_nested_scalar_by_path() {
        let doc = build_foo_doc();
        let found = node_by_path(&doc, "/foo/[1]/bar").unwrap().unwrap();
        let NodeData::Scalar { value, .. } = &doc.get_node(found).unwrap().data else {
            panic!("expected scalar");
        };
        assert_eq!(value, "baz");
    }

    #[test]
    fn negative_index_counts_from_the_end() {
        let doc = build_foo_doc();
        let found = node_by_path(&doc, "/foo/[-1]/bar").unwrap().unwrap();
        let NodeData::Scalar { value, .. } = &doc.get_node(found).unwrap().data else {
            panic!("expected scalar");
        };
        assert_eq!(value, "baz");
    }

    #[test]
    fn unknown_key_is_none_not_an_error() {
        let doc = build_foo_doc();
        assert_eq!(node_by_path(&doc, "/missing").unwrap(), None);
    }

    #[test]
    fn parent_address_and_path_round_trip() {
        let doc = build_foo_doc();
        let found = node_by_path(&doc, "/foo/[1]/bar").unwrap().unwrap();
        assert_eq!(parent_address(&doc, found).as_deref(), Some("bar"));
        assert_eq!(path_of(&doc, found), "/foo/[1]/bar");
    }

    #[test]
    fn root_path_is_a_single_slash() {
        let doc = build_foo_doc();
        assert_eq!(path_of(&doc, doc.root), "/");
    }
}
