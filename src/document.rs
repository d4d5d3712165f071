use crate::{
    compare, AliasData, ComposerError, Event, EventData, MappingStyle, Mark, Parser, ScalarStyle,
    SequenceStyle, TagDirective, VersionDirective, DEFAULT_MAPPING_TAG, DEFAULT_SCALAR_TAG,
    DEFAULT_SEQUENCE_TAG,
};

/// The document structure.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Document {
    /// The document nodes.
    pub nodes: Vec<Node>,
    /// The id of the document's root node, or `0` if the document is empty.
    ///
    /// Set by [`Document::load`] when it places the top-level node; a
    /// hand-assembled document (built through `add_scalar`/`add_mapping`/
    /// `add_sequence`) must set this field itself once its root is known,
    /// since those calls have no way to tell which of the nodes they create
    /// is meant to be the root.
    pub root: i32,
    /// The version directive.
    pub version_directive: Option<VersionDirective>,
    /// The list of tag directives, in declaration order.
    pub tag_directives: Vec<TagDirective>,
    /// Is the document start indicator implicit?
    pub start_implicit: bool,
    /// Is the document end indicator implicit?
    pub end_implicit: bool,
    /// The beginning of the document.
    pub start_mark: Mark,
    /// The end of the document.
    pub end_mark: Mark,
    /// Parent node id for every node, indexed by node id (`parents[0]` is
    /// unused padding). `0` means the node is the root or is currently
    /// detached from the tree. Recomputed by [`Document::resolve_parents`]
    /// rather than maintained incrementally.
    pub parents: Vec<i32>,
    /// Anchors defined in this document, in definition order.
    pub anchors: Vec<Anchor>,
}

/// An anchor name bound to a node, as recorded by [`Document::load`] or by
/// [`Document::copy_node`] when it carries an anchored node across documents.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Anchor {
    /// The anchor name.
    pub name: String,
    /// The node the anchor refers to.
    pub node: i32,
}

/// The node structure.
#[derive(Clone, Default, Debug)]
#[non_exhaustive]
pub struct Node {
    /// The node type.
    pub data: NodeData,
    /// The node tag.
    pub tag: Option<String>,
    /// The beginning of the node.
    pub start_mark: Mark,
    /// The end of the node.
    pub end_mark: Mark,
}

/// Node types.
#[derive(Clone, Default, Debug)]
pub enum NodeData {
    /// An empty node.
    #[default]
    NoNode,
    /// A scalar node.
    Scalar {
        /// The scalar value.
        value: String,
        /// The scalar style.
        style: ScalarStyle,
    },
    /// A sequence node.
    Sequence {
        /// The stack of sequence items.
        items: Vec<NodeItem>,
        /// The sequence style.
        style: SequenceStyle,
    },
    /// A mapping node.
    Mapping {
        /// The stack of mapping pairs (key, value).
        pairs: Vec<NodePair>,
        /// The mapping style.
        style: MappingStyle,
    },
}

/// An element of a sequence node.
pub type NodeItem = i32;

/// An element of a mapping node.
#[derive(Copy, Clone, Default, Debug)]
#[non_exhaustive]
pub struct NodePair {
    /// The key of the element.
    pub key: i32,
    /// The value of the element.
    pub value: i32,
}

impl Document {
    /// Create a YAML document.
    pub fn new(
        version_directive: Option<VersionDirective>,
        tag_directives_in: &[TagDirective],
        start_implicit: bool,
        end_implicit: bool,
    ) -> Document {
        let nodes = Vec::with_capacity(16);
        let tag_directives = tag_directives_in.to_vec();

        Document {
            nodes,
            root: 0,
            version_directive,
            tag_directives,
            start_implicit,
            end_implicit,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
            parents: Vec::new(),
            anchors: Vec::new(),
        }
    }

    /// The parent node id of `index`, or `0` if it is the root or detached.
    #[must_use]
    pub fn parent_of(&self, index: i32) -> i32 {
        self.parents.get(index as usize).copied().unwrap_or(0)
    }

    /// Recompute parent pointers for every node by walking the tree from
    /// [`self.root`](Document::root).
    ///
    /// Parent pointers are not maintained incrementally: this pass runs once
    /// after the document is built, and again after any structural edit
    /// (resolution, node insertion, sorting) that could have moved a node.
    /// If `root` is `0` (an empty document, or a hand-assembled one that
    /// never set it), every node is left parentless rather than guessing.
    pub fn resolve_parents(&mut self) {
        self.parents.clear();
        self.parents.resize(self.nodes.len() + 1, 0);
        if self.nodes.is_empty() {
            return;
        }
        let mut visited = vec![false; self.nodes.len() + 1];
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            if index == 0 || visited[index as usize] {
                continue;
            }
            visited[index as usize] = true;
            let children: Vec<i32> = match &self.nodes[index as usize - 1].data {
                NodeData::Sequence { items, .. } => items.clone(),
                NodeData::Mapping { pairs, .. } => {
                    pairs.iter().flat_map(|pair| [pair.key, pair.value]).collect()
                }
                NodeData::Scalar { .. } | NodeData::NoNode => Vec::new(),
            };
            for child in children {
                if child != 0 {
                    self.parents[child as usize] = index;
                    stack.push(child);
                }
            }
        }
    }

    /// Get a node of a YAML document.
    ///
    /// Returns the node object or `None` if `index` is out of range. `0`
    /// always returns `None`: it is the null-node id used by a pair's empty
    /// key (`?`) or empty value (`:`).
    pub fn get_node_mut(&mut self, index: i32) -> Option<&mut Node> {
        (index > 0).then(|| self.nodes.get_mut(index as usize - 1)).flatten()
    }

    /// Get a node of a YAML document.
    ///
    /// Returns the node object or `None` if `index` is out of range. `0`
    /// always returns `None`: it is the null-node id used by a pair's empty
    /// key (`?`) or empty value (`:`).
    pub fn get_node(&self, index: i32) -> Option<&Node> {
        (index > 0).then(|| self.nodes.get(index as usize - 1)).flatten()
    }

    /// Get the root of a YAML document node.
    ///
    /// An empty document produced by the parser signifies the end of a YAML stream.
    ///
    /// Returns the node object or `None` if the document is empty.
    pub fn get_root_node(&mut self) -> Option<&mut Node> {
        let root = self.root;
        self.get_node_mut(root)
    }

    /// Create a SCALAR node and attach it to the document.
    ///
    /// The `style` argument may be ignored by the emitter.
    ///
    /// Returns the node id or 0 on error.
    #[must_use]
    pub fn add_scalar(&mut self, tag: Option<&str>, value: &str, style: ScalarStyle) -> i32 {
        let mark = Mark {
            index: 0_u64,
            line: 0_u64,
            column: 0_u64,
        };
        let tag = tag.unwrap_or(DEFAULT_SCALAR_TAG);
        let tag_copy = String::from(tag);
        let value_copy = String::from(value);
        let node = Node {
            data: NodeData::Scalar {
                value: value_copy,
                style,
            },
            tag: Some(tag_copy),
            start_mark: mark,
            end_mark: mark,
        };
        self.nodes.push(node);
        self.nodes.len() as i32
    }

    /// Create a SEQUENCE node and attach it to the document.
    ///
    /// The `style` argument may be ignored by the emitter.
    ///
    /// Returns the node id, which is a nonzero integer.
    #[must_use]
    pub fn add_sequence(&mut self, tag: Option<&str>, style: SequenceStyle) -> i32 {
        let mark = Mark {
            index: 0_u64,
            line: 0_u64,
            column: 0_u64,
        };

        let items = Vec::with_capacity(16);
        let tag = tag.unwrap_or(DEFAULT_SEQUENCE_TAG);
        let tag_copy = String::from(tag);
        let node = Node {
            data: NodeData::Sequence { items, style },
            tag: Some(tag_copy),
            start_mark: mark,
            end_mark: mark,
        };
        self.nodes.push(node);
        self.nodes.len() as i32
    }

    /// Create a MAPPING node and attach it to the document.
    ///
    /// The `style` argument may be ignored by the emitter.
    ///
    /// Returns the node id, which is a nonzero integer.
    #[must_use]
    pub fn add_mapping(&mut self, tag: Option<&str>, style: MappingStyle) -> i32 {
        let mark = Mark {
            index: 0_u64,
            line: 0_u64,
            column: 0_u64,
        };
        let pairs = Vec::with_capacity(16);
        let tag = tag.unwrap_or(DEFAULT_MAPPING_TAG);
        let tag_copy = String::from(tag);

        let node = Node {
            data: NodeData::Mapping { pairs, style },
            tag: Some(tag_copy),
            start_mark: mark,
            end_mark: mark,
        };

        self.nodes.push(node);
        self.nodes.len() as i32
    }

    /// Add an item to a SEQUENCE node.
    pub fn append_sequence_item(&mut self, sequence: i32, item: i32) {
        assert!(sequence > 0 && sequence as usize - 1 < self.nodes.len());
        assert!(matches!(
            &self.nodes[sequence as usize - 1].data,
            NodeData::Sequence { .. }
        ));
        assert!(item > 0 && item as usize - 1 < self.nodes.len());
        if let NodeData::Sequence { ref mut items, .. } =
            &mut self.nodes[sequence as usize - 1].data
        {
            items.push(item);
        }
    }

    /// Add a pair of a key and a value to a MAPPING node.
    pub fn yaml_document_append_mapping_pair(&mut self, mapping: i32, key: i32, value: i32) {
        assert!(mapping > 0 && mapping as usize - 1 < self.nodes.len());
        assert!(matches!(
            &self.nodes[mapping as usize - 1].data,
            NodeData::Mapping { .. }
        ));
        assert!(key > 0 && key as usize - 1 < self.nodes.len());
        assert!(value > 0 && value as usize - 1 < self.nodes.len());
        let pair = NodePair { key, value };
        if let NodeData::Mapping { ref mut pairs, .. } = &mut self.nodes[mapping as usize - 1].data
        {
            pairs.push(pair);
        }
    }

    /// Parse the input stream and produce the next YAML document.
    ///
    /// Call this function subsequently to produce a sequence of documents
    /// constituting the input stream.
    ///
    /// If the produced document has no root node, it means that the document end
    /// has been reached.
    ///
    /// An application must not alternate the calls of
    /// [`yaml_parser_load()`](crate::yaml_parser_load) with the calls of
    /// [`yaml_parser_scan()`](crate::yaml_parser_scan) or
    /// [`yaml_parser_parse()`](crate::yaml_parser_parse). Doing this will break the
    /// parser.
    pub fn load(parser: &mut Parser) -> Result<Document, ComposerError> {
        let mut document = Document::new(None, &[], false, false);
        document.nodes.reserve(16);

        if !parser.stream_start_produced {
            match parser.parse() {
                Ok(Event {
                    data: EventData::StreamStart { .. },
                    ..
                }) => (),
                Ok(_) => panic!("expected stream start"),
                Err(err) => {
                    parser.delete_aliases();
                    return Err(err.into());
                }
            }
        }
        if parser.stream_end_produced {
            return Ok(document);
        }
        let err: ComposerError;
        match parser.parse() {
            Ok(event) => {
                if let EventData::StreamEnd = &event.data {
                    return Ok(document);
                }
                parser.aliases.reserve(16);
                match document.load_document(parser, event) {
                    Ok(()) => {
                        document.anchors = parser
                            .aliases
                            .iter()
                            .map(|alias_data| Anchor {
                                name: alias_data.anchor.clone(),
                                node: alias_data.index,
                            })
                            .collect();
                        parser.delete_aliases();
                        document.resolve_parents();
                        return Ok(document);
                    }
                    Err(e) => err = e,
                }
            }
            Err(e) => err = e.into(),
        }
        parser.delete_aliases();
        Err(err)
    }

    fn set_composer_error<T>(
        problem: &'static str,
        problem_mark: Mark,
    ) -> Result<T, ComposerError> {
        Err(ComposerError::Problem {
            problem,
            mark: problem_mark,
        })
    }

    fn set_composer_error_context<T>(
        context: &'static str,
        context_mark: Mark,
        problem: &'static str,
        problem_mark: Mark,
    ) -> Result<T, ComposerError> {
        Err(ComposerError::ProblemWithContext {
            context,
            context_mark,
            problem,
            mark: problem_mark,
        })
    }

    fn load_document(&mut self, parser: &mut Parser, event: Event) -> Result<(), ComposerError> {
        let mut ctx = vec![];
        if let EventData::DocumentStart {
            version_directive,
            tag_directives,
            implicit,
        } = event.data
        {
            self.version_directive = version_directive;
            self.tag_directives = tag_directives;
            self.start_implicit = implicit;
            self.start_mark = event.start_mark;
            ctx.reserve(16);
            if let Err(err) = self.load_nodes(parser, &mut ctx) {
                ctx.clear();
                return Err(err);
            }
            ctx.clear();
            Ok(())
        } else {
            panic!("Expected YAML_DOCUMENT_START_EVENT")
        }
    }

    fn load_nodes(&mut self, parser: &mut Parser, ctx: &mut Vec<i32>) -> Result<(), ComposerError> {
        let end_implicit;
        let end_mark;

        loop {
            let event = parser.parse()?;
            match event.data {
                EventData::NoEvent => panic!("empty event"),
                EventData::StreamStart { .. } => panic!("unexpected stream start event"),
                EventData::StreamEnd => panic!("unexpected stream end event"),
                EventData::DocumentStart { .. } => panic!("unexpected document start event"),
                EventData::DocumentEnd { implicit } => {
                    end_implicit = implicit;
                    end_mark = event.end_mark;
                    break;
                }
                EventData::Alias { .. } => {
                    self.load_alias(parser, event, ctx)?;
                }
                EventData::Scalar { .. } => {
                    self.load_scalar(parser, event, ctx)?;
                }
                EventData::SequenceStart { .. } => {
                    self.load_sequence(parser, event, ctx)?;
                }
                EventData::SequenceEnd => {
                    self.load_sequence_end(event, ctx)?;
                }
                EventData::MappingStart { .. } => {
                    self.load_mapping(parser, event, ctx)?;
                }
                EventData::MappingEnd => {
                    self.load_mapping_end(event, ctx)?;
                }
            }
        }
        self.end_implicit = end_implicit;
        self.end_mark = end_mark;
        Ok(())
    }

    fn register_anchor(
        &mut self,
        parser: &mut Parser,
        index: i32,
        anchor: Option<String>,
    ) -> Result<(), ComposerError> {
        let Some(anchor) = anchor else {
            return Ok(());
        };
        let data = AliasData {
            anchor,
            index,
            mark: self.nodes[index as usize - 1].start_mark,
        };
        for alias_data in &parser.aliases {
            if alias_data.anchor == data.anchor {
                return Self::set_composer_error_context(
                    "found duplicate anchor; first occurrence",
                    alias_data.mark,
                    "second occurrence",
                    data.mark,
                );
            }
        }
        parser.aliases.push(data);
        Ok(())
    }

    fn load_node_add(&mut self, ctx: &[i32], index: i32) -> Result<(), ComposerError> {
        if ctx.is_empty() {
            // Not nested inside any currently-open collection: this is the
            // document's top-level node.
            self.root = index;
            return Ok(());
        }
        let parent_index: i32 = *ctx.last().unwrap();

        // A mapping pair is completed key-then-value; we only have a new key
        // to check for duplicates when the last pair (if any) is already
        // complete.
        let existing_keys: Vec<i32> = match &self.nodes[parent_index as usize - 1].data {
            NodeData::Mapping { pairs, .. }
                if pairs.last().map_or(true, |p| !(p.key != 0 && p.value == 0)) =>
            {
                pairs.iter().map(|p| p.key).collect()
            }
            _ => Vec::new(),
        };
        for key in existing_keys {
            if compare::compare(self, key, self, index) {
                return Self::set_composer_error_context(
                    "found duplicate key; first occurrence",
                    self.nodes[key as usize - 1].start_mark,
                    "second occurrence",
                    self.nodes[index as usize - 1].start_mark,
                );
            }
        }

        let parent = &mut self.nodes[parent_index as usize - 1];
        match parent.data {
            NodeData::Sequence { ref mut items, .. } => {
                items.push(index);
            }
            NodeData::Mapping { ref mut pairs, .. } => {
                let mut pair = NodePair::default();
                let mut do_push = true;
                if !pairs.is_empty() {
                    let p: &mut NodePair = pairs.last_mut().unwrap();
                    if p.key != 0 && p.value == 0 {
                        p.value = index;
                        do_push = false;
                    }
                }
                if do_push {
                    pair.key = index;
                    pair.value = 0;
                    pairs.push(pair);
                }
            }
            _ => {
                panic!("document parent node is not a sequence or a mapping")
            }
        }
        Ok(())
    }

    fn load_alias(
        &mut self,
        parser: &mut Parser,
        event: Event,
        ctx: &[i32],
    ) -> Result<(), ComposerError> {
        let EventData::Alias { anchor } = &event.data else {
            unreachable!()
        };

        for alias_data in &parser.aliases {
            if alias_data.anchor == *anchor {
                return self.load_node_add(ctx, alias_data.index);
            }
        }

        Self::set_composer_error("found undefined alias", event.start_mark)
    }

    fn load_scalar(
        &mut self,
        parser: &mut Parser,
        event: Event,
        ctx: &[i32],
    ) -> Result<(), ComposerError> {
        let EventData::Scalar {
            mut tag,
            value,
            style,
            anchor,
            ..
        } = event.data
        else {
            unreachable!()
        };

        if tag.is_none() || tag.as_deref() == Some("!") {
            tag = Some(String::from(DEFAULT_SCALAR_TAG));
        }
        let node = Node {
            data: NodeData::Scalar { value, style },
            tag,
            start_mark: event.start_mark,
            end_mark: event.end_mark,
        };
        self.nodes.push(node);
        let index: i32 = self.nodes.len() as i32;
        self.register_anchor(parser, index, anchor)?;
        self.load_node_add(ctx, index)
    }

    fn load_sequence(
        &mut self,
        parser: &mut Parser,
        event: Event,
        ctx: &mut Vec<i32>,
    ) -> Result<(), ComposerError> {
        let EventData::SequenceStart {
            anchor,
            mut tag,
            style,
            ..
        } = event.data
        else {
            unreachable!()
        };

        let mut items = Vec::with_capacity(16);

        if tag.is_none() || tag.as_deref() == Some("!") {
            tag = Some(String::from(DEFAULT_SEQUENCE_TAG));
        }

        let node = Node {
            data: NodeData::Sequence {
                items: core::mem::take(&mut items),
                style,
            },
            tag,
            start_mark: event.start_mark,
            end_mark: event.end_mark,
        };

        self.nodes.push(node);
        let index: i32 = self.nodes.len() as i32;
        self.register_anchor(parser, index, anchor)?;
        self.load_node_add(ctx, index)?;
        ctx.push(index);
        Ok(())
    }

    fn load_sequence_end(&mut self, event: Event, ctx: &mut Vec<i32>) -> Result<(), ComposerError> {
        assert!(!ctx.is_empty());
        let index: i32 = *ctx.last().unwrap();
        assert!(matches!(
            self.nodes[index as usize - 1].data,
            NodeData::Sequence { .. }
        ));
        self.nodes[index as usize - 1].end_mark = event.end_mark;
        _ = ctx.pop();
        Ok(())
    }

    fn load_mapping(
        &mut self,
        parser: &mut Parser,
        event: Event,
        ctx: &mut Vec<i32>,
    ) -> Result<(), ComposerError> {
        let EventData::MappingStart {
            anchor,
            mut tag,
            style,
            ..
        } = event.data
        else {
            unreachable!()
        };

        let mut pairs = Vec::with_capacity(16);

        if tag.is_none() || tag.as_deref() == Some("!") {
            tag = Some(String::from(DEFAULT_MAPPING_TAG));
        }
        let node = Node {
            data: NodeData::Mapping {
                pairs: core::mem::take(&mut pairs),
                style,
            },
            tag,
            start_mark: event.start_mark,
            end_mark: event.end_mark,
        };
        self.nodes.push(node);
        let index: i32 = self.nodes.len() as i32;
        self.register_anchor(parser, index, anchor)?;
        self.load_node_add(ctx, index)?;
        ctx.push(index);
        Ok(())
    }

    fn load_mapping_end(&mut self, event: Event, ctx: &mut Vec<i32>) -> Result<(), ComposerError> {
        assert!(!ctx.is_empty());
        let index: i32 = *ctx.last().unwrap();
        assert!(matches!(
            self.nodes[index as usize - 1].data,
            NodeData::Mapping { .. }
        ));
        self.nodes[index as usize - 1].end_mark = event.end_mark;
        _ = ctx.pop();
        Ok(())
    }

    /// Recursively deep-copy `src_index` from `src` into `self`, returning
    /// the id of the copy.
    ///
    /// If the source node carries an anchor and `self` has no anchor by that
    /// name yet, the copy is registered under that name. If the name is
    /// already bound in `self`, the existing binding is preserved and the
    /// copy is left unanchored (first-seen wins; see `DESIGN.md`).
    pub fn copy_node(&mut self, src: &Document, src_index: i32) -> i32 {
        let Some(src_node) = src.get_node(src_index) else {
            return 0;
        };
        let anchor_name = src
            .anchors
            .iter()
            .find(|anchor| anchor.node == src_index)
            .map(|anchor| anchor.name.clone());

        let index = match &src_node.data {
            NodeData::NoNode => 0,
            NodeData::Scalar { value, style } => {
                self.nodes.push(Node {
                    data: NodeData::Scalar {
                        value: value.clone(),
                        style: *style,
                    },
                    tag: src_node.tag.clone(),
                    start_mark: src_node.start_mark,
                    end_mark: src_node.end_mark,
                });
                self.nodes.len() as i32
            }
            NodeData::Sequence { items, style } => {
                let items = items.clone();
                let style = *style;
                let tag = src_node.tag.clone();
                let (start_mark, end_mark) = (src_node.start_mark, src_node.end_mark);
                self.nodes.push(Node {
                    data: NodeData::Sequence {
                        items: Vec::new(),
                        style,
                    },
                    tag,
                    start_mark,
                    end_mark,
                });
                let index = self.nodes.len() as i32;
                let copied: Vec<i32> = items.iter().map(|&item| self.copy_node(src, item)).collect();
                if let NodeData::Sequence { items, .. } = &mut self.nodes[index as usize - 1].data {
                    *items = copied;
                }
                index
            }
            NodeData::Mapping { pairs, style } => {
                let pairs = pairs.clone();
                let style = *style;
                let tag = src_node.tag.clone();
                let (start_mark, end_mark) = (src_node.start_mark, src_node.end_mark);
                self.nodes.push(Node {
                    data: NodeData::Mapping {
                        pairs: Vec::new(),
                        style,
                    },
                    tag,
                    start_mark,
                    end_mark,
                });
                let index = self.nodes.len() as i32;
                let copied: Vec<NodePair> = pairs
                    .iter()
                    .map(|pair| NodePair {
                        key: self.copy_node(src, pair.key),
                        value: self.copy_node(src, pair.value),
                    })
                    .collect();
                if let NodeData::Mapping { pairs, .. } = &mut self.nodes[index as usize - 1].data {
                    *pairs = copied;
                }
                index
            }
        };

        if index != 0 {
            if let Some(name) = anchor_name {
                if !self.anchors.iter().any(|anchor| anchor.name == name) {
                    self.anchors.push(Anchor { name, node: index });
                }
            }
        }
        index
    }

    /// Replace `to` with `from` in its parent, following the type-dependent
    /// merge rules: a scalar `to` is always replaced outright; sequence
    /// `from` into sequence `to` appends; mapping `from` into mapping `to`
    /// appends the keys missing from `to` and overwrites the ones present;
    /// any other combination of types replaces `to` with `from`. `from == 0`
    /// removes `to` from its parent instead.
    ///
    /// Returns `false` if `to` is not present in the document.
    pub fn insert_node(&mut self, to: i32, from: i32) -> bool {
        if self.get_node(to).is_none() {
            return false;
        }
        if from == 0 {
            return self.remove_node(to);
        }

        let merged = match (
            self.get_node(to).map(|node| &node.data),
            self.get_node(from).map(|node| &node.data),
        ) {
            (Some(NodeData::Sequence { .. }), Some(NodeData::Sequence { .. })) => {
                let items = match &self.get_node(from).unwrap().data {
                    NodeData::Sequence { items, .. } => items.clone(),
                    _ => unreachable!(),
                };
                let copied: Vec<i32> = items.iter().map(|&item| self.copy_node_within(item)).collect();
                if let NodeData::Sequence { items, .. } = &mut self.get_node_mut(to).unwrap().data {
                    items.extend(copied);
                }
                true
            }
            (Some(NodeData::Mapping { .. }), Some(NodeData::Mapping { .. })) => {
                let from_pairs = match &self.get_node(from).unwrap().data {
                    NodeData::Mapping { pairs, .. } => pairs.clone(),
                    _ => unreachable!(),
                };
                for pair in from_pairs {
                    let existing = match &self.get_node(to).unwrap().data {
                        NodeData::Mapping { pairs, .. } => pairs
                            .iter()
                            .position(|existing| compare::compare(self, existing.key, self, pair.key)),
                        _ => unreachable!(),
                    };
                    let value_copy = self.copy_node_within(pair.value);
                    let key_copy = existing.is_none().then(|| self.copy_node_within(pair.key));
                    if let NodeData::Mapping { pairs, .. } = &mut self.get_node_mut(to).unwrap().data {
                        match existing {
                            Some(position) => pairs[position].value = value_copy,
                            None => {
                                pairs.push(NodePair {
                                    key: key_copy.unwrap(),
                                    value: value_copy,
                                });
                            }
                        }
                    }
                }
                true
            }
            _ => false,
        };

        if !merged {
            let replacement = self.copy_node_within(from);
            if let Some(node) = self.get_node(replacement).cloned() {
                if let Some(slot) = self.get_node_mut(to) {
                    *slot = node;
                }
            }
        }
        self.resolve_parents();
        true
    }

    /// Deep-copy `index` from this same document, e.g. to duplicate a subtree
    /// being merged into another part of the tree. `copy_node` needs a
    /// stable source to read while it appends new nodes to `self.nodes`, so
    /// this takes a snapshot of the arena first.
    fn copy_node_within(&mut self, index: i32) -> i32 {
        let snapshot = self.clone();
        self.copy_node(&snapshot, index)
    }

    /// Remove `index` from its parent container. Returns `false` if `index`
    /// has no parent (it is the root, or already detached).
    pub fn remove_node(&mut self, index: i32) -> bool {
        if self.parents.len() != self.nodes.len() + 1 {
            self.resolve_parents();
        }
        let parent = self.parent_of(index);
        if parent == 0 {
            return false;
        }
        match &mut self.nodes[parent as usize - 1].data {
            NodeData::Sequence { items, .. } => items.retain(|&item| item != index),
            NodeData::Mapping { pairs, .. } => {
                pairs.retain(|pair| pair.key != index && pair.value != index);
            }
            NodeData::Scalar { .. } | NodeData::NoNode => return false,
        }
        self.parents[index as usize] = 0;
        true
    }

    /// Append a mapping pair, rejecting it if `key` already compares equal to
    /// an existing key in `mapping`.
    pub fn append_mapping_pair_checked(&mut self, mapping: i32, key: i32, value: i32) -> bool {
        let duplicate = match &self.nodes[mapping as usize - 1].data {
            NodeData::Mapping { pairs, .. } => pairs
                .iter()
                .any(|pair| compare::compare(self, pair.key, self, key)),
            _ => return false,
        };
        if duplicate {
            return false;
        }
        self.yaml_document_append_mapping_pair(mapping, key, value);
        true
    }

    /// Remove a pair from `mapping` whose key compares equal to `key`,
    /// returning the removed value's node id.
    pub fn remove_mapping_key(&mut self, mapping: i32, key: i32) -> Option<i32> {
        let position = match &self.nodes[mapping as usize - 1].data {
            NodeData::Mapping { pairs, .. } => {
                pairs.iter().position(|pair| compare::compare(self, pair.key, self, key))
            }
            _ => None,
        }?;
        if let NodeData::Mapping { pairs, .. } = &mut self.nodes[mapping as usize - 1].data {
            let removed = pairs.remove(position);
            return Some(removed.value);
        }
        unreachable!()
    }

    /// Sort a mapping's pairs in place using the default key ordering (see
    /// [`crate::compare`]), or a caller-supplied comparator over `(doc, key_a,
    /// key_b)`.
    pub fn sort_mapping(&mut self, mapping: i32, cmp: Option<fn(&Document, i32, i32) -> core::cmp::Ordering>) {
        let Some(NodeData::Mapping { pairs, .. }) = self.get_node(mapping).map(|node| &node.data) else {
            return;
        };
        let mut pairs = pairs.clone();
        match cmp {
            Some(cmp) => pairs.sort_by(|a, b| cmp(self, a.key, b.key)),
            None => pairs.sort_by(|a, b| compare::default_order(self, a.key, b.key)),
        }
        if let Some(NodeData::Mapping { pairs: slot, .. }) = self.get_node_mut(mapping).map(|node| &mut node.data) {
            *slot = pairs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_mapping_key_is_rejected() {
        let mut doc = Document::new(None, &[], true, true);
        let k1 = doc.add_scalar(None, "k", ScalarStyle::Plain);
        let v1 = doc.add_scalar(None, "1", ScalarStyle::Plain);
        let k2 = doc.add_scalar(None, "k", ScalarStyle::Plain);
        let v2 = doc.add_scalar(None, "2", ScalarStyle::Plain);
        let mapping = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(mapping, k1, v1);
        assert!(!doc.append_mapping_pair_checked(mapping, k2, v2));
    }

    #[test]
    fn resolve_parents_walks_the_whole_tree() {
        let mut doc = Document::new(None, &[], true, true);
        let a = doc.add_scalar(None, "a", ScalarStyle::Plain);
        let seq = doc.add_sequence(None, SequenceStyle::Block);
        doc.append_sequence_item(seq, a);
        doc.root = seq;
        doc.resolve_parents();
        assert_eq!(doc.parent_of(a), seq);
        assert_eq!(doc.parent_of(seq), 0);
    }

    #[test]
    fn copy_node_duplicates_a_subtree() {
        let mut src = Document::new(None, &[], true, true);
        let a = src.add_scalar(None, "a", ScalarStyle::Plain);
        let one = src.add_scalar(None, "1", ScalarStyle::Plain);
        let mapping = src.add_mapping(None, MappingStyle::Flow);
        src.yaml_document_append_mapping_pair(mapping, a, one);

        let mut dst = Document::new(None, &[], true, true);
        let copy = dst.copy_node(&src, mapping);
        assert!(compare::compare(&src, mapping, &dst, copy));
        assert_ne!(copy, mapping);
    }

    #[test]
    fn insert_node_merges_mappings_overwriting_existing_keys() {
        let mut doc = Document::new(None, &[], true, true);
        let a = doc.add_scalar(None, "a", ScalarStyle::Plain);
        let one = doc.add_scalar(None, "1", ScalarStyle::Plain);
        let to = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(to, a, one);

        let a2 = doc.add_scalar(None, "a", ScalarStyle::Plain);
        let two = doc.add_scalar(None, "2", ScalarStyle::Plain);
        let b = doc.add_scalar(None, "b", ScalarStyle::Plain);
        let three = doc.add_scalar(None, "3", ScalarStyle::Plain);
        let from = doc.add_mapping(None, MappingStyle::Flow);
        doc.yaml_document_append_mapping_pair(from, a2, two);
        doc.yaml_document_append_mapping_pair(from, b, three);

        assert!(doc.insert_node(to, from));
        let NodeData::Mapping { pairs, .. } = &doc.get_node(to).unwrap().data else {
            panic!("expected mapping");
        };
        assert_eq!(pairs.len(), 2);
        let NodeData::Scalar { value, .. } = &doc.get_node(pairs[0].value).unwrap().data else {
            panic!("expected scalar");
        };
        assert_eq!(value, "2");
    }

    #[test]
    fn insert_node_null_removes_from_parent() {
        let mut doc = Document::new(None, &[], true, true);
        let item = doc.add_scalar(None, "x", ScalarStyle::Plain);
        let seq = doc.add_sequence(None, SequenceStyle::Block);
        doc.append_sequence_item(seq, item);
        doc.root = seq;
        doc.resolve_parents();

        assert!(doc.insert_node(item, 0));
        let NodeData::Sequence { items, .. } = &doc.get_node(seq).unwrap().data else {
            panic!("expected sequence");
        };
        assert!(items.is_empty());
    }
}
