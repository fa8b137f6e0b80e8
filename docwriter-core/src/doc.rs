//! Document model: an arena of typed nodes with parent links
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Containers own an
//! ordered child list, every node records its parent, and detaching a node only
//! edits those two index fields, so there are no dangling references. Detached
//! nodes stay in the arena but are unreachable from the root.

use std::fmt;
use std::ops::Range;

use crate::error::TreeError;

/// Stable handle to a node in a [`Document`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the raw arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload-free classification of a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Body,
    Paragraph,
    Run,
    Text,
    Break,
    Field,
    Hyperlink,
    Table,
    TableRow,
    TableCell,
    TocBlock,
    Wrapper,
}

impl NodeType {
    /// Whether nodes of this type own a child list
    pub fn is_container(self) -> bool {
        !matches!(self, NodeType::Text | NodeType::Break | NodeType::Field)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Paragraph styling that the markdown renderer and ToC generator care about
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ParagraphStyle {
    #[default]
    Normal,
    Heading(u8),
    ListItem {
        depth: u8,
        ordinal: Option<u64>,
    },
    Code,
    HorizontalRule,
    TocHeading,
    TocEntry(u8),
}

/// Character formatting of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakKind {
    Line,
    Page,
}

/// A node together with its payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Body,
    Paragraph(ParagraphStyle),
    Run(RunFormat),
    Text(String),
    Break(BreakKind),
    /// Field instruction such as `TOC \o "1-3"` or `PAGEREF _Toc1`
    Field(String),
    Hyperlink(String),
    Table,
    TableRow,
    TableCell,
    /// Content control holding a generated table of contents
    TocBlock,
    /// Transparent element wrapper around a single child
    Wrapper,
}

impl NodeKind {
    pub fn text(value: impl Into<String>) -> Self {
        NodeKind::Text(value.into())
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document => NodeType::Document,
            NodeKind::Body => NodeType::Body,
            NodeKind::Paragraph(_) => NodeType::Paragraph,
            NodeKind::Run(_) => NodeType::Run,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Break(_) => NodeType::Break,
            NodeKind::Field(_) => NodeType::Field,
            NodeKind::Hyperlink(_) => NodeType::Hyperlink,
            NodeKind::Table => NodeType::Table,
            NodeKind::TableRow => NodeType::TableRow,
            NodeKind::TableCell => NodeType::TableCell,
            NodeKind::TocBlock => NodeType::TocBlock,
            NodeKind::Wrapper => NodeType::Wrapper,
        }
    }
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The main document structure
///
/// A fresh document is the default template: a `Document` root holding one
/// empty `Body`.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Document,
            parent: None,
            children: vec![NodeId(1)],
        };
        let body = Node {
            kind: NodeKind::Body,
            parent: Some(NodeId(0)),
            children: Vec::new(),
        };
        Self {
            nodes: vec![root, body],
            root: NodeId(0),
            body: NodeId(1),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of nodes ever created, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    /// Classify a node. Always read fresh; the tree may have changed since the last call.
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.kind(id).map(NodeKind::node_type)
    }

    /// Ordered children of a container (empty for leaves and unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Value of a text leaf
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(current) => {
                *current = value.into();
                Ok(())
            }
            _ => Err(TreeError::NotText(id)),
        }
    }

    /// Create a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a node and attach it as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, TreeError> {
        self.ensure_container(parent)?;
        let id = self.create(kind);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let len = self.node(parent)?.children.len();
        self.insert_child(parent, len, child)
    }

    /// Attach a detached node at `index` in the child list of `parent`
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        self.ensure_container(parent)?;
        let len = self.node(parent)?.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { parent, index, len });
        }
        self.ensure_attachable(parent, child)?;

        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach and return the child at `index`
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<NodeId, TreeError> {
        let len = self.node(parent)?.children.len();
        if index >= len {
            return Err(TreeError::IndexOutOfRange { parent, index, len });
        }
        let child = self.node_mut(parent)?.children.remove(index);
        self.node_mut(child)?.parent = None;
        Ok(child)
    }

    /// Detach a node from its parent. Detaching a detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        if let Some(parent) = self.node(id)?.parent {
            self.node_mut(parent)?.children.retain(|&c| c != id);
            self.node_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Replace the children in `range` with `replacement`, returning the removed ones
    ///
    /// Removed children have their parent link cleared. Children outside the range
    /// keep their relative order and identity.
    pub fn splice_children(
        &mut self,
        parent: NodeId,
        range: Range<usize>,
        replacement: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, TreeError> {
        self.ensure_container(parent)?;
        let len = self.node(parent)?.children.len();
        if range.start > range.end || range.end > len {
            return Err(TreeError::IndexOutOfRange {
                parent,
                index: range.end,
                len,
            });
        }
        for (i, &child) in replacement.iter().enumerate() {
            self.ensure_attachable(parent, child)?;
            if replacement[..i].contains(&child) {
                return Err(TreeError::AlreadyAttached(child));
            }
        }

        let removed: Vec<NodeId> = self
            .node_mut(parent)?
            .children
            .splice(range, replacement.iter().copied())
            .collect();
        for &child in &removed {
            self.node_mut(child)?.parent = None;
        }
        for &child in &replacement {
            self.node_mut(child)?.parent = Some(parent);
        }
        Ok(removed)
    }

    /// Position of `child` within the child list of `parent`
    pub fn position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Follow transparent wrappers down to the node they wrap
    pub fn unwrap(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(NodeKind::Wrapper) = self.kind(current) {
            match self.children(current) {
                [inner] => current = *inner,
                _ => break,
            }
        }
        current
    }

    /// Whether `id` is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Concatenated value of every text leaf below `id`, in document order
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.push_text(id, &mut out);
        out
    }

    fn push_text(&self, id: NodeId, out: &mut String) {
        if let Some(value) = self.text(id) {
            out.push_str(value);
        }
        for &child in self.children(id) {
            self.push_text(child, out);
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(id.0).ok_or(TreeError::NodeNotFound(id))
    }

    fn ensure_container(&self, id: NodeId) -> Result<(), TreeError> {
        if self.node(id)?.kind.node_type().is_container() {
            Ok(())
        } else {
            Err(TreeError::NotAContainer(id))
        }
    }

    fn ensure_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if self.node(child)?.parent.is_some() || child == self.root {
            return Err(TreeError::AlreadyAttached(child));
        }
        // A detached child is the root of its own subtree; `parent` must not sit inside it
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child {
                return Err(TreeError::CycleDetected(child));
            }
            current = self.parent(id);
        }
        Ok(())
    }
}
