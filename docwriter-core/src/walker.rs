//! Pre-order traversal over a document subtree
//!
//! Both walks unwrap transparent [`NodeKind::Wrapper`](crate::doc::NodeKind::Wrapper)
//! nodes before classifying, so a wrapped text leaf groups and matches exactly like
//! a bare one. Results are computed fresh on every call and nothing is mutated.

use crate::doc::{Document, NodeId, NodeType};

/// A maximal run of consecutive text leaves under one parent
///
/// `children` are the entries of the parent's child list that make up the run
/// (possibly wrappers), `leaves` the unwrapped text leaves, index for index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub parent: NodeId,
    pub children: Vec<NodeId>,
    pub leaves: Vec<NodeId>,
}

impl Token {
    /// Concatenated value of the token's leaves
    pub fn joined(&self, doc: &Document) -> String {
        self.leaves
            .iter()
            .filter_map(|&leaf| doc.text(leaf))
            .collect()
    }
}

/// Collect every node below (and including) `root` whose type satisfies `filter`
pub fn collect(doc: &Document, root: NodeId, filter: impl Fn(NodeType) -> bool) -> Vec<NodeId> {
    let mut result = Vec::new();
    collect_into(doc, root, &filter, &mut result);
    result
}

/// Collect every node below (and including) `root`
pub fn collect_all(doc: &Document, root: NodeId) -> Vec<NodeId> {
    collect(doc, root, |_| true)
}

fn collect_into(
    doc: &Document,
    node: NodeId,
    filter: &dyn Fn(NodeType) -> bool,
    result: &mut Vec<NodeId>,
) {
    let node = doc.unwrap(node);
    let Some(node_type) = doc.node_type(node) else {
        return;
    };

    if filter(node_type) {
        result.push(node);
    }
    if node_type.is_container() {
        for &child in doc.children(node) {
            collect_into(doc, child, filter, result);
        }
    }
}

/// Group the text leaves below `root` into tokens, in document order
///
/// A token ends when its parent changes or when a non-text sibling interrupts it.
/// Non-text siblings are never part of a token; containers among them are walked
/// in turn.
pub fn tokenize(doc: &Document, root: NodeId) -> Vec<Token> {
    let mut tokens = Vec::new();
    tokenize_into(doc, root, &mut tokens);
    tokens
}

fn tokenize_into(doc: &Document, node: NodeId, tokens: &mut Vec<Token>) {
    let node = doc.unwrap(node);
    if !doc.node_type(node).is_some_and(NodeType::is_container) {
        return;
    }

    let mut current: Option<Token> = None;
    for &child in doc.children(node) {
        let leaf = doc.unwrap(child);
        if doc.node_type(leaf) == Some(NodeType::Text) {
            let token = current.get_or_insert_with(|| Token {
                parent: node,
                children: Vec::new(),
                leaves: Vec::new(),
            });
            token.children.push(child);
            token.leaves.push(leaf);
        } else {
            if let Some(token) = current.take() {
                tokens.push(token);
            }
            tokenize_into(doc, leaf, tokens);
        }
    }
    if let Some(token) = current {
        tokens.push(token);
    }
}
