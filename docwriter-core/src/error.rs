//! Error types for docwriter

use thiserror::Error;

use crate::doc::NodeId;

/// Failures raised by the rule engine, the rules, and the text replacer.
///
/// Nothing in the core retries or rolls back: a failure partway through a
/// pass leaves the document with whatever mutations completed before it.
#[derive(Error, Debug)]
pub enum Error {
    /// `apply` was called on a node the rule does not match.
    #[error("{rule} rule doesn't apply to node {node}, call matches() first")]
    Precondition { rule: &'static str, node: NodeId },

    /// Degenerate input such as an empty search string or pattern.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The document model, markdown renderer or ToC generator failed.
    #[error("{context}")]
    Collaborator {
        context: String,
        #[source]
        source: TreeError,
    },
}

impl Error {
    pub(crate) fn collaborator(context: impl Into<String>, source: TreeError) -> Self {
        Error::Collaborator {
            context: context.into(),
            source,
        }
    }
}

/// Failures of the document tree model itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is not a container")]
    NotAContainer(NodeId),

    #[error("Node {0} is not a text leaf")]
    NotText(NodeId),

    #[error("Node {0} already has a parent")]
    AlreadyAttached(NodeId),

    #[error("Attaching node {0} would create a cycle")]
    CycleDetected(NodeId),

    #[error("Index {index} out of range for node {parent} with {len} children")]
    IndexOutOfRange {
        parent: NodeId,
        index: usize,
        len: usize,
    },

    #[error("No ToC content control found")]
    NoTocFound,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
