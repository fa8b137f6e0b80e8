//! Docwriter Core - rule-based document writing
//!
//! This crate contains the core logic for docwriter, independent of the CLI:
//! - Arena document model with typed nodes and parent links
//! - Tree walking and grouping of adjacent text leaves
//! - Text, regex, markdown and ToC rules and the engine that applies them
//! - Text replacement across fragmented runs
//! - Markdown rendering and ToC generation
//! - Configuration management

pub mod config;
pub mod doc;
pub mod engine;
pub mod error;
pub mod export;
pub mod markdown;
pub mod replacer;
pub mod rules;
pub mod toc;
pub mod walker;
pub mod writer;

// Re-export commonly used types
pub use config::Config;
pub use doc::{Document, NodeId, NodeKind, NodeType};
pub use engine::{apply_rules, RuleSet};
pub use error::{Error, Result, TreeError};
pub use replacer::{replace_in_body, replace_text};
pub use rules::{
    MarkdownAppenderRule, RegexReplacementRule, Rule, TextReplacementRule, TocInsertionRule,
    TocUpdateRule, Value,
};
pub use writer::{DocWriter, DocumentProcessor, MarkdownDocWriter};
