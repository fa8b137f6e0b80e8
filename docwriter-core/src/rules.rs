//! Document rules: a predicate plus an effect over tree nodes
//!
//! Rules form a closed set. Text rules act on text leaves; document-level rules
//! match only the document root and perform bulk insertion through the markdown
//! renderer or the ToC generator. Every `apply` re-checks `matches` and fails
//! with [`Error::Precondition`] when called on a node the rule does not match.

use std::fmt;
use std::rc::Rc;

use regex::Regex;

use crate::doc::{Document, NodeId};
use crate::error::{Error, Result};
use crate::markdown::{self, MarkdownOptions};
use crate::toc::{self, TocSettings};

/// Replacement value, either fixed or produced at apply time
#[derive(Clone)]
pub enum Value {
    Fixed(String),
    Supplied(Rc<dyn Fn() -> String>),
}

impl Value {
    pub fn supplied(supplier: impl Fn() -> String + 'static) -> Self {
        Value::Supplied(Rc::new(supplier))
    }

    /// Resolve the value; suppliers are invoked on every call
    pub fn resolve(&self) -> String {
        match self {
            Value::Fixed(value) => value.clone(),
            Value::Supplied(supplier) => supplier(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Value::Supplied(_) => f.write_str("Supplied(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Fixed(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Fixed(value)
    }
}

/// Overwrites a text leaf whose whole value equals `text_to_replace`
#[derive(Clone, Debug)]
pub struct TextReplacementRule {
    text_to_replace: String,
    value: Value,
}

impl TextReplacementRule {
    pub fn new(text_to_replace: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let text_to_replace = text_to_replace.into();
        if text_to_replace.is_empty() {
            return Err(Error::InvalidArgument(
                "text to replace must not be empty".to_string(),
            ));
        }
        Ok(Self {
            text_to_replace,
            value: value.into(),
        })
    }

    /// Match the placeholder form `$(name)`
    pub fn placeholder(name: &str, value: impl Into<Value>) -> Self {
        Self {
            text_to_replace: format!("$({name})"),
            value: value.into(),
        }
    }

    pub fn text_to_replace(&self) -> &str {
        &self.text_to_replace
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.text(node) == Some(self.text_to_replace.as_str())
    }

    pub fn apply(&self, doc: &mut Document, node: NodeId) -> Result<()> {
        if !self.matches(doc, node) {
            return Err(Error::Precondition {
                rule: "text replacement",
                node,
            });
        }
        doc.set_text(node, self.value.resolve())
            .map_err(|e| Error::collaborator("Cannot replace text", e))
    }
}

/// Rewrites a text leaf whose whole value matches a regular expression
///
/// The resolved value is used as a replacement template, so `${1}` and `$name`
/// refer to capture groups.
#[derive(Clone, Debug)]
pub struct RegexReplacementRule {
    pattern: Regex,
    whole: Regex,
    value: Value,
}

impl RegexReplacementRule {
    pub fn new(pattern: &str, value: impl Into<Value>) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidArgument(
                "regex pattern must not be empty".to_string(),
            ));
        }
        let compile = |source: &str| {
            Regex::new(source)
                .map_err(|e| Error::InvalidArgument(format!("invalid regex {pattern:?}: {e}")))
        };

        Ok(Self {
            pattern: compile(pattern)?,
            whole: compile(&format!("^(?:{pattern})$"))?,
            value: value.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.text(node).is_some_and(|text| self.whole.is_match(text))
    }

    pub fn apply(&self, doc: &mut Document, node: NodeId) -> Result<()> {
        let old = match doc.text(node) {
            Some(text) if self.whole.is_match(text) => text,
            _ => {
                return Err(Error::Precondition {
                    rule: "regex replacement",
                    node,
                })
            }
        };

        let replacement = self.value.resolve();
        let new = self.pattern.replace_all(old, replacement.as_str());
        if new != old {
            let new = new.into_owned();
            doc.set_text(node, new)
                .map_err(|e| Error::collaborator("Cannot replace text", e))?;
        }
        Ok(())
    }
}

/// Renders markdown and appends it to the body
#[derive(Clone, Debug)]
pub struct MarkdownAppenderRule {
    value: Value,
    options: MarkdownOptions,
}

impl MarkdownAppenderRule {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            options: MarkdownOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MarkdownOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    fn apply(&self, doc: &mut Document) -> Result<()> {
        let markdown = self.value.resolve();
        let body = doc.body();
        let added = markdown::render_markdown(doc, body, &markdown, &self.options)
            .map_err(|e| Error::collaborator("Cannot render markdown", e))?;
        log::debug!("Appended {} block(s) of markdown", added.len());
        Ok(())
    }
}

/// Inserts a ToC at a placeholder paragraph, or at the end of the body
#[derive(Clone, Debug, Default)]
pub struct TocInsertionRule {
    placeholder: Option<String>,
    settings: TocSettings,
}

impl TocInsertionRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_settings(mut self, settings: TocSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn settings(&self) -> &TocSettings {
        &self.settings
    }

    fn apply(&self, doc: &mut Document) -> Result<()> {
        toc::insert_toc(doc, self.placeholder(), &self.settings)
            .map_err(|e| Error::collaborator("Cannot create table of contents", e))?;
        Ok(())
    }
}

/// Regenerates the entries of the existing ToC
#[derive(Clone, Debug, Default)]
pub struct TocUpdateRule {
    settings: TocSettings,
}

impl TocUpdateRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: TocSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &TocSettings {
        &self.settings
    }

    fn apply(&self, doc: &mut Document) -> Result<()> {
        toc::update_toc(doc, &self.settings)
            .map_err(|e| Error::collaborator("Cannot update table of contents", e))?;
        Ok(())
    }
}

/// Rules that apply to the document root
#[derive(Clone, Debug)]
pub enum DocumentRule {
    MarkdownAppend(MarkdownAppenderRule),
    TocInsert(TocInsertionRule),
    TocUpdate(TocUpdateRule),
}

impl DocumentRule {
    fn name(&self) -> &'static str {
        match self {
            DocumentRule::MarkdownAppend(_) => "markdown appender",
            DocumentRule::TocInsert(_) => "ToC insertion",
            DocumentRule::TocUpdate(_) => "ToC update",
        }
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        node == doc.root()
    }

    pub fn apply(&self, doc: &mut Document, node: NodeId) -> Result<()> {
        if !self.matches(doc, node) {
            return Err(Error::Precondition {
                rule: self.name(),
                node,
            });
        }
        match self {
            DocumentRule::MarkdownAppend(rule) => rule.apply(doc),
            DocumentRule::TocInsert(rule) => rule.apply(doc),
            DocumentRule::TocUpdate(rule) => rule.apply(doc),
        }
    }
}

/// A rule of any kind
#[derive(Clone, Debug)]
pub enum Rule {
    Text(TextReplacementRule),
    Regex(RegexReplacementRule),
    Document(DocumentRule),
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Text(_) => "text replacement",
            Rule::Regex(_) => "regex replacement",
            Rule::Document(rule) => rule.name(),
        }
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self {
            Rule::Text(rule) => rule.matches(doc, node),
            Rule::Regex(rule) => rule.matches(doc, node),
            Rule::Document(rule) => rule.matches(doc, node),
        }
    }

    pub fn apply(&self, doc: &mut Document, node: NodeId) -> Result<()> {
        match self {
            Rule::Text(rule) => rule.apply(doc, node),
            Rule::Regex(rule) => rule.apply(doc, node),
            Rule::Document(rule) => rule.apply(doc, node),
        }
    }
}

impl From<TextReplacementRule> for Rule {
    fn from(rule: TextReplacementRule) -> Self {
        Rule::Text(rule)
    }
}

impl From<RegexReplacementRule> for Rule {
    fn from(rule: RegexReplacementRule) -> Self {
        Rule::Regex(rule)
    }
}

impl From<MarkdownAppenderRule> for Rule {
    fn from(rule: MarkdownAppenderRule) -> Self {
        Rule::Document(DocumentRule::MarkdownAppend(rule))
    }
}

impl From<TocInsertionRule> for Rule {
    fn from(rule: TocInsertionRule) -> Self {
        Rule::Document(DocumentRule::TocInsert(rule))
    }
}

impl From<TocUpdateRule> for Rule {
    fn from(rule: TocUpdateRule) -> Self {
        Rule::Document(DocumentRule::TocUpdate(rule))
    }
}
