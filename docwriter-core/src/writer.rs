//! Writer facades over the rule engine
//!
//! [`DocWriter`] runs one configured [`RuleSet`] over a document.
//! [`MarkdownDocWriter`] is a writer whose only rule appends markdown held in a
//! settable cell. [`DocumentProcessor`] drives a single document imperatively
//! without building a rule set first.

use std::cell::RefCell;
use std::rc::Rc;

use crate::doc::{BreakKind, Document, NodeKind, ParagraphStyle};
use crate::engine::{apply_rules, RuleSet};
use crate::error::{Error, Result};
use crate::markdown::MarkdownOptions;
use crate::replacer;
use crate::rules::{MarkdownAppenderRule, Rule, TocInsertionRule, TocUpdateRule, Value};
use crate::toc::TocSettings;

/// Applies a fixed rule set to documents
#[derive(Clone, Debug, Default)]
pub struct DocWriter {
    rules: RuleSet,
}

impl DocWriter {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run one pass over `input`, or over the default template when there is none
    pub fn write(&self, input: Option<Document>) -> Result<Document> {
        let mut doc = input.unwrap_or_default();
        self.modify(&mut doc)?;
        Ok(doc)
    }

    /// Run one pass in place, returning the number of rule applications
    pub fn modify(&self, doc: &mut Document) -> Result<usize> {
        let root = doc.root();
        let applied = apply_rules(&self.rules, doc, root)?;
        log::info!(
            "Applied {} rule(s) {applied} time(s) to a document of {} node(s)",
            self.rules.len(),
            doc.node_count()
        );
        Ok(applied)
    }
}

/// Writer that appends one piece of markdown
///
/// The markdown is read when the writer runs, so the same writer can be
/// reused with different content.
#[derive(Clone, Debug)]
pub struct MarkdownDocWriter {
    content: Rc<RefCell<String>>,
    writer: DocWriter,
}

impl MarkdownDocWriter {
    pub fn new() -> Self {
        Self::with_options(MarkdownOptions::default())
    }

    pub fn with_options(options: MarkdownOptions) -> Self {
        let content = Rc::new(RefCell::new(String::new()));
        let source = Rc::clone(&content);
        let rule = MarkdownAppenderRule::new(Value::supplied(move || source.borrow().clone()))
            .with_options(options);
        Self {
            content,
            writer: DocWriter::new(RuleSet::new().with(rule)),
        }
    }

    pub fn set_content(&self, markdown: impl Into<String>) {
        *self.content.borrow_mut() = markdown.into();
    }

    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    pub fn write(&self, input: Option<Document>) -> Result<Document> {
        self.writer.write(input)
    }
}

impl Default for MarkdownDocWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Imperative editing of one document
///
/// Every operation except [`create_document`](Self::create_document) and
/// [`set_document`](Self::set_document) needs a current document and fails
/// with [`Error::InvalidArgument`] when there is none.
#[derive(Debug, Default)]
pub struct DocumentProcessor {
    document: Option<Document>,
    markdown: MarkdownOptions,
    toc: TocSettings,
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markdown_options(mut self, options: MarkdownOptions) -> Self {
        self.markdown = options;
        self
    }

    pub fn with_toc_settings(mut self, settings: TocSettings) -> Self {
        self.toc = settings;
        self
    }

    /// Start over from the default template, dropping any current document
    pub fn create_document(&mut self) {
        self.document = Some(Document::new());
    }

    pub fn set_document(&mut self, document: Document) {
        self.document = Some(document);
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn into_document(self) -> Option<Document> {
        self.document
    }

    pub fn add_markdown(&mut self, markdown: &str) -> Result<()> {
        let rule = MarkdownAppenderRule::new(markdown).with_options(self.markdown);
        self.apply_at_root(rule.into())
    }

    /// Append a heading of `level` 1 through 6
    pub fn add_headline(&mut self, level: u8, text: &str) -> Result<()> {
        if !(1..=6).contains(&level) {
            return Err(Error::InvalidArgument(format!(
                "headline level must be between 1 and 6, got {level}"
            )));
        }
        let prefix = "#".repeat(usize::from(level));
        self.add_markdown(&format!("{prefix} {text}"))
    }

    pub fn add_headline_h1(&mut self, text: &str) -> Result<()> {
        self.add_headline(1, text)
    }

    pub fn add_headline_h2(&mut self, text: &str) -> Result<()> {
        self.add_headline(2, text)
    }

    pub fn add_headline_h3(&mut self, text: &str) -> Result<()> {
        self.add_headline(3, text)
    }

    pub fn add_headline_h4(&mut self, text: &str) -> Result<()> {
        self.add_headline(4, text)
    }

    pub fn add_headline_h5(&mut self, text: &str) -> Result<()> {
        self.add_headline(5, text)
    }

    pub fn add_headline_h6(&mut self, text: &str) -> Result<()> {
        self.add_headline(6, text)
    }

    /// Append a paragraph holding a page break, so following content starts a new page
    pub fn add_page_break(&mut self) -> Result<()> {
        let doc = self.document_mut()?;
        let body = doc.body();
        let paragraph = doc
            .append(body, NodeKind::Paragraph(ParagraphStyle::Normal))
            .and_then(|paragraph| {
                doc.append(paragraph, NodeKind::Break(BreakKind::Page))?;
                Ok(paragraph)
            })
            .map_err(|e| Error::collaborator("Cannot add page break", e))?;
        log::debug!("Added page break in paragraph {paragraph}");
        Ok(())
    }

    /// Append a ToC; call [`update_toc`](Self::update_toc) once all headings are in
    pub fn add_toc(&mut self) -> Result<()> {
        let rule = TocInsertionRule::new().with_settings(self.toc.clone());
        self.apply_at_root(rule.into())
    }

    pub fn update_toc(&mut self) -> Result<()> {
        let rule = TocUpdateRule::new().with_settings(self.toc.clone());
        self.apply_at_root(rule.into())
    }

    /// Replace every `$(name)` in the body, even where the placeholder spans several runs
    pub fn replace_variable(&mut self, name: &str, value: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "variable name must not be empty".to_string(),
            ));
        }
        let doc = self.document_mut()?;
        replacer::replace_in_body(doc, &format!("$({name})"), value)
    }

    fn apply_at_root(&mut self, rule: Rule) -> Result<()> {
        let doc = self.document_mut()?;
        let root = doc.root();
        rule.apply(doc, root)
    }

    fn document_mut(&mut self) -> Result<&mut Document> {
        self.document.as_mut().ok_or_else(|| {
            Error::InvalidArgument(
                "No document found, see create_document() and set_document()".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{NodeId, NodeType, RunFormat};
    use crate::export::to_plain_text;
    use crate::rules::TextReplacementRule;
    use crate::toc::find_toc;

    fn body_styles(doc: &Document) -> Vec<ParagraphStyle> {
        doc.children(doc.body())
            .iter()
            .filter_map(|&id| match doc.kind(id) {
                Some(NodeKind::Paragraph(style)) => Some(style.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_write_without_input_uses_template() -> Result<()> {
        let writer = DocWriter::new(RuleSet::new().with(MarkdownAppenderRule::new("Hello")));
        let doc = writer.write(None)?;
        assert_eq!(to_plain_text(&doc, doc.root()), "Hello\n");
        Ok(())
    }

    #[test]
    fn test_write_with_input() -> Result<()> {
        let mut input = Document::new();
        let body = input.body();
        let run = input.append(body, NodeKind::Run(RunFormat::default())).unwrap();
        input.append(run, NodeKind::text("Name")).unwrap();

        let writer = DocWriter::new(RuleSet::new().with(TextReplacementRule::new("Name", "Ada")?));
        let doc = writer.write(Some(input))?;
        assert_eq!(doc.text_content(doc.root()), "Ada");
        Ok(())
    }

    #[test]
    fn test_empty_writer_changes_nothing() -> Result<()> {
        let writer = DocWriter::default();
        let mut doc = Document::new();
        assert_eq!(writer.modify(&mut doc)?, 0);
        assert_eq!(doc.node_count(), 2);
        Ok(())
    }

    #[test]
    fn test_markdown_writer_reads_content_at_write_time() -> Result<()> {
        let writer = MarkdownDocWriter::new();
        writer.set_content("# First");
        let first = writer.write(None)?;
        writer.set_content("Second");
        let second = writer.write(None)?;

        assert_eq!(writer.content(), "Second");
        assert_eq!(body_styles(&first), vec![ParagraphStyle::Heading(1)]);
        assert_eq!(to_plain_text(&second, second.root()), "Second\n");
        Ok(())
    }

    #[test]
    fn test_markdown_writer_with_basic_options() -> Result<()> {
        let writer = MarkdownDocWriter::with_options(MarkdownOptions::basic());
        writer.set_content("| a |\n|---|\n| 1 |\n");
        let doc = writer.write(None)?;
        let types: Vec<_> = doc
            .children(doc.body())
            .iter()
            .filter_map(|&id| doc.node_type(id))
            .collect();
        assert_eq!(types, vec![NodeType::Table]);
        Ok(())
    }

    #[test]
    fn test_processor_without_document() {
        let mut processor = DocumentProcessor::new();
        assert!(processor.document().is_none());
        assert!(matches!(
            processor.add_markdown("text"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            processor.add_page_break(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            processor.replace_variable("x", "y"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_processor_headlines() -> Result<()> {
        let mut processor = DocumentProcessor::new();
        processor.create_document();
        processor.add_headline_h1("One")?;
        processor.add_headline_h2("Two")?;
        processor.add_headline_h3("Three")?;
        processor.add_headline_h4("Four")?;
        processor.add_headline_h5("Five")?;
        processor.add_headline_h6("Six")?;

        let doc = processor.document().unwrap();
        assert_eq!(
            body_styles(doc),
            (1..=6).map(ParagraphStyle::Heading).collect::<Vec<_>>()
        );
        assert!(matches!(
            processor.add_headline(7, "Seven"),
            Err(Error::InvalidArgument(_))
        ));
        Ok(())
    }

    #[test]
    fn test_processor_page_break() -> Result<()> {
        let mut processor = DocumentProcessor::new();
        processor.create_document();
        processor.add_markdown("Before")?;
        processor.add_page_break()?;
        processor.add_markdown("After")?;

        let doc = processor.into_document().unwrap();
        assert_eq!(to_plain_text(&doc, doc.root()), "Before\n\u{c}\nAfter\n");
        Ok(())
    }

    #[test]
    fn test_processor_toc() -> Result<()> {
        let mut processor = DocumentProcessor::new();
        processor.create_document();
        processor.add_toc()?;
        let block: NodeId = find_toc(processor.document().unwrap()).unwrap();
        let before = processor.document().unwrap().children(block).len();

        processor.add_headline_h1("Intro")?;
        processor.add_headline_h2("Details")?;
        processor.update_toc()?;

        let doc = processor.document().unwrap();
        assert_eq!(find_toc(doc), Some(block));
        assert_eq!(doc.children(block).len(), before + 2);
        Ok(())
    }

    #[test]
    fn test_processor_update_without_toc_fails() {
        let mut processor = DocumentProcessor::new();
        processor.create_document();
        assert!(matches!(
            processor.update_toc(),
            Err(Error::Collaborator { .. })
        ));
    }

    #[test]
    fn test_processor_replace_variable() -> Result<()> {
        let mut processor = DocumentProcessor::new();
        processor.create_document();
        processor.add_markdown("Document $(doc.id) is *$(state)*")?;

        assert_eq!(processor.replace_variable("doc.id", "DOC-562342")?, 1);
        assert_eq!(processor.replace_variable("missing", "x")?, 0);
        assert!(processor.replace_variable("", "x").is_err());

        let doc = processor.document().unwrap();
        assert_eq!(
            to_plain_text(doc, doc.root()),
            "Document DOC-562342 is $(state)\n"
        );
        Ok(())
    }

    #[test]
    fn test_set_document_replaces_current() {
        let mut processor = DocumentProcessor::new();
        processor.create_document();
        let mut other = Document::new();
        let body = other.body();
        other.append(body, NodeKind::text("x")).unwrap();
        processor.set_document(other);
        assert_eq!(processor.document().unwrap().text_content(body), "x");
    }
}
