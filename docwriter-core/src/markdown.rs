//! Markdown rendering into the document tree
//!
//! Every text event becomes its own run holding one text leaf, so formatting
//! boundaries show up as separate runs exactly the way a word processor stores
//! them. Raw HTML is suppressed.

use pulldown_cmark::{Event, Options, Parser, Tag};

use crate::doc::{BreakKind, Document, NodeId, NodeKind, ParagraphStyle, RunFormat};
use crate::error::TreeError;

/// Markdown syntax extensions enabled while parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub strikethrough: bool,
    pub footnotes: bool,
    pub task_lists: bool,
}

impl MarkdownOptions {
    /// Tables and strikethrough only
    pub fn basic() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            footnotes: false,
            task_lists: false,
        }
    }

    /// Every supported extension
    pub fn extended() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            footnotes: true,
            task_lists: true,
        }
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.task_lists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        options
    }
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self::extended()
    }
}

/// Render `markdown` and append the result to `target`, returning the appended top-level nodes
pub fn render_markdown(
    doc: &mut Document,
    target: NodeId,
    markdown: &str,
    options: &MarkdownOptions,
) -> Result<Vec<NodeId>, TreeError> {
    let start = doc.children(target).len();

    let mut renderer = Renderer::new(doc, target);
    for event in Parser::new_ext(markdown, options.parser_options()) {
        renderer.event(event)?;
    }

    Ok(doc.children(target)[start..].to_vec())
}

/// What to undo when the matching end tag arrives
enum Frame {
    Container,
    Cell,
    CodeBlock,
    List,
    Format(RunFormat),
    Passthrough,
}

struct Renderer<'d> {
    doc: &'d mut Document,
    target: NodeId,
    containers: Vec<NodeId>,
    frames: Vec<Frame>,
    format: RunFormat,
    /// Next ordinal per open list, `None` for bullet lists
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    pending_line_break: bool,
}

impl<'d> Renderer<'d> {
    fn new(doc: &'d mut Document, target: NodeId) -> Self {
        Self {
            doc,
            target,
            containers: vec![target],
            frames: Vec::new(),
            format: RunFormat::default(),
            lists: Vec::new(),
            in_code_block: false,
            pending_line_break: false,
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), TreeError> {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => {
                self.end();
                Ok(())
            }
            Event::Text(text) if self.in_code_block => self.code_text(&text),
            Event::Text(text) => self.push_run(&text),
            Event::Code(code) => {
                let previous = self.format;
                self.format.code = true;
                let result = self.push_run(&code);
                self.format = previous;
                result
            }
            Event::SoftBreak => self.push_run(" "),
            Event::HardBreak => {
                let parent = self.inline_parent()?;
                self.doc.append(parent, NodeKind::Break(BreakKind::Line))?;
                Ok(())
            }
            Event::Rule => {
                let parent = self.block_parent();
                self.doc
                    .append(parent, NodeKind::Paragraph(ParagraphStyle::HorizontalRule))?;
                Ok(())
            }
            Event::TaskListMarker(checked) => self.push_run(if checked { "[x] " } else { "[ ] " }),
            Event::FootnoteReference(label) => self.push_run(&format!("[{label}]")),
            _ => Ok(()),
        }
    }

    fn start(&mut self, tag: Tag<'_>) -> Result<(), TreeError> {
        let frame = match tag {
            Tag::Paragraph if self.in_list_item() => Frame::Passthrough,
            Tag::Paragraph => {
                self.open_block(ParagraphStyle::Normal)?;
                Frame::Container
            }
            Tag::Heading { level, .. } => {
                self.open_block(ParagraphStyle::Heading(level as u8))?;
                Frame::Container
            }
            Tag::CodeBlock(_) => {
                self.open_block(ParagraphStyle::Code)?;
                self.in_code_block = true;
                Frame::CodeBlock
            }
            Tag::List(first) => {
                self.lists.push(first);
                Frame::List
            }
            Tag::Item => {
                let depth = u8::try_from(self.lists.len()).unwrap_or(u8::MAX);
                let ordinal = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let current = *next;
                        *next += 1;
                        Some(current)
                    }
                    _ => None,
                };
                self.open_block(ParagraphStyle::ListItem { depth, ordinal })?;
                Frame::Container
            }
            Tag::Table(_) => {
                self.open(self.block_parent(), NodeKind::Table)?;
                Frame::Container
            }
            Tag::TableHead | Tag::TableRow => {
                self.open(self.current(), NodeKind::TableRow)?;
                Frame::Container
            }
            Tag::TableCell => {
                let cell = self.open(self.current(), NodeKind::TableCell)?;
                self.open(cell, NodeKind::Paragraph(ParagraphStyle::Normal))?;
                Frame::Cell
            }
            Tag::Emphasis => self.push_format(|f| f.italic = true),
            Tag::Strong => self.push_format(|f| f.bold = true),
            Tag::Strikethrough => self.push_format(|f| f.strikethrough = true),
            Tag::Link { dest_url, .. } => {
                let parent = self.inline_parent()?;
                self.open(parent, NodeKind::Hyperlink(dest_url.to_string()))?;
                Frame::Container
            }
            _ => Frame::Passthrough,
        };
        self.frames.push(frame);
        Ok(())
    }

    fn end(&mut self) {
        match self.frames.pop() {
            Some(Frame::Container) => {
                self.containers.pop();
            }
            Some(Frame::Cell) => {
                self.containers.pop();
                self.containers.pop();
            }
            Some(Frame::CodeBlock) => {
                self.containers.pop();
                self.in_code_block = false;
                self.pending_line_break = false;
            }
            Some(Frame::List) => {
                self.lists.pop();
            }
            Some(Frame::Format(previous)) => self.format = previous,
            Some(Frame::Passthrough) | None => {}
        }
    }

    fn current(&self) -> NodeId {
        self.containers.last().copied().unwrap_or(self.target)
    }

    /// Nearest open container that can hold a paragraph
    fn block_parent(&self) -> NodeId {
        self.containers
            .iter()
            .rev()
            .copied()
            .find(|&id| {
                !matches!(
                    self.doc.kind(id),
                    Some(NodeKind::Paragraph(_) | NodeKind::Hyperlink(_))
                )
            })
            .unwrap_or(self.target)
    }

    /// Container for runs; text outside any paragraph gets one of its own
    fn inline_parent(&mut self) -> Result<NodeId, TreeError> {
        let current = self.current();
        match self.doc.kind(current) {
            Some(NodeKind::Paragraph(_) | NodeKind::Hyperlink(_)) => Ok(current),
            _ => self
                .doc
                .append(current, NodeKind::Paragraph(ParagraphStyle::Normal)),
        }
    }

    fn in_list_item(&self) -> bool {
        matches!(
            self.doc.kind(self.current()),
            Some(NodeKind::Paragraph(ParagraphStyle::ListItem { .. }))
        )
    }

    fn open(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, TreeError> {
        let id = self.doc.append(parent, kind)?;
        self.containers.push(id);
        Ok(id)
    }

    fn open_block(&mut self, style: ParagraphStyle) -> Result<NodeId, TreeError> {
        self.open(self.block_parent(), NodeKind::Paragraph(style))
    }

    fn push_format(&mut self, set: impl FnOnce(&mut RunFormat)) -> Frame {
        let previous = self.format;
        set(&mut self.format);
        Frame::Format(previous)
    }

    fn push_run(&mut self, text: &str) -> Result<(), TreeError> {
        let parent = self.inline_parent()?;
        let run = self.doc.append(parent, NodeKind::Run(self.format))?;
        self.doc.append(run, NodeKind::text(text))?;
        Ok(())
    }

    /// Code block lines become runs separated by line breaks; the final newline is dropped
    fn code_text(&mut self, text: &str) -> Result<(), TreeError> {
        for line in text.split_inclusive('\n') {
            let (content, newline) = match line.strip_suffix('\n') {
                Some(content) => (content, true),
                None => (line, false),
            };
            if self.pending_line_break {
                let parent = self.inline_parent()?;
                self.doc.append(parent, NodeKind::Break(BreakKind::Line))?;
                self.pending_line_break = false;
            }
            if !content.is_empty() {
                self.push_run(content)?;
            }
            self.pending_line_break = newline;
        }
        Ok(())
    }
}
