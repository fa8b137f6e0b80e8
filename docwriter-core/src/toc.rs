//! Table of Contents generation over the document tree
//!
//! A ToC is a [`NodeKind::TocBlock`] in the body holding a heading paragraph, a
//! field paragraph with the `TOC` instruction, and one entry paragraph per
//! heading. Page numbers are left to whatever lays the document out; when they
//! are requested each entry only carries a `PAGEREF` field.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::doc::{Document, NodeId, NodeKind, NodeType, ParagraphStyle, RunFormat};
use crate::error::TreeError;
use crate::walker;

pub const DEFAULT_HEADING_TEXT: &str = "Table of Contents";
pub const DEFAULT_SWITCHES: &str = r#"TOC \o "1-3" \n 1-3 \h \z \u"#;

/// Outline level range switch, e.g. `\o "1-3"`
static OUTLINE_SWITCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\\o\s+"(\d)-(\d)""#).unwrap());

/// A heading paragraph in the document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub node: NodeId,
    pub anchor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TocSettings {
    pub heading_text: String,
    pub switches: String,
    pub skip_page_numbers: bool,
}

impl Default for TocSettings {
    fn default() -> Self {
        Self {
            heading_text: DEFAULT_HEADING_TEXT.to_string(),
            switches: DEFAULT_SWITCHES.to_string(),
            skip_page_numbers: true,
        }
    }
}

impl TocSettings {
    /// Heading levels selected by the `\o` switch, every level if it is absent
    pub fn outline_levels(&self) -> RangeInclusive<u8> {
        OUTLINE_SWITCH
            .captures(&self.switches)
            .and_then(|caps| {
                let from = caps[1].parse().ok()?;
                let to = caps[2].parse().ok()?;
                Some(from..=to)
            })
            .unwrap_or(1..=9)
    }

    /// Whether entries link to their headings (`\h`)
    pub fn hyperlinks(&self) -> bool {
        self.switches
            .split_whitespace()
            .any(|switch| switch == "\\h")
    }
}

/// Extract heading paragraphs from the body, skipping any ToC content
pub fn extract_headings(doc: &Document) -> Vec<Heading> {
    let mut anchors: HashMap<String, usize> = HashMap::new();

    walker::collect(doc, doc.body(), |t| t == NodeType::Paragraph)
        .into_iter()
        .filter(|&id| !inside_toc(doc, id))
        .filter_map(|id| match doc.kind(id) {
            Some(NodeKind::Paragraph(ParagraphStyle::Heading(level))) => Some((id, *level)),
            _ => None,
        })
        .map(|(node, level)| {
            let text = doc.text_content(node).trim().to_string();
            let base = make_anchor(&text);
            let seen = anchors.entry(base.clone()).or_insert(0);
            let anchor = if *seen == 0 {
                base
            } else {
                format!("{base}-{seen}")
            };
            *seen += 1;

            Heading {
                level,
                text,
                node,
                anchor,
            }
        })
        .collect()
}

/// First ToC block in the body
pub fn find_toc(doc: &Document) -> Option<NodeId> {
    walker::collect(doc, doc.body(), |t| t == NodeType::TocBlock)
        .into_iter()
        .next()
}

/// Insert a ToC in place of the paragraph whose text equals `placeholder`
///
/// Without a placeholder, or when no paragraph matches it, the ToC is appended to
/// the end of the body.
pub fn insert_toc(
    doc: &mut Document,
    placeholder: Option<&str>,
    settings: &TocSettings,
) -> Result<NodeId, TreeError> {
    let body = doc.body();
    let found = placeholder.and_then(|placeholder| {
        doc.children(body).iter().position(|&child| {
            doc.node_type(child) == Some(NodeType::Paragraph)
                && doc.text_content(child) == placeholder
        })
    });

    let index = match found {
        Some(index) => {
            doc.remove_child(body, index)?;
            index
        }
        None => {
            if let Some(placeholder) = placeholder {
                log::debug!("ToC placeholder {placeholder:?} not found, appending ToC");
            }
            doc.children(body).len()
        }
    };

    generate_toc(doc, index, settings)
}

/// Build a ToC from the current headings and insert it into the body at `index`
pub fn generate_toc(
    doc: &mut Document,
    index: usize,
    settings: &TocSettings,
) -> Result<NodeId, TreeError> {
    let headings = extract_headings(doc);
    let block = doc.create(NodeKind::TocBlock);

    let title = doc.append(block, NodeKind::Paragraph(ParagraphStyle::TocHeading))?;
    let run = doc.append(title, NodeKind::Run(RunFormat::default()))?;
    doc.append(run, NodeKind::text(settings.heading_text.clone()))?;

    let instruction = doc.append(block, NodeKind::Paragraph(ParagraphStyle::Normal))?;
    doc.append(instruction, NodeKind::Field(settings.switches.clone()))?;

    let entries = append_entries(doc, block, &headings, settings)?;

    let body = doc.body();
    doc.insert_child(body, index, block)?;
    log::debug!("Generated ToC {block} with {entries} entries at body index {index}");
    Ok(block)
}

/// Regenerate the entries of the existing ToC in place
///
/// The ToC block keeps its identity. Its own field instruction decides the
/// outline levels and hyperlinks; `settings` only supplies page-number handling
/// and the fallback instruction.
pub fn update_toc(doc: &mut Document, settings: &TocSettings) -> Result<NodeId, TreeError> {
    let block = find_toc(doc).ok_or(TreeError::NoTocFound)?;

    let switches = doc
        .children(block)
        .iter()
        .flat_map(|&child| doc.children(child))
        .find_map(|&node| match doc.kind(node) {
            Some(NodeKind::Field(instruction)) => Some(instruction.clone()),
            _ => None,
        })
        .unwrap_or_else(|| settings.switches.clone());
    let effective = TocSettings {
        switches,
        ..settings.clone()
    };

    let stale: Vec<usize> = doc
        .children(block)
        .iter()
        .enumerate()
        .filter(|(_, child)| {
            matches!(
                doc.kind(**child),
                Some(NodeKind::Paragraph(ParagraphStyle::TocEntry(_)))
            )
        })
        .map(|(index, _)| index)
        .collect();
    for index in stale.into_iter().rev() {
        doc.remove_child(block, index)?;
    }

    let headings = extract_headings(doc);
    let entries = append_entries(doc, block, &headings, &effective)?;
    log::debug!("Updated ToC {block} with {entries} entries");
    Ok(block)
}

fn append_entries(
    doc: &mut Document,
    block: NodeId,
    headings: &[Heading],
    settings: &TocSettings,
) -> Result<usize, TreeError> {
    let levels = settings.outline_levels();
    let hyperlinks = settings.hyperlinks();
    let mut count = 0;

    for heading in headings.iter().filter(|h| levels.contains(&h.level)) {
        let entry = doc.append(block, NodeKind::Paragraph(ParagraphStyle::TocEntry(heading.level)))?;
        let parent = if hyperlinks {
            doc.append(entry, NodeKind::Hyperlink(format!("#{}", heading.anchor)))?
        } else {
            entry
        };
        let run = doc.append(parent, NodeKind::Run(RunFormat::default()))?;
        doc.append(run, NodeKind::text(heading.text.clone()))?;

        if !settings.skip_page_numbers {
            doc.append(entry, NodeKind::Field(format!("PAGEREF {} \\h", heading.anchor)))?;
        }
        count += 1;
    }

    Ok(count)
}

fn inside_toc(doc: &Document, id: NodeId) -> bool {
    let mut current = doc.parent(id);
    while let Some(node) = current {
        if doc.node_type(node) == Some(NodeType::TocBlock) {
            return true;
        }
        current = doc.parent(node);
    }
    false
}

/// Create an anchor from heading text (simplified version)
fn make_anchor(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() {
                '-'
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}
