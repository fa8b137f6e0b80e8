//! Text renderings of a document
//!
//! `to_plain_text` flattens the body into lines of text, one per paragraph.
//! `to_tree_string` draws one line per node with box-drawing connectors and
//! is meant for debugging templates.

use crate::doc::{BreakKind, Document, NodeId, NodeKind, ParagraphStyle};

const LABEL_WIDTH: usize = 40;

/// Render the text below `root` with paragraph and line breaks
///
/// Table cells are separated by tabs and every row ends a line. Page breaks
/// are written as form feeds.
pub fn to_plain_text(doc: &Document, root: NodeId) -> String {
    let mut out = String::new();
    push_plain(doc, root, &mut out);
    out
}

fn push_plain(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        Some(NodeKind::Text(value)) => out.push_str(value),
        Some(NodeKind::Break(BreakKind::Line)) => out.push('\n'),
        Some(NodeKind::Break(BreakKind::Page)) => out.push('\u{c}'),
        Some(NodeKind::Field(_)) | None => {}
        Some(NodeKind::Paragraph(style)) => {
            if let ParagraphStyle::ListItem { depth, ordinal } = style {
                out.push_str(&"  ".repeat(usize::from(depth.saturating_sub(1))));
                match ordinal {
                    Some(n) => out.push_str(&format!("{n}. ")),
                    None => out.push_str("- "),
                }
            }
            push_children(doc, id, out);
            out.push('\n');
        }
        Some(NodeKind::TableRow) => {
            let cells: Vec<String> = doc
                .children(id)
                .iter()
                .map(|&cell| to_plain_text(doc, cell).trim_end_matches('\n').to_string())
                .collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        Some(_) => push_children(doc, id, out),
    }
}

fn push_children(doc: &Document, id: NodeId, out: &mut String) {
    for &child in doc.children(id) {
        push_plain(doc, child, out);
    }
}

/// Draw the tree below `root`, one node per line
pub fn to_tree_string(doc: &Document, root: NodeId) -> String {
    let mut result = format!("{}\n", label(doc, root));
    append_children(doc, root, "", &mut result);
    result
}

fn append_node(doc: &Document, id: NodeId, prefix: &str, is_last: bool, result: &mut String) {
    let connector = if is_last { "└─" } else { "├─" };
    result.push_str(&format!("{prefix}{connector} {}\n", label(doc, id)));

    let new_prefix = format!("{prefix}{}", if is_last { "  " } else { "│ " });
    append_children(doc, id, &new_prefix, result);
}

fn append_children(doc: &Document, id: NodeId, prefix: &str, result: &mut String) {
    let children = doc.children(id);
    for (i, &child) in children.iter().enumerate() {
        append_node(doc, child, prefix, i + 1 == children.len(), result);
    }
}

fn label(doc: &Document, id: NodeId) -> String {
    let detail = match doc.kind(id) {
        Some(NodeKind::Text(value)) => format!("{:?}", truncate(value, LABEL_WIDTH)),
        Some(NodeKind::Paragraph(style)) if *style != ParagraphStyle::Normal => {
            format!("{style:?}")
        }
        Some(NodeKind::Run(format)) if *format != Default::default() => format!("{format:?}"),
        Some(NodeKind::Break(kind)) => format!("{kind:?}"),
        Some(NodeKind::Field(instruction)) => truncate(instruction, LABEL_WIDTH),
        Some(NodeKind::Hyperlink(target)) => truncate(target, LABEL_WIDTH),
        Some(_) => String::new(),
        None => return format!("{id} <missing>"),
    };
    let node_type = doc
        .node_type(id)
        .map(|t| t.to_string())
        .unwrap_or_default();
    if detail.is_empty() {
        format!("{node_type} {id}")
    } else {
        format!("{node_type} {id}: {detail}")
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}
