//! Text replacement across fragmented runs
//!
//! A search string may be split over several adjacent text leaves, because
//! formatting boundaries or earlier edits fragmented one logical run of text.
//! The replacer joins each [`Token`] (a maximal run of sibling text leaves),
//! replaces inside the joined string, and collapses the token into a single new
//! leaf only when the text actually changed.
//!
//! All tokens are collected and all new values computed before the tree is
//! touched. Each rewrite then splices only the token's own slice of the parent's
//! child list, so non-text siblings keep their identity and position.

use crate::doc::{Document, NodeId, NodeKind};
use crate::error::{Error, Result, TreeError};
use crate::walker::{self, Token};

/// Replace every occurrence of `needle` below `root`, returning the number of merged tokens
///
/// Occurrences are replaced left to right without overlap, in a single pass over
/// each token's joined text. Tokens without an occurrence are left untouched.
pub fn replace_text(
    doc: &mut Document,
    root: NodeId,
    needle: &str,
    replacement: &str,
) -> Result<usize> {
    if needle.is_empty() {
        return Err(Error::InvalidArgument(
            "text to replace must not be empty".to_string(),
        ));
    }

    let rewrites: Vec<(Token, String)> = walker::tokenize(doc, root)
        .into_iter()
        .filter(|token| !token.leaves.is_empty())
        .filter_map(|token| {
            let joined = token.joined(doc);
            if !joined.contains(needle) {
                return None;
            }
            let replaced = joined.replace(needle, replacement);
            (replaced != joined).then_some((token, replaced))
        })
        .collect();

    for (token, value) in &rewrites {
        merge(doc, token, value)?;
    }

    if !rewrites.is_empty() {
        log::debug!(
            "Replaced {needle:?} in {} run(s) below node {root}",
            rewrites.len()
        );
    }
    Ok(rewrites.len())
}

/// [`replace_text`] over the whole document body
pub fn replace_in_body(doc: &mut Document, needle: &str, replacement: &str) -> Result<usize> {
    let body = doc.body();
    replace_text(doc, body, needle, replacement)
}

fn merge(doc: &mut Document, token: &Token, value: &str) -> Result<()> {
    let context = || format!("Cannot merge text run under node {}", token.parent);

    let first = token.children[0];
    let start = doc
        .position(token.parent, first)
        .ok_or_else(|| Error::collaborator(context(), TreeError::NodeNotFound(first)))?;
    let end = start + token.children.len();
    if doc.children(token.parent).get(start..end) != Some(token.children.as_slice()) {
        let len = doc.children(token.parent).len();
        return Err(Error::collaborator(
            context(),
            TreeError::IndexOutOfRange {
                parent: token.parent,
                index: end,
                len,
            },
        ));
    }

    let merged = doc.create(NodeKind::text(value));
    let removed = doc
        .splice_children(token.parent, start..end, vec![merged])
        .map_err(|e| Error::collaborator(context(), e))?;

    log::trace!(
        "Merged {} leaf/leaves under {} into {merged}",
        removed.len(),
        token.parent
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{BreakKind, ParagraphStyle, RunFormat};

    fn run_with_texts(values: &[&str]) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let body = doc.body();
        let para = doc
            .append(body, NodeKind::Paragraph(ParagraphStyle::Normal))
            .unwrap();
        let run = doc.append(para, NodeKind::Run(RunFormat::default())).unwrap();
        let leaves = values
            .iter()
            .map(|v| doc.append(run, NodeKind::text(*v)).unwrap())
            .collect();
        (doc, run, leaves)
    }

    fn texts(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children(parent)
            .iter()
            .map(|&c| doc.text(c).unwrap_or("<non-text>").to_string())
            .collect()
    }

    #[test]
    fn test_match_within_one_leaf() -> anyhow::Result<()> {
        let (mut doc, run, _) = run_with_texts(&["Hello, there ", "is", " some"]);
        let body = doc.body();
        assert_eq!(replace_text(&mut doc, body, "is", "are")?, 1);
        assert_eq!(texts(&doc, run), vec!["Hello, there are some"]);
        Ok(())
    }

    #[test]
    fn test_match_across_leaves() -> anyhow::Result<()> {
        let (mut doc, run, leaves) = run_with_texts(&["Hello, there ", "is", " some"]);
        let body = doc.body();
        replace_text(&mut doc, body, "there is", "XX")?;
        assert_eq!(texts(&doc, run), vec!["Hello, XX some"]);

        let merged = doc.children(run)[0];
        assert_eq!(doc.parent(merged), Some(run));
        for leaf in leaves {
            assert_eq!(doc.parent(leaf), None);
        }
        Ok(())
    }

    #[test]
    fn test_all_occurrences_replaced() -> anyhow::Result<()> {
        let (mut doc, run, _) = run_with_texts(&["ee", "ee"]);
        let body = doc.body();
        replace_text(&mut doc, body, "e", "a")?;
        assert_eq!(texts(&doc, run), vec!["aaaa"]);
        Ok(())
    }

    #[test]
    fn test_leftmost_non_overlapping() -> anyhow::Result<()> {
        let (mut doc, run, _) = run_with_texts(&["aa", "a"]);
        let body = doc.body();
        replace_text(&mut doc, body, "aa", "b")?;
        assert_eq!(texts(&doc, run), vec!["ba"]);
        Ok(())
    }

    #[test]
    fn test_replacement_containing_needle_terminates() -> anyhow::Result<()> {
        let (mut doc, run, _) = run_with_texts(&["a-a"]);
        let body = doc.body();
        replace_text(&mut doc, body, "a", "aa")?;
        assert_eq!(texts(&doc, run), vec!["aa-aa"]);
        Ok(())
    }

    #[test]
    fn test_no_match_keeps_identity() -> anyhow::Result<()> {
        let (mut doc, run, leaves) = run_with_texts(&["a", "b", "c"]);
        let before = doc.node_count();
        let body = doc.body();

        assert_eq!(replace_text(&mut doc, body, "zzz", "y")?, 0);

        assert_eq!(doc.children(run), leaves.as_slice());
        assert_eq!(doc.node_count(), before);
        Ok(())
    }

    #[test]
    fn test_identity_replacement_is_noop() -> anyhow::Result<()> {
        let (mut doc, run, leaves) = run_with_texts(&["a", "b"]);
        let body = doc.body();
        assert_eq!(replace_text(&mut doc, body, "a", "a")?, 0);
        assert_eq!(doc.children(run), leaves.as_slice());
        Ok(())
    }

    #[test]
    fn test_second_run_is_noop() -> anyhow::Result<()> {
        let (mut doc, run, _) = run_with_texts(&["Hel", "lo"]);
        let body = doc.body();
        replace_text(&mut doc, body, "Hello", "Bye")?;
        let after_first = doc.children(run).to_vec();

        assert_eq!(replace_text(&mut doc, body, "Hello", "Bye")?, 0);
        assert_eq!(doc.children(run), after_first.as_slice());
        assert_eq!(doc.text_content(run), "Bye");
        Ok(())
    }

    #[test]
    fn test_empty_needle_is_rejected() {
        let (mut doc, run, leaves) = run_with_texts(&["a"]);
        let body = doc.body();
        let result = replace_text(&mut doc, body, "", "x");
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(doc.children(run), leaves.as_slice());
        assert_eq!(doc.text(leaves[0]), Some("a"));
    }

    #[test]
    fn test_non_text_siblings_keep_place() -> anyhow::Result<()> {
        let mut doc = Document::new();
        let body = doc.body();
        let para = doc.append(body, NodeKind::Paragraph(ParagraphStyle::Normal))?;
        doc.append(para, NodeKind::text("a"))?;
        doc.append(para, NodeKind::text("b"))?;
        let brk = doc.append(para, NodeKind::Break(BreakKind::Line))?;
        let c = doc.append(para, NodeKind::text("c"))?;

        assert_eq!(replace_text(&mut doc, body, "ab", "X")?, 1);

        let children = doc.children(para).to_vec();
        assert_eq!(children.len(), 3);
        assert_eq!(doc.text(children[0]), Some("X"));
        assert_eq!(children[1], brk);
        assert_eq!(children[2], c);
        Ok(())
    }

    #[test]
    fn test_several_tokens_in_one_parent() -> anyhow::Result<()> {
        let mut doc = Document::new();
        let body = doc.body();
        let para = doc.append(body, NodeKind::Paragraph(ParagraphStyle::Normal))?;
        doc.append(para, NodeKind::text("x"))?;
        doc.append(para, NodeKind::text("a"))?;
        let brk = doc.append(para, NodeKind::Break(BreakKind::Line))?;
        doc.append(para, NodeKind::text("a"))?;
        doc.append(para, NodeKind::text("y"))?;

        assert_eq!(replace_text(&mut doc, body, "a", "z")?, 2);
        assert_eq!(texts(&doc, para), vec!["xz", "<non-text>", "zy"]);
        assert_eq!(doc.children(para)[1], brk);
        Ok(())
    }

    #[test]
    fn test_match_does_not_cross_parents() -> anyhow::Result<()> {
        let mut doc = Document::new();
        let body = doc.body();
        let para = doc.append(body, NodeKind::Paragraph(ParagraphStyle::Normal))?;
        let first = doc.append(para, NodeKind::Run(RunFormat::default()))?;
        let a = doc.append(first, NodeKind::text("there "))?;
        let second = doc.append(para, NodeKind::Run(RunFormat::default()))?;
        let b = doc.append(second, NodeKind::text("is"))?;

        assert_eq!(replace_text(&mut doc, body, "there is", "X")?, 0);
        assert_eq!(doc.children(first), &[a]);
        assert_eq!(doc.children(second), &[b]);
        Ok(())
    }

    #[test]
    fn test_wrapped_leaves_are_merged() -> anyhow::Result<()> {
        let mut doc = Document::new();
        let body = doc.body();
        let run = doc.append(body, NodeKind::Run(RunFormat::default()))?;
        doc.append(run, NodeKind::text("$("))?;
        let wrapper = doc.append(run, NodeKind::Wrapper)?;
        doc.append(wrapper, NodeKind::text("name)"))?;

        replace_text(&mut doc, body, "$(name)", "World")?;
        assert_eq!(texts(&doc, run), vec!["World"]);
        assert_eq!(doc.parent(wrapper), None);
        Ok(())
    }

    #[test]
    fn test_replace_in_body() -> anyhow::Result<()> {
        let (mut doc, run, _) = run_with_texts(&["$(na", "me)"]);
        replace_in_body(&mut doc, "$(name)", "World")?;
        assert_eq!(texts(&doc, run), vec!["World"]);
        Ok(())
    }
}
