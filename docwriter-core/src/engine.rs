//! Rule dispatch over a document subtree

use crate::doc::{Document, NodeId};
use crate::error::Result;
use crate::rules::Rule;
use crate::walker;

/// Ordered list of rules; order is both priority and execution order
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: impl Into<Rule>) {
        self.rules.push(rule.into());
    }

    pub fn with(mut self, rule: impl Into<Rule>) -> Self {
        self.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Apply every matching rule to every node below (and including) `root`
///
/// The node list is taken once, before any rule runs, so content inserted by a
/// rule during this pass is not visited; run another pass to reach it. Nodes that
/// an earlier rule detached from `root` are skipped. For each node the rules run in order,
/// each one checked with `matches` right before its `apply`. The first failure is
/// returned as is and earlier mutations stay in place.
///
/// Returns the number of rule applications.
pub fn apply_rules(rules: &RuleSet, doc: &mut Document, root: NodeId) -> Result<usize> {
    let nodes = walker::collect_all(doc, root);
    let mut applied = 0;

    for node in nodes {
        if !is_within(doc, root, node) {
            log::trace!("Skipping node {node}, detached during this pass");
            continue;
        }
        for rule in rules {
            if rule.matches(doc, node) {
                log::debug!("Applying {} rule to node {node}", rule.name());
                rule.apply(doc, node)?;
                applied += 1;
            }
        }
    }

    Ok(applied)
}

fn is_within(doc: &Document, root: NodeId, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == root {
            return true;
        }
        current = doc.parent(id);
    }
    false
}
