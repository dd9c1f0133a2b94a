//! Build collapsed stack format from a call tree.
//!
//! Collapsed stacks are the input format for flamegraph generation.
//! Format: "parent;child;grandchild weight"
//!
//! Example: "app.Main;app.db.Query;app.io.Socket 12000"
//! This means: 12000 microseconds were sampled with Socket as innermost frame
//! on that path.

use crate::tree::{CallTree, Node};
use log::debug;

/// A single collapsed stack entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedStack {
    /// Stack trace as semicolon-separated string
    pub stack: String,

    /// Own time of the innermost frame, in microseconds
    pub weight: u64,
}

impl CollapsedStack {
    pub fn new(stack: String, weight: u64) -> Self {
        Self { stack, weight }
    }

    /// Render as one line of folded-stack text
    pub fn to_line(&self) -> String {
        format!("{} {}", self.stack, self.weight)
    }
}

/// Build collapsed stacks from a call tree
///
/// One entry per node with own time, sorted by weight (descending). Entries
/// with equal weight keep tree order.
pub fn build_collapsed_stacks(tree: &CallTree) -> Vec<CollapsedStack> {
    let mut stacks = Vec::new();
    let mut path: Vec<&str> = Vec::new();

    for root in tree.roots() {
        collect(root, &mut path, &mut stacks);
    }

    stacks.sort_by(|a, b| b.weight.cmp(&a.weight));
    debug!("Built {} collapsed stacks", stacks.len());
    stacks
}

fn collect<'a>(node: &'a Node, path: &mut Vec<&'a str>, out: &mut Vec<CollapsedStack>) {
    // ';' separates frames in the folded format
    path.push(node.symbol());

    let weight = node.own_time().as_micros() as u64;
    if weight > 0 {
        out.push(CollapsedStack::new(path.join(";").replace(' ', "_"), weight));
    }
    for child in node.children() {
        collect(child, path, out);
    }

    path.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::Frame;
    use std::time::Duration;

    #[test]
    fn test_collapsed_stack_to_line() {
        let stack = CollapsedStack::new("main;execute;storage_read".to_string(), 1000);
        assert_eq!(stack.to_line(), "main;execute;storage_read 1000");
    }

    #[test]
    fn test_build_collapsed_stacks() {
        let tree = CallTree::new(
            vec![Node::new(
                Frame::new("app.Main"),
                Duration::from_millis(1),
                3,
                vec![
                    Node::leaf(Frame::new("app.Parse"), Duration::from_millis(2), 1),
                    Node::leaf(Frame::new("app.Write"), Duration::ZERO, 1),
                ],
            )],
            Duration::from_millis(3),
            3,
        );

        let stacks = build_collapsed_stacks(&tree);
        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[0].stack, "app.Main;app.Parse");
        assert_eq!(stacks[0].weight, 2000);
        assert_eq!(stacks[1].stack, "app.Main");
    }

    #[test]
    fn test_empty_tree_has_no_stacks() {
        let tree = CallTree::new(Vec::new(), Duration::from_millis(10), 0);
        assert!(build_collapsed_stacks(&tree).is_empty());
    }
}
