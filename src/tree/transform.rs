//! Pure call tree transformations.
//!
//! Every function takes a tree by reference and returns a new tree; the input
//! stays valid, so callers can branch from any intermediate result.

use super::model::{CallTree, Node};
use crate::pattern::Glob;
use log::debug;
use std::cmp::Ordering;

/// Strip non-branching prefixes
///
/// Each root is replaced by its only child for as long as it has exactly one,
/// surfacing the first frame where execution actually branches.
pub fn prune_top(tree: &CallTree) -> CallTree {
    let roots = tree
        .roots()
        .iter()
        .map(|root| {
            let mut node = root;
            while let [only] = node.children() {
                node = only;
            }
            node.clone()
        })
        .collect();
    tree.with_roots(roots)
}

/// Fold subtrees selected by `soft` and `hard` globs
///
/// A node becomes a leaf carrying its total time when it matches `hard`, or
/// when it and every node below it match `soft`. Anything else is kept and
/// its children are examined in turn.
pub fn collapse(tree: &CallTree, soft: &Glob, hard: &Glob) -> CallTree {
    if soft.is_empty() && hard.is_empty() {
        return tree.clone();
    }
    let roots = tree
        .roots()
        .iter()
        .map(|n| collapse_node(n, soft, hard))
        .collect();
    tree.with_roots(roots)
}

fn collapse_node(node: &Node, soft: &Glob, hard: &Glob) -> Node {
    if hard.matches(node.symbol()) || all_match(node, soft) {
        return node.collapsed();
    }
    let children = node
        .children()
        .iter()
        .map(|c| collapse_node(c, soft, hard))
        .collect();
    node.with_children(children)
}

fn all_match(node: &Node, glob: &Glob) -> bool {
    glob.matches(node.symbol()) && node.children().iter().all(|c| all_match(c, glob))
}

/// Fold every subtree whose total is below `min_percent` of the session
///
/// A threshold of zero or less returns the tree unchanged.
pub fn collapse_below(tree: &CallTree, min_percent: f64) -> CallTree {
    if min_percent <= 0.0 {
        return tree.clone();
    }
    let roots = tree
        .roots()
        .iter()
        .map(|n| collapse_small(tree, n, min_percent))
        .collect();
    tree.with_roots(roots)
}

fn collapse_small(tree: &CallTree, node: &Node, min_percent: f64) -> Node {
    if tree.percent_of(node.total_time()) < min_percent {
        return node.collapsed();
    }
    let children = node
        .children()
        .iter()
        .map(|c| collapse_small(tree, c, min_percent))
        .collect();
    node.with_children(children)
}

/// Reorder children at every level with `compare`
///
/// Children are sorted before their parent's sibling list, and the sort is
/// stable, so equal nodes keep first-seen order.
pub fn sort_by<F>(tree: &CallTree, compare: F) -> CallTree
where
    F: Fn(&Node, &Node) -> Ordering,
{
    let mut roots: Vec<Node> = tree.roots().iter().map(|n| sort_node(n, &compare)).collect();
    roots.sort_by(&compare);
    tree.with_roots(roots)
}

fn sort_node<F>(node: &Node, compare: &F) -> Node
where
    F: Fn(&Node, &Node) -> Ordering,
{
    let mut children: Vec<Node> = node.children().iter().map(|c| sort_node(c, compare)).collect();
    children.sort_by(compare);
    node.with_children(children)
}

/// Heaviest subtrees first
pub fn by_total_time_desc(a: &Node, b: &Node) -> Ordering {
    b.total_time().cmp(&a.total_time())
}

/// [`sort_by`] with [`by_total_time_desc`]
pub fn sort(tree: &CallTree) -> CallTree {
    let sorted = sort_by(tree, by_total_time_desc);
    debug!("Sorted {} root(s) by total time", sorted.roots().len());
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::Frame;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn leaf(name: &'static str, own: u64) -> Node {
        Node::leaf(Frame::new(name), ms(own), 1)
    }

    fn node(name: &'static str, own: u64, children: Vec<Node>) -> Node {
        Node::new(Frame::new(name), ms(own), 1, children)
    }

    fn tree(roots: Vec<Node>) -> CallTree {
        let total = roots.iter().map(Node::total_time).sum();
        CallTree::new(roots, total, 10)
    }

    fn sample_tree() -> CallTree {
        tree(vec![node(
            "thread.Start",
            0,
            vec![node(
                "app.Main",
                1,
                vec![
                    node("fw.Invoker", 0, vec![leaf("fw.Reflect", 4)]),
                    node("fw.Dispatcher", 0, vec![leaf("app.Handler", 6)]),
                    leaf("lib.Json", 9),
                ],
            )],
        )])
    }

    #[test]
    fn test_prune_top_drops_single_child_chain() {
        let pruned = prune_top(&sample_tree());
        assert_eq!(pruned.roots()[0].symbol(), "app.Main");
        assert_eq!(pruned.total_time(), sample_tree().total_time());
    }

    #[test]
    fn test_prune_top_down_to_leaf() {
        let chain = tree(vec![node("a", 0, vec![node("b", 0, vec![leaf("c", 3)])])]);
        let pruned = prune_top(&chain);
        assert_eq!(pruned.roots()[0].symbol(), "c");
    }

    #[test]
    fn test_prune_is_idempotent() {
        let once = prune_top(&sample_tree());
        assert_eq!(prune_top(&once), once);
    }

    #[test]
    fn test_soft_collapse_needs_whole_subtree() {
        let soft = Glob::new(["fw.*"]).unwrap();
        let collapsed = collapse(&sample_tree(), &soft, &Glob::empty());

        let invoker = collapsed
            .find(&["thread.Start", "app.Main", "fw.Invoker"])
            .unwrap();
        assert!(invoker.is_leaf());
        assert_eq!(invoker.own_time(), ms(4));

        // app.Handler below the dispatcher keeps it open
        let dispatcher = collapsed
            .find(&["thread.Start", "app.Main", "fw.Dispatcher"])
            .unwrap();
        assert_eq!(dispatcher.children().len(), 1);
    }

    #[test]
    fn test_hard_collapse_ignores_subtree() {
        let hard = Glob::new(["fw.Dispatcher"]).unwrap();
        let collapsed = collapse(&sample_tree(), &Glob::empty(), &hard);
        let dispatcher = collapsed
            .find(&["thread.Start", "app.Main", "fw.Dispatcher"])
            .unwrap();
        assert!(dispatcher.is_leaf());
        assert_eq!(dispatcher.own_time(), ms(6));
        assert_eq!(collapsed.roots()[0].total_time(), ms(20));
    }

    #[test]
    fn test_hard_collapse_everything_leaves_only_leaves() {
        let collapsed = collapse(&sample_tree(), &Glob::empty(), &Glob::any());
        assert!(collapsed.walk().all(|(_, n)| n.is_leaf()));
        assert_eq!(collapsed.roots()[0].own_time(), ms(20));
    }

    #[test]
    fn test_empty_globs_are_identity() {
        let t = sample_tree();
        assert_eq!(collapse(&t, &Glob::empty(), &Glob::empty()), t);
    }

    #[test]
    fn test_collapse_below_threshold() {
        // total 20ms: fw.Invoker is 20%, fw.Dispatcher 30%
        let collapsed = collapse_below(&sample_tree(), 25.0);
        let main = collapsed.find(&["thread.Start", "app.Main"]).unwrap();
        assert!(main.child("fw.Invoker").unwrap().is_leaf());
        assert_eq!(main.child("fw.Invoker").unwrap().own_time(), ms(4));
        assert!(!main.child("fw.Dispatcher").unwrap().is_leaf());
        assert_eq!(main.total_time(), ms(20));
        assert_eq!(collapse_below(&sample_tree(), 0.0), sample_tree());
    }

    #[test]
    fn test_sort_descending_by_total() {
        let sorted = sort(&sample_tree());
        let main = sorted.find(&["thread.Start", "app.Main"]).unwrap();
        let names: Vec<&str> = main.children().iter().map(Node::symbol).collect();
        assert_eq!(names, vec!["lib.Json", "fw.Dispatcher", "fw.Invoker"]);
    }

    #[test]
    fn test_sort_ties_keep_first_seen_order() {
        let t = tree(vec![node(
            "root",
            0,
            vec![leaf("b", 5), leaf("a", 5), leaf("c", 7)],
        )]);
        let sorted = sort(&t);
        let names: Vec<&str> = sorted.roots()[0].children().iter().map(Node::symbol).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let once = sort(&sample_tree());
        assert_eq!(sort(&once), once);
    }

    #[test]
    fn test_transformations_preserve_totals_invariant() {
        fn check(node: &Node) {
            let children: Duration = node.children().iter().map(Node::total_time).sum();
            assert_eq!(node.total_time(), node.own_time() + children);
            node.children().iter().for_each(check);
        }

        let soft = Glob::new(["fw.*"]).unwrap();
        let collapsed = collapse(&prune_top(&sample_tree()), &soft, &Glob::empty());
        let t = sort(&collapse_below(&collapsed, 10.0));
        t.roots().iter().for_each(check);
    }

    #[test]
    fn test_input_tree_is_untouched() {
        let original = sample_tree();
        let _ = collapse(&original, &Glob::empty(), &Glob::any());
        let _ = prune_top(&original);
        assert_eq!(original, sample_tree());
    }
}
