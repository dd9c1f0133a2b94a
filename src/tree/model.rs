//! Immutable call tree types.
//!
//! A [`Node`]'s `total_time` is derived once, when the node is constructed
//! from its own time and its already-built children. Nodes are never mutated
//! afterwards; transformations build new trees.

use crate::sampler::Frame;
use std::time::Duration;

/// One merged call path position
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    frame: Frame,
    children: Vec<Node>,
    own_time: Duration,
    total_time: Duration,
    occurrences: u64,
}

impl Node {
    /// Build a node; `total_time` is own time plus the children's totals
    pub fn new(frame: Frame, own_time: Duration, occurrences: u64, children: Vec<Node>) -> Self {
        let total_time = own_time + children.iter().map(Node::total_time).sum::<Duration>();
        Self {
            frame,
            children,
            own_time,
            total_time,
            occurrences,
        }
    }

    pub fn leaf(frame: Frame, own_time: Duration, occurrences: u64) -> Self {
        Self::new(frame, own_time, occurrences, Vec::new())
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn symbol(&self) -> &str {
        self.frame.symbol()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Time of samples whose innermost frame is this node
    pub fn own_time(&self) -> Duration {
        self.own_time
    }

    /// Own time plus all descendants' total time
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Number of samples that passed through this node
    pub fn occurrences(&self) -> u64 {
        self.occurrences
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child with the given symbol
    pub fn child(&self, symbol: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.symbol() == symbol)
    }

    /// The same node folded into a leaf carrying its whole subtree's time
    pub fn collapsed(&self) -> Node {
        Node {
            frame: self.frame.clone(),
            children: Vec::new(),
            own_time: self.total_time,
            total_time: self.total_time,
            occurrences: self.occurrences,
        }
    }

    /// The same node with a different child list; totals are re-derived
    pub fn with_children(&self, children: Vec<Node>) -> Node {
        Node::new(self.frame.clone(), self.own_time, self.occurrences, children)
    }
}

/// Merged, time-weighted forest built from one recording
#[derive(Debug, Clone, PartialEq)]
pub struct CallTree {
    roots: Vec<Node>,
    total_time: Duration,
    sample_count: usize,
}

impl CallTree {
    pub fn new(roots: Vec<Node>, total_time: Duration, sample_count: usize) -> Self {
        Self {
            roots,
            total_time,
            sample_count,
        }
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Wall-clock time of the session; the percentage denominator
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Same session numbers, different roots
    pub fn with_roots(&self, roots: Vec<Node>) -> CallTree {
        CallTree {
            roots,
            total_time: self.total_time,
            sample_count: self.sample_count,
        }
    }

    /// Follow a root-to-leaf path of symbols
    pub fn find(&self, path: &[&str]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.iter().find(|n| n.symbol() == *first)?;
        for symbol in rest {
            node = node.child(symbol)?;
        }
        Some(node)
    }

    /// Pre-order walk yielding `(depth, node)`
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.roots.iter().rev().map(|n| (0, n)).collect(),
        }
    }

    /// Share of the session spent in `time`, in percent
    pub fn percent_of(&self, time: Duration) -> f64 {
        if self.total_time.is_zero() {
            0.0
        } else {
            time.as_secs_f64() / self.total_time.as_secs_f64() * 100.0
        }
    }
}

/// Iterator returned by [`CallTree::walk`]
pub struct Walk<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}
