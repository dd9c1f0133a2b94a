//! Fold a flat sample list into a merged call tree.
//!
//! Frames are interned to small integer ids on first sight, and the tree is
//! grown in a flat arena where each slot maps child frame ids to slot
//! indices. Once every sample is folded in, the arena is frozen bottom-up into
//! immutable [`Node`]s, which derives each total exactly once.

use super::model::{CallTree, Node};
use crate::sampler::{Frame, Sample};
use log::debug;
use std::collections::HashMap;
use std::time::Duration;

type FrameId = usize;
type SlotId = usize;

struct Slot {
    frame: FrameId,
    own_time: Duration,
    occurrences: u64,
    // first-seen order
    children: Vec<SlotId>,
    child_index: HashMap<FrameId, SlotId>,
}

#[derive(Default)]
struct Arena {
    frames: Vec<Frame>,
    frame_ids: HashMap<Frame, FrameId>,
    slots: Vec<Slot>,
    roots: Vec<SlotId>,
    root_index: HashMap<FrameId, SlotId>,
}

impl Arena {
    fn intern(&mut self, frame: &Frame) -> FrameId {
        if let Some(&id) = self.frame_ids.get(frame) {
            return id;
        }
        let id = self.frames.len();
        self.frames.push(frame.clone());
        self.frame_ids.insert(frame.clone(), id);
        id
    }

    /// Find or create the slot for `frame` under `parent` (`None` = root level)
    fn child_of(&mut self, parent: Option<SlotId>, frame: FrameId) -> SlotId {
        let existing = match parent {
            Some(p) => self.slots[p].child_index.get(&frame).copied(),
            None => self.root_index.get(&frame).copied(),
        };
        if let Some(slot) = existing {
            return slot;
        }

        let slot = self.slots.len();
        self.slots.push(Slot {
            frame,
            own_time: Duration::ZERO,
            occurrences: 0,
            children: Vec::new(),
            child_index: HashMap::new(),
        });
        match parent {
            Some(p) => {
                self.slots[p].children.push(slot);
                self.slots[p].child_index.insert(frame, slot);
            }
            None => {
                self.roots.push(slot);
                self.root_index.insert(frame, slot);
            }
        }
        slot
    }

    fn add(&mut self, sample: &Sample) {
        let mut current = None;
        // Samples are innermost-first; the tree grows root-to-leaf.
        for frame in sample.frames().iter().rev() {
            let id = self.intern(frame);
            let slot = self.child_of(current, id);
            self.slots[slot].occurrences += 1;
            current = Some(slot);
        }
        if let Some(leaf) = current {
            self.slots[leaf].own_time += sample.duration();
        }
    }

    fn freeze(&self, slot: SlotId) -> Node {
        let s = &self.slots[slot];
        let children = s.children.iter().map(|&c| self.freeze(c)).collect();
        Node::new(self.frames[s.frame].clone(), s.own_time, s.occurrences, children)
    }
}

/// Build a call tree from samples
///
/// `elapsed` is the session's wall-clock time and becomes the tree total.
/// Samples with no frames are discarded. Children keep first-seen order.
pub fn build_call_tree(samples: &[Sample], elapsed: Duration) -> CallTree {
    let mut arena = Arena::default();
    let mut used = 0;

    for sample in samples {
        if sample.is_empty() {
            continue;
        }
        arena.add(sample);
        used += 1;
    }

    if used < samples.len() {
        debug!("Discarded {} empty samples", samples.len() - used);
    }

    let roots = arena.roots.iter().map(|&r| arena.freeze(r)).collect();
    debug!(
        "Built call tree: {} samples, {} distinct frames, {} nodes",
        used,
        arena.frames.len(),
        arena.slots.len()
    );

    CallTree::new(roots, elapsed, used)
}
