//! Node arena: owning storage for every node of a program.
//!
//! Nodes never own each other. A parent refers to its children by
//! [`NodeIndex`], and each node records its parent index, so replacing a child
//! during lowering is one slot update plus one back-link update.

use crate::base::NodeIndex;
use crate::node::{Node, NodeData, NodeState};
use serde::{Deserialize, Serialize};
use strata_common::TextRange;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Rebuild parent links after deserialisation (parents are not trusted
    /// from external input).
    pub fn link_parents(&mut self) {
        for i in 0..self.nodes.len() {
            let parent = NodeIndex(i as u32);
            for child in self.nodes[i].data.children() {
                if let Some(node) = self.nodes.get_mut(child.index()) {
                    node.parent = parent;
                }
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.index())
        }
    }

    #[inline]
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.index())
        }
    }

    #[inline]
    pub fn data(&self, index: NodeIndex) -> Option<&NodeData> {
        self.get(index).map(|n| &n.data)
    }

    pub fn kind_name(&self, index: NodeIndex) -> &'static str {
        self.get(index).map_or("<none>", Node::kind_name)
    }

    pub fn range(&self, index: NodeIndex) -> TextRange {
        self.get(index).map_or(TextRange::SYNTHESIZED, |n| n.range)
    }

    pub fn state(&self, index: NodeIndex) -> NodeState {
        self.get(index).map_or(NodeState::Unstarted, |n| n.state)
    }

    pub fn set_state(&mut self, index: NodeIndex, state: NodeState) {
        if let Some(node) = self.get_mut(index) {
            node.state = state;
        }
    }

    /// Append a node and link its children back to it.
    pub fn add(&mut self, data: NodeData, range: TextRange) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        let children = data.children();
        self.nodes.push(Node::new(data, range));
        for child in children {
            self.set_parent(child, index);
        }
        index
    }

    /// Append a synthesized node (factory- or lowering-created).
    #[inline]
    pub fn add_synthesized(&mut self, data: NodeData) -> NodeIndex {
        self.add(data, TextRange::SYNTHESIZED)
    }

    fn set_parent(&mut self, child: NodeIndex, parent: NodeIndex) {
        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
        }
    }

    #[inline]
    pub fn parent_of(&self, index: NodeIndex) -> NodeIndex {
        self.get(index).map_or(NodeIndex::NONE, |n| n.parent)
    }

    pub fn children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.get(index).map(|n| n.data.children()).unwrap_or_default()
    }

    /// Nearest ancestor (excluding `index` itself) satisfying `pred`.
    pub fn find_ancestor(
        &self,
        index: NodeIndex,
        mut pred: impl FnMut(&NodeData) -> bool,
    ) -> Option<NodeIndex> {
        let mut current = self.parent_of(index);
        let mut steps = 0usize;
        while current.is_some() && steps <= self.nodes.len() {
            let node = self.get(current)?;
            if pred(&node.data) {
                return Some(current);
            }
            current = node.parent;
            steps += 1;
        }
        None
    }

    /// Pre-order traversal of the subtree rooted at `root` (inclusive).
    pub fn descendants(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let Some(node) = self.get(idx) else { continue };
            out.push(idx);
            let children = node.data.children();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Replace `old` with `new` in `parent`'s child slots.
    ///
    /// Returns `false` when `old` is not a child of `parent`. `old` stays in
    /// the arena (it may be re-parented under `new`).
    pub fn replace_child(&mut self, parent: NodeIndex, old: NodeIndex, new: NodeIndex) -> bool {
        let Some(node) = self.get_mut(parent) else {
            return false;
        };
        let mut replaced = false;
        for slot in node.data.child_slots_mut() {
            if *slot == old {
                *slot = new;
                replaced = true;
            }
        }
        if replaced {
            self.set_parent(new, parent);
        }
        replaced
    }

    /// Replace `old` in whatever parent currently holds it.
    pub fn replace_in_parent(&mut self, old: NodeIndex, new: NodeIndex) -> bool {
        let parent = self.parent_of(old);
        parent.is_some() && self.replace_child(parent, old, new)
    }

    /// Deep-copy the subtree rooted at `root`, returning the new root.
    ///
    /// The copy is unstarted and has no parent.
    pub fn clone_subtree(&mut self, root: NodeIndex) -> NodeIndex {
        let Some(node) = self.get(root) else {
            return NodeIndex::NONE;
        };
        let mut data = node.data.clone();
        let range = node.range;
        let binding = node.binding;
        for slot in data.child_slots_mut() {
            if slot.is_some() {
                *slot = self.clone_subtree(*slot);
            }
        }
        let copy = self.add(data, range);
        if let Some(n) = self.get_mut(copy) {
            n.binding = binding;
        }
        copy
    }
}

#[cfg(test)]
#[path = "../tests/node_arena_tests.rs"]
mod tests;
