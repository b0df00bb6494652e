//! Node arena with an intrusive free list.
//!
//! Nodes are addressed by [`Offset`]s into one contiguous `Vec`. Offset `0`
//! is the root and doubles as "no edge"; offset `1` is the final sentinel
//! that every terminating edge points at. Reclaimed nodes are chained
//! through their first edge slot and recycled before the arena grows.

use tracing::trace;

use crate::error::{Result, TrieError};

/// Index of a node in the arena.
pub type Offset = u32;

pub(crate) const ROOT_OFFSET: Offset = 0;
pub(crate) const FINAL_OFFSET: Offset = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum State {
    Empty = 0,
    Internal = 1,
    Final = 2,
}

impl TryFrom<u32> for State {
    type Error = u32;

    fn try_from(v: u32) -> std::result::Result<Self, u32> {
        match v {
            0 => Ok(State::Empty),
            1 => Ok(State::Internal),
            2 => Ok(State::Final),
            _ => Err(v),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Node<const A: usize> {
    pub(crate) state: State,
    pub(crate) edges: [Offset; A],
}

impl<const A: usize> Node<A> {
    #[inline]
    pub(crate) fn new(state: State) -> Self {
        Self {
            state,
            edges: [0; A],
        }
    }

    #[inline]
    pub(crate) fn is_final(&self) -> bool {
        self.state == State::Final
    }

    #[inline]
    pub(crate) fn has_children(&self) -> bool {
        self.edges.iter().any(|&e| e != 0)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Arena<const A: usize> {
    pub(crate) nodes: Vec<Node<A>>,
    /// Head of the free list, `0` when empty.
    pub(crate) empty_head: Offset,
}

impl<const A: usize> Arena<A> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(2)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(2));
        nodes.push(Node::new(State::Internal));
        nodes.push(Node::new(State::Final));
        Self {
            nodes,
            empty_head: 0,
        }
    }

    /// Arena with no nodes at all, filled by the stream loader.
    pub(crate) fn unseeded(empty_head: Offset) -> Self {
        Self {
            nodes: Vec::new(),
            empty_head,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn node(&self, off: Offset) -> &Node<A> {
        &self.nodes[off as usize]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, off: Offset) -> &mut Node<A> {
        &mut self.nodes[off as usize]
    }

    #[inline]
    pub(crate) fn edge(&self, off: Offset, idx: usize) -> Offset {
        self.nodes[off as usize].edges[idx]
    }

    pub(crate) fn capacity_bytes(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node<A>>()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Pop the head of the free list, or append a fresh node to the arena.
    /// The returned node is INTERNAL with every edge cleared.
    pub(crate) fn next_empty_node(&mut self) -> Result<Offset> {
        if self.empty_head != 0 {
            let off = self.empty_head;
            let node = self.node_mut(off);
            debug_assert_eq!(node.state, State::Empty, "free list head is not EMPTY");
            let next = node.edges[0];
            *node = Node::new(State::Internal);
            self.empty_head = next;
            return Ok(off);
        }

        let off = Offset::try_from(self.nodes.len()).map_err(|_| TrieError::ArenaExhausted)?;
        self.nodes.push(Node::new(State::Internal));
        Ok(off)
    }

    /// Reclaim the subtree rooted at `start` onto the free list and return
    /// the number of slots reclaimed.
    ///
    /// Children are released before their parent, in edge order, so the
    /// resulting free chain is the same as a recursive post-order walk.
    pub(crate) fn delete_subtree(&mut self, start: Offset) -> usize {
        debug_assert_ne!(start, ROOT_OFFSET, "the root is never reclaimed");
        if self.node(start).is_final() {
            assert_eq!(start, FINAL_OFFSET, "FINAL state outside the sentinel");
            return 0;
        }

        let mut reclaimed = 0usize;
        let mut stack: Vec<(Offset, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            let off = top.0;
            if top.1 < A {
                let idx = top.1;
                top.1 += 1;
                let child = std::mem::take(&mut self.node_mut(off).edges[idx]);
                if child == 0 {
                    continue;
                }
                let state = self.node(child).state;
                assert_ne!(state, State::Empty, "reachable edge points at an EMPTY node");
                if state == State::Final {
                    assert_eq!(child, FINAL_OFFSET, "FINAL state outside the sentinel");
                } else {
                    stack.push((child, 0));
                }
                continue;
            }

            stack.pop();
            self.release(off);
            reclaimed += 1;
        }

        trace!(start, reclaimed, "reclaimed subtree");
        reclaimed
    }

    /// Mark `off` EMPTY and prepend it to the free list.
    fn release(&mut self, off: Offset) {
        let head = self.empty_head;
        let node = self.node_mut(off);
        *node = Node::new(State::Empty);
        node.edges[0] = head;
        self.empty_head = off;
    }

    /// Number of slots on the free list.
    pub(crate) fn free_len(&self) -> usize {
        let mut n = 0usize;
        let mut cur = self.empty_head;
        while cur != 0 {
            n += 1;
            cur = self.edge(cur, 0);
        }
        n
    }
}
