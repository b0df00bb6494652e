//! Line-oriented textual stream format.
//!
//! ```text
//! <alphabet-bytes>\n
//! <empty_head>\n
//! <state> <edge_0> ... <edge_{A-1}>\n    (one line per node, arena order)
//! ```
//!
//! States are written as `0` (EMPTY), `1` (INTERNAL) and `2` (FINAL). The
//! reader splits numbers on any ASCII whitespace and accepts a missing line
//! feed after the last node.

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::alphabet::Alphabet;
use crate::arena::{Arena, Node, Offset, State, FINAL_OFFSET, ROOT_OFFSET};
use crate::error::{Result, TrieError};
use crate::MerTrie;

impl<const A: usize> MerTrie<A> {
    /// Write the trie in the stream format. The output reloads with
    /// [`MerTrie::load`] into an equal trie.
    pub fn dump<W: Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(self.alphabet.as_bytes())?;
        writeln!(out)?;
        writeln!(out, "{}", self.arena.empty_head)?;
        for node in &self.arena.nodes {
            write!(out, "{}", node.state as u8)?;
            for edge in &node.edges {
                write!(out, " {edge}")?;
            }
            writeln!(out)?;
        }
        out.flush()
    }

    /// Read a trie previously written by [`MerTrie::dump`].
    pub fn load<R: BufRead>(mut input: R) -> Result<Self> {
        let mut line = Vec::new();
        input.read_until(b'\n', &mut line)?;
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        let alphabet = Alphabet::new(&line)?;

        let mut tokens = Tokens::new(input);
        let empty_head = tokens
            .next_number()?
            .ok_or(TrieError::IncompleteStream { node: 0 })?;

        let mut arena = Arena::unseeded(empty_head);
        while let Some(code) = tokens.next_number()? {
            let cur = arena.len();
            let state = State::try_from(code)
                .map_err(|s| TrieError::malformed(format!("node {cur}: invalid state {s}")))?;
            if cur == ROOT_OFFSET as usize && state != State::Internal {
                return Err(TrieError::malformed("root node must be INTERNAL"));
            }
            if cur == FINAL_OFFSET as usize && state != State::Final {
                return Err(TrieError::malformed("sentinel node must be FINAL"));
            }

            let mut node = Node::new(state);
            for edge in node.edges.iter_mut() {
                *edge = tokens
                    .next_number()?
                    .ok_or(TrieError::IncompleteStream { node: cur })?;
            }
            arena.nodes.push(node);
        }

        if arena.len() < 2 {
            return Err(TrieError::malformed(format!(
                "expected root and sentinel nodes, found {} node(s)",
                arena.len()
            )));
        }
        if Offset::try_from(arena.len()).is_err() {
            return Err(TrieError::ArenaExhausted);
        }

        let free = validate(&arena)?;
        debug!(nodes = arena.len(), free, "loaded trie");
        Ok(Self { alphabet, arena })
    }
}

/// Check the loaded arena is a tree hanging off the root with a well formed
/// free chain. Returns the free-list length.
fn validate<const A: usize>(arena: &Arena<A>) -> Result<usize> {
    let len = arena.len();
    let mut seen = vec![false; len];
    seen[ROOT_OFFSET as usize] = true;
    seen[FINAL_OFFSET as usize] = true;

    let mut stack = vec![ROOT_OFFSET];
    while let Some(off) = stack.pop() {
        for &edge in &arena.node(off).edges {
            if edge == 0 || edge == FINAL_OFFSET {
                continue;
            }
            let target = edge as usize;
            if target >= len {
                return Err(TrieError::malformed(format!(
                    "node {off}: edge to {edge} is out of range"
                )));
            }
            if seen[target] {
                return Err(TrieError::malformed(format!(
                    "node {edge} is reachable more than once"
                )));
            }
            match arena.node(edge).state {
                State::Internal => {}
                State::Empty => {
                    return Err(TrieError::malformed(format!(
                        "node {off}: edge to EMPTY node {edge}"
                    )))
                }
                State::Final => {
                    return Err(TrieError::malformed(format!(
                        "node {edge}: FINAL state outside the sentinel"
                    )))
                }
            }
            seen[target] = true;
            stack.push(edge);
        }
    }

    let mut free = 0usize;
    let mut cur = arena.empty_head;
    while cur != 0 {
        let idx = cur as usize;
        if idx >= len || seen[idx] {
            return Err(TrieError::malformed(format!(
                "free list entry {cur} is out of range, live or cyclic"
            )));
        }
        if arena.node(cur).state != State::Empty {
            return Err(TrieError::malformed(format!(
                "free list entry {cur} is not EMPTY"
            )));
        }
        seen[idx] = true;
        free += 1;
        cur = arena.edge(cur, 0);
    }

    let mut orphans = 0usize;
    for (idx, node) in arena.nodes.iter().enumerate() {
        if seen[idx] {
            continue;
        }
        if node.is_final() {
            return Err(TrieError::malformed(format!(
                "node {idx}: FINAL state outside the sentinel"
            )));
        }
        orphans += 1;
    }
    if orphans > 0 {
        warn!(orphans, "nodes neither reachable nor on the free list");
    }

    Ok(free)
}

/// Whitespace separated decimal numbers read from a buffered stream.
struct Tokens<R> {
    input: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Tokens<R> {
    fn new(input: R) -> Self {
        Self {
            input,
            buf: Vec::with_capacity(16),
        }
    }

    /// Next token, or `None` at end of stream.
    fn next_token(&mut self) -> io::Result<Option<&[u8]>> {
        self.buf.clear();
        loop {
            let chunk = self.input.fill_buf()?;
            if chunk.is_empty() {
                break;
            }

            let mut used = 0;
            let mut done = false;
            for &b in chunk {
                if b.is_ascii_whitespace() {
                    if !self.buf.is_empty() {
                        done = true;
                        break;
                    }
                } else {
                    self.buf.push(b);
                }
                used += 1;
            }
            self.input.consume(used);
            if done {
                break;
            }
        }

        Ok(if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.as_slice())
        })
    }

    fn next_number(&mut self) -> Result<Option<u32>> {
        let Some(token) = self.next_token()? else {
            return Ok(None);
        };
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .map(Some)
            .ok_or_else(|| {
                TrieError::malformed(format!(
                    "expected a decimal offset, found {:?}",
                    String::from_utf8_lossy(token)
                ))
            })
    }
}
