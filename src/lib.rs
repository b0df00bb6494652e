//! # mertrie
//!
//! An arena-backed, prefix-closed trie over a fixed alphabet.
//!
//! Inserting a mer `s` implicitly inserts every extension of `s`: the whole
//! subtree below `s` collapses into a single edge to a shared FINAL sentinel.
//! This keeps large combinatorial sets (every k-mer starting with a given
//! prefix, say) small, and answers containment queries in both directions.
//!
//! ## Example
//!
//! ```rust
//! use mertrie::{Found, MerTrie};
//!
//! let mut trie: MerTrie<4> = MerTrie::new(b"ACGT")?;
//! trie.insert(b"AC")?;
//! trie.insert(b"GT")?;
//!
//! assert_eq!(trie.find(b"A")?, Found::PrefixOf);
//! assert_eq!(trie.find(b"ACGTA")?, Found::HasPrefix);
//! assert_eq!(trie.find(b"AG")?, Found::Not);
//!
//! assert_eq!(trie.all_mers(2), vec![b"AC".to_vec(), b"GT".to_vec()]);
//! assert_eq!(trie.size(3), 8.0);
//! # Ok::<(), mertrie::TrieError>(())
//! ```

#![deny(unsafe_code)]

mod alphabet;
mod arena;
mod error;
mod mers;
mod serial;

use std::io::Write;
use std::str::FromStr;

use tracing::debug;

pub use alphabet::Alphabet;
pub use arena::Offset;
pub use error::{Result, TrieError};
pub use mers::{LineSink, MerSink, Mers};

use arena::{Arena, Node, State, FINAL_OFFSET, ROOT_OFFSET};

/// Outcome of [`MerTrie::find`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Found {
    /// Neither the query nor any of its prefixes is stored.
    Not,
    /// A stored mer is a prefix of the query (or the query itself).
    HasPrefix,
    /// The query is a strict prefix of some stored mer.
    PrefixOf,
}

/// Prefix-closed set of mers over an alphabet of `A` letters.
///
/// Nodes live in one arena and refer to each other by offset. Reclaimed
/// subtrees go on a free list and are reused before the arena grows; the
/// arena itself only shrinks through [`MerTrie::compact`].
#[derive(Clone)]
pub struct MerTrie<const A: usize> {
    alphabet: Alphabet<A>,
    arena: Arena<A>,
}

impl<const A: usize> MerTrie<A> {
    /// Empty trie over `alphabet`, which must hold exactly `A` distinct
    /// bytes.
    pub fn new(alphabet: &[u8]) -> Result<Self> {
        Ok(Self {
            alphabet: Alphabet::new(alphabet)?,
            arena: Arena::new(),
        })
    }

    /// Empty trie with room for `nodes` arena slots.
    pub fn with_capacity(alphabet: &[u8], nodes: usize) -> Result<Self> {
        Ok(Self {
            alphabet: Alphabet::new(alphabet)?,
            arena: Arena::with_capacity(nodes),
        })
    }

    #[inline]
    pub fn alphabet(&self) -> &Alphabet<A> {
        &self.alphabet
    }

    /// True when no mer has been inserted.
    pub fn is_empty(&self) -> bool {
        !self.arena.node(ROOT_OFFSET).has_children()
    }

    /// Number of arena slots, including root, sentinel and free slots.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Number of slots waiting on the free list.
    pub fn free_count(&self) -> usize {
        self.arena.free_len()
    }

    pub fn memory_usage(&self) -> usize {
        self.arena.capacity_bytes()
    }

    pub fn shrink_to_fit(&mut self) {
        self.arena.shrink_to_fit();
    }

    /// Insert `s` and, implicitly, every extension of it.
    ///
    /// Inserting a prefix of mers already stored reclaims their subtree.
    /// Inserting an extension of a stored mer changes nothing. `s` is
    /// validated before the trie is touched, so an `InvalidLetter` error
    /// leaves the trie unchanged.
    pub fn insert(&mut self, s: &[u8]) -> Result<()> {
        let path = self.alphabet.translate(s)?;
        let Some((&last, init)) = path.split_last() else {
            return Ok(());
        };

        let mut cur = ROOT_OFFSET;
        for &idx in init {
            let node = self.arena.node(cur);
            debug_assert_ne!(node.state, State::Empty, "walked into an EMPTY node");
            if node.is_final() {
                return Ok(());
            }
            let next = node.edges[idx];
            cur = if next == 0 {
                let fresh = self.arena.next_empty_node()?;
                self.arena.node_mut(cur).edges[idx] = fresh;
                fresh
            } else {
                next
            };
        }

        let node = self.arena.node(cur);
        debug_assert_ne!(node.state, State::Empty, "walked into an EMPTY node");
        if node.is_final() {
            return Ok(());
        }
        let next = node.edges[last];
        if next != 0 && next != FINAL_OFFSET {
            self.arena.delete_subtree(next);
        }
        self.arena.node_mut(cur).edges[last] = FINAL_OFFSET;
        Ok(())
    }

    /// Insert every mer of `mers`, stopping at the first error.
    pub fn insert_all<I, S>(&mut self, mers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        for mer in mers {
            self.insert(mer.as_ref())?;
        }
        Ok(())
    }

    /// Locate `s` relative to the stored mers.
    ///
    /// The empty query is a prefix of everything and always yields
    /// [`Found::PrefixOf`].
    pub fn find(&self, s: &[u8]) -> Result<Found> {
        let mut cur = self.arena.node(ROOT_OFFSET);
        for (position, &byte) in s.iter().enumerate() {
            debug_assert_ne!(cur.state, State::Empty, "walked into an EMPTY node");
            if cur.is_final() {
                return Ok(Found::HasPrefix);
            }
            let idx = self
                .alphabet
                .index(byte)
                .ok_or(TrieError::InvalidLetter { byte, position })?;
            let next = cur.edges[idx];
            if next == 0 {
                return Ok(Found::Not);
            }
            cur = self.arena.node(next);
        }

        debug_assert_ne!(cur.state, State::Empty, "walked into an EMPTY node");
        Ok(if cur.is_final() {
            Found::HasPrefix
        } else {
            Found::PrefixOf
        })
    }

    /// True when `s` or one of its prefixes is stored.
    pub fn contains(&self, s: &[u8]) -> Result<bool> {
        Ok(self.find(s)? == Found::HasPrefix)
    }

    /// Number of mers of length `depth`, i.e. `self.mers(depth).count()`,
    /// computed without enumerating them.
    ///
    /// The count grows like `A^depth`; it is exact up to 2^53 and rounds
    /// beyond. See [`MerTrie::count`] for an exact variant.
    pub fn size(&self, depth: usize) -> f64 {
        self.size_at(depth, ROOT_OFFSET)
    }

    fn size_at(&self, depth: usize, start: Offset) -> f64 {
        let node = self.arena.node(start);
        if depth == 0 || node.is_final() {
            return pow_f64(A, depth);
        }
        node.edges
            .iter()
            .filter(|&&e| e != 0)
            .map(|&e| self.size_at(depth - 1, e))
            .sum()
    }

    /// Exact number of mers of length `depth`, `None` if it overflows `u128`.
    pub fn count(&self, depth: usize) -> Option<u128> {
        self.count_at(depth, ROOT_OFFSET)
    }

    fn count_at(&self, depth: usize, start: Offset) -> Option<u128> {
        let node = self.arena.node(start);
        if depth == 0 || node.is_final() {
            return pow_u128(A, depth);
        }
        let mut total = 0u128;
        for &e in node.edges.iter().filter(|&&e| e != 0) {
            total = total.checked_add(self.count_at(depth - 1, e)?)?;
        }
        Some(total)
    }

    /// Lazily enumerate every mer of length `depth` in alphabet order.
    pub fn mers(&self, depth: usize) -> Mers<'_, A> {
        Mers::new(self, depth)
    }

    /// Every mer of length `depth`, in alphabet order.
    pub fn all_mers(&self, depth: usize) -> Vec<Vec<u8>> {
        self.mers(depth).collect()
    }

    /// Feed every mer of length `depth` to `sink`, in alphabet order.
    pub fn all_mers_into<S: MerSink + ?Sized>(&self, depth: usize, sink: &mut S) -> Result<()> {
        for mer in self.mers(depth) {
            sink.push_mer(&mer)?;
        }
        Ok(())
    }

    /// Write every mer of length `depth` to `out`, one per line.
    pub fn write_mers<W: Write>(&self, depth: usize, out: W) -> Result<()> {
        let mut sink = LineSink::new(out);
        self.all_mers_into(depth, &mut sink)?;
        sink.into_inner().flush()?;
        Ok(())
    }

    /// Rebuild the arena with only the live nodes, in depth-first order,
    /// dropping the free list. Returns the number of slots released.
    pub fn compact(&mut self) -> usize {
        let before = self.arena.len();
        let old = std::mem::replace(&mut self.arena, Arena::new());

        // (old node, new node) pairs whose edges still need copying.
        let mut stack: Vec<(Offset, Offset)> = vec![(ROOT_OFFSET, ROOT_OFFSET)];
        while let Some((old_off, new_off)) = stack.pop() {
            let edges = old.node(old_off).edges;
            let mut pending = Vec::new();
            for (idx, &e) in edges.iter().enumerate() {
                let target = match e {
                    0 => continue,
                    FINAL_OFFSET => FINAL_OFFSET,
                    _ => {
                        // Never longer than the old arena, whose offsets fit.
                        let fresh = self.arena.len() as Offset;
                        self.arena.nodes.push(Node::new(State::Internal));
                        pending.push((e, fresh));
                        fresh
                    }
                };
                self.arena.node_mut(new_off).edges[idx] = target;
            }
            stack.extend(pending.into_iter().rev());
        }

        let released = before - self.arena.len();
        debug!(before, after = self.arena.len(), "compacted trie arena");
        released
    }
}

#[inline]
fn pow_f64(base: usize, exp: usize) -> f64 {
    // Past i32::MAX the result is already 1 or +inf.
    (base as f64).powi(exp.min(i32::MAX as usize) as i32)
}

#[inline]
fn pow_u128(base: usize, exp: usize) -> Option<u128> {
    if base == 1 {
        return Some(1);
    }
    u32::try_from(exp)
        .ok()
        .and_then(|exp| (base as u128).checked_pow(exp))
}

/// Structural equality: both tries have the same edges present at every
/// node reachable from the root. Alphabets are not compared.
impl<const A: usize> PartialEq for MerTrie<A> {
    fn eq(&self, other: &Self) -> bool {
        let mut stack: Vec<(Offset, Offset)> = vec![(ROOT_OFFSET, ROOT_OFFSET)];
        while let Some((l, r)) = stack.pop() {
            let ln = self.arena.node(l);
            let rn = other.arena.node(r);
            match (ln.is_final(), rn.is_final()) {
                (true, true) => continue,
                (false, false) => {}
                _ => return false,
            }
            for (&le, &re) in ln.edges.iter().zip(rn.edges.iter()) {
                match (le, re) {
                    (0, 0) => {}
                    (0, _) | (_, 0) => return false,
                    _ => stack.push((le, re)),
                }
            }
        }
        true
    }
}

impl<const A: usize> Eq for MerTrie<A> {}

impl<const A: usize> std::fmt::Debug for MerTrie<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerTrie")
            .field("alphabet", &self.alphabet)
            .field("nodes", &self.node_count())
            .field("free", &self.free_count())
            .finish()
    }
}

impl<const A: usize> FromStr for MerTrie<A> {
    type Err = TrieError;

    /// Empty trie over the alphabet `s`.
    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.as_bytes())
    }
}

impl<const A: usize> TryFrom<&str> for MerTrie<A> {
    type Error = TrieError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s.as_bytes())
    }
}

impl<const A: usize> TryFrom<&[u8]> for MerTrie<A> {
    type Error = TrieError;

    fn try_from(s: &[u8]) -> Result<Self> {
        Self::new(s)
    }
}


#[cfg(test)]
mod proptests;
