//! Depth-indexed enumeration of stored mers and the sinks that receive them.

use std::io::{self, Write};

use crate::arena::{Offset, ROOT_OFFSET};
use crate::MerTrie;

/// Anything that accepts finished mers, one at a time, in enumeration order.
pub trait MerSink {
    fn push_mer(&mut self, mer: &[u8]) -> io::Result<()>;
}

impl MerSink for Vec<Vec<u8>> {
    fn push_mer(&mut self, mer: &[u8]) -> io::Result<()> {
        self.push(mer.to_vec());
        Ok(())
    }
}

/// Letters outside ASCII are replaced lossily.
impl MerSink for Vec<String> {
    fn push_mer(&mut self, mer: &[u8]) -> io::Result<()> {
        self.push(String::from_utf8_lossy(mer).into_owned());
        Ok(())
    }
}

/// Writes each mer on its own `\n`-terminated line.
pub struct LineSink<W> {
    out: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MerSink for LineSink<W> {
    fn push_mer(&mut self, mer: &[u8]) -> io::Result<()> {
        self.out.write_all(mer)?;
        self.out.write_all(b"\n")
    }
}

#[derive(Clone, Copy)]
struct Frame {
    node: Offset,
    /// Next edge index to try.
    next: usize,
}

/// Iterator over every mer of a fixed length, in alphabet order.
///
/// Created by [`MerTrie::mers`]. The walk keeps one frame per letter of the
/// current prefix; the final sentinel is revisited for every letter so that
/// a stored prefix yields all of its extensions.
pub struct Mers<'a, const A: usize> {
    trie: &'a MerTrie<A>,
    depth: usize,
    mer: Vec<u8>,
    stack: Vec<Frame>,
    /// Pending empty mer for `depth == 0`.
    empty: bool,
}

impl<'a, const A: usize> Mers<'a, A> {
    pub(crate) fn new(trie: &'a MerTrie<A>, depth: usize) -> Self {
        let mut stack = Vec::new();
        if depth > 0 {
            stack.push(Frame {
                node: ROOT_OFFSET,
                next: 0,
            });
        }
        Self {
            trie,
            depth,
            mer: Vec::with_capacity(depth),
            stack,
            empty: depth == 0,
        }
    }
}

impl<'a, const A: usize> Iterator for Mers<'a, A> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.empty {
            self.empty = false;
            return Some(Vec::new());
        }

        let trie = self.trie;
        while let Some(top) = self.stack.last_mut() {
            if top.next >= A {
                self.stack.pop();
                self.mer.pop();
                continue;
            }

            let idx = top.next;
            top.next += 1;
            let node = trie.arena.node(top.node);
            let child = if node.is_final() {
                top.node
            } else {
                node.edges[idx]
            };
            if child == 0 {
                continue;
            }

            self.mer.push(trie.alphabet.letter(idx));
            if self.mer.len() == self.depth {
                let out = self.mer.clone();
                self.mer.pop();
                return Some(out);
            }
            self.stack.push(Frame {
                node: child,
                next: 0,
            });
        }
        None
    }
}

impl<const A: usize> std::iter::FusedIterator for Mers<'_, A> {}
