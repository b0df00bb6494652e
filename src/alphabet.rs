//! Alphabet and byte-to-edge translation table.

use crate::error::{Result, TrieError};

/// A fixed sequence of `A` distinct bytes labelling the edges of a trie.
///
/// Letter `i` of the alphabet labels edge `i` of every node, so the alphabet
/// order is also the enumeration order of [`MerTrie::mers`](crate::MerTrie::mers).
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet<const A: usize> {
    letters: [u8; A],
    /// Edge index of every byte value, `None` outside the alphabet.
    translate: [Option<u8>; 256],
}

impl<const A: usize> Alphabet<A> {
    const SIZE_OK: () = assert!(A > 0 && A <= 256, "alphabet size must be in 1..=256");

    pub fn new(bytes: &[u8]) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let () = Self::SIZE_OK;

        if bytes.len() != A {
            return Err(TrieError::AlphabetLength {
                expected: A,
                actual: bytes.len(),
            });
        }

        let mut letters = [0u8; A];
        let mut translate = [None; 256];
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                return Err(TrieError::LineFeedInAlphabet);
            }
            if translate[b as usize].is_some() {
                return Err(TrieError::DuplicateLetter(b));
            }
            // A <= 256, so every index fits a byte.
            translate[b as usize] = Some(i as u8);
            letters[i] = b;
        }

        Ok(Self { letters, translate })
    }

    #[inline]
    pub fn index(&self, byte: u8) -> Option<usize> {
        self.translate[byte as usize].map(usize::from)
    }

    #[inline]
    pub fn letter(&self, index: usize) -> u8 {
        self.letters[index]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.letters
    }

    /// Translate every byte of `s`, failing on the first byte outside the
    /// alphabet.
    pub fn translate(&self, s: &[u8]) -> Result<Vec<usize>> {
        s.iter()
            .enumerate()
            .map(|(position, &byte)| {
                self.index(byte)
                    .ok_or(TrieError::InvalidLetter { byte, position })
            })
            .collect()
    }
}

impl<const A: usize> std::fmt::Debug for Alphabet<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Alphabet({:?})", String::from_utf8_lossy(&self.letters))
    }
}
