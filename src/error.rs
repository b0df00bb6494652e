//! Error types for trie construction, queries and the stream format.

use thiserror::Error;

/// Errors surfaced by [`MerTrie`](crate::MerTrie) operations.
#[derive(Debug, Error)]
pub enum TrieError {
    /// Alphabet string does not have exactly `A` letters.
    #[error("alphabet must have exactly {expected} letters, got {actual}")]
    AlphabetLength { expected: usize, actual: usize },

    /// The same byte appears twice in the alphabet.
    #[error("alphabet letter {0:#04x} appears more than once")]
    DuplicateLetter(u8),

    /// The alphabet is written as a single line of the stream format.
    #[error("alphabet may not contain a line feed")]
    LineFeedInAlphabet,

    /// A byte of an input mer has no edge index.
    #[error("byte {byte:#04x} at position {position} is not in the alphabet")]
    InvalidLetter { byte: u8, position: usize },

    /// Structurally invalid serialized trie.
    #[error("malformed stream: {0}")]
    MalformedStream(String),

    /// The stream ended in the middle of node `node`.
    #[error("stream ended inside node {node}")]
    IncompleteStream { node: usize },

    /// Allocating another node would overflow the offset type.
    #[error("node arena exhausted")]
    ArenaExhausted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrieError {
    /// True for every variant rejecting an alphabet.
    pub fn is_invalid_alphabet(&self) -> bool {
        matches!(
            self,
            TrieError::AlphabetLength { .. }
                | TrieError::DuplicateLetter(_)
                | TrieError::LineFeedInAlphabet
        )
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        TrieError::MalformedStream(msg.into())
    }
}

/// Result type for trie operations.
pub type Result<T> = std::result::Result<T, TrieError>;
