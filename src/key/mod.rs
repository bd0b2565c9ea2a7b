//! Packed n-gram keys.
//!
//! An n-gram is never stored as its word sequence. Each table entry is a
//! single `u64` holding the n-gram's head word in the high bits and the
//! offset of its (already stored) context in the low bits:
//!
//! ```text
//!  63            offset_bits   offset_bits-1               0
//! +------------------------+-------------------------------+
//! |         word           |        context offset         |
//! +------------------------+-------------------------------+
//! ```
//!
//! The split is fixed per index by [`KeyLayout`]. Bounds are checked once,
//! against the sizing counts, before any table is allocated.

use crate::error::{Error, Result};

/// Vocabulary entry id.
pub type WordId = u32;

/// Slot index in a per-order table. Doubles as the context offset referenced
/// by the next order and as the value-container address.
pub type Offset = u64;

/// A `(word, context offset)` pair packed into one `u64`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PackedKey(u64);

impl PackedKey {
    /// Empty-slot marker. In-bounds inputs never encode to all ones because
    /// offsets stop at `2^offset_bits - 2`.
    pub(crate) const EMPTY: PackedKey = PackedKey(u64::MAX);

    /// Wrap a raw key.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw packed value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) fn is_empty(self) -> bool {
        self.0 == Self::EMPTY.0
    }
}

/// Bit split between the word and context-offset halves of a key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KeyLayout {
    word_bits: u32,
}

impl KeyLayout {
    /// 26 word bits (~67M words) leave 38 offset bits (~275G slots per order).
    pub const DEFAULT_WORD_BITS: u32 = 26;

    /// Create a layout with `word_bits` high bits for the word.
    ///
    /// # Errors
    /// `word_bits` must be in `1..=32`, since words are `u32`.
    pub fn new(word_bits: u32) -> Result<Self> {
        if !(1..=32).contains(&word_bits) {
            return Err(Error::invalid_config(format!(
                "word_bits must be in 1..=32, got {word_bits}"
            )));
        }
        Ok(Self { word_bits })
    }

    #[inline]
    pub fn word_bits(self) -> u32 {
        self.word_bits
    }

    #[inline]
    pub fn offset_bits(self) -> u32 {
        64 - self.word_bits
    }

    #[inline]
    fn offset_mask(self) -> u64 {
        (1u64 << self.offset_bits()) - 1
    }

    /// Largest vocabulary the layout can address.
    pub fn max_vocab_size(self) -> u64 {
        1u64 << self.word_bits
    }

    /// Largest per-order table capacity the layout can address.
    pub fn max_capacity(self) -> u64 {
        self.offset_mask()
    }

    /// Check a vocabulary size and one table capacity against the layout.
    pub fn check_bounds(self, order: usize, vocab_size: u64, capacity: u64) -> Result<()> {
        if vocab_size > self.max_vocab_size() {
            return Err(Error::VocabularyTooLarge {
                vocab_size,
                word_bits: self.word_bits,
            });
        }
        if capacity > self.max_capacity() {
            return Err(Error::CapacityTooLarge {
                order,
                capacity,
                max: self.max_capacity(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn encode(self, word: WordId, context_offset: Offset) -> PackedKey {
        debug_assert!(u64::from(word) < self.max_vocab_size());
        debug_assert!(context_offset < self.max_capacity());
        PackedKey((u64::from(word) << self.offset_bits()) | context_offset)
    }

    #[inline]
    pub fn word_of(self, key: PackedKey) -> WordId {
        (key.0 >> self.offset_bits()) as WordId
    }

    #[inline]
    pub fn context_offset_of(self, key: PackedKey) -> Offset {
        key.0 & self.offset_mask()
    }

    #[inline]
    pub fn decode(self, key: PackedKey) -> (WordId, Offset) {
        (self.word_of(key), self.context_offset_of(key))
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self {
            word_bits: Self::DEFAULT_WORD_BITS,
        }
    }
}
