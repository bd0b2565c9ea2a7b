//! # ctxlm
//!
//! A memory-compact, context-encoded n-gram index for statistical language
//! models.
//!
//! Each n-gram is stored as one packed `u64`: its head word plus the slot
//! ("offset") its shorter context already occupies in the table one order
//! down. No n-gram ever stores its full word sequence, yet any stored offset
//! can be turned back into words, and every lookup is `order + 1` hash probes.
//!
//! ## Architecture
//!
//! - [`key`]: packs `(word, context offset)` into a [`PackedKey`]
//! - [`table`]: one fixed-capacity open-addressing [`OrderTable`] per order
//! - [`index`]: [`NgramIndexBuilder`] for ordered construction, [`NgramIndex`]
//!   for queries
//! - [`direction`]: whether the context is the prefix ([`Forward`]) or the
//!   suffix ([`Reversed`]) of an n-gram
//! - [`values`]: statistics live behind [`ValueContainer`], addressed by
//!   `(order, offset)`
//! - [`sizing`]: tables are sized up front from a [`SizingOracle`]
//!
//! ## Example
//!
//! ```rust
//! use ctxlm::{ArrayValues, Config, NgramCounts, NgramIndexBuilder};
//!
//! // <s>=0 dog=1 runs=2 </s>=3
//! let counts = NgramCounts::new(4, vec![4, 1, 1]);
//! let mut builder: NgramIndexBuilder<ArrayValues<u32>> =
//!     NgramIndexBuilder::new(&Config::default(), &counts, ArrayValues::new())?;
//!
//! for word in 0..4 {
//!     builder.insert(&[word], 1)?;
//! }
//! builder.insert(&[0, 1], 1)?;
//! let t0 = builder.insert(&[0, 1, 2], 1)?.expect("context is stored");
//!
//! let index = builder.finish();
//! assert_eq!(index.reconstruct(t0, 2, 2)?.as_slice(), &[0, 1, 2]);
//! assert_eq!(index.lookup_ngram(&[1, 2]), None);
//! # Ok::<(), ctxlm::Error>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

pub mod direction;
pub mod error;
pub mod index;
pub mod key;
pub mod sizing;
pub mod table;
pub mod values;

pub use direction::{Direction, Forward, Reversed};
pub use error::{Error, Result};
pub use index::{NgramIndex, NgramIndexBuilder, NgramWords, ResolvedContext};
pub use key::{KeyLayout, Offset, PackedKey, WordId};
pub use sizing::{NgramCounts, SizingOracle};
pub use table::OrderTable;
pub use values::{ArrayValues, ProbBackoff, ProbBackoffValues, SlotLink, ValueContainer};

use serde::{Deserialize, Serialize};

/// Configuration shared by every table of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound on entries / capacity for each table; trades memory for
    /// probe length. Must be in `(0, 1)`.
    pub max_load_factor: f64,
    /// High bits of a packed key given to the word id. The remaining bits hold
    /// the context offset.
    pub word_bits: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_load_factor: 0.7,
            word_bits: KeyLayout::DEFAULT_WORD_BITS,
        }
    }
}

impl Config {
    /// Validate the configuration before any table is allocated.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_load_factor > 0.0 && self.max_load_factor < 1.0) {
            return Err(Error::invalid_config(format!(
                "max_load_factor must be in (0, 1), got {}",
                self.max_load_factor
            )));
        }
        self.key_layout().map(|_| ())
    }

    /// Key layout described by `word_bits`.
    pub fn key_layout(&self) -> Result<KeyLayout> {
        KeyLayout::new(self.word_bits)
    }
}

/// Occupancy of a single order's table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderStats {
    /// Zero-based order
    pub order: usize,
    /// Stored n-grams
    pub len: u64,
    /// Slots allocated
    pub capacity: u64,
    /// `len / capacity`
    pub load_factor: f64,
    /// Bytes held by the slot array
    pub table_bytes: usize,
}

/// Memory usage statistics for the index tables.
///
/// Value-container memory is not included; containers report their own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexStats {
    pub orders: Vec<OrderStats>,
    /// Stored n-grams across all orders
    pub num_ngrams: u64,
    /// Bytes held by all slot arrays
    pub table_bytes: usize,
    /// Bytes per stored n-gram (calculated)
    pub bytes_per_ngram: f64,
}

impl IndexStats {
    pub(crate) fn from_orders(orders: Vec<OrderStats>) -> Self {
        let num_ngrams = orders.iter().map(|o| o.len).sum();
        let table_bytes = orders.iter().map(|o| o.table_bytes).sum();
        Self {
            orders,
            num_ngrams,
            table_bytes,
            bytes_per_ngram: if num_ngrams > 0 {
                table_bytes as f64 / num_ngrams as f64
            } else {
                0.0
            },
        }
    }
}


#[cfg(test)]
mod proptests;
