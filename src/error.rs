//! Error types for ctxlm

use thiserror::Error;

use crate::key::Offset;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Index error type.
///
/// Missing contexts are not errors: lookups return `None` and
/// [`NgramIndexBuilder::insert`](crate::NgramIndexBuilder::insert) returns
/// `Ok(None)`. Everything here is either a configuration mistake or a
/// precondition the caller violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration rejected before construction
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Vocabulary does not fit in the configured word bits
    #[error("Vocabulary of {vocab_size} words does not fit in {word_bits} word bits")]
    VocabularyTooLarge { vocab_size: u64, word_bits: u32 },

    /// A table would hold more slots than the offset bits can address
    #[error("Order {order} needs capacity {capacity}, but offsets are limited to {max}")]
    CapacityTooLarge { order: usize, capacity: u64, max: u64 },

    /// A table ran out of free slots (the expected counts were too low)
    #[error("Table for order {order} is full (capacity {capacity})")]
    CapacityOverflow { order: usize, capacity: u64 },

    /// Order beyond the orders the index was sized for
    #[error("Order {order} is out of range (index has {num_orders} orders)")]
    OrderOutOfRange { order: usize, num_orders: usize },

    /// Zero-length n-gram
    #[error("Empty n-gram")]
    EmptyNgram,

    /// Insert into an order that has already been finalized
    #[error("Order {order} is finalized and read-only")]
    OrderFinalized { order: usize },

    /// Slot that does not hold the expected entry
    #[error("Invalid slot {offset} for order {order}")]
    InvalidSlot { order: usize, offset: Offset },
}

impl Error {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}
