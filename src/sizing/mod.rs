//! Expected table sizes, supplied before construction.

use rustc_hash::FxHashSet;

use crate::key::WordId;

/// Source of the vocabulary size and per-order entry counts an index is
/// sized from.
///
/// Over-counting wastes memory. Under-counting pushes tables past their load
/// factor and, in the worst case, into [`Error::CapacityOverflow`](crate::Error::CapacityOverflow).
pub trait SizingOracle {
    /// Number of word ids; valid words are `0..vocab_size`.
    fn vocab_size(&self) -> u32;

    /// Expected distinct n-grams per order. Its length is the number of orders.
    fn expected_counts(&self) -> &[u64];
}

/// Plain vector of counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NgramCounts {
    vocab_size: u32,
    counts: Vec<u64>,
}

impl NgramCounts {
    pub fn new(vocab_size: u32, counts: Vec<u64>) -> Self {
        Self { vocab_size, counts }
    }

    /// Count distinct n-grams per length. The number of orders is the
    /// longest n-gram seen.
    pub fn from_ngrams<'a, I>(vocab_size: u32, ngrams: I) -> Self
    where
        I: IntoIterator<Item = &'a [WordId]>,
    {
        let mut seen: Vec<FxHashSet<&'a [WordId]>> = Vec::new();
        for ngram in ngrams {
            if ngram.is_empty() {
                continue;
            }
            let order = ngram.len() - 1;
            if order >= seen.len() {
                seen.resize_with(order + 1, FxHashSet::default);
            }
            seen[order].insert(ngram);
        }
        Self {
            vocab_size,
            counts: seen.iter().map(|s| s.len() as u64).collect(),
        }
    }

    pub fn num_orders(&self) -> usize {
        self.counts.len()
    }
}

impl SizingOracle for NgramCounts {
    fn vocab_size(&self) -> u32 {
        self.vocab_size
    }

    fn expected_counts(&self) -> &[u64] {
        &self.counts
    }
}
