//! Which end of an n-gram is its context.
//!
//! The choice is made once per index, as a type parameter, so none of the
//! chaining code branches on it at runtime.
//!
//! | | context | head word | backoff n-gram |
//! |---|---|---|---|
//! | [`Forward`] | `ngram[..n-1]` | `ngram[n-1]` | `ngram[1..]` |
//! | [`Reversed`] | `ngram[1..]` | `ngram[0]` | `ngram[..n-1]` |

use std::ops::Range;

use crate::index::{NgramIndex, ResolvedContext};
use crate::key::WordId;
use crate::values::ValueContainer;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Forward {}
    impl Sealed for super::Reversed {}
}

/// Context direction strategy. Implemented by [`Forward`] and [`Reversed`].
pub trait Direction: sealed::Sealed + Copy + Default + Send + Sync + 'static {
    /// Whether the context is the suffix of the n-gram.
    const REVERSED: bool;

    /// Position of the context word resolved at chaining step `step`, for an
    /// n-gram of `len` words. Step `k` probes the table of order `k`.
    fn context_pos(len: usize, step: usize) -> usize;

    /// Position of the head word.
    fn head_pos(len: usize) -> usize;

    /// Sub-range holding the (order-1)-gram used for backoff.
    fn backoff_range(len: usize) -> Range<usize>;

    /// Output position of the word read `depth` levels below the head while
    /// reconstructing an n-gram of `len` words.
    fn reconstruct_pos(len: usize, depth: usize) -> usize;

    /// Longest stored suffix of `ngram[start..end]`.
    fn longest_context_match<C: ValueContainer>(
        index: &NgramIndex<C, Self>,
        ngram: &[WordId],
        start: usize,
        end: usize,
    ) -> Option<ResolvedContext>;
}

/// Context is the prefix; keys chain left to right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Forward;

/// Context is the suffix; keys chain right to left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reversed;

impl Direction for Forward {
    const REVERSED: bool = false;

    #[inline]
    fn context_pos(_len: usize, step: usize) -> usize {
        step
    }

    #[inline]
    fn head_pos(len: usize) -> usize {
        len - 1
    }

    #[inline]
    fn backoff_range(len: usize) -> Range<usize> {
        1..len
    }

    #[inline]
    fn reconstruct_pos(len: usize, depth: usize) -> usize {
        len - 1 - depth
    }

    /// A forward key for `ngram[s..end]` shares nothing with the key for
    /// `ngram[s+1..end]`, so every candidate suffix is folded from scratch.
    fn longest_context_match<C: ValueContainer>(
        index: &NgramIndex<C, Self>,
        ngram: &[WordId],
        start: usize,
        end: usize,
    ) -> Option<ResolvedContext> {
        let mut best = None;
        for s in (start..end).rev() {
            let order = end - s - 1;
            if order >= index.num_orders() {
                break;
            }
            match index.lookup_ngram(&ngram[s..end]) {
                Some(offset) => best = Some(ResolvedContext { offset, order }),
                None => break,
            }
        }
        best
    }
}

impl Direction for Reversed {
    const REVERSED: bool = true;

    #[inline]
    fn context_pos(len: usize, step: usize) -> usize {
        len - 1 - step
    }

    #[inline]
    fn head_pos(_len: usize) -> usize {
        0
    }

    #[inline]
    fn backoff_range(len: usize) -> Range<usize> {
        0..len - 1
    }

    #[inline]
    fn reconstruct_pos(_len: usize, depth: usize) -> usize {
        depth
    }

    /// Extending a reversed suffix by one word to the left is exactly one
    /// more chaining step, so the previous offset is threaded forward.
    fn longest_context_match<C: ValueContainer>(
        index: &NgramIndex<C, Self>,
        ngram: &[WordId],
        start: usize,
        end: usize,
    ) -> Option<ResolvedContext> {
        let mut best: Option<ResolvedContext> = None;
        for (order, pos) in (start..end).rev().enumerate() {
            if order >= index.num_orders() {
                break;
            }
            match index.lookup_exact(best, ngram[pos]) {
                Some(offset) => best = Some(ResolvedContext { offset, order }),
                None => break,
            }
        }
        best
    }
}
