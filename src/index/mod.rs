//! Context-encoded n-gram index.
//!
//! Every n-gram of order `k` is stored in table `k` as
//! `encode(head_word, offset_of_context)`, where the context's offset comes
//! from table `k - 1`. Unigrams use the root offset `0`. Resolving an n-gram
//! is therefore a chain of `k + 1` single-key probes, and any stored offset
//! can be walked back down to its full word sequence.
//!
//! [`NgramIndexBuilder`] inserts; [`NgramIndex`] answers queries. The builder
//! dereferences to the index so queries also work mid-construction.

mod builder;

pub use builder::NgramIndexBuilder;

use std::marker::PhantomData;

use smallvec::{smallvec, SmallVec};

use crate::direction::{Direction, Forward};
use crate::error::{Error, Result};
use crate::key::{KeyLayout, Offset, PackedKey, WordId};
use crate::table::OrderTable;
use crate::values::ValueContainer;
use crate::{IndexStats, OrderStats};

/// Word sequence rebuilt from an offset. Stays inline up to 8-grams.
pub type NgramWords = SmallVec<[WordId; 8]>;

/// A context located in the index: its slot and the order of its table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedContext {
    pub offset: Offset,
    pub order: usize,
}

/// Read-only view of a built index.
///
/// All methods take `&self`; once finished the index can be shared across
/// threads freely.
pub struct NgramIndex<C, D = Forward> {
    pub(crate) tables: Box<[OrderTable]>,
    pub(crate) values: C,
    pub(crate) layout: KeyLayout,
    pub(crate) vocab_size: u32,
    pub(crate) _direction: PhantomData<D>,
}

impl<C: ValueContainer, D: Direction> NgramIndex<C, D> {
    /// Number of orders (the maximum n-gram length).
    #[inline]
    pub fn num_orders(&self) -> usize {
        self.tables.len()
    }

    #[inline]
    pub fn vocab_size(&self) -> u32 {
        self.vocab_size
    }

    #[inline]
    pub fn layout(&self) -> KeyLayout {
        self.layout
    }

    #[inline]
    pub fn is_reversed(&self) -> bool {
        D::REVERSED
    }

    #[inline]
    pub fn values(&self) -> &C {
        &self.values
    }

    pub fn table(&self, order: usize) -> Option<&OrderTable> {
        self.tables.get(order)
    }

    /// Number of n-grams stored for `order`.
    pub fn len(&self, order: usize) -> u64 {
        self.tables.get(order).map_or(0, OrderTable::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(OrderTable::is_empty)
    }

    #[inline]
    fn in_vocab(&self, word: WordId) -> bool {
        word < self.vocab_size
    }

    /// One chaining step: probe table `order` for `(word, context_offset)`.
    #[inline]
    fn step(&self, order: usize, context_offset: Offset, word: WordId) -> Option<Offset> {
        if !self.in_vocab(word) {
            return None;
        }
        let table = self.tables.get(order)?;
        table.get_offset(self.layout.encode(word, context_offset))
    }

    /// Fold the context of `ngram` down to an offset and pack it with the
    /// head word. `None` as soon as a step misses.
    pub(crate) fn resolve_key(&self, ngram: &[WordId]) -> Option<PackedKey> {
        let len = ngram.len();
        let mut context_offset = 0;
        for step in 0..len - 1 {
            context_offset = self.step(step, context_offset, ngram[D::context_pos(len, step)])?;
        }
        let head = ngram[D::head_pos(len)];
        self.in_vocab(head)
            .then(|| self.layout.encode(head, context_offset))
    }

    /// Offset of a whole n-gram, resolving its context first.
    pub fn lookup_ngram(&self, ngram: &[WordId]) -> Option<Offset> {
        if ngram.is_empty() || ngram.len() > self.num_orders() {
            return None;
        }
        let key = self.resolve_key(ngram)?;
        self.tables[ngram.len() - 1].get_offset(key)
    }

    /// Offset of `word` following an already-resolved context.
    ///
    /// `None` as the context means no context at all, so the unigram table is
    /// probed. Otherwise the table of `context.order + 1` is probed. A single
    /// probe sequence, no chaining.
    pub fn lookup_exact(&self, context: Option<ResolvedContext>, word: WordId) -> Option<Offset> {
        match context {
            None => self.step(0, 0, word),
            Some(ctx) => {
                // Offsets past the context table's capacity would spill into
                // the word bits of the key.
                if ctx.offset >= self.tables.get(ctx.order)?.capacity() {
                    return None;
                }
                self.step(ctx.order + 1, ctx.offset, word)
            }
        }
    }

    /// [`lookup_exact`](Self::lookup_exact), also copying the stored value
    /// into `out` when found.
    pub fn lookup_exact_with_value(
        &self,
        context: Option<ResolvedContext>,
        word: WordId,
        out: &mut C::Value,
    ) -> Option<Offset> {
        let offset = self.lookup_exact(context, word)?;
        let order = context.map_or(0, |c| c.order + 1);
        self.values.get_into(order, offset, out);
        Some(offset)
    }

    /// Longest stored suffix of `ngram[start..end]`, grown one word at a time
    /// from `end - 1` outward.
    ///
    /// Pass the context of the word being scored, not the word itself. `None`
    /// means not even `ngram[end - 1]` is known.
    ///
    /// # Panics
    /// If `start..end` is not a valid range of `ngram`.
    pub fn longest_context_match(
        &self,
        ngram: &[WordId],
        start: usize,
        end: usize,
    ) -> Option<ResolvedContext> {
        assert!(
            start <= end && end <= ngram.len(),
            "range {start}..{end} out of bounds for n-gram of length {}",
            ngram.len()
        );
        D::longest_context_match(self, ngram, start, end)
    }

    /// Rebuild the words of the n-gram stored at `offset` in table `order`,
    /// whose head word is `word`.
    ///
    /// # Errors
    /// [`Error::OrderOutOfRange`] for an unknown order, [`Error::InvalidSlot`]
    /// if any slot on the chain is empty or the head word does not match.
    pub fn reconstruct(&self, offset: Offset, order: usize, word: WordId) -> Result<NgramWords> {
        if order >= self.num_orders() {
            return Err(Error::OrderOutOfRange {
                order,
                num_orders: self.num_orders(),
            });
        }
        let len = order + 1;
        let mut words: NgramWords = smallvec![0; len];
        let mut current = offset;
        for depth in 0..len {
            let level = order - depth;
            let key = self.tables[level]
                .get_key(current)
                .ok_or(Error::InvalidSlot {
                    order: level,
                    offset: current,
                })?;
            let (w, context_offset) = self.layout.decode(key);
            if depth == 0 && w != word {
                return Err(Error::InvalidSlot { order, offset });
            }
            words[D::reconstruct_pos(len, depth)] = w;
            current = context_offset;
        }
        Ok(words)
    }

    /// Every stored n-gram of `order` with its offset, in slot order.
    pub fn ngrams(&self, order: usize) -> impl Iterator<Item = (Offset, NgramWords)> + '_ {
        self.tables
            .get(order)
            .into_iter()
            .flat_map(|table| table.iter())
            .filter_map(move |(slot, key)| {
                let words = self.reconstruct(slot, order, self.layout.word_of(key)).ok()?;
                Some((slot, words))
            })
    }

    /// Value stored for `(order, offset)`.
    pub fn value(&self, order: usize, offset: Offset) -> Option<C::Value>
    where
        C::Value: Default,
    {
        self.values.get(order, offset)
    }

    /// Copy the value stored for `(order, offset)` into `out`.
    pub fn value_into(&self, order: usize, offset: Offset, out: &mut C::Value) -> bool {
        self.values.get_into(order, offset, out)
    }

    /// Per-order occupancy and table memory.
    pub fn stats(&self) -> IndexStats {
        let orders: Vec<OrderStats> = self
            .tables
            .iter()
            .map(|t| OrderStats {
                order: t.order(),
                len: t.len(),
                capacity: t.capacity(),
                load_factor: t.load_factor(),
                table_bytes: t.memory_usage(),
            })
            .collect();
        IndexStats::from_orders(orders)
    }
}
