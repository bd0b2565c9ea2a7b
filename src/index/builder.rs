use std::marker::PhantomData;
use std::ops::Deref;

use crate::direction::{Direction, Forward};
use crate::error::{Error, Result};
use crate::key::{Offset, WordId};
use crate::sizing::SizingOracle;
use crate::table::OrderTable;
use crate::values::{SlotLink, ValueContainer};
use crate::Config;

use super::NgramIndex;

/// Builds an [`NgramIndex`] one order at a time.
///
/// Every n-gram's context must be inserted before the n-gram itself, so
/// construction goes all unigrams, then all bigrams, and so on. Starting a
/// higher order finalizes every lower one.
pub struct NgramIndexBuilder<C, D = Forward> {
    index: NgramIndex<C, D>,
    finalized: Vec<bool>,
    /// Highest order an insert has reached.
    current_order: usize,
}

impl<C: ValueContainer, D: Direction> NgramIndexBuilder<C, D> {
    /// Allocate one table per order, sized from `oracle`.
    ///
    /// # Errors
    /// Rejects invalid configs, an empty count vector, and vocabularies or
    /// capacities that do not fit the key layout. Nothing is allocated if any
    /// check fails.
    pub fn new(config: &Config, oracle: &impl SizingOracle, mut values: C) -> Result<Self> {
        config.validate()?;
        let layout = config.key_layout()?;
        let counts = oracle.expected_counts();
        if counts.is_empty() {
            return Err(Error::invalid_config("expected counts must cover at least one order"));
        }
        let vocab_size = oracle.vocab_size();

        for (order, &expected) in counts.iter().enumerate() {
            let capacity = OrderTable::capacity_for(expected, config.max_load_factor);
            layout.check_bounds(order, u64::from(vocab_size), capacity)?;
        }

        let tables: Box<[OrderTable]> = counts
            .iter()
            .enumerate()
            .map(|(order, &expected)| {
                OrderTable::with_expected(order, expected, config.max_load_factor)
            })
            .collect();
        for table in tables.iter() {
            values.reserve(table.order(), table.capacity());
        }

        tracing::debug!(
            num_orders = tables.len(),
            vocab_size,
            reversed = D::REVERSED,
            max_load_factor = config.max_load_factor,
            "Created n-gram index builder"
        );

        Ok(Self {
            finalized: vec![false; tables.len()],
            index: NgramIndex {
                tables,
                values,
                layout,
                vocab_size,
                _direction: PhantomData,
            },
            current_order: 0,
        })
    }

    /// Insert `ngram` with its `value` and return its slot.
    ///
    /// Returns `Ok(None)` without touching any table when part of the
    /// n-gram's context has not been inserted, or when any word is outside
    /// the vocabulary. Inserting an n-gram that is already present returns
    /// its existing slot and overwrites the value.
    ///
    /// # Errors
    /// [`Error::EmptyNgram`], [`Error::OrderOutOfRange`],
    /// [`Error::OrderFinalized`], and [`Error::CapacityOverflow`] when the
    /// table is full.
    pub fn insert(&mut self, ngram: &[WordId], value: C::Value) -> Result<Option<Offset>> {
        if ngram.is_empty() {
            return Err(Error::EmptyNgram);
        }
        let order = ngram.len() - 1;
        self.check_open(order)?;
        self.advance_to(order);

        let Some(key) = self.index.resolve_key(ngram) else {
            tracing::trace!(
                order,
                ?ngram,
                "Context not stored or word out of vocabulary; skipping n-gram"
            );
            return Ok(None);
        };
        let slot = self.index.tables[order].put(key)?;
        let backoff_offset = if order == 0 {
            None
        } else {
            self.index.lookup_ngram(&ngram[D::backoff_range(ngram.len())])
        };

        let (head_word, context_offset) = self.index.layout.decode(key);
        self.index.values.add(
            SlotLink {
                order,
                slot,
                context_offset,
                head_word,
                backoff_offset,
            },
            value,
        );
        Ok(Some(slot))
    }

    fn check_open(&self, order: usize) -> Result<()> {
        if order >= self.index.num_orders() {
            return Err(Error::OrderOutOfRange {
                order,
                num_orders: self.index.num_orders(),
            });
        }
        if self.finalized[order] {
            return Err(Error::OrderFinalized { order });
        }
        Ok(())
    }

    /// Finalize every order below `order` the first time it is reached.
    fn advance_to(&mut self, order: usize) {
        if order <= self.current_order {
            return;
        }
        for lower in self.current_order..order {
            if !self.finalized[lower] {
                tracing::debug!(order = lower, next = order, "Finalizing order before moving on");
                self.finalize_unchecked(lower);
            }
        }
        self.current_order = order;
    }

    /// Mark `order` complete: trim its values to the table's capacity and log
    /// the realized load factor. Later inserts into `order` fail. Finalizing
    /// twice is a no-op.
    pub fn finalize_order(&mut self, order: usize) -> Result<()> {
        if order >= self.index.num_orders() {
            return Err(Error::OrderOutOfRange {
                order,
                num_orders: self.index.num_orders(),
            });
        }
        self.finalize_unchecked(order);
        Ok(())
    }

    /// `order` must be below `num_orders`.
    fn finalize_unchecked(&mut self, order: usize) {
        if self.finalized[order] {
            return;
        }
        let table = &self.index.tables[order];
        let capacity = table.capacity();
        tracing::info!(
            order,
            ngram_len = order + 1,
            len = table.len(),
            capacity,
            load_factor = table.load_factor(),
            "Finalized n-gram order"
        );
        self.index.values.trim_after_order(order, capacity);
        self.finalized[order] = true;
    }

    pub fn is_finalized(&self, order: usize) -> bool {
        self.finalized.get(order).copied().unwrap_or(false)
    }

    /// Finalize all remaining orders and hand back the read-only index.
    pub fn finish(mut self) -> NgramIndex<C, D> {
        for order in 0..self.index.num_orders() {
            self.finalize_unchecked(order);
        }
        self.index
    }
}

impl<C, D> Deref for NgramIndexBuilder<C, D> {
    type Target = NgramIndex<C, D>;

    fn deref(&self) -> &Self::Target {
        &self.index
    }
}
