//! Value storage addressed by `(order, offset)`.
//!
//! The index only hands out addresses. Whatever is stored per n-gram
//! (counts, probabilities, backoff weights) lives behind [`ValueContainer`],
//! which sees every insertion with enough linkage to chain statistics across
//! orders.

use crate::key::{Offset, WordId};

/// Addressing and linkage for one inserted n-gram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotLink {
    /// Order of the n-gram (0 = unigram).
    pub order: usize,
    /// Slot the n-gram occupies in its order's table.
    pub slot: Offset,
    /// Offset of its context in the table of `order - 1` (0 for unigrams).
    pub context_offset: Offset,
    /// The n-gram's head word.
    pub head_word: WordId,
    /// Offset of its backoff (order-1)-gram, `None` for unigrams or when that
    /// n-gram is not stored.
    pub backoff_offset: Option<Offset>,
}

/// Storage for per-n-gram statistics.
pub trait ValueContainer {
    /// Payload stored per n-gram.
    type Value;

    /// Make room for `capacity` slots of `order`. Called once per order when
    /// the index allocates its tables.
    fn reserve(&mut self, order: usize, capacity: u64);

    /// Store `value` for a freshly inserted (or re-inserted) n-gram.
    fn add(&mut self, link: SlotLink, value: Self::Value);

    /// Copy the value at `(order, offset)` into `out`. Returns `false` if
    /// nothing is stored there.
    fn get_into(&self, order: usize, offset: Offset, out: &mut Self::Value) -> bool;

    /// Value at `(order, offset)`.
    fn get(&self, order: usize, offset: Offset) -> Option<Self::Value>
    where
        Self::Value: Default,
    {
        let mut out = Self::Value::default();
        self.get_into(order, offset, &mut out).then_some(out)
    }

    /// `order` is complete and its table holds `final_capacity` slots.
    fn trim_after_order(&mut self, order: usize, final_capacity: u64);
}

/// Log probability and backoff weight, as found in ARPA files.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProbBackoff {
    pub log_prob: f32,
    pub backoff: f32,
}

const NO_OFFSET: Offset = Offset::MAX;

#[derive(Clone, Debug, Default)]
struct OrderColumn<V> {
    values: Vec<V>,
    backoff: Vec<Offset>,
    /// Number of slots written at least once.
    filled: u64,
    written: Vec<bool>,
}

/// Dense per-order arrays indexed by slot.
///
/// Re-adding a slot overwrites its value; `len` counts distinct slots.
#[derive(Clone, Debug, Default)]
pub struct ArrayValues<V> {
    orders: Vec<OrderColumn<V>>,
}

/// Container for an index of ARPA-style statistics.
pub type ProbBackoffValues = ArrayValues<ProbBackoff>;

impl<V: Clone + Default> ArrayValues<V> {
    pub fn new() -> Self {
        Self { orders: Vec::new() }
    }

    fn column_mut(&mut self, order: usize) -> &mut OrderColumn<V> {
        if order >= self.orders.len() {
            self.orders.resize_with(order + 1, OrderColumn::default);
        }
        &mut self.orders[order]
    }

    /// Backoff offset recorded for the n-gram at `(order, offset)`.
    pub fn backoff_offset(&self, order: usize, offset: Offset) -> Option<Offset> {
        let col = self.orders.get(order)?;
        let idx = usize::try_from(offset).ok()?;
        if !*col.written.get(idx)? {
            return None;
        }
        col.backoff.get(idx).copied().filter(|&o| o != NO_OFFSET)
    }

    /// Borrow the value at `(order, offset)`.
    pub fn value_ref(&self, order: usize, offset: Offset) -> Option<&V> {
        let col = self.orders.get(order)?;
        let idx = usize::try_from(offset).ok()?;
        if !*col.written.get(idx)? {
            return None;
        }
        col.values.get(idx)
    }

    /// Number of distinct slots written for `order`.
    pub fn len(&self, order: usize) -> u64 {
        self.orders.get(order).map_or(0, |c| c.filled)
    }

    /// Bytes held by all columns.
    pub fn memory_usage(&self) -> usize {
        self.orders
            .iter()
            .map(|c| {
                c.values.capacity() * std::mem::size_of::<V>()
                    + c.backoff.capacity() * std::mem::size_of::<Offset>()
                    + c.written.capacity()
            })
            .sum()
    }
}

impl<V: Clone + Default> ValueContainer for ArrayValues<V> {
    type Value = V;

    fn reserve(&mut self, order: usize, capacity: u64) {
        let capacity = capacity as usize;
        let col = self.column_mut(order);
        if col.values.len() < capacity {
            col.values.resize(capacity, V::default());
            col.backoff.resize(capacity, NO_OFFSET);
            col.written.resize(capacity, false);
        }
    }

    fn add(&mut self, link: SlotLink, value: V) {
        let idx = link.slot as usize;
        let col = self.column_mut(link.order);
        if idx >= col.values.len() {
            col.values.resize(idx + 1, V::default());
            col.backoff.resize(idx + 1, NO_OFFSET);
            col.written.resize(idx + 1, false);
        }
        if !col.written[idx] {
            col.written[idx] = true;
            col.filled += 1;
        }
        col.values[idx] = value;
        col.backoff[idx] = link.backoff_offset.unwrap_or(NO_OFFSET);
    }

    fn get_into(&self, order: usize, offset: Offset, out: &mut V) -> bool {
        match self.value_ref(order, offset) {
            Some(v) => {
                out.clone_from(v);
                true
            }
            None => false,
        }
    }

    fn trim_after_order(&mut self, order: usize, final_capacity: u64) {
        let capacity = final_capacity as usize;
        let col = self.column_mut(order);
        col.values.truncate(capacity);
        col.backoff.truncate(capacity);
        col.written.truncate(capacity);
        col.values.shrink_to_fit();
        col.backoff.shrink_to_fit();
        col.written.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(order: usize, slot: Offset, backoff: Option<Offset>) -> SlotLink {
        SlotLink {
            order,
            slot,
            context_offset: 0,
            head_word: 0,
            backoff_offset: backoff,
        }
    }

    #[test]
    fn test_add_get() {
        let mut v: ArrayValues<u64> = ArrayValues::new();
        v.reserve(0, 8);
        v.add(link(0, 3, None), 42);
        assert_eq!(v.get(0, 3), Some(42));
        assert_eq!(v.get(0, 2), None);
        assert_eq!(v.get(1, 3), None);
        assert_eq!(v.len(0), 1);
    }

    #[test]
    fn test_overwrite_keeps_len() {
        let mut v: ArrayValues<u64> = ArrayValues::new();
        v.reserve(1, 4);
        v.add(link(1, 0, Some(2)), 1);
        v.add(link(1, 0, Some(2)), 5);
        assert_eq!(v.get(1, 0), Some(5));
        assert_eq!(v.len(1), 1);
        assert_eq!(v.backoff_offset(1, 0), Some(2));
    }

    #[test]
    fn test_get_into() {
        let mut v: ProbBackoffValues = ArrayValues::new();
        v.reserve(0, 2);
        let pb = ProbBackoff {
            log_prob: -1.5,
            backoff: -0.25,
        };
        v.add(link(0, 1, None), pb);
        let mut out = ProbBackoff::default();
        assert!(v.get_into(0, 1, &mut out));
        assert_eq!(out, pb);
        let mut untouched = ProbBackoff::default();
        assert!(!v.get_into(0, 0, &mut untouched));
        assert_eq!(untouched, ProbBackoff::default());
    }

    #[test]
    fn test_add_beyond_reserved_grows() {
        let mut v: ArrayValues<u8> = ArrayValues::new();
        v.add(link(2, 10, None), 7);
        assert_eq!(v.get(2, 10), Some(7));
        assert_eq!(v.backoff_offset(2, 10), None);
    }

    #[test]
    fn test_trim() {
        let mut v: ArrayValues<u32> = ArrayValues::new();
        v.reserve(0, 100);
        v.add(link(0, 5, None), 9);
        v.trim_after_order(0, 10);
        assert_eq!(v.get(0, 5), Some(9));
        assert_eq!(v.get(0, 50), None);
        assert!(v.memory_usage() < 100 * std::mem::size_of::<u32>());
    }

    #[test]
    fn test_unit_values() {
        let mut v: ArrayValues<()> = ArrayValues::new();
        v.reserve(0, 4);
        v.add(link(0, 2, None), ());
        assert_eq!(v.get(0, 2), Some(()));
        assert_eq!(v.get(0, 1), None);
    }
}
