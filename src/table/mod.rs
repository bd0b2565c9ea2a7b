//! Fixed-capacity open-addressing table over packed keys.
//!
//! One table exists per n-gram order. It stores nothing but packed keys:
//! the slot a key lands in *is* its value (the offset handed back to the
//! index), so memory is 8 bytes per slot regardless of n-gram length.
//!
//! - Hash: xxh3 over the key's little-endian bytes
//! - Probing: linear, wrapping at `capacity`
//! - No deletion, no resizing. Slots are stable once written.

use xxhash_rust::xxh3::xxh3_64;

use crate::error::{Error, Result};
use crate::key::{Offset, PackedKey};

#[inline]
fn hash_key(key: PackedKey) -> u64 {
    xxh3_64(&key.raw().to_le_bytes())
}

/// Open-addressing table for the n-grams of one order.
#[derive(Clone, Debug)]
pub struct OrderTable {
    order: usize,
    keys: Box<[u64]>,
    len: u64,
    max_load_factor: f64,
    /// Set once the load factor has crossed `max_load_factor`.
    overloaded: bool,
}

impl OrderTable {
    /// Capacity needed to hold `expected` keys at `max_load_factor`.
    pub(crate) fn capacity_for(expected: u64, max_load_factor: f64) -> u64 {
        ((expected as f64 / max_load_factor).ceil() as u64).max(1)
    }

    /// Allocate a table sized for `expected` keys.
    pub(crate) fn with_expected(order: usize, expected: u64, max_load_factor: f64) -> Self {
        let capacity = Self::capacity_for(expected, max_load_factor);
        tracing::debug!(order, expected, capacity, "Allocating n-gram table");
        Self {
            order,
            keys: vec![PackedKey::EMPTY.raw(); capacity as usize].into_boxed_slice(),
            len: 0,
            max_load_factor,
            overloaded: false,
        }
    }

    #[inline]
    fn home_slot(&self, key: PackedKey) -> usize {
        (hash_key(key) % self.keys.len() as u64) as usize
    }

    /// Insert `key` (if absent) and return its slot. Keys come from
    /// [`KeyLayout::encode`](crate::KeyLayout::encode) within checked bounds,
    /// so never equal the empty marker.
    ///
    /// Re-inserting a key returns the slot it already occupies.
    ///
    /// # Errors
    /// [`Error::CapacityOverflow`] if every slot is taken by other keys. The
    /// table is left unchanged.
    pub(crate) fn put(&mut self, key: PackedKey) -> Result<Offset> {
        debug_assert!(!key.is_empty(), "empty marker used as a key");
        let capacity = self.keys.len();
        let mut idx = self.home_slot(key);
        for _ in 0..capacity {
            let stored = self.keys[idx];
            if stored == key.raw() {
                return Ok(idx as Offset);
            }
            if stored == PackedKey::EMPTY.raw() {
                self.keys[idx] = key.raw();
                self.len += 1;
                self.check_load();
                return Ok(idx as Offset);
            }
            idx += 1;
            if idx == capacity {
                idx = 0;
            }
        }
        Err(Error::CapacityOverflow {
            order: self.order,
            capacity: capacity as u64,
        })
    }

    fn check_load(&mut self) {
        if !self.overloaded && self.load_factor() > self.max_load_factor {
            self.overloaded = true;
            tracing::warn!(
                order = self.order,
                len = self.len,
                capacity = self.capacity(),
                max_load_factor = self.max_load_factor,
                "N-gram table exceeded its load factor; expected counts were too low"
            );
        }
    }

    /// Slot holding `key`, if present.
    pub fn get_offset(&self, key: PackedKey) -> Option<Offset> {
        let capacity = self.keys.len();
        let mut idx = self.home_slot(key);
        for _ in 0..capacity {
            let stored = self.keys[idx];
            if stored == key.raw() {
                return Some(idx as Offset);
            }
            if stored == PackedKey::EMPTY.raw() {
                return None;
            }
            idx += 1;
            if idx == capacity {
                idx = 0;
            }
        }
        None
    }

    /// Key stored at `slot`, or `None` for out-of-range and empty slots.
    #[inline]
    pub fn get_key(&self, slot: Offset) -> Option<PackedKey> {
        let raw = *self.keys.get(usize::try_from(slot).ok()?)?;
        let key = PackedKey::from_raw(raw);
        (!key.is_empty()).then_some(key)
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        self.keys.len() as u64
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.keys.len() as f64
    }

    /// Bytes held by the slot array.
    pub fn memory_usage(&self) -> usize {
        self.keys.len() * std::mem::size_of::<u64>()
    }

    /// Occupied `(slot, key)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Offset, PackedKey)> + '_ {
        self.keys.iter().enumerate().filter_map(|(slot, &raw)| {
            let key = PackedKey::from_raw(raw);
            (!key.is_empty()).then_some((slot as Offset, key))
        })
    }
}
