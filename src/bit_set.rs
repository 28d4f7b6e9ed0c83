//! Growable bit set over ints at or above an offset.

use crate::cursor::IntPositions;
use crate::error::{Error, Result};

/// One bit per int in `[offset, offset + capacity_in_bits())`.
///
/// Iteration and positions run in ascending key order. A position is the
/// bit index, i.e. `key - offset`. The bit array doubles when a key lands
/// past its end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntBitSet {
    words: Vec<u64>,
    offset: i32,
    size: usize,
    largest: Option<usize>,
}

impl IntBitSet {
    /// Room for keys up to `offset + max_adj_key` without growing.
    pub fn new(max_adj_key: usize, offset: i32) -> Self {
        IntBitSet {
            words: vec![0; 1 + (max_adj_key >> 6)],
            offset,
            size: 0,
            largest: None,
        }
    }

    #[inline]
    fn adj(&self, key: i32) -> Option<usize> {
        usize::try_from(key as i64 - self.offset as i64).ok()
    }

    #[inline]
    fn is_set(&self, bit: usize) -> bool {
        self.words
            .get(bit >> 6)
            .is_some_and(|w| w & (1u64 << (bit & 63)) != 0)
    }

    pub fn add(&mut self, key: i32) -> Result<bool> {
        let Some(bit) = self.adj(key) else {
            return Err(Error::BelowOffset {
                key,
                offset: self.offset,
            });
        };
        let word = bit >> 6;
        if word >= self.words.len() {
            let new_len = (self.words.len() * 2).max(word + 1);
            self.words.resize(new_len, 0);
        }
        let mask = 1u64 << (bit & 63);
        if self.words[word] & mask != 0 {
            return Ok(false);
        }
        self.words[word] |= mask;
        self.size += 1;
        if self.largest.map_or(true, |l| bit > l) {
            self.largest = Some(bit);
        }
        Ok(true)
    }

    pub fn remove(&mut self, key: i32) -> bool {
        let Some(bit) = self.adj(key) else {
            return false;
        };
        if !self.is_set(bit) {
            return false;
        }
        self.words[bit >> 6] &= !(1u64 << (bit & 63));
        self.size -= 1;
        if self.largest == Some(bit) {
            self.largest = self.previous_set_bit(bit);
        }
        true
    }

    pub fn contains(&self, key: i32) -> bool {
        self.adj(key).is_some_and(|bit| self.is_set(bit))
    }

    /// Position of `key`.
    pub fn find(&self, key: i32) -> Option<usize> {
        self.adj(key).filter(|&bit| self.is_set(bit))
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
        self.size = 0;
        self.largest = None;
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn largest_member(&self) -> Option<i32> {
        self.largest.map(|bit| self.key_for(bit))
    }

    /// Bits allocated, excluding object overhead.
    pub fn space_used_in_bits(&self) -> usize {
        self.words.len() * 64
    }

    #[inline]
    fn key_for(&self, bit: usize) -> i32 {
        (self.offset as i64 + bit as i64) as i32
    }

    /// First set bit at or after `from`.
    fn next_set_bit(&self, from: usize) -> Option<usize> {
        let mut w = from >> 6;
        let mut word = *self.words.get(w)? & (!0u64 << (from & 63));
        loop {
            if word != 0 {
                return Some((w << 6) + word.trailing_zeros() as usize);
            }
            w += 1;
            word = *self.words.get(w)?;
        }
    }

    /// Last set bit strictly before `before`.
    fn previous_set_bit(&self, before: usize) -> Option<usize> {
        let last = before.checked_sub(1)?;
        let (mut w, mut word) = if (last >> 6) < self.words.len() {
            let w = last >> 6;
            (w, self.words[w] & (!0u64 >> (63 - (last & 63))))
        } else {
            let w = self.words.len() - 1;
            (w, self.words[w])
        };
        loop {
            if word != 0 {
                return Some((w << 6) + 63 - word.leading_zeros() as usize);
            }
            w = w.checked_sub(1)?;
            word = self.words[w];
        }
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        let mut next = self.next_set_bit(0);
        core::iter::from_fn(move || {
            let bit = next?;
            next = self.next_set_bit(bit + 1);
            Some(self.key_for(bit))
        })
    }
}

impl IntPositions for IntBitSet {
    fn move_to_first(&self) -> Option<usize> {
        self.next_set_bit(0)
    }

    fn move_to_last(&self) -> Option<usize> {
        self.largest
    }

    fn move_to_next(&self, pos: usize) -> Option<usize> {
        self.next_set_bit(pos + 1)
    }

    fn move_to_previous(&self, pos: usize) -> Option<usize> {
        self.previous_set_bit(pos)
    }

    fn key_at(&self, pos: usize) -> Result<i32> {
        if self.is_set(pos) {
            Ok(self.key_for(pos))
        } else {
            Err(Error::NoSuchElement)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_with_offset() {
        let mut b = IntBitSet::new(100, 1000);
        assert_eq!(b.add(1000), Ok(true));
        assert_eq!(b.add(1063), Ok(true));
        assert_eq!(b.add(1064), Ok(true));
        assert_eq!(b.add(1064), Ok(false));
        assert_eq!(
            b.add(999),
            Err(Error::BelowOffset {
                key: 999,
                offset: 1000
            })
        );
        assert!(b.contains(1063));
        assert!(!b.contains(5));
        assert_eq!(b.len(), 3);
        assert_eq!(b.largest_member(), Some(1064));
        assert!(b.remove(1064));
        assert_eq!(b.largest_member(), Some(1063));
        assert!(!b.remove(1064));
    }

    #[test]
    fn grows_by_doubling() {
        let mut b = IntBitSet::new(0, 0);
        assert_eq!(b.space_used_in_bits(), 64);
        b.add(64).unwrap();
        assert_eq!(b.space_used_in_bits(), 128);
        b.add(1000).unwrap();
        assert_eq!(b.space_used_in_bits(), 1024);
        assert!(b.contains(64) && b.contains(1000));
    }

    #[test]
    fn iterates_in_order_across_words() {
        let mut b = IntBitSet::new(300, 10);
        for k in [300, 11, 74, 75, 138, 10] {
            b.add(k).unwrap();
        }
        assert_eq!(b.iter().collect::<Vec<_>>(), vec![10, 11, 74, 75, 138, 300]);
    }

    #[test]
    fn positions_walk_both_ways() {
        let mut b = IntBitSet::new(200, 0);
        for k in [3, 64, 130] {
            b.add(k).unwrap();
        }
        let mut c = b.cursor();
        c.move_to_end();
        assert_eq!(c.previous(), Ok(130));
        assert_eq!(c.previous(), Ok(64));
        assert_eq!(c.previous(), Ok(3));
        assert!(!c.has_previous());
        assert_eq!(b.key_at(4), Err(Error::NoSuchElement));
        assert_eq!(b.move_to_previous(100_000), Some(130));
    }

    #[test]
    fn clear_empties() {
        let mut b = IntBitSet::new(64, 0);
        b.add(5).unwrap();
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.largest_member(), None);
        assert_eq!(b.iter().count(), 0);
    }
}
