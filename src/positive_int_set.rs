//! A set of positive ints that picks its own representation.
//!
//! Exactly one of three representations is live:
//!
//! - a bit set, optionally offset so a cluster of large keys does not pay
//!   for the bits below it,
//! - a tiny unsorted vector for up to 16 members,
//! - an [`IntHashSet`], short-slot compressed when the key range allows.
//!
//! Every decision compares estimated sizes in 32-bit words. Switches only
//! happen in `add`, before the new key goes in, and a switch away from the
//! current representation must save at least `hysteresis` words. Removes
//! never switch.
//!
//! A fresh set allocates nothing until its first key, then starts as an
//! offset bit set around that key. Once a key arrives below the offset,
//! offsets are judged unproductive and later bit sets start at 0.

use crate::bit_set::IntBitSet;
use crate::config::{SwitchPolicy, DEFAULT_LOAD_FACTOR};
use crate::cursor::IntPositions;
use crate::error::{Error, Result};
use crate::hashing::table_space;
use crate::int_hash_set::{IntHashSet, SPACE_OVERHEAD_IN_WORDS};
use crate::int_keys::FORCE_INT_OFFSET;
use crate::snapshot::ReadOnly;
use crate::tiny_set::TinySet;
use log::{debug, trace};

const HASH_SET_SHORT_MAX_SIZE: i64 = 65535;

#[derive(Clone, Debug)]
enum Repr {
    /// Bit set whose allocation waits for the first key.
    Unallocated,
    Bits(IntBitSet),
    Tiny(TinySet),
    Hash(IntHashSet),
}

impl Repr {
    fn name(&self) -> &'static str {
        match self {
            Repr::Unallocated => "unallocated bit set",
            Repr::Bits(_) => "bit set",
            Repr::Tiny(_) => "tiny set",
            Repr::Hash(_) => "hash set",
        }
    }
}

/// Words a bit set needs to hold `adj_key`, given it already has
/// `space_used_bits` and grows by doubling. Includes 2 words of overhead.
fn bit_set_space_from_range(adj_key: i64, space_used_bits: usize) -> usize {
    let w64 = 1 + ((adj_key.max(0) as usize) >> 6);
    let doubled = space_used_bits >> 5;
    (doubled.max(w64) << 1) + 2
}

/// Words a hash set sized for `n` members spanning `[est_min, est_max]`
/// would take.
fn hash_set_space(n: usize, est_max: i32, est_min: i32) -> usize {
    let short = n as i64 <= HASH_SET_SHORT_MAX_SIZE
        && (est_max as i64 - est_min as i64) < HASH_SET_SHORT_MAX_SIZE;
    let slots = table_space(n, DEFAULT_LOAD_FACTOR);
    (if short { slots >> 1 } else { slots }) + SPACE_OVERHEAD_IN_WORDS
}

/// Offset for a hash set over `[est_min, est_max]`: three quarters up the
/// range, where growth is more likely, or forced int slots when the range
/// cannot be short.
fn hash_set_offset(est_max: i32, est_min: i32) -> i32 {
    let range = est_max as i64 - est_min as i64;
    if range > HASH_SET_SHORT_MAX_SIZE {
        FORCE_INT_OFFSET
    } else {
        (est_max as i64 - (range >> 2)) as i32
    }
}

/// Bit set offset a little below `est_min`: 1/8 of it, clamped to
/// `[63, 1023]`, and never negative.
fn estimated_bit_set_offset(est_min: i32) -> i32 {
    (est_min - (est_min >> 3).clamp(63, 1023)).max(0)
}

fn check_positive(key: i32) -> Result<()> {
    match key {
        0 => Err(Error::ZeroKey),
        k if k < 0 => Err(Error::NotPositive(k)),
        _ => Ok(()),
    }
}

#[derive(Clone, Debug)]
pub struct PositiveIntSet {
    repr: Repr,
    policy: SwitchPolicy,
    use_offset: bool,
    second_time_shrinkable: bool,
}

impl Default for PositiveIntSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PositiveIntSet {
    pub fn new() -> Self {
        Self::with_policy(SwitchPolicy::default())
    }

    pub fn with_policy(policy: SwitchPolicy) -> Self {
        PositiveIntSet {
            repr: Repr::Unallocated,
            policy,
            use_offset: true,
            second_time_shrinkable: false,
        }
    }

    /// Pre-sizes for about `initial_size` keys in `[est_min, est_max]`,
    /// picking the smallest representation outright. An `initial_size` of
    /// 0 behaves like [`new`](Self::new).
    pub fn with_estimates(initial_size: i32, est_min: i32, est_max: i32) -> Result<Self> {
        let mut set = Self::new();
        if initial_size == 0 {
            return Ok(set);
        }
        if initial_size < 0 || est_min < 0 || est_max < est_min {
            return Err(Error::InvalidEstimate {
                initial_size,
                est_min,
                est_max,
            });
        }
        let est_max = est_max.max(initial_size);
        let n = initial_size as usize;
        let bit_set_offset = estimated_bit_set_offset(est_min);
        let bit_set_space = bit_set_space_from_range(est_max as i64 - bit_set_offset as i64, 0);
        let hash_space = hash_set_space(n, est_max, est_min);
        // no hysteresis for the first choice
        if bit_set_space < hash_space {
            set.allocate_bit_set(est_max, est_min, Some(bit_set_offset));
        } else if n <= set.policy.tiny_set_max_size {
            set.repr = Repr::Tiny(TinySet::with_capacity(n));
        } else {
            set.repr = Repr::Hash(IntHashSet::with_offset(n, hash_set_offset(est_max, est_min)));
        }
        Ok(set)
    }

    /// Adds `key`, first switching representation if that saves space.
    pub fn add(&mut self, key: i32) -> Result<bool> {
        check_positive(key)?;
        self.maybe_switch_representation(key)?;
        match &mut self.repr {
            Repr::Bits(b) => b.add(key),
            Repr::Tiny(t) => Ok(t.add(key)),
            Repr::Hash(h) => h.add(key),
            Repr::Unallocated => Err(Error::Internal(
                "bit set still unallocated after planning an add".into(),
            )),
        }
    }

    pub fn remove(&mut self, key: i32) -> Result<bool> {
        check_positive(key)?;
        match &mut self.repr {
            Repr::Unallocated => Ok(false),
            Repr::Bits(b) => Ok(b.remove(key)),
            Repr::Tiny(t) => Ok(t.remove(key)),
            Repr::Hash(h) => h.remove(key),
        }
    }

    pub fn contains(&self, key: i32) -> bool {
        self.find(key).is_some()
    }

    /// Position of `key` in the current representation.
    pub fn find(&self, key: i32) -> Option<usize> {
        if key <= 0 {
            return None;
        }
        match &self.repr {
            Repr::Unallocated => None,
            Repr::Bits(b) => b.find(key),
            Repr::Tiny(t) => t.find(key),
            Repr::Hash(h) => h.find(key),
        }
    }

    /// Empties the set, keeping its representation. A bit set is emptied
    /// in place on one clear and reallocated at half size on the next.
    pub fn clear(&mut self) {
        match &mut self.repr {
            Repr::Unallocated => {}
            Repr::Bits(b) => {
                if self.second_time_shrinkable {
                    self.second_time_shrinkable = false;
                    let bits = (b.space_used_in_bits() >> 1).max(self.policy.bit_set_overallocate);
                    trace!(
                        "positive int set clear: bit set {} -> {} bits",
                        b.space_used_in_bits(),
                        bits
                    );
                    *b = IntBitSet::new(bits.saturating_sub(1), b.offset());
                } else {
                    b.clear();
                    self.second_time_shrinkable = true;
                }
            }
            Repr::Tiny(t) => t.clear(),
            Repr::Hash(h) => h.clear(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Unallocated => 0,
            Repr::Bits(b) => b.len(),
            Repr::Tiny(t) => t.len(),
            Repr::Hash(h) => h.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Members in representation order; ascending for a bit set.
    pub fn iter(&self) -> Box<dyn Iterator<Item = i32> + '_> {
        match &self.repr {
            Repr::Unallocated => Box::new(core::iter::empty()),
            Repr::Bits(b) => Box::new(b.iter()),
            Repr::Tiny(t) => Box::new(t.iter()),
            Repr::Hash(h) => Box::new(h.iter()),
        }
    }

    pub fn to_unordered_int_array(&self) -> Vec<i32> {
        self.iter().collect()
    }

    pub fn to_ordered_int_array(&self) -> Vec<i32> {
        let mut members = self.to_unordered_int_array();
        if !self.is_bit_set() {
            members.sort_unstable();
        }
        members
    }

    pub fn ordered_iter(&self) -> std::vec::IntoIter<i32> {
        self.to_ordered_int_array().into_iter()
    }

    pub fn bulk_add_to(&self, out: &mut Vec<i32>) {
        out.extend(self.iter());
    }

    pub fn snapshot(&self) -> ReadOnly<Self> {
        ReadOnly::new(self.clone())
    }

    pub fn is_bit_set(&self) -> bool {
        matches!(self.repr, Repr::Unallocated | Repr::Bits(_))
    }

    pub fn is_offset_bit_set(&self) -> bool {
        matches!(&self.repr, Repr::Bits(b) if b.offset() != 0)
    }

    pub fn is_tiny_set(&self) -> bool {
        matches!(self.repr, Repr::Tiny(_))
    }

    pub fn is_hash_set(&self) -> bool {
        matches!(self.repr, Repr::Hash(_))
    }

    pub fn is_short_hash_set(&self) -> bool {
        matches!(&self.repr, Repr::Hash(h) if h.is_short_hash_set())
    }

    /// False once a key below a bit set's offset showed offsets do not pay.
    pub fn uses_offset(&self) -> bool {
        self.use_offset
    }

    fn maybe_switch_representation(&mut self, key: i32) -> Result<()> {
        match self.repr {
            Repr::Unallocated | Repr::Bits(_) => self.handle_bit_set(key),
            Repr::Tiny(_) => self.handle_tiny_set(key),
            Repr::Hash(_) => self.handle_hash_set(key),
        }
    }

    fn handle_bit_set(&mut self, key: i32) -> Result<()> {
        if matches!(self.repr, Repr::Unallocated) && self.allocate_bit_set(key, key, None) {
            return Ok(());
        }
        let Repr::Bits(bits) = &self.repr else {
            return Ok(());
        };
        let offset = bits.offset();
        let space_used = bits.space_used_in_bits();
        let size = bits.len();
        let largest = bits.largest_member();

        if key < offset {
            return self.adjust_bit_set_for_lower_offset(key, size, largest);
        }
        let adj_key = key as i64 - offset as i64;
        if (adj_key as usize) < space_used {
            return Ok(());
        }
        // the key is past the allocation: grow, or switch
        let bit_set_space = bit_set_space_from_range(adj_key, space_used);
        let size_needed = size + 1;
        if self.tiny_set_space(size_needed) < bit_set_space {
            return self.switch_to_tiny_set(size_needed);
        }
        let hash_size = self.hash_set_overallocate_size(size_needed);
        let hash_space = hash_set_space(hash_size, key, offset);
        if hash_space + self.policy.hysteresis < bit_set_space {
            return self.switch_to_hash_set(hash_size, hash_set_offset(key, offset));
        }
        Ok(())
    }

    /// Always abandons the current bit set.
    fn adjust_bit_set_for_lower_offset(
        &mut self,
        key: i32,
        size: usize,
        largest: Option<i32>,
    ) -> Result<()> {
        let size = size + 1;
        let largest = largest.unwrap_or(key);
        let bit_set_space = bit_set_space_from_range(largest as i64, 0);
        let hash_space = hash_set_space(size, largest, key);
        self.use_offset = false;
        if hash_space + self.policy.hysteresis < bit_set_space {
            let offset = hash_set_offset(largest, key);
            return self.switch_from_bit_set(size, offset);
        }
        debug!("positive int set: key {key} below bit set offset, dropping the offset");
        let members = self.to_unordered_int_array();
        self.allocate_bit_set(largest, key, Some(0));
        self.add_members(members)
    }

    fn handle_tiny_set(&mut self, key: i32) -> Result<()> {
        let Repr::Tiny(tiny) = &self.repr else {
            return Ok(());
        };
        let size = tiny.len() + 1;
        if size <= self.policy.tiny_set_max_size {
            return Ok(());
        }
        let (most_pos, most_neg) = tiny
            .iter()
            .chain([key])
            .fold((i32::MIN, i32::MAX), |(p, n), v| (p.max(v), n.min(v)));
        // without offsets a bit set spans from 0
        let low = if self.use_offset { most_neg } else { 0 };
        let bit_set_space = bit_set_space_from_range(most_pos as i64 - low as i64, 0);
        let hash_size = self.hash_set_overallocate_size(size);
        let hash_space = hash_set_space(hash_size, most_pos, most_neg);
        if bit_set_space < hash_space {
            return self.switch_to_bit_set(
                most_pos,
                most_neg,
                estimated_bit_set_offset(most_neg),
            );
        }
        self.switch_to_hash_set(hash_size, hash_set_offset(most_pos, most_neg))
    }

    fn handle_hash_set(&mut self, key: i32) -> Result<()> {
        let Repr::Hash(hash) = &self.repr else {
            return Ok(());
        };
        // the key may already be present; only a coming doubling matters
        if hash.wont_expand(1) {
            return Ok(());
        }
        let hash_space_needed = hash.space_used_in_words() * 2 + SPACE_OVERHEAD_IN_WORDS;
        let max = hash.most_positive();
        let most_neg = hash.most_negative();
        let offset = if self.use_offset {
            most_neg.min(key)
        } else {
            0
        };
        let bit_set_space = bit_set_space_from_range(
            self.policy.bit_set_overallocate as i64 + max as i64 - offset as i64,
            0,
        );
        if bit_set_space + self.policy.hysteresis < hash_space_needed {
            return self.switch_to_bit_set(max, most_neg, offset);
        }
        Ok(())
    }

    fn tiny_set_space(&self, size: usize) -> usize {
        if size < self.policy.tiny_set_max_size {
            size + 4
        } else {
            usize::MAX
        }
    }

    fn hash_set_overallocate_size(&self, size: usize) -> usize {
        size + (size >> self.policy.hash_set_overallocate_shift)
    }

    /// Installs an empty bit set for keys up to about `est_max`. Returns
    /// true if it is offset, which guarantees a key near `est_min` fits.
    fn allocate_bit_set(&mut self, est_max: i32, est_min: i32, offset: Option<i32>) -> bool {
        let overallocate = self.policy.bit_set_overallocate as i64;
        if self.use_offset {
            let offset = offset.unwrap_or_else(|| estimated_bit_set_offset(est_min));
            let bits = (overallocate + est_max as i64 - offset as i64).max(0) as usize;
            self.repr = Repr::Bits(IntBitSet::new(bits, offset));
            true
        } else {
            let bits = (overallocate + est_max as i64).max(0) as usize;
            self.repr = Repr::Bits(IntBitSet::new(bits, 0));
            false
        }
    }

    fn switch_from_bit_set(&mut self, size: usize, offset: i32) -> Result<()> {
        if size < self.policy.tiny_set_max_size {
            return self.switch_to_tiny_set(size);
        }
        self.switch_to_hash_set(size, offset)
    }

    fn switch_to_tiny_set(&mut self, size: usize) -> Result<()> {
        debug!("positive int set: {} -> tiny set (size {size})", self.repr.name());
        let members = self.to_unordered_int_array();
        self.repr = Repr::Tiny(TinySet::with_capacity(size));
        self.add_members(members)
    }

    fn switch_to_hash_set(&mut self, size: usize, offset: i32) -> Result<()> {
        debug!(
            "positive int set: {} -> hash set (size {size}, offset {offset})",
            self.repr.name()
        );
        let members = self.to_unordered_int_array();
        self.repr = Repr::Hash(IntHashSet::with_offset(size, offset));
        self.add_members(members)
    }

    fn switch_to_bit_set(&mut self, est_max: i32, est_min: i32, offset: i32) -> Result<()> {
        debug!(
            "positive int set: {} -> bit set (range {est_min}..={est_max})",
            self.repr.name()
        );
        let members = self.to_unordered_int_array();
        self.allocate_bit_set(est_max, est_min, Some(offset));
        self.add_members(members)
    }

    fn add_members(&mut self, members: Vec<i32>) -> Result<()> {
        for key in members {
            match &mut self.repr {
                Repr::Bits(b) => {
                    b.add(key)?;
                }
                Repr::Tiny(t) => {
                    t.add(key);
                }
                Repr::Hash(h) => {
                    h.add(key)?;
                }
                Repr::Unallocated => {
                    return Err(Error::Internal("no representation to copy into".into()));
                }
            }
        }
        Ok(())
    }
}

impl IntPositions for PositiveIntSet {
    fn move_to_first(&self) -> Option<usize> {
        match &self.repr {
            Repr::Unallocated => None,
            Repr::Bits(b) => b.move_to_first(),
            Repr::Tiny(t) => t.move_to_first(),
            Repr::Hash(h) => h.move_to_first(),
        }
    }

    fn move_to_last(&self) -> Option<usize> {
        match &self.repr {
            Repr::Unallocated => None,
            Repr::Bits(b) => b.move_to_last(),
            Repr::Tiny(t) => t.move_to_last(),
            Repr::Hash(h) => h.move_to_last(),
        }
    }

    fn move_to_next(&self, pos: usize) -> Option<usize> {
        match &self.repr {
            Repr::Unallocated => None,
            Repr::Bits(b) => b.move_to_next(pos),
            Repr::Tiny(t) => t.move_to_next(pos),
            Repr::Hash(h) => h.move_to_next(pos),
        }
    }

    fn move_to_previous(&self, pos: usize) -> Option<usize> {
        match &self.repr {
            Repr::Unallocated => None,
            Repr::Bits(b) => b.move_to_previous(pos),
            Repr::Tiny(t) => t.move_to_previous(pos),
            Repr::Hash(h) => h.move_to_previous(pos),
        }
    }

    fn key_at(&self, pos: usize) -> Result<i32> {
        match &self.repr {
            Repr::Unallocated => Err(Error::NoSuchElement),
            Repr::Bits(b) => b.key_at(pos),
            Repr::Tiny(t) => t.key_at(pos),
            Repr::Hash(h) => h.key_at(pos),
        }
    }
}
