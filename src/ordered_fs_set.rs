//! Comparator-ordered set in one array with free space at both ends.
//!
//! The array is split into `[0, first_used)` free front,
//! `[first_used, next_free)` used and `[next_free, len)` free back. An
//! insert or remove shifts whichever side of the position is shorter, so
//! data movement is bounded by the distance to the nearer end instead of
//! the distance to the back. Only when the chosen side has no free slot is
//! half of the other side's free space moved across.

use crate::error::{Error, Result};
use crate::reentrancy::ReentrancyGuard;
use crate::snapshot::ReadOnly;
use core::cmp::Ordering;
use core::fmt;
use log::{debug, trace};
use std::rc::Rc;

/// Total order over set elements.
pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

const DEFAULT_SIZE: usize = 8;

/// Past this many slots the array grows by this much instead of doubling.
pub const MULTIPLICATION_LIMIT: usize = 16 * 1024 * 1024;

fn empty_slots<T>(len: usize) -> Vec<Option<T>> {
    (0..len).map(|_| None).collect()
}

#[derive(Clone)]
struct SortedRegion<T> {
    slots: Vec<Option<T>>,
    first_used: usize,
    next_free: usize,
    /// Largest size since the last clear.
    max_size: usize,
}

impl<T> SortedRegion<T> {
    fn len(&self) -> usize {
        self.next_free - self.first_used
    }

    fn at(&self, pos: usize) -> Option<&T> {
        if pos < self.first_used || pos >= self.next_free {
            return None;
        }
        self.slots[pos].as_ref()
    }

    fn last(&self) -> Option<&T> {
        self.next_free.checked_sub(1).and_then(|p| self.at(p))
    }

    /// `Ok(slot)` of an element comparing equal, or `Err(slot)` where the
    /// item would be inserted.
    fn search(&self, item: &T, cmp: &dyn Fn(&T, &T) -> Ordering) -> Result<usize, usize> {
        let base = self.first_used;
        self.slots[self.first_used..self.next_free]
            .binary_search_by(|slot| match slot {
                Some(e) => cmp(e, item),
                None => Ordering::Less,
            })
            .map(|i| base + i)
            .map_err(|i| base + i)
    }

    fn ensure_capacity(&mut self) {
        if self.next_free < self.slots.len() || self.first_used > 0 {
            return;
        }
        let old = self.slots.len();
        let new_len = if old > MULTIPLICATION_LIMIT {
            old + MULTIPLICATION_LIMIT
        } else {
            (old << 1).max(DEFAULT_SIZE)
        };
        debug!("ordered set array {} -> {} slots", old, new_len);
        self.slots.resize_with(new_len, || None);
    }

    /// Opens a free slot for an item whose insertion point is `pos` and
    /// returns its index. `highest` means the item sorts after every
    /// element.
    fn insert_space(&mut self, mut pos: usize, highest: bool) -> usize {
        self.ensure_capacity();

        if highest {
            if self.next_free >= self.slots.len() {
                pos -= self.move_space_to_end();
            }
            self.next_free += 1;
            return pos;
        }

        if pos == self.first_used {
            if self.first_used == 0 {
                pos += self.move_space_to_front();
            }
            self.first_used -= 1;
            return pos - 1;
        }

        let from_end = self.next_free - pos;
        let from_front = pos - self.first_used;
        if from_front < from_end {
            if self.first_used == 0 {
                pos += self.move_space_to_front();
            }
            self.slots[self.first_used - 1..pos].rotate_left(1);
            self.first_used -= 1;
            return pos - 1;
        }

        if self.next_free >= self.slots.len() {
            pos -= self.move_space_to_end();
        }
        self.slots[pos..=self.next_free].rotate_right(1);
        self.next_free += 1;
        pos
    }

    /// Moves half the front free space (at least one slot) to the back.
    fn move_space_to_end(&mut self) -> usize {
        let amount = (self.first_used + 1) >> 1;
        trace!("ordered set: {} free slots front -> back", amount);
        self.slots[self.first_used - amount..self.next_free].rotate_left(amount);
        self.first_used -= amount;
        self.next_free -= amount;
        amount
    }

    /// Moves half the back free space (at least one slot) to the front.
    fn move_space_to_front(&mut self) -> usize {
        let amount = (1 + self.slots.len() - self.next_free) >> 1;
        trace!("ordered set: {} free slots back -> front", amount);
        self.slots[self.first_used..self.next_free + amount].rotate_right(amount);
        self.first_used += amount;
        self.next_free += amount;
        amount
    }

    fn put(&mut self, pos: usize, highest: bool, item: T) {
        let at = self.insert_space(pos, highest);
        self.slots[at] = Some(item);
        self.max_size = self.max_size.max(self.len());
    }

    /// Closes the gap at `pos` from the nearer end.
    fn remove_at(&mut self, pos: usize) -> Option<T> {
        let from_end = self.next_free - pos;
        let from_front = pos - self.first_used;
        let removed = self.slots[pos].take();
        if from_front < from_end {
            self.slots[self.first_used..=pos].rotate_right(1);
            self.first_used += 1;
        } else {
            self.slots[pos..self.next_free].rotate_left(1);
            self.next_free -= 1;
        }
        removed
    }

    fn clear(&mut self) {
        if self.len() == 0 {
            return;
        }
        let len = self.slots.len();
        if self.max_size < (len >> 3) && len > 128 {
            debug!("ordered set clear: {} -> {} slots", len, len >> 1);
            self.slots = empty_slots(len >> 1);
        } else {
            self.slots[self.first_used..self.next_free]
                .iter_mut()
                .for_each(|s| *s = None);
        }
        self.first_used = 0;
        self.next_free = 0;
        self.max_size = 0;
    }
}

/// A duplicate-free set kept sorted by a caller-supplied comparator.
///
/// Two comparators are held: one that includes the element's identity,
/// used by [`add`](Self::add), [`remove`](Self::remove) and
/// [`find`](Self::find), and one without it, used by
/// [`find_without_id`](Self::find_without_id) to locate the run of
/// elements equal on their other fields. A set index passes the same
/// comparator for both.
///
/// Positions are slot indexes in `[first_used_slot, next_free_slot)`;
/// they stay valid until the next mutation.
#[derive(Clone)]
pub struct OrderedFsSet<T> {
    region: SortedRegion<T>,
    cmp_with_id: Comparator<T>,
    cmp_without_id: Comparator<T>,
    guard: ReentrancyGuard,
}

impl<T> fmt::Debug for OrderedFsSet<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedFsSet")
            .field("first_used", &self.region.first_used)
            .field("next_free", &self.region.next_free)
            .field("capacity", &self.region.slots.len())
            .field("elements", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> OrderedFsSet<T> {
    pub fn new(
        cmp_with_id: impl Fn(&T, &T) -> Ordering + 'static,
        cmp_without_id: impl Fn(&T, &T) -> Ordering + 'static,
    ) -> Self {
        Self::from_comparators(Rc::new(cmp_with_id), Rc::new(cmp_without_id))
    }

    /// A set where elements carry no separate identity.
    pub fn with_comparator(cmp: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        let cmp: Comparator<T> = Rc::new(cmp);
        Self::from_comparators(Rc::clone(&cmp), cmp)
    }

    pub fn from_comparators(cmp_with_id: Comparator<T>, cmp_without_id: Comparator<T>) -> Self {
        OrderedFsSet {
            region: SortedRegion {
                slots: empty_slots(DEFAULT_SIZE),
                first_used: 0,
                next_free: 0,
                max_size: 0,
            },
            cmp_with_id,
            cmp_without_id,
            guard: ReentrancyGuard::new(),
        }
    }

    /// Adds `item` unless an element compares equal with identity.
    pub fn add(&mut self, item: T) -> bool {
        let cmp = Rc::clone(&self.cmp_with_id);
        self.add_with(item, &*cmp)
    }

    /// Adds `item` unless an element compares equal under `cmp`, which
    /// must order consistently with the set's own comparator.
    pub fn add_with(&mut self, item: T, cmp: &dyn Fn(&T, &T) -> Ordering) -> bool {
        let _g = self.guard.enter();
        // appending in order skips the binary search
        let highest = match self.region.last() {
            None => true,
            Some(last) => match cmp(&item, last) {
                Ordering::Greater => true,
                Ordering::Equal => return false,
                Ordering::Less => false,
            },
        };
        let pos = if highest {
            self.region.next_free
        } else {
            match self.region.search(&item, cmp) {
                Ok(_) => return false,
                Err(insert_at) => insert_at,
            }
        };
        self.region.put(pos, highest, item);
        true
    }

    /// Removes the element equal to `item` with identity.
    pub fn remove(&mut self, item: &T) -> Option<T> {
        let _g = self.guard.enter();
        let pos = self.region.search(item, &*self.cmp_with_id).ok()?;
        self.region.remove_at(pos)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.find(item).is_ok()
    }

    /// Binary search with the identity comparator.
    pub fn find(&self, item: &T) -> Result<usize, usize> {
        self.find_with(item, &*self.cmp_with_id)
    }

    pub fn find_with(&self, item: &T, cmp: &dyn Fn(&T, &T) -> Ordering) -> Result<usize, usize> {
        let _g = self.guard.enter();
        self.region.search(item, cmp)
    }

    /// Binary search ignoring identity; any of several equal elements may
    /// be hit.
    pub fn find_without_id(&self, item: &T) -> Result<usize, usize> {
        self.find_with(item, &*self.cmp_without_id)
    }

    /// Leftmost slot in `[start, end)` whose element is not less than
    /// `item` under `cmp`. With an equal element known to sit below `end`,
    /// that is the first of the equal run.
    pub fn binary_search_leftmost_equal(
        &self,
        item: &T,
        start: usize,
        end: usize,
        cmp: &dyn Fn(&T, &T) -> Ordering,
    ) -> usize {
        let _g = self.guard.enter();
        let start = start.clamp(self.region.first_used, self.region.next_free);
        let end = end.clamp(start, self.region.next_free);
        start
            + self.region.slots[start..end].partition_point(|slot| match slot {
                Some(e) => cmp(e, item) == Ordering::Less,
                None => true,
            })
    }

    /// Greatest element less than or equal to `item`.
    pub fn floor(&self, item: &T) -> Option<&T> {
        match self.find(item) {
            Ok(pos) => self.region.at(pos),
            Err(pos) => self.before(pos),
        }
    }

    /// Least element greater than or equal to `item`.
    pub fn ceiling(&self, item: &T) -> Option<&T> {
        match self.find(item) {
            Ok(pos) | Err(pos) => self.region.at(pos),
        }
    }

    /// Greatest element strictly less than `item`.
    pub fn lower(&self, item: &T) -> Option<&T> {
        match self.find(item) {
            Ok(pos) | Err(pos) => self.before(pos),
        }
    }

    /// Least element strictly greater than `item`.
    pub fn higher(&self, item: &T) -> Option<&T> {
        match self.find(item) {
            Ok(pos) => self.region.at(pos + 1),
            Err(pos) => self.region.at(pos),
        }
    }

    fn before(&self, pos: usize) -> Option<&T> {
        pos.checked_sub(1).and_then(|p| self.region.at(p))
    }

    pub fn first(&self) -> Option<&T> {
        self.region.at(self.region.first_used)
    }

    pub fn last(&self) -> Option<&T> {
        self.region.last()
    }

    /// The element at slot `pos`.
    pub fn get_at(&self, pos: usize) -> Result<&T> {
        self.region.at(pos).ok_or(Error::NoSuchElement)
    }

    pub fn first_used_slot(&self) -> usize {
        self.region.first_used
    }

    pub fn next_free_slot(&self) -> usize {
        self.region.next_free
    }

    /// Slots in the backing array, free space included.
    pub fn capacity(&self) -> usize {
        self.region.slots.len()
    }

    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.len() == 0
    }

    /// Elements in comparator order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.region.slots[self.region.first_used..self.region.next_free]
            .iter()
            .flatten()
    }

    pub fn cursor(&self) -> OrderedCursor<'_, T> {
        OrderedCursor::new(self)
    }

    /// Empties the set. The array is halved when the set stayed much
    /// smaller than it since the last clear.
    pub fn clear(&mut self) {
        self.region.clear();
    }

    /// Checks the used region is full and strictly ascending and the free
    /// regions are empty.
    pub fn check_invariants(&self) -> Result<()> {
        let _g = self.guard.enter();
        let r = &self.region;
        if r.first_used > r.next_free || r.next_free > r.slots.len() {
            return Err(Error::Internal(format!(
                "used region [{}, {}) outside array of {}",
                r.first_used,
                r.next_free,
                r.slots.len()
            )));
        }
        for (pos, slot) in r.slots.iter().enumerate() {
            let used = pos >= r.first_used && pos < r.next_free;
            if used != slot.is_some() {
                return Err(Error::Internal(format!(
                    "slot {pos} is {} but lies {} the used region",
                    if slot.is_some() { "full" } else { "empty" },
                    if used { "inside" } else { "outside" }
                )));
            }
        }
        let mut prev: Option<&T> = None;
        for (i, e) in self.iter().enumerate() {
            if let Some(p) = prev {
                if (self.cmp_with_id)(p, e) != Ordering::Less {
                    return Err(Error::Internal(format!(
                        "elements at slots {} and {} are out of order",
                        r.first_used + i - 1,
                        r.first_used + i
                    )));
                }
            }
            prev = Some(e);
        }
        Ok(())
    }
}

impl<T: Clone> OrderedFsSet<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Read-only copy without the free back region. Slot positions match
    /// the original's.
    pub fn snapshot(&self) -> ReadOnly<Self> {
        let mut copy = self.clone();
        copy.region.slots.truncate(copy.region.next_free);
        copy.region.slots.shrink_to_fit();
        ReadOnly::new(copy)
    }
}

/// A cursor between elements of an [`OrderedFsSet`], in comparator order.
pub struct OrderedCursor<'a, T> {
    set: &'a OrderedFsSet<T>,
    /// Slot of the element `next` would return.
    pos: usize,
}

impl<'a, T> OrderedCursor<'a, T> {
    pub fn new(set: &'a OrderedFsSet<T>) -> Self {
        OrderedCursor {
            set,
            pos: set.region.first_used,
        }
    }

    pub fn move_to_start(&mut self) {
        self.pos = self.set.region.first_used;
    }

    pub fn move_to_end(&mut self) {
        self.pos = self.set.region.next_free;
    }

    /// Places the cursor before the first element not less than `item`,
    /// ignoring identity.
    pub fn move_to(&mut self, item: &T) {
        let set = self.set;
        self.pos = match set.find_without_id(item) {
            Ok(hit) => set.binary_search_leftmost_equal(
                item,
                set.region.first_used,
                hit + 1,
                &*set.cmp_without_id,
            ),
            Err(insert_at) => insert_at,
        };
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.set.region.next_free
    }

    pub fn has_previous(&self) -> bool {
        self.pos > self.set.region.first_used
    }

    pub fn next(&mut self) -> Result<&'a T> {
        let set = self.set;
        let e = set.get_at(self.pos)?;
        self.pos += 1;
        Ok(e)
    }

    pub fn previous(&mut self) -> Result<&'a T> {
        if !self.has_previous() {
            return Err(Error::NoSuchElement);
        }
        self.pos -= 1;
        let set = self.set;
        set.get_at(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints() -> OrderedFsSet<i32> {
        OrderedFsSet::with_comparator(|a: &i32, b: &i32| a.cmp(b))
    }

    #[test]
    fn remove_from_middle() {
        let mut s = ints();
        for i in 1..=10 {
            assert!(s.add(i));
        }
        assert_eq!(s.remove(&5), Some(5));
        assert_eq!(s.to_vec(), vec![1, 2, 3, 4, 6, 7, 8, 9, 10]);
        s.check_invariants().unwrap();
    }

    #[test]
    fn duplicates_rejected() {
        let mut s = ints();
        assert!(s.add(3));
        assert!(s.add(1));
        assert!(!s.add(3));
        assert!(!s.add(1));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn descending_inserts_use_front_space() {
        let mut s = ints();
        for i in (0..1000).rev() {
            s.add(i);
        }
        s.check_invariants().unwrap();
        assert_eq!(s.to_vec(), (0..1000).collect::<Vec<_>>());
        assert!(s.capacity() >= 1000);
    }

    #[test]
    fn interleaved_inserts_stay_sorted() {
        let mut s = ints();
        let mut x = 17u32;
        let mut model = std::collections::BTreeSet::new();
        for _ in 0..2000 {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let k = (x >> 8) as i32 % 500;
            assert_eq!(s.add(k), model.insert(k));
            if k % 7 == 0 {
                assert_eq!(s.remove(&(k / 2)).is_some(), model.remove(&(k / 2)));
            }
        }
        s.check_invariants().unwrap();
        assert_eq!(s.to_vec(), model.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn remove_shifts_nearer_side() {
        let mut s = ints();
        for i in 0..8 {
            s.add(i);
        }
        assert_eq!(s.first_used_slot(), 0);
        s.remove(&1);
        assert_eq!(s.first_used_slot(), 1);
        assert_eq!(s.next_free_slot(), 8);
        s.remove(&6);
        assert_eq!(s.next_free_slot(), 7);
        assert_eq!(s.to_vec(), vec![0, 2, 3, 4, 5, 7]);
        s.check_invariants().unwrap();
    }

    #[test]
    fn navigation_queries() {
        let mut s = ints();
        for i in [10, 20, 30] {
            s.add(i);
        }
        assert_eq!(s.floor(&25), Some(&20));
        assert_eq!(s.floor(&20), Some(&20));
        assert_eq!(s.floor(&5), None);
        assert_eq!(s.ceiling(&25), Some(&30));
        assert_eq!(s.ceiling(&31), None);
        assert_eq!(s.lower(&20), Some(&10));
        assert_eq!(s.higher(&20), Some(&30));
        assert_eq!(s.higher(&30), None);
        assert_eq!(s.first(), Some(&10));
        assert_eq!(s.last(), Some(&30));
        assert_eq!(s.find(&25), Err(s.first_used_slot() + 2));
    }

    // (group, id): grouped by the first field, identity is the second
    fn grouped() -> OrderedFsSet<(i32, i32)> {
        OrderedFsSet::new(
            |a: &(i32, i32), b: &(i32, i32)| a.cmp(b),
            |a: &(i32, i32), b: &(i32, i32)| a.0.cmp(&b.0),
        )
    }

    #[test]
    fn cursor_moves_to_first_of_equal_run() {
        let mut s = grouped();
        for id in 0..5 {
            s.add((1, id));
            s.add((2, id));
            s.add((3, id));
        }
        let mut c = s.cursor();
        c.move_to(&(2, 99));
        assert_eq!(c.next(), Ok(&(2, 0)));
        assert_eq!(c.previous(), Ok(&(2, 0)));
        assert_eq!(c.previous(), Ok(&(1, 4)));
        c.move_to(&(9, 0));
        assert!(!c.has_next());
        assert_eq!(c.next(), Err(Error::NoSuchElement));
        c.move_to_start();
        assert_eq!(c.previous(), Err(Error::NoSuchElement));
    }

    #[test]
    fn leftmost_search_clamps_out_of_range_bounds() {
        let mut s = ints();
        for i in [2, 4, 6] {
            s.add(i);
        }
        let cmp = |a: &i32, b: &i32| a.cmp(b);
        let (first, next) = (s.first_used_slot(), s.next_free_slot());
        assert_eq!(s.binary_search_leftmost_equal(&4, 0, usize::MAX, &cmp), first + 1);
        assert_eq!(s.binary_search_leftmost_equal(&4, usize::MAX, usize::MAX, &cmp), next);
        assert_eq!(s.binary_search_leftmost_equal(&4, s.capacity() + 5, 0, &cmp), next);
        assert_eq!(s.binary_search_leftmost_equal(&9, first, next, &cmp), next);
    }

    #[test]
    fn clear_halves_mostly_unused_array() {
        let mut s = ints();
        for i in 0..1024 {
            s.add(i);
        }
        let cap = s.capacity();
        s.clear();
        assert_eq!(s.capacity(), cap);
        s.add(1);
        s.clear();
        assert_eq!(s.capacity(), cap / 2);
        assert!(s.is_empty());
        s.add(4);
        s.check_invariants().unwrap();
    }

    #[test]
    fn snapshot_drops_back_space() {
        let mut s = ints();
        for i in 0..5 {
            s.add(i);
        }
        let snap = s.snapshot();
        assert_eq!(snap.capacity(), snap.next_free_slot());
        assert_eq!(snap.get_at(s.first_used_slot()), Ok(&0));
        s.add(99);
        assert_eq!(snap.len(), 5);
        let mut writable = snap.into_inner();
        writable.add(7);
        assert_eq!(writable.to_vec(), vec![0, 1, 2, 3, 4, 7]);
    }
}
