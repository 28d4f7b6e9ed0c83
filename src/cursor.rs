//! Slot positions and bidirectional cursors over int containers.

use crate::error::{Error, Result};

/// An int container whose slots can be walked by position.
///
/// Positions are slot indexes and only mean something until the next
/// mutation; a resize reorders every slot.
pub trait IntPositions {
    /// Position of the first element in slot order.
    fn move_to_first(&self) -> Option<usize>;

    /// Position of the last element in slot order.
    fn move_to_last(&self) -> Option<usize>;

    /// Position of the first element after `pos`.
    fn move_to_next(&self, pos: usize) -> Option<usize>;

    /// Position of the last element before `pos`.
    fn move_to_previous(&self, pos: usize) -> Option<usize>;

    /// The element at `pos`, or `NoSuchElement` if the slot holds none.
    fn key_at(&self, pos: usize) -> Result<i32>;

    /// A cursor positioned before the first element.
    fn cursor(&self) -> IntCursor<'_, Self>
    where
        Self: Sized,
    {
        IntCursor::new(self)
    }
}

/// First live slot at or after `from`.
#[inline]
pub(crate) fn next_live(
    capacity: usize,
    from: usize,
    is_live: impl Fn(usize) -> bool,
) -> Option<usize> {
    (from..capacity).find(|&p| is_live(p))
}

/// Last live slot strictly before `upto`.
#[inline]
pub(crate) fn previous_live(upto: usize, is_live: impl Fn(usize) -> bool) -> Option<usize> {
    (0..upto).rev().find(|&p| is_live(p))
}

/// A cursor that sits between elements, like a list iterator.
///
/// `next` returns the element after the cursor and steps over it;
/// `previous` returns the element before the cursor and steps back. The
/// cursor borrows the container, so it cannot outlive a mutation.
pub struct IntCursor<'a, S: ?Sized> {
    set: &'a S,
    next: Option<usize>,
    prev: Option<usize>,
}

impl<'a, S: IntPositions + ?Sized> IntCursor<'a, S> {
    pub fn new(set: &'a S) -> Self {
        IntCursor {
            set,
            next: set.move_to_first(),
            prev: None,
        }
    }

    pub fn move_to_start(&mut self) {
        self.next = self.set.move_to_first();
        self.prev = None;
    }

    pub fn move_to_end(&mut self) {
        self.next = None;
        self.prev = self.set.move_to_last();
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    #[inline]
    pub fn has_previous(&self) -> bool {
        self.prev.is_some()
    }

    /// Returns the element after the cursor and advances.
    pub fn next(&mut self) -> Result<i32> {
        let pos = self.next.ok_or(Error::NoSuchElement)?;
        let key = self.set.key_at(pos)?;
        self.prev = Some(pos);
        self.next = self.set.move_to_next(pos);
        Ok(key)
    }

    /// Returns the element before the cursor and steps back.
    pub fn previous(&mut self) -> Result<i32> {
        let pos = self.prev.ok_or(Error::NoSuchElement)?;
        let key = self.set.key_at(pos)?;
        self.next = Some(pos);
        self.prev = self.set.move_to_previous(pos);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Slots with gaps; 0 is empty.
    struct Slots(Vec<i32>);

    impl IntPositions for Slots {
        fn move_to_first(&self) -> Option<usize> {
            next_live(self.0.len(), 0, |p| self.0[p] != 0)
        }
        fn move_to_last(&self) -> Option<usize> {
            previous_live(self.0.len(), |p| self.0[p] != 0)
        }
        fn move_to_next(&self, pos: usize) -> Option<usize> {
            next_live(self.0.len(), pos + 1, |p| self.0[p] != 0)
        }
        fn move_to_previous(&self, pos: usize) -> Option<usize> {
            previous_live(pos, |p| self.0[p] != 0)
        }
        fn key_at(&self, pos: usize) -> Result<i32> {
            match self.0.get(pos) {
                Some(&k) if k != 0 => Ok(k),
                _ => Err(Error::NoSuchElement),
            }
        }
    }

    #[test]
    fn walks_forward_then_back() {
        let s = Slots(vec![0, 4, 0, 0, 7, 9, 0]);
        let mut c = s.cursor();
        assert!(!c.has_previous());
        assert_eq!(c.next(), Ok(4));
        assert_eq!(c.next(), Ok(7));
        assert_eq!(c.next(), Ok(9));
        assert!(!c.has_next());
        assert_eq!(c.next(), Err(Error::NoSuchElement));
        assert_eq!(c.previous(), Ok(9));
        assert_eq!(c.previous(), Ok(7));
        assert_eq!(c.next(), Ok(7));
    }

    #[test]
    fn move_to_end_and_start() {
        let s = Slots(vec![3, 0, 5]);
        let mut c = s.cursor();
        c.move_to_end();
        assert!(!c.has_next());
        assert_eq!(c.previous(), Ok(5));
        assert_eq!(c.previous(), Ok(3));
        assert_eq!(c.previous(), Err(Error::NoSuchElement));
        c.move_to_start();
        assert_eq!(c.next(), Ok(3));
    }

    #[test]
    fn empty_container_has_nothing() {
        let s = Slots(vec![0; 4]);
        let mut c = s.cursor();
        assert!(!c.has_next());
        c.move_to_end();
        assert!(!c.has_previous());
        assert_eq!(s.key_at(1), Err(Error::NoSuchElement));
    }
}
