//! Linear-scan set for a handful of ints.

use crate::cursor::IntPositions;
use crate::error::{Error, Result};

/// Unsorted vector of distinct ints; every operation is a linear scan.
/// Positions are vector indexes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TinySet {
    members: Vec<i32>,
}

impl TinySet {
    pub fn with_capacity(capacity: usize) -> Self {
        TinySet {
            members: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, key: i32) -> bool {
        if self.members.contains(&key) {
            return false;
        }
        self.members.push(key);
        true
    }

    pub fn remove(&mut self, key: i32) -> bool {
        match self.find(key) {
            Some(pos) => {
                self.members.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: i32) -> bool {
        self.members.contains(&key)
    }

    pub fn find(&self, key: i32) -> Option<usize> {
        self.members.iter().position(|&m| m == key)
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.members.iter().copied()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.members
    }
}

impl IntPositions for TinySet {
    fn move_to_first(&self) -> Option<usize> {
        (!self.members.is_empty()).then_some(0)
    }

    fn move_to_last(&self) -> Option<usize> {
        self.members.len().checked_sub(1)
    }

    fn move_to_next(&self, pos: usize) -> Option<usize> {
        let next = pos + 1;
        (next < self.members.len()).then_some(next)
    }

    fn move_to_previous(&self, pos: usize) -> Option<usize> {
        pos.min(self.members.len()).checked_sub(1)
    }

    fn key_at(&self, pos: usize) -> Result<i32> {
        self.members.get(pos).copied().ok_or(Error::NoSuchElement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_members() {
        let mut t = TinySet::with_capacity(4);
        assert!(t.add(9));
        assert!(t.add(2));
        assert!(!t.add(9));
        assert_eq!(t.len(), 2);
        assert!(t.remove(9));
        assert!(!t.contains(9));
        assert_eq!(t.as_slice(), &[2]);
    }

    #[test]
    fn positions_are_indexes() {
        let mut t = TinySet::default();
        for k in [5, 6, 7] {
            t.add(k);
        }
        assert_eq!(t.move_to_last(), Some(2));
        assert_eq!(t.move_to_next(2), None);
        assert_eq!(t.move_to_previous(0), None);
        assert_eq!(t.key_at(1), Ok(6));
        assert_eq!(t.key_at(3), Err(Error::NoSuchElement));
    }
}
