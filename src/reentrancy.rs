//! Debug-only guard against reentrant mutation.
//!
//! Object sets call `Hash`/`Eq` and the ordered set calls comparators while
//! their slots may be mid-shift. If that user code reaches back into the
//! same structure, the guard panics in debug builds. Release builds compile
//! it away.

#[cfg(debug_assertions)]
use core::cell::Cell;

/// Per-structure nesting tracker. Public operations that run user code
/// take `let _g = self.guard.enter();` first.
#[derive(Debug)]
pub(crate) struct ReentrancyGuard {
    #[cfg(debug_assertions)]
    depth: Cell<u32>,
}

impl ReentrancyGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            depth: Cell::new(0),
        }
    }

    #[inline]
    pub(crate) fn enter(&self) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            let d = self.depth.get();
            assert!(d == 0, "reentrant call into a table while it was probing");
            self.depth.set(d + 1);
        }
        Entered { owner: self }
    }
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new()
    }
}

// A copy is a separate structure and starts outside any operation.
impl Clone for ReentrancyGuard {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// RAII token returned by [`ReentrancyGuard::enter`].
pub(crate) struct Entered<'a> {
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    owner: &'a ReentrancyGuard,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let d = self.owner.depth.get();
            debug_assert!(d > 0);
            self.owner.depth.set(d - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReentrancyGuard;

    #[test]
    fn sequential_entries_are_fine() {
        let g = ReentrancyGuard::new();
        {
            let _e = g.enter();
        }
        let _e = g.enter();
    }

    #[test]
    fn clone_starts_unentered() {
        let g = ReentrancyGuard::new();
        let _e = g.enter();
        let c = g.clone();
        let _e2 = c.enter();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_in_debug() {
        let g = ReentrancyGuard::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _e1 = g.enter();
            let _e2 = g.enter();
        }));
        assert!(res.is_err(), "expected nested entry to panic in debug builds");
    }
}
