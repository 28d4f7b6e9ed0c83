//! fs-index-tables: open-addressing hash tables, an adaptive positive-int
//! set, and an array-backed ordered set, the containers an in-memory
//! object store's index layer is built from.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one probing/resizing engine per collision strategy, shared by
//!   every table that uses it, so growth and shrink policy is written once.
//! - Layers:
//!   - `linear_probe::LinearProbe`: tombstone-based linear probing. Owns
//!     the counters (size, removed, expansion threshold) and the resize
//!     policy; each table supplies its slot storage through the
//!     `ProbeTable` trait.
//!   - `robin_hood::RobinHood`: tombstone-free robin-hood hashing. Owns a
//!     one-byte-per-slot array packing an empty marker and 7 hash bits, so
//!     displacement is computed without touching keys. Removes shift the
//!     rest of the run back.
//!   - Tables: `IntHashSet`, `Int2IntHashMap`, `Int2ObjHashMap`,
//!     `Obj2IntIdentityHashMap` and `ObjHashSet` on the linear engine;
//!     `IntHashSetRh` and `ObjHashSetRh` on the robin-hood engine.
//!   - `PositiveIntSet`: switches among a bit set, a tiny vector and an
//!     `IntHashSet` by comparing estimated word counts on each add.
//!   - `OrderedFsSet`: comparator-ordered array with free space at both
//!     ends; inserts and removes shift toward the nearer end.
//!
//! Constraints
//! - Single writer: every mutation takes `&mut self`. No locking.
//! - Capacities are powers of two, at least 16.
//! - Int keys: 0 marks an empty slot and is rejected. The linear-probe
//!   int tables also reserve `i32::MIN` as their tombstone.
//! - Int sets store keys as `i16` relative to an offset while the range
//!   allows, and convert once, for good, to `i32` when it does not.
//! - Caller misuse is reported as `Error` before any slot is written.
//!
//! Hasher and rehashing invariants
//! - Object tables store each entry's folded 32-bit hash next to it and
//!   resize from the stored hash, so `Hash` never runs after insertion.
//! - Object sets and the ordered set run user code (`Hash`, `Eq`,
//!   comparators) mid-operation. A debug-only reentrancy guard panics if
//!   that code calls back into the same structure.
//!
//! Positions and cursors
//! - Tables expose slot positions (`find`, `move_to_next`, `key_at`, ...)
//!   so an owning index can build its own iterators. A position is valid
//!   until the next mutation. `IntCursor` and `OrderedCursor` wrap them in
//!   list-iterator style `next`/`previous`.
//!
//! Snapshots
//! - `Clone` is the writable deep copy. `snapshot()` returns a
//!   `ReadOnly<_>`, which only derefs to `&Self`.
//!
//! Logging
//! - Resizes, rebalances and representation switches log through the
//!   `log` facade at `debug`; clears at `trace`.

mod bit_set;
pub mod config;
pub mod cursor;
mod error;
pub mod hashing;
mod int2int_hash_map;
mod int2obj_hash_map;
mod int_hash_set;
mod int_hash_set_rh;
mod int_keys;
mod int_map_core;
mod linear_probe;
mod obj2int_identity_hash_map;
mod obj_hash_set;
mod obj_hash_set_rh;
mod obj_table;
mod ordered_fs_set;
mod positive_int_set;
mod reentrancy;
mod robin_hood;
mod snapshot;
mod tiny_set;

mod hash_tables_proptest;
mod positive_int_set_proptest;

// Public surface
pub use bit_set::IntBitSet;
pub use config::{SwitchPolicy, TableConfig};
pub use cursor::{IntCursor, IntPositions};
pub use error::{Error, Result};
pub use hashing::IdentityKey;
pub use int2int_hash_map::Int2IntHashMap;
pub use int2obj_hash_map::Int2ObjHashMap;
pub use int_hash_set::{IntHashSet, SPACE_OVERHEAD_IN_WORDS};
pub use int_hash_set_rh::IntHashSetRh;
pub use int_keys::FORCE_INT_OFFSET;
pub use obj2int_identity_hash_map::Obj2IntIdentityHashMap;
pub use obj_hash_set::ObjHashSet;
pub use obj_hash_set_rh::ObjHashSetRh;
pub use ordered_fs_set::{Comparator, OrderedCursor, OrderedFsSet, MULTIPLICATION_LIMIT};
pub use positive_int_set::PositiveIntSet;
pub use snapshot::ReadOnly;
pub use tiny_set::TinySet;
