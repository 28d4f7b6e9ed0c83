// Object-keyed tables through the public API.
//
// Invariants exercised:
// - The identity map tells apart equal values at different addresses.
// - Object sets compare by Eq and look up through Borrow.
// - retain may delete during its walk and leaves the set consistent.
// - Reentering a set from its own Hash/Eq panics in debug builds.
use fs_index_tables::{Obj2IntIdentityHashMap, ObjHashSet, ObjHashSetRh};
use slotmap::SlotMap;
use std::cell::{Cell, RefCell};
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

#[test]
fn identity_map_ignores_value_equality() {
    let a = Rc::new("same".to_string());
    let b = Rc::new("same".to_string());
    let mut m = Obj2IntIdentityHashMap::new();
    assert_eq!(m.put(Rc::clone(&a), 1), 0);
    assert_eq!(m.put(Rc::clone(&b), 2), 0);
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(&a), 1);
    assert_eq!(m.get(&b), 2);
    assert_eq!(m.put(Rc::clone(&a), 10), 1);
    assert_eq!(m.remove(&b), 2);
    assert_eq!(m.get(&b), 0);
    assert!(m.contains(&a));
    m.check_invariants().unwrap();
}

#[test]
fn identity_map_over_arena_handles() {
    let mut arena: SlotMap<slotmap::DefaultKey, &str> = SlotMap::new();
    let handles: Vec<_> = (0..500).map(|_| arena.insert("node")).collect();
    let mut m = Obj2IntIdentityHashMap::with_size(4);
    for (i, &h) in handles.iter().enumerate() {
        m.put(h, i as i32);
    }
    for (i, h) in handles.iter().enumerate().step_by(2) {
        assert_eq!(m.remove(h), i as i32);
    }
    assert_eq!(m.len(), 250);
    for (i, h) in handles.iter().enumerate() {
        assert_eq!(m.get(h), if i % 2 == 1 { i as i32 } else { 0 });
    }
    let mut values: Vec<i32> = m.values().collect();
    values.sort_unstable();
    assert_eq!(values, (1..500).step_by(2).collect::<Vec<_>>());
}

#[test]
fn object_sets_agree() {
    let mut lin = ObjHashSet::new();
    let mut rh = ObjHashSetRh::new();
    for i in 0..2000 {
        let w = format!("w{}", i % 1500);
        assert_eq!(lin.add(w.clone()), rh.add(w));
    }
    assert_eq!(lin.len(), 1500);
    assert_eq!(rh.len(), 1500);
    assert!(lin.retain(|w| w.ends_with('7')));
    assert!(rh.retain(|w| w.ends_with('7')));
    assert_eq!(lin.len(), 150);
    assert_eq!(rh.len(), 150);
    assert!(lin.contains("w1497"));
    assert!(rh.contains("w1497"));
    assert!(!rh.contains("w1498"));
    lin.check_invariants().unwrap();
    rh.check_invariants().unwrap();

    let mut a = lin.to_vec();
    let mut b = rh.to_vec();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[test]
fn snapshots_keep_contents() {
    let mut s = ObjHashSet::new();
    s.add(1u8);
    s.add(2u8);
    let snap = s.snapshot();
    s.clear();
    assert!(snap.contains(&1));
    assert_eq!(snap.len(), 2);
    assert!(s.is_empty());
}

// A key whose Hash looks itself up in the set that holds it, once.
struct Nosy {
    id: u32,
    home: Rc<RefCell<Weak<ObjHashSet<Nosy>>>>,
    armed: Rc<Cell<bool>>,
}

impl Nosy {
    fn new(id: u32, home: &Rc<RefCell<Weak<ObjHashSet<Nosy>>>>, armed: &Rc<Cell<bool>>) -> Self {
        Nosy {
            id,
            home: Rc::clone(home),
            armed: Rc::clone(armed),
        }
    }
}

impl PartialEq for Nosy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Nosy {}

impl Hash for Nosy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.armed.replace(false) {
            if let Some(set) = self.home.borrow().upgrade() {
                let inert = Nosy::new(0, &Rc::new(RefCell::new(Weak::new())), &Rc::default());
                let _ = set.contains(&inert);
            }
        }
        self.id.hash(state);
    }
}

#[test]
fn reentry_from_hash_is_caught_in_debug() {
    let home = Rc::new(RefCell::new(Weak::new()));
    let armed = Rc::new(Cell::new(false));
    let mut set = ObjHashSet::new();
    set.add(Nosy::new(1, &home, &armed));
    let set = Rc::new(set);
    *home.borrow_mut() = Rc::downgrade(&set);

    armed.set(true);
    let key = Nosy::new(1, &home, &armed);
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| set.contains(&key)));
    if cfg!(debug_assertions) {
        assert!(res.is_err(), "expected reentrant lookup to panic");
    } else {
        assert!(matches!(res, Ok(true)));
    }
}
