//! Miri-compatible tests for detecting undefined behavior.
//!
//! Run with: `cargo +nightly miri test -p mpmcring --test miri_tests`
//!
//! Small capacities and short sequences keep the interpreter fast while
//! still exercising every unsafe path: uninitialized slot storage, the
//! wrap-around reuse of slots, move-out on pop, and the destructor's
//! live-range walk.

use mpmcring::MpmcRing;

#[test]
fn miri_basic_push_pop() {
    let ring = MpmcRing::<u64>::new(4).unwrap();

    assert!(ring.try_push(100).is_ok());
    assert!(ring.try_push(200).is_ok());
    assert_eq!(ring.try_pop(), Some(100));
    assert_eq!(ring.try_pop(), Some(200));
    assert_eq!(ring.try_pop(), None);
}

#[test]
fn miri_wrap_around() {
    let ring = MpmcRing::<u32>::new(2).unwrap();

    // Fill and drain repeatedly to exercise slot reuse across cycles
    for round in 0..3u32 {
        for i in 0..2 {
            assert!(ring.try_push(round * 10 + i).is_ok());
        }
        for i in 0..2 {
            assert_eq!(ring.try_pop(), Some(round * 10 + i));
        }
    }
}

#[test]
fn miri_move_only_handoff() {
    let ring = MpmcRing::<Box<u64>>::new(2).unwrap();

    assert!(ring.try_push(Box::new(1)).is_ok());
    assert!(ring.try_push(Box::new(2)).is_ok());
    let rejected = ring.try_push(Box::new(3)).unwrap_err();
    assert_eq!(*rejected.into_inner(), 3);

    assert_eq!(*ring.try_pop().unwrap(), 1);
    assert_eq!(*ring.try_pop().unwrap(), 2);
}

#[test]
fn miri_destructor_partial_fill() {
    // Drop a ring holding live values; miri flags any leak or double-free
    let ring = MpmcRing::<String>::new(4).unwrap();
    assert!(ring.try_push("alpha".to_string()).is_ok());
    assert!(ring.try_push("beta".to_string()).is_ok());
    assert_eq!(ring.try_pop().as_deref(), Some("alpha"));
    drop(ring);
}

#[test]
fn miri_blocking_single_thread() {
    // Blocking variants never wait when the slot is already ready
    let ring = MpmcRing::<u64>::new(2).unwrap();
    ring.push(7);
    assert_eq!(ring.pop(), 7);
}
