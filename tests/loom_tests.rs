//! Loom-based concurrency tests for the packed `NEXT` word protocol.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom exhaustively explores all possible thread interleavings to find
//! concurrency bugs that might only occur under specific scheduling. We
//! model just the `NEXT` CAS/wrap-lock protocol in isolation (loom's own
//! atomics, not `std`'s, and a tiny capacity) to keep the state space
//! tractable -- the full `RingBuffer` pulls in too many independent atomics
//! for loom to explore in reasonable time.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicU64, Ordering};
use loom::sync::Arc;
use loom::thread;

const OFFSET_MASK: u64 = 0xFFFF_FFFF;
const WRAP_MASK: u64 = 0x7FFF_FFFF;
const WRAP_SHIFT: u32 = 32;
const LOCK_BIT: u64 = 1 << 63;

fn pack(offset: u32, wrap: u32, locked: bool) -> u64 {
    let lock = if locked { LOCK_BIT } else { 0 };
    lock | (((wrap as u64) & WRAP_MASK) << WRAP_SHIFT) | (offset as u64)
}

fn offset_of(word: u64) -> u32 {
    (word & OFFSET_MASK) as u32
}

fn wrap_of(word: u64) -> u32 {
    ((word >> WRAP_SHIFT) & WRAP_MASK) as u32
}

fn lock_of(word: u64) -> bool {
    word & LOCK_BIT != 0
}

/// Two producers racing to CAS-advance a shared `NEXT` word over a
/// capacity-4 buffer, with no consumer (WRITTEN pinned at 0) -- just enough
/// to exercise the overlapping-acquire and wrap-lock paths.
struct LoomNext {
    next: AtomicU64,
    capacity: u32,
}

impl LoomNext {
    fn new(capacity: u32) -> Self {
        Self {
            next: AtomicU64::new(pack(0, 0, false)),
            capacity,
        }
    }

    /// Attempts to reserve `len` bytes once (no retry loop, no backoff --
    /// loom interleaves for us). Returns `Some(start)` on success.
    fn try_acquire(&self, len: u32) -> Option<u32> {
        let seen = self.next.load(Ordering::Acquire);
        if lock_of(seen) {
            return None;
        }
        let next = offset_of(seen);
        let written = 0u32; // no consumer in this model
        let target = next as u64 + len as u64;

        if (next as u64) < written as u64 && target >= written as u64 {
            return None;
        }

        let capacity = self.capacity as u64;
        let (proposed, start) = if target < capacity {
            (pack(target as u32, wrap_of(seen), false), next)
        } else if target == capacity {
            (pack(0, wrap_of(seen).wrapping_add(1) & 0x7FFF_FFFF, false), next)
        } else {
            return None; // wrap-early path omitted from this reduced model
        };

        self.next
            .compare_exchange(seen, proposed, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| start)
    }
}

/// Two producers concurrently acquiring from the same `NEXT` word never
/// observe overlapping ranges.
#[test]
fn loom_two_producers_never_overlap() {
    loom::model(|| {
        let ring = Arc::new(LoomNext::new(4));
        let r1 = Arc::clone(&ring);
        let r2 = Arc::clone(&ring);

        let t1 = thread::spawn(move || r1.try_acquire(2));
        let t2 = thread::spawn(move || r2.try_acquire(2));

        let a = t1.join().unwrap();
        let b = t2.join().unwrap();

        match (a, b) {
            (Some(x), Some(y)) => assert_ne!(x, y, "both producers got the same start offset"),
            _ => {}
        }
    });
}

/// A producer never observes a granted range extending past `capacity`.
#[test]
fn loom_acquire_never_exceeds_capacity() {
    loom::model(|| {
        let ring = Arc::new(LoomNext::new(4));
        let r1 = Arc::clone(&ring);
        let r2 = Arc::clone(&ring);

        let t1 = thread::spawn(move || r1.try_acquire(3));
        let t2 = thread::spawn(move || r2.try_acquire(3));

        let a = t1.join().unwrap();
        let b = t2.join().unwrap();

        if let Some(start) = a {
            assert!(start + 3 <= 4);
        }
        if let Some(start) = b {
            assert!(start + 3 <= 4);
        }
    });
}

/// After both producers finish, `NEXT`'s offset field reflects exactly the
/// bytes actually granted (no double counting, no lost updates).
#[test]
fn loom_next_offset_matches_granted_total() {
    loom::model(|| {
        let ring = Arc::new(LoomNext::new(4));
        let r1 = Arc::clone(&ring);
        let r2 = Arc::clone(&ring);

        let t1 = thread::spawn(move || r1.try_acquire(2));
        let t2 = thread::spawn(move || r2.try_acquire(2));

        let a = t1.join().unwrap();
        let b = t2.join().unwrap();

        let granted = a.is_some() as u32 * 2 + b.is_some() as u32 * 2;
        let seen = ring.next.load(Ordering::Acquire);
        assert_eq!(offset_of(seen) % 4, granted % 4);
    });
}
