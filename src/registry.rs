//! Per-producer worker records.
//!
//! Implements the storage half of SPEC_FULL.md §4.2's "array of slots"
//! variant: a fixed-size array, each entry independently registerable by a
//! caller-chosen index. The consumer enumerates the live set by scanning the
//! whole array and skipping unregistered or idle slots, which SPEC_FULL.md
//! explicitly permits (see the worker-registry Open Question resolution in
//! DESIGN.md) in place of the optional free/used versioned index-stack pair.

use crate::error::RegisterError;
use crate::offset::{self, SENTINEL};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Sentinel `seen_off` value meaning "this worker holds no reservation".
pub const SEEN_IDLE: u64 = u64::MAX;

pub(crate) struct WorkerSlot {
    /// Packed `(offset, unstable)` word, or `SEEN_IDLE` when idle.
    pub(crate) seen_off: AtomicU64,
    registered: AtomicBool,
}

impl WorkerSlot {
    fn new() -> Self {
        Self {
            seen_off: AtomicU64::new(SEEN_IDLE),
            registered: AtomicBool::new(false),
        }
    }
}

pub(crate) struct Registry {
    slots: Box<[WorkerSlot]>,
}

impl Registry {
    pub(crate) fn new(nworkers: usize) -> Self {
        let slots = (0..nworkers).map(|_| WorkerSlot::new()).collect();
        Self { slots }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, index: usize) -> &WorkerSlot {
        &self.slots[index]
    }

    /// Claims slot `index` for a new producer. Fails if out of range or
    /// already owned.
    pub(crate) fn register(&self, index: usize) -> Result<(), RegisterError> {
        let Some(slot) = self.slots.get(index) else {
            return Err(RegisterError::OutOfRange {
                index,
                nworkers: self.slots.len(),
            });
        };
        slot.registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| {
                slot.seen_off.store(SEEN_IDLE, Ordering::Release);
            })
            .map_err(|_| RegisterError::AlreadyRegistered { index })
    }

    /// Returns `index` to the unregistered pool.
    ///
    /// Precondition (debug-asserted): the producer holds no outstanding
    /// reservation, i.e. `seen_off == SEEN_IDLE`.
    pub(crate) fn unregister(&self, index: usize) {
        let slot = &self.slots[index];
        debug_assert!(
            slot.seen_off.load(Ordering::Acquire) == SEEN_IDLE,
            "unregistering worker {index} with an outstanding reservation"
        );
        slot.registered.store(false, Ordering::Release);
    }

    /// Scans every registered, stable, non-idle slot whose `seen_off >=
    /// written`, returning the minimum such offset (or `SENTINEL` if none).
    ///
    /// Spins past any slot mid-acquisition (`UNSTABLE` set) using `backoff`,
    /// per SPEC_FULL.md §4.5 step 2.
    pub(crate) fn min_live_seen_at_least(
        &self,
        written: u32,
        backoff: &mut crate::backoff::Backoff,
    ) -> u32 {
        let mut ready = SENTINEL;
        for slot in self.slots.iter() {
            if !slot.registered.load(Ordering::Acquire) {
                continue;
            }
            loop {
                let seen = slot.seen_off.load(Ordering::Acquire);
                if seen == SEEN_IDLE {
                    break;
                }
                if offset::seen_unstable(seen) {
                    backoff.snooze();
                    continue;
                }
                let off = offset::seen_offset(seen);
                if off >= written {
                    ready = ready.min(off);
                }
                break;
            }
            backoff.reset();
        }
        ready
    }
}
