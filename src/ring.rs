//! The core lock-free MPSC byte ring buffer.
//!
//! Implements the coordination protocol from SPEC_FULL.md §4.3–§4.6: a
//! packed `NEXT` word CAS-advanced by producers, a wrap lock and wrap
//! counter to make wrap-around safe and ABA-proof, and a consumer that
//! derives the "ready" frontier from `NEXT` and every live producer's
//! `seen_off`.
//!
//! # Memory ordering strategy
//!
//! - `NEXT` is read with `Acquire` by every party (producers in step 1,
//!   consumer in step 1 of §4.5) so that a `seen_off` subsequently read was
//!   written by a producer whose CAS is already visible.
//! - A producer's `seen_off` is stored with `Release` once stable (§4.3 step
//!   7); the consumer's skip of an idle (`SEEN_IDLE`) slot synchronizes with
//!   that release, matching §4.4's "release fence before marking idle".
//! - `END` is stored with `Release` by the wrapping producer before the
//!   wrap lock is cleared (also `Release`), and is cleared with `Release` by
//!   the consumer before `WRITTEN` is reset to 0 on its own wrap (§4.5 step
//!   3), so the sentinel-clear is never reordered after the visible
//!   `WRITTEN = 0`.
//!
//! Variant-2 worker bookkeeping (SPEC_FULL.md §4.2) implies `seen_off` is
//! only ever written *after* a producer's `NEXT` CAS succeeds — there is
//! nothing to roll back on the overtake-check failure in step 4, since
//! nothing was published yet. See `registry.rs` for the slot storage.

use crate::backoff::Backoff;
use crate::config::Config;
use crate::error::{AcquireError, CreateError, RegisterError};
use crate::invariants::{
    debug_assert_end_was_unset, debug_assert_no_overtake, debug_assert_offsets_in_range,
    debug_assert_release_in_bounds, debug_assert_wrap_monotonic, debug_assert_written_not_past_ready,
};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::offset::{self, SENTINEL};
use crate::registry::Registry;
use crate::reservation::{Consumed, Reservation};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::{debug, trace};

/// A lock-free multi-producer/single-consumer byte ring buffer.
///
/// Bundles its own capacity-sized backing storage (SPEC_FULL.md §9's
/// "ownership re-architecture" option (a)), so producers and the consumer
/// exchange `&mut [u8]` / `&[u8]` slices rather than raw offsets.
pub struct RingBuffer {
    capacity: u32,
    next: CachePadded<AtomicU64>,
    written: CachePadded<AtomicU32>,
    end: AtomicU32,
    registry: Registry,
    storage: UnsafeCell<Box<[u8]>>,
    metrics: Metrics,
    config: Config,
}

// Safety: all shared mutable state (`next`, `written`, `end`, registry
// slots) is atomic; `storage` is only ever sliced into disjoint, exclusively
// owned subranges by the acquire/produce/consume/release protocol below.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Creates a new ring buffer with the given configuration.
    pub fn new(config: Config) -> Result<Self, CreateError> {
        if config.capacity == 0 || config.capacity >= (1u64 << 32) || config.nworkers == 0 {
            return Err(CreateError::InvalidCapacity {
                capacity: config.capacity,
                nworkers: config.nworkers,
            });
        }
        let capacity = config.capacity as u32;

        Ok(Self {
            capacity,
            next: CachePadded::new(AtomicU64::new(offset::pack(0, 0, false))),
            written: CachePadded::new(AtomicU32::new(0)),
            end: AtomicU32::new(SENTINEL),
            registry: Registry::new(config.nworkers),
            storage: UnsafeCell::new(vec![0u8; capacity as usize].into_boxed_slice()),
            metrics: Metrics::new(),
            config,
        })
    }

    /// Returns the buffer's fixed capacity, in bytes.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Reports `(buffer_bytes, worker_bytes)` for callers sizing an external
    /// allocation (e.g. shared memory) before construction. Informational
    /// only: this crate always allocates its own backing storage.
    #[must_use]
    pub fn size_of(capacity: u32, nworkers: usize) -> (usize, usize) {
        (capacity as usize, nworkers * std::mem::size_of::<u64>())
    }

    /// Registers a new producer at `worker_index`.
    pub fn register(&self, worker_index: usize) -> Result<Worker<'_>, RegisterError> {
        self.registry.register(worker_index)?;
        trace!(worker_index, "producer registered");
        Ok(Worker {
            ring: self,
            index: worker_index,
        })
    }

    /// Metrics snapshot. Only updated when [`Config::enable_metrics`] was set
    /// at construction; otherwise every counter stays at zero.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn storage_slice(&self, start: u32, len: u32) -> &mut [u8] {
        // Safety: the caller (acquire/consume) has already established that
        // `[start, start+len)` is exclusively owned by it for the duration
        // of this borrow: producers own their freshly granted reservation
        // until `produce`, and the consumer owns `[WRITTEN, READY)` until
        // the next `release`. No two callers are ever handed overlapping
        // ranges, by the protocol's overtake invariant.
        unsafe {
            let buf = &mut *self.storage.get();
            &mut buf[start as usize..start as usize + len as usize]
        }
    }

    /// Raw acquire: reserves `len` contiguous bytes for `worker_index`,
    /// returning the start offset. See SPEC_FULL.md §4.3.
    fn acquire_raw(&self, worker_index: usize, len: u32) -> Result<u32, AcquireError> {
        if len == 0 || len > self.capacity {
            return Err(AcquireError::TooLarge {
                len,
                capacity: self.capacity,
            });
        }
        let slot = self.registry.slot(worker_index);
        let mut backoff = Backoff::new();

        loop {
            // Step 1: stable read of NEXT.
            let mut seen = self.next.load(Ordering::Acquire);
            while offset::lock_of(seen) {
                backoff.snooze();
                if backoff.is_completed() {
                    debug!(worker_index, "spinning past wrap lock in acquire");
                }
                seen = self.next.load(Ordering::Acquire);
            }
            backoff.reset();

            let next = offset::offset_of(seen);
            let written = self.written.load(Ordering::Acquire);
            let target = next as u64 + len as u64;

            // Step 4: overtake check against the un-wrapped start.
            if (next as u64) < written as u64 && target >= written as u64 {
                if self.config.enable_metrics {
                    self.metrics.add_acquire_refused();
                }
                trace!(worker_index, len, next, written, "acquire refused: would overtake");
                return Err(AcquireError::WouldOvertake);
            }

            let capacity = self.capacity as u64;
            let (proposed, start, wraps) = if target < capacity {
                let proposed = offset::pack(target as u32, offset::wrap_of(seen), false);
                (proposed, next, false)
            } else if target == capacity {
                // Exact-fit flush reset. `NEXT`'s offset becomes 0, same as
                // an empty buffer's. That's only safe when there is no
                // already-pending data this would strand behind the
                // ambiguity (i.e. when the buffer started this acquire
                // genuinely empty, `next == written == 0`); otherwise the
                // next `consume()` would read `next == written` and report
                // empty forever, losing everything still unconsumed.
                if written == 0 && next != 0 {
                    if self.config.enable_metrics {
                        self.metrics.add_acquire_refused();
                    }
                    return Err(AcquireError::WouldOvertake);
                }
                let wrap2 = offset::wrap_of(offset::incr_wrap(seen));
                (offset::pack(0, wrap2, false), next, false)
            } else {
                // Step 5, third bullet: must wrap early.
                if (len as u64) >= written as u64 {
                    if self.config.enable_metrics {
                        self.metrics.add_acquire_refused();
                    }
                    return Err(AcquireError::WouldOvertake);
                }
                let wrap2 = offset::wrap_of(offset::incr_wrap(seen));
                (offset::pack(len, wrap2, true), 0, true)
            };

            debug_assert_no_overtake!(start as u64, start as u64 + len as u64, written as u64);
            if wraps {
                debug_assert_wrap_monotonic!(offset::wrap_of(seen), offset::wrap_of(proposed));
            }

            // Step 6: commit.
            if self
                .next
                .compare_exchange(seen, proposed, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                backoff.snooze();
                continue;
            }

            if wraps {
                // Step 5's bookkeeping: publish END before anything else can
                // observe the wrap having happened.
                debug_assert_end_was_unset!(self.end.load(Ordering::Acquire));
                self.end.store(next, Ordering::Release);
                debug!(worker_index, end = next, "producer wrap-around: END published");
            }

            // Step 7: publish the stable seen_off, now that NEXT truly
            // reflects this reservation.
            slot.seen_off
                .store(offset::pack_seen(start, false), Ordering::Release);

            if wraps {
                // Step 8: release the wrap lock after END is visible.
                let cleared = offset::clear_lock(proposed);
                self.next.store(cleared, Ordering::Release);
                if self.config.enable_metrics {
                    self.metrics.add_wrap();
                }
            }

            if self.config.enable_metrics {
                self.metrics.add_acquire_granted();
            }
            return Ok(start);
        }
    }

    pub(crate) fn produce_internal(&self, worker_index: usize) {
        let slot = self.registry.slot(worker_index);
        debug_assert!(
            slot.seen_off.load(Ordering::Relaxed) != crate::registry::SEEN_IDLE,
            "produce() called without a matching acquire()"
        );
        slot.seen_off
            .store(crate::registry::SEEN_IDLE, Ordering::Release);
        if self.config.enable_metrics {
            self.metrics.add_produce();
        }
    }

    /// Raw consume: returns the next eligible contiguous range's offset and
    /// length. See SPEC_FULL.md §4.5.
    fn consume_raw(&self) -> (u32, u32) {
        let mut backoff = Backoff::new();
        loop {
            let written = self.written.load(Ordering::Relaxed);
            debug_assert_offsets_in_range!(written, self.capacity);

            let mut seen = self.next.load(Ordering::Acquire);
            while offset::lock_of(seen) {
                backoff.snooze();
                if backoff.is_completed() {
                    debug!("consumer spinning past wrap lock");
                }
                seen = self.next.load(Ordering::Acquire);
            }
            backoff.reset();
            let next = offset::offset_of(seen);

            if next == written {
                if self.config.enable_metrics {
                    self.metrics.add_consume(0);
                }
                return (written, 0);
            }

            let mut ready = self.registry.min_live_seen_at_least(written, &mut backoff);

            if next < written {
                // Producers have wrapped; the consumer has not caught up yet.
                // `END` is only ever set by a wrap-early (step 5 third
                // bullet) acquire; an exact-fit wrap leaves it unset, since
                // the whole capacity was used with no short last region --
                // treat that as `END == capacity`.
                let end_raw = self.end.load(Ordering::Acquire);
                let end = if end_raw == SENTINEL {
                    self.capacity
                } else {
                    end_raw.min(self.capacity)
                };

                if ready == SENTINEL && written == end {
                    // The consumer wraps too.
                    self.end.store(SENTINEL, Ordering::Release);
                    self.written.store(0, Ordering::Release);
                    trace!("consumer wrap-around: WRITTEN reset to 0");
                    continue;
                }
                ready = ready.min(end);
                debug_assert_written_not_past_ready!(written, ready);
            } else {
                ready = ready.min(next);
                debug_assert_written_not_past_ready!(written, ready);
            }

            let len = ready - written;
            if self.config.enable_metrics {
                self.metrics.add_consume(len as usize);
            }
            return (written, len);
        }
    }

    /// Returns the next eligible contiguous byte range, or an empty
    /// [`Consumed`] if nothing is ready.
    ///
    /// Calling `consume` again without [`release`](Consumed::release)
    /// returns the identical range (SPEC_FULL.md §8 property 7).
    pub fn consume(&self) -> Consumed<'_> {
        let (offset, len) = self.consume_raw();
        let slice = &self.storage_slice(offset, len)[..];
        Consumed::new(slice, self)
    }

    /// Advances `WRITTEN` past `n` previously consumed bytes.
    pub fn release(&self, n: usize) {
        let n = n as u32;
        let written = self.written.load(Ordering::Relaxed);
        let new_written = if written + n == self.capacity {
            0
        } else {
            written + n
        };
        debug_assert_release_in_bounds!(new_written, self.capacity, self.end.load(Ordering::Acquire));
        self.written.store(new_written, Ordering::Release);
    }
}

/// A registered producer handle.
///
/// Does not implement `Clone`: only one thread may hold a given
/// `worker_index`'s reservation at a time, which is what lets `acquire`
/// avoid locking against itself.
pub struct Worker<'a> {
    ring: &'a RingBuffer,
    index: usize,
}

impl<'a> Worker<'a> {
    /// This worker's registered index.
    #[inline]
    pub fn id(&self) -> usize {
        self.index
    }

    /// Reserves `len` contiguous bytes. See SPEC_FULL.md §4.3.
    pub fn acquire(&self, len: u32) -> Result<Reservation<'a>, AcquireError> {
        let start = self.ring.acquire_raw(self.index, len)?;
        let slice = self.ring.storage_slice(start, len);
        Ok(Reservation::new(slice, self.ring, self.index))
    }

    /// Returns this worker's slot to the unregistered pool.
    ///
    /// Precondition (debug-asserted in [`Registry::unregister`]): no
    /// outstanding reservation.
    ///
    /// [`Registry::unregister`]: crate::registry::Registry::unregister
    pub fn unregister(self) {
        self.ring.registry.unregister(self.index);
        trace!(worker_index = self.index, "producer unregistered");
    }
}
