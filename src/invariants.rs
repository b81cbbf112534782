//! Debug assertion macros for ring buffer invariants.
//!
//! These macros provide runtime checks for the invariants documented in
//! `SPEC_FULL.md` section 3. They are only active in debug builds
//! (`#[cfg(debug_assertions)]`), so there is zero overhead in release builds.

// =============================================================================
// INV-OFF-01: Offsets in range
// =============================================================================

/// Assert `WRITTEN <= capacity`.
///
/// **Invariant**: `0 <= WRITTEN <= capacity` and `0 <= offset_of(NEXT) < capacity`
macro_rules! debug_assert_offsets_in_range {
    ($written:expr, $capacity:expr) => {
        debug_assert!(
            $written <= $capacity,
            "INV-OFF-01 violated: WRITTEN {} exceeds capacity {}",
            $written,
            $capacity
        )
    };
}

// =============================================================================
// INV-OFF-02: Consumer never overtakes the ready frontier
// =============================================================================

/// Assert the consumer's new `WRITTEN` does not pass `ready`.
///
/// **Invariant**: `WRITTEN` may catch up to the computed ready frontier but
/// never overtake it.
macro_rules! debug_assert_written_not_past_ready {
    ($new_written:expr, $ready:expr) => {
        debug_assert!(
            $new_written <= $ready,
            "INV-OFF-02 violated: WRITTEN {} advanced past ready {}",
            $new_written,
            $ready
        )
    };
}

// =============================================================================
// INV-WRAP-01: Single wrap in flight
// =============================================================================

/// Assert that `END` was the unset sentinel before a producer claims it.
///
/// **Invariant**: at most one wrap-around is in flight at a time.
macro_rules! debug_assert_end_was_unset {
    ($end:expr) => {
        debug_assert!(
            $end == crate::offset::SENTINEL,
            "INV-WRAP-01 violated: END was already set to {} before a new wrap",
            $end
        )
    };
}

// =============================================================================
// INV-WRAP-02: Wrap counter is monotone modulo 2^31
// =============================================================================

/// Assert a wrap counter only moved forward (mod 2^31).
macro_rules! debug_assert_wrap_monotonic {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new == ($old.wrapping_add(1) & 0x7FFF_FFFF),
            "INV-WRAP-02 violated: wrap counter went from {} to {} (expected {})",
            $old,
            $new,
            $old.wrapping_add(1) & 0x7FFF_FFFF
        )
    };
}

// =============================================================================
// INV-RES-01: Acquire never grants past WRITTEN
// =============================================================================

/// Assert a just-granted reservation start does not cross `written` from below.
macro_rules! debug_assert_no_overtake {
    ($start:expr, $target:expr, $written:expr) => {
        debug_assert!(
            !($start < $written && $target >= $written),
            "INV-RES-01 violated: reservation [{}, {}) would cross WRITTEN {}",
            $start,
            $target,
            $written
        )
    };
}

// =============================================================================
// INV-REL-01: release() never advances WRITTEN past capacity or END
// =============================================================================

/// Assert `release(n)` leaves `WRITTEN` within bounds.
macro_rules! debug_assert_release_in_bounds {
    ($new_written:expr, $capacity:expr, $end:expr) => {
        debug_assert!(
            $new_written <= $capacity,
            "INV-REL-01 violated: WRITTEN {} exceeds capacity {}",
            $new_written,
            $capacity
        );
        debug_assert!(
            $end == crate::offset::SENTINEL || $new_written <= $end,
            "INV-REL-01 violated: WRITTEN {} advanced past active END {}",
            $new_written,
            $end
        )
    };
}

pub(crate) use debug_assert_end_was_unset;
pub(crate) use debug_assert_no_overtake;
pub(crate) use debug_assert_offsets_in_range;
pub(crate) use debug_assert_release_in_bounds;
pub(crate) use debug_assert_wrap_monotonic;
pub(crate) use debug_assert_written_not_past_ready;
