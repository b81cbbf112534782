use thiserror::Error;

/// Error returned by [`RingBuffer::new`](crate::RingBuffer::new).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CreateError {
    /// `capacity` does not fit in the 32-bit offset field, or is zero, or
    /// `nworkers` is zero.
    #[error("invalid capacity/worker count: capacity {capacity} (must be 1..2^32), nworkers {nworkers} (must be >= 1)")]
    InvalidCapacity { capacity: u64, nworkers: usize },
}

/// Error returned by [`RingBuffer::register`](crate::RingBuffer::register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// `worker_index` is not in `[0, nworkers)`.
    #[error("worker index {index} out of range (nworkers: {nworkers})")]
    OutOfRange { index: usize, nworkers: usize },
    /// The requested slot already has an owner.
    #[error("worker index {index} is already registered")]
    AlreadyRegistered { index: usize },
}

/// Error returned by [`Worker::acquire`](crate::Worker::acquire).
///
/// `WouldOvertake` is the ordinary back-pressure signal described in
/// SPEC_FULL.md section 7: producers are expected to see and retry on it
/// routinely, not treat it as exceptional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// Granting this reservation would let the producer overtake the consumer.
    #[error("acquire refused: would overtake the consumer")]
    WouldOvertake,
    /// `len == 0` or `len > capacity`; this can never succeed, regardless of retries.
    #[error("acquire refused: len {len} is invalid for capacity {capacity}")]
    TooLarge { len: u32, capacity: u32 },
}
