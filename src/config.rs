/// Configuration for a [`RingBuffer`](crate::RingBuffer).
///
/// [`RingBuffer`]: crate::RingBuffer
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Capacity of the backing byte buffer, in bytes. Must be in `1..2^32`
    /// so every offset fits in the low 32 bits of the packed `NEXT` word;
    /// `u64` here only so an out-of-range value can be rejected by
    /// [`RingBuffer::new`](crate::RingBuffer::new) instead of silently
    /// truncating.
    pub capacity: u64,
    /// Maximum number of producers that may be registered at once.
    pub nworkers: usize,
    /// Enable metrics collection (slight overhead).
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    #[must_use]
    pub const fn new(capacity: u64, nworkers: usize, enable_metrics: bool) -> Self {
        Self {
            capacity,
            nworkers,
            enable_metrics,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1 << 16, // 64 KiB
            nworkers: 16,
            enable_metrics: false,
        }
    }
}

/// Configuration tuned for many short-lived messages from a handful of producers.
pub const LOW_LATENCY_CONFIG: Config = Config::new(1 << 12, 16, false);

/// Configuration tuned for fewer, larger reservations from many producers.
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(1 << 22, 64, false);
