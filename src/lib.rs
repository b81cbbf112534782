//! OffsetRing - Lock-Free Multi-Producer Single-Consumer Byte Ring Buffer
//!
//! A shared ring buffer where any number of registered producers reserve
//! contiguous byte ranges via a single CAS-advanced offset, and one
//! consumer drains whatever prefix of those reservations has been fully
//! published. Unlike a ring-decomposed design with one SPSC ring per
//! producer, every producer contends on the same `NEXT` word — there is
//! one buffer, not N.
//!
//! # Key Features
//!
//! - Wrap-safe via a packed offset/wrap-counter/wrap-lock word: a single
//!   64-bit CAS both advances the offset and defeats ABA across wraps.
//! - Zero-copy reserve/produce and consume/release API working directly on
//!   `&mut [u8]` / `&[u8]` slices into the buffer's own backing storage.
//! - Adaptive backoff (spin → yield) while waiting out the wrap lock or a
//!   producer mid-acquisition.
//! - Debug-only invariant checking; release builds pay nothing for it.
//!
//! # Example
//!
//! ```
//! use offsetring::{Config, RingBuffer};
//!
//! let ring = RingBuffer::new(Config::new(64, 4, false)).unwrap();
//! let producer = ring.register(0).unwrap();
//!
//! let mut reservation = producer.acquire(5).unwrap();
//! reservation.as_mut_slice().copy_from_slice(b"hello");
//! reservation.produce();
//!
//! let consumed = ring.consume();
//! assert_eq!(consumed.bytes(), b"hello");
//! consumed.release();
//! ```

mod backoff;
mod config;
mod error;
mod invariants;
mod metrics;
mod offset;
mod registry;
mod reservation;
mod ring;

pub use backoff::Backoff;
pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use error::{AcquireError, CreateError, RegisterError};
pub use metrics::{Metrics, MetricsSnapshot};
pub use reservation::{Consumed, Reservation};
pub use ring::{RingBuffer, Worker};
