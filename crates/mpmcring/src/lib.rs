//! mpmcring - Bounded lock-free multi-producer / multi-consumer ring buffer
//!
//! A fixed-capacity MPMC queue built on ticketed cursors and per-slot
//! sequence codes: every slot carries a monotonically advancing `code` that
//! says which producer or consumer ticket it is ready for, so full/empty
//! detection is structural rather than a racy cursor comparison.
//!
//! # Key properties
//!
//! - `try_push` / `try_pop` are lock-free and never block; a failed
//!   `try_push` returns the value to the caller untouched
//! - `push` / `pop` claim a ticket and spin with CPU pause hints (no OS
//!   wait primitives; built for sub-microsecond handoff)
//! - Per-slot release/acquire handoff; cursors stay relaxed
//! - Cursor cache-line padding is a type parameter ([`PaddedCursors`] /
//!   [`CompactCursors`]) so the layout cost can be measured, not assumed
//!
//! # Example
//!
//! ```
//! use mpmcring::MpmcRing;
//!
//! let ring = MpmcRing::<u64>::new(8).unwrap();
//! assert_eq!(ring.capacity(), 8);
//!
//! ring.try_push(7).unwrap();
//! ring.push(11);
//! assert_eq!(ring.try_pop(), Some(7));
//! assert_eq!(ring.pop(), 11);
//! assert!(ring.is_empty());
//! ```

mod backoff;
mod error;
mod invariants;
mod layout;
mod ring;

pub use backoff::Backoff;
pub use error::{Full, RingError};
pub use layout::{CompactCursors, CursorLayout, PaddedCursors};
pub use ring::MpmcRing;
