use std::sync::atomic::AtomicU64;

/// Cursor pair layout for [`MpmcRing`](crate::MpmcRing).
///
/// The ring issues producer tickets from `head` and consumer tickets from
/// `tail`. Whether those two atomics share a cache line is a measurable
/// tuning knob: co-located cursors halve the footprint but let producer and
/// consumer sides invalidate each other's lines. Both layouts expose the
/// same operational contract; callers pick one as a type parameter so the
/// choice is monomorphized out of the hot path.
pub trait CursorLayout: Send + Sync + 'static {
    /// Fresh cursor pair, both counters at zero.
    fn new() -> Self;

    /// Next producer ticket to be issued.
    fn head(&self) -> &AtomicU64;

    /// Next consumer ticket to be issued.
    fn tail(&self) -> &AtomicU64;
}

/// Wrapper type that ensures cache-line alignment so the wrapped value
/// does not share its line with a neighbor.
#[repr(align(64))]
pub(crate) struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// Each cursor alone in its own cache line; suppresses false sharing
/// between the producer and consumer sides.
pub struct PaddedCursors {
    head: CacheAligned<AtomicU64>,
    tail: CacheAligned<AtomicU64>,
}

impl CursorLayout for PaddedCursors {
    fn new() -> Self {
        Self {
            head: CacheAligned::new(AtomicU64::new(0)),
            tail: CacheAligned::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn head(&self) -> &AtomicU64 {
        &self.head
    }

    #[inline]
    fn tail(&self) -> &AtomicU64 {
        &self.tail
    }
}

/// Adjacent cursors, no padding. The baseline layout for measuring what
/// the padding actually buys.
pub struct CompactCursors {
    head: AtomicU64,
    tail: AtomicU64,
}

impl CursorLayout for CompactCursors {
    fn new() -> Self {
        Self {
            head: AtomicU64::new(0),
            tail: AtomicU64::new(0),
        }
    }

    #[inline]
    fn head(&self) -> &AtomicU64 {
        &self.head
    }

    #[inline]
    fn tail(&self) -> &AtomicU64 {
        &self.tail
    }
}
