/// One benchmark message, constructed from the producer's sequence number.
///
/// The four implementations cover the interesting axes: copy vs move,
/// trivial vs non-trivial destruction, and allocator involvement per
/// operation.
pub trait Payload: Send + 'static {
    /// Builds a payload carrying `seq`.
    fn from_seq(seq: u64) -> Self;
}

/// Small POD: one machine word.
impl Payload for u64 {
    #[inline]
    fn from_seq(seq: u64) -> Self {
        seq
    }
}

/// Large POD payload: 1024 bytes, filled with the sequence number.
#[derive(Clone, Copy)]
pub struct Block(pub [u64; 128]);

impl Payload for Block {
    #[inline]
    fn from_seq(seq: u64) -> Self {
        Block([seq; 128])
    }
}

/// Small move-only: owning pointer, one allocation per message.
impl Payload for Box<u64> {
    #[inline]
    fn from_seq(seq: u64) -> Self {
        Box::new(seq)
    }
}

/// Large move-only: owning pointer to the 1024-byte block.
impl Payload for Box<Block> {
    #[inline]
    fn from_seq(seq: u64) -> Self {
        Box::new(Block::from_seq(seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn payload_shapes() {
        assert_eq!(mem::size_of::<u64>(), 8);
        assert_eq!(mem::size_of::<Block>(), 1024);
        assert_eq!(mem::size_of::<Box<Block>>(), 8);

        assert_eq!(u64::from_seq(17), 17);
        let block = Block::from_seq(17);
        assert!(block.0.iter().all(|&w| w == 17));
        assert_eq!(*Box::<u64>::from_seq(17), 17);
        assert_eq!(Box::<Block>::from_seq(17).0[127], 17);
    }
}
