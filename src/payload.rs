use std::iter;

/// One round's worth of memory: a fixed-length block where every byte is the same fill value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Box<[u8]>,
}

impl Payload {
    /// Builds a payload of `len` bytes for the given round.
    ///
    /// The whole buffer is reserved in a single allocation before anything is written, so resident
    /// memory grows by `len` in one step instead of through a series of doublings.
    pub fn new(round: usize, len: usize) -> Self {
        let fill = fill_byte(round);
        let mut bytes = Vec::with_capacity(len);
        bytes.extend(iter::repeat(fill).take(len));
        // len == capacity, so this does not reallocate
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Fill value for a round: the round number wrapped to a byte.
pub fn fill_byte(round: usize) -> u8 {
    (round % 256) as u8
}
