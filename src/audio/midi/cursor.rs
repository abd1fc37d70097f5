//! Bounded big-endian reader for SMF chunk data
//!
//! Every read is checked against the cursor's end bound and returns `None`
//! instead of reading past it. Callers decide whether running out of bytes
//! is fatal or just truncates the current chunk.

/// Maximum number of bytes in a MIDI variable-length quantity
pub const VLQ_MAX_BYTES: usize = 4;

/// Decode a variable-length quantity from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed. Decoding stops after
/// [`VLQ_MAX_BYTES`] bytes even if the last one still has its continuation
/// bit set. Returns `None` if `bytes` ends before the quantity does.
pub fn decode_vlq(bytes: &[u8]) -> Option<(u32, usize)> {
    let mut value = 0u32;
    for (i, &byte) in bytes.iter().take(VLQ_MAX_BYTES).enumerate() {
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 || i + 1 == VLQ_MAX_BYTES {
            return Some((value, i + 1));
        }
    }
    None
}

/// Forward-only reader over a byte slice with an explicit end bound
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> ByteCursor<'a> {
    /// Cursor over the whole slice
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            end: data.len(),
        }
    }

    /// Absolute offset of the next byte to be read
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end bound
    #[inline]
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    /// Split off a cursor over the next `len` bytes and advance past them.
    ///
    /// `len` is clamped to what remains, so a chunk that declares more bytes
    /// than the buffer holds yields a shorter sub-cursor. The second value
    /// reports whether clamping happened.
    pub fn take(&mut self, len: usize) -> (ByteCursor<'a>, bool) {
        let available = self.remaining();
        let clamped = len > available;
        let len = len.min(available);
        let sub = ByteCursor {
            data: self.data,
            pos: self.pos,
            end: self.pos + len,
        };
        self.pos += len;
        (sub, clamped)
    }

    #[inline]
    pub fn peek_u8(&self) -> Option<u8> {
        if self.is_empty() {
            None
        } else {
            Some(self.data[self.pos])
        }
    }

    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Some(byte)
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        if len > self.remaining() {
            return None;
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Some(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Option<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Read a 4-byte chunk tag such as `MThd`
    pub fn read_tag(&mut self) -> Option<[u8; 4]> {
        let bytes = self.read_bytes(4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn read_u16_be(&mut self) -> Option<u16> {
        self.read_bytes(2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u24_be(&mut self) -> Option<u32> {
        self.read_bytes(3)
            .map(|b| u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn read_u32_be(&mut self) -> Option<u32> {
        self.read_bytes(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a variable-length quantity, advancing past the bytes it used
    pub fn read_vlq(&mut self) -> Option<u32> {
        let (value, used) = decode_vlq(&self.data[self.pos..self.end])?;
        self.pos += used;
        Some(value)
    }
}
