use crate::error::{Error, Result};

/// Cursor provides bounds-checked sequential reads over a borrowed byte region.
///
/// Positions reported by [Cursor::tell] are relative to the start of the region.
/// A cursor also carries the absolute stream offset of its first byte, so a
/// sub-cursor created by [Cursor::slice] can still report where it lives in the
/// overall stream via [Cursor::absolute].
///
/// All multi-byte values are little-endian.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_offset(data, 0)
    }

    /// Create a cursor whose first byte is at absolute stream offset `base`.
    #[must_use]
    pub fn with_offset(data: &'a [u8], base: usize) -> Self {
        Cursor { data, pos: 0, base }
    }

    /// Current position relative to the start of the region.
    #[must_use]
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Absolute stream offset of the current position.
    #[must_use]
    pub fn absolute(&self) -> usize {
        self.base + self.pos
    }

    /// Total length of the region.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of unread bytes from the current position to the end of the region.
    #[must_use]
    pub fn left(&self) -> usize {
        self.data.len() - self.pos
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.left() == 0
    }

    /// Reposition to `position`, relative to the start of the region.
    ///
    /// # Errors
    /// [Error::OutOfRange] if `position` is past the end of the region.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::OutOfRange {
                position,
                len: self.data.len(),
            });
        }
        self.pos = position;
        Ok(())
    }

    /// Produce an independent, zero-based cursor over the next `n` bytes and advance
    /// this cursor past them.
    ///
    /// # Errors
    /// [Error::TruncatedRead] if fewer than `n` bytes remain.
    pub fn slice(&mut self, n: usize) -> Result<Cursor<'a>> {
        let base = self.absolute();
        let data = self.take(n)?;
        Ok(Cursor::with_offset(data, base))
    }

    /// Read a `u16` located `offset` bytes past the current position without moving.
    ///
    /// # Errors
    /// [Error::TruncatedRead] if the value extends past the end of the region.
    pub fn peek_u16_at(&self, offset: usize) -> Result<u16> {
        let start = self.pos + offset;
        match self.data.get(start..start + 2) {
            Some(b) => Ok(u16::from_le_bytes([b[0], b[1]])),
            None => Err(Error::TruncatedRead {
                offset: start,
                needed: 2,
                available: self.data.len().saturating_sub(start),
            }),
        }
    }

    /// Borrow up to the first `n` bytes of the region, regardless of position.
    #[must_use]
    pub fn bytes(&self, n: usize) -> &'a [u8] {
        &self.data[..n.min(self.data.len())]
    }

    /// Copy of all unread bytes.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.data[self.pos..].to_vec()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.left() < n {
            return Err(Error::TruncatedRead {
                offset: self.pos,
                needed: n,
                available: self.left(),
            });
        }
        let dat = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(dat)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    /// # Errors
    /// [Error::TruncatedRead] if no bytes remain.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    /// # Errors
    /// [Error::TruncatedRead] if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    /// # Errors
    /// [Error::TruncatedRead] if fewer than 2 bytes remain.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    /// # Errors
    /// [Error::TruncatedRead] if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// # Errors
    /// [Error::TruncatedRead] if fewer than 4 bytes remain.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    /// # Errors
    /// [Error::TruncatedRead] if fewer than 4 bytes remain.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }
}
