use crate::error::{Error, Result};

const DEFAULT_CAP: usize = 2048;

/// Growable contiguous byte store. Used exclusively to accumulate a
/// multipart reply, whose total length isn't known until the `DONE`
/// datagram arrives.
///
/// Growth doubles the backing capacity until the pending append fits,
/// rather than relying on the allocator's own growth curve, so the
/// overflow boundary (`usize::MAX`) is checked explicitly instead of
/// trusting a panic from the allocator.
pub struct ByteBuffer {
    buf: Vec<u8>,
    cap: usize,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAP)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
            cap,
        }
    }

    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let needed = self
            .buf
            .len()
            .checked_add(data.len())
            .ok_or(Error::AllocationFailed)?;

        if needed > self.cap {
            self.grow(needed)?;
        }

        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn grow(&mut self, min: usize) -> Result<()> {
        let mut new_cap = self.cap.max(1);
        while new_cap < min {
            new_cap = new_cap.checked_mul(2).ok_or(Error::AllocationFailed)?;
        }
        self.buf.try_reserve_exact(new_cap - self.buf.len())?;
        self.cap = new_cap;
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::AllocationFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_within_capacity() {
        let mut b = ByteBuffer::with_capacity(16);
        b.append(&[1, 2, 3]).unwrap();
        b.append(&[4, 5]).unwrap();
        assert_eq!(b.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn grows_by_doubling_past_capacity() {
        let mut b = ByteBuffer::with_capacity(4);
        b.append(&[0; 4]).unwrap();
        b.append(&[1, 2, 3]).unwrap();
        assert_eq!(b.len(), 7);
        assert_eq!(&b.as_slice()[4..], &[1, 2, 3]);
    }

    #[test]
    fn empty_append_is_noop() {
        let mut b = ByteBuffer::with_capacity(4);
        b.append(&[]).unwrap();
        assert!(b.is_empty());
    }
}
