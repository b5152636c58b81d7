use crate::{OutOfRangeSnafu, Result};
use core::fmt;
use snafu::ensure;

/// A bounded view over a contiguous byte range.
///
/// A chunk never owns the bytes it points at; cloning one clones the view,
/// not the data, and equality is byte-wise. The borrow ties every chunk to
/// its backing store, so a chunk cannot be held across a splice of the
/// [`Region`](crate::Region) it aliases.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Chunk<'a> {
    data: &'a [u8],
}

impl<'a> Chunk<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Chunk { data }
    }

    /// The empty chunk. All empty chunks compare equal.
    pub const fn empty() -> Self {
        Chunk { data: &[] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Carve a sub-view out of this chunk. Constant-time, never copies.
    pub fn slice(&self, offset: usize, len: usize) -> Result<Chunk<'a>> {
        ensure!(
            offset
                .checked_add(len)
                .is_some_and(|end| end <= self.data.len()),
            OutOfRangeSnafu {
                offset,
                len,
                size: self.data.len(),
            }
        );
        Ok(Chunk {
            data: &self.data[offset..offset + len],
        })
    }

    /// Concatenate two views into a new owned buffer.
    pub fn cat(&self, other: Chunk<'_>) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + other.data.len());
        out.extend_from_slice(self.data);
        out.extend_from_slice(other.data);
        out
    }
}

impl fmt::LowerHex for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.data {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // keep huge chunks printable
        const PREVIEW: usize = 16;
        write!(f, "Chunk({} bytes", self.data.len())?;
        if !self.data.is_empty() {
            write!(f, ": ")?;
            for byte in self.data.iter().take(PREVIEW) {
                write!(f, "{byte:02x}")?;
            }
            if self.data.len() > PREVIEW {
                write!(f, "..")?;
            }
        }
        write!(f, ")")
    }
}
