use crate::{Chunk, Error, OutOfRangeSnafu, Result};
use snafu::ensure;
use std::path::Path;

/// An owned, resizable byte buffer backing a whole ELF image.
///
/// Chunks vended by a region alias into it. Any splice invalidates the
/// chunks vended before it; callers re-fetch after mutating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    bytes: Vec<u8>,
}

impl Region {
    /// Load a region from a file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Region> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io { source: err }
            }
        })?;
        log::debug!("loaded {} byte region from {}", bytes.len(), path.display());
        Ok(Region { bytes })
    }

    /// Create a zero-filled region of `len` bytes.
    pub fn zeroed(len: usize) -> Region {
        Region {
            bytes: vec![0; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A chunk spanning the entire region.
    #[inline]
    pub fn as_chunk(&self) -> Chunk<'_> {
        Chunk::new(&self.bytes)
    }

    /// A chunk over `len` bytes starting at `offset`.
    pub fn chunk_at(&self, offset: usize, len: usize) -> Result<Chunk<'_>> {
        self.as_chunk().slice(offset, len)
    }

    /// Splice `bytes` in at `offset`, shifting the tail right. Returns the
    /// new region length. Bytes outside the splice range are untouched.
    pub fn insert(&mut self, offset: usize, bytes: &[u8]) -> Result<usize> {
        ensure!(
            offset <= self.bytes.len(),
            OutOfRangeSnafu {
                offset,
                len: bytes.len(),
                size: self.bytes.len(),
            }
        );
        self.bytes.splice(offset..offset, bytes.iter().copied());
        log::trace!("spliced {} bytes in at {offset:#x}", bytes.len());
        Ok(self.bytes.len())
    }

    /// Splice `len` bytes out at `offset`, shifting the tail left. Returns
    /// the new region length.
    pub fn remove(&mut self, offset: usize, len: usize) -> Result<usize> {
        ensure!(
            offset
                .checked_add(len)
                .is_some_and(|end| end <= self.bytes.len()),
            OutOfRangeSnafu {
                offset,
                len,
                size: self.bytes.len(),
            }
        );
        self.bytes.drain(offset..offset + len);
        log::trace!("spliced {len} bytes out at {offset:#x}");
        Ok(self.bytes.len())
    }

    /// Overwrite bytes in place without resizing.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        ensure!(
            offset
                .checked_add(bytes.len())
                .is_some_and(|end| end <= self.bytes.len()),
            OutOfRangeSnafu {
                offset,
                len: bytes.len(),
                size: self.bytes.len(),
            }
        );
        self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

impl From<Vec<u8>> for Region {
    fn from(bytes: Vec<u8>) -> Region {
        Region { bytes }
    }
}
