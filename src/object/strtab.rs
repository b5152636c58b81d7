use crate::Chunk;

/// Read-only view over a string table section's bytes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StringTable<'data> {
    data: &'data [u8],
}

impl<'data> StringTable<'data> {
    pub(crate) fn new(chunk: Chunk<'data>) -> Self {
        StringTable {
            data: chunk.as_bytes(),
        }
    }

    /// The NUL-terminated string at `offset`. `None` past the end of the
    /// table, on a missing terminator, or on non-UTF-8 bytes.
    pub(crate) fn get(&self, offset: usize) -> Option<&'data str> {
        let start = self.data.get(offset..)?;
        let end = start.iter().position(|&b| b == 0)?;
        core::str::from_utf8(&start[..end]).ok()
    }
}
