use super::reader::{Reader, Writer};
use crate::{invalid_format, Chunk, Result, PHDR_SIZE};
use bitflags::bitflags;
use core::ops::Range;
use elf::abi::{PF_R, PF_W, PF_X};

bitflags! {
    /// `p_flags` permission bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SegmentFlags: u32 {
        const X = PF_X;
        const W = PF_W;
        const R = PF_R;
    }
}

/// Typed wrapper over one `Elf64_Phdr` record. Value-like, same rules as
/// [`Section`](crate::Section).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl ProgramHeader {
    /// Parse one 56-byte little-endian record.
    pub fn parse(chunk: Chunk<'_>) -> Result<ProgramHeader> {
        let buf = chunk.as_bytes();
        if buf.len() < PHDR_SIZE {
            return Err(invalid_format("truncated program header"));
        }
        let mut r = Reader::new(buf);
        Ok(ProgramHeader {
            p_type: r.u32(),
            p_flags: r.u32(),
            p_offset: r.u64(),
            p_vaddr: r.u64(),
            p_paddr: r.u64(),
            p_filesz: r.u64(),
            p_memsz: r.u64(),
            p_align: r.u64(),
        })
    }

    /// Write the record back out as one fixed-size chunk.
    pub fn serialize(&self) -> [u8; PHDR_SIZE] {
        let mut out = [0u8; PHDR_SIZE];
        let mut w = Writer::new(&mut out);
        w.u32(self.p_type);
        w.u32(self.p_flags);
        w.u64(self.p_offset);
        w.u64(self.p_vaddr);
        w.u64(self.p_paddr);
        w.u64(self.p_filesz);
        w.u64(self.p_memsz);
        w.u64(self.p_align);
        out
    }

    #[inline]
    pub fn flags(&self) -> SegmentFlags {
        SegmentFlags::from_bits_truncate(self.p_flags)
    }

    /// Virtual range `p_vaddr .. p_vaddr + p_memsz`.
    #[inline]
    pub fn vaddr_range(&self) -> Range<u64> {
        self.p_vaddr..self.p_vaddr + self.p_memsz
    }
}
