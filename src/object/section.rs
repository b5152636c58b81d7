use super::reader::{Reader, Writer};
use crate::{invalid_format, Chunk, Result, SHDR_SIZE};
use bitflags::bitflags;
use core::ops::Range;
use elf::abi::{SHF_ALLOC, SHF_EXECINSTR, SHF_TLS, SHF_WRITE, SHT_NOBITS, SHT_STRTAB, SHT_SYMTAB};

bitflags! {
    /// `sh_flags` attribute bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SectionFlags: u64 {
        const WRITE = SHF_WRITE as u64;
        const ALLOC = SHF_ALLOC as u64;
        const EXECINSTR = SHF_EXECINSTR as u64;
        const TLS = SHF_TLS as u64;
    }
}

/// Typed wrapper over one `Elf64_Shdr` record.
///
/// Value-like: sections carry their header fields and nothing else. The
/// owning [`Elf`](crate::Elf) vends the backing bytes, so removing a section
/// from its model never leaves a dangling data pointer behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Section {
    /// index into `.shstrtab`
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl Section {
    /// Parse one 64-byte little-endian record.
    pub fn parse(chunk: Chunk<'_>) -> Result<Section> {
        let buf = chunk.as_bytes();
        if buf.len() < SHDR_SIZE {
            return Err(invalid_format("truncated section header"));
        }
        let mut r = Reader::new(buf);
        Ok(Section {
            sh_name: r.u32(),
            sh_type: r.u32(),
            sh_flags: r.u64(),
            sh_addr: r.u64(),
            sh_offset: r.u64(),
            sh_size: r.u64(),
            sh_link: r.u32(),
            sh_info: r.u32(),
            sh_addralign: r.u64(),
            sh_entsize: r.u64(),
        })
    }

    /// Write the record back out as one fixed-size chunk.
    pub fn serialize(&self) -> [u8; SHDR_SIZE] {
        let mut out = [0u8; SHDR_SIZE];
        let mut w = Writer::new(&mut out);
        w.u32(self.sh_name);
        w.u32(self.sh_type);
        w.u64(self.sh_flags);
        w.u64(self.sh_addr);
        w.u64(self.sh_offset);
        w.u64(self.sh_size);
        w.u32(self.sh_link);
        w.u32(self.sh_info);
        w.u64(self.sh_addralign);
        w.u64(self.sh_entsize);
        out
    }

    #[inline]
    pub fn flags(&self) -> SectionFlags {
        SectionFlags::from_bits_truncate(self.sh_flags)
    }

    /// `SHT_NOBITS` sections occupy no file bytes.
    #[inline]
    pub fn is_nobits(&self) -> bool {
        self.sh_type == SHT_NOBITS
    }

    #[inline]
    pub fn is_strtab(&self) -> bool {
        self.sh_type == SHT_STRTAB
    }

    #[inline]
    pub fn is_symtab(&self) -> bool {
        self.sh_type == SHT_SYMTAB
    }

    /// Virtual range `sh_addr .. sh_addr + sh_size`.
    #[inline]
    pub fn vaddr_range(&self) -> Range<u64> {
        self.sh_addr..self.sh_addr + self.sh_size
    }
}
