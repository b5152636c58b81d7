use super::reader::{Reader, Writer};
use crate::{invalid_format, Chunk, Result, EHDR_SIZE, PHDR_SIZE, SHDR_SIZE};
use elf::abi::{EI_CLASS, EI_DATA, EI_NIDENT, ELFCLASS64, ELFDATA2LSB};

const MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// The `Elf64_Ehdr` file header record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub e_ident: [u8; EI_NIDENT],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl FileHeader {
    /// Parse the 64-byte record at the start of `chunk`.
    pub fn parse(chunk: Chunk<'_>) -> Result<FileHeader> {
        let buf = chunk.as_bytes();
        if buf.len() < EHDR_SIZE {
            return Err(invalid_format("truncated file header"));
        }
        if buf[..4] != MAGIC {
            return Err(invalid_format("bad magic"));
        }
        if buf[EI_CLASS] != ELFCLASS64 {
            return Err(invalid_format("not a 64-bit image"));
        }
        if buf[EI_DATA] != ELFDATA2LSB {
            return Err(invalid_format("not a little-endian image"));
        }
        let mut r = Reader::new(buf);
        Ok(FileHeader {
            e_ident: r.bytes::<EI_NIDENT>(),
            e_type: r.u16(),
            e_machine: r.u16(),
            e_version: r.u32(),
            e_entry: r.u64(),
            e_phoff: r.u64(),
            e_shoff: r.u64(),
            e_flags: r.u32(),
            e_ehsize: r.u16(),
            e_phentsize: r.u16(),
            e_phnum: r.u16(),
            e_shentsize: r.u16(),
            e_shnum: r.u16(),
            e_shstrndx: r.u16(),
        })
    }

    /// Check the header-table geometry against the fixed 64-bit record
    /// sizes.
    pub fn validate(&self) -> Result<()> {
        if self.e_shnum > 0 && self.e_shentsize as usize != SHDR_SIZE {
            return Err(invalid_format("unexpected section header entry size"));
        }
        if self.e_phnum > 0 && self.e_phentsize as usize != PHDR_SIZE {
            return Err(invalid_format("unexpected program header entry size"));
        }
        Ok(())
    }

    /// Write the record back out as one fixed-size chunk.
    pub fn serialize(&self) -> [u8; EHDR_SIZE] {
        let mut out = [0u8; EHDR_SIZE];
        let mut w = Writer::new(&mut out);
        w.bytes(&self.e_ident);
        w.u16(self.e_type);
        w.u16(self.e_machine);
        w.u32(self.e_version);
        w.u64(self.e_entry);
        w.u64(self.e_phoff);
        w.u64(self.e_shoff);
        w.u32(self.e_flags);
        w.u16(self.e_ehsize);
        w.u16(self.e_phentsize);
        w.u16(self.e_phnum);
        w.u16(self.e_shentsize);
        w.u16(self.e_shnum);
        w.u16(self.e_shstrndx);
        out
    }
}
