use super::reader::{Reader, Writer};
use crate::{invalid_format, Chunk, Result, RELA_SIZE, SYM_SIZE};
use elf::abi::STT_FUNC;

const REL_MASK: u64 = 0xFFFF_FFFF;
const REL_BIT: u64 = 32;

/// One `Elf64_Sym` record out of `.symtab`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Symbol {
    /// index into `.strtab`
    pub st_name: u32,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
    pub st_value: u64,
    pub st_size: u64,
}

impl Symbol {
    /// Parse one 24-byte little-endian record.
    pub fn parse(chunk: Chunk<'_>) -> Result<Symbol> {
        let buf = chunk.as_bytes();
        if buf.len() < SYM_SIZE {
            return Err(invalid_format("truncated symbol record"));
        }
        let mut r = Reader::new(buf);
        Ok(Symbol {
            st_name: r.u32(),
            st_info: r.u8(),
            st_other: r.u8(),
            st_shndx: r.u16(),
            st_value: r.u64(),
            st_size: r.u64(),
        })
    }

    pub fn serialize(&self) -> [u8; SYM_SIZE] {
        let mut out = [0u8; SYM_SIZE];
        let mut w = Writer::new(&mut out);
        w.u32(self.st_name);
        w.u8(self.st_info);
        w.u8(self.st_other);
        w.u16(self.st_shndx);
        w.u64(self.st_value);
        w.u64(self.st_size);
        out
    }

    /// `ELF64_ST_TYPE(st_info)`.
    #[inline]
    pub fn st_type(&self) -> u8 {
        self.st_info & 0xf
    }

    /// `ELF64_ST_BIND(st_info)`.
    #[inline]
    pub fn st_bind(&self) -> u8 {
        self.st_info >> 4
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        self.st_type() == STT_FUNC
    }
}

/// One `Elf64_Rela` record out of `.rela.dyn` or `.rela.plt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rela {
    pub r_offset: u64,
    pub r_info: u64,
    pub r_addend: i64,
}

impl Rela {
    /// Parse one 24-byte little-endian record.
    pub fn parse(chunk: Chunk<'_>) -> Result<Rela> {
        let buf = chunk.as_bytes();
        if buf.len() < RELA_SIZE {
            return Err(invalid_format("truncated relocation record"));
        }
        let mut r = Reader::new(buf);
        Ok(Rela {
            r_offset: r.u64(),
            r_info: r.u64(),
            r_addend: r.i64(),
        })
    }

    pub fn serialize(&self) -> [u8; RELA_SIZE] {
        let mut out = [0u8; RELA_SIZE];
        let mut w = Writer::new(&mut out);
        w.u64(self.r_offset);
        w.u64(self.r_info);
        w.i64(self.r_addend);
        out
    }

    /// `ELF64_R_TYPE(r_info)`.
    #[inline]
    pub fn r_type(&self) -> u32 {
        (self.r_info & REL_MASK) as u32
    }

    /// `ELF64_R_SYM(r_info)`.
    #[inline]
    pub fn r_sym(&self) -> u32 {
        (self.r_info >> REL_BIT) as u32
    }
}
