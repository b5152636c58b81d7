//! Shared fixture: assembles minimal 64-bit little-endian ELF images in
//! memory, so the tests never depend on toolchain-produced binaries.
#![allow(dead_code)]

use elfchain::{EHDR_SIZE, PHDR_SIZE, SHDR_SIZE};
use std::sync::Once;

pub fn init() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub struct SectionSpec {
    pub name: &'static str,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_link: u32,
    pub sh_entsize: u64,
    pub data: Vec<u8>,
}

pub fn spec(name: &'static str, sh_type: u32, sh_flags: u64, sh_addr: u64) -> SectionSpec {
    SectionSpec {
        name,
        sh_type,
        sh_flags,
        sh_addr,
        sh_link: 0,
        sh_entsize: 0,
        data: Vec::new(),
    }
}

const SHT_NOBITS: u32 = 8;

fn align(value: usize, to: usize) -> usize {
    (value + to - 1) & !(to - 1)
}

fn w16(buf: &mut [u8], off: usize, value: u16) {
    buf[off..off + 2].copy_from_slice(&value.to_le_bytes());
}

fn w32(buf: &mut [u8], off: usize, value: u32) {
    buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
}

fn w64(buf: &mut [u8], off: usize, value: u64) {
    buf[off..off + 8].copy_from_slice(&value.to_le_bytes());
}

/// Assemble an image out of `specs`. A null section is prepended and the
/// `.shstrtab` entry (which the caller must include) is filled with the
/// generated name table. With `with_load_phdr` a single `PT_LOAD` covering
/// the file is emitted after the file header.
pub fn build_image(mut specs: Vec<SectionSpec>, with_load_phdr: bool) -> Vec<u8> {
    // name table: one leading NUL, then each section name
    let mut shstr = vec![0u8];
    let mut name_offs = Vec::with_capacity(specs.len());
    for s in &specs {
        name_offs.push(shstr.len() as u32);
        shstr.extend_from_slice(s.name.as_bytes());
        shstr.push(0);
    }
    let shstrndx = specs
        .iter()
        .position(|s| s.name == ".shstrtab")
        .expect("fixture needs a .shstrtab entry") as u16
        + 1;
    for s in &mut specs {
        if s.name == ".shstrtab" {
            s.data = shstr.clone();
        }
    }

    // lay the section data out past the headers
    let phnum: u16 = if with_load_phdr { 1 } else { 0 };
    let mut cursor = EHDR_SIZE + phnum as usize * PHDR_SIZE;
    let mut sh_offsets = Vec::with_capacity(specs.len());
    for s in &specs {
        cursor = align(cursor, 16);
        sh_offsets.push(cursor as u64);
        if s.sh_type != SHT_NOBITS {
            cursor += s.data.len();
        }
    }
    let e_shoff = align(cursor, 8);
    let shnum = specs.len() as u16 + 1;
    let total = e_shoff + shnum as usize * SHDR_SIZE;

    let mut image = vec![0u8; total];

    // Elf64_Ehdr
    image[..4].copy_from_slice(b"\x7fELF");
    image[4] = 2; // ELFCLASS64
    image[5] = 1; // ELFDATA2LSB
    image[6] = 1; // EV_CURRENT
    w16(&mut image, 16, 2); // ET_EXEC
    w16(&mut image, 18, 62); // EM_X86_64
    w32(&mut image, 20, 1);
    w64(&mut image, 24, 0x401000); // e_entry
    w64(&mut image, 32, if phnum > 0 { EHDR_SIZE as u64 } else { 0 });
    w64(&mut image, 40, e_shoff as u64);
    w16(&mut image, 52, EHDR_SIZE as u16);
    w16(&mut image, 54, if phnum > 0 { PHDR_SIZE as u16 } else { 0 });
    w16(&mut image, 56, phnum);
    w16(&mut image, 58, SHDR_SIZE as u16);
    w16(&mut image, 60, shnum);
    w16(&mut image, 62, shstrndx);

    if with_load_phdr {
        let off = EHDR_SIZE;
        w32(&mut image, off, 1); // PT_LOAD
        w32(&mut image, off + 4, 0x5); // PF_R | PF_X
        w64(&mut image, off + 8, 0); // p_offset
        w64(&mut image, off + 16, 0x400000); // p_vaddr
        w64(&mut image, off + 24, 0x400000); // p_paddr
        w64(&mut image, off + 32, total as u64); // p_filesz
        w64(&mut image, off + 40, total as u64); // p_memsz
        w64(&mut image, off + 48, 0x1000); // p_align
    }

    // section data
    for (s, &off) in specs.iter().zip(&sh_offsets) {
        if s.sh_type != SHT_NOBITS {
            image[off as usize..off as usize + s.data.len()].copy_from_slice(&s.data);
        }
    }

    // section header table; entry 0 stays all-zero
    for (i, s) in specs.iter().enumerate() {
        let off = e_shoff + (i + 1) * SHDR_SIZE;
        w32(&mut image, off, name_offs[i]);
        w32(&mut image, off + 4, s.sh_type);
        w64(&mut image, off + 8, s.sh_flags);
        w64(&mut image, off + 16, s.sh_addr);
        w64(&mut image, off + 24, sh_offsets[i]);
        w64(&mut image, off + 32, s.data.len() as u64);
        w32(&mut image, off + 40, s.sh_link);
        w32(&mut image, off + 44, 0); // sh_info
        w64(&mut image, off + 48, if s.sh_addr != 0 { 16 } else { 1 });
        w64(&mut image, off + 56, s.sh_entsize);
    }

    image
}

pub fn sym_bytes(st_name: u32, st_info: u8, st_shndx: u16, st_value: u64, st_size: u64) -> Vec<u8> {
    let mut out = vec![0u8; 24];
    w32(&mut out, 0, st_name);
    out[4] = st_info;
    w16(&mut out, 6, st_shndx);
    w64(&mut out, 8, st_value);
    w64(&mut out, 16, st_size);
    out
}

pub fn rela_bytes(r_offset: u64, r_info: u64, r_addend: i64) -> Vec<u8> {
    let mut out = vec![0u8; 24];
    w64(&mut out, 0, r_offset);
    w64(&mut out, 8, r_info);
    w64(&mut out, 16, r_addend as u64);
    out
}

/// 32 recognizable bytes for the body of `main`: 31 nops and a ret.
pub fn main_body() -> Vec<u8> {
    let mut body = vec![0x90u8; 32];
    body[31] = 0xc3;
    body
}

/// The S1/S2-shaped static image: sections `""`, `.text`, `.shstrtab`,
/// `.symtab`, `.strtab`, with a `STT_FUNC` symbol `main` at the start of
/// `.text`.
pub fn minimal_image() -> Vec<u8> {
    build_image(minimal_specs(), false)
}

/// Same section list as [`minimal_image`], plus one `PT_LOAD` covering the
/// file.
pub fn loaded_image() -> Vec<u8> {
    build_image(minimal_specs(), true)
}

fn minimal_specs() -> Vec<SectionSpec> {
    let mut text = vec![0x90u8; 0x1000];
    text[..32].copy_from_slice(&main_body());

    let mut symtab = vec![0u8; 24]; // null symbol
    symtab.extend_from_slice(&sym_bytes(1, 0x12, 1, 0x401000, 32)); // main, STT_FUNC

    vec![
        SectionSpec {
            data: text,
            ..spec(".text", 1, 0x6, 0x401000) // PROGBITS, ALLOC | EXECINSTR
        },
        spec(".shstrtab", 3, 0, 0),
        SectionSpec {
            sh_link: 4,
            sh_entsize: 24,
            data: symtab,
            ..spec(".symtab", 2, 0, 0)
        },
        SectionSpec {
            data: b"\0main\0".to_vec(),
            ..spec(".strtab", 3, 0, 0)
        },
    ]
}

/// The mutation fixture: the minimal sections plus `.rela.dyn` (one
/// `R_X86_64_RELATIVE` entry), `.rela.plt` (one jump-slot entry aimed into
/// `.text`) and a `.bss`.
pub fn rela_image() -> Vec<u8> {
    let mut specs = minimal_specs();
    specs.push(SectionSpec {
        sh_entsize: 24,
        data: rela_bytes(0x401040, 8, 0x401040), // R_X86_64_RELATIVE
        ..spec(".rela.dyn", 4, 0x2, 0x400200)
    });
    specs.push(SectionSpec {
        sh_entsize: 24,
        data: rela_bytes(0x401020, (1 << 32) | 7, 0), // R_X86_64_JUMP_SLOT
        ..spec(".rela.plt", 4, 0x2, 0x400300)
    });
    specs.push(SectionSpec {
        data: vec![0; 0x100],
        ..spec(".bss", SHT_NOBITS, 0x3, 0x403000) // ALLOC | WRITE
    });
    build_image(specs, false)
}
