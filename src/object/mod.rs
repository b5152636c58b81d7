mod dynamic;
mod ehdr;
mod program_header;
mod reader;
mod section;
mod strtab;
mod symbol;

pub use ehdr::FileHeader;
pub use program_header::{ProgramHeader, SegmentFlags};
pub use section::{Section, SectionFlags};
pub use symbol::{Rela, Symbol};

use crate::{
    invalid_format, mutation_failed, Chunk, Code, Region, Result, PHDR_SIZE, RELA_SIZE, SHDR_SIZE,
    SYM_SIZE,
};
use core::fmt;
use elf::abi::R_X86_64_RELATIVE;
use strtab::StringTable;

/// Concrete [`Code`] implementation backed by a parsed ELF image.
///
/// An `Elf` owns its region, its section and program-header lists, and a
/// cached handle to the `.shstrtab` / `.strtab` string tables. Chunks it
/// vends borrow the region; they go away before any mutation can move the
/// bytes underneath them.
pub struct Elf {
    /// format tag handed in at construction
    tag: Vec<u8>,
    region: Region,
    ehdr: FileHeader,
    sections: Vec<Section>,
    phdrs: Vec<ProgramHeader>,
    /// `.shstrtab` index, mirrors `e_shstrndx`
    shstr: usize,
    /// `.strtab` index, if the image carries one
    strtab: Option<usize>,
}

impl fmt::Debug for Elf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Elf")
            .field("region", &self.region.len())
            .field("sections", &self.sections.len())
            .field("program_headers", &self.phdrs.len())
            .finish()
    }
}

impl Elf {
    /// Parse an ELF object model out of `region`.
    ///
    /// `type_tag` labels the container format for callers that dispatch on
    /// it; the model stores it verbatim. Structural failures (bad magic,
    /// truncated or escaping header tables) abort construction, and no
    /// partial object is observable.
    pub fn parse(type_tag: Chunk<'_>, region: Region) -> Result<Elf> {
        let ehdr = FileHeader::parse(region.as_chunk())?;
        ehdr.validate()?;

        let mut sections = Vec::with_capacity(ehdr.e_shnum as usize);
        for i in 0..ehdr.e_shnum as usize {
            let rec = region
                .chunk_at(ehdr.e_shoff as usize + i * SHDR_SIZE, SHDR_SIZE)
                .map_err(|_| invalid_format("section header table escapes the region"))?;
            let section = Section::parse(rec)?;
            if section.sh_size > 0
                && !section.is_nobits()
                && section
                    .sh_offset
                    .checked_add(section.sh_size)
                    .is_none_or(|end| end > region.len() as u64)
            {
                return Err(invalid_format("section data escapes the region"));
            }
            sections.push(section);
        }

        let mut phdrs = Vec::with_capacity(ehdr.e_phnum as usize);
        for i in 0..ehdr.e_phnum as usize {
            let rec = region
                .chunk_at(ehdr.e_phoff as usize + i * PHDR_SIZE, PHDR_SIZE)
                .map_err(|_| invalid_format("program header table escapes the region"))?;
            let phdr = ProgramHeader::parse(rec)?;
            if phdr
                .p_offset
                .checked_add(phdr.p_filesz)
                .is_none_or(|end| end > region.len() as u64)
            {
                return Err(invalid_format("segment data escapes the region"));
            }
            phdrs.push(phdr);
        }

        let shstr = ehdr.e_shstrndx as usize;
        if !sections.get(shstr).is_some_and(Section::is_strtab) {
            return Err(invalid_format("e_shstrndx does not index a string table"));
        }

        let mut elf = Elf {
            tag: type_tag.as_bytes().to_vec(),
            region,
            ehdr,
            sections,
            phdrs,
            shstr,
            strtab: None,
        };
        elf.strtab = elf.find_strtab();
        log::debug!(
            "parsed elf image: {} sections, {} program headers, {} byte region",
            elf.sections.len(),
            elf.phdrs.len(),
            elf.region.len()
        );
        Ok(elf)
    }

    /// First `SHT_STRTAB` section whose resolved name is `.strtab`.
    fn find_strtab(&self) -> Option<usize> {
        self.sections
            .iter()
            .enumerate()
            .find(|&(_, s)| s.is_strtab() && self.section_name(s) == Some(".strtab"))
            .map(|(idx, _)| idx)
    }

    #[inline]
    pub fn header(&self) -> &FileHeader {
        &self.ehdr
    }

    #[inline]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Mutable region access for callers splicing section bytes in or out.
    ///
    /// Splice the region *after* [`add_section`](Elf::add_section) and
    /// *after* [`remove_section`](Elf::remove_section), so the bookkeeping
    /// always reads the tables where the headers say they are.
    #[inline]
    pub fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    /// The format tag handed in at construction.
    #[inline]
    pub fn type_tag(&self) -> Chunk<'_> {
        Chunk::new(&self.tag)
    }

    /// Parse-ordered section list. Indices are stable under append, not
    /// under removal.
    #[inline]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[inline]
    pub fn program_headers(&self) -> &[ProgramHeader] {
        &self.phdrs
    }

    /// The cached `.shstrtab` section.
    #[inline]
    pub fn shstr_section(&self) -> &Section {
        &self.sections[self.shstr]
    }

    /// The cached `.strtab` section, if the image carries one.
    #[inline]
    pub fn strtab_section(&self) -> Option<&Section> {
        self.strtab.map(|idx| &self.sections[idx])
    }

    /// Resolve a section's name through `.shstrtab`.
    pub fn section_name(&self, section: &Section) -> Option<&str> {
        let data = self.section_data(&self.sections[self.shstr]).ok()?;
        StringTable::new(data).get(section.sh_name as usize)
    }

    /// First section whose resolved name equals `name`. The index-0 null
    /// section and other unnamed sections never match.
    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|&s| s.sh_name != 0 && self.section_name(s) == Some(name))
    }

    /// Backing bytes of `section`. `SHT_NOBITS` sections and zero-size
    /// sections yield the empty chunk.
    pub fn section_data(&self, section: &Section) -> Result<Chunk<'_>> {
        if section.is_nobits() || section.sh_size == 0 {
            return Ok(Chunk::empty());
        }
        self.region
            .chunk_at(section.sh_offset as usize, section.sh_size as usize)
    }

    /// Backing bytes of `phdr`, `p_filesz` long.
    pub fn program_header_data(&self, phdr: &ProgramHeader) -> Result<Chunk<'_>> {
        if phdr.p_filesz == 0 {
            return Ok(Chunk::empty());
        }
        self.region
            .chunk_at(phdr.p_offset as usize, phdr.p_filesz as usize)
    }

    /// First `SHT_SYMTAB` section.
    fn symtab_section(&self) -> Option<&Section> {
        self.sections.iter().find(|s| s.is_symtab())
    }

    /// `.symtab` entry of the `STT_FUNC` symbol named `name`.
    fn function_symbol(&self, name: &str) -> Option<Symbol> {
        let symtab = self.symtab_section()?;
        let strtab = StringTable::new(self.section_data(self.strtab_section()?).ok()?);
        let data = self.section_data(symtab).ok()?;
        for rec in data.as_bytes().chunks_exact(SYM_SIZE) {
            let sym = Symbol::parse(Chunk::new(rec)).ok()?;
            if sym.is_function() && strtab.get(sym.st_name as usize) == Some(name) {
                return Some(sym);
            }
        }
        None
    }

    /// Mapped address of the function `name`, resolved through `.symtab`
    /// and the cached `.strtab`.
    pub fn function_offset(&self, name: &str) -> Option<u64> {
        self.function_symbol(name).map(|sym| sym.st_value)
    }

    /// The function's `st_size` bytes, carved out of the section whose
    /// virtual range contains its address.
    pub fn function_chunk(&self, name: &str) -> Option<Chunk<'_>> {
        let sym = self.function_symbol(name)?;
        let section = self
            .sections
            .iter()
            .find(|s| s.sh_size > 0 && s.vaddr_range().contains(&sym.st_value))?;
        let data = self.section_data(section).ok()?;
        data.slice((sym.st_value - section.sh_addr) as usize, sym.st_size as usize)
            .ok()
    }

    /// Conventional dynamic-table tag of `section`, 0 when none applies.
    pub fn section_tag(&self, section: &Section) -> i64 {
        self.section_name(section).map_or(0, dynamic::section_tag)
    }

    /// True when `tag`'s `d_un` is interpreted as an address (`d_ptr`).
    pub fn is_section_tag_d_ptr(&self, tag: i64) -> bool {
        dynamic::is_tag_d_ptr(tag)
    }

    /// Append `section` to the model.
    ///
    /// The caller pre-computes `sh_offset`; placement is not chosen here.
    /// Every section laid out at or past the new offset is shifted by the
    /// new section's size, and the symbol and relocation tables are
    /// rewritten to match before the shift lands.
    pub fn add_section(&mut self, section: Section) -> Result<()> {
        let size = section.sh_size;
        if size > 0 {
            let splice = section.sh_offset;
            let stale: Vec<usize> = (0..self.sections.len())
                .filter(|&idx| self.sections[idx].sh_offset >= splice)
                .collect();
            for &idx in &stale {
                self.update_symbols_offsets(idx, size as i64)?;
            }
            for &idx in &stale {
                self.sections[idx].sh_offset += size;
            }
            if self.ehdr.e_shoff >= splice {
                self.ehdr.e_shoff += size;
            }
        }
        log::info!(
            "added section at {:#x} ({} bytes), {} sections now",
            section.sh_offset,
            size,
            self.sections.len() + 1
        );
        self.sections.push(section);
        self.ehdr.e_shnum += 1;
        Ok(())
    }

    /// Remove the section at `index` and hand it back.
    ///
    /// Rejected without touching the model when `index` is out of range or
    /// names the cached `.shstrtab`. Trailing sections shift back by the
    /// removed size and the symbol and relocation tables follow; the cached
    /// string-table indices are renumbered. `sh_link` / `sh_info`
    /// cross-references are not renumbered.
    pub fn remove_section(&mut self, index: usize) -> Result<Section> {
        if index >= self.sections.len() {
            return Err(mutation_failed("no such section"));
        }
        if index == self.shstr {
            return Err(mutation_failed("can't remove the section name string table"));
        }
        let removed = self.sections[index];
        let size = removed.sh_size;
        if size > 0 {
            let splice = removed.sh_offset;
            let stale: Vec<usize> = (0..self.sections.len())
                .filter(|&idx| idx != index && self.sections[idx].sh_offset >= splice)
                .collect();
            for &idx in &stale {
                self.update_symbols_offsets(idx, -(size as i64))?;
            }
            for &idx in &stale {
                self.sections[idx].sh_offset -= size;
            }
            if self.ehdr.e_shoff >= splice {
                self.ehdr.e_shoff -= size;
            }
        }
        self.sections.remove(index);
        self.ehdr.e_shnum -= 1;
        if self.shstr > index {
            self.shstr -= 1;
            self.ehdr.e_shstrndx -= 1;
        }
        self.strtab = match self.strtab {
            Some(idx) if idx == index => None,
            Some(idx) if idx > index => Some(idx - 1),
            other => other,
        };
        log::info!(
            "removed section at {:#x} ({} bytes), {} sections now",
            removed.sh_offset,
            size,
            self.sections.len()
        );
        Ok(removed)
    }

    /// Append `phdr` to the model.
    pub fn add_program_header(&mut self, phdr: ProgramHeader) {
        self.phdrs.push(phdr);
        self.ehdr.e_phnum += 1;
    }

    /// Remove the program header at `index` and hand it back.
    pub fn remove_program_header(&mut self, index: usize) -> Result<ProgramHeader> {
        if index >= self.phdrs.len() {
            return Err(mutation_failed("no such program header"));
        }
        let removed = self.phdrs.remove(index);
        self.ehdr.e_phnum -= 1;
        Ok(removed)
    }

    /// Rewrite the cross-referencing tables after the section at `index`
    /// moved by `delta` bytes.
    ///
    /// `.symtab` entries bound to the section (`st_shndx`) shift their
    /// `st_value`; `.rela.dyn` and `.rela.plt` entries whose `r_offset`
    /// lies in the section's virtual range follow, and `R_X86_64_RELATIVE`
    /// entries track the delta in `r_addend` as well. This is the single
    /// point of truth for keeping dynamic linkage coherent under layout
    /// edits.
    pub fn update_symbols_offsets(&mut self, index: usize, delta: i64) -> Result<()> {
        if index >= self.sections.len() {
            return Err(mutation_failed("no such section"));
        }
        let range = self.sections[index].vaddr_range();

        if let Some(symtab) = self.symtab_section().copied() {
            let offset = symtab.sh_offset as usize;
            let mut table = self.section_data(&symtab)?.as_bytes().to_vec();
            let mut touched = 0usize;
            for rec in table.chunks_exact_mut(SYM_SIZE) {
                let mut sym = Symbol::parse(Chunk::new(rec))?;
                if sym.st_shndx as usize == index {
                    sym.st_value = sym.st_value.wrapping_add_signed(delta);
                    rec.copy_from_slice(&sym.serialize());
                    touched += 1;
                }
            }
            if touched > 0 {
                self.region.write(offset, &table)?;
                log::trace!("shifted {touched} symtab entries by {delta:#x}");
            }
        }

        for name in [".rela.dyn", ".rela.plt"] {
            let Some(rela) = self.section_by_name(name).copied() else {
                continue;
            };
            let offset = rela.sh_offset as usize;
            let mut table = self.section_data(&rela)?.as_bytes().to_vec();
            let mut touched = 0usize;
            for rec in table.chunks_exact_mut(RELA_SIZE) {
                let mut entry = Rela::parse(Chunk::new(rec))?;
                if range.contains(&entry.r_offset) {
                    entry.r_offset = entry.r_offset.wrapping_add_signed(delta);
                    if entry.r_type() == R_X86_64_RELATIVE {
                        entry.r_addend = entry.r_addend.wrapping_add(delta);
                    }
                    rec.copy_from_slice(&entry.serialize());
                    touched += 1;
                }
            }
            if touched > 0 {
                self.region.write(offset, &table)?;
                log::trace!("shifted {touched} {name} entries by {delta:#x}");
            }
        }
        Ok(())
    }

    /// Write the file header and both header tables back into the region.
    ///
    /// With no intervening mutation the region stays byte-identical to the
    /// parsed input.
    pub fn serialize(&mut self) -> Result<()> {
        let header = self.ehdr.serialize();
        self.region.write(0, &header)?;
        for i in 0..self.sections.len() {
            let rec = self.sections[i].serialize();
            self.region
                .write(self.ehdr.e_shoff as usize + i * SHDR_SIZE, &rec)?;
        }
        for i in 0..self.phdrs.len() {
            let rec = self.phdrs[i].serialize();
            self.region
                .write(self.ehdr.e_phoff as usize + i * PHDR_SIZE, &rec)?;
        }
        Ok(())
    }
}

impl Code for Elf {
    fn function_offset(&self, name: &str) -> Option<u64> {
        Elf::function_offset(self, name)
    }

    fn function_chunk(&self, name: &str) -> Option<Chunk<'_>> {
        Elf::function_chunk(self, name)
    }
}
