//!A typed, mutable, round-trippable object model for 64-bit little-endian
//!ELF images, plus an address-keyed container for decoded instructions.
//!
//!This library serves three purposes:
//!1. Parse a raw byte [`Region`] into a structured [`Elf`] model of sections,
//!   program headers and their backing byte ranges, without re-reading the file.
//!2. Keep the cross-referencing tables (`.symtab`, `.rela.dyn`, `.rela.plt`)
//!   coherent while sections are added, removed or shifted.
//!3. Group decoded machine instructions into [`Chain`]s that downstream
//!   structural or symbolic analysis passes can work on.
//!
//! # Examples
//! ```no_run
//! use elfchain::{Chain, Chunk, Elf, Region};
//!
//! let region = Region::from_file("/bin/true")?;
//! let elf = Elf::parse(Chunk::new(b"elf"), region)?;
//!
//! let text = elf.section_by_name(".text").unwrap();
//! println!("{} bytes of code", elf.section_data(text)?.len());
//!
//! if let Some(main) = elf.function_chunk("main") {
//!     let chain = Chain::from_chunk(elf.function_offset("main").unwrap(), main)?;
//!     println!("{}", chain.text());
//! }
//! # Ok::<(), elfchain::Error>(())
//! ```

mod chain;
mod chunk;
mod code;
mod object;
mod region;
mod translate;

pub use chain::Chain;
pub use chunk::Chunk;
pub use code::Code;
pub use object::{
    Elf, FileHeader, ProgramHeader, Rela, Section, SectionFlags, SegmentFlags, Symbol,
};
pub use region::Region;
pub use translate::{gen_intermediate_code, CpuArchState, TranslationBlock};

use snafu::prelude::*;

/// Size of an `Elf64_Ehdr` record.
pub const EHDR_SIZE: usize = 64;
/// Size of an `Elf64_Shdr` record.
pub const SHDR_SIZE: usize = 64;
/// Size of an `Elf64_Phdr` record.
pub const PHDR_SIZE: usize = 56;
/// Size of an `Elf64_Sym` record.
pub const SYM_SIZE: usize = 24;
/// Size of an `Elf64_Rela` record.
pub const RELA_SIZE: usize = 24;

/// elfchain error type.
///
/// Lookups that simply find nothing are not errors; they return `None`.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Returned when the backing file cannot be read.
    #[snafu(display("can't read image, {source}"))]
    Io { source: std::io::Error },
    /// Returned when no file exists at the given path.
    #[snafu(display("no image at {path}"))]
    NotFound { path: String },
    /// Returned when the bytes are not a well-formed 64-bit ELF image.
    #[snafu(display("can't parse image, {msg}"))]
    InvalidFormat { msg: &'static str },
    /// Returned when a slice escapes its source.
    #[snafu(display("range {offset:#x}+{len:#x} escapes a {size:#x} byte source"))]
    OutOfRange {
        offset: usize,
        len: usize,
        size: usize,
    },
    /// Returned when a mutation would break the object model; the model is
    /// left unchanged.
    #[snafu(display("mutation rejected, {msg}"))]
    Failed { msg: &'static str },
    /// Returned when an instruction cannot be re-encoded into chain bytes.
    #[snafu(display("can't encode instruction, {msg}"))]
    Encode { msg: String },
}

#[cold]
#[inline(never)]
pub(crate) fn invalid_format(msg: &'static str) -> Error {
    Error::InvalidFormat { msg }
}

#[cold]
#[inline(never)]
pub(crate) fn mutation_failed(msg: &'static str) -> Error {
    Error::Failed { msg }
}

pub type Result<T> = core::result::Result<T, Error>;
