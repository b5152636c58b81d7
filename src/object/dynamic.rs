//! Conventional section-name to dynamic-table-tag mappings.

use elf::abi::{
    DT_DEBUG, DT_FINI, DT_FINI_ARRAY, DT_GNU_HASH, DT_HASH, DT_INIT, DT_INIT_ARRAY, DT_JMPREL,
    DT_PLTGOT, DT_PREINIT_ARRAY, DT_REL, DT_RELA, DT_STRTAB, DT_SYMTAB,
};

/// `DT_*` tag conventionally describing the section named `name`, or 0 when
/// no mapping exists.
pub(crate) fn section_tag(name: &str) -> i64 {
    match name {
        ".init" => DT_INIT,
        ".fini" => DT_FINI,
        ".hash" => DT_HASH,
        ".gnu.hash" => DT_GNU_HASH,
        ".strtab" => DT_STRTAB,
        ".symtab" => DT_SYMTAB,
        ".rela.dyn" => DT_RELA,
        ".rela.plt" => DT_JMPREL,
        ".got.plt" => DT_PLTGOT,
        ".init_array" => DT_INIT_ARRAY,
        ".fini_array" => DT_FINI_ARRAY,
        ".preinit_array" => DT_PREINIT_ARRAY,
        _ => 0,
    }
}

/// Whether `tag`'s `d_un` is interpreted as an address (`d_ptr`) rather
/// than a plain value, per the gABI partition.
pub(crate) fn is_tag_d_ptr(tag: i64) -> bool {
    matches!(
        tag,
        DT_PLTGOT
            | DT_HASH
            | DT_GNU_HASH
            | DT_STRTAB
            | DT_SYMTAB
            | DT_RELA
            | DT_INIT
            | DT_FINI
            | DT_REL
            | DT_JMPREL
            | DT_DEBUG
            | DT_INIT_ARRAY
            | DT_FINI_ARRAY
            | DT_PREINIT_ARRAY
    )
}
