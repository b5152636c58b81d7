//! Entry point of the external CPU translator.
//!
//! The translator itself lives outside this crate; the declaration is here
//! so tooling that pairs chains with translated blocks can link against it.

use core::marker::{PhantomData, PhantomPinned};

/// CPU emulation state owned by the external translator. Opaque on this
/// side of the boundary.
#[repr(C)]
pub struct CpuArchState {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Translation block handed to the external translator. Opaque on this
/// side of the boundary.
#[repr(C)]
pub struct TranslationBlock {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

extern "C" {
    /// Translate the block `tb` against the CPU state `env`. Never
    /// implemented in this crate.
    pub fn gen_intermediate_code(env: *mut CpuArchState, tb: *mut TranslationBlock);
}
