use crate::{invalid_format, Chunk, Error, Result};
use core::any::Any;
use core::fmt;
use hashbrown::HashMap;
use iced_x86::{Decoder, DecoderOptions, Encoder, Formatter, Instruction, IntelFormatter};
use std::borrow::Cow;

const BITNESS: u32 = 64;

/// An address-keyed group of decoded instructions.
///
/// A chain couples the raw bytes the instructions were decoded from, the
/// decoded records themselves, a printable disassembly and a byte-offset map
/// used for pattern search. The instruction byte lengths always sum to the
/// chunk length, and instruction addresses increase monotonically from the
/// chain address.
///
/// The byte backing aliases whatever the chain was decoded from (an
/// [`Elf`](crate::Elf)'s region, typically); [`into_owned`](Chain::into_owned)
/// materializes a copy when the chain has to outlive its source.
///
/// # Examples
/// ```
/// use elfchain::{Chain, Chunk};
///
/// let chain = Chain::from_chunk(0x400000, Chunk::new(b"\x90\x90\xc3"))?;
/// assert_eq!(chain.instructions().len(), 3);
/// # Ok::<(), elfchain::Error>(())
/// ```
pub struct Chain<'a> {
    addr: u64,
    text: String,
    raw: Cow<'a, [u8]>,
    insns: Vec<Instruction>,
    /// byte offset within the chunk -> decoded record
    map: HashMap<usize, Instruction>,
    /// opaque solver context parked between analysis passes
    solver: Option<Box<dyn Any>>,
}

impl fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("bytes", &self.raw.len())
            .field("instructions", &self.insns.len())
            .finish()
    }
}

impl<'a> Chain<'a> {
    /// Decode `chunk` starting at `addr` and assemble the printable form.
    ///
    /// The whole chunk must decode; an undecodable byte fails with
    /// [`Error::InvalidFormat`] and nothing is kept.
    pub fn from_chunk(addr: u64, chunk: Chunk<'a>) -> Result<Chain<'a>> {
        let bytes = chunk.as_bytes();
        let mut decoder = Decoder::with_ip(BITNESS, bytes, addr, DecoderOptions::NONE);
        let mut insns = Vec::new();
        while decoder.can_decode() {
            let insn = decoder.decode();
            if insn.is_invalid() {
                return Err(invalid_format("undecodable instruction bytes"));
            }
            insns.push(insn);
        }
        let map = index_by_offset(addr, &insns);
        Ok(Chain {
            addr,
            text: render(&insns),
            raw: Cow::Borrowed(bytes),
            insns,
            map,
            solver: None,
        })
    }

    /// Build a chain from pre-decoded instructions, re-encoding them to
    /// synthesize the byte backing and the printable form.
    ///
    /// Instructions are laid out back to back from `addr`; the recorded
    /// IPs of the inputs are ignored.
    pub fn from_instructions(addr: u64, insns: Vec<Instruction>) -> Result<Chain<'static>> {
        let mut encoder = Encoder::new(BITNESS);
        let mut map = HashMap::with_capacity(insns.len());
        let mut offset = 0usize;
        for insn in &insns {
            let len = encoder
                .encode(insn, addr + offset as u64)
                .map_err(|err| Error::Encode {
                    msg: err.to_string(),
                })?;
            map.insert(offset, insn.clone());
            offset += len;
        }
        Ok(Chain {
            addr,
            text: render(&insns),
            raw: Cow::Owned(encoder.take_buffer()),
            insns,
            map,
            solver: None,
        })
    }

    /// Trusted raw constructor; the parts are taken as already consistent.
    pub fn new(addr: u64, text: String, chunk: Chunk<'a>, insns: Vec<Instruction>) -> Chain<'a> {
        let map = index_by_offset(addr, &insns);
        Chain {
            addr,
            text,
            raw: Cow::Borrowed(chunk.as_bytes()),
            insns,
            map,
            solver: None,
        }
    }

    /// Entry address of the chain.
    #[inline]
    pub fn addr(&self) -> u64 {
        self.addr
    }

    /// Human-readable disassembly, one instruction per line.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The bytes the instructions were decoded from.
    #[inline]
    pub fn chunk(&self) -> Chunk<'_> {
        Chunk::new(&self.raw)
    }

    /// Decoded records in address order.
    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.insns
    }

    /// Byte-offset-within-chunk to decoded-record map.
    #[inline]
    pub fn map(&self) -> &HashMap<usize, Instruction> {
        &self.map
    }

    /// Sub-map restricted to instructions whose bytes start with `prefix`.
    pub fn map_prefix(&self, prefix: Chunk<'_>) -> HashMap<usize, Instruction> {
        let pat = prefix.as_bytes();
        self.map
            .iter()
            .filter(|(&offset, insn)| {
                self.raw
                    .get(offset..offset + insn.len())
                    .is_some_and(|bytes| bytes.starts_with(pat))
            })
            .map(|(&offset, insn)| (offset, insn.clone()))
            .collect()
    }

    pub fn set_addr(&mut self, addr: u64) {
        self.addr = addr;
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Swap the byte backing. The instruction list is left alone; callers
    /// replacing the bytes out from under decoded records re-decode.
    pub fn set_chunk(&mut self, chunk: Chunk<'a>) {
        self.raw = Cow::Borrowed(chunk.as_bytes());
    }

    /// Replace the instruction list and rebuild the offset map.
    pub fn set_instructions(&mut self, insns: Vec<Instruction>) {
        self.map = index_by_offset(self.addr, &insns);
        self.insns = insns;
    }

    /// Park an opaque solver context on the chain for later passes.
    pub fn set_solver_ctx(&mut self, ctx: Box<dyn Any>) {
        self.solver = Some(ctx);
    }

    /// The parked solver context, if any pass attached one.
    pub fn solver_ctx(&self) -> Option<&dyn Any> {
        self.solver.as_deref()
    }

    /// Copy the byte backing so the chain no longer borrows its source.
    pub fn into_owned(self) -> Chain<'static> {
        Chain {
            addr: self.addr,
            text: self.text,
            raw: Cow::Owned(self.raw.into_owned()),
            insns: self.insns,
            map: self.map,
            solver: self.solver,
        }
    }
}

fn index_by_offset(addr: u64, insns: &[Instruction]) -> HashMap<usize, Instruction> {
    insns
        .iter()
        .map(|insn| ((insn.ip() - addr) as usize, insn.clone()))
        .collect()
}

fn render(insns: &[Instruction]) -> String {
    let mut formatter = IntelFormatter::new();
    let mut text = String::new();
    for (i, insn) in insns.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        formatter.format(insn, &mut text);
    }
    text
}
