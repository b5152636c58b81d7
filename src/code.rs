use crate::Chunk;

/// Contract satisfied by any executable-file model.
///
/// [`Elf`](crate::Elf) is the current sole implementor; other container
/// formats plug in here without the analysis layers caring. Teardown is the
/// implementor's `Drop`.
pub trait Code {
    /// Mapped address of the function `name`, if the model can resolve it.
    fn function_offset(&self, name: &str) -> Option<u64>;

    /// The function's bytes, carved out of its containing section.
    fn function_chunk(&self, name: &str) -> Option<Chunk<'_>>;
}
