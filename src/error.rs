use thiserror::Error;

/// Errors that can abort the construction of an emulator.
///
/// Nothing that happens while executing a program is reported as an error:
/// unknown opcodes are skipped and address arithmetic wraps.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("could not allocate {size} bytes of emulator memory")]
    OutOfMemory { size: usize },
}
