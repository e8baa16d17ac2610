//! The virtual machine and the pieces of state it is built from.

#[allow(clippy::module_inception)]
pub mod emulator;
pub mod instruction;
pub mod keypad;
pub mod memory;
pub mod screen;

pub use self::emulator::Emulator;
