//! The 4 KiB address space of the machine.

use crate::error::VmError;

pub const MEM_SIZE: usize = 4096;
pub const PROGRAM_START: u16 = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEM_SIZE - PROGRAM_START as usize;
pub const FONT_GLYPH_SIZE: u16 = 5;
const ADDR_MASK: u16 = 0x0FFF;

/// The built-in hexadecimal font, glyph `d` starts at `5 * d`.
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Emulator memory. Every address is masked to 12 bits before use,
/// so no access can fall outside the buffer.
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Memory {
    /// Allocate zeroed memory and install the font.
    pub fn new() -> Result<Memory, VmError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(MEM_SIZE)
            .map_err(|_| VmError::OutOfMemory { size: MEM_SIZE })?;
        bytes.resize(MEM_SIZE, 0);
        bytes[..FONT.len()].copy_from_slice(&FONT);

        Ok(Memory {
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[(addr & ADDR_MASK) as usize]
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        self.bytes[(addr & ADDR_MASK) as usize] = value;
    }

    /// Read a big-endian word. The second byte wraps to address 0 at the end of memory.
    pub fn read_word(&self, addr: u16) -> (u8, u8) {
        (self.read(addr), self.read(addr.wrapping_add(1)))
    }

    /// Copy a program into memory at 0x200, returning the number of bytes copied.
    /// Anything that doesn't fit is dropped.
    pub fn load_program(&mut self, program: &[u8]) -> usize {
        let len = std::cmp::min(program.len(), MAX_PROGRAM_SIZE);
        if len < program.len() {
            log::warn!(
                "Program is {} bytes, truncating to {} bytes",
                program.len(),
                MAX_PROGRAM_SIZE
            );
        }

        let start = PROGRAM_START as usize;
        self.bytes[start..start + len].copy_from_slice(&program[..len]);
        len
    }

    /// Zero everything after the reserved area.
    pub fn clear_program(&mut self) {
        for byte in self.bytes[PROGRAM_START as usize..].iter_mut() {
            *byte = 0;
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}
