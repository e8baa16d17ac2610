//! Reading program images from disk.
//!
//! CHIP-8 programs have no header or magic number, so the only sanity checks
//! available are the file extension and the size.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::emulator::memory::MAX_PROGRAM_SIZE;

pub const ROM_EXTENSION: &str = "ch8";

#[derive(Debug, Error)]
pub enum RomError {
    #[error("ROM files should have a '.ch8' extension: {0:?}")]
    Extension(PathBuf),

    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    TooLarge { size: usize, max_size: usize },

    #[error("could not read ROM {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Played when no ROM is given. Draws a "CH-8" banner that moves down a row every ten timer ticks.
pub const DEMO: [u8; 76] = [
    0x6E, 0x0C, 0x60, 0x88, 0x61, 0x88, 0x62, 0xF8, 0x63, 0x88, 0x64, 0x88, 0xA2, 0x70, 0xF4, 0x55,
    0x60, 0x00, 0x61, 0x00, 0x62, 0xF8, 0x63, 0x00, 0x64, 0x00, 0xF4, 0x55, 0x22, 0x2E, 0x6A, 0x0A,
    0xFA, 0x15, 0xFA, 0x07, 0x3A, 0x00, 0x12, 0x22, 0x22, 0x2E, 0x7E, 0x01, 0x12, 0x1C, 0x60, 0x0C,
    0xF0, 0x29, 0x60, 0x10, 0xD0, 0xE5, 0xA2, 0x70, 0x60, 0x18, 0xD0, 0xE5, 0xA2, 0x75, 0x60, 0x20,
    0xD0, 0xE5, 0x60, 0x08, 0xF0, 0x29, 0x60, 0x28, 0xD0, 0xE5, 0x00, 0xEE,
];

/// Check that a program fits in memory after the reserved area.
pub fn check_size(program: &[u8]) -> Result<(), RomError> {
    if program.len() > MAX_PROGRAM_SIZE {
        return Err(RomError::TooLarge {
            size: program.len(),
            max_size: MAX_PROGRAM_SIZE,
        });
    }
    Ok(())
}

/// Read a `.ch8` file, rejecting anything that doesn't fit in memory.
pub fn read(path: impl AsRef<Path>) -> Result<Vec<u8>, RomError> {
    let path = path.as_ref();
    if path.extension().and_then(|ext| ext.to_str()) != Some(ROM_EXTENSION) {
        return Err(RomError::Extension(path.to_path_buf()));
    }

    let program = std::fs::read(path).map_err(|source| RomError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    check_size(&program)?;

    log::info!("Read {} bytes from {:?}", program.len(), path);
    Ok(program)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::emulator::Emulator;
    use pretty_assertions::assert_eq;

    fn temp_rom(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("chip-8-vm-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_rom_with_extension() {
        let path = temp_rom("pong.ch8", &[0x00, 0xE0]);
        assert_eq!(read(&path).unwrap(), vec![0x00, 0xE0]);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_other_extensions() {
        let path = temp_rom("picture.png", &[0x89, 0x50]);
        assert!(matches!(read(&path), Err(RomError::Extension(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_oversized_rom() {
        let path = temp_rom("huge.ch8", &vec![0; MAX_PROGRAM_SIZE + 1]);
        assert!(matches!(
            read(&path),
            Err(RomError::TooLarge { size, max_size: MAX_PROGRAM_SIZE }) if size == MAX_PROGRAM_SIZE + 1
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("chip-8-vm-does-not-exist.ch8");
        assert!(matches!(read(&path), Err(RomError::Io { .. })));
    }

    #[test]
    fn largest_rom_fits() {
        assert!(check_size(&vec![0; MAX_PROGRAM_SIZE]).is_ok());
    }

    #[test]
    fn demo_moves_banner_down() {
        let mut emulator = Emulator::with_seed(0).unwrap();
        emulator.load(&DEMO);

        // Draw the banner, then spin on the delay timer
        for _ in 0..40 {
            emulator.step();
        }
        assert_eq!(emulator.registers()[0xE], 0x0C);
        assert!(emulator.screen().pixel(16, 12));

        for _ in 0..10 {
            emulator.tick_timers();
        }
        for _ in 0..60 {
            emulator.step();
        }
        assert_eq!(emulator.registers()[0xE], 0x0D);
        assert_eq!(emulator.screen().row(12), 0);
        assert!(emulator.screen().pixel(16, 13));
    }
}
