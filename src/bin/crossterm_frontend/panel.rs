use chip_8_vm::emulator::emulator::STACK_SIZE;
use chip_8_vm::emulator::memory::MEM_SIZE;
use chip_8_vm::emulator::Emulator;
use chip_8_vm::scheduler::{REFRESH_FREQ, TIMER_FREQ};

/// How many memory cells are shown at once.
pub const MEMORY_ROWS: u16 = 16;

const HOTKEYS: [&str; 10] = [
    "1234/qwer/asdf/zxcv  hexpad",
    "p          pause or unpause",
    "0          restart the program",
    "[ ]        clock -/+ 10 Hz",
    "=          reset the clock",
    "l          toggle the bell",
    "Up/Down    move the memory cursor",
    "           (while paused)",
    "Backspace  load the demo",
    "Esc        quit",
];

/// A window of memory that follows the program counter,
/// or a cursor moved by hand while paused.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCursor {
    begin: u16,
    cursor: u16,
}

impl MemoryCursor {
    /// Point at `address`, scrolling the window just far enough to show it.
    pub fn set(&mut self, address: i32) {
        let address = address.max(0).min(MEM_SIZE as i32 - 1) as u16;
        self.cursor = address;
        if address < self.begin {
            self.begin = address;
        } else if address >= self.begin + MEMORY_ROWS {
            self.begin = address + 1 - MEMORY_ROWS;
        }
    }

    pub fn move_by(&mut self, offset: i32) {
        self.set(self.cursor as i32 + offset);
    }

    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    /// The addresses currently on display.
    pub fn window(&self) -> std::ops::Range<u16> {
        self.begin..self.begin + MEMORY_ROWS
    }
}

/// Frontend state shown next to the emulator state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub frequency: f64,
    pub paused: bool,
    pub bell: bool,
}

/// The lines of the side panel: memory, registers and stack side by side,
/// then clock rates, run state and the hotkey legend.
pub fn lines(emulator: &Emulator, cursor: &MemoryCursor, status: &Status) -> Vec<String> {
    let memory = emulator.memory();
    let registers = emulator.registers();
    let stack = emulator.stack();
    let top = emulator.stack_pointer() as usize % STACK_SIZE;

    let mut lines: Vec<String> = cursor
        .window()
        .enumerate()
        .map(|(row, address)| {
            let special = match row {
                0 => format!(" I: ${:03X}", emulator.i()),
                2 => format!("DL: ${:02X}", emulator.delay_timer()),
                3 => format!("SD: ${:02X}", emulator.sound_timer()),
                5 => format!("PC: ${:03X}", emulator.program_counter()),
                6 => format!("SP: ${:X}", emulator.stack_pointer()),
                _ => String::new(),
            };
            format!(
                "{} ${:04X} ${:02X}   V{:X}: ${:02X}   {:<8}   ST[{:X}]: ${:03X} {}",
                if address == cursor.cursor() { '>' } else { ' ' },
                address,
                memory[address as usize],
                row,
                registers[row],
                special,
                row,
                stack[row],
                if row == top { '<' } else { ' ' },
            )
        })
        .collect();

    lines.push(String::new());
    lines.push(format!(
        "Clock @ {} Hz   Timers @ {} Hz   Refresh @ {} Hz",
        status.frequency, TIMER_FREQ, REFRESH_FREQ
    ));

    let keys: Vec<String> = emulator.pressed_keys().map(|digit| format!("{:X}", digit)).collect();
    lines.push(format!(
        "{}   bell {}   keys [{}]",
        if status.paused { "PAUSED " } else { "running" },
        if status.bell { "on " } else { "off" },
        keys.join(" ")
    ));
    lines.push(match emulator.waiting_for_key() {
        Some(x) => format!("waiting for a key into V{:X}", x),
        None => String::new(),
    });

    lines.push(String::new());
    lines.extend(HOTKEYS.iter().map(|line| line.to_string()));
    lines
}

#[cfg(test)]
mod tests {

    use super::*;
    use pretty_assertions::assert_eq;

    fn status() -> Status {
        Status {
            frequency: 600.0,
            paused: false,
            bell: true,
        }
    }

    #[test]
    fn cursor_scrolls_to_show_address() {
        let mut cursor = MemoryCursor::default();
        assert_eq!(cursor.window(), 0x000..0x010);

        cursor.set(0x300);
        assert_eq!(cursor.cursor(), 0x300);
        assert_eq!(cursor.window(), 0x2F1..0x301);

        // Moving inside the window doesn't scroll
        cursor.move_by(-4);
        assert_eq!(cursor.window(), 0x2F1..0x301);

        cursor.set(0x2F0);
        assert_eq!(cursor.window(), 0x2F0..0x300);
    }

    #[test]
    fn cursor_is_clamped_to_memory() {
        let mut cursor = MemoryCursor::default();
        cursor.move_by(-1);
        assert_eq!(cursor.cursor(), 0);

        cursor.set(0x5000);
        assert_eq!(cursor.cursor(), 0xFFF);
        assert_eq!(cursor.window(), 0xFF0..0x1000);
    }

    #[test]
    fn panel_shows_registers_stack_and_memory() {
        let mut emulator = Emulator::with_seed(0).unwrap();
        // VA = 0x42; call 0x208
        emulator.load(&[0x6A, 0x42, 0x22, 0x08]);
        emulator.step();
        emulator.step();

        let mut cursor = MemoryCursor::default();
        cursor.set(emulator.program_counter() as i32);
        let lines = lines(&emulator, &cursor, &status());

        // The window ends at the program counter
        assert!(lines[15].starts_with("> $0208 $00"));
        assert!(lines[7].starts_with("  $0200 $6A"));
        assert!(lines[0xA].contains("VA: $42"));
        assert!(lines[0].contains("ST[0]: $204"));
        assert!(lines[1].ends_with('<'));
        assert!(lines[5].contains("PC: $208"));
        assert!(lines[6].contains("SP: $1"));
        assert_eq!(lines[17], "Clock @ 600 Hz   Timers @ 60 Hz   Refresh @ 60 Hz");
    }

    #[test]
    fn panel_shows_run_state_and_keys() {
        let mut emulator = Emulator::with_seed(0).unwrap();
        emulator.load(&[0xF3, 0x0A]);
        emulator.step();
        emulator.set_key(0xB, true);
        emulator.set_key(0x2, true);

        let paused = Status {
            paused: true,
            bell: false,
            ..status()
        };
        let lines = lines(&emulator, &MemoryCursor::default(), &paused);
        assert_eq!(lines[18], "PAUSED    bell off   keys [2 B]");
        assert_eq!(lines[19], "");
        assert_eq!(lines.last().map(String::as_str), Some("Esc        quit"));
    }
}
