use super::key_buffer::KeyBuffer;
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chip_8_vm::emulator::keypad::NUM_KEYS;
use chip_8_vm::emulator::Emulator;

/// Terminals only report key presses (and repeats), so a hexpad key
/// counts as released once it hasn't been reported for this long.
const RELEASE_TIMEOUT: Duration = Duration::from_millis(250);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Keys that control the emulator rather than the program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Quit,
    Pause,
    Restart,
    AddFrequency(f64),
    ResetFrequency,
    LoadDemo,
    ToggleBell,
    MoveCursor(i32),
}

/// A struct for managing keypresses that will automatically
/// start a thread that grabs keypresses.
pub struct KeyManager {
    stop: Arc<AtomicBool>,
    key_buffer: Arc<KeyBuffer>,
    event_listener: Option<JoinHandle<()>>,
    last_pressed: [Option<Instant>; NUM_KEYS],
}

impl KeyManager {
    // Start event listener thread
    pub fn new() -> KeyManager {
        let stop = Arc::new(AtomicBool::new(false));
        let key_buffer = Arc::new(KeyBuffer::new());
        let event_listener = event_listener(stop.clone(), key_buffer.clone());
        KeyManager {
            stop,
            key_buffer,
            event_listener: Some(event_listener),
            last_pressed: [None; NUM_KEYS],
        }
    }

    /// Forward pending hexpad presses and expired releases to the emulator,
    /// returning any emulator commands that were typed.
    /// The hexpad is left alone while `paused`.
    pub fn update(&mut self, emulator: &mut Emulator, paused: bool) -> Vec<Command> {
        let events = self.key_buffer.drain();
        apply_events(&mut self.last_pressed, events, Instant::now(), paused, emulator)
    }
}

fn apply_events(
    last_pressed: &mut [Option<Instant>; NUM_KEYS],
    events: Vec<(KeyEvent, Instant)>,
    now: Instant,
    paused: bool,
    emulator: &mut Emulator,
) -> Vec<Command> {
    let mut commands = Vec::new();

    for (key_event, timestamp) in events {
        if let Some(command) = key_to_command(key_event) {
            commands.push(command);
        } else if let Some(digit) = key_to_digit(key_event.code) {
            if paused {
                continue;
            }
            if last_pressed[digit as usize].is_none() {
                emulator.set_key(digit, true);
            }
            last_pressed[digit as usize] = Some(timestamp);
        }
    }

    if paused {
        return commands;
    }

    for digit in 0..NUM_KEYS {
        if let Some(timestamp) = last_pressed[digit] {
            if now.saturating_duration_since(timestamp) >= RELEASE_TIMEOUT {
                last_pressed[digit] = None;
                emulator.set_key(digit as u8, false);
            }
        }
    }

    commands
}

impl Drop for KeyManager {
    fn drop(&mut self) {
        // Tell the event listener to stop, and wait for it
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.event_listener.take() {
            if handle.join().is_err() {
                log::error!("Key event listener panicked");
            }
        }
    }
}

/// Starts a thread that listens for key events and pushes them to the key buffer.
fn event_listener(stop: Arc<AtomicBool>, key_buffer: Arc<KeyBuffer>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            match poll(POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    log::error!("Could not poll for events: {}", e);
                    break;
                }
            }

            match read() {
                Ok(Event::Key(key_event)) => {
                    log::debug!("Got key event {:?}", key_event);
                    key_buffer.push(key_event);
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("Could not read event: {}", e);
                    break;
                }
            }
        }
    })
}

/// The left side of a QWERTY keyboard, laid out like the original hexpad.
pub fn key_to_digit(key: KeyCode) -> Option<u8> {
    let digit = match key {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            '1' => 0x1,
            '2' => 0x2,
            '3' => 0x3,
            '4' => 0xC,
            'q' => 0x4,
            'w' => 0x5,
            'e' => 0x6,
            'r' => 0xD,
            'a' => 0x7,
            's' => 0x8,
            'd' => 0x9,
            'f' => 0xE,
            'z' => 0xA,
            'x' => 0x0,
            'c' => 0xB,
            'v' => 0xF,
            _ => return None,
        },
        _ => return None,
    };
    Some(digit)
}

pub fn key_to_command(key_event: KeyEvent) -> Option<Command> {
    let command = match key_event.code {
        KeyCode::Esc => Command::Quit,
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
        KeyCode::Char('p') => Command::Pause,
        KeyCode::Char('0') => Command::Restart,
        KeyCode::Char('[') => Command::AddFrequency(-10.0),
        KeyCode::Char(']') => Command::AddFrequency(10.0),
        KeyCode::Char('=') => Command::ResetFrequency,
        KeyCode::Backspace => Command::LoadDemo,
        KeyCode::Char('l') => Command::ToggleBell,
        KeyCode::Up => Command::MoveCursor(-1),
        KeyCode::Down => Command::MoveCursor(1),
        _ => return None,
    };
    Some(command)
}

#[cfg(test)]
mod tests {

    use super::*;
    use test_case::test_case;

    #[test_case('1' => Some(0x1) ; "top left")]
    #[test_case('4' => Some(0xC) ; "top right")]
    #[test_case('x' => Some(0x0) ; "zero")]
    #[test_case('V' => Some(0xF) ; "uppercase")]
    #[test_case('p' => None ; "unmapped")]
    fn hexpad_layout(c: char) -> Option<u8> {
        key_to_digit(KeyCode::Char(c))
    }

    #[test]
    fn every_digit_is_mapped_once() {
        let mut digits: Vec<u8> = "1234qwerasdfzxcv"
            .chars()
            .filter_map(|c| key_to_digit(KeyCode::Char(c)))
            .collect();
        digits.sort();
        assert_eq!(digits, (0..16).collect::<Vec<u8>>());
    }

    fn press(c: char, at: Instant) -> (KeyEvent, Instant) {
        (KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), at)
    }

    fn waiting_emulator() -> Emulator {
        let mut emulator = Emulator::with_seed(0).unwrap();
        // Wait for a key into V3
        emulator.load(&[0xF3, 0x0A]);
        emulator.step();
        emulator
    }

    #[test]
    fn hexpad_is_ignored_while_paused() {
        let mut emulator = waiting_emulator();
        let mut last_pressed = [None; NUM_KEYS];
        let now = Instant::now();

        let events = vec![press('w', now), press('p', now)];
        let commands = apply_events(&mut last_pressed, events, now, true, &mut emulator);
        assert_eq!(commands, vec![Command::Pause]);
        assert_eq!(emulator.waiting_for_key(), Some(3));
        assert!(!emulator.is_key_pressed(0x5));
        assert_eq!(last_pressed, [None; NUM_KEYS]);

        apply_events(&mut last_pressed, vec![press('w', now)], now, false, &mut emulator);
        assert_eq!(emulator.waiting_for_key(), None);
        assert_eq!(emulator.registers()[3], 0x5);
        assert!(emulator.is_key_pressed(0x5));
    }

    #[test]
    fn keys_are_released_after_timeout() {
        let mut emulator = waiting_emulator();
        let mut last_pressed = [None; NUM_KEYS];
        let start = Instant::now();

        apply_events(&mut last_pressed, vec![press('x', start)], start, false, &mut emulator);
        assert!(emulator.is_key_pressed(0x0));

        // Held keys stay down while paused, however long it lasts
        let later = start + 2 * RELEASE_TIMEOUT;
        apply_events(&mut last_pressed, Vec::new(), later, true, &mut emulator);
        assert!(emulator.is_key_pressed(0x0));

        apply_events(&mut last_pressed, Vec::new(), later, false, &mut emulator);
        assert!(!emulator.is_key_pressed(0x0));
        assert_eq!(last_pressed[0x0], None);
    }

    #[test]
    fn ctrl_c_quits() {
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_command(event), Some(Command::Quit));
    }

    #[test]
    fn arrows_move_memory_cursor() {
        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(key_to_command(up), Some(Command::MoveCursor(-1)));
        assert_eq!(key_to_command(down), Some(Command::MoveCursor(1)));
    }
}
