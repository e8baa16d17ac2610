pub const NUM_KEYS: usize = 16;

/// The state of the 16-key hexpad.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Keypad {
        Keypad::default()
    }

    /// Digits are taken modulo 16.
    pub fn set(&mut self, digit: u8, pressed: bool) {
        self.keys[(digit & 0xF) as usize] = pressed;
    }

    /// Digits are taken modulo 16.
    pub fn is_pressed(&self, digit: u8) -> bool {
        self.keys[(digit & 0xF) as usize]
    }

    /// The digits of all keys currently held down.
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        (0..NUM_KEYS as u8).filter(move |digit| self.keys[*digit as usize])
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn press_and_release() {
        let mut keypad = Keypad::new();
        keypad.set(0xA, true);
        keypad.set(0x3, true);
        assert!(keypad.is_pressed(0xA));
        assert_eq!(keypad.pressed().collect::<Vec<_>>(), vec![0x3, 0xA]);
        keypad.set(0xA, false);
        assert!(!keypad.is_pressed(0xA));
    }

    #[test]
    fn digits_wrap_to_a_nibble() {
        let mut keypad = Keypad::new();
        keypad.set(0x12, true);
        assert!(keypad.is_pressed(0x2));
    }
}
