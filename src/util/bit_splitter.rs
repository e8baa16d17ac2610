/// A structure for easily splitting an opcode word
/// into its nibbles and argument fields.
///
/// The word is stored as the two bytes it was fetched as,
/// most significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSplitter(u8, u8);

impl BitSplitter {
    pub fn from_u16(value: u16) -> BitSplitter {
        BitSplitter((value >> 8) as u8, (value & 0x00FF) as u8)
    }

    pub fn new(left: u8, right: u8) -> BitSplitter {
        BitSplitter(left, right)
    }

    /// Left-shift the first u8-component 8 bits,
    /// then take bitwise or with the second component
    /// in order to store the components in a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.0 as u16) << 8) | self.1 as u16
    }

    /// The four nibbles of the word, most significant first.
    pub fn as_four_u8(&self) -> (u8, u8, u8, u8) {
        (self.0 >> 4, self.0 & 0x0F, self.1 >> 4, self.1 & 0x0F)
    }

    /// The `X` field, selecting a register.
    pub fn x(&self) -> u8 {
        self.0 & 0x0F
    }

    /// The `Y` field, selecting a register.
    pub fn y(&self) -> u8 {
        self.1 >> 4
    }

    pub fn last_4_bits(&self) -> u8 {
        self.1 & 0x0F
    }

    pub fn last_8_bits(&self) -> u8 {
        self.1
    }

    pub fn last_12_bits(&self) -> u16 {
        self.as_u16() & 0x0FFF
    }
}
