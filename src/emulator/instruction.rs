use crate::util::bit_splitter::BitSplitter;

/// A wrapper for addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr(pub u16);

/// A wrapper for registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(pub u8);

/// A wrapper for constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Const(pub u8);

/// A single instruction from the CHIP-8 instruction set.
/// Two bytes written in hexadecimal, with the following special characters:
/// - NNN: address
/// - NN: 8-bit constant
/// - N: 4-bit constant
/// - X and Y: 4-bit register identifier
/// - PC: Program counter
/// - I: 16 bit register for memory address
/// - VN: One of the 16 available variables (register identifiers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    ClearScreen, // 00E0
    Return, // 00EE
    Goto(Addr), // 1NNN
    Call(Addr), // 2NNN
    IfRegEqConst(Reg, Const), // 3XNN
    IfRegNeqConst(Reg, Const), // 4XNN
    IfRegEqReg(Reg, Reg), // 5XY0
    SetRegToConst(Reg, Const), // 6XNN
    IncRegByConst(Reg, Const), // 7XNN
    SetRegToReg(Reg, Reg), // 8XY0
    BitwiseOr(Reg, Reg), // 8XY1
    BitwiseAnd(Reg, Reg), // 8XY2
    BitwiseXor(Reg, Reg), // 8XY3
    IncRegByReg(Reg, Reg), // 8XY4
    DecRegByReg(Reg, Reg), // 8XY5
    BitshiftRight(Reg, Reg), // 8XY6
    SetVxVyMinusVx(Reg, Reg), // 8XY7
    BitshiftLeft(Reg, Reg), // 8XYE
    IfRegNeqReg(Reg, Reg), // 9XY0
    SetI(Addr), // ANNN
    SetPcToV0PlusAddr(Addr), // BNNN
    SetVxRand(Reg, Const), // CXNN
    Draw(Reg, Reg, Const), // DXYN
    IfKeyEqVx(Reg), // EX9E
    IfKeyNeqVx(Reg), // EXA1
    SetRegToDelayTimer(Reg), // FX07
    SetRegToGetKey(Reg), // FX0A
    SetDelayTimerToReg(Reg), // FX15
    SetSoundTimerToReg(Reg), // FX18
    AddRegToI(Reg), // FX1E
    SetIToSpriteAddrVx(Reg), // FX29
    SetIToBcdOfReg(Reg), // FX33
    RegDump(Reg), // FX55
    RegLoad(Reg) // FX65
}

impl Instruction {
    pub fn from_u16(value: u16) -> Option<Instruction> {
        let opcode = BitSplitter::from_u16(value);
        Instruction::decode(opcode)
    }

    pub fn from_two_u8(left: u8, right: u8) -> Option<Instruction> {
        Instruction::decode(BitSplitter::new(left, right))
    }

    /// Decode an opcode word. Arms are tried top to bottom and the first match wins,
    /// so the order here is the decoding precedence. Words matching no arm decode to `None`.
    fn decode(opcode: BitSplitter) -> Option<Instruction> {
        let addr = Addr(opcode.last_12_bits());
        let x = Reg(opcode.x());
        let y = Reg(opcode.y());
        let nn = Const(opcode.last_8_bits());
        let n = Const(opcode.last_4_bits());

        let instruction = match opcode.as_four_u8() {
            (0, 0, 0xE, 0) => Instruction::ClearScreen,
            (0, 0, 0xE, 0xE) => Instruction::Return,
            (1, _, _, _) => Instruction::Goto(addr),
            (2, _, _, _) => Instruction::Call(addr),
            (3, _, _, _) => Instruction::IfRegEqConst(x, nn),
            (4, _, _, _) => Instruction::IfRegNeqConst(x, nn),
            (5, _, _, 0) => Instruction::IfRegEqReg(x, y),
            (6, _, _, _) => Instruction::SetRegToConst(x, nn),
            (7, _, _, _) => Instruction::IncRegByConst(x, nn),
            (8, _, _, 0) => Instruction::SetRegToReg(x, y),
            (8, _, _, 1) => Instruction::BitwiseOr(x, y),
            (8, _, _, 2) => Instruction::BitwiseAnd(x, y),
            (8, _, _, 3) => Instruction::BitwiseXor(x, y),
            (8, _, _, 4) => Instruction::IncRegByReg(x, y),
            (8, _, _, 5) => Instruction::DecRegByReg(x, y),
            (8, _, _, 6) => Instruction::BitshiftRight(x, y),
            (8, _, _, 7) => Instruction::SetVxVyMinusVx(x, y),
            (8, _, _, 0xE) => Instruction::BitshiftLeft(x, y),
            (9, _, _, 0) => Instruction::IfRegNeqReg(x, y),
            (0xA, _, _, _) => Instruction::SetI(addr),
            (0xB, _, _, _) => Instruction::SetPcToV0PlusAddr(addr),
            (0xC, _, _, _) => Instruction::SetVxRand(x, nn),
            (0xD, _, _, _) => Instruction::Draw(x, y, n),
            (0xE, _, 9, 0xE) => Instruction::IfKeyEqVx(x),
            (0xE, _, 0xA, 1) => Instruction::IfKeyNeqVx(x),
            (0xF, _, 0, 7) => Instruction::SetRegToDelayTimer(x),
            (0xF, _, 0, 0xA) => Instruction::SetRegToGetKey(x),
            (0xF, _, 1, 5) => Instruction::SetDelayTimerToReg(x),
            (0xF, _, 1, 8) => Instruction::SetSoundTimerToReg(x),
            (0xF, _, 1, 0xE) => Instruction::AddRegToI(x),
            (0xF, _, 2, 9) => Instruction::SetIToSpriteAddrVx(x),
            (0xF, _, 3, 3) => Instruction::SetIToBcdOfReg(x),
            (0xF, _, 5, 5) => Instruction::RegDump(x),
            (0xF, _, 6, 5) => Instruction::RegLoad(x),
            _ => return None,
        };

        Some(instruction)
    }
}
