//! The CHIP-8 emulator as described at https://en.wikipedia.org/wiki/CHIP-8#Virtual_machine_description.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::emulator::instruction::*;
use crate::emulator::keypad::{Keypad, NUM_KEYS};
use crate::emulator::memory::{Memory, FONT_GLYPH_SIZE, PROGRAM_START};
use crate::emulator::screen::Screen;
use crate::error::VmError;

pub const NUM_REGISTERS: usize = 16;
pub const STACK_SIZE: usize = 16;
const FLAG: usize = 0xF;

type UnknownOpcodeHook = Box<dyn FnMut(u16) + Send>;

/// A CHIP-8 virtual machine.
///
/// The emulator has no notion of time. A driver calls [`Emulator::step`] at the
/// instruction clock rate, [`Emulator::tick_timers`] at 60 Hz and
/// [`Emulator::set_key`] whenever the hexpad changes.
///
/// The stack is not checked: calling more than 16 levels deep or returning
/// with an empty stack silently wraps the stack index.
pub struct Emulator {
    memory: Memory,
    registers: [u8; NUM_REGISTERS],
    delay_timer: u8,
    sound_timer: u8,
    i: u16,
    program_counter: u16,
    stack_pointer: u8,
    stack: [u16; STACK_SIZE],
    screen: Screen,
    keypad: Keypad,

    // Register that receives the next key press. Execution is suspended while set.
    waiting_for_key: Option<Reg>,

    rng: StdRng,
    unknown_opcode_hook: Option<UnknownOpcodeHook>,
}

impl Emulator {
    /// Create a new emulator with the font installed and no program loaded.
    pub fn new() -> Result<Emulator, VmError> {
        Emulator::with_rng(StdRng::from_entropy())
    }

    /// Create a new emulator whose random number generator is seeded,
    /// making `CXNN` deterministic.
    pub fn with_seed(seed: u64) -> Result<Emulator, VmError> {
        Emulator::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Result<Emulator, VmError> {
        Ok(Emulator {
            memory: Memory::new()?,
            registers: [0; NUM_REGISTERS],
            delay_timer: 0,
            sound_timer: 0,
            i: 0,
            program_counter: PROGRAM_START,
            stack_pointer: 0,
            stack: [0; STACK_SIZE],
            screen: Screen::new(),
            keypad: Keypad::new(),
            waiting_for_key: None,
            rng,
            unknown_opcode_hook: None,
        })
    }

    /// Register a callback that receives every opcode word that fails to decode.
    /// Such words are still skipped.
    pub fn on_unknown_opcode<F>(&mut self, hook: F)
    where
        F: FnMut(u16) + Send + 'static,
    {
        self.unknown_opcode_hook = Some(Box::new(hook));
    }

    /// Restart the loaded program from the beginning.
    /// Memory, including the program, is left untouched.
    pub fn restart(&mut self) {
        self.registers = [0; NUM_REGISTERS];
        self.stack = [0; STACK_SIZE];
        self.screen.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.program_counter = PROGRAM_START;
        self.stack_pointer = 0;
        self.i = 0;
        self.waiting_for_key = None;
    }

    /// Restart and erase the program area of memory. The font is kept.
    pub fn reset(&mut self) {
        log::info!("Resetting emulator");
        self.restart();
        self.memory.clear_program();
    }

    /// Copy a program into memory at 0x200 and restart execution there.
    /// Bytes that don't fit in memory are dropped.
    pub fn load(&mut self, program: &[u8]) {
        let loaded = self.memory.load_program(program);
        log::info!("Loaded {} bytes at {:#05x}", loaded, PROGRAM_START);
        self.restart();
    }

    /// Fetch, decode and execute a single instruction.
    /// Does nothing while waiting for a key press.
    pub fn step(&mut self) {
        if self.waiting_for_key.is_some() {
            return;
        }

        // Each opcode is two bytes
        let (left, right) = self.memory.read_word(self.program_counter);
        self.program_counter = self.program_counter.wrapping_add(2);

        match Instruction::from_two_u8(left, right) {
            Some(instruction) => {
                log::trace!("{:?}", instruction);
                self.execute_single(instruction);
            }
            None => {
                let opcode = u16::from_be_bytes([left, right]);
                log::debug!("Skipping unknown opcode {:#06x}", opcode);
                if let Some(hook) = self.unknown_opcode_hook.as_mut() {
                    hook(opcode);
                }
            }
        }
    }

    /// Count both timers down by one, stopping at zero.
    pub fn tick_timers(&mut self) {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }

        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
    }

    /// Update the state of a hexpad key. A press resolves a pending `FX0A`.
    pub fn set_key(&mut self, digit: u8, pressed: bool) {
        if digit as usize >= NUM_KEYS {
            log::warn!("Ignoring key {:#x}, the hexpad only has keys 0-F", digit);
            return;
        }

        self.keypad.set(digit, pressed);

        if pressed {
            if let Some(Reg(x)) = self.waiting_for_key.take() {
                self.registers[x as usize] = digit;
            }
        }
    }

    /// Execute many instructions sequentially
    pub fn execute_many(&mut self, instructions: &[Instruction]) {
        for instruction in instructions {
            self.execute_single(*instruction);
        }
    }

    /// Execute a single instruction
    pub fn execute_single(&mut self, instruction: Instruction) {
        match instruction {

            // Clear the screen
            Instruction::ClearScreen => {
                self.screen.clear();
            }

            // Return to the previous call site via the stack.
            Instruction::Return => {
                self.stack_pointer = self.stack_pointer.wrapping_sub(1);
                self.program_counter = self.stack[self.stack_index()]; // Jump back via stack
            }

            // Go to a specific memory address
            Instruction::Goto(Addr(addr)) => {
                self.program_counter = addr;
            }

            // Store the current address on the stack, then jump to the specified address
            Instruction::Call(Addr(addr)) => {
                self.stack[self.stack_index()] = self.program_counter; // Store current address
                self.stack_pointer = self.stack_pointer.wrapping_add(1);
                self.program_counter = addr; // Jump to addr
            }

            // If the register equals the constant, skip the next instruction
            Instruction::IfRegEqConst(Reg(x), Const(n)) => {
                self.skip_if(self.registers[x as usize] == n);
            }

            Instruction::IfRegNeqConst(Reg(x), Const(n)) => {
                self.skip_if(self.registers[x as usize] != n);
            }

            Instruction::IfRegEqReg(Reg(x), Reg(y)) => {
                self.skip_if(self.registers[x as usize] == self.registers[y as usize]);
            }

            Instruction::SetRegToConst(Reg(x), Const(n)) => {
                self.registers[x as usize] = n;
            }

            // Wraps, VF is left alone
            Instruction::IncRegByConst(Reg(x), Const(n)) => {
                self.registers[x as usize] = self.registers[x as usize].wrapping_add(n);
            }

            Instruction::SetRegToReg(Reg(x), Reg(y)) => {
                self.registers[x as usize] = self.registers[y as usize];
            }

            Instruction::BitwiseOr(Reg(x), Reg(y)) => {
                self.registers[x as usize] |= self.registers[y as usize];
            }

            Instruction::BitwiseAnd(Reg(x), Reg(y)) => {
                self.registers[x as usize] &= self.registers[y as usize];
            }

            Instruction::BitwiseXor(Reg(x), Reg(y)) => {
                self.registers[x as usize] ^= self.registers[y as usize];
            }

            // The flag is written before the result, so VF as X ends up holding the sum
            Instruction::IncRegByReg(Reg(x), Reg(y)) => {
                let (sum, carry) = self.registers[x as usize].overflowing_add(self.registers[y as usize]);
                self.registers[FLAG] = carry as u8;
                self.registers[x as usize] = sum;
            }

            // VF is 1 when there is no borrow
            Instruction::DecRegByReg(Reg(x), Reg(y)) => {
                let (vx, vy) = (self.registers[x as usize], self.registers[y as usize]);
                self.registers[FLAG] = (vx >= vy) as u8;
                self.registers[x as usize] = vx.wrapping_sub(vy);
            }

            Instruction::BitshiftRight(Reg(x), Reg(y)) => {
                let vy = self.registers[y as usize];
                self.registers[FLAG] = vy & 1;
                self.registers[x as usize] = vy >> 1;
            }

            Instruction::SetVxVyMinusVx(Reg(x), Reg(y)) => {
                let (vx, vy) = (self.registers[x as usize], self.registers[y as usize]);
                self.registers[FLAG] = (vy >= vx) as u8;
                self.registers[x as usize] = vy.wrapping_sub(vx);
            }

            Instruction::BitshiftLeft(Reg(x), Reg(y)) => {
                let vy = self.registers[y as usize];
                self.registers[FLAG] = vy >> 7;
                self.registers[x as usize] = vy << 1;
            }

            Instruction::IfRegNeqReg(Reg(x), Reg(y)) => {
                self.skip_if(self.registers[x as usize] != self.registers[y as usize]);
            }

            Instruction::SetI(Addr(addr)) => {
                self.i = addr;
            }

            Instruction::SetPcToV0PlusAddr(Addr(addr)) => {
                self.program_counter = self.registers[0] as u16 + addr;
            }

            Instruction::SetVxRand(Reg(x), Const(n)) => {
                self.registers[x as usize] = self.rng.gen::<u8>() & n;
            }

            // XOR the sprite at I onto the screen, VF records whether anything was erased
            Instruction::Draw(Reg(x), Reg(y), Const(sprite_height)) => {
                let x_coord = self.registers[x as usize];
                let y_coord = self.registers[y as usize] as usize;

                let mut any_collisions = false;
                for dy in 0..sprite_height as u16 {
                    let row = self.memory.read(self.i.wrapping_add(dy));
                    any_collisions |= self.screen.draw_sprite_row(x_coord, y_coord + dy as usize, row);
                }

                // Set VF collision flag
                self.registers[FLAG] = any_collisions as u8;
            }

            Instruction::IfKeyEqVx(Reg(x)) => {
                self.skip_if(self.keypad.is_pressed(self.registers[x as usize]));
            }

            Instruction::IfKeyNeqVx(Reg(x)) => {
                self.skip_if(!self.keypad.is_pressed(self.registers[x as usize]));
            }

            Instruction::SetRegToDelayTimer(Reg(x)) => {
                self.registers[x as usize] = self.delay_timer;
            }

            // Suspend execution until a key is pressed, see `set_key`
            Instruction::SetRegToGetKey(reg) => {
                self.waiting_for_key = Some(reg);
            }

            Instruction::SetDelayTimerToReg(Reg(x)) => {
                self.delay_timer = self.registers[x as usize];
            }

            Instruction::SetSoundTimerToReg(Reg(x)) => {
                self.sound_timer = self.registers[x as usize];
            }

            Instruction::AddRegToI(Reg(x)) => {
                self.i = self.i.wrapping_add(self.registers[x as usize] as u16);
            }

            // Set i to character address. Each font element is 5 bytes wide.
            Instruction::SetIToSpriteAddrVx(Reg(x)) => {
                self.i = FONT_GLYPH_SIZE * self.registers[x as usize] as u16;
            }

            Instruction::SetIToBcdOfReg(Reg(x)) => {
                let value = self.registers[x as usize];
                self.memory.write(self.i, value / 100);
                self.memory.write(self.i.wrapping_add(1), value / 10 % 10);
                self.memory.write(self.i.wrapping_add(2), value % 10);
            }

            // Dump register values up to Vx
            Instruction::RegDump(Reg(x)) => {
                for reg_no in 0..=x as u16 {
                    self.memory.write(self.i.wrapping_add(reg_no), self.registers[reg_no as usize]);
                }
                self.i = self.i.wrapping_add(x as u16 + 1);
            }

            // Load register values up to Vx
            Instruction::RegLoad(Reg(x)) => {
                for reg_no in 0..=x as u16 {
                    self.registers[reg_no as usize] = self.memory.read(self.i.wrapping_add(reg_no));
                }
                self.i = self.i.wrapping_add(x as u16 + 1);
            }
        };
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
    }

    fn stack_index(&self) -> usize {
        self.stack_pointer as usize % STACK_SIZE
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.as_slice()
    }

    pub fn stack(&self) -> &[u16; STACK_SIZE] {
        &self.stack
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn stack_pointer(&self) -> u8 {
        self.stack_pointer
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// Whether the buzzer should currently sound.
    pub fn is_sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// The register waiting for a key press, if any.
    pub fn waiting_for_key(&self) -> Option<u8> {
        self.waiting_for_key.map(|Reg(x)| x)
    }

    pub fn is_key_pressed(&self, digit: u8) -> bool {
        self.keypad.is_pressed(digit)
    }

    /// The digits of all hexpad keys held down, in ascending order.
    pub fn pressed_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.keypad.pressed()
    }
}
