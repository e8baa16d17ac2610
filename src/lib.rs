/*!

A CHIP-8 virtual machine as specified at https://en.wikipedia.org/wiki/CHIP-8.

# Crossterm Frontend

If you want to try the emulator on some programs, there is a ready-to-use implementation
you can run by using `cargo run --release --bin crossterm_frontend -- <program.ch8>`.
Without a program, a small demo is played. The hexpad is mapped to the left side of the keyboard:

```text
1 2 3 4        1 2 3 C
q w e r   ->   4 5 6 D
a s d f        7 8 9 E
z x c v        A 0 B F
```

# Library

The emulator is a plain state machine. It does not keep time, draw anything or read input on its own.
A frontend calls `step` at the instruction rate, `tick_timers` at 60 Hz,
and `set_key` whenever a key changes.

```rust
use chip_8_vm::emulator::Emulator;

let mut emulator = Emulator::new().expect("could not allocate memory");

// Load a program at address 0x200: V0 = 5, V1 = 3, V0 += V1.
emulator.load(&[0x60, 0x05, 0x61, 0x03, 0x80, 0x14]);
for _ in 0..3 {
    emulator.step();
}
assert_eq!(emulator.registers()[0], 8);
assert_eq!(emulator.program_counter(), 0x206);
```

Alternatively, you can experiment by executing instructions manually.

```rust
use chip_8_vm::emulator::Emulator;
use chip_8_vm::emulator::instruction::{Instruction, Reg, Const, Addr};

let mut emulator = Emulator::new().expect("could not allocate memory");

// Execute instructions manually
emulator.execute_single(Instruction::ClearScreen);

// Or many sequentially
emulator.execute_many(&[
    Instruction::Goto(Addr(0x250)),
    Instruction::SetRegToConst(Reg(0xA), Const(35)),
    Instruction::SetRegToReg(Reg(0xB), Reg(0xA))
]);
assert_eq!(emulator.registers()[0xB], 35);
```

## Driving the emulator

`scheduler::Scheduler` turns elapsed wall-clock time into instruction cycles, timer ticks and refreshes.

```rust
use std::time::Duration;
use chip_8_vm::{emulator::Emulator, rom, scheduler::Scheduler};

let mut emulator = Emulator::new().expect("could not allocate memory");
emulator.load(&rom::DEMO);

let mut scheduler = Scheduler::new();
let tick = scheduler.update(&mut emulator, Duration::from_millis(100), false);
if tick.refresh {
    println!("{}", emulator.screen());
}
```
*/

pub mod emulator;
pub mod error;
pub mod rom;
pub mod scheduler;
pub mod util;
