use std::path::PathBuf;
use std::time::Instant;

use structopt::StructOpt;

use chip_8_vm::emulator::Emulator;
use chip_8_vm::rom;
use chip_8_vm::scheduler::Scheduler;

mod crossterm_io;
mod key_buffer;
mod key_manager;
mod panel;
use crossterm_io::CrosstermOutput;
use key_manager::{Command, KeyManager};
use panel::{MemoryCursor, Status};

/// The program options.
#[derive(StructOpt)]
struct Opt {
    /// The program to execute, a demo is played if none is given
    #[structopt(parse(from_os_str))]
    input: Option<PathBuf>,

    /// Instructions per second, between 1 and 1000
    #[structopt(short, long, default_value = "600")]
    frequency: f64,

    /// Don't ring the terminal bell while the sound timer is active
    #[structopt(short, long)]
    mute: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {

    env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    let program = match &opt.input {
        Some(path) => {
            log::info!("Executing {:?}", path);
            rom::read(path)?
        }
        None => rom::DEMO.to_vec(),
    };

    // Load instructions into emulator memory
    let mut emulator = Emulator::new()?;
    emulator.on_unknown_opcode(|opcode| log::debug!("Skipped unknown opcode {:#06x}", opcode));
    emulator.load(&program);

    let mut scheduler = Scheduler::with_frequency(opt.frequency);
    let mut key_manager = KeyManager::new();
    let mut output = CrosstermOutput::new()?;

    let mut paused = false;
    let mut bell = !opt.mute;
    let mut was_sounding = false;
    let mut memory_cursor = MemoryCursor::default();
    let mut last = Instant::now();

    // Start execution
    'running: loop {
        let now = Instant::now();
        let delta = now - last;
        last = now;

        // Key state is applied before the cycles that observe it
        for command in key_manager.update(&mut emulator, paused) {
            log::info!("{:?}", command);
            match command {
                Command::Quit => break 'running,
                Command::Pause => paused = !paused,
                Command::Restart => {
                    emulator.restart();
                    paused = false;
                }
                Command::AddFrequency(hz) => scheduler.add_frequency(hz),
                Command::ResetFrequency => scheduler.reset_frequency(),
                Command::LoadDemo => {
                    emulator.reset();
                    emulator.load(&rom::DEMO);
                    paused = false;
                }
                Command::ToggleBell => bell = !bell,
                Command::MoveCursor(offset) if paused => memory_cursor.move_by(offset),
                Command::MoveCursor(_) => {}
            }
        }

        let tick = scheduler.update(&mut emulator, delta, paused);

        let sounding = emulator.is_sound_active();
        if sounding && !was_sounding && bell && !paused {
            output.bell()?;
        }
        was_sounding = sounding;

        if tick.refresh {
            // The memory view follows the program unless it's being inspected
            if !paused {
                memory_cursor.set(emulator.program_counter() as i32);
            }
            let status = Status {
                frequency: scheduler.frequency(),
                paused,
                bell,
            };
            output.refresh(&emulator, &panel::lines(&emulator, &memory_cursor, &status))?;
        }

        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    Ok(())
}
