use std::path::PathBuf;
use std::time::Duration;

use structopt::StructOpt;

use chip_8_vm::emulator::Emulator;
use chip_8_vm::rom;
use chip_8_vm::scheduler::{Scheduler, CLOCK_FREQ_DEFAULT};

/// Run a program without any input or display, then print the final screen.
#[derive(StructOpt)]
struct Opt {
    /// The program to execute, the demo is used if none is given
    #[structopt(parse(from_os_str))]
    input: Option<PathBuf>,

    /// Instructions per second
    #[structopt(short, long, default_value = "600")]
    frequency: f64,

    /// Simulated run time in milliseconds
    #[structopt(short, long, default_value = "1000")]
    millis: u64,

    /// Seed for the random number generator
    #[structopt(short, long)]
    seed: Option<u64>,
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

    let mut emulator = match opt.seed {
        Some(seed) => Emulator::with_seed(seed)?,
        None => Emulator::new()?,
    };
    emulator.on_unknown_opcode(|opcode| log::warn!("Unknown opcode {:#06x}", opcode));
    emulator.load(&program);

    let mut scheduler = Scheduler::with_frequency(opt.frequency);
    if scheduler.frequency() != opt.frequency {
        log::warn!(
            "Frequency {} Hz is out of range, using {} Hz (default is {} Hz)",
            opt.frequency,
            scheduler.frequency(),
            CLOCK_FREQ_DEFAULT
        );
    }

    // Simulate time passing in one millisecond slices
    for _ in 0..opt.millis {
        scheduler.update(&mut emulator, Duration::from_millis(1), false);
    }

    print!("{}", emulator.screen());
    log::info!(
        "Stopped at {:#05x}, registers {:02x?}",
        emulator.program_counter(),
        emulator.registers()
    );

    Ok(())
}
