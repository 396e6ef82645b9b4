extern crate chip8core;
extern crate chip8driver;
extern crate chip8vm;
#[macro_use]
extern crate log;

use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chip8core::Vm;
use chip8driver::{read_rom, Config, RunError, Runner, ScriptedKeypad, TextSink};
use chip8vm::{Cpu, Opcode, Quirks};
use clap::Parser;

/// Runs a CHIP-8 program, printing each frame to stdout.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Program image, loaded at 0x200
    rom: PathBuf,

    /// Frames per second; 0 runs as fast as possible
    #[arg(long, default_value_t = 60)]
    frame_rate: u32,

    /// Most instructions executed per frame
    #[arg(long, default_value_t = 1)]
    cycles_per_frame: u32,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Hex characters to feed to key waits, in order
    #[arg(long, default_value = "")]
    keys: String,

    /// Shift VX in place instead of shifting VY into VX
    #[arg(long)]
    shift_vx: bool,

    /// Leave VF alone in OR, AND and XOR
    #[arg(long)]
    keep_vf: bool,

    /// Wrap sprites around the screen edges instead of clipping them
    #[arg(long)]
    wrap_sprites: bool,
}

impl Args {
    fn quirks(&self) -> Quirks {
        Quirks {
            logic_resets_vf: !self.keep_vf,
            shift_reads_vy: !self.shift_vx,
            wrap_sprites: self.wrap_sprites,
        }
    }

    fn config(&self) -> Config {
        Config {
            frame_rate: self.frame_rate,
            cycles_per_frame: self.cycles_per_frame,
            max_frames: self.frames,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.rom)
        .with_context(|| format!("could not open {}", args.rom.display()))?;
    let rom = read_rom(file)?;
    info!("loaded {} bytes from {}", rom.len(), args.rom.display());

    let mut cpu = Cpu::new().with_quirks(args.quirks());
    if let Some(seed) = args.seed {
        cpu.reseed(seed);
    }
    cpu.load_program(&rom);

    let mut keypad = ScriptedKeypad::new();
    keypad.type_str(&args.keys);

    let mut runner = Runner::new(args.config(), keypad, TextSink::new(io::stdout()));
    match runner.run(&mut cpu) {
        Ok(frames) => {
            info!("done after {} frames", frames);
            Ok(())
        }
        Err(RunError::Fault { source, snapshot }) => {
            let at = snapshot.opcode
                .map(|bits| Opcode::new(bits).to_string())
                .unwrap_or_else(|| "--".to_string());
            error!("{} at {}\n{}", source, at, snapshot);
            Err(source.into())
        }
        Err(err) => Err(err.into()),
    }
}
