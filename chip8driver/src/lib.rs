extern crate chip8core;
#[macro_use]
extern crate log;
extern crate spin_sleep;
mod keypad;
mod rom;
mod sink;

pub use keypad::ScriptedKeypad;
pub use rom::{read_rom, RomError};
pub use sink::{FrameSink, NullSink, TextSink};

use chip8core::{Keypad, Snapshot, Step, Vm, VmError};
use std::io;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Frames presented per second. Zero runs unthrottled.
    pub frame_rate: u32,
    /// Upper bound on cycles per frame; a draw ends the frame early.
    pub cycles_per_frame: u32,
    /// Stop after this many frames. `None` runs until an error.
    pub max_frames: Option<u64>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            frame_rate: 60,
            cycles_per_frame: 1,
            max_frames: None,
        }
    }
}

impl Config {
    pub fn frame_period(&self) -> Duration {
        if self.frame_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / self.frame_rate
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("VM fault: {source}")]
    Fault {
        source: VmError,
        /// Machine state at the faulting instruction.
        snapshot: Box<Snapshot>,
    },
    #[error("could not present frame: {0}")]
    Sink(#[from] io::Error),
}

/// What happened during one presented frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub cycles: u32,
    pub drew: bool,
    pub waiting: bool,
}

/// Drives a VM at a fixed frame rate, presenting its framebuffer after
/// every frame.
pub struct Runner<K: Keypad, S: FrameSink> {
    config: Config,
    keypad: K,
    sink: S,
    frames: u64,
    waiting: bool,
}

impl<K: Keypad, S: FrameSink> Runner<K, S> {
    pub fn new(config: Config, keypad: K, sink: S) -> Runner<K, S> {
        Runner {
            config,
            keypad,
            sink,
            frames: 0,
            waiting: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keypad_mut(&mut self) -> &mut K {
        &mut self.keypad
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs cycles until the frame's budget is spent, a sprite is drawn, or
    /// the VM blocks on a key, then presents the framebuffer once.
    pub fn run_frame<V: Vm + ?Sized>(&mut self, vm: &mut V) -> Result<FrameReport, RunError> {
        let mut report = FrameReport::default();

        for _ in 0..self.config.cycles_per_frame {
            let step = match vm.step(&mut self.keypad) {
                Ok(step) => step,
                Err(source) => {
                    return Err(RunError::Fault {
                        source,
                        snapshot: Box::new(vm.snapshot()),
                    });
                }
            };
            match step {
                Step::Executed => report.cycles += 1,
                Step::Drew => {
                    report.cycles += 1;
                    report.drew = true;
                    break;
                }
                Step::Waiting => {
                    report.waiting = true;
                    break;
                }
            }
        }

        if report.waiting != self.waiting {
            if report.waiting {
                debug!("waiting for a key press");
            } else {
                debug!("key wait resolved");
            }
            self.waiting = report.waiting;
        }

        self.sink.present(vm.framebuffer())?;
        self.frames += 1;
        trace!("frame {}: {:?}", self.frames, report);

        Ok(report)
    }

    /// Presents frames at the configured rate until `max_frames` is reached
    /// or the VM faults. Returns the number of frames presented.
    pub fn run<V: Vm + ?Sized>(&mut self, vm: &mut V) -> Result<u64, RunError> {
        let period = self.config.frame_period();
        info!("running at {} fps, {} cycles per frame",
              self.config.frame_rate, self.config.cycles_per_frame);

        while self.config.max_frames.map_or(true, |max| self.frames < max) {
            let start = Instant::now();
            self.run_frame(vm)?;

            if let Some(rest) = period.checked_sub(start.elapsed()) {
                spin_sleep::sleep(rest);
            }
        }

        info!("stopped after {} frames", self.frames);
        Ok(self.frames)
    }
}
