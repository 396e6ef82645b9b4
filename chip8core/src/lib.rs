extern crate thiserror;
mod framebuffer;

use std::fmt;

pub use framebuffer::{Framebuffer, GFX_H, GFX_W};

/// Total addressable memory, in bytes.
pub const MEM_SIZE: usize = 4096;
/// Where loaded programs start.
pub const PROGRAM_START: usize = 0x200;
/// Largest program that fits between `PROGRAM_START` and the end of memory.
pub const MAX_PROGRAM_SIZE: usize = MEM_SIZE - PROGRAM_START;
/// Depth of the call stack.
pub const STACK_SIZE: usize = 96;

pub trait Vm {
    /// Copies `program` into memory at `PROGRAM_START`.
    ///
    /// Panics if the program is longer than `MAX_PROGRAM_SIZE`; hosts are
    /// expected to validate ROM size before loading.
    fn load_program(&mut self, program: &[u8]);

    /// Runs a single fetch-decode-execute cycle.
    fn step(&mut self, keypad: &mut dyn Keypad) -> Result<Step, VmError>;

    fn framebuffer(&self) -> &Framebuffer;

    /// A copy of the machine state, for diagnostics.
    fn snapshot(&self) -> Snapshot;
}

/// Key state as seen by the VM. Polled at most once per cycle.
pub trait Keypad {
    /// Whether hex key `key` is currently held down.
    fn is_down(&self, key: Key) -> bool;

    /// The character typed since the last poll, if any.
    fn typed(&mut self) -> Option<char>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    D0 = 0x0,
    D1 = 0x1,
    D2 = 0x2,
    D3 = 0x3,
    D4 = 0x4,
    D5 = 0x5,
    D6 = 0x6,
    D7 = 0x7,
    D8 = 0x8,
    D9 = 0x9,
    A  = 0xA,
    B  = 0xB,
    C  = 0xC,
    D  = 0xD,
    E  = 0xE,
    F  = 0xF,
}

const KEYS: [Key; 16] = [
    Key::D0, Key::D1, Key::D2, Key::D3,
    Key::D4, Key::D5, Key::D6, Key::D7,
    Key::D8, Key::D9, Key::A,  Key::B,
    Key::C,  Key::D,  Key::E,  Key::F,
];

impl Key {
    /// Maps a value in `0x0..=0xF` to its key.
    pub fn from_digit(digit: u8) -> Option<Key> {
        KEYS.get(digit as usize).copied()
    }

    /// Maps a typed hex character to its key, `'a'`/`'A'` being `Key::A`.
    pub fn from_char(c: char) -> Option<Key> {
        c.to_digit(16).and_then(|d| Key::from_digit(d as u8))
    }

    pub fn digit(self) -> u8 {
        self as u8
    }
}

/// What a cycle did, from the driver's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// An instruction ran (or a pending key wait was resolved).
    Executed,
    /// A sprite was drawn; the frame should be presented before running more.
    Drew,
    /// The VM is blocked on a key press and did nothing.
    Waiting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error("illegal memory access at {addr:#05X}")]
    IllegalAddress { addr: u16 },
    #[error("return with an empty call stack")]
    IllegalReturn,
    #[error("call with a full call stack ({} entries)", STACK_SIZE)]
    StackFull,
    #[error("unknown opcode {opcode:#06X}")]
    UnknownOp { opcode: u16 },
}

/// Machine state dump handed to hosts when something goes wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    /// Return addresses, oldest first.
    pub stack: Vec<u16>,
    pub delay_timer: u8,
    pub sound_timer: u8,
    /// The instruction word at `pc`, if `pc` is a readable address.
    pub opcode: Option<u16>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.opcode {
            Some(op) => writeln!(f, "PC  {:#05X}  [{:#06X}]", self.pc, op)?,
            None => writeln!(f, "PC  {:#05X}  [--]", self.pc)?,
        }
        writeln!(f, "I   {:#05X}", self.i)?;
        for (row, regs) in self.v.chunks(4).enumerate() {
            for (col, val) in regs.iter().enumerate() {
                write!(f, "V{:X}  {:#04X}  ", row * 4 + col, val)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "DT  {}  ST  {}", self.delay_timer, self.sound_timer)?;
        write!(f, "SP  {}", self.stack.len())?;
        for addr in self.stack.iter().rev() {
            write!(f, "  {:#05X}", addr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_from_digit_maps_all_hex_digits() {
        for d in 0..16u8 {
            assert_eq!(Key::from_digit(d).map(Key::digit), Some(d));
        }
        assert_eq!(Key::from_digit(16), None);
    }

    #[test]
    fn key_from_char_accepts_both_cases() {
        assert_eq!(Key::from_char('0'), Some(Key::D0));
        assert_eq!(Key::from_char('9'), Some(Key::D9));
        assert_eq!(Key::from_char('a'), Some(Key::A));
        assert_eq!(Key::from_char('F'), Some(Key::F));
        assert_eq!(Key::from_char('g'), None);
        assert_eq!(Key::from_char(' '), None);
    }

    #[test]
    fn vm_error_messages() {
        let err = VmError::UnknownOp { opcode: 0x0123 };
        assert_eq!(err.to_string(), "unknown opcode 0x0123");
        let err = VmError::IllegalAddress { addr: 0xFFE };
        assert_eq!(err.to_string(), "illegal memory access at 0xFFE");
        assert_eq!(VmError::StackFull.to_string(), "call with a full call stack (96 entries)");
    }

    #[test]
    fn snapshot_display_lists_stack_newest_first() {
        let snap = Snapshot {
            v: [0; 16],
            i: 0x300,
            pc: 0x204,
            stack: vec![0x200, 0x250],
            delay_timer: 3,
            sound_timer: 0,
            opcode: Some(0x00EE),
        };
        let text = snap.to_string();
        assert!(text.starts_with("PC  0x204  [0x00EE]"));
        assert!(text.contains("I   0x300"));
        assert!(text.contains("VF  0x00"));
        assert!(text.ends_with("SP  2  0x250  0x200"));
    }
}
