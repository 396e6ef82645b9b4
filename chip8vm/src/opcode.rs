use std::fmt;

/// A 16-bit instruction word, split into the usual nibble fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode {
    bits: u16,
}

impl Opcode {
    pub fn new(bits: u16) -> Opcode {
        Opcode { bits }
    }

    /// Big-endian: `hi` is the byte at the lower address.
    pub fn from_bytes(hi: u8, lo: u8) -> Opcode {
        Opcode::new(u16::from_be_bytes([hi, lo]))
    }

    pub fn bits(self) -> u16 {
        self.bits
    }

    // The highest 4 bits, selecting the instruction family
    pub fn family(self) -> u8 {
        (self.bits >> 12) as u8
    }

    // A 12-bit value, the lowest 12 bits of the instruction
    pub fn addr(self) -> u16 {
        self.bits & 0x0FFF
    }

    // A 4-bit value, the lowest 4 bits of the instruction
    pub fn nibble(self) -> u8 {
        (self.bits & 0x000F) as u8
    }

    //  A 4-bit value, the lower 4 bits of the high byte of the instruction
    pub fn x(self) -> u8 {
        ((self.bits & 0x0F00) >> 8) as u8
    }

    // A 4-bit value, the upper 4 bits of the low byte of the instruction
    pub fn y(self) -> u8 {
        ((self.bits & 0x00F0) >> 4) as u8
    }

    // An 8-bit value, the lowest 8 bits of the instruction
    pub fn byte(self) -> u8 {
        (self.bits & 0x00FF) as u8
    }
}

/// Assembly-style mnemonic, used in fault reports.
impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (x, y, addr, byte, n) = (self.x(), self.y(), self.addr(), self.byte(), self.nibble());
        match (self.family(), n, byte) {
            (0x0, _, _) if self.bits == 0x00E0 => write!(f, "CLS"),
            (0x0, _, _) if self.bits == 0x00EE => write!(f, "RET"),
            (0x1, _, _) => write!(f, "JP {:#05X}", addr),
            (0x2, _, _) => write!(f, "CALL {:#05X}", addr),
            (0x3, _, _) => write!(f, "SE V{:X}, {:#04X}", x, byte),
            (0x4, _, _) => write!(f, "SNE V{:X}, {:#04X}", x, byte),
            (0x5, 0x0, _) => write!(f, "SE V{:X}, V{:X}", x, y),
            (0x6, _, _) => write!(f, "LD V{:X}, {:#04X}", x, byte),
            (0x7, _, _) => write!(f, "ADD V{:X}, {:#04X}", x, byte),
            (0x8, 0x0, _) => write!(f, "LD V{:X}, V{:X}", x, y),
            (0x8, 0x1, _) => write!(f, "OR V{:X}, V{:X}", x, y),
            (0x8, 0x2, _) => write!(f, "AND V{:X}, V{:X}", x, y),
            (0x8, 0x3, _) => write!(f, "XOR V{:X}, V{:X}", x, y),
            (0x8, 0x4, _) => write!(f, "ADD V{:X}, V{:X}", x, y),
            (0x8, 0x5, _) => write!(f, "SUB V{:X}, V{:X}", x, y),
            (0x8, 0x6, _) => write!(f, "SHR V{:X}, V{:X}", x, y),
            (0x8, 0x7, _) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            (0x8, 0xE, _) => write!(f, "SHL V{:X}, V{:X}", x, y),
            (0x9, 0x0, _) => write!(f, "SNE V{:X}, V{:X}", x, y),
            (0xA, _, _) => write!(f, "LD I, {:#05X}", addr),
            (0xB, _, _) => write!(f, "JP V0, {:#05X}", addr),
            (0xC, _, _) => write!(f, "RND V{:X}, {:#04X}", x, byte),
            (0xD, _, _) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            (0xE, _, 0x9E) => write!(f, "SKP V{:X}", x),
            (0xE, _, 0xA1) => write!(f, "SKNP V{:X}", x),
            (0xF, _, 0x07) => write!(f, "LD V{:X}, DT", x),
            (0xF, _, 0x0A) => write!(f, "LD V{:X}, K", x),
            (0xF, _, 0x15) => write!(f, "LD DT, V{:X}", x),
            (0xF, _, 0x18) => write!(f, "LD ST, V{:X}", x),
            (0xF, _, 0x1E) => write!(f, "ADD I, V{:X}", x),
            (0xF, _, 0x29) => write!(f, "LD F, V{:X}", x),
            (0xF, _, 0x33) => write!(f, "LD B, V{:X}", x),
            (0xF, _, 0x55) => write!(f, "LD [I], V{:X}", x),
            (0xF, _, 0x65) => write!(f, "LD V{:X}, [I]", x),
            _ => write!(f, "DW {:#06X}", self.bits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_is_big_endian() {
        let opcode = Opcode::from_bytes(0xF1, 0xE2);
        assert_eq!(opcode.bits(), 0xF1E2);
    }

    #[test]
    fn family_returns_highest_4_bits() {
        assert_eq!(Opcode::new(0xF1E2).family(), 0xF);
        assert_eq!(Opcode::new(0x00EE).family(), 0x0);
    }

    #[test]
    fn fields_split_the_word() {
        let opcode = Opcode::new(0xD1E2);
        assert_eq!(opcode.addr(), 0x01E2);
        assert_eq!(opcode.nibble(), 0x2);
        assert_eq!(opcode.x(), 0x1);
        assert_eq!(opcode.y(), 0xE);
        assert_eq!(opcode.byte(), 0xE2);
    }

    #[test]
    fn display_mnemonics() {
        assert_eq!(Opcode::new(0x00E0).to_string(), "CLS");
        assert_eq!(Opcode::new(0x2ABC).to_string(), "CALL 0xABC");
        assert_eq!(Opcode::new(0x8AB4).to_string(), "ADD VA, VB");
        assert_eq!(Opcode::new(0xD015).to_string(), "DRW V0, V1, 5");
        assert_eq!(Opcode::new(0xF355).to_string(), "LD [I], V3");
    }

    #[test]
    fn display_falls_back_to_raw_word() {
        assert_eq!(Opcode::new(0x0123).to_string(), "DW 0x0123");
        assert_eq!(Opcode::new(0x5AB1).to_string(), "DW 0x5AB1");
        assert_eq!(Opcode::new(0xE0FF).to_string(), "DW 0xE0FF");
    }
}
