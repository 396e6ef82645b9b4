use std::io::{self, Read};

use chip8core::MAX_PROGRAM_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum RomError {
    #[error("ROM is {size} bytes, the largest that fits is {} bytes", MAX_PROGRAM_SIZE)]
    TooLarge { size: usize },
    #[error("could not read ROM: {0}")]
    Io(#[from] io::Error),
}

/// Reads a raw program image, rejecting anything that would not fit in
/// memory above the interpreter area.
pub fn read_rom<R: Read>(mut reader: R) -> Result<Vec<u8>, RomError> {
    let mut rom = Vec::new();
    reader.read_to_end(&mut rom)?;

    if rom.len() > MAX_PROGRAM_SIZE {
        return Err(RomError::TooLarge { size: rom.len() });
    }
    Ok(rom)
}
