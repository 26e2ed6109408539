use crate::error::MachineError;
use log::{debug, warn};

// NB. addresses are u16 as per the chip-8 and get masked to 12 bits on the
//     way in; lengths are usize to stop endless casting

/// how much RAM we have
pub const MEMORY_SIZE: usize = 4096;

/// where programs are loaded; everything below is reserved for the font
pub const PROGRAM_ADDR: u16 = 0x0200;

/// the biggest ROM that fits between the program address and the top of RAM
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_ADDR as usize;

const ADDRESS_MASK: u16 = 0x0fff;

/// Represents an addressable memory map. Reads never fail: addresses wrap
/// around the 12-bit address space.
pub trait MemoryMap {
    /// get a r/o view of the whole address space
    fn get_ro_slice(&self) -> &[u8];

    /// store a byte coming from an executing instruction; returns false
    /// when the map refused the write
    fn store(&mut self, addr: u16, value: u8) -> bool;

    fn fetch(&self, addr: u16) -> u8 {
        self.get_ro_slice()[(addr & ADDRESS_MASK) as usize]
    }

    /// get a big-endian two-byte word (instructions)
    fn get_word(&self, addr: u16) -> u16 {
        ((self.fetch(addr) as u16) << 8) | self.fetch(addr.wrapping_add(1)) as u16
    }
}

/// Defines the CHIP-8 memory map:
///   0x0000-0x004f  font glyphs, 5 bytes each for 0-F
///   0x0050-0x01ff  reserved
///   0x0200-0x0fff  program
///
/// executing programs can't write into the reserved area; only `reset`
/// touches it
pub struct Chip8MemoryMap {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_ro_slice(&self) -> &[u8] {
        &self.bytes[..]
    }

    fn store(&mut self, addr: u16, value: u8) -> bool {
        let a = addr & ADDRESS_MASK;
        if a < PROGRAM_ADDR {
            warn!(
                "dropped write of 0x{:02X} to reserved address 0x{:03X}",
                value, a
            );
            return false;
        }
        self.bytes[a as usize] = value;
        true
    }
}

impl Chip8MemoryMap {
    /// zeroed memory with the font baked in
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: Box::new([0u8; MEMORY_SIZE]),
        };
        mm.reset();
        mm
    }

    /// zero everything and re-seed the font
    pub fn reset(&mut self) {
        self.bytes.fill(0);
        let font = FONT_ADDR as usize;
        self.bytes[font..font + FONT.len()].copy_from_slice(&FONT);
    }

    /// load a CHIP-8 program at 0x200, leaving the rest of memory alone
    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), MachineError> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(MachineError::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }
        let start = PROGRAM_ADDR as usize;
        self.bytes[start..start + rom.len()].copy_from_slice(rom);
        debug!("loaded {} program bytes at 0x{:03X}", rom.len(), start);
        Ok(())
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// glyph n lives at FONT_ADDR + 5 * n, which is what LD F relies on
pub const FONT_ADDR: u16 = 0x000;
pub const FONT_GLYPH_BYTES: u16 = 5;
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
