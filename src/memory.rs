use crate::error::{Fault, LoadError};
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the byte-addressable address space. Every access is bounds
/// checked; nothing here reads past the end of memory.
pub trait MemoryMap {
    /// write unknown len of data into memory at a particular address
    fn write_any(&mut self, reader: &mut impl io::Read, addr: u16) -> Result<usize, LoadError> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        let max = self.size().saturating_sub(addr as usize);
        if len > max {
            return Err(LoadError::TooLarge { size: len, max });
        }
        self.write(&buf, addr)?;
        Ok(len)
    }

    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), Fault> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// get a big-endian two-byte word (instruction fetch)
    fn get_word(&self, addr: u16) -> Result<u16, Fault> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    /// store a big-endian two-byte word
    #[cfg(test)]
    fn set_word(&mut self, addr: u16, word: u16) -> Result<(), Fault> {
        self.write(&word.to_be_bytes(), addr)
    }

    /// addressable size in bytes
    fn size(&self) -> usize;

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Fault>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault>;
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// how many return addresses fit on the call stack
pub const CHIP8_STACK_DEPTH: usize = 12;

pub const CHIP8_SCREEN_WIDTH: usize = 64;
pub const CHIP8_SCREEN_HEIGHT: usize = 32;

/// font glyphs live at the very bottom of RAM, five bytes apiece
pub const CHIP8_FONT_ADDR: u16 = 0x000;
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

/// Defines the CHIP-8 memory layout:
///   0x0000-0x004f  font glyphs
///   0x0050-0x01ff  unused (interpreter area on the original hardware)
///   0x0200-0x0fff  program and data
///
/// The call stack and the display are kept outside the address space, so a
/// program can never scribble over either of them.
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    pub stack: CallStack,
    pub screen: Framebuffer,
    pub program_addr: u16,
}

impl MemoryMap for Chip8MemoryMap {
    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Fault> {
        let a = addr as usize;
        self.bytes
            .get_mut(a..a + len)
            .ok_or(Fault::OutOfBoundsAccess { addr: a, len })
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault> {
        let a = addr as usize;
        self.bytes
            .get(a..a + len)
            .ok_or(Fault::OutOfBoundsAccess { addr: a, len })
    }
}

impl Chip8MemoryMap {
    /// initialises memory with the font baked in and everything else zeroed
    pub fn new() -> Self {
        let mut bytes = vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice();
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8MemoryMap {
            bytes,
            stack: CallStack::new(),
            screen: Framebuffer::new(),
            program_addr: CHIP8_PROGRAM_ADDR,
        }
    }

    /// load a CHIP-8 program at 0x200, returning its length
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, LoadError> {
        self.write_any(reader, self.program_addr)
    }

    /// the largest program image that fits
    pub fn max_program_size(&self) -> usize {
        self.size() - self.program_addr as usize
    }

    /// address of the glyph for a hex digit; only the low nibble counts
    pub fn glyph_addr(digit: u8) -> u16 {
        CHIP8_FONT_ADDR + (digit & 0x0f) as u16 * CHIP8_FONT_GLYPH_BYTES
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded stack of return addresses
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    entries: [u16; CHIP8_STACK_DEPTH],
    depth: usize,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            entries: [0; CHIP8_STACK_DEPTH],
            depth: 0,
        }
    }

    /// push a return address; `pc` is only used for the fault report
    pub fn push(&mut self, addr: u16, pc: u16) -> Result<(), Fault> {
        let slot = self
            .entries
            .get_mut(self.depth)
            .ok_or(Fault::StackOverflow { pc })?;
        *slot = addr;
        self.depth += 1;
        Ok(())
    }

    pub fn pop(&mut self, pc: u16) -> Result<u16, Fault> {
        if self.depth == 0 {
            return Err(Fault::StackUnderflow { pc });
        }
        self.depth -= 1;
        Ok(self.entries[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// live entries, oldest first
    pub fn as_slice(&self) -> &[u16] {
        &self.entries[..self.depth]
    }
}

/// One byte per pixel, each 0 or 1, row-major
pub struct Framebuffer {
    pixels: Box<[u8]>,
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: vec![0u8; CHIP8_SCREEN_WIDTH * CHIP8_SCREEN_HEIGHT].into_boxed_slice(),
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * CHIP8_SCREEN_WIDTH + x]
    }

    /// XOR an 8-pixel-wide sprite onto the screen with its top-left corner at
    /// (x mod width, y mod height). Anything past the right or bottom edge is
    /// clipped. Returns true if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let x0 = x as usize % CHIP8_SCREEN_WIDTH;
        let y0 = y as usize % CHIP8_SCREEN_HEIGHT;
        let mut collision = false;
        for (dy, row) in rows.iter().enumerate() {
            let py = y0 + dy;
            if py >= CHIP8_SCREEN_HEIGHT {
                break;
            }
            for bit in 0..8 {
                let px = x0 + bit;
                if px >= CHIP8_SCREEN_WIDTH {
                    break;
                }
                let sprite_pixel = (row >> (7 - bit)) & 1;
                let cell = &mut self.pixels[py * CHIP8_SCREEN_WIDTH + px];
                collision |= *cell & sprite_pixel == 1;
                *cell ^= sprite_pixel;
            }
        }
        collision
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

pub const CHIP8_FONT: [u8; 80] = [
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
