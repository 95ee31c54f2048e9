use crate::memory::CHIP8_PROGRAM_ADDR;

/// index of the flag register, VF
pub const FLAG: usize = 0x0f;

/// The CHIP-8 register file. VF doubles as the flag register; its value is
/// only meaningful straight after the instruction that set it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chip8Cpu {
    pub v: [u8; 16],
    pub program_counter: u16,
    pub i: u16,
    /// current instruction register
    pub cir: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Chip8Cpu {
            v: [0; 16],
            program_counter: CHIP8_PROGRAM_ADDR,
            i: 0,
            cir: 0,
            delay_timer: 0,
            sound_timer: 0,
        }
    }

    /// skip the next instruction
    pub fn skip(&mut self) {
        self.program_counter = self.program_counter.wrapping_add(2);
    }

    /// set VX, then the flag; when X is VF the flag wins
    pub fn set_with_flag(&mut self, x: usize, value: u8, flag: bool) {
        self.v[x] = value;
        self.v[FLAG] = flag as u8;
    }

    /// count both timers down by `ticks`, stopping at zero
    pub fn tick_timers(&mut self, ticks: u32) {
        let t = ticks.min(u8::MAX as u32) as u8;
        self.delay_timer = self.delay_timer.saturating_sub(t);
        self.sound_timer = self.sound_timer.saturating_sub(t);
    }
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        Self::new()
    }
}
