//! # interpreter
//!
//! The fetch/decode/execute engine. The interpreter is a small state machine:
//!
//!  * `Running`      -- every step fetches the word at PC, moves PC on by 2,
//!                      decodes and executes it
//!  * `AwaitingKey`  -- FX0A was executed; steps do nothing until a key-down
//!                      event arrives, which lands in VX and resumes execution
//!  * `Faulted`      -- a hard fault stopped the machine; every later step
//!                      reports the same fault
//!
//! Timers are driven by wall-clock time handed in from outside, not by the
//! instruction count, so they tick at 60Hz however fast the CPU goes.
use crate::config::Config;
use crate::cpu::{Chip8Cpu, FLAG};
use crate::display::{Display, Overlay};
use crate::error::{Fault, LoadError, RunError};
use crate::input::{Input, InputEvent, KeyEvent};
use crate::instruction::Op;
use crate::memory::{Chip8MemoryMap, MemoryMap};
use crate::timer::TimerClock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// how many instructions either side of PC the debug overlay lists
const OVERLAY_LISTING_RADIUS: usize = 7;

/// What happened to a single instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// FX0A: stop until a key is pressed, then put it in this register
    AwaitKey(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    AwaitingKey(usize),
    Faulted(Fault),
}

/// Apply one decoded instruction. PC must already point past it. `keys` is
/// the held-key bitmask, bit n for key n.
pub fn execute(
    op: Op,
    cpu: &mut Chip8Cpu,
    memory: &mut Chip8MemoryMap,
    keys: u16,
    rng: &mut impl Rng,
) -> Result<Outcome, Fault> {
    let pc = cpu.program_counter.wrapping_sub(2);
    match op {
        Op::Cls => memory.screen.clear(),
        Op::Ret => cpu.program_counter = memory.stack.pop(pc)?,
        Op::Sys(_) => {}
        Op::Jump(addr) => cpu.program_counter = addr,
        Op::Call(addr) => {
            memory.stack.push(cpu.program_counter, pc)?;
            cpu.program_counter = addr;
        }
        Op::SkipEqImm(x, nn) => {
            if cpu.v[x] == nn {
                cpu.skip()
            }
        }
        Op::SkipNeImm(x, nn) => {
            if cpu.v[x] != nn {
                cpu.skip()
            }
        }
        Op::SkipEqReg(x, y) => {
            if cpu.v[x] == cpu.v[y] {
                cpu.skip()
            }
        }
        Op::SkipNeReg(x, y) => {
            if cpu.v[x] != cpu.v[y] {
                cpu.skip()
            }
        }
        Op::LoadImm(x, nn) => cpu.v[x] = nn,
        Op::AddImm(x, nn) => cpu.v[x] = cpu.v[x].wrapping_add(nn),
        Op::Copy(x, y) => cpu.v[x] = cpu.v[y],
        Op::Or(x, y) => cpu.v[x] |= cpu.v[y],
        Op::And(x, y) => cpu.v[x] &= cpu.v[y],
        Op::Xor(x, y) => cpu.v[x] ^= cpu.v[y],
        Op::AddCarry(x, y) => {
            let (sum, carry) = cpu.v[x].overflowing_add(cpu.v[y]);
            cpu.set_with_flag(x, sum, carry);
        }
        Op::SubBorrow(x, y) => {
            let (a, b) = (cpu.v[x], cpu.v[y]);
            cpu.set_with_flag(x, a.wrapping_sub(b), a >= b);
        }
        Op::ShiftRight(x) => {
            let a = cpu.v[x];
            cpu.set_with_flag(x, a >> 1, a & 0x01 != 0);
        }
        Op::SubReverse(x, y) => {
            let (a, b) = (cpu.v[x], cpu.v[y]);
            cpu.set_with_flag(x, b.wrapping_sub(a), b >= a);
        }
        Op::ShiftLeft(x) => {
            let a = cpu.v[x];
            cpu.set_with_flag(x, a << 1, a & 0x80 != 0);
        }
        Op::LoadI(addr) => cpu.i = addr,
        Op::JumpV0(addr) => cpu.program_counter = addr + cpu.v[0] as u16,
        Op::Random(x, nn) => cpu.v[x] = rng.gen::<u8>() & nn,
        Op::Draw(x, y, n) => {
            let n = n as usize;
            let mut sprite = [0u8; 15];
            sprite[..n].copy_from_slice(memory.get_ro_slice(cpu.i, n)?);
            let collision = memory.screen.draw_sprite(cpu.v[x], cpu.v[y], &sprite[..n]);
            cpu.v[FLAG] = collision as u8;
        }
        Op::SkipKeyDown(x) => {
            if keys & (1 << (cpu.v[x] & 0x0f)) != 0 {
                cpu.skip()
            }
        }
        Op::SkipKeyUp(x) => {
            if keys & (1 << (cpu.v[x] & 0x0f)) == 0 {
                cpu.skip()
            }
        }
        Op::GetDelay(x) => cpu.v[x] = cpu.delay_timer,
        Op::WaitKey(x) => return Ok(Outcome::AwaitKey(x)),
        Op::SetDelay(x) => cpu.delay_timer = cpu.v[x],
        Op::SetSound(x) => cpu.sound_timer = cpu.v[x],
        Op::AddI(x) => cpu.i = cpu.i.wrapping_add(cpu.v[x] as u16),
        Op::Glyph(x) => cpu.i = Chip8MemoryMap::glyph_addr(cpu.v[x]),
        Op::Bcd(x) => {
            let v = cpu.v[x];
            memory.write(&[v / 100, v / 10 % 10, v % 10], cpu.i)?;
        }
        Op::Store(x) => memory.write(&cpu.v[..=x], cpu.i)?,
        Op::Load(x) => {
            let src = memory.get_ro_slice(cpu.i, x + 1)?;
            cpu.v[..=x].copy_from_slice(src);
        }
        Op::Unknown(opcode) => return Err(Fault::UnsupportedInstruction { pc, opcode }),
    }
    Ok(Outcome::Completed)
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    cpu: Chip8Cpu,
    keys: u16,
    state: RunState,
    clock: TimerClock,
    rng: StdRng,
    strict: bool,
}

impl Chip8Interpreter {
    pub fn new(config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Chip8Interpreter {
            memory: Chip8MemoryMap::new(),
            cpu: Chip8Cpu::new(),
            keys: 0,
            state: RunState::Running,
            clock: TimerClock::new(),
            rng,
            strict: config.strict,
        }
    }

    /// a fresh machine with `program` loaded at 0x200
    pub fn with_program(program: &[u8], config: &Config) -> Result<Self, LoadError> {
        let mut i = Chip8Interpreter::new(config);
        i.load_program(&mut &program[..])?;
        Ok(i)
    }

    /// load a chip8 program, returning its size
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, LoadError> {
        let len = self.memory.load_program(reader)?;
        info!(bytes = len, "program loaded");
        Ok(len)
    }

    /// run one instruction, unless suspended or halted
    pub fn step(&mut self) -> Result<(), Fault> {
        match &self.state {
            RunState::Running => {}
            RunState::AwaitingKey(_) => return Ok(()),
            RunState::Faulted(fault) => return Err(fault.clone()),
        }
        match self.fetch_execute() {
            Ok(Outcome::Completed) => Ok(()),
            Ok(Outcome::AwaitKey(x)) => {
                debug!(register = x, "waiting for key");
                self.state = RunState::AwaitingKey(x);
                Ok(())
            }
            Err(fault) if fault.is_soft() && !self.strict => {
                debug!(%fault, "treating as no-op");
                Ok(())
            }
            Err(fault) => {
                error!(%fault, "machine halted");
                self.state = RunState::Faulted(fault.clone());
                Err(fault)
            }
        }
    }

    fn fetch_execute(&mut self) -> Result<Outcome, Fault> {
        let pc = self.cpu.program_counter;
        let word = self.memory.get_word(pc)?;
        self.cpu.cir = word;
        self.cpu.program_counter = pc.wrapping_add(2);
        execute(
            Op::decode(word),
            &mut self.cpu,
            &mut self.memory,
            self.keys,
            &mut self.rng,
        )
    }

    /// a key went down or up
    pub fn key_event(&mut self, event: KeyEvent) {
        match event {
            KeyEvent::Down(key) if key <= 0x0f => {
                // a key that is already held does not end a wait
                let fresh = self.keys & (1 << key) == 0;
                self.keys |= 1 << key;
                if !fresh {
                    return;
                }
                if let RunState::AwaitingKey(x) = self.state {
                    debug!(key, register = x, "key wait satisfied");
                    self.cpu.v[x] = key;
                    self.state = RunState::Running;
                }
            }
            KeyEvent::Up(key) if key <= 0x0f => self.keys &= !(1 << key),
            _ => warn!(?event, "ignoring key outside 0-f"),
        }
    }

    /// feed in elapsed wall-clock time; timers drop by one per 1/60s
    pub fn advance_timers(&mut self, elapsed: Duration) {
        let ticks = self.clock.advance(elapsed);
        if ticks > 0 {
            self.cpu.tick_timers(ticks);
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn cpu(&self) -> &Chip8Cpu {
        &self.cpu
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    /// 64x32 pixels, one byte each
    pub fn framebuffer(&self) -> &[u8] {
        self.memory.screen.pixels()
    }

    /// return addresses, oldest first
    pub fn stack(&self) -> &[u16] {
        self.memory.stack.as_slice()
    }

    /// held keys, bit n for key n
    pub fn keys(&self) -> u16 {
        self.keys
    }

    /// decode whatever sits at `addr`, if it is in memory
    pub fn disassemble(&self, addr: u16) -> Option<(u16, Op)> {
        self.memory
            .get_word(addr)
            .ok()
            .map(|word| (word, Op::decode(word)))
    }

    /// Run until the host asks to quit or the machine faults. Instructions go
    /// as fast as they can (or at the configured cap); input and the display
    /// are serviced once per frame, including while waiting on a key.
    pub fn main_loop(
        &mut self,
        display: &mut dyn Display,
        input: &mut dyn Input,
        config: &Config,
    ) -> Result<(), RunError> {
        let frame = config.frame_period();
        let pace = config.instruction_period();
        let mut last = Instant::now();
        let mut next_frame = last;
        let mut next_instruction = last;
        let mut executed: u64 = 0;
        info!(?frame, ?pace, "entering main loop");

        loop {
            let now = Instant::now();
            self.advance_timers(now.duration_since(last));
            last = now;

            if now >= next_frame {
                for event in input.poll()? {
                    match event {
                        InputEvent::Key(key) => self.key_event(key),
                        InputEvent::Quit => {
                            info!(executed, "quit requested");
                            return Ok(());
                        }
                    }
                }
                self.present(display, config)?;
                next_frame = now + frame;
            }

            if let RunState::AwaitingKey(_) = self.state {
                spin_sleep::sleep(Duration::from_millis(1));
                continue;
            }

            if let Some(period) = pace {
                let now = Instant::now();
                if next_instruction > now {
                    spin_sleep::sleep(next_instruction - now);
                }
                next_instruction = next_instruction.max(now) + period;
            }

            if let Err(fault) = self.step() {
                self.present(display, config)?;
                return Err(fault.into());
            }
            executed += 1;
        }
    }

    fn present(&self, display: &mut dyn Display, config: &Config) -> Result<(), io::Error> {
        let overlay = config
            .debug_overlay
            .then(|| Overlay::capture(self, OVERLAY_LISTING_RADIUS));
        display.draw(self.framebuffer(), overlay.as_ref())
    }
}
