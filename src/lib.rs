//! CHIP-8 virtual machine
//!
//! ## Design
//!
//! * the core (memory, cpu, instruction decoding and execution, timers) knows
//!   nothing about terminals; it takes a program image and key events and
//!   hands back a framebuffer plus readable machine state
//! * instructions run as fast as possible unless a speed cap is configured;
//!   the 60Hz timers follow the wall clock rather than the instruction count
//! * memory, call stack and framebuffer are separate bounded containers, and
//!   every address is checked before use. Bad accesses become a `Fault`
//!   instead of reading whatever happens to be next door
//! * display and input sit behind traits so alternatives can be plugged in;
//!   the stock ones draw with TUI in-console and read keys with crossterm
//!
//! Model
//!
//! main
//!  |-- config, display, input
//!  |-- interpreter(config)
//!  |    |-- memory: address space, call stack, framebuffer
//!  |    |-- cpu: registers, timers
//!  |    `-- load_program(rom)
//!  `-- interpreter.main_loop(display, input)
//!       |-- advance_timers(elapsed wallclock)
//!       |-- once per frame: poll input -> key_event(); draw framebuffer
//!       `-- step(): fetch word at PC, PC += 2, Op::decode, execute
//!            `-- FX0A parks the machine until a key goes down
pub mod config;
pub mod cpu;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod timer;

pub use config::Config;
pub use error::{Fault, LoadError, RunError};
pub use interpreter::{Chip8Interpreter, RunState};
