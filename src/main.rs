use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use chip8vm::display::MonoTermDisplay;
use chip8vm::input::{Keymap, TermInput};
use chip8vm::memory::{CHIP8_SCREEN_HEIGHT, CHIP8_SCREEN_WIDTH};
use chip8vm::{Chip8Interpreter, Config, RunError};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KeymapArg {
    Conventional,
    Literal,
}

/// Run a CHIP-8 program in the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// program image, loaded at 0x200
    rom: PathBuf,

    /// cap execution speed; runs flat out when omitted
    #[arg(long)]
    ips: Option<u32>,

    /// halt on unsupported instructions instead of skipping them
    #[arg(long)]
    strict: bool,

    /// seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = KeymapArg::Conventional)]
    keymap: KeymapArg,

    /// how long a key stays down after the terminal last reported it
    #[arg(long, default_value_t = 500)]
    key_hold_ms: u64,

    /// hide the register and disassembly pane
    #[arg(long)]
    no_debug: bool,

    /// write logs here (filtered by RUST_LOG, default warn); without it
    /// nothing is logged, since the terminal is busy drawing the screen
    #[arg(long)]
    log: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            strict: self.strict,
            instructions_per_second: self.ips,
            seed: self.seed,
            debug_overlay: !self.no_debug,
            key_hold: Duration::from_millis(self.key_hold_ms),
            keymap: match self.keymap {
                KeymapArg::Conventional => Keymap::Conventional,
                KeymapArg::Literal => Keymap::Literal,
            },
            ..Config::default()
        }
    }
}

/// installs a subscriber writing to `log`; returns whether one was installed
fn setup_logger(log: Option<&PathBuf>) -> Result<bool> {
    // stderr shares the terminal with the display, so no file means no logs
    let Some(path) = log else {
        return Ok(false);
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let file = File::create(path)
        .with_context(|| format!("can't create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(true)
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.log.as_ref())?;
    let config = args.config();

    // load the program before touching the terminal, so errors stay readable
    let mut interpreter = Chip8Interpreter::new(&config);
    let mut rom = File::open(&args.rom)
        .with_context(|| format!("can't open {}", args.rom.display()))?;
    let max = interpreter.memory().max_program_size();
    interpreter
        .load_program(&mut rom)
        .with_context(|| {
            format!(
                "can't load {} (at most {} bytes fit)",
                args.rom.display(),
                max
            )
        })?;

    let outcome = {
        let mut display = MonoTermDisplay::new(CHIP8_SCREEN_WIDTH, CHIP8_SCREEN_HEIGHT)?;
        let mut input = TermInput::new(config.keymap, config.key_hold)?;
        interpreter.main_loop(&mut display, &mut input, &config)
        // display and input drop here, giving the terminal back
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(RunError::Halted(fault)) => {
            let cpu = interpreter.cpu();
            Err(fault).with_context(|| {
                format!(
                    "machine halted at pc={:03x} cir={:04x}",
                    cpu.program_counter, cpu.cir
                )
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_log_file_installs_nothing() {
        assert!(!setup_logger(None).unwrap());
    }

    #[test]
    fn test_key_hold_default() {
        let args = Args::parse_from(["chip8vm", "game.ch8"]);
        assert_eq!(args.config().key_hold, Duration::from_millis(500));
        let args = Args::parse_from(["chip8vm", "game.ch8", "--key-hold-ms", "80"]);
        assert_eq!(args.config().key_hold, Duration::from_millis(80));
    }
}
