use crate::input::Keymap;
use std::time::Duration;

/// Runtime options shared by the interpreter and the host bridge
#[derive(Clone, Debug)]
pub struct Config {
    /// treat unsupported instructions as a fault instead of a no-op
    pub strict: bool,
    /// cap on execution speed; None runs as fast as possible
    pub instructions_per_second: Option<u32>,
    /// seed for CXNN; None seeds from the OS
    pub seed: Option<u64>,
    /// how often input is polled and the screen redrawn
    pub frame_rate: u32,
    /// draw registers and a disassembly next to the screen
    pub debug_overlay: bool,
    /// terminals only report presses, so a key counts as released once it
    /// has not repeated for this long
    pub key_hold: Duration,
    pub keymap: Keymap,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strict: false,
            instructions_per_second: None,
            seed: None,
            frame_rate: 60,
            debug_overlay: true,
            key_hold: Duration::from_millis(500),
            keymap: Keymap::Conventional,
        }
    }
}

impl Config {
    /// time between redraws
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }

    /// time between instructions when a speed cap is set
    pub fn instruction_period(&self) -> Option<Duration> {
        self.instructions_per_second
            .filter(|ips| *ips > 0)
            .map(|ips| Duration::from_secs(1) / ips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert!(!c.strict);
        assert_eq!(c.instruction_period(), None);
        assert_eq!(c.frame_period(), Duration::from_nanos(16_666_666));
        assert_eq!(c.key_hold, Duration::from_millis(500));
    }

    #[test]
    fn test_instruction_period() {
        let c = Config {
            instructions_per_second: Some(500),
            ..Config::default()
        };
        assert_eq!(c.instruction_period(), Some(Duration::from_millis(2)));
        let c = Config {
            instructions_per_second: Some(0),
            ..Config::default()
        };
        assert_eq!(c.instruction_period(), None);
    }
}
