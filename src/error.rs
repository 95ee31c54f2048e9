use std::io;
use thiserror::Error;

/// Conditions raised while the machine is executing. Everything except
/// `UnsupportedInstruction` halts the interpreter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Fault {
    #[error("memory access out of bounds: {len} byte(s) at {addr:#06x}")]
    OutOfBoundsAccess { addr: usize, len: usize },

    #[error("stack overflow: call at {pc:#06x} with a full call stack")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#06x} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("unsupported instruction {opcode:#06x} at {pc:#06x}")]
    UnsupportedInstruction { pc: u16, opcode: u16 },
}

impl Fault {
    /// soft faults may be skipped as no-ops, depending on configuration
    pub fn is_soft(&self) -> bool {
        matches!(self, Fault::UnsupportedInstruction { .. })
    }
}

/// Problems loading a program image
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read program image")]
    Io(#[from] io::Error),

    #[error("program image is too large ({size} bytes), max size is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error(transparent)]
    Memory(#[from] Fault),
}

/// Reasons the host run loop stops
#[derive(Debug, Error)]
pub enum RunError {
    #[error("host i/o failed")]
    Io(#[from] io::Error),

    #[error("machine halted")]
    Halted(#[from] Fault),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_faults() {
        assert!(Fault::UnsupportedInstruction { pc: 0x200, opcode: 0x8008 }.is_soft());
        assert!(!Fault::StackOverflow { pc: 0x200 }.is_soft());
        assert!(!Fault::StackUnderflow { pc: 0x200 }.is_soft());
        assert!(!Fault::OutOfBoundsAccess { addr: 0x1000, len: 1 }.is_soft());
    }

    #[test]
    fn test_fault_messages() {
        let f = Fault::OutOfBoundsAccess { addr: 0xfff, len: 2 };
        assert_eq!(
            f.to_string(),
            "memory access out of bounds: 2 byte(s) at 0x0fff"
        );
        let e = LoadError::TooLarge { size: 4000, max: 3584 };
        assert_eq!(
            e.to_string(),
            "program image is too large (4000 bytes), max size is 3584 bytes"
        );
    }
}
