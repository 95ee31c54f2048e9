//! # instruction set
//!
//! Every CHIP-8 instruction is one big-endian 16-bit word:
//!
//! | field | bits  | use                                 |
//! |-------|-------|-------------------------------------|
//! | class | 12-15 | instruction family, 0x0-0xf         |
//! | x     | 8-11  | register index                      |
//! | y     | 4-7   | register index                      |
//! | n     | 0-3   | sub-opcode, or sprite height        |
//! | nn    | 0-7   | byte literal / sub-opcode           |
//! | nnn   | 0-11  | address                             |
use std::fmt;

/// a decoded instruction; register fields are already usize so they index
/// straight into the register file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 0NNN, machine code routine on the original hardware; ignored
    Sys(u16),
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipEqImm(usize, u8),
    /// 4XNN
    SkipNeImm(usize, u8),
    /// 5XY0
    SkipEqReg(usize, usize),
    /// 6XNN
    LoadImm(usize, u8),
    /// 7XNN
    AddImm(usize, u8),
    /// 8XY0
    Copy(usize, usize),
    /// 8XY1
    Or(usize, usize),
    /// 8XY2
    And(usize, usize),
    /// 8XY3
    Xor(usize, usize),
    /// 8XY4
    AddCarry(usize, usize),
    /// 8XY5
    SubBorrow(usize, usize),
    /// 8XY6
    ShiftRight(usize),
    /// 8XY7
    SubReverse(usize, usize),
    /// 8XYE
    ShiftLeft(usize),
    /// 9XY0
    SkipNeReg(usize, usize),
    /// ANNN
    LoadI(u16),
    /// BNNN
    JumpV0(u16),
    /// CXNN
    Random(usize, u8),
    /// DXYN
    Draw(usize, usize, u8),
    /// EX9E
    SkipKeyDown(usize),
    /// EXA1
    SkipKeyUp(usize),
    /// FX07
    GetDelay(usize),
    /// FX0A
    WaitKey(usize),
    /// FX15
    SetDelay(usize),
    /// FX18
    SetSound(usize),
    /// FX1E
    AddI(usize),
    /// FX29
    Glyph(usize),
    /// FX33
    Bcd(usize),
    /// FX55
    Store(usize),
    /// FX65
    Load(usize),
    /// anything else
    Unknown(u16),
}

impl Op {
    pub fn decode(word: u16) -> Op {
        let class = word >> 12;
        let nnn = word & 0x0fff;
        let nn = (word & 0x00ff) as u8;
        let x = ((word & 0x0f00) >> 8) as usize;
        let y = ((word & 0x00f0) >> 4) as usize;
        let n = (word & 0x000f) as u8;

        match class {
            0x0 => match nnn {
                0x0e0 => Op::Cls,
                0x0ee => Op::Ret,
                _ => Op::Sys(nnn),
            },
            0x1 => Op::Jump(nnn),
            0x2 => Op::Call(nnn),
            0x3 => Op::SkipEqImm(x, nn),
            0x4 => Op::SkipNeImm(x, nn),
            0x5 => Op::SkipEqReg(x, y),
            0x6 => Op::LoadImm(x, nn),
            0x7 => Op::AddImm(x, nn),
            0x8 => match n {
                0x0 => Op::Copy(x, y),
                0x1 => Op::Or(x, y),
                0x2 => Op::And(x, y),
                0x3 => Op::Xor(x, y),
                0x4 => Op::AddCarry(x, y),
                0x5 => Op::SubBorrow(x, y),
                0x6 => Op::ShiftRight(x),
                0x7 => Op::SubReverse(x, y),
                0xe => Op::ShiftLeft(x),
                _ => Op::Unknown(word),
            },
            0x9 => Op::SkipNeReg(x, y),
            0xa => Op::LoadI(nnn),
            0xb => Op::JumpV0(nnn),
            0xc => Op::Random(x, nn),
            0xd => Op::Draw(x, y, n),
            0xe => match nn {
                0x9e => Op::SkipKeyDown(x),
                0xa1 => Op::SkipKeyUp(x),
                _ => Op::Unknown(word),
            },
            _ => match nn {
                0x07 => Op::GetDelay(x),
                0x0a => Op::WaitKey(x),
                0x15 => Op::SetDelay(x),
                0x18 => Op::SetSound(x),
                0x1e => Op::AddI(x),
                0x29 => Op::Glyph(x),
                0x33 => Op::Bcd(x),
                0x55 => Op::Store(x),
                0x65 => Op::Load(x),
                _ => Op::Unknown(word),
            },
        }
    }
}

/// assembler-style mnemonics, for debug views
impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Op::Cls => write!(f, "cls"),
            Op::Ret => write!(f, "ret"),
            Op::Sys(a) => write!(f, "sys {:#05x}", a),
            Op::Jump(a) => write!(f, "jp {:#05x}", a),
            Op::Call(a) => write!(f, "call {:#05x}", a),
            Op::SkipEqImm(x, nn) => write!(f, "se v{:x}, {:#04x}", x, nn),
            Op::SkipNeImm(x, nn) => write!(f, "sne v{:x}, {:#04x}", x, nn),
            Op::SkipEqReg(x, y) => write!(f, "se v{:x}, v{:x}", x, y),
            Op::LoadImm(x, nn) => write!(f, "ld v{:x}, {:#04x}", x, nn),
            Op::AddImm(x, nn) => write!(f, "add v{:x}, {:#04x}", x, nn),
            Op::Copy(x, y) => write!(f, "ld v{:x}, v{:x}", x, y),
            Op::Or(x, y) => write!(f, "or v{:x}, v{:x}", x, y),
            Op::And(x, y) => write!(f, "and v{:x}, v{:x}", x, y),
            Op::Xor(x, y) => write!(f, "xor v{:x}, v{:x}", x, y),
            Op::AddCarry(x, y) => write!(f, "add v{:x}, v{:x}", x, y),
            Op::SubBorrow(x, y) => write!(f, "sub v{:x}, v{:x}", x, y),
            Op::ShiftRight(x) => write!(f, "shr v{:x}", x),
            Op::SubReverse(x, y) => write!(f, "subn v{:x}, v{:x}", x, y),
            Op::ShiftLeft(x) => write!(f, "shl v{:x}", x),
            Op::SkipNeReg(x, y) => write!(f, "sne v{:x}, v{:x}", x, y),
            Op::LoadI(a) => write!(f, "ld i, {:#05x}", a),
            Op::JumpV0(a) => write!(f, "jp v0, {:#05x}", a),
            Op::Random(x, nn) => write!(f, "rnd v{:x}, {:#04x}", x, nn),
            Op::Draw(x, y, n) => write!(f, "drw v{:x}, v{:x}, {}", x, y, n),
            Op::SkipKeyDown(x) => write!(f, "skp v{:x}", x),
            Op::SkipKeyUp(x) => write!(f, "sknp v{:x}", x),
            Op::GetDelay(x) => write!(f, "ld v{:x}, dt", x),
            Op::WaitKey(x) => write!(f, "ld v{:x}, k", x),
            Op::SetDelay(x) => write!(f, "ld dt, v{:x}", x),
            Op::SetSound(x) => write!(f, "ld st, v{:x}", x),
            Op::AddI(x) => write!(f, "add i, v{:x}", x),
            Op::Glyph(x) => write!(f, "ld f, v{:x}", x),
            Op::Bcd(x) => write!(f, "ld b, v{:x}", x),
            Op::Store(x) => write!(f, "ld [i], v{:x}", x),
            Op::Load(x) => write!(f, "ld v{:x}, [i]", x),
            Op::Unknown(w) => write!(f, "db {:#06x}", w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fields() {
        assert_eq!(Op::decode(0x00e0), Op::Cls);
        assert_eq!(Op::decode(0x00ee), Op::Ret);
        assert_eq!(Op::decode(0x0123), Op::Sys(0x123));
        assert_eq!(Op::decode(0x1abc), Op::Jump(0xabc));
        assert_eq!(Op::decode(0x2abc), Op::Call(0xabc));
        assert_eq!(Op::decode(0x3a42), Op::SkipEqImm(0xa, 0x42));
        assert_eq!(Op::decode(0x8ab4), Op::AddCarry(0xa, 0xb));
        assert_eq!(Op::decode(0x8abe), Op::ShiftLeft(0xa));
        assert_eq!(Op::decode(0xd125), Op::Draw(1, 2, 5));
        assert_eq!(Op::decode(0xe39e), Op::SkipKeyDown(3));
        assert_eq!(Op::decode(0xf40a), Op::WaitKey(4));
        assert_eq!(Op::decode(0xff65), Op::Load(0xf));
    }

    #[test]
    fn test_decode_unknown_sub_opcodes() {
        assert_eq!(Op::decode(0x8008), Op::Unknown(0x8008));
        assert_eq!(Op::decode(0xe0ff), Op::Unknown(0xe0ff));
        assert_eq!(Op::decode(0xf0ff), Op::Unknown(0xf0ff));
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Op::decode(0x6005).to_string(), "ld v0, 0x05");
        assert_eq!(Op::decode(0x8014).to_string(), "add v0, v1");
        assert_eq!(Op::decode(0xa2f0).to_string(), "ld i, 0x2f0");
        assert_eq!(Op::decode(0xd01f).to_string(), "drw v0, v1, 15");
        assert_eq!(Op::decode(0xf0ff).to_string(), "db 0xf0ff");
    }
}
