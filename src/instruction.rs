// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! Chip-8 instructions and opcodes.
//!
//! This module provides the decoding half of the interpreter: the `Opcode`
//! type splits a raw 16-bit instruction word into its operand fields, and
//! `Instruction::from_opcode` selects the operation those fields name.  Any
//! word can be split into fields, but not every word names an operation;
//! those that don't are reported as an `UnimplementedOpcodeError` rather
//! than being quietly ignored, so that the driver can decide what to do with
//! them.

use std::fmt;
use std::ops::Add;

use failure::Error;
use num::FromPrimitive;

use ADDR_MASK;

/// An error resulting from an opcode which does not name any instruction.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "unimplemented opcode: {}", _0)]
pub struct UnimplementedOpcodeError(pub Opcode);

enum_from_primitive! {
/// A Chip-8 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    V0 = 0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
}

impl Register {
    /// Returns the register named by the lowest four bits of the given byte.
    pub fn from_nibble(n: u8) -> Register {
        Register::from_u8(n & 0xF).unwrap()
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", *self)
    }
}

/// A Chip-8 opcode.
///
/// Having this as a wrapper around an ordinary `u16` allows for some nice
/// helper methods to be implemented, which make decoding opcodes much easier.
/// None of the field accessors can fail: every 16-bit word has every field,
/// whether or not the field is meaningful for the instruction it encodes.
///
/// # Examples
///
/// ```
/// use chip8_core::Opcode;
///
/// let opcode = Opcode::from_bytes(0xD1, 0x25);
/// assert_eq!(opcode.class(), 0xD);
/// assert_eq!(opcode.x(), 0x1);
/// assert_eq!(opcode.y(), 0x2);
/// assert_eq!(opcode.n(), 0x5);
/// assert_eq!(opcode.nn(), 0x25);
/// assert_eq!(opcode.nnn(), 0x125);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Assembles an opcode from its two bytes, most significant first.
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Opcode((high as u16) << 8 | low as u16)
    }

    /// Returns the opcode class (the highest nibble).
    pub fn class(&self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// Returns the `x` field (bits 8-11).
    pub fn x(&self) -> u8 {
        (self.0 >> 8) as u8 & 0xF
    }

    /// Returns the `y` field (bits 4-7).
    pub fn y(&self) -> u8 {
        (self.0 >> 4) as u8 & 0xF
    }

    /// Returns the `n` field (bits 0-3).
    pub fn n(&self) -> u8 {
        self.0 as u8 & 0xF
    }

    /// Returns the `nn` field (bits 0-7).
    pub fn nn(&self) -> u8 {
        self.0 as u8
    }

    /// Returns the `nnn` field (bits 0-11).
    pub fn nnn(&self) -> u16 {
        self.0 & 0xFFF
    }

    /// Returns the `Vx` register corresponding to this opcode.
    fn vx(&self) -> Register {
        Register::from_nibble(self.x())
    }

    /// Returns the `Vy` register corresponding to this opcode.
    fn vy(&self) -> Register {
        Register::from_nibble(self.y())
    }

    /// Returns the `nnn` field as an address.
    fn addr(&self) -> Address {
        Address::new(self.nnn())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:04X}", self.0)
    }
}

/// An address pointing to a Chip-8 memory location.
///
/// Only the low 12 bits of an address are significant, so constructing an
/// `Address` masks off everything else, and adding to one wraps around the
/// end of memory.  This makes it impossible to index outside of memory using
/// an `Address`.
///
/// # Examples
///
/// ```
/// use chip8_core::Address;
///
/// let addr = Address::new(0x1204);
/// assert_eq!(addr.addr(), 0x204);
/// assert_eq!((Address::new(0xFFF) + 2).addr(), 0x001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Address(u16);

impl Address {
    /// Returns the address formed by the low 12 bits of the given value.
    pub fn new(addr: u16) -> Self {
        Address(addr & ADDR_MASK)
    }

    /// Returns the value of the address, suitable for indexing memory.
    pub fn addr(&self) -> usize {
        self.0 as usize
    }

    /// Returns the value of the address as a `u16`.
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl Add<usize> for Address {
    type Output = Self;

    fn add(self, rhs: usize) -> Self {
        Address::new((self.0 as usize).wrapping_add(rhs) as u16)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:03X}", self.0)
    }
}

/// A Chip-8 instruction.
///
/// Each variant corresponds to exactly one handler in the interpreter.
/// This type sits between opcodes and execution so that the interpreter
/// never has to pick fields out of raw words itself, and so that an opcode
/// which names no instruction is caught before anything is executed.
///
/// # Examples
///
/// Instructions can be created from opcodes:
///
/// ```
/// use chip8_core::{Instruction, Opcode, Register};
///
/// let instr = Instruction::from_opcode(Opcode(0x7510)).unwrap();
/// assert_eq!(instr, Instruction::AddByte(Register::V5, 0x10));
/// ```
///
/// Words which don't name an instruction are rejected:
///
/// ```
/// use chip8_core::{Instruction, Opcode};
///
/// assert!(Instruction::from_opcode(Opcode(0x800F)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `CLS` (`00E0`).
    Cls,
    /// `RET` (`00EE`).
    Ret,
    /// `SYS addr` (`0nnn`), executed as a plain jump.
    Sys(Address),
    /// `JP addr` (`1nnn`).
    Jp(Address),
    /// `CALL addr` (`2nnn`).
    Call(Address),
    /// `SE Vx, byte` (`3xkk`).
    SeByte(Register, u8),
    /// `SNE Vx, byte` (`4xkk`).
    SneByte(Register, u8),
    /// `SE Vx, Vy` (`5xy0`).
    SeReg(Register, Register),
    /// `LD Vx, byte` (`6xkk`).
    LdByte(Register, u8),
    /// `ADD Vx, byte` (`7xkk`).
    AddByte(Register, u8),
    /// `LD Vx, Vy` (`8xy0`).
    LdReg(Register, Register),
    /// `OR Vx, Vy` (`8xy1`).
    Or(Register, Register),
    /// `AND Vx, Vy` (`8xy2`).
    And(Register, Register),
    /// `XOR Vx, Vy` (`8xy3`).
    Xor(Register, Register),
    /// `ADD Vx, Vy` (`8xy4`).
    AddReg(Register, Register),
    /// `SUB Vx, Vy` (`8xy5`).
    Sub(Register, Register),
    /// `SHR Vx, Vy` (`8xy6`).
    Shr(Register, Register),
    /// `SUBN Vx, Vy` (`8xy7`).
    Subn(Register, Register),
    /// `SHL Vx, Vy` (`8xyE`).
    Shl(Register, Register),
    /// `SNE Vx, Vy` (`9xy0`).
    SneReg(Register, Register),
    /// `LD I, addr` (`Annn`).
    LdI(Address),
    /// `JP V0, addr` (`Bnnn`).
    JpV0(Address),
    /// `RND Vx, byte` (`Cxkk`).
    Rnd(Register, u8),
    /// `DRW Vx, Vy, nibble` (`Dxyn`).
    Drw(Register, Register, u8),
    /// `SKP Vx` (`Ex9E`).
    Skp(Register),
    /// `SKNP Vx` (`ExA1`).
    Sknp(Register),
    /// `LD Vx, DT` (`Fx07`).
    LdRegDt(Register),
    /// `LD Vx, K` (`Fx0A`).
    LdKey(Register),
    /// `LD DT, Vx` (`Fx15`).
    LdDtReg(Register),
    /// `LD ST, Vx` (`Fx18`).
    LdSt(Register),
    /// `ADD I, Vx` (`Fx1E`).
    AddI(Register),
    /// `LD F, Vx` (`Fx29`).
    LdF(Register),
    /// `LD B, Vx` (`Fx33`).
    LdB(Register),
    /// `LD [I], Vx` (`Fx55`).
    LdDerefIReg(Register),
    /// `LD Vx, [I]` (`Fx65`).
    LdRegDerefI(Register),
}

impl Instruction {
    /// Returns the instruction corresponding to the given opcode.
    ///
    /// Classes `0x5` and `0x9` ignore their lowest nibble.  Every word in
    /// class `0x0` other than `00E0` and `00EE` is a `SYS` instruction.
    pub fn from_opcode(opcode: Opcode) -> Result<Self, Error> {
        use self::Instruction::*;

        Ok(match opcode.class() {
            0x0 => match opcode.nnn() {
                0x0E0 => Cls,
                0x0EE => Ret,
                _ => Sys(opcode.addr()),
            },
            0x1 => Jp(opcode.addr()),
            0x2 => Call(opcode.addr()),
            0x3 => SeByte(opcode.vx(), opcode.nn()),
            0x4 => SneByte(opcode.vx(), opcode.nn()),
            0x5 => SeReg(opcode.vx(), opcode.vy()),
            0x6 => LdByte(opcode.vx(), opcode.nn()),
            0x7 => AddByte(opcode.vx(), opcode.nn()),
            0x8 => match opcode.n() {
                0x0 => LdReg(opcode.vx(), opcode.vy()),
                0x1 => Or(opcode.vx(), opcode.vy()),
                0x2 => And(opcode.vx(), opcode.vy()),
                0x3 => Xor(opcode.vx(), opcode.vy()),
                0x4 => AddReg(opcode.vx(), opcode.vy()),
                0x5 => Sub(opcode.vx(), opcode.vy()),
                0x6 => Shr(opcode.vx(), opcode.vy()),
                0x7 => Subn(opcode.vx(), opcode.vy()),
                0xE => Shl(opcode.vx(), opcode.vy()),
                _ => Err(UnimplementedOpcodeError(opcode))?,
            },
            0x9 => SneReg(opcode.vx(), opcode.vy()),
            0xA => LdI(opcode.addr()),
            0xB => JpV0(opcode.addr()),
            0xC => Rnd(opcode.vx(), opcode.nn()),
            0xD => Drw(opcode.vx(), opcode.vy(), opcode.n()),
            0xE => match opcode.nn() {
                0x9E => Skp(opcode.vx()),
                0xA1 => Sknp(opcode.vx()),
                _ => Err(UnimplementedOpcodeError(opcode))?,
            },
            0xF => match opcode.nn() {
                0x07 => LdRegDt(opcode.vx()),
                0x0A => LdKey(opcode.vx()),
                0x15 => LdDtReg(opcode.vx()),
                0x18 => LdSt(opcode.vx()),
                0x1E => AddI(opcode.vx()),
                0x29 => LdF(opcode.vx()),
                0x33 => LdB(opcode.vx()),
                0x55 => LdDerefIReg(opcode.vx()),
                0x65 => LdRegDerefI(opcode.vx()),
                _ => Err(UnimplementedOpcodeError(opcode))?,
            },
            _ => unreachable!("4-bit quantity didn't match 0-15"),
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Instruction::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Sys(addr) => write!(f, "SYS {}", addr),
            Jp(addr) => write!(f, "JP {}", addr),
            Call(addr) => write!(f, "CALL {}", addr),
            SeByte(reg, b) => write!(f, "SE {}, #{:02X}", reg, b),
            SneByte(reg, b) => write!(f, "SNE {}, #{:02X}", reg, b),
            SeReg(reg1, reg2) => write!(f, "SE {}, {}", reg1, reg2),
            LdByte(reg, b) => write!(f, "LD {}, #{:02X}", reg, b),
            AddByte(reg, b) => write!(f, "ADD {}, #{:02X}", reg, b),
            LdReg(reg1, reg2) => write!(f, "LD {}, {}", reg1, reg2),
            Or(reg1, reg2) => write!(f, "OR {}, {}", reg1, reg2),
            And(reg1, reg2) => write!(f, "AND {}, {}", reg1, reg2),
            Xor(reg1, reg2) => write!(f, "XOR {}, {}", reg1, reg2),
            AddReg(reg1, reg2) => write!(f, "ADD {}, {}", reg1, reg2),
            Sub(reg1, reg2) => write!(f, "SUB {}, {}", reg1, reg2),
            Shr(reg1, reg2) => write!(f, "SHR {}, {}", reg1, reg2),
            Subn(reg1, reg2) => write!(f, "SUBN {}, {}", reg1, reg2),
            Shl(reg1, reg2) => write!(f, "SHL {}, {}", reg1, reg2),
            SneReg(reg1, reg2) => write!(f, "SNE {}, {}", reg1, reg2),
            LdI(addr) => write!(f, "LD I, {}", addr),
            JpV0(addr) => write!(f, "JP V0, {}", addr),
            Rnd(reg, b) => write!(f, "RND {}, #{:02X}", reg, b),
            Drw(reg1, reg2, n) => write!(f, "DRW {}, {}, {}", reg1, reg2, n),
            Skp(reg) => write!(f, "SKP {}", reg),
            Sknp(reg) => write!(f, "SKNP {}", reg),
            LdRegDt(reg) => write!(f, "LD {}, DT", reg),
            LdKey(reg) => write!(f, "LD {}, K", reg),
            LdDtReg(reg) => write!(f, "LD DT, {}", reg),
            LdSt(reg) => write!(f, "LD ST, {}", reg),
            AddI(reg) => write!(f, "ADD I, {}", reg),
            LdF(reg) => write!(f, "LD F, {}", reg),
            LdB(reg) => write!(f, "LD B, {}", reg),
            LdDerefIReg(reg) => write!(f, "LD [I], {}", reg),
            LdRegDerefI(reg) => write!(f, "LD {}, [I]", reg),
        }
    }
}

#[cfg(test)]
mod tests {
    use instruction::{Address, Instruction, Opcode, UnimplementedOpcodeError};
    use Register::*;

    /// Tests that each field is taken from the right bits of the word.
    #[test]
    fn opcode_fields() {
        // Test cases, in the format (word, class, x, y, n, nn, nnn).
        let cases = [
            (0x0000u16, 0x0, 0x0, 0x0, 0x0, 0x00, 0x000),
            (0xFFFF, 0xF, 0xF, 0xF, 0xF, 0xFF, 0xFFF),
            (0x1234, 0x1, 0x2, 0x3, 0x4, 0x34, 0x234),
            (0xABCD, 0xA, 0xB, 0xC, 0xD, 0xCD, 0xBCD),
            (0x8E0E, 0x8, 0xE, 0x0, 0xE, 0x0E, 0xE0E),
        ];

        for &(word, class, x, y, n, nn, nnn) in cases.iter() {
            let opcode = Opcode(word);
            assert_eq!(opcode.class(), class, "case {:#06X}", word);
            assert_eq!(opcode.x(), x, "case {:#06X}", word);
            assert_eq!(opcode.y(), y, "case {:#06X}", word);
            assert_eq!(opcode.n(), n, "case {:#06X}", word);
            assert_eq!(opcode.nn(), nn, "case {:#06X}", word);
            assert_eq!(opcode.nnn(), nnn, "case {:#06X}", word);
        }
    }

    #[test]
    fn opcode_from_bytes_is_big_endian() {
        assert_eq!(Opcode::from_bytes(0x12, 0x34), Opcode(0x1234));
        assert_eq!(Opcode::from_bytes(0x00, 0xEE), Opcode(0x00EE));
    }

    /// Tests decoding of one opcode from every instruction family.
    #[test]
    fn decode_instructions() {
        use self::Instruction::*;

        let cases = [
            (0x00E0, Cls),
            (0x00EE, Ret),
            (0x0123, Sys(Address::new(0x123))),
            (0x1208, Jp(Address::new(0x208))),
            (0x2ABC, Call(Address::new(0xABC))),
            (0x3A42, SeByte(VA, 0x42)),
            (0x4B07, SneByte(VB, 0x07)),
            (0x5120, SeReg(V1, V2)),
            (0x6F11, LdByte(VF, 0x11)),
            (0x7510, AddByte(V5, 0x10)),
            (0x8120, LdReg(V1, V2)),
            (0x8121, Or(V1, V2)),
            (0x8122, And(V1, V2)),
            (0x8123, Xor(V1, V2)),
            (0x8124, AddReg(V1, V2)),
            (0x8125, Sub(V1, V2)),
            (0x8126, Shr(V1, V2)),
            (0x8127, Subn(V1, V2)),
            (0x812E, Shl(V1, V2)),
            (0x9340, SneReg(V3, V4)),
            (0xA050, LdI(Address::new(0x050))),
            (0xB300, JpV0(Address::new(0x300))),
            (0xC70F, Rnd(V7, 0x0F)),
            (0xD125, Drw(V1, V2, 5)),
            (0xE49E, Skp(V4)),
            (0xE4A1, Sknp(V4)),
            (0xF207, LdRegDt(V2)),
            (0xF20A, LdKey(V2)),
            (0xF215, LdDtReg(V2)),
            (0xF218, LdSt(V2)),
            (0xF21E, AddI(V2)),
            (0xF229, LdF(V2)),
            (0xF233, LdB(V2)),
            (0xF255, LdDerefIReg(V2)),
            (0xF265, LdRegDerefI(V2)),
        ];

        for &(word, ref expected) in cases.iter() {
            let decoded = Instruction::from_opcode(Opcode(word)).unwrap();
            assert_eq!(&decoded, expected, "case {:#06X}", word);
        }
    }

    /// Tests that words outside the instruction set are reported.
    #[test]
    fn decode_unimplemented() {
        let cases = [
            0x8008, 0x8009, 0x800A, 0x800B, 0x800C, 0x800D, 0x800F, 0xE000, 0xE19F, 0xF000,
            0xF1FF, 0xF130, 0xF175,
        ];

        for &word in cases.iter() {
            let err = Instruction::from_opcode(Opcode(word)).unwrap_err();
            assert_eq!(
                err.downcast_ref::<UnimplementedOpcodeError>(),
                Some(&UnimplementedOpcodeError(Opcode(word))),
                "case {:#06X}",
                word
            );
        }
    }

    #[test]
    fn address_wraps() {
        assert_eq!(Address::new(0xF123).addr(), 0x123);
        assert_eq!((Address::new(0xFFE) + 3).addr(), 0x001);
        assert_eq!((Address::new(0x200) + 0x10).addr(), 0x210);
    }

    #[test]
    fn display_mnemonics() {
        use self::Instruction::*;

        assert_eq!(Call(Address::new(0x208)).to_string(), "CALL #208");
        assert_eq!(Drw(V0, VA, 15).to_string(), "DRW V0, VA, 15");
        assert_eq!(LdByte(V3, 0x0C).to_string(), "LD V3, #0C");
        assert_eq!(LdRegDerefI(VE).to_string(), "LD VE, [I]");
        assert_eq!(
            UnimplementedOpcodeError(Opcode(0xF0FF)).to_string(),
            "unimplemented opcode: #F0FF"
        );
    }
}
