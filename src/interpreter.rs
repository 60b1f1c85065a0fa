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

//! The Chip-8 interpreter.
//!
//! The main focus of this module is the `Interpreter` struct, which contains
//! the state of a Chip-8 machine and knows how to apply a single instruction
//! to it.  It never advances the program counter past an instruction on its
//! own: `execute` instead returns a `Flow` telling the driver whether the
//! instruction already moved the program counter (jumps, calls and returns)
//! or whether the usual advance of 2 should still happen.  Skips are
//! "advance plus 2": they bump the counter themselves and still return
//! `Flow::Advance`.
//!
//! A couple of behaviours can be changed with the `Options` struct.  The
//! defaults are the canonical ones: shifts read `Vx`, and the register block
//! store/load instructions leave `I` where it was.

use std::default::Default;
use std::io::Read;
use std::num::Wrapping;

use failure::{Error, Fail, ResultExt};
use rand;

use display::{self, HEX_HEIGHT, MAX_SPRITE_HEIGHT};
use input::{self, Key};
use instruction::{Address, Instruction, Opcode};
use FONT_START;
use MEM_SIZE;
use PROG_SIZE;
use PROG_START;
use Register;
use STACK_SIZE;

/// An error resulting from a `CALL` with a full call stack.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "stack overflow: more than {} nested subroutines", _0)]
pub struct StackOverflowError(pub usize);

/// An error resulting from a `RET` with an empty call stack.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "stack underflow: no subroutine to return from")]
pub struct StackUnderflowError;

/// An error resulting from an input program being too large.
#[derive(Debug, Fail)]
#[fail(display = "input program is too large")]
pub struct ProgramTooLargeError;

/// What the driver should do with the program counter after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Apply the usual advance of 2.
    Advance,
    /// The instruction set the program counter itself; leave it alone.
    Jump,
}

/// Options for the interpreter.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Whether to enable load quirks mode (default `false`).
    pub load_quirks: bool,
    /// Whether to enable shift quirks mode (default `false`).
    pub shift_quirks: bool,
}

impl Options {
    /// Returns the default set of options.
    pub fn new() -> Self {
        Options {
            load_quirks: false,
            shift_quirks: false,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

/// A Chip-8 interpreter.
///
/// This struct contains the entire state of a Chip-8 machine and provides
/// methods for executing instructions against it and inspecting it.
pub struct Interpreter {
    /// The internal memory.
    mem: [u8; MEM_SIZE],
    /// The display buffer.
    display: display::Buffer,
    /// The input state.
    input: input::State,
    /// The general-purpose registers `V0`-`VF`.
    regs: [Wrapping<u8>; 16],
    /// The special register `I`.
    reg_i: Address,
    /// The delay timer.
    reg_dt: u8,
    /// The sound timer.
    reg_st: u8,
    /// The program counter.
    pc: u16,
    /// The call stack (for returning from subroutines).
    stack: [u16; STACK_SIZE],
    /// The number of entries in use on the call stack.
    sp: u8,

    /// Whether to use shift quirks mode.
    shift_quirks: bool,
    /// Whether to use load quirks mode.
    load_quirks: bool,
}

impl Interpreter {
    /// Returns a new interpreter with the default options.
    pub fn new() -> Self {
        Interpreter::with_options(Options::default())
    }

    /// Returns a new interpreter using the given options.
    ///
    /// All state is zeroed except for the program counter, which starts at
    /// `PROG_START`, and the font, which is copied to `FONT_START`.
    pub fn with_options(options: Options) -> Self {
        let mut interpreter = Interpreter {
            mem: [0; MEM_SIZE],
            display: display::Buffer::new(),
            input: input::State::new(),
            regs: [Wrapping(0); 16],
            reg_i: Address::default(),
            reg_dt: 0,
            reg_st: 0,
            pc: PROG_START as u16,
            stack: [0; STACK_SIZE],
            sp: 0,

            shift_quirks: options.shift_quirks,
            load_quirks: options.load_quirks,
        };

        // Copy sprites into memory.
        for (i, sprite) in display::HEX_SPRITES.iter().enumerate() {
            let start = FONT_START + i * HEX_HEIGHT;
            let end = start + sprite.len();
            interpreter.mem[start..end].copy_from_slice(sprite);
        }

        interpreter
    }

    /// Loads program data from the specified source.
    pub fn load_program<R: Read>(&mut self, input: &mut R) -> Result<(), Error> {
        let mut read = 0;
        while read < PROG_SIZE {
            match input.read(&mut self.mem[PROG_START + read..])? {
                0 => break,
                n => read += n,
            }
        }
        if read == PROG_SIZE {
            // Try to see if we missed part of the file.
            let mut tmp = [0u8];
            if input.read(&mut tmp)? == 1 {
                return Err(ProgramTooLargeError.into());
            }
        }
        info!("loaded {} bytes of program data", read);
        Ok(())
    }

    /// Returns a reference to the display buffer.
    pub fn display(&self) -> &display::Buffer {
        &self.display
    }

    /// Hands the display buffer to the given function if it has changed
    /// since the last refresh.
    pub fn refresh_display<F, E>(&mut self, f: F) -> Result<(), E>
    where
        F: FnOnce(&display::Buffer) -> Result<(), E>,
        E: Fail,
    {
        self.display.refresh(f)
    }

    /// Returns a reference to the input state.
    pub fn input(&self) -> &input::State {
        &self.input
    }

    /// Returns a mutable reference to the input state.
    pub fn input_mut(&mut self) -> &mut input::State {
        &mut self.input
    }

    /// Returns a reference to the internal memory.
    pub fn mem(&self) -> &[u8; MEM_SIZE] {
        &self.mem
    }

    /// Returns a mutable reference to the internal memory.
    pub fn mem_mut(&mut self) -> &mut [u8; MEM_SIZE] {
        &mut self.mem
    }

    /// Returns the value of register `I`.
    pub fn i(&self) -> Address {
        self.reg_i
    }

    /// Sets the value of register `I`.
    pub fn set_i(&mut self, val: Address) {
        self.reg_i = val;
    }

    /// Returns the value of the delay timer.
    pub fn dt(&self) -> u8 {
        self.reg_dt
    }

    /// Sets the value of the delay timer.
    pub fn set_dt(&mut self, val: u8) {
        self.reg_dt = val;
    }

    /// Returns the value of the sound timer.
    pub fn st(&self) -> u8 {
        self.reg_st
    }

    /// Sets the value of the sound timer.
    pub fn set_st(&mut self, val: u8) {
        self.reg_st = val;
    }

    /// Returns the value in the given register.
    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg as usize].0
    }

    /// Sets the given register to the given value.
    pub fn set_register(&mut self, reg: Register, val: u8) {
        self.regs[reg as usize].0 = val
    }

    /// Returns the value of the program counter.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Sets the value of the program counter.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Applies the usual advance of 2 to the program counter.
    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Returns the entries currently on the call stack, oldest first.
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp as usize]
    }

    /// Returns the number of entries on the call stack.
    pub fn sp(&self) -> u8 {
        self.sp
    }

    /// Pushes the given address onto the call stack.
    ///
    /// Nothing is changed if the stack is already full.
    pub fn push_stack(&mut self, addr: u16) -> Result<(), Error> {
        let sp = self.sp as usize;
        if sp >= STACK_SIZE {
            Err(StackOverflowError(STACK_SIZE))?
        }
        self.stack[sp] = addr;
        self.sp += 1;
        debug!("pushed {:#05X} (depth {})", addr, self.sp);
        Ok(())
    }

    /// Pops the most recently pushed address off the call stack.
    pub fn pop_stack(&mut self) -> Result<u16, Error> {
        if self.sp == 0 {
            Err(StackUnderflowError)?
        }
        self.sp -= 1;
        let addr = self.stack[self.sp as usize];
        debug!("popped {:#05X} (depth {})", addr, self.sp);
        Ok(addr)
    }

    /// Returns the opcode at the program counter.
    pub fn current_opcode(&self) -> Opcode {
        let pc = Address::new(self.pc);
        let high = self.mem[pc.addr()];
        let low = self.mem[(pc + 1).addr()];
        Opcode::from_bytes(high, low)
    }

    /// Decodes and executes the given opcode.
    ///
    /// An opcode which names no instruction is reported as an
    /// `UnimplementedOpcodeError` and leaves the state untouched.
    pub fn dispatch(&mut self, opcode: Opcode) -> Result<Flow, Error> {
        let ins = Instruction::from_opcode(opcode)?;
        self.execute(ins)
    }

    /// Executes the given instruction in the current interpreter context.
    ///
    /// The interpreter will behave as if the given instruction were executed
    /// at the current program location in memory.
    pub fn execute(&mut self, ins: Instruction) -> Result<Flow, Error> {
        use self::Instruction::*;

        trace!("{:#05X}: {}", self.pc, ins);
        match ins {
            Cls => self.display.clear(),
            Ret => {
                self.pc = self.pop_stack()
                    .with_context(|_| format!("error executing {}", ins))?;
                return Ok(Flow::Jump);
            }
            Sys(addr) | Jp(addr) => {
                self.pc = addr.as_u16();
                return Ok(Flow::Jump);
            }
            Call(addr) => {
                let ret = self.pc.wrapping_add(2);
                self.push_stack(ret)
                    .with_context(|_| format!("error executing {}", ins))?;
                self.pc = addr.as_u16();
                return Ok(Flow::Jump);
            }
            SeByte(reg, b) => if self.register(reg) == b {
                self.skip();
            },
            SneByte(reg, b) => if self.register(reg) != b {
                self.skip();
            },
            SeReg(reg1, reg2) => if self.register(reg1) == self.register(reg2) {
                self.skip();
            },
            LdByte(reg, b) => self.set_register(reg, b),
            AddByte(reg, b) => self.regs[reg as usize] += Wrapping(b),
            LdReg(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.set_register(reg1, r2);
            }
            Or(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 | r2);
            }
            And(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 & r2);
            }
            Xor(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 ^ r2);
            }
            AddReg(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.add(reg1, r2);
            }
            Sub(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.sub(reg1, r2);
            }
            Shr(reg1, reg2) => {
                let src = self.shift_source(reg1, reg2);
                self.shr(reg1, src);
            }
            Subn(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.subn(reg1, r2);
            }
            Shl(reg1, reg2) => {
                let src = self.shift_source(reg1, reg2);
                self.shl(reg1, src);
            }
            SneReg(reg1, reg2) => if self.register(reg1) != self.register(reg2) {
                self.skip();
            },
            LdI(addr) => self.reg_i = addr,
            JpV0(addr) => {
                self.pc = (addr + self.register(Register::V0) as usize).as_u16();
                return Ok(Flow::Jump);
            }
            Rnd(reg, b) => self.set_register(reg, rand::random::<u8>() & b),
            Drw(reg1, reg2, n) => self.drw(reg1, reg2, n),
            Skp(reg) => if self.input.is_pressed(Key::from_byte(self.register(reg))) {
                self.skip();
            },
            Sknp(reg) => if !self.input.is_pressed(Key::from_byte(self.register(reg))) {
                self.skip();
            },
            LdRegDt(reg) => {
                let dt = self.dt();
                self.set_register(reg, dt);
            }
            LdKey(reg) => match self.input.lowest_pressed() {
                Some(key) => self.set_register(reg, key as u8),
                None => {
                    // Step back so that the driver's advance lands on this
                    // instruction again.
                    debug!("waiting for key press at {:#05X}", self.pc);
                    self.pc = self.pc.wrapping_sub(2);
                }
            },
            LdDtReg(reg) => {
                let r = self.register(reg);
                self.set_dt(r);
            }
            LdSt(reg) => {
                let r = self.register(reg);
                self.set_st(r);
            }
            AddI(reg) => {
                let new_i = self.i() + self.register(reg) as usize;
                self.set_i(new_i);
            }
            LdF(reg) => {
                let digit = (self.register(reg) & 0xF) as usize;
                self.set_i(Address::new((FONT_START + HEX_HEIGHT * digit) as u16));
            }
            LdB(reg) => self.ld_b(reg),
            LdDerefIReg(reg) => self.ld_deref_i_reg(reg),
            LdRegDerefI(reg) => self.ld_reg_deref_i(reg),
        }

        Ok(Flow::Advance)
    }

    /// Adds an extra 2 to the program counter, on top of the driver's usual
    /// advance.
    fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Returns the register a shift instruction should read from.
    fn shift_source(&self, reg1: Register, reg2: Register) -> Register {
        if self.shift_quirks {
            reg2
        } else {
            reg1
        }
    }

    /// Adds the given byte to the given register, setting `VF` to 1 on carry
    /// or 0 otherwise.
    fn add(&mut self, reg: Register, val: u8) {
        let sum = self.register(reg) as u16 + val as u16;
        self.set_register(reg, sum as u8);
        self.set_register(Register::VF, (sum > 0xFF) as u8);
    }

    /// Implements the `DRW` operation.
    fn drw(&mut self, reg1: Register, reg2: Register, n: u8) {
        let x = self.register(reg1) as usize;
        let y = self.register(reg2) as usize;
        self.set_register(Register::VF, 0);

        let height = (n as usize).min(MAX_SPRITE_HEIGHT);
        let mut sprite = [0u8; MAX_SPRITE_HEIGHT];
        for (row, byte) in sprite[..height].iter_mut().enumerate() {
            *byte = self.mem[(self.reg_i + row).addr()];
        }

        let collision = self.display.draw_sprite(&sprite[..height], x, y);
        self.set_register(Register::VF, collision as u8);
    }

    /// Implements the `LD B, Vx` operation.
    fn ld_b(&mut self, reg: Register) {
        let val = self.register(reg);
        let addr = self.i();

        self.mem[addr.addr()] = val / 100;
        self.mem[(addr + 1).addr()] = val % 100 / 10;
        self.mem[(addr + 2).addr()] = val % 10;
    }

    /// Implements the `LD [I], Vx` operation.
    fn ld_deref_i_reg(&mut self, reg: Register) {
        let count = reg as usize + 1;
        let start = self.i();

        for k in 0..count {
            self.mem[(start + k).addr()] = self.regs[k].0;
        }
        if self.load_quirks {
            self.set_i(start + count);
        }
    }

    /// Implements the `LD Vx, [I]` operation.
    fn ld_reg_deref_i(&mut self, reg: Register) {
        let count = reg as usize + 1;
        let start = self.i();

        for k in 0..count {
            self.regs[k] = Wrapping(self.mem[(start + k).addr()]);
        }
        if self.load_quirks {
            self.set_i(start + count);
        }
    }

    /// Sets `reg1` to `reg2 << 1`, setting `VF` to the old highest bit.
    fn shl(&mut self, reg1: Register, reg2: Register) {
        let r2 = self.register(reg2);
        self.set_register(reg1, r2 << 1);
        self.set_register(Register::VF, (r2 & 0x80 != 0) as u8);
    }

    /// Sets `reg1` to `reg2 >> 1`, setting `VF` to the old lowest bit.
    fn shr(&mut self, reg1: Register, reg2: Register) {
        let r2 = self.register(reg2);
        self.set_register(reg1, r2 >> 1);
        self.set_register(Register::VF, r2 & 1);
    }

    /// Subtracts the given byte from the given register, setting `VF` to 1 if
    /// the register was strictly greater or 0 otherwise.
    fn sub(&mut self, reg: Register, val: u8) {
        let r = self.register(reg);
        self.set_register(reg, r.wrapping_sub(val));
        self.set_register(Register::VF, (r > val) as u8);
    }

    /// Sets `reg` to `val - reg`, setting `VF` to 1 if `val` was strictly
    /// greater or 0 otherwise.
    fn subn(&mut self, reg: Register, val: u8) {
        let r = self.register(reg);
        self.set_register(reg, val.wrapping_sub(r));
        self.set_register(Register::VF, (val > r) as u8);
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
