/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The core of a Chip-8 interpreter.
//!
//! This crate decodes Chip-8 instruction words and applies them to an
//! in-memory machine model.  It does not decide when a cycle happens or how
//! input events turn into key presses; those are left to a driver, of which
//! a simple reference implementation is provided in the `driver` module.

#[macro_use]
extern crate enum_primitive;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate num;
extern crate rand;
extern crate time;

/// The size of the Chip-8's memory, in bytes.
pub const MEM_SIZE: usize = 0x1000;
/// The mask applied to every computed memory address.
pub const ADDR_MASK: u16 = 0xFFF;
/// The address where programs should be loaded.
pub const PROG_START: usize = 0x200;
/// The maximum size of a Chip-8 program, in bytes.
pub const PROG_SIZE: usize = MEM_SIZE - PROG_START;
/// The address where the hex digit font is loaded.
pub const FONT_START: usize = 0x050;
/// The number of return addresses the call stack can hold.
pub const STACK_SIZE: usize = 16;

pub mod display;
pub mod driver;
pub mod input;
pub mod instruction;
pub mod interpreter;
mod timer;

pub use driver::Driver;
pub use instruction::{Address, Instruction, Opcode, Register, UnimplementedOpcodeError};
pub use interpreter::{Flow, Interpreter, StackOverflowError, StackUnderflowError};
