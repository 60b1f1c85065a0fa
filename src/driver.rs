/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! A reference driver for the interpreter.
//!
//! The interpreter itself only knows how to execute one instruction.  The
//! `Driver` does everything around that: fetching the word at the program
//! counter, applying the usual advance of 2 unless the instruction moved the
//! program counter itself, decaying the timers at 60 Hz and deciding what to
//! do about opcodes which name no instruction.

use std::io::Read;

use failure::Error;

use instruction::UnimplementedOpcodeError;
use interpreter::{self, Flow, Interpreter};
use timer::Timer;

/// What to do when the program counter reaches an unimplemented opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownOpcodePolicy {
    /// Return the error from `step`.
    Halt,
    /// Log a warning and move on to the next instruction.
    Skip,
}

/// Options for the driver.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Whether to enable the timer (default `true`).
    pub enable_timer: bool,
    /// Options passed through to the interpreter.
    pub interpreter: interpreter::Options,
    /// The frequency at which the timers count down, in Hz (default 60).
    pub timer_freq: u32,
    /// What to do about unimplemented opcodes (default `Halt`).
    pub unknown_opcodes: UnknownOpcodePolicy,
}

impl Options {
    /// Returns the default set of options.
    pub fn new() -> Self {
        Options {
            enable_timer: true,
            interpreter: interpreter::Options::new(),
            timer_freq: 60,
            unknown_opcodes: UnknownOpcodePolicy::Halt,
        }
    }

    /// Returns a set of options useful for testing (e.g. no timer).
    pub fn testing() -> Self {
        Options {
            enable_timer: false,
            ..Options::new()
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

/// Runs an interpreter one cycle at a time.
pub struct Driver {
    /// The interpreter being driven.
    interpreter: Interpreter,
    /// The clock that decays `DT` and `ST`.
    timer: Timer,
    /// What to do about unimplemented opcodes.
    unknown_opcodes: UnknownOpcodePolicy,
    /// The number of cycles executed so far.
    cycles: u64,
}

impl Driver {
    /// Returns a new driver with the default options.
    pub fn new() -> Self {
        Driver::with_options(Options::default())
    }

    /// Returns a new driver using the given options.
    pub fn with_options(options: Options) -> Self {
        Driver {
            interpreter: Interpreter::with_options(options.interpreter),
            timer: if options.enable_timer {
                Timer::new(options.timer_freq)
            } else {
                Timer::new_disabled(options.timer_freq)
            },
            unknown_opcodes: options.unknown_opcodes,
            cycles: 0,
        }
    }

    /// Loads program data from the specified source.
    pub fn load_program<R: Read>(&mut self, input: &mut R) -> Result<(), Error> {
        self.interpreter.load_program(input)
    }

    /// Returns a reference to the interpreter.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Returns a mutable reference to the interpreter.
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Returns the number of cycles executed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Performs a single fetch-decode-execute cycle.
    ///
    /// Errors leave the program counter on the offending instruction.
    pub fn step(&mut self) -> Result<Flow, Error> {
        self.update_timers();

        let pc = self.interpreter.pc();
        let opcode = self.interpreter.current_opcode();
        let flow = match self.interpreter.dispatch(opcode) {
            Ok(flow) => flow,
            Err(e) => {
                if self.unknown_opcodes == UnknownOpcodePolicy::Skip
                    && e.downcast_ref::<UnimplementedOpcodeError>().is_some()
                {
                    warn!("skipping {} at {:#05X}", opcode, pc);
                    Flow::Advance
                } else {
                    return Err(e);
                }
            }
        };

        if flow == Flow::Advance {
            self.interpreter.advance_pc();
        }
        self.cycles += 1;
        Ok(flow)
    }

    /// Performs the given number of cycles, stopping at the first error.
    pub fn run(&mut self, cycles: u64) -> Result<(), Error> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }

    /// Counts both timers down by the given number of ticks, stopping at 0.
    pub fn tick_timers(&mut self, ticks: u32) {
        let ticks = if ticks > 0xFF { 0xFF } else { ticks as u8 };
        let dt = self.interpreter.dt();
        let st = self.interpreter.st();
        self.interpreter.set_dt(dt.saturating_sub(ticks));
        self.interpreter.set_st(st.saturating_sub(ticks));
    }

    /// Applies however many timer ticks have elapsed on the wall clock.
    fn update_timers(&mut self) {
        let ticks = self.timer.lap();
        if ticks > 0 {
            self.tick_timers(ticks);
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}
