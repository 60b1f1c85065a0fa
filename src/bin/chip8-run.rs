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

//! The `chip8-run` binary program.
//!
//! This runs a program for a fixed number of cycles without any window or
//! sound, then prints whatever ended up on the display.

extern crate chip8_core;
extern crate clap;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;

use std::fs::File;
use std::io::{self, Write};
use std::num::ParseIntError;
use std::process;

use clap::{App, Arg, ArgMatches};
use failure::{Error, ResultExt};
use log::LevelFilter;

use chip8_core::driver::{Driver, Options, UnknownOpcodePolicy};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let matches = App::new("chip8-run")
        .version(VERSION)
        .author("Ian Johnson <ianprime0509@gmail.com>")
        .about("Runs a Chip-8 program headless and prints the final display")
        .help_message("show this help message and exit")
        .version_message("show version information and exit")
        .arg(
            Arg::with_name("cycles")
                .short("c")
                .long("cycles")
                .value_name("N")
                .help("set the number of cycles to run")
                .takes_value(true)
                .default_value("1000"),
        )
        .arg(
            Arg::with_name("frequency")
                .long("frequency")
                .value_name("FREQ")
                .help("set game timer frequency (in Hz)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("keys")
                .short("k")
                .long("keys")
                .value_name("MASK")
                .help("set the keys held down, as a hexadecimal bit mask")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("load-quirks")
                .short("l")
                .long("load-quirks")
                .help("enable load quirks mode"),
        )
        .arg(
            Arg::with_name("shift-quirks")
                .short("q")
                .long("shift-quirks")
                .help("enable shift quirks mode"),
        )
        .arg(
            Arg::with_name("skip-unknown")
                .long("skip-unknown")
                .help("skip unimplemented opcodes instead of stopping"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("increase verbosity"),
        )
        .arg(
            Arg::with_name("FILE")
                .help("set the program file to run")
                .required(true)
                .index(1),
        )
        .get_matches();

    let verbosity = matches.occurrences_of("verbose");
    let filter = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, filter)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        for cause in e.causes().skip(1) {
            info!("caused by: {}", cause);
        }
        trace!("backtrace: {}", e.backtrace());
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let mut opts = Options::new();
    process_opts(&mut opts, matches)?;
    let cycles = matches
        .value_of("cycles")
        .unwrap_or("1000")
        .parse::<u64>()
        .context("invalid cycles argument")?;
    let keys = matches
        .value_of("keys")
        .map(parse_key_mask)
        .unwrap_or(Ok(0))
        .context("invalid keys argument")?;

    let filename = matches.value_of("FILE").unwrap();
    let mut input =
        File::open(filename).with_context(|_| format!("could not open file '{}'", filename))?;
    let mut driver = Driver::with_options(opts);
    driver
        .load_program(&mut input)
        .with_context(|_| format!("could not load program from file '{}'", filename))?;
    driver.interpreter_mut().input_mut().set_bits(keys);

    for _ in 0..cycles {
        let pc = driver.interpreter().pc();
        driver
            .step()
            .with_context(|_| format!("execution stopped at {:#05X}", pc))?;
    }
    info!("ran {} cycles", driver.cycles());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    driver
        .interpreter_mut()
        .refresh_display(|buf| write!(out, "{}", buf))?;
    Ok(())
}

/// Parses a hexadecimal key mask, with or without a `0x` or `0X` prefix.
fn parse_key_mask(s: &str) -> Result<u16, ParseIntError> {
    let digits = if s.starts_with("0x") || s.starts_with("0X") {
        &s[2..]
    } else {
        s
    };
    u16::from_str_radix(digits, 16)
}

/// Processes the command-line arguments and changes the necessary fields of
/// the given driver options.
fn process_opts(opts: &mut Options, matches: &ArgMatches) -> Result<(), Error> {
    if let Some(freq) = matches.value_of("frequency") {
        opts.timer_freq = freq.parse::<u32>().context("invalid frequency argument")?;
    }
    if matches.is_present("load-quirks") {
        opts.interpreter.load_quirks = true;
    }
    if matches.is_present("shift-quirks") {
        opts.interpreter.shift_quirks = true;
    }
    if matches.is_present("skip-unknown") {
        opts.unknown_opcodes = UnknownOpcodePolicy::Skip;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_key_mask;

    #[test]
    fn key_mask_prefixes() {
        // Test cases, in the format (argument, expected mask).
        let cases = [
            ("0x8001", Some(0x8001)),
            ("0X8001", Some(0x8001)),
            ("8001", Some(0x8001)),
            ("0xa0", Some(0x00A0)),
            ("0", Some(0)),
            ("0x", None),
            ("0x10000", None),
            ("keys", None),
        ];

        for &(arg, expected) in cases.iter() {
            assert_eq!(parse_key_mask(arg).ok(), expected, "case {:?}", arg);
        }
    }
}
