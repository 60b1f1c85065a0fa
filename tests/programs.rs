/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! Runs small complete programs through the driver and checks the machine
//! state they leave behind.

extern crate chip8_core;

use chip8_core::display::{HEX_SPRITES, WIDTH};
use chip8_core::driver::{Driver, Options};
use chip8_core::input::Key;
use chip8_core::{Register, StackOverflowError};

/// Prints 205 in decimal using the built-in font.
static BCD_DIGITS: &[u8] = &[
    0x60, 0xCD, // LD V0, #CD
    0xA3, 0x00, // LD I, #300
    0xF0, 0x33, // LD B, V0
    0xF2, 0x65, // LD V2, [I]
    0x63, 0x00, // LD V3, #00
    0x64, 0x00, // LD V4, #00
    0xF0, 0x29, // LD F, V0
    0xD3, 0x45, // DRW V3, V4, 5
    0x73, 0x05, // ADD V3, #05
    0xF1, 0x29, // LD F, V1
    0xD3, 0x45, // DRW V3, V4, 5
    0x73, 0x05, // ADD V3, #05
    0xF2, 0x29, // LD F, V2
    0xD3, 0x45, // DRW V3, V4, 5
    0x12, 0x1C, // JP #21C
];

/// Counts to 10 through a subroutine, then draws a glyph twice.
static COUNT_AND_ERASE: &[u8] = &[
    0x61, 0x00, // LD V1, #00
    0x62, 0x0A, // LD V2, #0A
    0x22, 0x14, // CALL #214
    0x92, 0x10, // SNE V2, V1
    0x12, 0x0C, // JP #20C
    0x12, 0x04, // JP #204
    0xA0, 0x50, // LD I, #050
    0xD0, 0x05, // DRW V0, V0, 5
    0xD0, 0x05, // DRW V0, V0, 5
    0x12, 0x12, // JP #212
    0x71, 0x01, // ADD V1, #01
    0x00, 0xEE, // RET
];

/// Waits for the delay timer to run out, then for a key.
static TIMER_THEN_KEY: &[u8] = &[
    0x60, 0x05, // LD V0, #05
    0xF0, 0x15, // LD DT, V0
    0xF1, 0x07, // LD V1, DT
    0x31, 0x00, // SE V1, #00
    0x12, 0x04, // JP #204
    0xF2, 0x0A, // LD V2, K
    0x12, 0x0C, // JP #20C
];

fn load(program: &[u8]) -> Driver {
    let mut driver = Driver::with_options(Options::testing());
    let mut input = program;
    driver.load_program(&mut input).unwrap();
    driver
}

#[test]
fn bcd_digits() {
    let mut driver = load(BCD_DIGITS);
    driver.run(20).unwrap();
    let interpreter = driver.interpreter();

    assert_eq!(interpreter.pc(), 0x21C);
    assert_eq!(&interpreter.mem()[0x300..0x303], &[2, 0, 5]);
    assert_eq!(interpreter.register(Register::VF), 0);

    for (slot, &digit) in [2usize, 0, 5].iter().enumerate() {
        for (row, &byte) in HEX_SPRITES[digit].iter().enumerate() {
            for col in 0..5 {
                let x = slot * 5 + col;
                let expected = byte & (0x80 >> col) != 0;
                assert_eq!(
                    interpreter.display().data()[x + row * WIDTH],
                    expected,
                    "digit {} pixel {:?}",
                    digit,
                    (col, row)
                );
            }
        }
    }
}

#[test]
fn count_and_erase() {
    let mut driver = load(COUNT_AND_ERASE);
    driver.run(60).unwrap();
    let interpreter = driver.interpreter();

    assert_eq!(interpreter.pc(), 0x212);
    assert_eq!(interpreter.register(Register::V1), 10);
    assert_eq!(interpreter.register(Register::VF), 1);
    assert_eq!(interpreter.sp(), 0);
    assert!(interpreter.display().data().iter().all(|&p| !p));
}

#[test]
fn timer_then_key() {
    let mut driver = load(TIMER_THEN_KEY);
    driver.run(10).unwrap();
    assert_eq!(driver.interpreter().pc(), 0x208);
    assert_eq!(driver.interpreter().dt(), 5);

    driver.tick_timers(5);
    driver.run(4).unwrap();
    assert_eq!(driver.interpreter().pc(), 0x20A);
    driver.run(3).unwrap();
    assert_eq!(driver.interpreter().pc(), 0x20A);

    driver.interpreter_mut().input_mut().press(Key::KE);
    driver.step().unwrap();
    assert_eq!(driver.interpreter().pc(), 0x20C);
    assert_eq!(driver.interpreter().register(Register::V2), 0xE);
}

#[test]
fn runaway_recursion_overflows() {
    // CALL #200
    let mut driver = load(&[0x22, 0x00]);
    driver.run(16).unwrap();
    assert_eq!(driver.interpreter().sp(), 16);

    let err = driver.step().unwrap_err();
    assert_eq!(err.to_string(), "error executing CALL #200");
    assert!(
        err.find_root_cause()
            .downcast_ref::<StackOverflowError>()
            .is_some()
    );
    assert_eq!(driver.interpreter().pc(), 0x200);
    assert_eq!(driver.interpreter().stack(), &[0x202; 16][..]);
}
