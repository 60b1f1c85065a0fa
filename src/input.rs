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

//! Keypad state for the Chip-8 interpreter.
//!
//! The keypad is a 16-bit mask with bit `k` set while key `k` is held down.
//! The interpreter only ever reads it; pressing and releasing keys is up to
//! whatever is translating real input events.

use std::default::Default;

use num::traits::FromPrimitive;

/// The number of keys on the Chip-8 controller.
const N_KEYS: usize = 16;

enum_from_primitive!{
/// The keys on the Chip-8 controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    K0 = 0,
    K1,
    K2,
    K3,
    K4,
    K5,
    K6,
    K7,
    K8,
    K9,
    KA,
    KB,
    KC,
    KD,
    KE,
    KF
}
}

impl Key {
    /// Returns the key corresponding to the lowest four bits of the given
    /// byte.
    pub fn from_byte(b: u8) -> Key {
        Key::from_u8(b % N_KEYS as u8).unwrap()
    }

    /// Returns the bit representing this key in the keypad mask.
    pub fn mask(self) -> u16 {
        1 << self as u16
    }
}

/// Represents the state of the input device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct State {
    /// The key bits (set means "pressed").
    keys: u16,
}

impl State {
    /// Returns a new input state with all keys unpressed.
    pub fn new() -> Self {
        State::default()
    }

    /// Returns the raw key mask.
    pub fn bits(&self) -> u16 {
        self.keys
    }

    /// Replaces the whole key mask at once.
    pub fn set_bits(&mut self, keys: u16) {
        self.keys = keys;
    }

    /// Presses the given key.
    pub fn press(&mut self, key: Key) {
        self.keys |= key.mask();
    }

    /// Releases the given key.
    pub fn release(&mut self, key: Key) {
        self.keys &= !key.mask();
    }

    /// Returns whether the given key is pressed.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys & key.mask() != 0
    }

    /// Returns the lowest-numbered key that is pressed, if any.
    ///
    /// When several keys are held at once, this is how a single one is
    /// chosen.
    pub fn lowest_pressed(&self) -> Option<Key> {
        if self.keys == 0 {
            None
        } else {
            Key::from_u32(self.keys.trailing_zeros())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Key, State};

    #[test]
    fn press_and_release() {
        let mut state = State::new();
        assert_eq!(state.bits(), 0);

        state.press(Key::K0);
        state.press(Key::KF);
        assert_eq!(state.bits(), 0x8001);
        assert!(state.is_pressed(Key::K0));
        assert!(state.is_pressed(Key::KF));
        assert!(!state.is_pressed(Key::K7));

        state.release(Key::K0);
        assert_eq!(state.bits(), 0x8000);
        assert!(!state.is_pressed(Key::K0));
    }

    #[test]
    fn lowest_pressed() {
        // Test cases, in the format (mask, expected key).
        let cases = [
            (0x0000, None),
            (0x0001, Some(Key::K0)),
            (0x8000, Some(Key::KF)),
            (0x0A00, Some(Key::K9)),
            (0xFFFF, Some(Key::K0)),
            (0x0030, Some(Key::K4)),
        ];
        let mut state = State::new();

        for &(mask, expected) in cases.iter() {
            state.set_bits(mask);
            assert_eq!(state.lowest_pressed(), expected, "case {:#06X}", mask);
            // Looking doesn't consume the key.
            assert_eq!(state.bits(), mask, "case {:#06X}", mask);
        }
    }

    #[test]
    fn key_from_byte_uses_low_nibble() {
        assert_eq!(Key::from_byte(0x0B), Key::KB);
        assert_eq!(Key::from_byte(0x1B), Key::KB);
        assert_eq!(Key::from_byte(0xF0), Key::K0);
    }
}
