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

//! The Chip-8 display buffer and font.

use std::default::Default;
use std::fmt;

use failure::Fail;

/// The width of the display.
pub const WIDTH: usize = 64;
/// The height of the display.
pub const HEIGHT: usize = 32;
/// The width of every sprite.
pub const SPRITE_WIDTH: usize = 8;
/// The tallest sprite a single draw can produce.
pub const MAX_SPRITE_HEIGHT: usize = 15;

/// The height of a hex digit sprite.
pub const HEX_HEIGHT: usize = 5;

/// The hex digit sprites, in order from `0` to `F`.
pub const HEX_SPRITES: [[u8; HEX_HEIGHT]; 16] = [
    [0xF0, 0x90, 0x90, 0x90, 0xF0],
    [0x20, 0x60, 0x20, 0x20, 0x70],
    [0xF0, 0x10, 0xF0, 0x80, 0xF0],
    [0xF0, 0x10, 0xF0, 0x10, 0xF0],
    [0x90, 0x90, 0xF0, 0x10, 0x10],
    [0xF0, 0x80, 0xF0, 0x10, 0xF0],
    [0xF0, 0x80, 0xF0, 0x90, 0xF0],
    [0xF0, 0x10, 0x20, 0x40, 0x40],
    [0xF0, 0x90, 0xF0, 0x90, 0xF0],
    [0xF0, 0x90, 0xF0, 0x10, 0xF0],
    [0xF0, 0x90, 0xF0, 0x90, 0x90],
    [0xE0, 0x90, 0xE0, 0x90, 0xE0],
    [0xF0, 0x80, 0x80, 0x80, 0xF0],
    [0xE0, 0x90, 0x90, 0x90, 0xE0],
    [0xF0, 0x80, 0xF0, 0x80, 0xF0],
    [0xF0, 0x80, 0xF0, 0x80, 0x80],
];

/// A Chip-8 display buffer.
///
/// Pixels are stored row-major, so the pixel at `(x, y)` lives at index
/// `x + y * WIDTH` of `data()`.
pub struct Buffer {
    /// The underlying display buffer data.
    data: [bool; WIDTH * HEIGHT],
    /// Whether the display needs to be refreshed.
    needs_refresh: bool,
}

impl Buffer {
    /// Returns a new display buffer with all pixels clear.
    pub fn new() -> Self {
        Buffer {
            data: [false; WIDTH * HEIGHT],
            needs_refresh: true,
        }
    }

    /// Clears the display.
    pub fn clear(&mut self) {
        for elem in self.data.iter_mut() {
            *elem = false;
        }
        self.needs_refresh = true;
    }

    /// Returns a reference to the underlying pixel data.
    pub fn data(&self) -> &[bool; WIDTH * HEIGHT] {
        &self.data
    }

    /// Returns whether the pixel at the given position is set.
    ///
    /// Coordinates outside the display wrap around.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.data[index(x, y)]
    }

    /// Draws the given sprite with its top-left corner at the given position.
    ///
    /// Each byte of `sprite` is one row, most significant bit leftmost.
    /// Rows and columns which fall off the edge of the display wrap around
    /// to the other side.  Every set bit flips the pixel under it.
    ///
    /// Returns whether any pixel was flipped from on to off.
    pub fn draw_sprite(&mut self, sprite: &[u8], x: usize, y: usize) -> bool {
        let mut collision = false;

        for (j, row) in sprite.iter().enumerate() {
            for i in 0..SPRITE_WIDTH {
                if row & (0x80 >> i) != 0 && self.toggle(x + i, y + j) {
                    collision = true;
                }
            }
        }

        collision
    }

    /// Refreshes the display using the given refresh function.
    ///
    /// If a refresh is unnecessary, nothing will be done.  The refresh
    /// function receives a "snapshot" of the display, and should draw that to
    /// whatever user-facing display buffer is currently being used.
    pub fn refresh<F, E>(&mut self, f: F) -> Result<(), E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
        E: Fail,
    {
        if self.needs_refresh {
            f(self)?;
            self.needs_refresh = false;
        }
        Ok(())
    }

    /// Flips the on/off state of the given pixel, returning whether it was
    /// flipped off from the on state.
    fn toggle(&mut self, x: usize, y: usize) -> bool {
        let idx = index(x, y);
        let old = self.data[idx];
        self.data[idx] = !old;
        self.needs_refresh = true;

        old
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.data.chunks(WIDTH) {
            for &pixel in row {
                write!(f, "{}", if pixel { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Returns the index of the pixel at the given (wrapped) position.
fn index(x: usize, y: usize) -> usize {
    x % WIDTH + (y % HEIGHT) * WIDTH
}
