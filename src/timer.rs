/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! A basic timer.

use std::num::Wrapping;

use time;

/// A basic timer, counting ticks of a fixed frequency against the wall clock.
#[derive(Debug)]
pub struct Timer {
    /// Whether the timer is enabled.
    enabled: bool,
    /// The frequency at which to run the timer.
    frequency: u32,
    /// An internal number of ticks.
    ticks: Wrapping<u32>,
}

impl Timer {
    /// Returns a new timer running at the given frequency.
    pub fn new(frequency: u32) -> Self {
        let mut timer = Timer::new_disabled(frequency);
        timer.enabled = true;
        timer.update();
        timer
    }

    /// Returns a new timer at the given frequency which is disabled.
    pub fn new_disabled(frequency: u32) -> Self {
        Timer {
            enabled: false,
            frequency,
            ticks: Wrapping(0),
        }
    }

    /// Returns the number of ticks which have elapsed since the last call to
    /// this method (or the creation of the timer).
    ///
    /// If the timer is disabled, this always returns 0.
    pub fn lap(&mut self) -> u32 {
        if self.enabled {
            let old = self.ticks;
            self.update();
            (self.ticks - old).0
        } else {
            0
        }
    }

    /// Updates the internal tick count.
    fn update(&mut self) {
        let ticks = time::precise_time_ns() as f64 * self.frequency as f64 / 1e9;
        self.ticks = Wrapping(ticks as u64 as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::Timer;

    #[test]
    fn disabled_timer_never_ticks() {
        let mut timer = Timer::new_disabled(60);
        assert_eq!(timer.lap(), 0);
        assert_eq!(timer.lap(), 0);
    }

    #[test]
    fn enabled_timer_counts_up() {
        use std::thread;
        use std::time::Duration;

        let mut timer = Timer::new(1000);
        thread::sleep(Duration::from_millis(20));
        assert!(timer.lap() >= 1);
    }
}
