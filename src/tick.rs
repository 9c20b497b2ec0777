//! Catch-up Fixed-Step Tick Driver
//!
//! ## Overview
//!
//! The driver turns an arbitrary wake cadence into a fixed-step tick
//! schedule. On every [`TickDriver::poll`] it reads the clock and runs one
//! full core pass per elapsed tick period:
//!
//! ```text
//! while (now - last_tick) as i32 >= TICK_MS {
//!     last_tick += TICK_MS;
//!     shaper.tick(now);
//! }
//! ```
//!
//! A delayed wake therefore executes every missed tick rather than
//! collapsing them into one — each pass re-polls the sources and re-arms
//! the budget, so source cadence and shaping behavior are preserved across
//! stalls. Sleeping between wakes is the caller's concern; the driver
//! never blocks.
//!
//! Each pass is timed in microseconds and recorded in the stats gauges
//! (`work_us_last`, `work_us_max`).

use crate::shaper::Shaper;
use crate::traits::{ByteSink, LogSink, TimeSource};

/// Fixed-step driver owning the clock.
#[derive(Debug, Clone)]
pub struct TickDriver<T: TimeSource> {
    time: T,
    last_tick_ms: u32,
}

impl<T: TimeSource> TickDriver<T> {
    /// Create a driver anchored at the clock's current reading.
    pub fn new(time: T) -> Self {
        let last_tick_ms = time.now_ms();
        Self { time, last_tick_ms }
    }

    /// Run every tick that has become due, returning how many ran.
    pub fn poll<S: ByteSink, L: LogSink>(&mut self, shaper: &mut Shaper<S, L>) -> u32 {
        let now = self.time.now_ms();
        let tick_ms = shaper.config().tick_ms;
        let mut ran = 0;

        while now.wrapping_sub(self.last_tick_ms) as i32 >= tick_ms as i32 {
            self.last_tick_ms = self.last_tick_ms.wrapping_add(tick_ms);

            let t0 = self.time.now_us();
            shaper.tick(now);
            let spent = self.time.now_us().wrapping_sub(t0);
            shaper.record_work_us(spent);

            ran += 1;
        }

        ran
    }

    /// Borrow the clock.
    pub fn time(&self) -> &T {
        &self.time
    }
}
