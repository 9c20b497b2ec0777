//! Link Shaping Constants
//!
//! The two knobs that keep the outbound serial link stable: a per-tick byte
//! budget (bandwidth cap) and a sink free-space gate (backpressure). Both
//! are conservative by construction; the flush loop estimates worst-case
//! on-wire size before committing to a transmit.

/// Per-tick transmit byte budget.
///
/// 200 bytes every 20 ms is 10 kB/s, safely under a 115200-baud link's
/// ~11.5 kB/s so the downstream buffer always drains between ticks.
pub const TX_BUDGET_BYTES: u32 = 200;

/// Minimum sink free space required before transmitting a frame.
///
/// With less than this available the frame is deferred, trading latency
/// for never blocking on a congested sink.
pub const OUT_MIN_FREE: usize = 96;

/// Whether telemetry is discarded (instead of requeued) under budget
/// pressure.
pub const ENABLE_DEGRADE: bool = true;

/// Whether each encoded frame is hex-dumped to the log sink.
pub const DEBUG_DUMP_TX_HEX: bool = false;
