//! Time-Related Constants
//!
//! Cadences and windows for the tick loop, the periodic sources, and the
//! observability layer. All values are milliseconds on the wrapping 32-bit
//! timeline (see [`crate::time`]).

/// Nominal tick period (milliseconds).
///
/// One full pass of the core (sources, lowering, flush) runs per tick.
/// 50 Hz keeps worst-case event latency low while leaving the budget
/// arithmetic in comfortable integer ranges.
pub const TICK_MS: u32 = 20;

/// SENSOR source period (milliseconds).
///
/// 12.5 Hz, the fastest of the built-in cadences.
pub const SENSOR_PERIOD_MS: u32 = 80;

/// HB (heartbeat) source period (milliseconds).
pub const HB_PERIOD_MS: u32 = 200;

/// TELEM (telemetry) source period (milliseconds).
///
/// Telemetry is the lowest-priority stream and the first to be sacrificed
/// under budget pressure.
pub const TELEM_PERIOD_MS: u32 = 1000;

/// Event-queue merge window (milliseconds).
///
/// Two same-kind events arriving within this window collapse to the newer
/// one. Matches the tick period so bursts produced inside one tick always
/// coalesce.
pub const COALESCE_WINDOW_MS: u32 = 20;

/// Observational aging threshold (milliseconds).
///
/// An event older than this at lowering time bumps the `aged` counters.
/// Aging does not change routing; the counters exist so a future priority
/// escalation has data to act on.
pub const AGED_MS: u32 = 200;

/// Minimum interval between stats snapshot lines (milliseconds).
pub const SNAPSHOT_PERIOD_MS: u32 = 200;
