//! External Interface Traits
//!
//! The core owns its queues, counters and scheduling; everything else is
//! reached through the three seams defined here. Implementations are
//! supplied by the platform layer:
//!
//! - [`ByteSink`]: the outbound serial link driver (UART, USB CDC, socket).
//! - [`LogSink`]: the human-readable diagnostic channel.
//! - [`TimeSource`]: a monotonic clock that may wrap.
//!
//! All three are consumed as generic parameters rather than trait objects,
//! keeping the hot path free of dynamic dispatch and allocation.

/// Byte-oriented output link.
///
/// The sink is expected to buffer writes externally and never block; the
/// shaper consults [`available_for_write`](ByteSink::available_for_write)
/// before every transmit so a congested link defers frames instead of
/// stalling the tick.
pub trait ByteSink {
    /// Append bytes to the output stream.
    ///
    /// Called only after a successful free-space check, so implementations
    /// may treat this as infallible.
    fn write(&mut self, bytes: &[u8]);

    /// Number of bytes that can be written without blocking.
    fn available_for_write(&self) -> usize;
}

/// Human-readable log output.
///
/// Receives the periodic stats snapshot line and, when enabled, hex dumps
/// of encoded frames. Byte counts are tracked by the core for
/// observability.
pub trait LogSink {
    /// Append a UTF-8 text fragment to the log.
    fn write(&mut self, text: &str);
}

/// Monotonic clock with wrapping 32-bit readings.
///
/// Both readings are allowed to wrap; all comparisons in the core use
/// signed-difference semantics (see [`crate::time`]), so a rollover every
/// ~49.7 days (ms) or ~71.6 minutes (µs) is harmless.
pub trait TimeSource {
    /// Milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u32;

    /// Microseconds since an arbitrary epoch.
    fn now_us(&self) -> u32;
}
