//! Shared helpers for the integration tests: capturing sinks and a
//! frame-stream decoder built on the crate's own deframing path.

// Each integration binary compiles this module separately and uses a
// different subset of the helpers.
#![allow(dead_code)]

use linkshaper::{ByteSink, DecodedFrame, FrameDecoder, LogSink, ShaperConfig};

/// Byte sink that records everything written and reports a scriptable
/// amount of free space.
pub struct CaptureSink {
    pub bytes: Vec<u8>,
    pub free: usize,
}

impl CaptureSink {
    /// A sink that always has room.
    pub fn ready() -> Self {
        Self {
            bytes: Vec::new(),
            free: 64 * 1024,
        }
    }

    /// A sink reporting no free space (congested link).
    pub fn blocked() -> Self {
        Self {
            bytes: Vec::new(),
            free: 0,
        }
    }
}

impl ByteSink for CaptureSink {
    fn write(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    fn available_for_write(&self) -> usize {
        self.free
    }
}

/// Log sink that records each written fragment.
#[derive(Default)]
pub struct CaptureLog {
    pub lines: Vec<String>,
}

impl LogSink for CaptureLog {
    fn write(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }
}

/// Decode a captured byte stream into validated frames, panicking on any
/// framing or CRC error.
pub fn decode_stream(bytes: &[u8]) -> Vec<DecodedFrame> {
    let mut decoder: FrameDecoder<128> = FrameDecoder::new();
    let mut frames = Vec::new();
    for &byte in bytes {
        if let Some(frame) = decoder.push(byte).expect("captured stream must deframe") {
            frames.push(frame);
        }
    }
    frames
}

/// Count frames per wire type, indexed by the type identifier (1..=4).
pub fn count_by_wire_type(frames: &[DecodedFrame]) -> [usize; 5] {
    let mut counts = [0usize; 5];
    for frame in frames {
        counts[frame.wire_type as usize] += 1;
    }
    counts
}

/// Assert the global sequence counter increases by one per frame, mod 256.
pub fn assert_seq_monotonic(frames: &[DecodedFrame]) {
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.seq, (i % 256) as u8, "seq gap at frame {i}");
    }
}

/// Configuration with the built-in sources pushed out of the simulated
/// horizon, for scenarios that inject their own events.
pub fn quiet_config() -> ShaperConfig {
    ShaperConfig {
        sensor_period_ms: 1_000_000_000,
        hb_period_ms: 1_000_000_000,
        telem_period_ms: 1_000_000_000,
        ..ShaperConfig::default()
    }
}
