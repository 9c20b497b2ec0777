//! Constants for the shaping core
//!
//! All tunable numeric values live here with documentation of their purpose
//! and rationale. Constants are grouped by domain:
//!
//! - **Time**: tick cadence, source periods, coalescing and aging windows
//! - **Wire**: frame layout, CRC parameters, COBS sizing
//! - **Link**: per-tick byte budget and sink free-space gating
//! - **Buffers**: queue capacities and payload limits
//!
//! Use these constants instead of magic numbers. Runtime-tunable values are
//! mirrored in [`crate::shaper::ShaperConfig`], whose `Default` reads from
//! this module.

/// Tick cadence, source periods, coalescing/aging windows.
pub mod time;

/// Frame layout, CRC parameters, COBS sizing.
pub mod wire;

/// Per-tick byte budget and sink free-space gating.
pub mod link;

/// Queue capacities and payload limits.
pub mod buffers;

// Re-export the commonly used constants for convenience
pub use time::{
    AGED_MS, COALESCE_WINDOW_MS, HB_PERIOD_MS, SENSOR_PERIOD_MS, SNAPSHOT_PERIOD_MS,
    TELEM_PERIOD_MS, TICK_MS,
};

pub use wire::{
    COBS_BLOCK, COBS_DELIM, FRAME_CRC_LEN, FRAME_HEADER_LEN, FRAME_SOF, MAX_DECODED_FRAME,
    MAX_FRAME_PAYLOAD, MAX_WIRE_FRAME,
};

pub use link::{ENABLE_DEGRADE, OUT_MIN_FREE, TX_BUDGET_BYTES};

pub use buffers::{
    EVENT_QUEUE_CAPACITY, JOB_QUEUE_CAPACITY, MAX_EVENT_PAYLOAD, MAX_JOB_PAYLOAD,
};
