//! Job Types: Lowered, Ready-to-Transmit Work Items
//!
//! A job is what an event becomes once the lowering stage has stamped it
//! for the wire: the kind maps 1:1 to a wire type identifier, the payload
//! gains a two-byte header (`[tag, original_event_len]`), and the
//! timestamp is rewritten to the lowering tick. Jobs live in the job queue
//! across ticks until the flush loop emits or discards them.

use crate::constants::buffers::MAX_JOB_PAYLOAD;
use crate::events::{EventKind, EventRecord};

/// Kind of a lowered job. The discriminant is the wire type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JobKind {
    /// Command frame.
    Cmd = 1,
    /// Sensor sample frame.
    Sensor = 2,
    /// Heartbeat frame.
    Hb = 3,
    /// Telemetry frame; lowest priority, first to be degraded.
    Telem = 4,
}

impl JobKind {
    /// Wire type identifier carried in the frame header.
    pub const fn wire_type(&self) -> u8 {
        *self as u8
    }

    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            JobKind::Cmd => "cmd",
            JobKind::Sensor => "sensor",
            JobKind::Hb => "hb",
            JobKind::Telem => "telem",
        }
    }
}

impl From<EventKind> for JobKind {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Cmd => JobKind::Cmd,
            EventKind::Sensor => JobKind::Sensor,
            EventKind::Hb => JobKind::Hb,
            EventKind::Telem => JobKind::Telem,
        }
    }
}

/// A unit of transmit work staged for the flush loop.
#[derive(Debug, Clone, Copy)]
pub struct JobRecord {
    /// Job kind; selects the wire type and the degradation decision.
    pub kind: JobKind,
    /// Flag bits copied from the source event.
    pub flags: u8,
    /// Lowering timestamp (wrapping milliseconds).
    pub t_ms: u32,
    len: u8,
    payload: [u8; MAX_JOB_PAYLOAD],
}

impl JobRecord {
    /// Lower an event into a job at time `now_ms`.
    ///
    /// The job payload is `[tag, original_event_len, event payload...]`,
    /// with the event payload truncated to the space remaining after the
    /// two-byte header. The original length byte is preserved even when
    /// truncation occurs, so the receiver can detect it.
    pub fn lower(event: &EventRecord, now_ms: u32) -> Self {
        let src = event.payload();
        let copy = src.len().min(MAX_JOB_PAYLOAD - 2);

        let mut data = [0u8; MAX_JOB_PAYLOAD];
        data[0] = event.kind.tag();
        data[1] = src.len() as u8;
        data[2..2 + copy].copy_from_slice(&src[..copy]);

        Self {
            kind: JobKind::from(event.kind),
            flags: event.flags,
            t_ms: now_ms,
            len: (2 + copy) as u8,
            payload: data,
        }
    }

    /// Payload bytes (lowering header included).
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len as usize]
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True when the payload is empty (never the case for lowered jobs).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
