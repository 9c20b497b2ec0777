//! Event Types Entering the Staging Pipeline
//!
//! ## Overview
//!
//! Events are the producer-facing records of the core: small, fixed-size,
//! stack-allocated structs carrying a kind, a wrapping millisecond
//! timestamp and up to 16 payload bytes. Producers emit them without
//! backpressure; the staging queues decide what survives.
//!
//! ## Coalescing Policy
//!
//! Each kind carries its admission policy:
//!
//! - `CMD`: every instance is preserved until the queue is full. Commands
//!   are externally originated and individually meaningful.
//! - `SENSOR`, `HB`, `TELEM`: merge-last within a time window. These are
//!   state streams where only the freshest value matters; an older queued
//!   value is replaced in place by a newer arrival.
//!
//! ## Memory Model
//!
//! `EventRecord` is `Copy` and 24 bytes, so queue slots are plain arrays
//! and coalescing is a struct assignment. No heap, no pointers.

use crate::constants::buffers::MAX_EVENT_PAYLOAD;

/// Kind of a producer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    /// Externally originated command.
    Cmd = 0,
    /// Periodic sensor sample.
    Sensor = 1,
    /// Liveness heartbeat.
    Hb = 2,
    /// Low-priority telemetry.
    Telem = 3,
}

impl EventKind {
    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            EventKind::Cmd => "cmd",
            EventKind::Sensor => "sensor",
            EventKind::Hb => "hb",
            EventKind::Telem => "telem",
        }
    }

    /// Tag byte placed at the front of a lowered job payload.
    pub const fn tag(&self) -> u8 {
        match self {
            EventKind::Sensor => 0x01,
            EventKind::Hb => 0x02,
            EventKind::Telem => 0x03,
            EventKind::Cmd => 0x04,
        }
    }

    /// Admission policy at the event queue.
    pub const fn policy(&self) -> CoalescePolicy {
        match self {
            EventKind::Cmd => CoalescePolicy::Preserve,
            _ => CoalescePolicy::MergeLast,
        }
    }
}

/// How the event queue treats a new arrival of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescePolicy {
    /// Keep every instance until the queue is full.
    Preserve,
    /// Replace a queued same-kind event within the merge window.
    MergeLast,
}

/// A producer event staged for lowering.
#[derive(Debug, Clone, Copy)]
pub struct EventRecord {
    /// Event kind; selects the coalescing policy and the job mapping.
    pub kind: EventKind,
    /// Producer-defined flag bits, carried through to the job unchanged.
    pub flags: u8,
    /// Producer timestamp (wrapping milliseconds); drives coalescing and
    /// aging.
    pub t_ms: u32,
    len: u8,
    payload: [u8; MAX_EVENT_PAYLOAD],
}

impl EventRecord {
    /// Build an event, copying `payload` inline.
    ///
    /// Returns `None` when the payload exceeds [`MAX_EVENT_PAYLOAD`].
    pub fn new(kind: EventKind, flags: u8, t_ms: u32, payload: &[u8]) -> Option<Self> {
        if payload.len() > MAX_EVENT_PAYLOAD {
            return None;
        }
        let mut data = [0u8; MAX_EVENT_PAYLOAD];
        data[..payload.len()].copy_from_slice(payload);
        Some(Self {
            kind,
            flags,
            t_ms,
            len: payload.len() as u8,
            payload: data,
        })
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len as usize]
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
