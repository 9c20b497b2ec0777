//! Periodic Built-in Sources
//!
//! Three pseudo-sources generate the steady-state traffic: SENSOR samples,
//! HB liveness beats and TELEM snapshots. Each keeps a next-fire timestamp
//! and fires when the tick's `now_ms` has reached it (signed wraparound
//! comparison), then schedules `now + period`.
//!
//! Rescheduling from `now` rather than from the missed deadline means a
//! delayed tick shifts the phase of a source instead of bursting it; the
//! tick driver's catch-up loop is what preserves the overall cadence.

use heapless::Vec;

use crate::events::{EventKind, EventRecord};
use crate::time::time_reached;

/// Fixed-cadence generator for the three built-in streams.
#[derive(Debug, Clone)]
pub struct SourceScheduler {
    sensor_period_ms: u32,
    hb_period_ms: u32,
    telem_period_ms: u32,
    t_next_sensor: u32,
    t_next_hb: u32,
    t_next_telem: u32,
}

impl SourceScheduler {
    /// Create a scheduler with each source due one period after
    /// `start_ms`.
    pub fn new(start_ms: u32, sensor_period_ms: u32, hb_period_ms: u32, telem_period_ms: u32) -> Self {
        Self {
            sensor_period_ms,
            hb_period_ms,
            telem_period_ms,
            t_next_sensor: start_ms.wrapping_add(sensor_period_ms),
            t_next_hb: start_ms.wrapping_add(hb_period_ms),
            t_next_telem: start_ms.wrapping_add(telem_period_ms),
        }
    }

    /// Fire every source whose deadline has passed, returning the produced
    /// events in source order (sensor, hb, telem).
    pub fn poll(&mut self, now_ms: u32) -> Vec<EventRecord, 3> {
        let mut fired = Vec::new();

        if time_reached(now_ms, self.t_next_sensor) {
            self.t_next_sensor = now_ms.wrapping_add(self.sensor_period_ms);
            let sample = ((now_ms / 10) & 0xFFFF) as u16;
            if let Some(ev) = EventRecord::new(EventKind::Sensor, 0, now_ms, &sample.to_le_bytes())
            {
                let _ = fired.push(ev);
            }
        }

        if time_reached(now_ms, self.t_next_hb) {
            self.t_next_hb = now_ms.wrapping_add(self.hb_period_ms);
            if let Some(ev) = EventRecord::new(EventKind::Hb, 0, now_ms, &[0x01]) {
                let _ = fired.push(ev);
            }
        }

        if time_reached(now_ms, self.t_next_telem) {
            self.t_next_telem = now_ms.wrapping_add(self.telem_period_ms);
            if let Some(ev) = EventRecord::new(EventKind::Telem, 0, now_ms, &now_ms.to_le_bytes()) {
                let _ = fired.push(ev);
            }
        }

        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fire_is_one_period_out() {
        let mut sched = SourceScheduler::new(0, 80, 200, 1000);
        assert!(sched.poll(0).is_empty());
        assert!(sched.poll(60).is_empty());

        let fired = sched.poll(80);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, EventKind::Sensor);
    }

    #[test]
    fn cadences_are_honored() {
        let mut sched = SourceScheduler::new(0, 80, 200, 1000);
        sched.poll(80);

        assert!(sched.poll(140).is_empty());

        let fired = sched.poll(160);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, EventKind::Sensor);

        let fired = sched.poll(240);
        let kinds: Vec<EventKind, 3> = fired.iter().map(|e| e.kind).collect();
        assert_eq!(&kinds[..], &[EventKind::Sensor, EventKind::Hb]);
    }

    #[test]
    fn delayed_poll_shifts_phase() {
        let mut sched = SourceScheduler::new(0, 80, 1_000_000, 1_000_000);
        // Sensor was due at 80; the delayed fire reschedules from 130.
        let fired = sched.poll(130);
        assert_eq!(fired.len(), 1);
        assert!(sched.poll(200).is_empty());
        assert_eq!(sched.poll(210).len(), 1);
    }

    #[test]
    fn payload_encodings() {
        let mut sched = SourceScheduler::new(0, 80, 200, 1000);
        let fired = sched.poll(1250);

        let sensor = &fired[0];
        assert_eq!(sensor.payload(), &125u16.to_le_bytes());

        let hb = &fired[1];
        assert_eq!(hb.payload(), &[0x01]);

        let telem = &fired[2];
        assert_eq!(telem.payload(), &1250u32.to_le_bytes());
    }

    #[test]
    fn fires_across_rollover() {
        let start = u32::MAX - 30;
        let mut sched = SourceScheduler::new(start, 80, 200, 1000);
        // Sensor deadline wrapped to 49; not due right before the rollover.
        assert!(sched.poll(start).is_empty());
        let fired = sched.poll(60);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, EventKind::Sensor);
    }
}
