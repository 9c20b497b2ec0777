//! Observability: the Flat Counter Block
//!
//! ## Overview
//!
//! Every decision the core makes is visible as a counter increment: each
//! admitted input ends in exactly one of `{out, merge, drop}`, each flush
//! attempt in exactly one of `{sent, skip_budget, skip_txbuf}`. The
//! counters are plain `u32`, monotonic, and reset only at boot; the
//! single-threaded tick model makes atomics unnecessary.
//!
//! Two conservation identities hold at every observation point and are the
//! backbone of the integration tests:
//!
//! ```text
//! ev_in  = ev_out  + ev_merge  + ev_drop  + event queue depth
//! job_in = job_out + job_merge + job_drop + job queue depth
//! ```
//!
//! ## Snapshot Line
//!
//! [`Stats::format_line`] renders every counter plus the live queue depths
//! and dirty mask into one log line. The shaping core emits it at most
//! once per `SNAPSHOT_PERIOD_MS`; it is the primary diagnostic channel.

use core::fmt;

/// Monotonic counters and work-time gauges for the whole core.
///
/// Counter names are stable: downstream log parsers key on them. In
/// particular the `pick_*` counters count source *fires*, not
/// transmissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Ticks executed.
    pub tick: u32,

    /// Events offered to the event queue.
    pub ev_in: u32,
    /// Events drained by the lowering stage.
    pub ev_out: u32,
    /// Events replaced in place by a newer same-kind arrival.
    pub ev_merge: u32,
    /// Events rejected because the event queue was full.
    pub ev_drop: u32,

    /// Jobs offered to the job queue (requeues included).
    pub job_in: u32,
    /// Jobs popped by the flush loop.
    pub job_out: u32,
    /// Jobs replaced in place by a newer same-kind job.
    pub job_merge: u32,
    /// Jobs rejected because the job queue was full.
    pub job_drop: u32,

    /// Frames written to the byte sink.
    pub uart_sent: u32,
    /// Transmit attempts deferred by the byte budget.
    pub uart_skip_budget: u32,
    /// Transmit attempts deferred by sink free space.
    pub uart_skip_txbuf: u32,
    /// Total frame bytes written to the byte sink.
    pub uart_bytes: u32,

    /// Flush iterations entered.
    pub flush_try: u32,
    /// Flush iterations that transmitted a frame.
    pub flush_ok: u32,
    /// Ticks that sent at least one frame but left jobs queued.
    pub flush_partial: u32,
    /// Ticks that sent at least one frame and drained the job queue.
    pub flush_full: u32,

    /// SENSOR source fires.
    pub pick_sensor: u32,
    /// HB source fires.
    pub pick_hb: u32,
    /// TELEM source fires.
    pub pick_telem: u32,
    /// Events observed older than the aging threshold at lowering.
    pub pick_aged: u32,

    /// Aged SENSOR events observed at lowering.
    pub aged_hit_sensor: u32,
    /// Aged HB events observed at lowering.
    pub aged_hit_hb: u32,
    /// Aged TELEM events observed at lowering.
    pub aged_hit_telem: u32,

    /// Telemetry jobs discarded under budget pressure.
    pub degrade_drop: u32,
    /// Jobs pushed back for a later tick.
    pub degrade_requeue: u32,

    /// Microseconds spent in the most recent tick.
    pub work_us_last: u32,
    /// High-water mark of per-tick work time in microseconds.
    pub work_us_max: u32,

    /// Total bytes handed to the byte sink.
    pub out_bytes_total: u32,
    /// Total bytes handed to the log sink.
    pub log_bytes_total: u32,
}

impl Stats {
    /// All-zero counter block, as at boot.
    pub const fn new() -> Self {
        Self {
            tick: 0,
            ev_in: 0,
            ev_out: 0,
            ev_merge: 0,
            ev_drop: 0,
            job_in: 0,
            job_out: 0,
            job_merge: 0,
            job_drop: 0,
            uart_sent: 0,
            uart_skip_budget: 0,
            uart_skip_txbuf: 0,
            uart_bytes: 0,
            flush_try: 0,
            flush_ok: 0,
            flush_partial: 0,
            flush_full: 0,
            pick_sensor: 0,
            pick_hb: 0,
            pick_telem: 0,
            pick_aged: 0,
            aged_hit_sensor: 0,
            aged_hit_hb: 0,
            aged_hit_telem: 0,
            degrade_drop: 0,
            degrade_requeue: 0,
            work_us_last: 0,
            work_us_max: 0,
            out_bytes_total: 0,
            log_bytes_total: 0,
        }
    }

    /// Record the work time of one tick, updating the high-water mark.
    pub fn record_work_us(&mut self, us: u32) {
        self.work_us_last = us;
        if us > self.work_us_max {
            self.work_us_max = us;
        }
    }

    /// Render the snapshot line.
    ///
    /// Queue depths and the dirty mask are live values owned by the
    /// shaping core and passed in at render time.
    pub fn format_line(
        &self,
        evq_depth: usize,
        jobq_depth: usize,
        dirty: u64,
        out: &mut dyn fmt::Write,
    ) -> fmt::Result {
        write!(
            out,
            "tick={} ev={}/{}/{}/{} evQ={} job={}/{}/{}/{} jobQ={} dirty={:#018x} \
             uart={}/{}/{}/{} flush={}/{}/{}/{} pick={}/{}/{}/{} aged={}/{}/{} \
             degrade={}/{} work_us={}/{} out={} log={}",
            self.tick,
            self.ev_in,
            self.ev_out,
            self.ev_merge,
            self.ev_drop,
            evq_depth,
            self.job_in,
            self.job_out,
            self.job_merge,
            self.job_drop,
            jobq_depth,
            dirty,
            self.uart_sent,
            self.uart_skip_budget,
            self.uart_skip_txbuf,
            self.uart_bytes,
            self.flush_try,
            self.flush_ok,
            self.flush_partial,
            self.flush_full,
            self.pick_sensor,
            self.pick_hb,
            self.pick_telem,
            self.pick_aged,
            self.aged_hit_sensor,
            self.aged_hit_hb,
            self.aged_hit_telem,
            self.degrade_drop,
            self.degrade_requeue,
            self.work_us_last,
            self.work_us_max,
            self.out_bytes_total,
            self.log_bytes_total,
        )
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}
