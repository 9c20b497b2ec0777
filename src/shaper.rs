//! The Shaping Core: Lowering Drive and Budgeted Flush Loop
//!
//! ## Overview
//!
//! [`Shaper`] ties the pipeline together and runs it one tick at a time:
//!
//! ```text
//! Sources → Event Queue → Lowering → Job Queue → Flush Loop → Framer → Sink
//! ```
//!
//! Each tick executes, in order:
//!
//! 1. **Sources**: fire due SENSOR/HB/TELEM generators into the event
//!    queue (window-coalesced).
//! 2. **Lowering**: drain the event queue exhaustively, stamping aging
//!    counters and emitting keep-last jobs.
//! 3. **Flush**: transmit jobs while a per-tick byte budget and the sink's
//!    free space allow, degrading when they do not.
//! 4. **Snapshot**: emit the stats line when the snapshot interval has
//!    elapsed.
//!
//! ## Degradation Model
//!
//! There is no priority queue. Priority is expressed entirely through the
//! decision taken when a frame does not fit the remaining budget:
//! telemetry is discarded, everything else is requeued for a later tick.
//! Requeued jobs coalesce with newer same-kind jobs, so under sustained
//! pressure each stream converges to its freshest value rather than a
//! backlog — the shaper is loss-tolerant and freshness-preferring by
//! design.
//!
//! ## Anti-spin Guard
//!
//! The flush loop breaks when an iteration neither transmits nor reduces
//! the budget; otherwise a requeued job would be popped again under the
//! same budget and the same decision, spinning forever within the tick.

use core::fmt::Write as _;

use heapless::String;

use crate::constants::buffers::{EVENT_QUEUE_CAPACITY, JOB_QUEUE_CAPACITY};
use crate::constants::link::{DEBUG_DUMP_TX_HEX, ENABLE_DEGRADE, OUT_MIN_FREE, TX_BUDGET_BYTES};
use crate::constants::time::{
    AGED_MS, COALESCE_WINDOW_MS, HB_PERIOD_MS, SENSOR_PERIOD_MS, SNAPSHOT_PERIOD_MS,
    TELEM_PERIOD_MS, TICK_MS,
};
use crate::constants::wire::{COBS_BLOCK, FRAME_CRC_LEN, FRAME_HEADER_LEN, MAX_WIRE_FRAME};
use crate::events::{EventKind, EventRecord};
use crate::frame::Framer;
use crate::jobs::{JobKind, JobRecord};
use crate::queue::{Admit, EventQueue, JobQueue};
use crate::sources::SourceScheduler;
use crate::stats::Stats;
use crate::time::elapsed_ms;
use crate::traits::{ByteSink, LogSink};

/// Runtime configuration of the shaping core.
///
/// `Default` mirrors the constants in [`crate::constants`]; tests and
/// platform layers override individual fields.
#[derive(Debug, Clone, Copy)]
pub struct ShaperConfig {
    /// Tick period in milliseconds; must be non-zero.
    pub tick_ms: u32,
    /// SENSOR source period in milliseconds.
    pub sensor_period_ms: u32,
    /// HB source period in milliseconds.
    pub hb_period_ms: u32,
    /// TELEM source period in milliseconds.
    pub telem_period_ms: u32,
    /// Event-queue merge window in milliseconds.
    pub coalesce_window_ms: u32,
    /// Observational aging threshold in milliseconds.
    pub aged_ms: u32,
    /// Per-tick transmit byte budget.
    pub tx_budget_bytes: u32,
    /// Discard telemetry (instead of requeueing) under budget pressure.
    pub enable_degrade: bool,
    /// Minimum sink free space required before transmitting.
    pub out_min_free: usize,
    /// Minimum interval between stats snapshot lines, in milliseconds.
    pub snapshot_period_ms: u32,
    /// Hex-dump each encoded frame to the log sink.
    pub debug_dump_tx_hex: bool,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            sensor_period_ms: SENSOR_PERIOD_MS,
            hb_period_ms: HB_PERIOD_MS,
            telem_period_ms: TELEM_PERIOD_MS,
            coalesce_window_ms: COALESCE_WINDOW_MS,
            aged_ms: AGED_MS,
            tx_budget_bytes: TX_BUDGET_BYTES,
            enable_degrade: ENABLE_DEGRADE,
            out_min_free: OUT_MIN_FREE,
            snapshot_period_ms: SNAPSHOT_PERIOD_MS,
            debug_dump_tx_hex: DEBUG_DUMP_TX_HEX,
        }
    }
}

/// The egress-shaping core.
///
/// Owns the staging queues, the stats block, the framer and the sinks.
/// Single-threaded by construction: every state transition happens inside
/// [`Shaper::tick`], which runs to completion.
pub struct Shaper<S: ByteSink, L: LogSink> {
    cfg: ShaperConfig,
    evq: EventQueue<EVENT_QUEUE_CAPACITY>,
    jobq: JobQueue<JOB_QUEUE_CAPACITY>,
    sources: SourceScheduler,
    framer: Framer,
    stats: Stats,
    budget_left: u32,
    last_snapshot_ms: u32,
    sink: S,
    log: L,
}

impl<S: ByteSink, L: LogSink> Shaper<S, L> {
    /// Create a shaper with default configuration, anchored at `start_ms`.
    pub fn new(sink: S, log: L, start_ms: u32) -> Self {
        Self::with_config(sink, log, ShaperConfig::default(), start_ms)
    }

    /// Create a shaper with an explicit configuration.
    pub fn with_config(sink: S, log: L, cfg: ShaperConfig, start_ms: u32) -> Self {
        debug_assert!(cfg.tick_ms > 0);
        Self {
            sources: SourceScheduler::new(
                start_ms,
                cfg.sensor_period_ms,
                cfg.hb_period_ms,
                cfg.telem_period_ms,
            ),
            cfg,
            evq: EventQueue::new(),
            jobq: JobQueue::new(),
            framer: Framer::new(),
            stats: Stats::new(),
            budget_left: 0,
            last_snapshot_ms: start_ms,
            sink,
            log,
        }
    }

    /// Run one full pass: sources, lowering, flush, snapshot.
    ///
    /// `now_ms` is the wrapping millisecond clock reading for this tick.
    pub fn tick(&mut self, now_ms: u32) {
        self.stats.tick += 1;
        self.run_sources(now_ms);
        self.lower_events(now_ms);
        self.flush();
        self.maybe_snapshot(now_ms);
    }

    /// Offer an externally produced event (commands, injected readings).
    ///
    /// Producers are never backpressured: the event either lands in the
    /// queue, replaces a queued sibling, or is dropped and counted.
    pub fn submit(&mut self, event: EventRecord) {
        self.admit_event(event);
    }

    /// Counter block.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Record the measured work time of the last tick (driver-supplied).
    pub fn record_work_us(&mut self, us: u32) {
        self.stats.record_work_us(us);
    }

    /// Active configuration.
    pub fn config(&self) -> &ShaperConfig {
        &self.cfg
    }

    /// Budget remaining after the most recent flush loop.
    pub fn budget_left(&self) -> u32 {
        self.budget_left
    }

    /// Current event queue depth.
    pub fn event_depth(&self) -> usize {
        self.evq.len()
    }

    /// Current job queue depth.
    pub fn job_depth(&self) -> usize {
        self.jobq.len()
    }

    /// Bitmap of queued wire types.
    pub fn dirty_mask(&self) -> u64 {
        self.jobq.dirty_mask()
    }

    /// Borrow the byte sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the byte sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Borrow the log sink.
    pub fn log(&self) -> &L {
        &self.log
    }

    fn run_sources(&mut self, now_ms: u32) {
        for event in self.sources.poll(now_ms) {
            match event.kind {
                EventKind::Sensor => self.stats.pick_sensor += 1,
                EventKind::Hb => self.stats.pick_hb += 1,
                EventKind::Telem => self.stats.pick_telem += 1,
                EventKind::Cmd => {}
            }
            self.admit_event(event);
        }
    }

    fn admit_event(&mut self, event: EventRecord) {
        self.stats.ev_in += 1;
        match self.evq.push_coalesce(event, self.cfg.coalesce_window_ms) {
            Admit::Stored => {}
            Admit::Merged => self.stats.ev_merge += 1,
            Admit::Dropped => self.stats.ev_drop += 1,
        }
    }

    fn admit_job(&mut self, job: JobRecord) {
        self.stats.job_in += 1;
        match self.jobq.push_coalesce(job) {
            Admit::Stored => {}
            Admit::Merged => self.stats.job_merge += 1,
            Admit::Dropped => self.stats.job_drop += 1,
        }
    }

    /// Drain the event queue, stamping aging counters and emitting jobs.
    fn lower_events(&mut self, now_ms: u32) {
        while let Some(event) = self.evq.pop() {
            self.stats.ev_out += 1;

            if elapsed_ms(now_ms, event.t_ms) >= self.cfg.aged_ms {
                self.stats.pick_aged += 1;
                match event.kind {
                    EventKind::Sensor => self.stats.aged_hit_sensor += 1,
                    EventKind::Hb => self.stats.aged_hit_hb += 1,
                    EventKind::Telem => self.stats.aged_hit_telem += 1,
                    EventKind::Cmd => {}
                }
            }

            self.admit_job(JobRecord::lower(&event, now_ms));
        }
    }

    /// Transmit queued jobs within this tick's byte budget.
    fn flush(&mut self) {
        self.budget_left = self.cfg.tx_budget_bytes;
        let mut sent_any = false;

        while self.budget_left > 0 && !self.jobq.is_empty() {
            let budget_before = self.budget_left;
            let sent = self.flush_one();
            sent_any |= sent;
            if !sent && self.budget_left == budget_before {
                break;
            }
        }

        if sent_any {
            if self.jobq.is_empty() {
                self.stats.flush_full += 1;
            } else {
                self.stats.flush_partial += 1;
            }
        }
    }

    /// Attempt to transmit one job. Returns true iff a frame was sent.
    fn flush_one(&mut self) -> bool {
        self.stats.flush_try += 1;

        let job = match self.jobq.pop() {
            Some(job) => job,
            None => return false,
        };
        self.stats.job_out += 1;

        // Conservative upper bound on the on-wire size: pre-frame plus
        // worst-case COBS overhead plus the delimiter.
        let decoded_len = (FRAME_HEADER_LEN + job.len() + FRAME_CRC_LEN) as u32;
        let overhead = decoded_len / COBS_BLOCK as u32 + 2;
        let worst = decoded_len + overhead + 1;

        if worst > self.budget_left {
            self.stats.uart_skip_budget += 1;
            if self.cfg.enable_degrade && job.kind == JobKind::Telem {
                self.stats.degrade_drop += 1;
            } else {
                self.requeue(job);
            }
            return false;
        }

        if self.sink.available_for_write() < self.cfg.out_min_free {
            self.stats.uart_skip_txbuf += 1;
            self.requeue(job);
            return false;
        }

        let mut wire = [0u8; MAX_WIRE_FRAME];
        match self.framer.encode(job.kind.wire_type(), job.payload(), &mut wire) {
            Ok(written) => {
                self.sink.write(&wire[..written]);
                self.budget_left -= written as u32;
                self.stats.uart_sent += 1;
                self.stats.uart_bytes += written as u32;
                self.stats.out_bytes_total += written as u32;
                self.stats.flush_ok += 1;
                if self.cfg.debug_dump_tx_hex {
                    self.dump_tx_hex(&wire[..written]);
                }
                true
            }
            Err(_) => {
                self.requeue(job);
                false
            }
        }
    }

    /// Push a deferred job back through keep-last coalescing.
    ///
    /// A newer same-kind job may already be queued; the deferred one is
    /// then replaced, which is the intended freshness-over-completeness
    /// outcome.
    fn requeue(&mut self, job: JobRecord) {
        self.stats.degrade_requeue += 1;
        self.admit_job(job);
    }

    fn maybe_snapshot(&mut self, now_ms: u32) {
        if elapsed_ms(now_ms, self.last_snapshot_ms) < self.cfg.snapshot_period_ms {
            return;
        }
        self.last_snapshot_ms = now_ms;

        let mut line: String<512> = String::new();
        let _ = self.stats.format_line(
            self.evq.len(),
            self.jobq.len(),
            self.jobq.dirty_mask(),
            &mut line,
        );
        let _ = line.push('\n');
        self.log.write(&line);
        self.stats.log_bytes_total += line.len() as u32;
    }

    fn dump_tx_hex(&mut self, frame: &[u8]) {
        let mut line: String<256> = String::new();
        let _ = write!(line, "tx[{}]=", frame.len());
        for byte in frame {
            let _ = write!(line, "{:02x}", byte);
        }
        let _ = line.push('\n');
        self.log.write(&line);
        self.stats.log_bytes_total += line.len() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestSink {
        bytes: Vec<u8>,
        free: usize,
    }

    impl TestSink {
        fn ready() -> Self {
            Self {
                bytes: Vec::new(),
                free: 4096,
            }
        }
    }

    impl ByteSink for TestSink {
        fn write(&mut self, bytes: &[u8]) {
            self.bytes.extend_from_slice(bytes);
        }

        fn available_for_write(&self) -> usize {
            self.free
        }
    }

    struct TestLog(Vec<std::string::String>);

    impl LogSink for TestLog {
        fn write(&mut self, text: &str) {
            self.0.push(text.into());
        }
    }

    /// Config with the built-in sources effectively disabled, for tests
    /// that inject their own events.
    fn quiet_config() -> ShaperConfig {
        ShaperConfig {
            sensor_period_ms: 1_000_000_000,
            hb_period_ms: 1_000_000_000,
            telem_period_ms: 1_000_000_000,
            ..ShaperConfig::default()
        }
    }

    fn quiet_shaper() -> Shaper<TestSink, TestLog> {
        let mut cfg = quiet_config();
        cfg.snapshot_period_ms = 1_000_000_000;
        Shaper::with_config(TestSink::ready(), TestLog(Vec::new()), cfg, 0)
    }

    fn cmd(t_ms: u32, payload: &[u8]) -> EventRecord {
        EventRecord::new(EventKind::Cmd, 0, t_ms, payload).unwrap()
    }

    #[test]
    fn tick_with_no_work_touches_only_the_tick_counter() {
        let mut shaper = quiet_shaper();
        shaper.tick(0);
        let before = *shaper.stats();

        shaper.tick(20);

        let mut expected = before;
        expected.tick += 1;
        assert_eq!(*shaper.stats(), expected, "idle flush must not touch counters");
    }

    #[test]
    fn submitted_command_is_framed_same_tick() {
        let mut shaper = quiet_shaper();
        shaper.submit(cmd(0, &[0x42]));
        shaper.tick(0);

        assert_eq!(shaper.stats().uart_sent, 1);
        assert_eq!(shaper.stats().flush_full, 1);
        assert_eq!(shaper.job_depth(), 0);
        assert_eq!(
            shaper.stats().uart_bytes as usize,
            shaper.sink().bytes.len()
        );
    }

    #[test]
    fn blocked_sink_defers_and_requeues() {
        let mut shaper = quiet_shaper();
        shaper.sink_mut().free = 0;
        shaper.submit(cmd(0, &[0x42]));
        shaper.tick(0);

        let stats = shaper.stats();
        assert_eq!(stats.uart_sent, 0);
        assert_eq!(stats.uart_skip_txbuf, 1);
        assert_eq!(stats.degrade_requeue, 1);
        assert_eq!(shaper.job_depth(), 1);

        // Restore the sink; the deferred job goes out next tick.
        shaper.sink_mut().free = 4096;
        shaper.tick(20);
        assert_eq!(shaper.stats().uart_sent, 1);
        assert_eq!(shaper.job_depth(), 0);
    }

    #[test]
    fn budget_below_minimum_frame_sends_nothing() {
        let mut cfg = quiet_config();
        cfg.snapshot_period_ms = 1_000_000_000;
        cfg.tx_budget_bytes = 5;
        let mut shaper = Shaper::with_config(TestSink::ready(), TestLog(Vec::new()), cfg, 0);

        shaper.submit(cmd(0, &[0x42]));
        shaper.tick(0);

        let stats = shaper.stats();
        assert_eq!(stats.uart_sent, 0);
        assert_eq!(stats.flush_ok, 0);
        assert_eq!(stats.uart_skip_budget, 1);
        assert_eq!(stats.degrade_requeue, 1);
        assert_eq!(shaper.budget_left(), 5);
        // The anti-spin guard limited the loop to a single attempt.
        assert_eq!(stats.flush_try, 1);
    }

    #[test]
    fn telemetry_is_dropped_under_budget_pressure() {
        let mut cfg = quiet_config();
        cfg.snapshot_period_ms = 1_000_000_000;
        cfg.tx_budget_bytes = 5;
        let mut shaper = Shaper::with_config(TestSink::ready(), TestLog(Vec::new()), cfg, 0);

        let telem = EventRecord::new(EventKind::Telem, 0, 0, &[1, 2, 3, 4]).unwrap();
        shaper.submit(telem);
        shaper.tick(0);

        let stats = shaper.stats();
        assert_eq!(stats.uart_skip_budget, 1);
        assert_eq!(stats.degrade_drop, 1);
        assert_eq!(stats.degrade_requeue, 0);
        assert_eq!(shaper.job_depth(), 0, "degraded telemetry is discarded");
    }

    #[test]
    fn degrade_disabled_requeues_telemetry() {
        let mut cfg = quiet_config();
        cfg.snapshot_period_ms = 1_000_000_000;
        cfg.tx_budget_bytes = 5;
        cfg.enable_degrade = false;
        let mut shaper = Shaper::with_config(TestSink::ready(), TestLog(Vec::new()), cfg, 0);

        let telem = EventRecord::new(EventKind::Telem, 0, 0, &[1, 2, 3, 4]).unwrap();
        shaper.submit(telem);
        shaper.tick(0);

        assert_eq!(shaper.stats().degrade_drop, 0);
        assert_eq!(shaper.stats().degrade_requeue, 1);
        assert_eq!(shaper.job_depth(), 1);
    }

    #[test]
    fn aged_events_bump_observational_counters() {
        let mut shaper = quiet_shaper();
        let old = EventRecord::new(EventKind::Sensor, 0, 0, &[1, 2]).unwrap();
        shaper.submit(old);
        // Lowered 300 ms after production: past the aging threshold.
        shaper.tick(300);

        let stats = shaper.stats();
        assert_eq!(stats.pick_aged, 1);
        assert_eq!(stats.aged_hit_sensor, 1);
        assert_eq!(stats.aged_hit_hb, 0);
        // Aging is observational: the frame still went out normally.
        assert_eq!(stats.uart_sent, 1);
    }

    #[test]
    fn snapshot_line_is_rate_limited() {
        let cfg = quiet_config();
        let mut shaper = Shaper::with_config(TestSink::ready(), TestLog(Vec::new()), cfg, 0);

        shaper.tick(0);
        shaper.tick(20);
        assert!(shaper.log().0.is_empty());

        shaper.tick(200);
        assert_eq!(shaper.log().0.len(), 1);
        let line = &shaper.log().0[0];
        assert!(line.starts_with("tick="));
        assert!(line.ends_with('\n'));
        assert_eq!(shaper.stats().log_bytes_total as usize, line.len());

        // Next window opens 200 ms after the last emission.
        shaper.tick(220);
        assert_eq!(shaper.log().0.len(), 1);
        shaper.tick(400);
        assert_eq!(shaper.log().0.len(), 2);
    }

    #[test]
    fn hex_dump_logs_encoded_frames() {
        let mut cfg = quiet_config();
        cfg.snapshot_period_ms = 1_000_000_000;
        cfg.debug_dump_tx_hex = true;
        let mut shaper = Shaper::with_config(TestSink::ready(), TestLog(Vec::new()), cfg, 0);

        shaper.submit(cmd(0, &[0xAB]));
        shaper.tick(0);

        assert_eq!(shaper.log().0.len(), 1);
        let dump = &shaper.log().0[0];
        assert!(dump.starts_with("tx["));
        assert_eq!(
            shaper.stats().log_bytes_total as usize,
            dump.len(),
            "hex dump bytes are accounted"
        );
    }

    #[test]
    fn event_conservation_holds() {
        let mut shaper = quiet_shaper();
        for i in 0..10u8 {
            shaper.submit(cmd(0, &[i]));
        }
        let stats = shaper.stats();
        assert_eq!(
            stats.ev_in,
            stats.ev_out + stats.ev_merge + stats.ev_drop + shaper.event_depth() as u32
        );
        assert_eq!(stats.ev_drop, 2, "capacity-8 queue drops the overflow");

        shaper.tick(0);
        let stats = shaper.stats();
        assert_eq!(
            stats.ev_in,
            stats.ev_out + stats.ev_merge + stats.ev_drop + shaper.event_depth() as u32
        );
        assert_eq!(
            stats.job_in,
            stats.job_out + stats.job_merge + stats.job_drop + shaper.job_depth() as u32
        );
    }
}
