//! Multicast ingest: gap detection, synchronous recovery, ordered delivery.
//!
//! The subscriber keeps a single `expected_seq` cursor. Anything arriving in
//! order is delivered immediately; a jump forward opens a gap that is
//! repaired sequence-by-sequence over the retransmit channel *before* the
//! triggering tick is delivered, so the consumer always sees strictly
//! ascending sequences. Recovery is deliberately blocking: the kernel socket
//! buffer absorbs the multicast stream while a gap is being repaired.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use tickcast_core::clock;
use tickcast_core::latency::LatencyWindow;
use tickcast_core::protocol::{TICK_WIRE_SIZE, Tick};

use crate::recovery::RecoveryClient;

/// Receives the ordered, gap-free stream.
///
/// `on_tick` observes strictly ascending sequences with at most one
/// contiguous run of permanently lost ticks per gap. `finish` is called once
/// at shutdown for end-of-session accounting.
pub trait TickConsumer {
    fn on_tick(&mut self, tick: &Tick);
    fn finish(&mut self) {}
}

/// The ordering state machine plus its observability counters.
pub struct Subscriber<C, R> {
    consumer: C,
    recovery: R,
    /// Next in-order sequence; 0 until the first packet synchronizes it.
    expected_seq: u64,
    latency: LatencyWindow,
    received_this_sec: u64,
    last_tick: Option<Tick>,
}

impl<C: TickConsumer, R: RecoveryClient> Subscriber<C, R> {
    pub fn new(consumer: C, recovery: R) -> Self {
        Self {
            consumer,
            recovery,
            expected_seq: 0,
            latency: LatencyWindow::new(),
            received_this_sec: 0,
            last_tick: None,
        }
    }

    /// Drive the ingest loop until `shutdown` is raised, then close out the
    /// session through the consumer.
    pub fn run(&mut self, socket: &UdpSocket, shutdown: &AtomicBool) -> Result<()> {
        let mut buf = [0u8; 2 * TICK_WIRE_SIZE];
        let mut last_report = Instant::now();

        while !shutdown.load(Ordering::Relaxed) {
            match socket.recv(&mut buf) {
                Ok(n) => self.handle_datagram(&buf[..n]),
                // Read timeout: just an opportunity to observe the flag.
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) => {}
                Err(e) => return Err(e.into()),
            }

            if last_report.elapsed() >= Duration::from_secs(1) {
                self.report_metrics();
                last_report = Instant::now();
            }
        }

        info!("shutdown requested, closing out session");
        self.consumer.finish();
        Ok(())
    }

    /// Apply one datagram to the ordering state machine.
    pub fn handle_datagram(&mut self, datagram: &[u8]) {
        if datagram.len() != TICK_WIRE_SIZE {
            debug!("discarding {}-byte datagram", datagram.len());
            return;
        }
        let tick = match Tick::decode(datagram) {
            Ok(t) => t,
            Err(e) => {
                debug!("discarding undecodable datagram: {e}");
                return;
            }
        };

        if self.expected_seq == 0 {
            // First packet synchronizes the cursor wherever the stream is.
            self.deliver(&tick);
            self.expected_seq = tick.seq + 1;
        } else if tick.seq == self.expected_seq {
            self.deliver(&tick);
            self.expected_seq = tick.seq + 1;
        } else if tick.seq > self.expected_seq {
            warn!("gap detected: expected {}, got {}", self.expected_seq, tick.seq);
            self.recover_range(self.expected_seq, tick.seq);
            self.deliver(&tick);
            self.expected_seq = tick.seq + 1;
        } else {
            // Duplicate, or a late copy of something already repaired.
            debug!("discarding stale seq={} (cursor at {})", tick.seq, self.expected_seq);
        }
    }

    /// Repair `[from, to)` in ascending order, delivering each recovered
    /// tick. Unrecoverable sequences leave a permanent gap the consumer must
    /// tolerate.
    fn recover_range(&mut self, from: u64, to: u64) {
        for missed in from..to {
            match self.recovery.fetch(missed) {
                Some(tick) => self.deliver(&tick),
                None => warn!("seq={missed} permanently lost"),
            }
        }
    }

    fn deliver(&mut self, tick: &Tick) {
        let now = clock::monotonic_ns();
        self.latency.record_ns(now.saturating_sub(tick.timestamp_ns));
        self.received_this_sec += 1;
        self.last_tick = Some(*tick);
        self.consumer.on_tick(tick);
    }

    fn report_metrics(&mut self) {
        if let Some(stats) = self.latency.snapshot()
            && let Some(t) = self.last_tick
        {
            info!(
                "{} msgs/sec, latency {stats}, last {} @ {:.2}",
                self.received_this_sec,
                t.symbol_str(),
                t.price,
            );
        }
        self.latency.reset();
        self.received_this_sec = 0;
    }

    /// Next sequence the cursor expects (0 before synchronization).
    pub fn expected_seq(&self) -> u64 {
        self.expected_seq
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }
}
