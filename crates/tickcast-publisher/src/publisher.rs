//! Publisher event loop: paced tick emission, bounded history, and the
//! retransmission side-channel multiplexed on one thread.
//!
//! All mutation of the ring and the tick source happens on this thread, so
//! the ring's no-concurrent-access assumption holds by construction.

use std::net::{SocketAddr, SocketAddrV4, TcpListener, UdpSocket};
use std::os::fd::AsRawFd;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};

use tickcast_core::clock;
use tickcast_core::config::PublisherConfig;
use tickcast_core::net;
use tickcast_core::poll::EventLoop;
use tickcast_core::protocol::Tick;
use tickcast_core::ring::SeqRing;

use crate::retrans;
use crate::source::TickSource;

/// Event-loop source tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wakeup {
    RetransListener,
    TickBatch,
    Metrics,
}

/// The publisher process state: sockets, history, and the tick source.
pub struct Publisher {
    cfg: PublisherConfig,
    udp: UdpSocket,
    dest: SocketAddr,
    listener: TcpListener,
    ring: SeqRing<Tick>,
    source: TickSource,
    sent_this_sec: u64,
    last_tick: Option<Tick>,
}

impl Publisher {
    /// Bind all sockets and build the initial state. Setup errors are fatal.
    pub fn new(cfg: PublisherConfig) -> Result<Self> {
        let udp = net::multicast_sender(cfg.multicast_ttl)?;
        let dest = SocketAddr::V4(SocketAddrV4::new(cfg.group, cfg.mcast_port));
        let listener = net::retrans_listener(cfg.retrans_port)?;
        info!(
            "broadcasting to {dest}, serving retransmits on port {}, history depth {}",
            cfg.retrans_port, cfg.ring_capacity,
        );

        let ring = SeqRing::new(cfg.ring_capacity);
        let source = TickSource::new(cfg.seed);
        Ok(Self { cfg, udp, dest, listener, ring, source, sent_this_sec: 0, last_tick: None })
    }

    /// Run the event loop until a fatal error. Cancellation is process-wide.
    pub fn run(&mut self) -> Result<()> {
        let mut events = EventLoop::new();
        events.register_read(self.listener.as_raw_fd(), Wakeup::RetransListener);
        events.register_timer(Duration::from_millis(self.cfg.tick_interval_ms), Wakeup::TickBatch);
        events.register_timer(Duration::from_millis(1_000), Wakeup::Metrics);

        info!("entering event loop");
        loop {
            events.poll(|tag, _eof| match tag {
                Wakeup::TickBatch => self.emit_batch(),
                Wakeup::RetransListener => retrans::accept_one(&self.listener, &self.ring),
                Wakeup::Metrics => self.report_metrics(),
            })?;
        }
    }

    /// Generate, record, and multicast one batch of ticks.
    fn emit_batch(&mut self) {
        for _ in 0..self.cfg.batch_size {
            let generated = self.source.generate();
            let mut tick = generated.tick;
            // Stamp as close to the send syscall as possible.
            tick.timestamp_ns = clock::monotonic_ns();
            self.ring.push(tick.seq, tick);

            if generated.drop {
                info!("induced drop of seq={}", tick.seq);
            } else {
                match self.udp.send_to(&tick.encode(), self.dest) {
                    Ok(_) => self.sent_this_sec += 1,
                    Err(e) => error!("udp send failed for seq={}: {e}", tick.seq),
                }
            }
            self.last_tick = Some(tick);
        }
    }

    fn report_metrics(&mut self) {
        match self.last_tick {
            Some(t) => info!(
                "{} msgs/sec, last {} @ {:.2} (seq={})",
                self.sent_this_sec,
                t.symbol_str(),
                t.price,
                t.seq,
            ),
            None => info!("0 msgs/sec"),
        }
        self.sent_this_sec = 0;
    }
}
