//! Unicast recovery of sequences missing from the multicast stream.
//!
//! The wire contract is one connection per missed sequence: write an 8-byte
//! request, read either a full 32-byte tick or a close with fewer bytes,
//! which means the publisher's history no longer holds it.

use std::io::{Read, Write};
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use tickcast_core::net;
use tickcast_core::protocol::{RetransmitRequest, TICK_WIRE_SIZE, Tick};

/// Fetches individual missed sequences.
///
/// The trait keeps the ordering state machine testable without a live
/// publisher; [`TcpRecovery`] is the production implementation.
pub trait RecoveryClient {
    /// Fetch one missed sequence. `None` means permanently lost.
    fn fetch(&mut self, seq: u64) -> Option<Tick>;
}

/// TCP recovery client: one short-lived connection per missed sequence.
pub struct TcpRecovery {
    addr: SocketAddr,
    timeout: Duration,
}

impl TcpRecovery {
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    fn exchange(&self, seq: u64) -> Result<Option<Tick>> {
        let mut stream = net::retrans_connect(self.addr, self.timeout)?;
        stream
            .write_all(&RetransmitRequest { missed_seq: seq }.encode())
            .context("send retransmit request")?;

        let mut buf = [0u8; TICK_WIRE_SIZE];
        let n = read_full(&mut stream, &mut buf).context("read retransmit response")?;
        if n == TICK_WIRE_SIZE {
            Ok(Some(Tick::decode(&buf)?))
        } else {
            // Zero (or short) bytes then close: no longer available.
            Ok(None)
        }
    }
}

impl RecoveryClient for TcpRecovery {
    fn fetch(&mut self, seq: u64) -> Option<Tick> {
        match self.exchange(seq) {
            Ok(Some(tick)) => {
                info!("recovered seq={} {} @ {:.2}", tick.seq, tick.symbol_str(), tick.price);
                Some(tick)
            }
            Ok(None) => {
                warn!("seq={seq} no longer available at the publisher");
                None
            }
            Err(e) => {
                warn!("recovery of seq={seq} failed: {e:#}");
                None
            }
        }
    }
}

/// Read until `buf` is full or the peer closes. Returns the bytes read.
fn read_full(stream: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
