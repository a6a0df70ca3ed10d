//! Retransmission serving: one request, one response, one close.
//!
//! The exchange runs synchronously on the event-loop thread. The accepted
//! connection is switched to blocking with a short read timeout, so a client
//! that never sends its 8 bytes delays the tick timer by at most
//! [`READ_TIMEOUT`] rather than indefinitely.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use tickcast_core::protocol::{REQUEST_WIRE_SIZE, RetransmitRequest, Tick};
use tickcast_core::ring::{Lookup, SeqRing};

/// Upper bound on how long a client may take to deliver its request.
const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Accept and serve at most one pending connection.
///
/// `WouldBlock` means a spurious wake-up and is ignored; other accept errors
/// are reported but do not stop the loop.
pub fn accept_one(listener: &TcpListener, ring: &SeqRing<Tick>) {
    match listener.accept() {
        Ok((stream, peer)) => {
            debug!("retransmit connection from {peer}");
            if let Err(e) = serve_connection(stream, ring) {
                warn!("retransmit exchange with {peer} failed: {e:#}");
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
        Err(e) => warn!("retransmit accept failed: {e}"),
    }
}

/// Run the one-shot request/response exchange on an accepted connection.
///
/// Ring hit: the 32-byte tick is written back. Evicted or never-published:
/// the connection closes without a payload, which is the wire signal for "no
/// longer available". The stream is closed on drop in every path.
pub fn serve_connection(stream: TcpStream, ring: &SeqRing<Tick>) -> Result<()> {
    let mut stream = stream;
    stream.set_nonblocking(false).context("set client blocking")?;
    stream.set_read_timeout(Some(READ_TIMEOUT)).context("set client read timeout")?;

    let mut buf = [0u8; REQUEST_WIRE_SIZE];
    stream.read_exact(&mut buf).context("read retransmit request")?;
    let req = RetransmitRequest::decode(&buf)?;

    match ring.lookup(req.missed_seq) {
        Lookup::Found(tick) => {
            stream.write_all(&tick.encode()).context("write retransmit response")?;
            debug!("served retransmit for seq={}", req.missed_seq);
        }
        Lookup::Evicted => {
            warn!("seq={} evicted from history, closing without payload", req.missed_seq);
        }
        Lookup::Absent => {
            warn!("seq={} never published, closing without payload", req.missed_seq);
        }
    }
    Ok(())
}
