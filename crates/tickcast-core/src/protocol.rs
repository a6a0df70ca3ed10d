//! On-wire message formats for the multicast tick stream and the unicast
//! retransmission channel.
//!
//! Both records are fixed-size and **little-endian on the wire** regardless of
//! host byte order. A `Tick` occupies exactly 32 bytes, a `RetransmitRequest`
//! exactly 8; the in-memory layout is pinned by compile-time assertions so
//! publisher and subscribers agree bit-for-bit.
//!
//! ```text
//! Tick (32 bytes)                        RetransmitRequest (8 bytes)
//! ┌──────────────┬────────┐             ┌──────────────┬────────┐
//! │ seq          │ u64 LE │             │ missed_seq   │ u64 LE │
//! │ timestamp_ns │ u64 LE │             └──────────────┴────────┘
//! │ price        │ f64 LE │
//! │ quantity     │ u32 LE │
//! │ symbol       │ [u8;4] │
//! └──────────────┴────────┘
//! ```

use crate::error::TickcastError;

/// Exact size of an encoded [`Tick`].
pub const TICK_WIRE_SIZE: usize = 32;

/// Exact size of an encoded [`RetransmitRequest`].
pub const REQUEST_WIRE_SIZE: usize = 8;

/// Length of the fixed symbol buffer carried in every tick.
pub const SYMBOL_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// One market-data record, identified by a unique 1-based sequence number.
///
/// `timestamp_ns` is taken from the publisher's monotonic clock immediately
/// before the send syscall. `symbol` holds up to 4 ASCII bytes, right-padded
/// with NUL; a full 4-byte symbol carries no terminator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Tick {
    pub seq: u64,
    pub timestamp_ns: u64,
    pub price: f64,
    pub quantity: u32,
    pub symbol: [u8; SYMBOL_LEN],
}

const _: () = assert!(std::mem::size_of::<Tick>() == TICK_WIRE_SIZE);
const _: () = assert!(std::mem::align_of::<Tick>() == 8);

impl Tick {
    /// Serialize into the 32-byte wire representation.
    pub fn encode(&self) -> [u8; TICK_WIRE_SIZE] {
        let mut buf = [0u8; TICK_WIRE_SIZE];
        buf[0..8].copy_from_slice(&self.seq.to_le_bytes());
        buf[8..16].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        buf[16..24].copy_from_slice(&self.price.to_le_bytes());
        buf[24..28].copy_from_slice(&self.quantity.to_le_bytes());
        buf[28..32].copy_from_slice(&self.symbol);
        buf
    }

    /// Deserialize from a wire buffer. Rejects any length other than 32.
    pub fn decode(buf: &[u8]) -> Result<Self, TickcastError> {
        if buf.len() != TICK_WIRE_SIZE {
            return Err(TickcastError::Wire(format!(
                "tick must be {TICK_WIRE_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        let mut symbol = [0u8; SYMBOL_LEN];
        symbol.copy_from_slice(&buf[28..32]);
        Ok(Self {
            seq: le_u64(&buf[0..8]),
            timestamp_ns: le_u64(&buf[8..16]),
            price: f64::from_bits(le_u64(&buf[16..24])),
            quantity: le_u32(&buf[24..28]),
            symbol,
        })
    }

    /// The symbol as a string slice, up to the first NUL byte.
    pub fn symbol_str(&self) -> &str {
        symbol_from_bytes(&self.symbol)
    }
}

// ---------------------------------------------------------------------------
// RetransmitRequest
// ---------------------------------------------------------------------------

/// A request for one missed sequence number over the retransmit channel.
///
/// The response is either one encoded [`Tick`] or a close with no bytes when
/// the sequence is no longer available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct RetransmitRequest {
    pub missed_seq: u64,
}

const _: () = assert!(std::mem::size_of::<RetransmitRequest>() == REQUEST_WIRE_SIZE);

impl RetransmitRequest {
    /// Serialize into the 8-byte wire representation.
    pub fn encode(&self) -> [u8; REQUEST_WIRE_SIZE] {
        self.missed_seq.to_le_bytes()
    }

    /// Deserialize from a wire buffer. Rejects any length other than 8.
    pub fn decode(buf: &[u8]) -> Result<Self, TickcastError> {
        if buf.len() != REQUEST_WIRE_SIZE {
            return Err(TickcastError::Wire(format!(
                "retransmit request must be {REQUEST_WIRE_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        Ok(Self { missed_seq: le_u64(buf) })
    }
}

// ---------------------------------------------------------------------------
// Symbol helpers
// ---------------------------------------------------------------------------

/// Write an ASCII symbol into a fixed `[u8; SYMBOL_LEN]` buffer.
///
/// The string is copied byte-for-byte and the remaining bytes are zero-filled.
/// Longer symbols are silently truncated.
#[inline]
pub fn symbol_to_bytes(s: &str) -> [u8; SYMBOL_LEN] {
    let mut buf = [0u8; SYMBOL_LEN];
    let len = s.len().min(SYMBOL_LEN);
    buf[..len].copy_from_slice(&s.as_bytes()[..len]);
    buf
}

/// Read a symbol from a fixed `[u8; SYMBOL_LEN]` buffer.
///
/// Returns the string up to the first NUL byte, or the full buffer when all
/// four bytes are significant. Non-UTF-8 content yields `""`.
#[inline]
pub fn symbol_from_bytes(buf: &[u8; SYMBOL_LEN]) -> &str {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(SYMBOL_LEN);
    std::str::from_utf8(&buf[..end]).unwrap_or("")
}

#[inline]
fn le_u64(b: &[u8]) -> u64 {
    let mut a = [0u8; 8];
    a.copy_from_slice(b);
    u64::from_le_bytes(a)
}

#[inline]
fn le_u32(b: &[u8]) -> u32 {
    let mut a = [0u8; 4];
    a.copy_from_slice(b);
    u32::from_le_bytes(a)
}
