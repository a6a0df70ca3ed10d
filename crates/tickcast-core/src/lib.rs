//! # tickcast-core
//!
//! Shared plumbing for the tickcast market-data pair:
//!
//! - **Wire protocol** (`protocol`) — fixed-size little-endian `Tick` and
//!   `RetransmitRequest` records
//! - **Sequence ring** (`ring`) — bounded history keyed by sequence number
//! - **Event multiplexer** (`poll`) — readiness loop with read and timer sources
//! - **Sockets** (`net`) — multicast data path and unicast retransmit channel
//! - **Clock** (`clock`) — monotonic nanosecond timestamps
//! - **Latency** (`latency`) — histogram-backed per-interval statistics
//! - **Configuration** (`config`) — JSON config deserialization with defaults
//! - **Error types** (`error`) — domain-specific `TickcastError` via thiserror
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod clock;
pub mod config;
pub mod error;
pub mod latency;
pub mod logging;
pub mod net;
pub mod poll;
pub mod protocol;
pub mod ring;
