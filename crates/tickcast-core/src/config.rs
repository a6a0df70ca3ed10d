//! Runtime configuration for the publisher and subscriber binaries.
//!
//! Both binaries read an optional JSON config file; CLI flags override
//! individual fields afterwards. Every field has a default matching the
//! protocol's standard deployment, so an empty file (or no file at all)
//! yields a working setup.
//!
//! # Example config (publisher)
//!
//! ```json
//! {
//!   "group": "224.0.0.1",
//!   "mcast_port": 30001,
//!   "retrans_port": 40001,
//!   "ring_capacity": 10000,
//!   "seed": 42
//! }
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::Deserialize;

use crate::error::TickcastError;

/// Default multicast group (link-local scope).
pub const DEFAULT_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 1);
/// Default multicast data port.
pub const DEFAULT_MCAST_PORT: u16 = 30001;
/// Default unicast retransmission port.
pub const DEFAULT_RETRANS_PORT: u16 = 40001;
/// Default multicast TTL (1 = local subnet only).
pub const DEFAULT_TTL: u32 = 1;
/// Default retransmission history depth, in ticks.
pub const DEFAULT_RING_CAPACITY: usize = 10_000;

// ---------------------------------------------------------------------------
// PublisherConfig
// ---------------------------------------------------------------------------

/// Publisher settings: where to send, how fast, and how much history to keep.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Multicast group datagrams are addressed to.
    pub group: Ipv4Addr,
    /// Multicast data port.
    pub mcast_port: u16,
    /// TCP port the retransmit server listens on.
    pub retrans_port: u16,
    /// Multicast TTL.
    pub multicast_ttl: u32,
    /// Ticks retained for retransmission.
    pub ring_capacity: usize,
    /// Tick timer period in milliseconds.
    pub tick_interval_ms: u64,
    /// Ticks emitted per timer firing.
    pub batch_size: u32,
    /// PRNG seed for the tick source; entropy-seeded when unset.
    pub seed: Option<u64>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP,
            mcast_port: DEFAULT_MCAST_PORT,
            retrans_port: DEFAULT_RETRANS_PORT,
            multicast_ttl: DEFAULT_TTL,
            ring_capacity: DEFAULT_RING_CAPACITY,
            tick_interval_ms: 1,
            batch_size: 10,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SubscriberConfig
// ---------------------------------------------------------------------------

/// Subscriber settings: where to listen and where to recover from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubscriberConfig {
    /// Multicast group to join.
    pub group: Ipv4Addr,
    /// Multicast data port.
    pub mcast_port: u16,
    /// Address of the publisher's retransmit server.
    pub publisher_addr: Ipv4Addr,
    /// TCP port of the publisher's retransmit server.
    pub retrans_port: u16,
    /// Kernel receive buffer request; sized to absorb bursts that arrive
    /// while the ingest loop is blocked repairing a gap.
    pub recv_buffer_bytes: usize,
    /// Bound on each recovery connect/send/receive, in milliseconds.
    pub recovery_timeout_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP,
            mcast_port: DEFAULT_MCAST_PORT,
            publisher_addr: Ipv4Addr::LOCALHOST,
            retrans_port: DEFAULT_RETRANS_PORT,
            recv_buffer_bytes: 4 * 1024 * 1024,
            recovery_timeout_ms: 1_000,
        }
    }
}

impl SubscriberConfig {
    /// Socket address of the retransmit server.
    pub fn retrans_addr(&self) -> SocketAddr {
        SocketAddr::from((self.publisher_addr, self.retrans_port))
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and parse a publisher JSON config file.
pub fn load_publisher_config(path: &Path) -> Result<PublisherConfig, TickcastError> {
    parse(path)
}

/// Load and parse a subscriber JSON config file.
pub fn load_subscriber_config(path: &Path) -> Result<SubscriberConfig, TickcastError> {
    parse(path)
}

fn parse<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, TickcastError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TickcastError::Config(format!("read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| TickcastError::Config(format!("parse {}: {e}", path.display())))
}
