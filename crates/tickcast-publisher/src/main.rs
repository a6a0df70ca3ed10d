//! Market-data publisher: multicasts a paced tick stream and serves unicast
//! retransmissions out of a bounded history.
//!
//! # Usage
//!
//! ```bash
//! tickcast-publisher [config.json] [--seed 42] [--log-level debug]
//! ```

use std::net::Ipv4Addr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tickcast_core::config::{self, PublisherConfig};
use tickcast_core::logging;
use tickcast_publisher::publisher::Publisher;

/// Multicast market data publisher with retransmission.
#[derive(Parser)]
#[command(name = "tickcast-publisher", about = "Multicast market data publisher with retransmission")]
struct Cli {
    /// Optional configuration file path (JSON).
    config: Option<PathBuf>,

    /// Multicast group override.
    #[arg(long)]
    group: Option<Ipv4Addr>,

    /// Multicast data port override.
    #[arg(long)]
    mcast_port: Option<u16>,

    /// Retransmit port override.
    #[arg(long)]
    retrans_port: Option<u16>,

    /// History depth override, in ticks.
    #[arg(long)]
    ring_capacity: Option<usize>,

    /// PRNG seed for a reproducible tick stream.
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_dir.as_deref(), "tickcast-publisher");

    let mut cfg = match &cli.config {
        Some(path) => config::load_publisher_config(path)?,
        None => PublisherConfig::default(),
    };
    if let Some(group) = cli.group {
        cfg.group = group;
    }
    if let Some(port) = cli.mcast_port {
        cfg.mcast_port = port;
    }
    if let Some(port) = cli.retrans_port {
        cfg.retrans_port = port;
    }
    if let Some(capacity) = cli.ring_capacity {
        cfg.ring_capacity = capacity;
    }
    if let Some(seed) = cli.seed {
        cfg.seed = Some(seed);
    }

    info!("tickcast-publisher starting");
    Publisher::new(cfg)?.run()
}
