//! Market-data subscriber: repairs the multicast stream and feeds the
//! ordered result to the mean-reversion consumer.
//!
//! # Usage
//!
//! ```bash
//! tickcast-subscriber [config.json] [--publisher-addr 127.0.0.1] [--log-level debug]
//! ```
//!
//! Exits 0 on a clean ctrl-c shutdown after printing the session report.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tickcast_core::config::{self, SubscriberConfig};
use tickcast_core::{logging, net};
use tickcast_subscriber::ingest::Subscriber;
use tickcast_subscriber::recovery::TcpRecovery;
use tickcast_subscriber::strategy::MeanReversion;

/// How often a quiet receive loop wakes up to observe the shutdown flag.
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Gap-repairing multicast market data subscriber.
#[derive(Parser)]
#[command(name = "tickcast-subscriber", about = "Gap-repairing multicast market data subscriber")]
struct Cli {
    /// Optional configuration file path (JSON).
    config: Option<PathBuf>,

    /// Multicast group override.
    #[arg(long)]
    group: Option<Ipv4Addr>,

    /// Multicast data port override.
    #[arg(long)]
    mcast_port: Option<u16>,

    /// Publisher address for retransmission requests.
    #[arg(long)]
    publisher_addr: Option<Ipv4Addr>,

    /// Retransmit port override.
    #[arg(long)]
    retrans_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_dir.as_deref(), "tickcast-subscriber");

    let mut cfg = match &cli.config {
        Some(path) => config::load_subscriber_config(path)?,
        None => SubscriberConfig::default(),
    };
    if let Some(group) = cli.group {
        cfg.group = group;
    }
    if let Some(port) = cli.mcast_port {
        cfg.mcast_port = port;
    }
    if let Some(addr) = cli.publisher_addr {
        cfg.publisher_addr = addr;
    }
    if let Some(port) = cli.retrans_port {
        cfg.retrans_port = port;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let socket = net::multicast_receiver(
        cfg.group,
        cfg.mcast_port,
        cfg.recv_buffer_bytes,
        Some(RECV_POLL_INTERVAL),
    )?;
    info!("listening on {}:{}, recovering via {}", cfg.group, cfg.mcast_port, cfg.retrans_addr());

    let recovery =
        TcpRecovery::new(cfg.retrans_addr(), Duration::from_millis(cfg.recovery_timeout_ms));
    let mut subscriber = Subscriber::new(MeanReversion::new(), recovery);
    subscriber.run(&socket, &shutdown)?;

    info!("goodbye");
    Ok(())
}
