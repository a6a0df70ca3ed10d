//! End-to-end exercise of the retransmission wire contract: the real TCP
//! recovery client against the real serving path, over loopback.

use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::Duration;

use tickcast_core::protocol::{Tick, symbol_to_bytes};
use tickcast_core::ring::SeqRing;
use tickcast_publisher::retrans::serve_connection;
use tickcast_subscriber::ingest::{Subscriber, TickConsumer};
use tickcast_subscriber::recovery::{RecoveryClient, TcpRecovery};

fn tick(seq: u64) -> Tick {
    Tick {
        seq,
        timestamp_ns: seq * 1_000_000,
        price: 100.0 + seq as f64 * 0.01,
        quantity: 100 + (seq % 50) as u32,
        symbol: symbol_to_bytes("AAPL"),
    }
}

/// Serve `connections` retransmit exchanges out of a ring seeded with
/// `seqs`, on a loopback listener.
fn spawn_history_server(
    seqs: std::ops::RangeInclusive<u64>,
    capacity: usize,
    connections: usize,
) -> SocketAddr {
    let mut ring = SeqRing::new(capacity);
    for seq in seqs {
        ring.push(seq, tick(seq));
    }
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for _ in 0..connections {
            let (stream, _) = listener.accept().unwrap();
            let _ = serve_connection(stream, &ring);
        }
    });
    addr
}

#[derive(Default)]
struct Recording {
    seqs: Vec<u64>,
}

impl TickConsumer for Recording {
    fn on_tick(&mut self, t: &Tick) {
        self.seqs.push(t.seq);
    }
}

#[test]
fn recovered_tick_matches_the_published_bytes() {
    let addr = spawn_history_server(1..=100, 1_000, 1);
    let mut client = TcpRecovery::new(addr, Duration::from_secs(2));

    let recovered = client.fetch(42).expect("seq 42 is in history");
    assert_eq!(recovered, tick(42));
}

#[test]
fn evicted_sequence_reports_permanently_lost() {
    // Capacity 10, sequences 1..=20: 3 was overwritten long ago.
    let addr = spawn_history_server(1..=20, 10, 1);
    let mut client = TcpRecovery::new(addr, Duration::from_secs(2));
    assert!(client.fetch(3).is_none());
}

#[test]
fn gap_repair_end_to_end_over_loopback() {
    let addr = spawn_history_server(1..=50, 1_000, 10);
    let client = TcpRecovery::new(addr, Duration::from_secs(2));
    let mut sub = Subscriber::new(Recording::default(), client);

    // In-band: 1..=30, then a burst of ten drops, then 41.
    for seq in 1..=30 {
        sub.handle_datagram(&tick(seq).encode());
    }
    sub.handle_datagram(&tick(41).encode());

    assert_eq!(sub.consumer().seqs, (1..=41).collect::<Vec<_>>());
    assert_eq!(sub.expected_seq(), 42);
}

#[test]
fn two_clients_each_get_an_uninterleaved_response() {
    let addr = spawn_history_server(1..=600, 1_000, 2);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            thread::spawn(move || {
                let mut client = TcpRecovery::new(addr, Duration::from_secs(2));
                client.fetch(500)
            })
        })
        .collect();

    for handle in handles {
        let recovered = handle.join().unwrap().expect("seq 500 is in history");
        assert_eq!(recovered, tick(500));
    }
}
