//! # tickcast-subscriber
//!
//! Subscriber side of the tickcast pair: joins the multicast group, detects
//! sequence gaps, repairs them synchronously over the unicast retransmit
//! channel, and hands a fully ordered stream to its consumer.
//!
//! - [`ingest`] — the ordering state machine and ingest loop
//! - [`recovery`] — the per-sequence retransmission client
//! - [`strategy`] — the mean-reversion trading consumer

pub mod ingest;
pub mod recovery;
pub mod strategy;
