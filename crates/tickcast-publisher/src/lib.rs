//! # tickcast-publisher
//!
//! Publisher side of the tickcast pair: paces synthetic ticks onto the
//! multicast group, records every tick in a bounded history, and serves
//! unicast retransmission requests out of it — all multiplexed on a single
//! thread.
//!
//! - [`source`] — seeded random-walk tick generator with shocks and
//!   induced drops
//! - [`retrans`] — one-request-one-response retransmission serving
//! - [`publisher`] — event-loop wiring and the metrics line

pub mod publisher;
pub mod retrans;
pub mod source;
