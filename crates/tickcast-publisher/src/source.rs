//! Synthetic tick source: a seeded multiplicative random walk over a fixed
//! symbol table, with persistent fundamental shocks, transient anomalies,
//! and induced datagram drops that exercise subscriber recovery.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tickcast_core::protocol::{Tick, symbol_to_bytes};

/// Number of symbols in the universe.
pub const SYMBOL_COUNT: usize = 50;

/// The fixed, ordered symbol table.
pub static SYMBOLS: [&str; SYMBOL_COUNT] = [
    "AAPL", "MSFT", "GOOG", "AMZN", "META", "TSLA", "NVDA", "JPM", //
    "JNJ", "V", "UNH", "PG", "HD", "DIS", "MA", "BAC", //
    "VZ", "CRM", "XOM", "PFE", "NKE", "INTC", "T", "KO", //
    "MRK", "PEP", "ABT", "WMT", "CVX", "CSCO", "MCD", "ABBV", //
    "MDT", "BMY", "ACN", "AVGO", "TXN", "COST", "NEE", "QCOM", //
    "DHR", "LIN", "PM", "UNP", "LOW", "HON", "UPS", "IBM", //
    "SBUX", "CAT",
];

/// Symbol `i` opens at `100 + 7i`.
const BASE_PRICE: f64 = 100.0;
const PRICE_STEP: f64 = 7.0;
/// Prices never fall below this.
const PRICE_FLOOR: f64 = 1.0;
/// Per-tick walk delta is uniform on ±this.
const WALK_DELTA: f64 = 0.002;
/// One tick in this many takes a persistent fundamental shock.
const FUNDAMENTAL_ONE_IN: u32 = 500;
/// Failing that, one tick in this many takes a transient anomaly.
const ANOMALY_ONE_IN: u32 = 100;
/// One datagram in this many is deliberately not sent.
const DROP_ONE_IN: u32 = 20_000;

/// One generated tick plus the decision whether to suppress its datagram.
///
/// `tick.timestamp_ns` is left at zero; the publisher stamps it immediately
/// before the send syscall. A dropped tick still consumes its sequence number
/// and still enters the history ring.
pub struct GeneratedTick {
    pub tick: Tick,
    pub drop: bool,
}

/// Deterministic (when seeded) generator of the publisher's tick stream.
pub struct TickSource {
    rng: StdRng,
    prices: [f64; SYMBOL_COUNT],
    next_seq: u64,
}

impl TickSource {
    /// Create a source, seeding the PRNG from `seed` or from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut prices = [0.0; SYMBOL_COUNT];
        for (i, price) in prices.iter_mut().enumerate() {
            *price = BASE_PRICE + PRICE_STEP * i as f64;
        }
        Self { rng, prices, next_seq: 1 }
    }

    /// Produce the next tick in sequence.
    pub fn generate(&mut self) -> GeneratedTick {
        let seq = self.next_seq;
        self.next_seq += 1;

        let sym = self.rng.gen_range(0..SYMBOL_COUNT);

        let delta = self.rng.gen_range(-WALK_DELTA..WALK_DELTA);
        self.prices[sym] = (self.prices[sym] * (1.0 + delta)).max(PRICE_FLOOR);
        let mut published = self.prices[sym];

        if self.rng.gen_range(0..FUNDAMENTAL_ONE_IN) == 0 {
            // Permanent repricing: persisted, so the walk continues from the
            // damaged level.
            let depth = self.rng.gen_range(0.04..0.07);
            self.prices[sym] = (self.prices[sym] * (1.0 - depth)).max(PRICE_FLOOR);
            published = self.prices[sym];
        } else if self.rng.gen_range(0..ANOMALY_ONE_IN) == 0 {
            // One-tick spike: not persisted, so the next tick for this symbol
            // rubber-bands back to the walk level.
            let depth = self.rng.gen_range(0.015..0.030);
            published *= 1.0 - depth;
        }

        let tick = Tick {
            seq,
            timestamp_ns: 0,
            price: published,
            quantity: 100 + (seq % 50) as u32,
            symbol: symbol_to_bytes(SYMBOLS[sym]),
        };

        let drop = self.rng.gen_range(0..DROP_ONE_IN) == 0;
        GeneratedTick { tick, drop }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_table_holds_fifty_unique_names() {
        assert_eq!(SYMBOLS.len(), SYMBOL_COUNT);
        let mut sorted = SYMBOLS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), SYMBOL_COUNT);
        assert!(SYMBOLS.iter().all(|s| !s.is_empty() && s.len() <= 4));
    }

    #[test]
    fn sequences_start_at_one_and_increment() {
        let mut src = TickSource::new(Some(1));
        for expected in 1..=500u64 {
            let g = src.generate();
            assert_eq!(g.tick.seq, expected);
            assert_eq!(g.tick.quantity, 100 + (expected % 50) as u32);
        }
    }

    #[test]
    fn same_seed_reproduces_the_stream() {
        let mut a = TickSource::new(Some(42));
        let mut b = TickSource::new(Some(42));
        for _ in 0..10_000 {
            let (ga, gb) = (a.generate(), b.generate());
            assert_eq!(ga.tick, gb.tick);
            assert_eq!(ga.drop, gb.drop);
        }
    }

    #[test]
    fn prices_stay_floored_and_finite() {
        let mut src = TickSource::new(Some(7));
        // The walk itself is floored at 1.0; a transient anomaly may print up
        // to 3% under the floor but no further.
        let lowest_printable = PRICE_FLOOR * (1.0 - 0.030) - f64::EPSILON;
        for _ in 0..200_000 {
            let g = src.generate();
            assert!(g.tick.price.is_finite());
            assert!(g.tick.price >= lowest_printable);
        }
    }

    #[test]
    fn symbols_come_from_the_table() {
        let mut src = TickSource::new(Some(3));
        for _ in 0..1_000 {
            let g = src.generate();
            assert!(SYMBOLS.contains(&g.tick.symbol_str()));
        }
    }

    #[test]
    fn drops_occur_at_roughly_the_configured_rate() {
        let mut src = TickSource::new(Some(99));
        let n = 1_000_000;
        let drops = (0..n).filter(|_| src.generate().drop).count();
        // Expectation is n / 20000 = 50; accept a wide band.
        assert!(drops > 10 && drops < 200, "drops = {drops}");
    }

    #[test]
    fn initial_prices_ladder_by_seven() {
        let src = TickSource::new(Some(0));
        assert_eq!(src.prices[0], 100.0);
        assert_eq!(src.prices[1], 107.0);
        assert_eq!(src.prices[49], 100.0 + 7.0 * 49.0);
    }
}
