//! Mean-reversion trading consumer.
//!
//! A deterministic function of the delivered tick stream, per symbol: track a
//! sliding window of the last `SMA_WINDOW` prices, buy a fixed lot when the
//! price dips two standard deviations under the mean, and exit on reversion
//! to the mean, a hard stop, or a time stop. Windowed statistics simply skip
//! sequences that were permanently lost upstream.

use ahash::AHashMap;
use tracing::info;

use tickcast_core::protocol::Tick;

use crate::ingest::TickConsumer;

/// Sliding window length per symbol.
const SMA_WINDOW: usize = 100;
/// Standard deviation is floored here so silent markets don't shrink the
/// bands into noise.
const STDDEV_FLOOR: f64 = 0.10;
/// Entry threshold in standard deviations under the mean.
const ENTRY_BAND: f64 = 2.0;
/// Hard-stop threshold in standard deviations under the entry price.
const STOP_BAND: f64 = 3.0;
/// Ticks a position may be held before the time stop fires.
const MAX_TICKS_HELD: u32 = 50;
/// Shares per round trip.
const LOT_SIZE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Per-symbol state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SymbolState {
    window: Vec<f64>,
    head: usize,
    sum: f64,
    long: bool,
    entry_price: f64,
    realized: f64,
    trades: u32,
    ticks_held: u32,
}

impl SymbolState {
    /// Push a price, maintaining the running sum by subtract-old-add-new once
    /// the window is full.
    fn push_price(&mut self, price: f64) {
        if self.window.len() < SMA_WINDOW {
            self.window.push(price);
            self.sum += price;
        } else {
            self.sum -= self.window[self.head];
            self.window[self.head] = price;
            self.sum += price;
            self.head = (self.head + 1) % SMA_WINDOW;
        }
    }

    /// Most recently pushed price, used to mark open positions to market.
    fn last_price(&self) -> Option<f64> {
        if self.window.len() < SMA_WINDOW {
            self.window.last().copied()
        } else {
            let idx = if self.head == 0 { SMA_WINDOW - 1 } else { self.head - 1 };
            Some(self.window[idx])
        }
    }

    fn stddev(&self, mean: f64) -> f64 {
        let variance = self
            .window
            .iter()
            .map(|p| (p - mean) * (p - mean))
            .sum::<f64>()
            / SMA_WINDOW as f64;
        variance.sqrt().max(STDDEV_FLOOR)
    }
}

// ---------------------------------------------------------------------------
// MeanReversion
// ---------------------------------------------------------------------------

/// End-of-session accounting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionReport {
    /// Realized P&L across all closed round trips.
    pub realized: f64,
    /// Mark-to-market P&L of positions still open, at each symbol's last
    /// delivered price.
    pub unrealized: f64,
    /// Closed round trips.
    pub trades: u32,
}

/// The mean-reversion trading consumer. Owns all strategy state; created per
/// subscriber and never shared.
#[derive(Default)]
pub struct MeanReversion {
    state: AHashMap<String, SymbolState>,
    realized_pnl: f64,
}

impl MeanReversion {
    pub fn new() -> Self {
        Self::default()
    }

    fn on_price(&mut self, symbol: &str, price: f64) {
        let mut realized_delta = 0.0;

        let state = self.state.entry(symbol.to_string()).or_default();
        state.push_price(price);
        if state.window.len() < SMA_WINDOW {
            return;
        }

        let mean = state.sum / SMA_WINDOW as f64;
        let stddev = state.stddev(mean);

        if !state.long {
            if price <= mean - ENTRY_BAND * stddev {
                state.long = true;
                state.entry_price = price;
                state.ticks_held = 0;
                info!(
                    "BUY {LOT_SIZE} {symbol} @ {price:.2} (mean {mean:.2}, band {:.2})",
                    ENTRY_BAND * stddev,
                );
            }
        } else {
            let exit_reason = if price >= mean {
                Some("take profit")
            } else if state.ticks_held > 2 && price <= state.entry_price - STOP_BAND * stddev {
                Some("stop loss")
            } else if state.ticks_held > MAX_TICKS_HELD {
                Some("time stop")
            } else {
                None
            };

            match exit_reason {
                Some(reason) => {
                    let pnl = (price - state.entry_price) * LOT_SIZE;
                    state.realized += pnl;
                    state.long = false;
                    state.trades += 1;
                    realized_delta = pnl;
                    info!("SELL ({reason}) {LOT_SIZE} {symbol} @ {price:.2} (P&L {pnl:.2})");
                }
                None => state.ticks_held += 1,
            }
        }

        self.realized_pnl += realized_delta;
    }

    /// Session totals, marking open positions at their last delivered price.
    pub fn session_report(&self) -> SessionReport {
        let mut unrealized = 0.0;
        let mut trades = 0;
        for state in self.state.values() {
            trades += state.trades;
            if state.long
                && let Some(last) = state.last_price()
            {
                unrealized += (last - state.entry_price) * LOT_SIZE;
            }
        }
        SessionReport { realized: self.realized_pnl, unrealized, trades }
    }
}

impl TickConsumer for MeanReversion {
    fn on_tick(&mut self, tick: &Tick) {
        self.on_price(tick.symbol_str(), tick.price);
    }

    fn finish(&mut self) {
        for (symbol, state) in &self.state {
            if state.long
                && let Some(last) = state.last_price()
            {
                info!(
                    "open position {symbol}: entry {:.2}, mark {:.2}, unrealized {:.2}",
                    state.entry_price,
                    last,
                    (last - state.entry_price) * LOT_SIZE,
                );
            }
        }
        let report = self.session_report();
        info!(
            "session complete: realized {:.2}, unrealized {:.2}, net {:.2}, {} round trips",
            report.realized,
            report.unrealized,
            report.realized + report.unrealized,
            report.trades,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(strategy: &mut MeanReversion, prices: impl IntoIterator<Item = f64>) {
        for price in prices {
            strategy.on_price("TST", price);
        }
    }

    fn state<'a>(strategy: &'a MeanReversion, symbol: &str) -> &'a SymbolState {
        strategy.state.get(symbol).unwrap()
    }

    #[test]
    fn no_signal_until_the_window_fills() {
        let mut s = MeanReversion::new();
        // 99 deep dips: window not yet full, so no entry is possible.
        feed(&mut s, std::iter::repeat(50.0).take(SMA_WINDOW - 1));
        assert!(!state(&s, "TST").long);
        assert_eq!(s.session_report().trades, 0);
    }

    #[test]
    fn flat_market_never_enters() {
        let mut s = MeanReversion::new();
        feed(&mut s, std::iter::repeat(100.0).take(300));
        assert!(!state(&s, "TST").long);
    }

    #[test]
    fn dip_enters_and_reversion_takes_profit() {
        let mut s = MeanReversion::new();
        feed(&mut s, std::iter::repeat(100.0).take(SMA_WINDOW));
        // Mean ~100, stddev floored at 0.10: a 99.5 print is well under the
        // two-sigma band.
        feed(&mut s, [99.5]);
        assert!(state(&s, "TST").long);
        assert_eq!(state(&s, "TST").entry_price, 99.5);

        // Back above the mean: take profit.
        feed(&mut s, [100.5]);
        let report = s.session_report();
        assert!(!state(&s, "TST").long);
        assert_eq!(report.trades, 1);
        assert!((report.realized - (100.5 - 99.5) * LOT_SIZE).abs() < 1e-9);
    }

    #[test]
    fn crash_triggers_the_hard_stop() {
        let mut s = MeanReversion::new();
        feed(&mut s, std::iter::repeat(100.0).take(SMA_WINDOW));
        feed(&mut s, [99.5]);
        assert!(state(&s, "TST").long);

        // Hold through three mild ticks so the stop is armed, then crash.
        feed(&mut s, [99.2, 99.2, 99.2]);
        assert!(state(&s, "TST").long);
        feed(&mut s, [95.0]);

        let report = s.session_report();
        assert!(!state(&s, "TST").long);
        assert_eq!(report.trades, 1);
        assert!(report.realized < 0.0);
        assert!((report.realized - (95.0 - 99.5) * LOT_SIZE).abs() < 1e-9);
    }

    #[test]
    fn stagnation_triggers_the_time_stop() {
        let mut s = MeanReversion::new();
        feed(&mut s, std::iter::repeat(100.0).take(SMA_WINDOW));
        feed(&mut s, [99.7]);
        assert!(state(&s, "TST").long);

        // Price pinned at entry: never reverts, never hits the hard stop.
        feed(&mut s, std::iter::repeat(99.7).take(60));
        let report = s.session_report();
        assert!(!state(&s, "TST").long);
        assert_eq!(report.trades, 1);
        assert!(report.realized.abs() < 1e-9);
    }

    #[test]
    fn open_position_is_marked_to_market() {
        let mut s = MeanReversion::new();
        feed(&mut s, std::iter::repeat(100.0).take(SMA_WINDOW));
        feed(&mut s, [99.5]);
        assert!(state(&s, "TST").long);

        // One more dip, still held.
        feed(&mut s, [99.4]);
        assert!(state(&s, "TST").long);

        let report = s.session_report();
        assert_eq!(report.trades, 0);
        assert!((report.unrealized - (99.4 - 99.5) * LOT_SIZE).abs() < 1e-9);
    }

    #[test]
    fn symbols_are_tracked_independently() {
        let mut s = MeanReversion::new();
        for _ in 0..SMA_WINDOW {
            s.on_price("AAA", 100.0);
            s.on_price("BBB", 200.0);
        }
        s.on_price("AAA", 99.5);
        assert!(state(&s, "AAA").long);
        assert!(!state(&s, "BBB").long);
    }

    #[test]
    fn lost_sequences_do_not_disturb_the_window() {
        // The consumer only sees delivered prices; a permanent upstream gap
        // just means fewer samples, which must not corrupt the statistics.
        let mut s = MeanReversion::new();
        feed(&mut s, (0..SMA_WINDOW * 2).map(|i| 100.0 + (i % 3) as f64 * 0.01));
        let st = state(&s, "TST");
        assert_eq!(st.window.len(), SMA_WINDOW);
        let mean = st.sum / SMA_WINDOW as f64;
        assert!(mean > 99.0 && mean < 101.0);
    }
}
