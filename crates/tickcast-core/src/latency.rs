//! Histogram-backed latency statistics for the subscriber's per-second
//! observability line.
//!
//! Each delivered tick records `now - tick.timestamp` into a
//! [`LatencyWindow`]; once a second the subscriber snapshots, logs, and
//! resets it. The histogram uses fixed 5µs bins up to 20ms; samples above
//! that are clamped into the last bin (min/max/mean remain exact).

/// Width of each histogram bin in microseconds.
const BIN_WIDTH_US: u64 = 5;

/// Number of histogram bins (covers 0–20ms).
const NUM_BINS: usize = 4000;

/// Statistics computed over one reporting window.
#[derive(Debug, Clone, Copy)]
pub struct LatencySnapshot {
    pub count: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p99_us: u64,
}

impl std::fmt::Display for LatencySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "min={}µs max={}µs mean={:.1}µs p50={}µs p99={}µs",
            self.min_us, self.max_us, self.mean_us, self.p50_us, self.p99_us,
        )
    }
}

/// A resettable latency accumulator.
///
/// Not thread-safe; the ingest loop owns its instance.
pub struct LatencyWindow {
    bins: Vec<u64>,
    count: u64,
    sum_us: u64,
    min_us: u64,
    max_us: u64,
}

impl LatencyWindow {
    pub fn new() -> Self {
        Self { bins: vec![0u64; NUM_BINS], count: 0, sum_us: 0, min_us: u64::MAX, max_us: 0 }
    }

    /// Record one latency sample given in nanoseconds.
    #[inline]
    pub fn record_ns(&mut self, latency_ns: u64) {
        let us = latency_ns / 1_000;
        self.count += 1;
        self.sum_us += us;
        self.min_us = self.min_us.min(us);
        self.max_us = self.max_us.max(us);

        let bin = ((us / BIN_WIDTH_US) as usize).min(NUM_BINS - 1);
        self.bins[bin] += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Statistics for the window so far. `None` when nothing was recorded.
    pub fn snapshot(&self) -> Option<LatencySnapshot> {
        if self.count == 0 {
            return None;
        }
        Some(LatencySnapshot {
            count: self.count,
            min_us: self.min_us,
            max_us: self.max_us,
            mean_us: self.sum_us as f64 / self.count as f64,
            p50_us: self.percentile(0.50),
            p99_us: self.percentile(0.99),
        })
    }

    /// Clear the window for the next reporting interval.
    pub fn reset(&mut self) {
        self.bins.fill(0);
        self.count = 0;
        self.sum_us = 0;
        self.min_us = u64::MAX;
        self.max_us = 0;
    }

    fn percentile(&self, pct: f64) -> u64 {
        let target = (self.count as f64 * pct).ceil() as u64;
        let mut cumulative = 0u64;
        for (i, &n) in self.bins.iter().enumerate() {
            cumulative += n;
            if cumulative >= target {
                return i as u64 * BIN_WIDTH_US;
            }
        }
        self.max_us
    }
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::new()
    }
}
