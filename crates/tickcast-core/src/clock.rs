//! Monotonic high-resolution clock used to stamp ticks and measure
//! subscriber-side delivery latency.
//!
//! On Linux this is `clock_gettime(CLOCK_MONOTONIC)`, whose origin is shared
//! by every process on the host, so a subscriber can subtract a publisher
//! timestamp directly. The non-Linux fallback measures from a process-local
//! origin and is only meaningful for elapsed-time use.

// ---------------------------------------------------------------------------
// Linux: clock_gettime for a host-wide monotonic origin
// ---------------------------------------------------------------------------

/// Monotonic clock reading in **nanoseconds**.
#[cfg(target_os = "linux")]
#[inline]
pub fn monotonic_ns() -> u64 {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    // SAFETY: CLOCK_MONOTONIC is always valid; on failure the zeroed timespec
    // yields 0 rather than garbage.
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
}

// ---------------------------------------------------------------------------
// Non-Linux: Instant fallback, process-local origin
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "linux"))]
#[inline]
pub fn monotonic_ns() -> u64 {
    use std::{sync::LazyLock, time::Instant};
    static ORIGIN: LazyLock<Instant> = LazyLock::new(Instant::now);
    ORIGIN.elapsed().as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_never_decrease() {
        let mut prev = monotonic_ns();
        for _ in 0..1000 {
            let now = monotonic_ns();
            assert!(now >= prev);
            prev = now;
        }
    }
}
