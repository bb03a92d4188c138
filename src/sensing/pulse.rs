/// Pulse counting and smoothed RPM estimation.
use std::sync::atomic::{AtomicU32, Ordering};

/// Rising-edge counter shared between the speed-sensor edge handler and
/// the window-boundary reader.
///
/// This is the only datum shared across execution contexts in the
/// sensing node. The edge handler does nothing but one atomic add (no
/// I/O, no float math), and the reader claims the accumulated count with
/// a single atomic exchange, so no edge is lost and no edge lands in two
/// consecutive windows.
#[derive(Debug, Default)]
pub struct PulseCounter {
    edges: AtomicU32,
}

impl PulseCounter {
    pub fn new() -> Self {
        PulseCounter {
            edges: AtomicU32::new(0),
        }
    }

    /// Record one qualifying edge. Safe to call from any context,
    /// concurrently with `take`.
    pub fn record_edge(&self) {
        self.edges.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically read and reset the counter at a window boundary.
    pub fn take(&self) -> u32 {
        self.edges.swap(0, Ordering::AcqRel)
    }
}

/// Exponential smoothing over per-window pulse rates.
///
/// Seeded to zero at startup; the first non-zero raw reading seeds the
/// estimate directly, after which each window averages the previous
/// smoothed value with the new raw value 1:1. A raw count of zero snaps
/// the estimate straight to zero: a stalled shaft must be reported
/// without lag, while a running shaft is smoothed.
#[derive(Debug, Default)]
pub struct RpmEstimator {
    smoothed: u32,
}

impl RpmEstimator {
    pub fn new() -> Self {
        RpmEstimator { smoothed: 0 }
    }

    /// Fold one window's pulse count into the estimate and return the
    /// new smoothed RPM. `rpm_factor` encodes pulses-per-revolution and
    /// the window-to-per-minute conversion together.
    pub fn update(&mut self, pulse_count: u32, rpm_factor: u32) -> u32 {
        if pulse_count == 0 {
            self.smoothed = 0;
            return 0;
        }
        let raw = pulse_count.saturating_mul(rpm_factor);
        self.smoothed = if self.smoothed == 0 {
            raw
        } else {
            // Widen for the sum: a saturated raw estimate plus a large
            // prior value would overflow u32.
            ((u64::from(self.smoothed) + u64::from(raw)) / 2) as u32
        };
        self.smoothed
    }

    pub fn current(&self) -> u32 {
        self.smoothed
    }
}
