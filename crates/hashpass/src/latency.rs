use core::time::Duration;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct LatencyState {
    count: u64,
    total_elapsed: Duration,
}

/// Point-in-time view of the submission latency statistics.
///
/// Serializes as `{"total": <count>, "average": <mean microseconds>}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatencySnapshot {
    /// Number of recorded measurements.
    pub total: u64,
    /// Mean duration in whole microseconds, or `0` when nothing is recorded.
    pub average: u64,
}

/// Thread-safe accumulator of `{count, total elapsed}`.
///
/// Both fields are updated together under one lock, so a snapshot never sees
/// a count that disagrees with the accumulated time.
#[derive(Debug, Default)]
pub struct LatencyAggregator {
    state: Mutex<LatencyState>,
}

impl LatencyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, elapsed: Duration) {
        let mut state = self.state.lock();
        state.count += 1;
        state.total_elapsed = state.total_elapsed.saturating_add(elapsed);
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        let state = self.state.lock();
        let average = match state.count {
            0 => 0,
            count => {
                let micros = state.total_elapsed.as_micros() / u128::from(count);
                u64::try_from(micros).unwrap_or(u64::MAX)
            }
        };
        LatencySnapshot {
            total: state.count,
            average,
        }
    }
}
