//! Red-count change tracking against a captured baseline.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Reported when the number of red regions differs from the last report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountChange {
    pub baseline: usize,
    pub previous: usize,
    pub current: usize,
}

impl CountChange {
    pub fn delta(&self) -> i64 {
        self.current as i64 - self.previous as i64
    }
}

#[derive(Debug, Clone, Copy)]
struct Baseline {
    count: usize,
    at: Instant,
}

/// Compares per-frame red counts with a baseline and emits changes.
///
/// After a baseline is set, counts seen during the stable period only update
/// [`current`](Self::current): exposure and white balance are still settling.
/// The first count after the period becomes the reference; every later count
/// that differs from the last reported one produces a [`CountChange`].
/// Callers pass the clock in, so the monitor has no hidden time source.
#[derive(Debug, Clone)]
pub struct RedCountMonitor {
    stable_period: Duration,
    baseline: Option<Baseline>,
    current: Option<usize>,
    last_reported: Option<usize>,
    settled: bool,
}

impl RedCountMonitor {
    pub fn new(stable_period: Duration) -> Self {
        Self {
            stable_period,
            baseline: None,
            current: None,
            last_reported: None,
            settled: false,
        }
    }

    /// Record the baseline count and restart the stable period.
    pub fn set_baseline(&mut self, count: usize, now: Instant) {
        tracing::info!(count, stable_ms = self.stable_period.as_millis() as u64, "baseline set");
        self.baseline = Some(Baseline { count, at: now });
        self.current = Some(count);
        self.last_reported = None;
        self.settled = false;
    }

    pub fn baseline(&self) -> Option<usize> {
        self.baseline.map(|b| b.count)
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn last_reported(&self) -> Option<usize> {
        self.last_reported
    }

    /// Feed the red count of one frame.
    pub fn observe(&mut self, count: usize, now: Instant) -> Option<CountChange> {
        self.current = Some(count);
        let baseline = self.baseline?;

        if now.saturating_duration_since(baseline.at) < self.stable_period {
            return None;
        }
        if !self.settled {
            tracing::info!("stable period over, reporting changes");
            self.settled = true;
        }

        match self.last_reported {
            None => {
                tracing::info!(count, "initial reported count");
                self.last_reported = Some(count);
                None
            }
            Some(previous) if previous != count => {
                let change = CountChange {
                    baseline: baseline.count,
                    previous,
                    current: count,
                };
                tracing::info!(
                    baseline = change.baseline,
                    previous,
                    current = count,
                    delta = change.delta(),
                    "red count changed"
                );
                self.last_reported = Some(count);
                Some(change)
            }
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_secs(2);

    #[test]
    fn test_no_events_without_baseline() {
        let mut m = RedCountMonitor::new(PERIOD);
        let t0 = Instant::now();
        assert_eq!(m.observe(3, t0), None);
        assert_eq!(m.observe(5, t0 + Duration::from_secs(10)), None);
        assert_eq!(m.current(), Some(5));
        assert_eq!(m.baseline(), None);
    }

    #[test]
    fn test_stable_period_suppresses_changes() {
        let mut m = RedCountMonitor::new(PERIOD);
        let t0 = Instant::now();
        m.set_baseline(4, t0);
        assert_eq!(m.observe(1, t0 + Duration::from_millis(500)), None);
        assert_eq!(m.observe(7, t0 + Duration::from_millis(1999)), None);
        assert_eq!(m.current(), Some(7));
        assert_eq!(m.last_reported(), None);
    }

    #[test]
    fn test_first_settled_count_is_reference() {
        let mut m = RedCountMonitor::new(PERIOD);
        let t0 = Instant::now();
        m.set_baseline(4, t0);
        assert_eq!(m.observe(3, t0 + PERIOD), None);
        assert_eq!(m.last_reported(), Some(3));
        assert_eq!(m.observe(3, t0 + PERIOD * 2), None);
    }

    #[test]
    fn test_change_reported_once() {
        let mut m = RedCountMonitor::new(PERIOD);
        let t0 = Instant::now();
        m.set_baseline(4, t0);
        m.observe(4, t0 + PERIOD);

        let change = m.observe(2, t0 + PERIOD * 2).unwrap();
        assert_eq!(change, CountChange { baseline: 4, previous: 4, current: 2 });
        assert_eq!(change.delta(), -2);
        assert_eq!(m.observe(2, t0 + PERIOD * 3), None);

        let change = m.observe(5, t0 + PERIOD * 4).unwrap();
        assert_eq!(change.previous, 2);
        assert_eq!(change.current, 5);
        assert_eq!(change.baseline, 4);
    }

    #[test]
    fn test_rebaseline_restarts_period() {
        let mut m = RedCountMonitor::new(PERIOD);
        let t0 = Instant::now();
        m.set_baseline(4, t0);
        m.observe(4, t0 + PERIOD);

        let t1 = t0 + PERIOD * 5;
        m.set_baseline(6, t1);
        assert_eq!(m.baseline(), Some(6));
        assert_eq!(m.observe(1, t1 + Duration::from_millis(10)), None);
        assert_eq!(m.observe(6, t1 + PERIOD), None);
        assert!(m.observe(5, t1 + PERIOD * 2).is_some());
    }
}
