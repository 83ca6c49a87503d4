//! Time-series alignment for independently sampled data.
//!
//! Level snapshots arrive on their own irregular clock; bars on another.
//! `SampledSeries` answers "what was the most recent sample at or before
//! this instant" without scanning, via binary search over timestamps.
//! Construction validates monotonicity — a non-monotonic stream is a
//! run-fatal contract violation, not something to sort around.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Errors from series construction.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("timestamps not strictly increasing at index {index}")]
    NonMonotonic { index: usize },
}

/// A chronologically sorted series of timestamped samples.
#[derive(Debug, Clone)]
pub struct SampledSeries<T> {
    samples: Vec<(DateTime<Utc>, T)>,
}

impl<T> SampledSeries<T> {
    /// Build a series, validating strict timestamp monotonicity.
    pub fn new(samples: Vec<(DateTime<Utc>, T)>) -> Result<Self, SeriesError> {
        for (i, pair) in samples.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(SeriesError::NonMonotonic { index: i + 1 });
            }
        }
        Ok(Self { samples })
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// The most recent sample at or before `ts`, or `None` if every sample
    /// is later (or the series is empty).
    pub fn latest_at(&self, ts: DateTime<Utc>) -> Option<&T> {
        let idx = self.samples.partition_point(|(t, _)| *t <= ts);
        if idx == 0 {
            None
        } else {
            Some(&self.samples[idx - 1].1)
        }
    }

    /// The sample nearest to `ts` in either direction, provided its
    /// distance is within `tolerance`.
    pub fn nearest_within(&self, ts: DateTime<Utc>, tolerance: Duration) -> Option<&T> {
        if self.samples.is_empty() {
            return None;
        }
        let idx = self.samples.partition_point(|(t, _)| *t <= ts);
        let before = idx.checked_sub(1).map(|i| &self.samples[i]);
        let after = self.samples.get(idx);

        let dist = |sample: &(DateTime<Utc>, T)| (sample.0 - ts).abs();
        let best = match (before, after) {
            (Some(b), Some(a)) => {
                if dist(b) <= dist(a) {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };
        (dist(best) <= tolerance).then_some(&best.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 14, min, 0).unwrap()
    }

    fn series() -> SampledSeries<u32> {
        SampledSeries::new(vec![(ts(0), 0), (ts(10), 1), (ts(30), 2)]).unwrap()
    }

    #[test]
    fn rejects_non_monotonic() {
        let err = SampledSeries::new(vec![(ts(10), 0), (ts(10), 1)]);
        assert!(matches!(err, Err(SeriesError::NonMonotonic { index: 1 })));
    }

    #[test]
    fn latest_at_exact_and_between() {
        let s = series();
        assert_eq!(s.latest_at(ts(10)), Some(&1)); // at-or-before includes exact
        assert_eq!(s.latest_at(ts(29)), Some(&1));
        assert_eq!(s.latest_at(ts(59)), Some(&2));
    }

    #[test]
    fn latest_at_before_first_is_none() {
        let s = series();
        assert_eq!(s.latest_at(ts(0) - Duration::seconds(1)), None);
    }

    #[test]
    fn nearest_within_prefers_closer_side() {
        let s = series();
        // ts(22) is 12 min after sample 1, 8 min before sample 2
        assert_eq!(s.nearest_within(ts(22), Duration::minutes(10)), Some(&2));
        // ts(14) is 4 min after sample 1
        assert_eq!(s.nearest_within(ts(14), Duration::minutes(10)), Some(&1));
    }

    #[test]
    fn nearest_within_tolerance_excludes() {
        let s = series();
        assert_eq!(s.nearest_within(ts(22), Duration::minutes(5)), None);
    }

    #[test]
    fn empty_series_answers_none() {
        let s: SampledSeries<u32> = SampledSeries::new(Vec::new()).unwrap();
        assert_eq!(s.latest_at(ts(5)), None);
        assert_eq!(s.nearest_within(ts(5), Duration::minutes(60)), None);
    }

    #[test]
    fn tie_prefers_earlier_sample() {
        let s = SampledSeries::new(vec![(ts(0), 0), (ts(20), 1)]).unwrap();
        // ts(10) equidistant: earlier sample wins
        assert_eq!(s.nearest_within(ts(10), Duration::minutes(15)), Some(&0));
    }
}
