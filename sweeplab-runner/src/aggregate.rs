//! Entry-timeframe to structure-timeframe aggregation.
//!
//! Structure bars derive from the base entry-timeframe series, so the two
//! stay mutually consistent. A structure bar is emitted only once its final
//! constituent entry bar closes — the state machine never sees a partially
//! formed bar, which keeps the replay free of look-ahead.

use chrono::{DateTime, TimeZone, Utc};
use sweeplab_core::domain::{Bar, Timeframe};

#[derive(Debug, Clone)]
struct Bucket {
    start: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Bucket {
    fn from_bar(start: DateTime<Utc>, bar: &Bar) -> Self {
        Self {
            start,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }

    fn fold(&mut self, bar: &Bar) {
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.close = bar.close;
        self.volume += bar.volume;
    }

    fn finish(self, timeframe: Timeframe) -> Bar {
        Bar {
            timestamp: self.start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            timeframe,
        }
    }
}

/// Incremental aggregator folding entry bars into structure buckets.
#[derive(Debug, Clone)]
pub struct TimeframeAggregator {
    target: Timeframe,
    bucket: Option<Bucket>,
}

impl TimeframeAggregator {
    pub fn new(target: Timeframe) -> Self {
        Self { target, bucket: None }
    }

    /// Fold one entry bar; returns any structure bars completed by it.
    ///
    /// Two bars can come back at once when a gap in the entry stream leaves
    /// a stale bucket open: the stale bucket flushes, and the new bar may
    /// itself complete its own bucket.
    pub fn push(&mut self, bar: &Bar) -> Vec<Bar> {
        let mut out = Vec::new();
        let start = bucket_start(bar.timestamp, self.target);

        match self.bucket.take() {
            Some(mut bucket) if bucket.start == start => {
                bucket.fold(bar);
                self.bucket = Some(bucket);
            }
            Some(stale) => {
                // Gap: the open bucket belongs to an earlier window.
                out.push(stale.finish(self.target));
                self.bucket = Some(Bucket::from_bar(start, bar));
            }
            None => self.bucket = Some(Bucket::from_bar(start, bar)),
        }

        // The bucket completes when this entry bar's close reaches the
        // bucket's end.
        let bucket_end = start + self.target.duration();
        if bar.close_time() >= bucket_end {
            if let Some(done) = self.bucket.take() {
                out.push(done.finish(self.target));
            }
        }
        out
    }
}

/// Truncate a timestamp to the start of its bucket.
fn bucket_start(ts: DateTime<Utc>, target: Timeframe) -> DateTime<Utc> {
    let secs = target.minutes() * 60;
    let epoch = ts.timestamp();
    Utc.timestamp_opt(epoch - epoch.rem_euclid(secs), 0)
        .single()
        .expect("truncated epoch is always a valid timestamp")
}
