use common_base::timeseries::Trace;
use geomag_utils::time::{day_start, next_month_start, month_start, DAY, HOUR};

/// Statistics of the non-missing samples of one bucket. Every field is `NaN`
/// when the bucket holds no data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    /// population standard deviation
    pub standard_deviation: f64,
}

impl Statistics {
    pub fn missing() -> Self {
        Self {
            average: f64::NAN,
            minimum: f64::NAN,
            maximum: f64::NAN,
            standard_deviation: f64::NAN,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.average.is_nan()
    }
}

pub fn statistics(values: &[f64]) -> Statistics {
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut minimum = f64::INFINITY;
    let mut maximum = f64::NEG_INFINITY;
    for v in values.iter().filter(|v| !v.is_nan()) {
        n += 1;
        sum += v;
        minimum = minimum.min(*v);
        maximum = maximum.max(*v);
    }
    if n == 0 {
        return Statistics::missing();
    }

    let average = sum / n as f64;
    let variance = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| (v - average) * (v - average))
        .sum::<f64>()
        / n as f64;

    Statistics {
        average,
        minimum,
        maximum,
        standard_deviation: variance.sqrt(),
    }
}

/// Bucket is a calendar sub-interval used to partition minute data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Hour,
    Day,
    Month,
}

impl Bucket {
    fn floor(&self, t: i64) -> i64 {
        match self {
            Self::Hour => t.div_euclid(HOUR) * HOUR,
            Self::Day => day_start(t),
            Self::Month => month_start(t),
        }
    }

    fn next(&self, t: i64) -> i64 {
        match self {
            Self::Hour => t + HOUR,
            Self::Day => t + DAY,
            Self::Month => next_month_start(t),
        }
    }

    /// boundaries returns the start of every bucket touching `[start, end)`.
    pub fn boundaries(&self, start: i64, end: i64) -> Vec<i64> {
        let mut out = vec![];
        let mut t = self.floor(start);
        while t < end {
            out.push(t);
            t = self.next(t);
        }
        out
    }
}

/// BucketStatistics pairs a bucket's start time with its statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketStatistics {
    pub starttime: i64,
    pub statistics: Statistics,
}

/// aggregate partitions the samples of `trace` within `[start, end)` into
/// calendar buckets by sample time and computes statistics for each. A final
/// partial bucket is aggregated over the samples it has.
pub fn aggregate(trace: &Trace, start: i64, end: i64, bucket: Bucket) -> Vec<BucketStatistics> {
    let boundaries = bucket.boundaries(start, end);
    let mut groups: Vec<Vec<f64>> = vec![vec![]; boundaries.len()];

    for (i, v) in trace.data.iter().enumerate() {
        let t = trace.time_at(i);
        if t < start || t >= end {
            continue;
        }
        let b = boundaries.partition_point(|s| *s <= t);
        if b > 0 {
            groups[b - 1].push(*v);
        }
    }

    boundaries
        .into_iter()
        .zip(groups)
        .map(|(starttime, values)| BucketStatistics {
            starttime,
            statistics: statistics(&values),
        })
        .collect()
}

/// averages returns the average of each bucket.
pub fn averages(trace: &Trace, start: i64, end: i64, bucket: Bucket) -> Vec<f64> {
    aggregate(trace, start, end, bucket)
        .iter()
        .map(|b| b.statistics.average)
        .collect()
}
