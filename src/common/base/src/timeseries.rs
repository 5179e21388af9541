use std::slice::Iter;

use geomag_utils::time::time_format;

use crate::channel::Channel;
use crate::metadata::StationMetadata;

/// TimeRange holds a min and max timestamp, both inclusive, in unix nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub min: i64,
    pub max: i64,
}

impl TimeRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.min <= other.max && self.max >= other.min
    }

    pub fn contains(&self, t: i64) -> bool {
        self.min <= t && t <= self.max
    }

    /// length is `max - min`, the offset used to step a window backwards.
    pub fn length(&self) -> i64 {
        self.max - self.min
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", time_format(self.min), time_format(self.max))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub channel: Channel,
    /// time of the first sample
    pub starttime: i64,
    /// sample period in nanoseconds
    pub delta: i64,
    pub metadata: StationMetadata,
    /// set when the trace was computed from another channel instead of read
    pub derived_from: Option<Channel>,
    /// set on a stored channel whose values another channel was derived
    /// from; such a trace is never written back as read
    pub reconciled: bool,
}

impl Stats {
    pub fn new(channel: Channel, starttime: i64, delta: i64, metadata: StationMetadata) -> Self {
        Self {
            channel,
            starttime,
            delta,
            metadata,
            derived_from: None,
            reconciled: false,
        }
    }
}

/// Trace is a single channel of evenly spaced samples. `NaN` marks a missing sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub stats: Stats,
    pub data: Vec<f64>,
}

impl Trace {
    pub fn new(stats: Stats, data: Vec<f64>) -> Self {
        Self { stats, data }
    }

    pub fn channel(&self) -> Channel {
        self.stats.channel
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn starttime(&self) -> i64 {
        self.stats.starttime
    }

    /// endtime is the time of the last sample, or one period before
    /// `starttime` for an empty trace.
    pub fn endtime(&self) -> i64 {
        self.stats.starttime + (self.data.len() as i64 - 1) * self.stats.delta
    }

    pub fn time_at(&self, i: usize) -> i64 {
        self.stats.starttime + i as i64 * self.stats.delta
    }

    /// index_of returns the sample index at exactly `t`.
    pub fn index_of(&self, t: i64) -> Option<usize> {
        let offset = t - self.stats.starttime;
        if self.stats.delta <= 0 || offset < 0 || offset % self.stats.delta != 0 {
            return None;
        }
        let i = (offset / self.stats.delta) as usize;
        if i < self.data.len() {
            Some(i)
        } else {
            None
        }
    }

    pub fn value_at(&self, t: i64) -> f64 {
        self.index_of(t).map(|i| self.data[i]).unwrap_or(f64::NAN)
    }

    /// slice returns the samples on this trace's time grid that fall in `range`,
    /// padding with `NaN` where the trace has no samples.
    pub fn slice(&self, range: TimeRange) -> Trace {
        let delta = self.stats.delta;
        let start = self.stats.starttime;

        let first = div_ceil(range.min - start, delta);
        let last = (range.max - start).div_euclid(delta);

        let mut stats = self.stats.clone();
        stats.starttime = start + first * delta;
        if last < first {
            return Trace::new(stats, vec![]);
        }

        let data = (first..=last)
            .map(|k| {
                if k >= 0 && (k as usize) < self.data.len() {
                    self.data[k as usize]
                } else {
                    f64::NAN
                }
            })
            .collect();
        Trace::new(stats, data)
    }

    /// overlay replaces every sample of this trace inside `range` with the
    /// value `other` holds at the same time.
    pub fn overlay(&mut self, other: &Trace, range: TimeRange) {
        for i in 0..self.data.len() {
            let t = self.time_at(i);
            if range.contains(t) {
                self.data[i] = other.value_at(t);
            }
        }
    }

    /// all_missing returns true when no sample holds data.
    pub fn all_missing(&self) -> bool {
        self.data.iter().all(|x| x.is_nan())
    }
}

fn div_ceil(a: i64, b: i64) -> i64 {
    let d = a.div_euclid(b);
    if a.rem_euclid(b) != 0 {
        d + 1
    } else {
        d
    }
}

/// Timeseries is an ordered collection of traces, usually one per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeseries {
    traces: Vec<Trace>,
}

impl Timeseries {
    pub fn new() -> Self {
        Self { traces: vec![] }
    }

    pub fn push(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    pub fn extend(&mut self, other: Timeseries) {
        self.traces.extend(other.traces);
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Trace> {
        self.traces.iter()
    }

    pub fn first(&self) -> Option<&Trace> {
        self.traces.first()
    }

    pub fn select(&self, channel: Channel) -> Option<&Trace> {
        self.traces.iter().find(|t| t.stats.channel == channel)
    }

    pub fn select_mut(&mut self, channel: Channel) -> Option<&mut Trace> {
        self.traces.iter_mut().find(|t| t.stats.channel == channel)
    }

    pub fn remove(&mut self, channel: Channel) -> Option<Trace> {
        let i = self.traces.iter().position(|t| t.stats.channel == channel)?;
        Some(self.traces.remove(i))
    }

    pub fn channels(&self) -> Vec<Channel> {
        let mut channels = vec![];
        for trace in &self.traces {
            if !channels.contains(&trace.stats.channel) {
                channels.push(trace.stats.channel);
            }
        }
        channels
    }

    /// retain keeps only traces of the listed channels.
    pub fn retain(&mut self, channels: &[Channel]) {
        self.traces.retain(|t| channels.contains(&t.stats.channel));
    }

    /// merge joins traces of the same channel into one trace on the grid of the
    /// earliest trace. Later traces win where both hold data.
    pub fn merge(&mut self) {
        let mut merged: Vec<Trace> = Vec::with_capacity(self.traces.len());
        for trace in self.traces.drain(..) {
            match merged
                .iter_mut()
                .find(|m| m.stats.channel == trace.stats.channel)
            {
                Some(m) => *m = merge_traces(m, &trace),
                None => merged.push(trace),
            }
        }
        self.traces = merged;
    }

    /// slice slices every trace to `range`.
    pub fn slice(&self, range: TimeRange) -> Timeseries {
        Self {
            traces: self.traces.iter().map(|t| t.slice(range)).collect(),
        }
    }
}

impl From<Vec<Trace>> for Timeseries {
    fn from(traces: Vec<Trace>) -> Self {
        Self { traces }
    }
}

impl IntoIterator for Timeseries {
    type Item = Trace;
    type IntoIter = std::vec::IntoIter<Trace>;

    fn into_iter(self) -> Self::IntoIter {
        self.traces.into_iter()
    }
}

fn merge_traces(a: &Trace, b: &Trace) -> Trace {
    if b.is_empty() {
        return a.clone();
    }
    if a.is_empty() {
        return b.clone();
    }

    let delta = a.stats.delta;
    let start = a.starttime().min(b.starttime());
    let end = a.endtime().max(b.endtime());

    // keep a's grid phase when b starts earlier
    let start = a.starttime() - div_ceil(a.starttime() - start, delta) * delta;
    let n = ((end - start).div_euclid(delta) + 1) as usize;

    let mut stats = a.stats.clone();
    stats.starttime = start;
    let mut out = Trace::new(stats, vec![f64::NAN; n]);
    for src in [a, b] {
        for (i, v) in src.data.iter().enumerate() {
            if v.is_nan() {
                continue;
            }
            if let Some(j) = out.index_of(src.time_at(i)) {
                out.data[j] = *v;
            }
        }
    }
    out
}
