use std::ops::Deref;

use common_base::channel::Channel;
use common_base::timeseries::{TimeRange, Timeseries, Trace};
use geomag_utils::interval_set::IntervalSet;
use geomag_utils::time::time_format;

/// Gap is a run of missing samples. `[start, end)` is missing and `next` is
/// where data resumes; `end == next` until gaps are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub start: i64,
    pub end: i64,
    pub next: i64,
}

impl Gap {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            next: end,
        }
    }

    /// range returns the missing samples as an inclusive range, given the
    /// sample period.
    pub fn range(&self, delta: i64) -> TimeRange {
        TimeRange::new(self.start, self.end - delta)
    }
}

impl std::fmt::Display for Gap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            time_format(self.start),
            time_format(self.end)
        )
    }
}

/// gaps scans `missing` flags for samples at `start + i * delta`.
fn gaps<I>(start: i64, delta: i64, missing: I) -> Vec<Gap>
where
    I: IntoIterator<Item = bool>,
{
    let mut gaps = vec![];
    let mut open: Option<i64> = None;
    let mut n = 0i64;
    for (i, missing) in missing.into_iter().enumerate() {
        let t = start + i as i64 * delta;
        match (missing, open) {
            (true, None) => open = Some(t),
            (false, Some(s)) => {
                gaps.push(Gap::new(s, t));
                open = None;
            }
            _ => {}
        }
        n = i as i64 + 1;
    }
    if let Some(s) = open {
        gaps.push(Gap::new(s, start + n * delta));
    }
    gaps
}

/// trace_gaps returns the gaps of a trace in time order. A gap still open at
/// the last sample ends one period after it.
pub fn trace_gaps(trace: &Trace) -> Vec<Gap> {
    gaps(
        trace.starttime(),
        trace.stats.delta,
        trace.data.iter().map(|v| v.is_nan()),
    )
}

/// window_gaps returns the gaps of `channel` on the grid
/// `range.min + k * delta` within `range`. Samples the trace does not hold,
/// or an absent channel, count as missing.
pub fn window_gaps(
    timeseries: &Timeseries,
    channel: Channel,
    range: TimeRange,
    delta: i64,
) -> Vec<Gap> {
    if range.max < range.min {
        return vec![];
    }
    let n = ((range.max - range.min) / delta + 1) as usize;
    let trace = timeseries.select(channel);
    gaps(
        range.min,
        delta,
        (0..n).map(|i| match trace {
            Some(trace) => trace.value_at(range.min + i as i64 * delta).is_nan(),
            None => true,
        }),
    )
}

/// timeseries_gaps returns the window gaps of each listed channel.
pub fn timeseries_gaps(
    timeseries: &Timeseries,
    channels: &[Channel],
    range: TimeRange,
    delta: i64,
) -> Vec<Vec<Gap>> {
    channels
        .iter()
        .map(|channel| window_gaps(timeseries, *channel, range, delta))
        .collect()
}

/// MergedGapSet holds channel-agnostic gaps in time order, none overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedGapSet {
    gaps: Vec<Gap>,
}

impl MergedGapSet {
    /// missing returns the merged gaps as a set of spans.
    pub fn missing(&self) -> IntervalSet {
        let mut set = IntervalSet::new();
        for gap in &self.gaps {
            set.insert(gap.start, gap.end);
        }
        set
    }
}

impl Deref for MergedGapSet {
    type Target = [Gap];

    fn deref(&self) -> &Self::Target {
        self.gaps.as_slice()
    }
}

/// merge_across_channels joins the gaps of all channels. Gaps are ordered by
/// start, with ties kept in channel order, and a gap starting at or before
/// the current merged gap's `next` extends it.
pub fn merge_across_channels(channel_gaps: &[Vec<Gap>]) -> MergedGapSet {
    let mut all: Vec<Gap> = channel_gaps.iter().flatten().copied().collect();
    all.sort_by_key(|g| g.start);

    let mut merged: Vec<Gap> = vec![];
    for gap in all {
        match merged.last_mut() {
            Some(m) if gap.start <= m.next => {
                if gap.end > m.end {
                    m.end = gap.end;
                    m.next = m.next.max(gap.next);
                }
            }
            _ => merged.push(gap),
        }
    }
    MergedGapSet { gaps: merged }
}

/// gap_is_new_data returns false when the source is missing everything the
/// target gap is missing.
pub fn gap_is_new_data(source_gaps: &MergedGapSet, target_gap: &Gap) -> bool {
    !source_gaps
        .missing()
        .covers(target_gap.start, target_gap.end)
}

#[cfg(test)]
mod tests {
    use common_base::channel::Channel;
    use common_base::metadata::StationMetadata;
    use common_base::timeseries::{Stats, TimeRange, Timeseries, Trace};
    use quickcheck::quickcheck;

    use crate::gap::{
        gap_is_new_data, merge_across_channels, timeseries_gaps, trace_gaps, window_gaps, Gap,
    };

    fn trace(channel: Channel, start: i64, data: Vec<f64>) -> Trace {
        Trace::new(
            Stats::new(channel, start, 1, StationMetadata::default()),
            data,
        )
    }

    #[test]
    fn test_trace_gaps() {
        let mut data = vec![1.0; 100];
        for v in data.iter_mut().take(20).skip(10) {
            *v = f64::NAN;
        }
        data[50] = f64::NAN;

        let gaps = trace_gaps(&trace(Channel::H, 0, data));
        assert_eq!(gaps.len(), 2, "unexpected gap count: got {}, exp {}", gaps.len(), 2);
        assert_eq!(gaps[0], Gap::new(10, 20));
        assert_eq!(gaps[0].range(1), TimeRange::new(10, 19));
        assert_eq!(gaps[1], Gap::new(50, 51));
        assert_eq!(gaps[1].range(1), TimeRange::new(50, 50));
    }

    #[test]
    fn test_trailing_gap() {
        let data = vec![1.0, f64::NAN, f64::NAN];
        let gaps = trace_gaps(&trace(Channel::H, 100, data));
        assert_eq!(gaps, vec![Gap::new(101, 103)]);
    }

    #[test]
    fn test_window_gaps() {
        let ts = Timeseries::from(vec![trace(Channel::H, 5, vec![1.0, f64::NAN, 1.0])]);
        let range = TimeRange::new(0, 9);

        let gaps = window_gaps(&ts, Channel::H, range, 1);
        assert_eq!(gaps, vec![Gap::new(0, 5), Gap::new(6, 7), Gap::new(8, 10)]);

        let gaps = window_gaps(&ts, Channel::Z, range, 1);
        assert_eq!(gaps, vec![Gap::new(0, 10)]);

        let all = timeseries_gaps(&ts, &[Channel::H, Channel::Z], range, 1);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_merge_across_channels() {
        let merged = merge_across_channels(&[vec![Gap::new(10, 20)], vec![Gap::new(15, 25)]]);
        assert_eq!(merged.to_vec(), vec![Gap::new(10, 25)]);

        let merged = merge_across_channels(&[vec![Gap::new(10, 20)], vec![Gap::new(30, 40)]]);
        assert_eq!(merged.to_vec(), vec![Gap::new(10, 20), Gap::new(30, 40)]);

        // a gap starting where the merged gap ends joins it
        let merged = merge_across_channels(&[vec![Gap::new(10, 20), Gap::new(20, 22)]]);
        assert_eq!(merged.to_vec(), vec![Gap::new(10, 22)]);

        // contained gaps leave the merged gap untouched
        let merged = merge_across_channels(&[vec![Gap::new(10, 30)], vec![Gap::new(12, 14)]]);
        assert_eq!(merged.to_vec(), vec![Gap::new(10, 30)]);

        assert!(merge_across_channels(&[vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_gap_is_new_data() {
        let target = Gap::new(10, 20);

        let source = merge_across_channels(&[vec![Gap::new(5, 25)]]);
        assert!(!gap_is_new_data(&source, &target));

        let source = merge_across_channels(&[vec![Gap::new(30, 40)]]);
        assert!(gap_is_new_data(&source, &target));

        let source = merge_across_channels(&[vec![Gap::new(12, 15)]]);
        assert!(gap_is_new_data(&source, &target));

        assert!(gap_is_new_data(&merge_across_channels(&[]), &target));
    }

    quickcheck! {
        fn prop_gaps_count_missing(missing: Vec<bool>) -> bool {
            let data: Vec<f64> = missing
                .iter()
                .map(|m| if *m { f64::NAN } else { 1.0 })
                .collect();
            let gaps = trace_gaps(&trace(Channel::H, 0, data));

            let counted: i64 = gaps.iter().map(|g| g.end - g.start).sum();
            let ordered = gaps.windows(2).all(|w| w[0].end < w[1].start);
            let bounded = gaps
                .iter()
                .all(|g| missing[g.start as usize] && missing[(g.end - 1) as usize]);
            counted == missing.iter().filter(|m| **m).count() as i64 && ordered && bounded
        }
    }
}
