use common_base::channel::Channel;
use common_base::interval::Interval;
use common_base::store::TimeseriesStore;
use common_base::timeseries::TimeRange;
use common_base::{Error, Result};

use crate::gap::{gap_is_new_data, merge_across_channels, timeseries_gaps};
use crate::processor::Processor;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub range: TimeRange,
    pub interval: Interval,
    /// channels to write, defaults to every processor output channel
    pub output_channels: Option<Vec<Channel>>,
    /// maximum number of windows an update may step back, unbounded when `None`
    pub max_lookback: Option<usize>,
}

impl RunOptions {
    pub fn new(range: TimeRange, interval: Interval) -> Self {
        Self {
            range,
            interval,
            output_channels: None,
            max_lookback: None,
        }
    }

    fn with_range(&self, range: TimeRange) -> Self {
        Self {
            range,
            ..self.clone()
        }
    }
}

/// UpdateReport describes the work done by an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// windows compared, the requested one included
    pub windows: usize,
    /// ranges copied, oldest first
    pub copied: Vec<TimeRange>,
}

/// Controller reads from an input store, runs a processor and writes the
/// result to an output store.
pub struct Controller<I, O, P> {
    input: I,
    output: O,
    processor: P,
}

impl<I, O, P> Controller<I, O, P>
where
    I: TimeseriesStore,
    O: TimeseriesStore,
    P: Processor,
{
    pub fn new(input: I, output: O, processor: P) -> Self {
        Self {
            input,
            output,
            processor,
        }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// output_channels returns the requested channels, each of which the
    /// processor must produce, or all processor outputs.
    fn output_channels(&self, options: &RunOptions) -> Result<Vec<Channel>> {
        let produced = self.processor.output_channels();
        match &options.output_channels {
            Some(requested) => {
                for channel in requested {
                    if !produced.contains(channel) {
                        return Err(Error::InvalidOutputChannel(*channel));
                    }
                }
                Ok(requested.clone())
            }
            None => Ok(produced),
        }
    }

    /// run processes `options.range` and writes it to the output store.
    pub async fn run(&self, options: &RunOptions) -> Result<()> {
        let input_channels = self.processor.input_channels();
        let input_range = self.processor.input_interval(options.range);

        let timeseries = self
            .input
            .get_timeseries(input_range, &input_channels)
            .await?;
        let processed = self.processor.process(timeseries)?;

        let output_channels = self.output_channels(options)?;
        self.output
            .put_timeseries(&processed, options.range, &output_channels)
            .await
    }

    /// run_as_update copies data the output store is missing and the input
    /// store holds.
    ///
    /// While the output is missing data at the start of the window and the
    /// input is not, the previous window of equal length is checked as well.
    /// Gaps are then filled from the oldest window forward.
    pub async fn run_as_update(&self, options: &RunOptions) -> Result<UpdateReport> {
        let input_channels = self.processor.input_channels();
        let output_channels = self.output_channels(options)?;
        let delta = options.interval.delta();

        let mut windows: Vec<Vec<TimeRange>> = vec![];
        let mut range = options.range;
        loop {
            let (source, target) = futures::try_join!(
                self.input.get_timeseries(range, &input_channels),
                self.output.get_timeseries(range, &output_channels),
            )?;

            let source_gaps = merge_across_channels(&timeseries_gaps(
                &source,
                &input_channels,
                range,
                delta,
            ));
            let target_gaps = merge_across_channels(&timeseries_gaps(
                &target,
                &output_channels,
                range,
                delta,
            ));
            info!(
                "update window {}: {} source gaps, {} target gaps",
                range,
                source_gaps.len(),
                target_gaps.len()
            );

            let fills = target_gaps
                .iter()
                .filter(|gap| gap_is_new_data(&source_gaps, gap))
                .map(|gap| gap.range(delta))
                .collect();
            windows.push(fills);

            let source_at_start = source_gaps.first().map_or(true, |g| g.start != range.min);
            let target_missing_start = target_gaps.first().map_or(false, |g| g.start == range.min);
            if !(source_at_start && target_missing_start) {
                break;
            }
            if let Some(max) = options.max_lookback {
                if windows.len() > max {
                    warn!(
                        "update stops stepping back at {} after {} windows",
                        range, max
                    );
                    break;
                }
            }

            range = TimeRange::new(range.min - range.length(), range.min - delta);
        }

        let mut report = UpdateReport {
            windows: windows.len(),
            copied: vec![],
        };
        for fill in windows.into_iter().rev().flatten() {
            debug!("copy {}", fill);
            self.run(&options.with_range(fill)).await?;
            report.copied.push(fill);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use common_base::channel::Channel;
    use common_base::interval::Interval;
    use common_base::metadata::StationMetadata;
    use common_base::store::TimeseriesStore;
    use common_base::timeseries::{Stats, TimeRange, Timeseries, Trace};
    use common_base::{Error, Result};
    use geomag_utils::time::MINUTE;

    use crate::controller::{Controller, RunOptions};
    use crate::processor::PassThrough;

    /// MockStore holds one minute trace per channel and records every call.
    struct MockStore {
        timeseries: Mutex<Timeseries>,
        gets: Mutex<Vec<TimeRange>>,
        puts: Mutex<Vec<TimeRange>>,
    }

    impl MockStore {
        fn new(channels: &[Channel], start: i64, data: Vec<f64>) -> Self {
            let traces = channels
                .iter()
                .map(|c| {
                    Trace::new(
                        Stats::new(*c, start, MINUTE, StationMetadata::default()),
                        data.clone(),
                    )
                })
                .collect::<Vec<_>>();
            Self {
                timeseries: Mutex::new(Timeseries::from(traces)),
                gets: Mutex::new(vec![]),
                puts: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl TimeseriesStore for MockStore {
        async fn get_timeseries(
            &self,
            range: TimeRange,
            channels: &[Channel],
        ) -> Result<Timeseries> {
            self.gets.lock().unwrap().push(range);
            let mut ts = self.timeseries.lock().unwrap().slice(range);
            ts.retain(channels);
            Ok(ts)
        }

        async fn put_timeseries(
            &self,
            timeseries: &Timeseries,
            range: TimeRange,
            channels: &[Channel],
        ) -> Result<()> {
            self.puts.lock().unwrap().push(range);
            let mut stored = self.timeseries.lock().unwrap();
            for channel in channels {
                if let (Some(dst), Some(src)) =
                    (stored.select_mut(*channel), timeseries.select(*channel))
                {
                    dst.overlay(src, range);
                }
            }
            Ok(())
        }
    }

    const CHANNELS: [Channel; 2] = [Channel::H, Channel::Z];

    fn minutes(n: usize, present: impl Fn(usize) -> bool) -> Vec<f64> {
        (0..n)
            .map(|i| if present(i) { i as f64 } else { f64::NAN })
            .collect()
    }

    fn options(min: i64, max: i64) -> RunOptions {
        RunOptions::new(TimeRange::new(min * MINUTE, max * MINUTE), Interval::Minute)
    }

    #[tokio::test]
    async fn test_update_no_backward_when_target_has_start() {
        let source = MockStore::new(&CHANNELS, 0, minutes(120, |_| true));
        let target = MockStore::new(&CHANNELS, 0, minutes(120, |i| i < 100));
        let controller = Controller::new(source, target, PassThrough::new(CHANNELS.to_vec()));

        let report = controller.run_as_update(&options(60, 119)).await.unwrap();
        assert_eq!(report.windows, 1, "unexpected windows: got {}, exp {}", report.windows, 1);
        assert_eq!(
            report.copied,
            vec![TimeRange::new(100 * MINUTE, 119 * MINUTE)]
        );
        assert_eq!(controller.output().gets.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_steps_back() {
        let source = MockStore::new(&CHANNELS, 0, minutes(120, |_| true));
        let target = MockStore::new(&CHANNELS, 0, minutes(120, |i| i < 30));
        let controller = Controller::new(source, target, PassThrough::new(CHANNELS.to_vec()));

        let report = controller.run_as_update(&options(60, 119)).await.unwrap();
        assert_eq!(report.windows, 2);
        // the earlier window is filled first
        assert_eq!(
            report.copied,
            vec![
                TimeRange::new(30 * MINUTE, 59 * MINUTE),
                TimeRange::new(60 * MINUTE, 119 * MINUTE),
            ]
        );
        assert_eq!(
            controller.input().gets.lock().unwrap()[1],
            TimeRange::new(MINUTE, 59 * MINUTE)
        );

        let stored = controller.output().timeseries.lock().unwrap();
        assert!(stored
            .select(Channel::Z)
            .unwrap()
            .data
            .iter()
            .skip(1)
            .all(|v| !v.is_nan()));
    }

    #[tokio::test]
    async fn test_update_skips_gaps_missing_in_source() {
        let source = MockStore::new(&CHANNELS, 0, minutes(120, |i| !(70..90).contains(&i)));
        let target = MockStore::new(&CHANNELS, 0, minutes(120, |i| !(75..85).contains(&i)));
        let controller = Controller::new(source, target, PassThrough::new(CHANNELS.to_vec()));

        let report = controller.run_as_update(&options(60, 119)).await.unwrap();
        assert_eq!(report.windows, 1);
        assert!(report.copied.is_empty());
        assert!(controller.output().puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_max_lookback() {
        let source = MockStore::new(&CHANNELS, -10_000 * MINUTE, minutes(10_120, |_| true));
        let target = MockStore::new(&CHANNELS, 0, vec![]);
        let controller = Controller::new(source, target, PassThrough::new(CHANNELS.to_vec()));

        let mut options = options(60, 119);
        options.max_lookback = Some(2);
        let report = controller.run_as_update(&options).await.unwrap();
        assert_eq!(report.windows, 3);
        assert_eq!(report.copied.len(), 3);
        // each step back ends one sample before the previous start
        assert_eq!(report.copied[0], TimeRange::new(-57 * MINUTE, 0));
    }

    #[tokio::test]
    async fn test_run_validates_output_channels() {
        let source = MockStore::new(&CHANNELS, 0, minutes(10, |_| true));
        let target = MockStore::new(&CHANNELS, 0, minutes(10, |_| false));
        let controller = Controller::new(source, target, PassThrough::new(CHANNELS.to_vec()));

        let mut options = options(0, 9);
        options.output_channels = Some(vec![Channel::F]);
        match controller.run(&options).await {
            Err(Error::InvalidOutputChannel(channel)) => assert_eq!(channel, Channel::F),
            r => panic!("unexpected result: {:?}", r),
        }

        options.output_channels = Some(vec![Channel::Z]);
        controller.run(&options).await.unwrap();
        let stored = controller.output().timeseries.lock().unwrap();
        assert_eq!(stored.select(Channel::Z).unwrap().data[3], 3.0);
        assert!(stored.select(Channel::H).unwrap().data[3].is_nan());
    }
}
