use common_base::channel::Channel;
use common_base::timeseries::{TimeRange, Timeseries};
use common_base::Result;

/// Processor turns input channels into output channels.
pub trait Processor: Send + Sync {
    fn input_channels(&self) -> Vec<Channel>;

    fn output_channels(&self) -> Vec<Channel>;

    /// input_interval returns the input window needed to produce `range`.
    fn input_interval(&self, range: TimeRange) -> TimeRange {
        range
    }

    fn process(&self, timeseries: Timeseries) -> Result<Timeseries>;
}

/// PassThrough copies its channels unchanged.
#[derive(Debug, Clone)]
pub struct PassThrough {
    channels: Vec<Channel>,
}

impl PassThrough {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }
}

impl Processor for PassThrough {
    fn input_channels(&self) -> Vec<Channel> {
        self.channels.clone()
    }

    fn output_channels(&self) -> Vec<Channel> {
        self.channels.clone()
    }

    fn process(&self, mut timeseries: Timeseries) -> Result<Timeseries> {
        timeseries.retain(&self.channels);
        Ok(timeseries)
    }
}
