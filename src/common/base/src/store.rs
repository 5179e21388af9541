use crate::channel::Channel;
use crate::error::Result;
use crate::timeseries::{TimeRange, Timeseries};

/// TimeseriesStore reads and writes decoded timeseries.
#[async_trait::async_trait]
pub trait TimeseriesStore: Send + Sync {
    /// get_timeseries returns the requested channels over `range`. A store with
    /// no data for the range returns an empty or all-`NaN` timeseries, not an error.
    async fn get_timeseries(&self, range: TimeRange, channels: &[Channel]) -> Result<Timeseries>;

    /// put_timeseries stores the listed channels of `timeseries` within `range`.
    /// Writes may be partitioned by day or month; partitions already written
    /// are kept when a later partition fails.
    async fn put_timeseries(
        &self,
        timeseries: &Timeseries,
        range: TimeRange,
        channels: &[Channel],
    ) -> Result<()>;
}
