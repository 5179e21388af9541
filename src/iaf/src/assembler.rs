use bytes::{Bytes, BytesMut};
use common_base::channel::Channel;
use common_base::interval::Interval;
use common_base::metadata::StationMetadata;
use common_base::timeseries::{Stats, TimeRange, Timeseries, Trace};
use common_base::{Error, Result};
use geomag_utils::time::{days, month_start, next_month_start, time_format, DAY, HOUR, MINUTE};

use crate::aggregate::{averages, Bucket};
use crate::channel_set::{ChannelSeries, ChannelSet};
use crate::reconcile::{prepare_encode, Reconciliation};
use crate::record::codec::{decode_record, encode_record, RecordData};
use crate::record::header::{FormatVersion, Header, HEADER_SIZE};
use crate::record::{K_PER_DAY, REC_LENGTH};

/// sample period of the K index
pub const K_DELTA: i64 = 3 * HOUR;

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// which group to read: minute, hourly or daily values
    pub interval: Interval,
    /// drop the fourth channel of version 1.0 records
    pub version1_compat: bool,
    /// fail on a delta F channel no reconciliation rule covers
    pub strict: bool,
    /// fields a record does not carry, such as network and data type
    pub metadata: StationMetadata,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            interval: Interval::Minute,
            version1_compat: false,
            strict: false,
            metadata: StationMetadata::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub version: FormatVersion,
    /// `YYMM`, defaults to the current month
    pub publication_date: Option<String>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version: FormatVersion::V2_2,
            publication_date: None,
        }
    }
}

impl EncodeOptions {
    fn publication_date(&self) -> String {
        match &self.publication_date {
            Some(p) => p.clone(),
            None => chrono::Utc::now().format("%y%m").to_string(),
        }
    }
}

fn minutes_to_radians(v: f64) -> f64 {
    (v / 60.0).to_radians()
}

fn radians_to_minutes(v: f64) -> f64 {
    v.to_degrees() * 60.0
}

/// decode_days decodes concatenated day records into one trace per channel.
///
/// The channel set, station and reconciliation rule come from the first
/// record. Later records that disagree are decoded with the first record's
/// values and logged.
pub fn decode_days(b: &[u8], options: &DecodeOptions) -> Result<Timeseries> {
    if b.len() % REC_LENGTH != 0 {
        return Err(Error::RecordCountMismatch {
            len: b.len(),
            record_len: REC_LENGTH,
        });
    }

    let delta = match options.interval {
        Interval::Minute | Interval::Hourly | Interval::Daily => options.interval.delta(),
        interval => return Err(Error::UnsupportedInterval(interval)),
    };

    if b.is_empty() {
        return Ok(Timeseries::new());
    }

    let first = Header::read_from(&b[..HEADER_SIZE])?;
    let channel_set = ChannelSet::parse(first.channels.as_str())?;
    let reconciliation = Reconciliation::select(
        first.version.as_f64(),
        &channel_set,
        options.version1_compat,
        options.strict,
    )?;
    let metadata = first.to_metadata(&options.metadata);
    debug!(
        "iaf session station {} channels {} version {}: {:?}",
        metadata.station, metadata.channels, first.version, reconciliation
    );

    let mut timeseries = Timeseries::new();
    for (i, chunk) in b.chunks(REC_LENGTH).enumerate() {
        let record = decode_record(chunk)?;
        let day = record.header.starttime()?;

        if record.header.station != first.station || record.header.channels != first.channels {
            warn!(
                "record {} ({}) header {} {} differs from first record {} {}, keeping first",
                i,
                time_format(day),
                record.header.station,
                record.header.channels,
                first.station,
                first.channels
            );
        }

        let group = match options.interval {
            Interval::Hourly => record.data.hourly,
            Interval::Daily => record.data.daily,
            _ => record.data.minute,
        };

        let mut series = ChannelSeries::new();
        for (slot, values) in channel_set.slots().iter().zip(group) {
            if let Some(channel) = slot {
                series.insert(*channel, values);
            }
        }
        reconciliation.apply(&mut series)?;

        let derived = reconciliation.derived();
        for (channel, mut values) in series {
            if channel == Channel::D {
                values.iter_mut().for_each(|v| *v = minutes_to_radians(*v));
            }
            let mut stats = Stats::new(channel, day, delta, metadata.clone());
            if let Some((to, from)) = derived {
                if to == channel {
                    stats.derived_from = Some(from);
                }
                stats.reconciled = from == channel;
            }
            timeseries.push(Trace::new(stats, values));
        }

        let k_stats = Stats::new(Channel::K, day, K_DELTA, metadata.clone());
        timeseries.push(Trace::new(k_stats, record.data.k));
    }

    timeseries.merge();
    Ok(timeseries)
}

/// encode_days writes one record for every day touched by `range`, with the
/// listed channels in order. Hourly and daily values are computed from the
/// minute data.
pub fn encode_days(
    timeseries: &Timeseries,
    channels: &[Channel],
    range: TimeRange,
    options: &EncodeOptions,
) -> Result<Bytes> {
    let channel_set = ChannelSet::from_channels(channels)?;

    let mut timeseries = timeseries.clone();
    prepare_encode(&mut timeseries);

    let mut traces = Vec::with_capacity(channels.len());
    for channel in channels {
        let trace = timeseries
            .select(*channel)
            .ok_or_else(|| Error::MissingChannel {
                channel: *channel,
                available: timeseries.channels(),
            })?;
        traces.push(trace);
    }
    let metadata = &traces[0].stats.metadata;
    let publication_date = options.publication_date();

    let days = days(range.min, range.max);
    let mut buf = BytesMut::with_capacity(days.len() * REC_LENGTH);
    for day in days {
        let minute_range = TimeRange::new(day, day + DAY - MINUTE);
        let mut data = RecordData::missing();

        for (i, trace) in traces.iter().enumerate() {
            let mut minute = trace.slice(minute_range);
            if minute.stats.delta != MINUTE {
                return Err(Error::InvalidChannelCount(format!(
                    "channel {} is not minute data: delta {}",
                    trace.channel(),
                    trace.stats.delta
                )));
            }
            if trace.channel() == Channel::D {
                minute
                    .data
                    .iter_mut()
                    .for_each(|v| *v = radians_to_minutes(*v));
            }

            data.hourly[i] = averages(&minute, day, day + DAY, Bucket::Hour);
            data.daily[i] = averages(&minute, day, day + DAY, Bucket::Day);
            data.minute[i] = minute.data;
        }

        if let Some(k) = timeseries.select(Channel::K) {
            let mut values = k.slice(TimeRange::new(day, day + DAY - 1)).data;
            values.resize(K_PER_DAY, f64::NAN);
            data.k = values;
        }

        let header = Header::from_metadata(
            metadata,
            day,
            channel_set.code().as_str(),
            options.version,
            publication_date.as_str(),
        );
        buf.extend_from_slice(&encode_record(&header, &data)?);
    }

    Ok(buf.freeze())
}

/// encode_month encodes the calendar month starting at `month`. Every listed
/// channel must cover the month through its last minute.
pub fn encode_month(
    timeseries: &Timeseries,
    channels: &[Channel],
    month: i64,
    options: &EncodeOptions,
) -> Result<Bytes> {
    let start = month_start(month);
    let end = next_month_start(month) - MINUTE;

    for channel in channels {
        if let Some(trace) = timeseries.select(*channel) {
            if trace.starttime() > start || trace.endtime() < end {
                return Err(Error::IncompleteWindow {
                    start: time_format(trace.starttime()),
                    end: time_format(trace.endtime()),
                });
            }
        }
    }

    encode_days(timeseries, channels, TimeRange::new(start, end), options)
}
