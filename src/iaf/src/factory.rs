use bytes::Bytes;
use common_base::channel::Channel;
use common_base::interval::Interval;
use common_base::metadata::StationMetadata;
use common_base::store::TimeseriesStore;
use common_base::timeseries::{Stats, TimeRange, Timeseries, Trace};
use common_base::{Error, Result};
use geomag_storage::url::UrlTemplate;
use geomag_storage::{ByteSink, ByteSource};
use geomag_utils::time::{days, month_start, months, next_month_start, time_format, DAY, MINUTE};

use crate::assembler::{
    decode_days, encode_days, encode_month, DecodeOptions, EncodeOptions, K_DELTA,
};
use crate::reconcile::reconciled_channels;

#[derive(Debug, Clone)]
pub struct IafConfig {
    pub url_template: UrlTemplate,
    pub observatory: String,
    /// channels returned and written when a caller names none
    pub channels: Vec<Channel>,
    pub interval: Interval,
    pub version1_compat: bool,
}

impl IafConfig {
    pub fn new(url_template: impl Into<String>, observatory: impl Into<String>) -> Self {
        Self {
            url_template: UrlTemplate::new(url_template),
            observatory: observatory.into(),
            channels: vec![],
            interval: Interval::Minute,
            version1_compat: false,
        }
    }
}

/// IafFactory stores timeseries as IAF files addressed by a url template,
/// usually one file per observatory and month.
pub struct IafFactory<S> {
    config: IafConfig,
    encode: EncodeOptions,
    metadata: StationMetadata,
    storage: S,
}

impl<S> IafFactory<S>
where
    S: ByteSource + ByteSink,
{
    pub fn new(
        config: IafConfig,
        encode: EncodeOptions,
        metadata: StationMetadata,
        storage: S,
    ) -> Self {
        Self {
            config,
            encode,
            metadata,
            storage,
        }
    }

    pub fn config(&self) -> &IafConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            interval: self.config.interval,
            version1_compat: self.config.version1_compat,
            strict: false,
            metadata: self.metadata.clone(),
        }
    }

    /// decode_bytes decodes an in-memory buffer of day records, such as a
    /// single file or standard input.
    pub fn decode_bytes(&self, b: &[u8]) -> Result<Timeseries> {
        decode_days(b, &self.decode_options())
    }

    fn url(&self, date: i64) -> Result<String> {
        self.config.url_template.render(
            self.config.observatory.as_str(),
            date,
            self.metadata.data_type.as_str(),
            self.config.interval,
        )
    }

    /// files groups the days touched by `[start, end]` by the location they
    /// render to, returning each location with the first and last day it holds.
    fn files(&self, start: i64, end: i64) -> Result<Vec<(String, i64, i64)>> {
        let mut files: Vec<(String, i64, i64)> = vec![];
        for day in days(start, end) {
            let url = self.url(day)?;
            match files.last_mut() {
                Some((last, _, last_day)) if *last == url => *last_day = day,
                _ => files.push((url, day, day)),
            }
        }
        Ok(files)
    }

    async fn read(&self, url: &str) -> Result<Option<Bytes>> {
        match self.storage.fetch(url).await {
            Ok(b) => Ok(Some(b)),
            Err(e) if e.is_not_found() => {
                debug!("no iaf file at {}", url);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn output_channels(&self, timeseries: &Timeseries, channels: &[Channel]) -> Vec<Channel> {
        let requested = if channels.is_empty() {
            self.config.channels.as_slice()
        } else {
            channels
        };
        let channels: Vec<Channel> = requested
            .iter()
            .copied()
            .filter(|c| *c != Channel::K)
            .collect();
        if !channels.is_empty() {
            return channels;
        }

        if timeseries.select(Channel::H).is_some() {
            vec![Channel::H, Channel::D, Channel::Z, Channel::G]
        } else {
            vec![Channel::X, Channel::Y, Channel::Z, Channel::G]
        }
    }

    /// put_file rewrites one file covering `window`, keeping what the file
    /// already holds outside `range`.
    async fn put_file(
        &self,
        url: &str,
        window: TimeRange,
        timeseries: &Timeseries,
        range: TimeRange,
        channels: &[Channel],
    ) -> Result<()> {
        let existing = match self.read(url).await? {
            Some(b) => self.decode_bytes(&b)?,
            None => Timeseries::new(),
        };

        // a derived channel may be absent from `channels`, the stored
        // channel it consumed is blanked regardless
        let reconciled = reconciled_channels(timeseries);

        let mut out = Timeseries::new();
        let k_window = TimeRange::new(window.min, window.max + MINUTE - 1);
        for channel in channels.iter().copied().chain([Channel::K]) {
            let (delta, window) = if channel == Channel::K {
                (K_DELTA, k_window)
            } else {
                (MINUTE, window)
            };
            let source = timeseries.select(channel);
            let metadata = source
                .or_else(|| existing.select(channel))
                .map(|t| t.stats.metadata.clone())
                .unwrap_or_else(|| self.metadata.clone());

            let n = ((window.max - window.min) / delta + 1) as usize;
            let mut stats = Stats::new(channel, window.min, delta, metadata);
            stats.derived_from = source.and_then(|t| t.stats.derived_from);
            stats.reconciled = reconciled.contains(&channel);
            let mut trace = Trace::new(stats, vec![f64::NAN; n]);

            if let Some(old) = existing.select(channel) {
                trace.overlay(old, window);
            }
            if let Some(new) = source {
                trace.overlay(new, range);
            }
            out.push(trace);
        }

        let month = month_start(window.min);
        let b = if window.min == month && window.max == next_month_start(month) - MINUTE {
            encode_month(&out, channels, month, &self.encode)?
        } else {
            encode_days(&out, channels, window, &self.encode)?
        };

        debug!(
            "write iaf {} [{}, {}] channels {:?}",
            url,
            time_format(window.min),
            time_format(window.max),
            channels
        );
        self.storage.store(url, b).await
    }
}

#[async_trait]
impl<S> TimeseriesStore for IafFactory<S>
where
    S: ByteSource + ByteSink,
{
    async fn get_timeseries(&self, range: TimeRange, channels: &[Channel]) -> Result<Timeseries> {
        let mut timeseries = Timeseries::new();
        for (url, _, _) in self.files(range.min, range.max)? {
            if let Some(b) = self.read(url.as_str()).await? {
                timeseries.extend(self.decode_bytes(&b)?);
            }
        }
        timeseries.merge();

        let mut timeseries = timeseries.slice(range);
        let channels = if channels.is_empty() {
            self.config.channels.as_slice()
        } else {
            channels
        };
        if !channels.is_empty() {
            timeseries.retain(channels);
        }
        Ok(timeseries)
    }

    async fn put_timeseries(
        &self,
        timeseries: &Timeseries,
        range: TimeRange,
        channels: &[Channel],
    ) -> Result<()> {
        if !self.config.url_template.is_file() {
            return Err(Error::UnsupportedUrl(
                self.config.url_template.as_str().to_string(),
            ));
        }
        if self.config.interval != Interval::Minute {
            return Err(Error::UnsupportedInterval(self.config.interval));
        }

        let channels = self.output_channels(timeseries, channels);
        let mut files = vec![];
        for month in months(range.min, range.max) {
            let month_end = next_month_start(month) - MINUTE;
            for (url, first, last) in self.files(month, month_end)? {
                let touched = TimeRange::new(first, last + DAY - MINUTE);
                if touched.overlaps(&range) {
                    files.push((url, touched));
                }
            }
        }

        for (url, window) in files {
            self.put_file(url.as_str(), window, timeseries, range, &channels)
                .await?;
        }
        Ok(())
    }
}
