use anyhow::anyhow;
use clap::Parser;
use common_base::channel::{parse_channels, Channel};
use common_base::interval::Interval;
use common_base::metadata::StationMetadata;
use common_base::timeseries::TimeRange;
use geomag_iaf::assembler::EncodeOptions;
use geomag_iaf::factory::{IafConfig, IafFactory};
use geomag_storage::file::FileStorage;
use geomag_update::controller::{Controller, RunOptions};
use geomag_update::processor::PassThrough;
use geomag_utils::time::parse_time;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Parser)]
#[clap(about, version, author)]
struct Config {
    /// source url template, e.g. `file:///data/%(OBS)s%(ym)s.BIN`
    #[clap(long)]
    pub input_url: String,

    /// target url template, must be a `file://` url
    #[clap(long)]
    pub output_url: String,

    #[clap(long)]
    pub observatory: String,

    /// first sample, RFC 3339 or `YYYY-MM-DD`
    #[clap(long)]
    pub starttime: String,

    /// last sample, inclusive
    #[clap(long)]
    pub endtime: String,

    #[clap(long, default_value = "minute")]
    pub interval: String,

    /// comma separated channels to copy
    #[clap(long, default_value = "H,D,Z,F")]
    pub outchannels: String,

    #[clap(long)]
    pub version1_compat: bool,

    /// copy only what the target is missing
    #[clap(long)]
    pub update: bool,

    /// maximum number of windows an update steps back
    #[clap(long)]
    pub max_lookback: Option<usize>,

    #[clap(long, default_value = "definitive")]
    pub data_type: String,
}

fn factory(
    config: &Config,
    url: &str,
    channels: &[Channel],
    interval: Interval,
) -> anyhow::Result<IafFactory<FileStorage>> {
    let mut iaf = IafConfig::new(url, config.observatory.as_str());
    iaf.channels = channels.to_vec();
    iaf.interval = interval;
    iaf.version1_compat = config.version1_compat;

    let metadata = StationMetadata {
        data_type: config.data_type.clone(),
        ..StationMetadata::for_station(config.observatory.to_uppercase())
    };
    Ok(IafFactory::new(
        iaf,
        EncodeOptions::default(),
        metadata,
        FileStorage::new()?,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    info!("config: {:?}", config);

    let interval: Interval = config.interval.parse().map_err(|e: String| anyhow!(e))?;
    let channels = parse_channels(config.outchannels.as_str()).map_err(|e| anyhow!(e))?;
    let range = TimeRange::new(
        parse_time(config.starttime.as_str())?,
        parse_time(config.endtime.as_str())?,
    );
    if range.max < range.min {
        return Err(anyhow!("endtime {} before starttime {}", config.endtime, config.starttime));
    }

    let input = factory(&config, config.input_url.as_str(), &channels, interval)?;
    let output = factory(&config, config.output_url.as_str(), &channels, interval)?;
    let controller = Controller::new(input, output, PassThrough::new(channels.clone()));

    let mut options = RunOptions::new(range, interval);
    options.output_channels = Some(channels);
    options.max_lookback = config.max_lookback;

    if config.update {
        let report = controller.run_as_update(&options).await?;
        info!(
            "update compared {} windows, copied {} ranges",
            report.windows,
            report.copied.len()
        );
        for copied in report.copied {
            info!("copied {}", copied);
        }
    } else {
        controller.run(&options).await?;
        info!("copied {}", range);
    }

    Ok(())
}
