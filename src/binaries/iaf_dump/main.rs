use std::path::Path;

use anyhow::anyhow;
use clap::Parser;
use common_base::interval::Interval;
use common_base::metadata::StationMetadata;
use geomag_iaf::assembler::{decode_days, DecodeOptions};
use geomag_storage::file::FileStorage;
use geomag_storage::url::FILE_SCHEME;
use geomag_storage::ByteSource;
use geomag_utils::time::time_format;
use serde::Deserialize;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Parser)]
#[clap(about, version, author)]
struct Config {
    /// IAF file to read, `-` for standard input
    #[clap(long)]
    pub path: String,

    /// minute, hourly or daily
    #[clap(long, default_value = "minute")]
    pub interval: String,

    #[clap(long)]
    pub version1_compat: bool,

    /// number of leading samples to print per channel
    #[clap(long, default_value_t = 0)]
    pub rows: usize,
}

async fn read_input(path: &str) -> anyhow::Result<Vec<u8>> {
    if path == "-" {
        let mut b = vec![];
        tokio::io::stdin().read_to_end(&mut b).await?;
        return Ok(b);
    }

    let path = std::fs::canonicalize(Path::new(path))?;
    let url = format!("{}{}", FILE_SCHEME, path.display());
    let b = FileStorage::new()?.fetch(url.as_str()).await?;
    Ok(b.to_vec())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    println!("config: {:?}", config);
    if config.path.is_empty() {
        println!("path MUST not be empty!");
        return Ok(());
    }

    let interval: Interval = config.interval.parse().map_err(|e: String| anyhow!(e))?;
    let b = read_input(config.path.as_str()).await?;

    let options = DecodeOptions {
        interval,
        version1_compat: config.version1_compat,
        strict: false,
        metadata: StationMetadata::default(),
    };
    let timeseries = decode_days(&b, &options)?;

    if let Some(first) = timeseries.first() {
        let m = &first.stats.metadata;
        println!(
            "station {} channels {} version {:.1} lat {:.3} lon {:.3} elevation {} agency {} published {}",
            m.station,
            m.channels,
            m.version,
            m.geodetic_latitude,
            m.geodetic_longitude,
            m.elevation,
            m.agency_name,
            m.publication_date
        );
    }

    for trace in timeseries.iter() {
        let missing = trace.data.iter().filter(|v| v.is_nan()).count();
        println!(
            "| {} | {} | {} | {} samples | {} missing |",
            trace.channel(),
            time_format(trace.starttime()),
            time_format(trace.endtime()),
            trace.len(),
            missing
        );
        for i in 0..config.rows.min(trace.len()) {
            println!("| {} | {:.2}|", time_format(trace.time_at(i)), trace.data[i]);
        }
    }

    Ok(())
}
