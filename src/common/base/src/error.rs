use std::io;

use crate::channel::Channel;
use crate::interval::Interval;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// wrong byte length or an unreadable header field
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("record count mismatch: {len} bytes is not a multiple of the {record_len} byte record")]
    RecordCountMismatch { len: usize, record_len: usize },

    #[error("invalid channel count: {0}")]
    InvalidChannelCount(String),

    /// a finite sample that scales onto a sentinel or past the 32-bit word
    #[error("sample not representable in a record: {0}")]
    UnrepresentableSample(String),

    #[error("time frame does not cover a full month: {start} - {end}")]
    IncompleteWindow { start: String, end: String },

    #[error("no reconciliation rule for format version {version} with channels \"{channels}\"")]
    UnsupportedReconciliation { version: f64, channels: String },

    #[error("retrieve {location}: {source}")]
    RetrievalError {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("output channel \"{0}\" not produced by processor")]
    InvalidOutputChannel(Channel),

    #[error("missing channel \"{channel}\" for output, available channels {available:?}")]
    MissingChannel {
        channel: Channel,
        available: Vec<Channel>,
    },

    #[error("only file urls are supported for writing: {0}")]
    UnsupportedUrl(String),

    #[error("interval {0} is not stored in this format")]
    UnsupportedInterval(Interval),
}

impl Error {
    pub fn retrieval(location: impl Into<String>, source: impl Into<io::Error>) -> Self {
        Self::RetrievalError {
            location: location.into(),
            source: source.into(),
        }
    }

    /// is_not_found returns true for a retrieval error whose location does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::RetrievalError { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
