//! One IAF day record: a 64 byte header followed by minute, hourly, daily and
//! K index groups, all stored as little-endian 32-bit words.
//!
//! | header(16w) | minute 4x1440w | hour 4x24w | day 4x1w | K 8w | reserved 4w |

pub mod codec;
pub mod header;

/// REC_LENGTH is the size in bytes of a single day record.
pub const REC_LENGTH: usize = 23552;

/// size in bytes of a stored word
pub(crate) const WORD_SIZE: usize = 4;

/// number of header words
pub(crate) const HEADER_WORDS: usize = 16;

/// number of channels in each of the minute, hour and day groups
pub const GROUP_CHANNELS: usize = 4;

pub const MINUTES_PER_DAY: usize = 1440;
pub const HOURS_PER_DAY: usize = 24;
pub const K_PER_DAY: usize = 8;

/// number of reserved words closing the record
const TRAILER_WORDS: usize = 4;

/// SENSOR_ABSENT marks samples of a channel with no sensor for the whole day.
pub const SENSOR_ABSENT: i32 = 888888;

/// DATA_MISSING marks samples dropped from an otherwise recorded channel.
pub const DATA_MISSING: i32 = 999999;

/// K_MISSING marks a missing K index.
pub const K_MISSING: i32 = 999;

/// K_MAX is the largest valid K index.
pub const K_MAX: i32 = 9;

/// fixed-point scale of minute, hour and day samples
pub const SAMPLE_SCALE: f64 = 10.0;

/// fixed-point scale of geodetic coordinates and sensor sampling rate
pub const HEADER_SCALE: f64 = 1000.0;

// Word offsets of the data groups, relative to the first data word.
pub(crate) const MINUTE_OFFSET: usize = 0;
pub(crate) const HOUR_OFFSET: usize = MINUTE_OFFSET + GROUP_CHANNELS * MINUTES_PER_DAY;
pub(crate) const DAY_OFFSET: usize = HOUR_OFFSET + GROUP_CHANNELS * HOURS_PER_DAY;
pub(crate) const K_OFFSET: usize = DAY_OFFSET + GROUP_CHANNELS;
pub(crate) const TRAILER_OFFSET: usize = K_OFFSET + K_PER_DAY;
pub(crate) const DATA_WORDS: usize = TRAILER_OFFSET + TRAILER_WORDS;

const _: () = assert!((HEADER_WORDS + DATA_WORDS) * WORD_SIZE == REC_LENGTH);
