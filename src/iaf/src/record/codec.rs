use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};
use common_base::{Error, Result};

use crate::record::header::{Header, HEADER_SIZE};
use crate::record::{
    DATA_MISSING, DATA_WORDS, DAY_OFFSET, GROUP_CHANNELS, HOURS_PER_DAY, HOUR_OFFSET, K_MAX,
    K_MISSING, K_OFFSET, K_PER_DAY, MINUTES_PER_DAY, MINUTE_OFFSET, REC_LENGTH, SAMPLE_SCALE, SENSOR_ABSENT,
    TRAILER_OFFSET,
};

/// RecordData holds the samples of one day record in physical units, `NaN`
/// for missing. Each group has one array per header channel, in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordData {
    /// 4 x 1440
    pub minute: Vec<Vec<f64>>,
    /// 4 x 24
    pub hourly: Vec<Vec<f64>>,
    /// 4 x 1
    pub daily: Vec<Vec<f64>>,
    /// 8 three-hour K indices
    pub k: Vec<f64>,
}

impl RecordData {
    /// missing returns a record with every sample missing.
    pub fn missing() -> Self {
        Self {
            minute: vec![vec![f64::NAN; MINUTES_PER_DAY]; GROUP_CHANNELS],
            hourly: vec![vec![f64::NAN; HOURS_PER_DAY]; GROUP_CHANNELS],
            daily: vec![vec![f64::NAN; 1]; GROUP_CHANNELS],
            k: vec![f64::NAN; K_PER_DAY],
        }
    }

    fn validate(&self) -> Result<()> {
        check_group("minute", &self.minute, MINUTES_PER_DAY)?;
        check_group("hourly", &self.hourly, HOURS_PER_DAY)?;
        check_group("daily", &self.daily, 1)?;
        if self.k.len() != K_PER_DAY {
            return Err(Error::InvalidChannelCount(format!(
                "K group: got {} values, exp {}",
                self.k.len(),
                K_PER_DAY
            )));
        }
        Ok(())
    }
}

fn check_group(name: &str, group: &[Vec<f64>], len: usize) -> Result<()> {
    if group.len() != GROUP_CHANNELS {
        return Err(Error::InvalidChannelCount(format!(
            "{} group: got {} channels, exp {}",
            name,
            group.len(),
            GROUP_CHANNELS
        )));
    }
    for (i, values) in group.iter().enumerate() {
        if values.len() != len {
            return Err(Error::InvalidChannelCount(format!(
                "{} group channel {}: got {} values, exp {}",
                name,
                i,
                values.len(),
                len
            )));
        }
    }
    Ok(())
}

/// DayRecord is a decoded record.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    pub header: Header,
    pub data: RecordData,
}

pub fn decode_record(b: &[u8]) -> Result<DayRecord> {
    if b.len() != REC_LENGTH {
        return Err(Error::MalformedRecord(format!(
            "unexpected record length: got {}, exp {}",
            b.len(),
            REC_LENGTH
        )));
    }

    let header = Header::read_from(&b[..HEADER_SIZE])?;

    let mut words = vec![0i32; DATA_WORDS];
    LittleEndian::read_i32_into(&b[HEADER_SIZE..], &mut words);

    let data = RecordData {
        minute: read_group(&words[MINUTE_OFFSET..HOUR_OFFSET], MINUTES_PER_DAY),
        hourly: read_group(&words[HOUR_OFFSET..DAY_OFFSET], HOURS_PER_DAY),
        daily: read_group(&words[DAY_OFFSET..K_OFFSET], 1),
        k: words[K_OFFSET..TRAILER_OFFSET]
            .iter()
            .map(|v| match *v {
                v @ 0..=K_MAX => v as f64,
                _ => f64::NAN,
            })
            .collect(),
    };

    Ok(DayRecord { header, data })
}

fn read_group(words: &[i32], len: usize) -> Vec<Vec<f64>> {
    words.chunks(len).map(|c| c.iter().map(|v| unscale(*v)).collect()).collect()
}

fn unscale(v: i32) -> f64 {
    match v {
        SENSOR_ABSENT | DATA_MISSING => f64::NAN,
        v => v as f64 / SAMPLE_SCALE,
    }
}

/// encode_record writes exactly one `REC_LENGTH` block. A channel whose minute
/// samples are all missing is written as `SENSOR_ABSENT` in every group; any
/// other missing sample is written as `DATA_MISSING`.
pub fn encode_record(header: &Header, data: &RecordData) -> Result<Bytes> {
    data.validate()?;

    let absent: Vec<bool> = data
        .minute
        .iter()
        .map(|values| values.iter().all(|v| v.is_nan()))
        .collect();

    let mut buf = BytesMut::with_capacity(REC_LENGTH);
    buf.resize(HEADER_SIZE, 0);
    header.write_to(&mut buf[..HEADER_SIZE]);

    for (name, group) in [
        ("minute", &data.minute),
        ("hourly", &data.hourly),
        ("daily", &data.daily),
    ] {
        for (i, (values, absent)) in group.iter().zip(absent.iter()).enumerate() {
            for v in values {
                let w = scale(*v, *absent).ok_or_else(|| {
                    Error::UnrepresentableSample(format!("{} channel {}: {}", name, i, v))
                })?;
                buf.put_i32_le(w);
            }
        }
    }
    for (i, v) in data.k.iter().enumerate() {
        let k = if v.is_nan() {
            K_MISSING
        } else {
            let k = v.round();
            if !(0.0..=K_MAX as f64).contains(&k) {
                return Err(Error::UnrepresentableSample(format!(
                    "K index {}: got {}, exp 0 - {}",
                    i, v, K_MAX
                )));
            }
            k as i32
        };
        buf.put_i32_le(k);
    }
    buf.put_bytes(0, REC_LENGTH - buf.len());

    debug_assert_eq!(buf.len(), REC_LENGTH);
    Ok(buf.freeze())
}

/// scale returns the record word for `v`, or `None` when a finite sample
/// would be read back as a sentinel or does not fit in a word.
fn scale(v: f64, absent: bool) -> Option<i32> {
    if absent {
        return Some(SENSOR_ABSENT);
    }
    if v.is_nan() {
        return Some(DATA_MISSING);
    }

    let scaled = (v * SAMPLE_SCALE).round();
    if !(i32::MIN as f64..=i32::MAX as f64).contains(&scaled) {
        return None;
    }
    match scaled as i32 {
        SENSOR_ABSENT | DATA_MISSING => None,
        w => Some(w),
    }
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};
    use common_base::metadata::StationMetadata;
    use common_base::Error;
    use geomag_utils::time::from_ymd;
    use quickcheck::quickcheck;

    use crate::record::codec::{decode_record, encode_record, RecordData};
    use crate::record::header::{FormatVersion, Header, HEADER_SIZE};
    use crate::record::{
        DATA_MISSING, HOUR_OFFSET, K_MISSING, K_OFFSET, MINUTES_PER_DAY, REC_LENGTH,
        SENSOR_ABSENT,
    };

    fn header() -> Header {
        let metadata = StationMetadata {
            station: "BOU".to_string(),
            geodetic_latitude: 40.137,
            geodetic_longitude: 254.764,
            elevation: 1682,
            agency_name: "USGS".to_string(),
            ..Default::default()
        };
        let day = from_ymd(2015, 1, 1).unwrap();
        Header::from_metadata(&metadata, day, "XYZG", FormatVersion::V2_2, "1501")
    }

    fn data_word(b: &[u8], i: usize) -> i32 {
        let at = HEADER_SIZE + i * 4;
        LittleEndian::read_i32(&b[at..at + 4])
    }

    #[test]
    fn test_encode_fixed_length() {
        let b = encode_record(&header(), &RecordData::missing()).unwrap();
        assert_eq!(
            b.len(),
            REC_LENGTH,
            "unexpected record length: got {}, exp {}",
            b.len(),
            REC_LENGTH
        );
        assert_eq!(data_word(&b, 0), SENSOR_ABSENT);
        assert_eq!(data_word(&b, HOUR_OFFSET), SENSOR_ABSENT);
        assert_eq!(data_word(&b, K_OFFSET), K_MISSING);
    }

    #[test]
    fn test_encode_sentinels() {
        let mut data = RecordData::missing();
        data.minute[0] = vec![20000.0; MINUTES_PER_DAY];
        data.minute[0][5] = f64::NAN;
        data.hourly[0] = vec![20000.0; 24];
        data.k[0] = 3.0;

        let b = encode_record(&header(), &data).unwrap();
        assert_eq!(data_word(&b, 0), 200000);
        assert_eq!(data_word(&b, 5), DATA_MISSING);
        // channel 1 has no minute data
        assert_eq!(data_word(&b, MINUTES_PER_DAY), SENSOR_ABSENT);
        assert_eq!(data_word(&b, HOUR_OFFSET), 200000);
        assert_eq!(data_word(&b, K_OFFSET), 3);
        assert_eq!(data_word(&b, K_OFFSET + 1), K_MISSING);
    }

    #[test]
    fn test_encode_rejects_unrepresentable() {
        for v in [99999.9, 88888.8, 1e12, f64::INFINITY] {
            let mut data = RecordData::missing();
            data.minute[0] = vec![20000.0; MINUTES_PER_DAY];
            data.minute[0][7] = v;
            match encode_record(&header(), &data) {
                Err(Error::UnrepresentableSample(_)) => {}
                r => panic!("unexpected result for {}: {:?}", v, r.map(|b| b.len())),
            }
        }

        // negative values never collide with a sentinel
        let mut data = RecordData::missing();
        data.minute[0] = vec![-99999.9; MINUTES_PER_DAY];
        let b = encode_record(&header(), &data).unwrap();
        assert_eq!(data_word(&b, 0), -999999);
    }

    #[test]
    fn test_k_range() {
        for k in [10.0, -1.0, 12.4] {
            let mut data = RecordData::missing();
            data.k[2] = k;
            assert!(matches!(
                encode_record(&header(), &data),
                Err(Error::UnrepresentableSample(_))
            ));
        }

        let mut data = RecordData::missing();
        data.k = vec![0.0, 9.0, 9.4, f64::NAN, 1.0, 1.0, 1.0, 1.0];
        let mut b = encode_record(&header(), &data).unwrap().to_vec();
        assert_eq!(data_word(&b, K_OFFSET + 2), 9);

        // words outside 0 - 9 read back as missing
        let at = HEADER_SIZE + (K_OFFSET + 4) * 4;
        LittleEndian::write_i32(&mut b[at..at + 4], 42);
        let at = HEADER_SIZE + (K_OFFSET + 5) * 4;
        LittleEndian::write_i32(&mut b[at..at + 4], -3);
        let record = decode_record(&b).unwrap();
        assert_eq!(record.data.k[0], 0.0);
        assert_eq!(record.data.k[1], 9.0);
        assert!(record.data.k[3].is_nan());
        assert!(record.data.k[4].is_nan());
        assert!(record.data.k[5].is_nan());
        assert_eq!(record.data.k[6], 1.0);
    }

    #[test]
    fn test_decode_encoded() {
        let mut data = RecordData::missing();
        for (c, values) in data.minute.iter_mut().enumerate() {
            for (i, v) in values.iter_mut().enumerate() {
                *v = c as f64 * 1000.0 + i as f64 * 0.1;
            }
        }
        data.minute[1][10] = f64::NAN;
        data.daily[2][0] = -12.3;
        data.k = vec![0.0, 1.0, 2.0, 9.0, f64::NAN, 4.0, 5.0, 6.0];

        let b = encode_record(&header(), &data).unwrap();
        let record = decode_record(&b).unwrap();
        assert_eq!(record.header, header());

        for (got, exp) in record.data.minute.iter().zip(data.minute.iter()) {
            for (g, e) in got.iter().zip(exp.iter()) {
                if e.is_nan() {
                    assert!(g.is_nan());
                } else {
                    assert!((g - e).abs() < 0.05, "unexpected sample: got {}, exp {}", g, e);
                }
            }
        }
        assert_eq!(record.data.daily[2][0], -12.3);
        assert_eq!(record.data.k[3], 9.0);
        assert!(record.data.k[4].is_nan());
    }

    #[test]
    fn test_decode_wrong_length() {
        let b = vec![0u8; REC_LENGTH - 4];
        match decode_record(&b) {
            Err(Error::MalformedRecord(_)) => {}
            r => panic!("unexpected result: {:?}", r.map(|r| r.header)),
        }
    }

    #[test]
    fn test_encode_channel_count() {
        let mut data = RecordData::missing();
        data.minute.pop();
        assert!(matches!(
            encode_record(&header(), &data),
            Err(Error::InvalidChannelCount(_))
        ));

        let mut data = RecordData::missing();
        data.hourly[3].push(1.0);
        assert!(matches!(
            encode_record(&header(), &data),
            Err(Error::InvalidChannelCount(_))
        ));

        let mut data = RecordData::missing();
        data.k.truncate(7);
        assert!(matches!(
            encode_record(&header(), &data),
            Err(Error::InvalidChannelCount(_))
        ));
    }

    quickcheck! {
        fn prop_scaling_resolution(samples: Vec<i32>) -> bool {
            let mut data = RecordData::missing();
            for (i, s) in samples.iter().take(MINUTES_PER_DAY).enumerate() {
                // keep clear of the sentinel range
                data.minute[0][i] = (*s % 80_000) as f64 / 7.0;
            }
            let b = match encode_record(&header(), &data) {
                Ok(b) => b,
                Err(_) => return false,
            };
            let got = match decode_record(&b) {
                Ok(r) => r.data,
                Err(_) => return false,
            };
            b.len() == REC_LENGTH
                && data.minute[0].iter().zip(got.minute[0].iter()).all(|(e, g)| {
                    (e.is_nan() && g.is_nan()) || (e - g).abs() <= 0.05 + 1e-9
                })
        }
    }
}
