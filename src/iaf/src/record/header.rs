use std::fmt::{Display, Formatter};

use byteorder::{ByteOrder, LittleEndian};
use common_base::metadata::StationMetadata;
use common_base::{Error, Result};
use geomag_utils::time::{from_year_day, year_day};

use crate::record::{HEADER_SCALE, HEADER_WORDS, WORD_SIZE};

pub(crate) const HEADER_SIZE: usize = HEADER_WORDS * WORD_SIZE;

/// FormatVersion is stored as `major * 10 + minor`, so 2.2 is the word 22.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FormatVersion(pub i32);

impl FormatVersion {
    pub const V2_2: FormatVersion = FormatVersion(22);

    pub fn from_f64(version: f64) -> Self {
        Self((version * 10.0).round() as i32)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl Display for FormatVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.as_f64())
    }
}

/// Header holds the 16 leading words of a day record.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub station: String,
    /// `year * 1000 + day_of_year`
    pub date: i32,
    pub geodetic_latitude: f64,
    pub geodetic_longitude: f64,
    pub elevation: i32,
    /// reported elements, e.g. `HDZF`
    pub channels: String,
    pub agency_name: String,
    pub d_conversion: i32,
    pub data_quality: String,
    pub instrumentation: String,
    pub k_9: i32,
    /// seconds
    pub sensor_sampling_rate: f64,
    pub sensor_orientation: String,
    pub publication_date: String,
    pub version: FormatVersion,
}

impl Header {
    /// from_metadata builds the header of the record starting at `day`.
    pub fn from_metadata(
        metadata: &StationMetadata,
        day: i64,
        channels: &str,
        version: FormatVersion,
        publication_date: &str,
    ) -> Self {
        let (year, ordinal) = year_day(day);
        Self {
            station: metadata.station.clone(),
            date: year * 1000 + ordinal as i32,
            geodetic_latitude: metadata.geodetic_latitude,
            geodetic_longitude: metadata.geodetic_longitude,
            elevation: metadata.elevation,
            channels: channels.to_string(),
            agency_name: metadata.agency_name.clone(),
            d_conversion: metadata.d_conversion,
            data_quality: metadata.data_quality.clone(),
            instrumentation: metadata.instrumentation.clone(),
            k_9: metadata.k_9,
            sensor_sampling_rate: metadata.sensor_sampling_rate,
            sensor_orientation: metadata.sensor_orientation.clone(),
            publication_date: publication_date.to_string(),
            version,
        }
    }

    /// starttime returns midnight UTC of the record's day.
    pub fn starttime(&self) -> Result<i64> {
        let year = self.date / 1000;
        let ordinal = self.date % 1000;
        if ordinal <= 0 {
            return Err(Error::MalformedRecord(format!("invalid date {}", self.date)));
        }
        from_year_day(year, ordinal as u32)
            .ok_or_else(|| Error::MalformedRecord(format!("invalid date {}", self.date)))
    }

    /// to_metadata overlays the header values onto `base`, which supplies the
    /// fields a record does not carry (network, data type).
    pub fn to_metadata(&self, base: &StationMetadata) -> StationMetadata {
        StationMetadata {
            network: base.network.clone(),
            station: self.station.clone(),
            data_type: base.data_type.clone(),
            geodetic_latitude: self.geodetic_latitude,
            geodetic_longitude: self.geodetic_longitude,
            elevation: self.elevation,
            channels: self.channels.clone(),
            agency_name: self.agency_name.clone(),
            d_conversion: self.d_conversion,
            data_quality: self.data_quality.clone(),
            instrumentation: self.instrumentation.clone(),
            k_9: self.k_9,
            sensor_sampling_rate: self.sensor_sampling_rate,
            sensor_orientation: self.sensor_orientation.clone(),
            publication_date: self.publication_date.clone(),
            version: self.version.as_f64(),
        }
    }

    pub fn read_from(b: &[u8]) -> Result<Self> {
        if b.len() < HEADER_SIZE {
            return Err(Error::MalformedRecord(format!(
                "short header: {} < {}",
                b.len(),
                HEADER_SIZE
            )));
        }

        let word = |i: usize| LittleEndian::read_i32(&b[i * WORD_SIZE..(i + 1) * WORD_SIZE]);
        let code = |i: usize| read_code(&b[i * WORD_SIZE..(i + 1) * WORD_SIZE]);

        let header = Self {
            station: code(0)?,
            date: word(1),
            geodetic_latitude: word(2) as f64 / HEADER_SCALE,
            geodetic_longitude: word(3) as f64 / HEADER_SCALE,
            elevation: word(4),
            channels: code(5)?,
            agency_name: code(6)?,
            d_conversion: word(7),
            data_quality: code(8)?,
            instrumentation: code(9)?,
            k_9: word(10),
            sensor_sampling_rate: word(11) as f64 / HEADER_SCALE,
            sensor_orientation: code(12)?,
            publication_date: code(13)?,
            version: FormatVersion(word(14)),
            // word 15 is reserved
        };
        header.starttime()?;

        Ok(header)
    }

    pub fn write_to(&self, b: &mut [u8]) {
        let mut words = [[0u8; WORD_SIZE]; HEADER_WORDS];
        let int = |v: i32| {
            let mut w = [0u8; WORD_SIZE];
            LittleEndian::write_i32(&mut w, v);
            w
        };

        words[0] = write_code(self.station.as_str(), true);
        words[1] = int(self.date);
        words[2] = int((self.geodetic_latitude * HEADER_SCALE).round() as i32);
        words[3] = int((self.geodetic_longitude * HEADER_SCALE).round() as i32);
        words[4] = int(self.elevation);
        words[5] = write_code(self.channels.as_str(), false);
        words[6] = write_code(self.agency_name.as_str(), false);
        words[7] = int(self.d_conversion);
        words[8] = write_code(self.data_quality.as_str(), false);
        words[9] = write_code(self.instrumentation.as_str(), false);
        words[10] = int(self.k_9);
        words[11] = int((self.sensor_sampling_rate * HEADER_SCALE).round() as i32);
        words[12] = write_code(self.sensor_orientation.as_str(), false);
        words[13] = write_code(self.publication_date.as_str(), false);
        words[14] = int(self.version.0);
        words[15] = int(0);

        for (i, w) in words.iter().enumerate() {
            b[i * WORD_SIZE..(i + 1) * WORD_SIZE].copy_from_slice(w);
        }
    }
}

/// read_code reads a 4 character code, dropping space and NUL padding.
fn read_code(b: &[u8]) -> Result<String> {
    let s = std::str::from_utf8(b)
        .map_err(|e| Error::MalformedRecord(format!("invalid header code {:?}: {}", b, e)))?;
    Ok(s.trim_matches(|c| c == ' ' || c == '\0').to_string())
}

/// write_code pads or truncates `s` to 4 bytes. Station codes are right-justified.
fn write_code(s: &str, right_justify: bool) -> [u8; WORD_SIZE] {
    let mut w = [b' '; WORD_SIZE];
    let bytes = &s.as_bytes()[..s.len().min(WORD_SIZE)];
    let start = if right_justify {
        WORD_SIZE - bytes.len()
    } else {
        0
    };
    w[start..start + bytes.len()].copy_from_slice(bytes);
    w
}

#[cfg(test)]
mod tests {
    use common_base::metadata::StationMetadata;
    use geomag_utils::time::from_ymd;

    use crate::record::header::{read_code, write_code, FormatVersion, Header, HEADER_SIZE};

    #[test]
    fn test_code_padding() {
        assert_eq!(&write_code("BOU", true), b" BOU");
        assert_eq!(&write_code("XYZ", false), b"XYZ ");
        assert_eq!(&write_code("USGS-LONG", false), b"USGS");
        assert_eq!(read_code(b" BOU").unwrap(), "BOU");
        assert_eq!(read_code(b"HD\0\0").unwrap(), "HD");
        assert!(read_code(&[0xff, 0xfe, b'A', b'B']).is_err());
    }

    #[test]
    fn test_header_words() {
        let metadata = StationMetadata {
            station: "BOU".to_string(),
            geodetic_latitude: 40.137,
            geodetic_longitude: 254.763,
            elevation: 1682,
            agency_name: "USGS".to_string(),
            sensor_sampling_rate: 0.01,
            ..Default::default()
        };
        let day = from_ymd(2015, 2, 1).unwrap();
        let header = Header::from_metadata(&metadata, day, "XYZG", FormatVersion::V2_2, "1503");
        assert_eq!(header.date, 2015032);

        let mut b = [0u8; HEADER_SIZE];
        header.write_to(&mut b);
        assert_eq!(&b[..4], b" BOU");
        assert_eq!(&b[8..12], &40137i32.to_le_bytes());

        let got = Header::read_from(&b).unwrap();
        assert_eq!(got, header);
        assert_eq!(got.starttime().unwrap(), day);
        assert_eq!(got.version.as_f64(), 2.2);
    }

    #[test]
    fn test_header_invalid_date() {
        let mut b = [b' '; HEADER_SIZE];
        b[4..8].copy_from_slice(&2015400i32.to_le_bytes());
        assert!(Header::read_from(&b).is_err());
    }
}
