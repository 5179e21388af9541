/// StationMetadata describes an observatory and the header values of the records
/// it publishes. Decoders fill it from record headers; encoders read it back.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMetadata {
    pub network: String,
    pub station: String,
    pub data_type: String,
    pub geodetic_latitude: f64,
    pub geodetic_longitude: f64,
    pub elevation: i32,
    /// reported elements, e.g. `XYZG`
    pub channels: String,
    pub agency_name: String,
    pub d_conversion: i32,
    pub data_quality: String,
    pub instrumentation: String,
    pub k_9: i32,
    /// seconds
    pub sensor_sampling_rate: f64,
    pub sensor_orientation: String,
    /// `YYMM`
    pub publication_date: String,
    pub version: f64,
}

impl Default for StationMetadata {
    fn default() -> Self {
        Self {
            network: "NT".to_string(),
            station: String::new(),
            data_type: "definitive".to_string(),
            geodetic_latitude: 0.0,
            geodetic_longitude: 0.0,
            elevation: 0,
            channels: String::new(),
            agency_name: String::new(),
            d_conversion: 0,
            data_quality: String::new(),
            instrumentation: String::new(),
            k_9: 0,
            sensor_sampling_rate: 0.0,
            sensor_orientation: String::new(),
            publication_date: String::new(),
            version: 0.0,
        }
    }
}

impl StationMetadata {
    pub fn for_station(station: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            ..Default::default()
        }
    }
}
