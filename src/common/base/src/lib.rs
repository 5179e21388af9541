pub mod channel;
pub mod error;
pub mod interval;
pub mod metadata;
pub mod store;
pub mod timeseries;

pub use error::{Error, Result};
