#[macro_use]
extern crate async_trait;

use bytes::Bytes;
use common_base::Result;

pub mod file;
pub mod memory;
pub mod url;

pub use opendal;

/// ByteSource retrieves raw bytes from a location such as a `file://` url.
#[async_trait]
pub trait ByteSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Bytes>;
}

/// ByteSink stores raw bytes at a location, replacing anything already there.
#[async_trait]
pub trait ByteSink: Send + Sync {
    async fn store(&self, location: &str, bytes: Bytes) -> Result<()>;
}
