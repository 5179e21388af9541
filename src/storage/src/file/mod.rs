use std::io;

use bytes::Bytes;
use common_base::{Error, Result};
use opendal::layers::TracingLayer;
use opendal::services::Fs;
use opendal::Operator;

use crate::url::{file_path, FILE_SCHEME};
use crate::{ByteSink, ByteSource};

/// FileStorage reads and writes `file://` urls through an opendal file system
/// operator rooted at `/`. Parent directories are created on write.
#[derive(Clone)]
pub struct FileStorage {
    op: Operator,
}

impl FileStorage {
    pub fn new() -> Result<Self> {
        Self::root("/")
    }

    pub fn root(root: &str) -> Result<Self> {
        let mut builder = Fs::default();
        builder.root(root);

        let op = Operator::new(builder)
            .map_err(|e| Error::retrieval(root, e))?
            .layer(TracingLayer)
            .finish();
        Ok(Self { op })
    }
}

fn relative(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[async_trait]
impl ByteSource for FileStorage {
    async fn fetch(&self, location: &str) -> Result<Bytes> {
        if !location.starts_with(FILE_SCHEME) {
            return Err(Error::retrieval(
                location,
                io::Error::new(io::ErrorKind::Unsupported, "no transport for url scheme"),
            ));
        }

        let path = file_path(location)?;
        let data = self
            .op
            .read(relative(path.as_str()))
            .await
            .map_err(|e| Error::retrieval(location, e))?;
        Ok(Bytes::from(data))
    }
}

#[async_trait]
impl ByteSink for FileStorage {
    async fn store(&self, location: &str, bytes: Bytes) -> Result<()> {
        let path = file_path(location)?;
        tracing::debug!("store {} bytes to {}", bytes.len(), path);
        self.op
            .write(relative(path.as_str()), bytes)
            .await
            .map_err(|e| Error::retrieval(location, e))
    }
}
