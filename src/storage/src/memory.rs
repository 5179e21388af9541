use std::collections::HashMap;
use std::io;

use bytes::Bytes;
use common_base::{Error, Result};
use tokio::sync::RwLock;

use crate::{ByteSink, ByteSource};

/// MemoryStorage keeps locations in a map. Useful for piping a single file or
/// standard input through the codec, and for tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn locations(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ByteSource for MemoryStorage {
    async fn fetch(&self, location: &str) -> Result<Bytes> {
        self.entries
            .read()
            .await
            .get(location)
            .cloned()
            .ok_or_else(|| Error::retrieval(location, io::Error::from(io::ErrorKind::NotFound)))
    }
}

#[async_trait]
impl ByteSink for MemoryStorage {
    async fn store(&self, location: &str, bytes: Bytes) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(location.to_string(), bytes);
        Ok(())
    }
}
