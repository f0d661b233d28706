use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

/// Upload/delete service for cover images and other binary attachments.
/// Implementations return a URL that the document store keeps verbatim.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, name: &str, data: &[u8]) -> Result<String>;
    async fn delete(&self, url: &str) -> Result<()>;
}

/// In-memory backend for tests and local demos.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.objects.lock().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, name: &str, data: &[u8]) -> Result<String> {
        let url = format!("memory://{}/{}", Uuid::new_v4(), name);
        self.objects.lock().insert(url.clone(), data.to_vec());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.objects
            .lock()
            .remove(url)
            .map(|_| ())
            .ok_or_else(|| anyhow!("object not found: {url}"))
    }
}
