use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::{Error, Result};

/// Source of a video's bytes, read chunk by chunk so callers never have to
/// hold a whole file in memory.
#[async_trait]
pub trait VideoBody: Send {
    /// Returns `None` once the body is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

pub struct ResponseBody {
    url: Url,
    response: reqwest::Response,
}

impl ResponseBody {
    pub fn new(url: Url, response: reqwest::Response) -> Self {
        Self { url, response }
    }
}

#[async_trait]
impl VideoBody for ResponseBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        self.response.chunk().await.map_err(|source| Error::Transport {
            url: self.url.clone(),
            source,
        })
    }
}

/// A body that is already fully in memory.
#[cfg(test)]
pub struct MemoryBody(Option<Bytes>);

#[cfg(test)]
impl MemoryBody {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(Some(bytes.into()))
    }
}

#[cfg(test)]
#[async_trait]
impl VideoBody for MemoryBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.0.take())
    }
}
