use std::path::{Path, PathBuf};
use std::sync::Arc;

use binstage_verify::{Hasher, Sha256Hasher};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::context::RequestContext;
use crate::error::{FetchError, Result};
use crate::http::{HttpClient, HttpResponse};

/// A file written by [`Fetcher::fetch_to_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub path:   PathBuf,
    pub size:   u64,
    pub sha256: Vec<u8>,
}

/// Issues GET requests through an [`HttpClient`] under a [`RequestContext`].
///
/// Non-2xx responses become [`FetchError::Status`]; no retries are attempted.
pub struct Fetcher<C: HttpClient> {
    client:  C,
    headers: Arc<[(String, String)]>,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            headers: Arc::from(Vec::new()),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    pub fn client(&self) -> &C { &self.client }

    async fn open(&self, url: &str) -> Result<HttpResponse<C::Error>> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url, &self.headers)
            .await
            .map_err(|e| FetchError::network(url, e))?;

        if !response.is_success() {
            tracing::debug!(%url, status = response.status, "unexpected status");
            return Err(FetchError::Status {
                url:    url.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    }

    /// Fetch the whole body into memory.
    pub async fn fetch_bytes(&self, url: &str, ctx: &RequestContext) -> Result<Bytes> {
        ctx.run(url, async {
            let response = self.open(url).await?;
            let mut buf = BytesMut::with_capacity(response.content_length.unwrap_or(0).min(1 << 20) as usize);
            let mut body = response.body;
            while let Some(chunk) = body.next().await {
                buf.extend_from_slice(&chunk.map_err(|e| FetchError::network(url, e))?);
            }
            tracing::debug!(%url, bytes = buf.len(), "fetched");
            Ok(buf.freeze())
        })
        .await
    }

    /// Stream the body into `dest`, hashing it on the way.
    ///
    /// A partially written file is removed before the error is returned.
    pub async fn fetch_to_file(&self, url: &str, dest: &Path, ctx: &RequestContext) -> Result<FetchedFile> {
        let result = ctx.run(url, self.stream_to_file(url, dest)).await;
        if result.is_err() {
            match tokio::fs::remove_file(dest).await {
                Ok(()) => tracing::debug!(path = %dest.display(), "removed partial download"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %dest.display(), error = %e, "failed to remove partial download"),
            }
        }
        result
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> Result<FetchedFile> {
        let io_err = |source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        };

        let response = self.open(url).await?;
        let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;
        let mut hasher = Sha256Hasher::new();
        let mut size = 0u64;

        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| FetchError::network(url, e))?;
            hasher.update(&chunk);
            file.write_all(&chunk).await.map_err(io_err)?;
            size += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;

        tracing::debug!(%url, path = %dest.display(), bytes = size, "downloaded");
        Ok(FetchedFile {
            path: dest.to_path_buf(),
            size,
            sha256: hasher.finalize(),
        })
    }
}
