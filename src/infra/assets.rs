//! Streaming download of rendered assets.

use std::path::Path;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("asset download failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("asset download from {url} failed with status {status}")]
    Status { status: StatusCode, url: Url },
}

/// An asset whose body has not been read yet.
pub struct Asset {
    url: Url,
    body: BoxStream<'static, Result<Bytes, FetchError>>,
}

impl Asset {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// File extension of the asset, as found in its URL path.
    pub fn extension(&self) -> Option<String> {
        url_extension(&self.url)
    }

    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes, FetchError>> {
        self.body
    }
}

impl std::fmt::Debug for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AssetFetcher {
    http: Client,
}

impl AssetFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Open a streaming read of `url`. Only the response head is awaited here.
    pub async fn fetch(&self, url: &Url) -> Result<Asset, FetchError> {
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        debug!(%url, %status, "asset response");
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.clone(),
            });
        }

        let body = resp.bytes_stream().map_err(FetchError::from).boxed();
        Ok(Asset {
            url: url.clone(),
            body,
        })
    }
}

/// Extension of the last path segment of `url`, without the leading dot.
pub fn url_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    Path::new(segment)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
}
