use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

pub mod freesound;
pub mod pexels;

use freesound::Sound;
use pexels::PexelsVideo;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_CHUNK_BYTES: usize = 8192;
const USER_AGENT: &str = concat!("stock-shorts/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a search call. `Found` always holds at least one item.
#[derive(Debug)]
pub enum SearchOutcome<T> {
    Found(Vec<T>),
    Empty,
    Failed(ApiError),
}

impl<T> SearchOutcome<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Found(items)
        }
    }

    pub fn into_items(self) -> Option<Vec<T>> {
        match self {
            Self::Found(items) => Some(items),
            _ => None,
        }
    }
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> SearchOutcome<PexelsVideo>;
    async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf, ApiError>;
}

#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn search(&self, query: &str, max_duration_secs: u32) -> SearchOutcome<Sound>;
    async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf, ApiError>;
}

pub fn build_client() -> anyhow::Result<Client> {
    build_client_with(REQUEST_TIMEOUT)
}

/// `timeout` bounds connecting and each wait for more data. The transfer as
/// a whole has no deadline, so large downloads on slow links still finish.
fn build_client_with(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

pub(crate) async fn get_json<T>(request: reqwest::RequestBuilder) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }
    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Streams `url` into `dest` without buffering the whole body. A partial
/// file is removed if anything fails.
pub(crate) async fn stream_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
) -> Result<u64, ApiError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let result = write_body(client, url, dest).await;
    if result.is_err() {
        let _ = fs::remove_file(dest).await;
    }
    result
}

async fn write_body(client: &Client, url: &str, dest: &Path) -> Result<u64, ApiError> {
    let mut resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }

    let file = fs::File::create(dest).await?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_BYTES, file);
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    Ok(written)
}
