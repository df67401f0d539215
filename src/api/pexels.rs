use super::{ApiError, SearchOutcome, VideoSource, get_json, stream_to_file};
use crate::config::Config;
use crate::logw;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;

const ORIENTATION: &str = "portrait";

#[derive(Debug, Clone, Deserialize)]
pub struct PexelsVideoFile {
    pub link: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PexelsVideo {
    pub id: u64,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub video_files: Vec<PexelsVideoFile>,
}

impl PexelsVideo {
    /// First encoded rendition listed by the API, whatever its resolution.
    pub fn first_stream_link(&self) -> Option<&str> {
        self.video_files.first().map(|f| f.link.as_str())
    }

    /// Short description for log lines, e.g. `video 42 (1080x1920, 12s)`.
    pub fn summary(&self) -> String {
        let size = match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "size unknown".to_string(),
        };
        match self.duration {
            Some(secs) => format!("video {} ({}, {:.0}s)", self.id, size, secs),
            None => format!("video {} ({})", self.id, size),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

pub struct PexelsClient {
    client: Client,
    api_key: String,
    search_url: String,
    download_dir: PathBuf,
}

impl PexelsClient {
    pub fn new(client: Client, cfg: &Config, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            api_key: cfg.pexels_key.clone(),
            search_url: cfg.pexels_url.clone(),
            download_dir: download_dir.into(),
        }
    }
}

#[async_trait]
impl VideoSource for PexelsClient {
    async fn search(&self, query: &str, limit: u32) -> SearchOutcome<PexelsVideo> {
        let request = self
            .client
            .get(&self.search_url)
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query.to_string()),
                ("per_page", limit.to_string()),
                ("orientation", ORIENTATION.to_string()),
            ]);

        match get_json::<SearchResponse>(request).await {
            Ok(resp) => SearchOutcome::from_items(resp.videos),
            Err(err) => {
                logw(format!("Video search failed for '{}': {}", query, err));
                SearchOutcome::Failed(err)
            }
        }
    }

    async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf, ApiError> {
        let dest = self.download_dir.join(file_name);
        match stream_to_file(&self.client, url, &dest).await {
            Ok(_) => Ok(dest),
            Err(err) => {
                logw(format!("Video download failed ({}): {}", file_name, err));
                Err(err)
            }
        }
    }
}
