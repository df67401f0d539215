use super::{ApiError, AudioSource, SearchOutcome, get_json, stream_to_file};
use crate::config::Config;
use crate::logw;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;

const PAGE_SIZE: u32 = 10;
const FIELDS: &str = "id,name,url,previews,duration";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Previews {
    #[serde(rename = "preview-hq-mp3", default)]
    pub hq_mp3: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sound {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub previews: Option<Previews>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Sound {
    /// Only the high-quality MP3 preview is usable as a soundtrack.
    pub fn hq_mp3_preview(&self) -> Option<&str> {
        self.previews.as_ref()?.hq_mp3.as_deref()
    }

    pub fn summary(&self) -> String {
        match self.duration {
            Some(secs) => format!("sound {} '{}' ({:.1}s)", self.id, self.name, secs),
            None => format!("sound {} '{}'", self.id, self.name),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Sound>,
}

pub fn duration_filter(max_duration_secs: u32) -> String {
    format!("duration:[0 TO {}]", max_duration_secs)
}

pub struct FreesoundClient {
    client: Client,
    api_key: String,
    api_url: String,
    download_dir: PathBuf,
}

impl FreesoundClient {
    pub fn new(client: Client, cfg: &Config, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            api_key: cfg.freesound_key.clone(),
            api_url: cfg.freesound_url.trim_end_matches('/').to_string(),
            download_dir: download_dir.into(),
        }
    }
}

#[async_trait]
impl AudioSource for FreesoundClient {
    async fn search(&self, query: &str, max_duration_secs: u32) -> SearchOutcome<Sound> {
        let request = self
            .client
            .get(format!("{}/search/text/", self.api_url))
            .header("Authorization", format!("Token {}", self.api_key))
            .query(&[
                ("query", query.to_string()),
                ("page_size", PAGE_SIZE.to_string()),
                ("fields", FIELDS.to_string()),
                ("filter", duration_filter(max_duration_secs)),
            ]);

        match get_json::<SearchResponse>(request).await {
            Ok(resp) => SearchOutcome::from_items(resp.results),
            Err(err) => {
                logw(format!("Audio search failed for '{}': {}", query, err));
                SearchOutcome::Failed(err)
            }
        }
    }

    async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf, ApiError> {
        let dest = self.download_dir.join(file_name);
        match stream_to_file(&self.client, url, &dest).await {
            Ok(_) => Ok(dest),
            Err(err) => {
                logw(format!("Audio download failed ({}): {}", file_name, err));
                Err(err)
            }
        }
    }
}
