use crate::format::{CropPlan, Dimensions};
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub dimensions: Dimensions,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub fps: u32,
}

impl Default for Encoding {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "ultrafast".to_string(),
            fps: 24,
        }
    }
}

/// One trimmed, format-converted piece of a downloaded clip.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentJob {
    pub input: PathBuf,
    pub start: f64,
    pub duration: f64,
    pub plan: CropPlan,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioMix {
    pub path: PathBuf,
    pub volume: f64,
    /// Cut the track at this many seconds. `None` plays it in full.
    pub trim_to: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub video: PathBuf,
    pub audio: Option<AudioMix>,
    pub output: PathBuf,
}

/// Decode/encode backend used by the generator.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn probe_video(&self, path: &Path) -> Result<VideoInfo>;

    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    async fn render_segment(&self, job: &SegmentJob, encoding: &Encoding) -> Result<()>;

    /// Joins segments in order. Inputs may differ in size; each is centered
    /// on `canvas` at native size first.
    async fn concat(
        &self,
        segments: &[PathBuf],
        canvas: Dimensions,
        encoding: &Encoding,
        output: &Path,
    ) -> Result<()>;

    async fn export(&self, job: &ExportJob, encoding: &Encoding) -> Result<()>;
}
