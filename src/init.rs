use crate::logi;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

pub const VIDEO_DOWNLOAD_DIR: &str = "downloads/videos";
pub const AUDIO_DOWNLOAD_DIR: &str = "downloads/audio";
pub const OUTPUT_DIR: &str = "output";

const REQUIRED_DIRS: &[&str] = &[VIDEO_DOWNLOAD_DIR, AUDIO_DOWNLOAD_DIR, OUTPUT_DIR];

pub async fn ensure_directories() -> Result<()> {
    ensure_directories_in(Path::new(".")).await
}

pub async fn ensure_directories_in(root: &Path) -> Result<()> {
    for dir in REQUIRED_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            fs::create_dir_all(&path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            logi(format!("Created directory: {}", path.display()));
        }
    }
    Ok(())
}

pub async fn check_ffmpeg() -> bool {
    match tokio::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
