use crate::format::Dimensions;
use crate::media::{Encoding, ExportJob, MediaEngine, SegmentJob, VideoInfo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

const INTERMEDIATE_CRF: &str = "20";
const AUDIO_BITRATE: &str = "192k";
const STDERR_TAIL_CHARS: usize = 600;

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let output = Command::new(&args[0])
        .args(&args[1..])
        .output()
        .await
        .with_context(|| format!("Failed to launch {}", args[0]))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr
            .chars()
            .rev()
            .take(STDERR_TAIL_CHARS)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return Err(anyhow::anyhow!(
            "{} exited with {}: {}",
            args[0],
            output.status,
            tail.trim()
        ));
    }

    Ok(())
}

fn base_args() -> Vec<String> {
    ["ffmpeg", "-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn video_encode_args(encoding: &Encoding) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        encoding.video_codec.clone(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        encoding.preset.clone(),
    ]
}

/// Centers an input of any size on the canvas without rescaling it: overflow
/// is cut evenly, the rest is padded black.
fn fit_to_canvas(canvas: Dimensions, fps: u32) -> String {
    let (w, h) = (canvas.width, canvas.height);
    let cut = format!("crop='min(iw,{w})':'min(ih,{h})'");
    let pad = format!("pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black");
    format!("{cut},{pad},setsar=1,fps={fps}")
}

pub fn parse_dimensions(text: &str) -> Option<Dimensions> {
    let line = text.lines().next()?.trim();
    let (w, h) = line.split_once('x')?;
    let w = w.trim().parse::<u32>().ok()?;
    let h = h.trim().trim_end_matches('x').parse::<u32>().ok()?;
    if w == 0 || h == 0 {
        return None;
    }
    Some(Dimensions::new(w, h))
}

pub fn parse_duration(text: &str) -> Option<f64> {
    let duration = text.lines().next()?.trim().parse::<f64>().ok()?;
    if duration.is_finite() && duration > 0.0 {
        Some(duration)
    } else {
        None
    }
}

pub fn segment_args(job: &SegmentJob, encoding: &Encoding) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-ss".to_string(),
        format!("{:.3}", job.start),
        "-t".to_string(),
        format!("{:.3}", job.duration),
        "-i".to_string(),
        job.input.display().to_string(),
        "-vf".to_string(),
        format!("{},fps={}", job.plan.filter(), encoding.fps),
        "-an".to_string(),
    ]);
    args.extend(video_encode_args(encoding));
    args.extend([
        "-crf".to_string(),
        INTERMEDIATE_CRF.to_string(),
        job.output.display().to_string(),
    ]);
    args
}

pub fn concat_args(
    segments: &[PathBuf],
    canvas: Dimensions,
    encoding: &Encoding,
    output: &Path,
) -> Vec<String> {
    let mut args = base_args();
    for seg in segments {
        args.push("-i".to_string());
        args.push(seg.display().to_string());
    }

    let mut graph = String::new();
    let mut labels = String::new();
    for idx in 0..segments.len() {
        graph.push_str(&format!(
            "[{idx}:v]{}[v{idx}];",
            fit_to_canvas(canvas, encoding.fps)
        ));
        labels.push_str(&format!("[v{idx}]"));
    }
    graph.push_str(&format!("{}concat=n={}:v=1:a=0[v]", labels, segments.len()));

    args.extend([
        "-filter_complex".to_string(),
        graph,
        "-map".to_string(),
        "[v]".to_string(),
        "-an".to_string(),
    ]);
    args.extend(video_encode_args(encoding));
    args.extend([
        "-crf".to_string(),
        INTERMEDIATE_CRF.to_string(),
        output.display().to_string(),
    ]);
    args
}

pub fn export_args(job: &ExportJob, encoding: &Encoding) -> Vec<String> {
    let mut args = base_args();
    args.extend(["-i".to_string(), job.video.display().to_string()]);

    match &job.audio {
        Some(mix) => {
            args.extend(["-i".to_string(), mix.path.display().to_string()]);
            let trim = match mix.trim_to {
                Some(secs) => format!("atrim=0:{:.3},asetpts=PTS-STARTPTS,", secs),
                None => String::new(),
            };
            args.extend([
                "-filter_complex".to_string(),
                format!("[1:a]{}volume={:.2}[a]", trim, mix.volume),
                "-map".to_string(),
                "0:v:0".to_string(),
                "-map".to_string(),
                "[a]".to_string(),
            ]);
        }
        None => {
            args.extend(["-map".to_string(), "0:v:0".to_string(), "-an".to_string()]);
        }
    }

    args.extend(video_encode_args(encoding));
    args.extend(["-r".to_string(), encoding.fps.to_string()]);
    if job.audio.is_some() {
        args.extend([
            "-c:a".to_string(),
            encoding.audio_codec.clone(),
            "-b:a".to_string(),
            AUDIO_BITRATE.to_string(),
        ]);
    }
    args.extend([
        "-movflags".to_string(),
        "+faststart".to_string(),
        job.output.display().to_string(),
    ]);
    args
}

pub async fn ffprobe_video_dimensions(path: &Path) -> Result<Dimensions> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe execution failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed for {}", path.display()));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    parse_dimensions(&text)
        .ok_or_else(|| anyhow::anyhow!("Invalid dimensions for {}", path.display()))
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed for {}", path.display()));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    parse_duration(&text).ok_or_else(|| anyhow::anyhow!("Invalid duration for {}", path.display()))
}

/// Media engine backed by the `ffmpeg` and `ffprobe` binaries on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegEngine;

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe_video(&self, path: &Path) -> Result<VideoInfo> {
        let dimensions = ffprobe_video_dimensions(path).await?;
        let duration = ffprobe_duration_seconds(path).await?;
        Ok(VideoInfo {
            dimensions,
            duration,
        })
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        ffprobe_duration_seconds(path).await
    }

    async fn render_segment(&self, job: &SegmentJob, encoding: &Encoding) -> Result<()> {
        run_cmd(&segment_args(job, encoding))
            .await
            .with_context(|| format!("Segment render failed for {}", job.input.display()))
    }

    async fn concat(
        &self,
        segments: &[PathBuf],
        canvas: Dimensions,
        encoding: &Encoding,
        output: &Path,
    ) -> Result<()> {
        if segments.is_empty() {
            return Err(anyhow::anyhow!("Nothing to concatenate"));
        }
        run_cmd(&concat_args(segments, canvas, encoding, output))
            .await
            .context("Concat failed")
    }

    async fn export(&self, job: &ExportJob, encoding: &Encoding) -> Result<()> {
        run_cmd(&export_args(job, encoding))
            .await
            .with_context(|| format!("Export failed for {}", job.output.display()))
    }
}
