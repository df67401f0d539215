use crate::api::freesound::FreesoundClient;
use crate::api::pexels::PexelsClient;
use crate::api::{self, AudioSource, VideoSource};
use crate::config::Config;
use crate::ffmpeg::FfmpegEngine;
use crate::format::ShortsFormat;
use crate::init::{AUDIO_DOWNLOAD_DIR, OUTPUT_DIR, VIDEO_DOWNLOAD_DIR};
use crate::media::{AudioMix, Encoding, ExportJob, MediaEngine, SegmentJob};
use crate::random::{RandomSource, ThreadRandom};
use crate::themes::{THEME_SETS, ThemeSet};
use crate::{loge, logi, logok, logw};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Fixed parameters of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub clips_per_run: usize,
    pub min_clips: usize,
    pub search_limit: u32,
    pub clip_seconds: f64,
    pub request_pause: Duration,
    pub audio_max_duration: u32,
    pub audio_volume: f64,
    pub format: ShortsFormat,
    pub encoding: Encoding,
    pub output_dir: PathBuf,
    pub output_prefix: String,
}

impl Default for GenerationPlan {
    fn default() -> Self {
        Self {
            clips_per_run: 3,
            min_clips: 2,
            search_limit: 5,
            clip_seconds: 3.0,
            request_pause: Duration::from_secs(2),
            audio_max_duration: 30,
            audio_volume: 0.7,
            format: ShortsFormat::default(),
            encoding: Encoding::default(),
            output_dir: PathBuf::from(OUTPUT_DIR),
            output_prefix: "shorts_".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Produced {
        path: PathBuf,
        segments: usize,
        with_audio: bool,
    },
    InsufficientClips {
        downloaded: usize,
    },
    AssemblyFailed,
}

fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

pub struct ShortsGenerator {
    plan: GenerationPlan,
    videos: Box<dyn VideoSource>,
    sounds: Box<dyn AudioSource>,
    media: Box<dyn MediaEngine>,
    random: Box<dyn RandomSource>,
}

impl ShortsGenerator {
    pub fn new(
        plan: GenerationPlan,
        videos: Box<dyn VideoSource>,
        sounds: Box<dyn AudioSource>,
        media: Box<dyn MediaEngine>,
        random: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            plan,
            videos,
            sounds,
            media,
            random,
        }
    }

    pub async fn generate(&mut self) -> RunOutcome {
        let theme = &THEME_SETS[self.random.pick_index(THEME_SETS.len())];
        logi(format!("Selected theme: {}", theme.name));

        let clips = self.collect_clips(theme).await;
        if clips.len() < self.plan.min_clips {
            loge(format!(
                "Not enough clips to build a video: {} downloaded, {} required",
                clips.len(),
                self.plan.min_clips
            ));
            return RunOutcome::InsufficientClips {
                downloaded: clips.len(),
            };
        }
        logok(format!("Clips downloaded: {}", clips.len()));

        let audio = self.collect_audio(theme).await;
        if audio.is_none() {
            logw("No background audio; the video will be silent.");
        }

        logi("Building final video...");
        match self.assemble(&clips, audio.as_deref()).await {
            Ok((path, with_audio)) => {
                logok(format!("Video created: {}", path.display()));
                RunOutcome::Produced {
                    path,
                    segments: clips.len(),
                    with_audio,
                }
            }
            Err(err) => {
                loge(format!("Video assembly failed: {:#}", err));
                RunOutcome::AssemblyFailed
            }
        }
    }

    async fn collect_clips(&mut self, theme: &ThemeSet) -> Vec<PathBuf> {
        let mut clips = Vec::with_capacity(self.plan.clips_per_run);

        for index in 0..self.plan.clips_per_run {
            let query = theme.video_queries[self.random.pick_index(theme.video_queries.len())];
            logi(format!("Searching video: {}", query));

            let Some(videos) = self
                .videos
                .search(query, self.plan.search_limit)
                .await
                .into_items()
            else {
                logw(format!("No usable video for '{}', skipping clip {}", query, index));
                continue;
            };

            let video = &videos[self.random.pick_index(videos.len())];
            logi(format!("Picked {}", video.summary()));
            let Some(link) = video.first_stream_link() else {
                logw(format!(
                    "Video {} has no downloadable files, skipping clip {}",
                    video.id, index
                ));
                continue;
            };

            let file_name = format!("clip_{}_{}.mp4", index, unix_timestamp());
            if let Ok(path) = self.videos.download(link, &file_name).await {
                logok(format!("Downloaded: {}", file_name));
                clips.push(path);
            }

            if !self.plan.request_pause.is_zero() {
                tokio::time::sleep(self.plan.request_pause).await;
            }
        }

        clips
    }

    async fn collect_audio(&mut self, theme: &ThemeSet) -> Option<PathBuf> {
        let query = theme.audio_queries[self.random.pick_index(theme.audio_queries.len())];
        logi(format!("Searching audio: {}", query));

        let Some(sounds) = self
            .sounds
            .search(query, self.plan.audio_max_duration)
            .await
            .into_items()
        else {
            logw(format!("No usable audio for '{}'", query));
            return None;
        };

        let sound = &sounds[self.random.pick_index(sounds.len())];
        logi(format!("Picked {}", sound.summary()));
        let Some(preview) = sound.hq_mp3_preview() else {
            logw(format!("Sound '{}' has no HQ mp3 preview", sound.name));
            return None;
        };

        let file_name = format!("background_{}.mp3", unix_timestamp());
        let path = self.sounds.download(preview, &file_name).await.ok()?;
        logok(format!("Downloaded audio: {}", file_name));
        Some(path)
    }

    /// Renders, joins and exports. Intermediate files live in a per-run
    /// work directory that is removed whatever the result.
    async fn assemble(
        &mut self,
        clips: &[PathBuf],
        audio: Option<&Path>,
    ) -> Result<(PathBuf, bool)> {
        let work = tempfile::Builder::new()
            .prefix("stock-shorts-")
            .tempdir()
            .context("Failed to create work directory")?;

        let result = self.compose(work.path(), clips, audio).await;

        let work_path = work.path().to_path_buf();
        match work.close() {
            Ok(()) => logi(format!("Released intermediate files in {}", work_path.display())),
            Err(err) => logw(format!("Failed to remove {}: {}", work_path.display(), err)),
        }

        result
    }

    async fn compose(
        &mut self,
        work_dir: &Path,
        clips: &[PathBuf],
        audio: Option<&Path>,
    ) -> Result<(PathBuf, bool)> {
        let mut segments = Vec::with_capacity(clips.len());
        for (idx, clip) in clips.iter().enumerate() {
            let job = self.plan_segment(idx, clip, work_dir).await?;
            logi(format!(
                "Segment {}: {:.2}s from {:.2}s, crop {}x{} -> {}x{}",
                idx,
                job.duration,
                job.start,
                job.plan.window.width,
                job.plan.window.height,
                job.plan.canvas.width,
                job.plan.canvas.height
            ));
            self.media.render_segment(&job, &self.plan.encoding).await?;
            segments.push(job.output);
        }

        let joined = work_dir.join("concat.mp4");
        self.media
            .concat(&segments, self.plan.format.canvas, &self.plan.encoding, &joined)
            .await?;
        let video_duration = self
            .media
            .probe_duration(&joined)
            .await
            .context("Failed to probe concatenated video")?;
        logok(format!("Concatenated {} segments ({:.2}s)", segments.len(), video_duration));

        let audio = match audio {
            Some(path) => self.audio_mix(path, video_duration).await,
            None => None,
        };
        let with_audio = audio.is_some();

        fs::create_dir_all(&self.plan.output_dir).await.with_context(|| {
            format!("Failed to create {}", self.plan.output_dir.display())
        })?;
        let output = self.plan.output_dir.join(format!(
            "{}{}.mp4",
            self.plan.output_prefix,
            unix_timestamp()
        ));
        let job = ExportJob {
            video: joined,
            audio,
            output: output.clone(),
        };

        if let Err(err) = self.media.export(&job, &self.plan.encoding).await {
            if fs::remove_file(&output).await.is_ok() {
                logw(format!("Removed partial output {}", output.display()));
            }
            return Err(err);
        }

        Ok((output, with_audio))
    }

    async fn plan_segment(
        &mut self,
        idx: usize,
        clip: &Path,
        work_dir: &Path,
    ) -> Result<SegmentJob> {
        let info = self
            .media
            .probe_video(clip)
            .await
            .with_context(|| format!("Failed to probe {}", clip.display()))?;

        let duration = self.plan.clip_seconds.min(info.duration);
        let start = if info.duration > duration {
            self.random.uniform(0.0, info.duration - duration)
        } else {
            0.0
        };

        Ok(SegmentJob {
            input: clip.to_path_buf(),
            start,
            duration,
            plan: self.plan.format.plan(info.dimensions),
            output: work_dir.join(format!("segment_{}.mp4", idx)),
        })
    }

    /// Volume-scaled track, cut to the video length when longer. An
    /// undecodable file is dropped instead of failing the run.
    async fn audio_mix(&self, path: &Path, video_duration: f64) -> Option<AudioMix> {
        let audio_duration = match self.media.probe_duration(path).await {
            Ok(d) => d,
            Err(err) => {
                logw(format!("Background audio unusable ({}): {:#}", path.display(), err));
                return None;
            }
        };

        let trim_to = (audio_duration > video_duration).then_some(video_duration);
        if let Some(secs) = trim_to {
            logi(format!("Trimming audio {:.2}s -> {:.2}s", audio_duration, secs));
        }

        Some(AudioMix {
            path: path.to_path_buf(),
            volume: self.plan.audio_volume,
            trim_to,
        })
    }
}

/// Builds the production generator from `cfg` and runs it once.
pub async fn run_generation(cfg: &Config) -> Result<RunOutcome> {
    let client = api::build_client()?;
    let videos = PexelsClient::new(client.clone(), cfg, VIDEO_DOWNLOAD_DIR);
    let sounds = FreesoundClient::new(client, cfg, AUDIO_DOWNLOAD_DIR);

    let mut generator = ShortsGenerator::new(
        GenerationPlan::default(),
        Box::new(videos),
        Box::new(sounds),
        Box::new(FfmpegEngine),
        Box::new(ThreadRandom::new()),
    );

    Ok(generator.generate().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::freesound::{Previews, Sound};
    use crate::api::pexels::{PexelsVideo, PexelsVideoFile};
    use crate::api::{ApiError, SearchOutcome};
    use crate::format::Dimensions;
    use crate::media::VideoInfo;
    use crate::random::ScriptedRandom;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn video(id: u64) -> PexelsVideo {
        PexelsVideo {
            id,
            width: Some(1920),
            height: Some(1080),
            duration: Some(10.0),
            video_files: vec![PexelsVideoFile {
                link: format!("https://cdn.test/{}.mp4", id),
            }],
        }
    }

    fn sound(id: u64, with_hq: bool) -> Sound {
        Sound {
            id,
            name: format!("sound {}", id),
            previews: Some(Previews {
                hq_mp3: with_hq.then(|| format!("https://cdn.test/{}-hq.mp3", id)),
            }),
            duration: Some(40.0),
        }
    }

    #[derive(Default)]
    struct SourceLog {
        searches: Vec<(String, u32)>,
        downloads: Vec<(String, String)>,
    }

    #[derive(Default)]
    struct FakeVideos {
        results: HashMap<&'static str, Vec<PexelsVideo>>,
        failing_queries: HashSet<&'static str>,
        broken_links: HashSet<String>,
        log: Arc<Mutex<SourceLog>>,
    }

    #[async_trait]
    impl VideoSource for FakeVideos {
        async fn search(&self, query: &str, limit: u32) -> SearchOutcome<PexelsVideo> {
            self.log.lock().unwrap().searches.push((query.to_string(), limit));
            if self.failing_queries.contains(query) {
                return SearchOutcome::Failed(ApiError::Status(503));
            }
            SearchOutcome::from_items(self.results.get(query).cloned().unwrap_or_default())
        }

        async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf, ApiError> {
            self.log
                .lock()
                .unwrap()
                .downloads
                .push((url.to_string(), file_name.to_string()));
            if self.broken_links.contains(url) {
                return Err(ApiError::Status(500));
            }
            Ok(PathBuf::from("downloads/videos").join(file_name))
        }
    }

    #[derive(Default)]
    struct FakeSounds {
        results: Vec<Sound>,
        fail_download: bool,
        log: Arc<Mutex<SourceLog>>,
    }

    #[async_trait]
    impl AudioSource for FakeSounds {
        async fn search(&self, query: &str, max_duration_secs: u32) -> SearchOutcome<Sound> {
            self.log
                .lock()
                .unwrap()
                .searches
                .push((query.to_string(), max_duration_secs));
            SearchOutcome::from_items(self.results.clone())
        }

        async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf, ApiError> {
            self.log
                .lock()
                .unwrap()
                .downloads
                .push((url.to_string(), file_name.to_string()));
            if self.fail_download {
                return Err(ApiError::Status(502));
            }
            Ok(PathBuf::from("downloads/audio").join(file_name))
        }
    }

    #[derive(Default)]
    struct MediaLog {
        segments: Vec<SegmentJob>,
        concat_inputs: Vec<PathBuf>,
        exports: Vec<ExportJob>,
        work_dirs: Vec<PathBuf>,
    }

    struct FakeMedia {
        clip_info: VideoInfo,
        audio_duration: Option<f64>,
        fail_export: bool,
        log: Arc<Mutex<MediaLog>>,
    }

    impl FakeMedia {
        fn new(log: Arc<Mutex<MediaLog>>) -> Self {
            Self {
                clip_info: VideoInfo {
                    dimensions: Dimensions::new(1920, 1080),
                    duration: 10.0,
                },
                audio_duration: Some(40.0),
                fail_export: false,
                log,
            }
        }
    }

    #[async_trait]
    impl MediaEngine for FakeMedia {
        async fn probe_video(&self, _path: &Path) -> Result<VideoInfo> {
            Ok(self.clip_info)
        }

        async fn probe_duration(&self, path: &Path) -> Result<f64> {
            if path.ends_with("concat.mp4") {
                let log = self.log.lock().unwrap();
                return Ok(log.segments.iter().map(|s| s.duration).sum());
            }
            self.audio_duration
                .ok_or_else(|| anyhow::anyhow!("cannot decode {}", path.display()))
        }

        async fn render_segment(&self, job: &SegmentJob, _encoding: &Encoding) -> Result<()> {
            let mut log = self.log.lock().unwrap();
            if let Some(parent) = job.output.parent() {
                log.work_dirs.push(parent.to_path_buf());
            }
            log.segments.push(job.clone());
            Ok(())
        }

        async fn concat(
            &self,
            segments: &[PathBuf],
            _canvas: Dimensions,
            _encoding: &Encoding,
            _output: &Path,
        ) -> Result<()> {
            self.log.lock().unwrap().concat_inputs = segments.to_vec();
            Ok(())
        }

        async fn export(&self, job: &ExportJob, _encoding: &Encoding) -> Result<()> {
            self.log.lock().unwrap().exports.push(job.clone());
            std::fs::write(&job.output, b"partial")?;
            if self.fail_export {
                return Err(anyhow::anyhow!("encoder crashed"));
            }
            Ok(())
        }
    }

    fn test_plan(output_dir: &Path) -> GenerationPlan {
        GenerationPlan {
            request_pause: Duration::ZERO,
            output_dir: output_dir.to_path_buf(),
            ..GenerationPlan::default()
        }
    }

    fn output_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }

    fn nature_videos() -> FakeVideos {
        let mut results = HashMap::new();
        results.insert("forest peaceful", vec![video(1), video(2)]);
        results.insert("ocean waves", vec![video(3)]);
        results.insert("sunset nature", vec![video(4), video(5)]);
        FakeVideos {
            results,
            ..FakeVideos::default()
        }
    }

    #[tokio::test]
    async fn nature_run_with_long_audio_truncates_to_video() {
        let out = TempDir::new().unwrap();
        let video_log = Arc::new(Mutex::new(SourceLog::default()));
        let audio_log = Arc::new(Mutex::new(SourceLog::default()));
        let media_log = Arc::new(Mutex::new(MediaLog::default()));

        let videos = FakeVideos {
            log: video_log.clone(),
            ..nature_videos()
        };
        let sounds = FakeSounds {
            results: vec![sound(9, true)],
            log: audio_log.clone(),
            ..FakeSounds::default()
        };
        // theme, (query, candidate) x3, audio query, sound
        let random = ScriptedRandom::new(&[0, 0, 1, 1, 0, 2, 1, 3, 0], &[1.0, 2.5, 7.0]);

        let mut generator = ShortsGenerator::new(
            test_plan(out.path()),
            Box::new(videos),
            Box::new(sounds),
            Box::new(FakeMedia::new(media_log.clone())),
            Box::new(random),
        );
        let outcome = generator.generate().await;

        let (path, segments, with_audio) = match outcome {
            RunOutcome::Produced { path, segments, with_audio } => (path, segments, with_audio),
            other => panic!("expected a produced video, got {:?}", other),
        };
        assert_eq!(segments, 3);
        assert!(with_audio);
        assert!(path.starts_with(out.path()));
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("shorts_")
        );
        assert!(path.exists());

        let video_log = video_log.lock().unwrap();
        let searched: Vec<_> = video_log.searches.iter().map(|(q, l)| (q.as_str(), *l)).collect();
        assert_eq!(
            searched,
            vec![("forest peaceful", 5), ("ocean waves", 5), ("sunset nature", 5)]
        );
        let links: Vec<_> = video_log.downloads.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://cdn.test/2.mp4", "https://cdn.test/3.mp4", "https://cdn.test/5.mp4"]
        );
        assert!(video_log.downloads[1].1.starts_with("clip_1_"));

        let audio_log = audio_log.lock().unwrap();
        assert_eq!(audio_log.searches, vec![("nature ambient".to_string(), 30)]);
        assert_eq!(audio_log.downloads[0].0, "https://cdn.test/9-hq.mp3");

        let media_log = media_log.lock().unwrap();
        let trims: Vec<_> = media_log.segments.iter().map(|s| (s.start, s.duration)).collect();
        assert_eq!(trims, vec![(1.0, 3.0), (2.5, 3.0), (7.0, 3.0)]);
        assert!(media_log.segments.iter().all(|s| s.plan.canvas == Dimensions::new(1080, 1920)));
        assert_eq!(media_log.concat_inputs.len(), 3);

        let export = &media_log.exports[0];
        let mix = export.audio.as_ref().unwrap();
        assert_eq!(mix.trim_to, Some(9.0));
        assert!((mix.volume - 0.7).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn cozy_run_with_one_empty_search_uses_two_segments() {
        let out = TempDir::new().unwrap();
        let media_log = Arc::new(Mutex::new(MediaLog::default()));

        let mut results = HashMap::new();
        results.insert("fireplace warm", vec![video(11)]);
        results.insert("candle flame", vec![video(12)]);
        let videos = FakeVideos {
            results,
            ..FakeVideos::default()
        };
        let sounds = FakeSounds {
            results: vec![sound(20, true)],
            ..FakeSounds::default()
        };
        // theme cozy; queries coffee morning (empty), fireplace warm, candle flame
        let random = ScriptedRandom::new(&[1, 0, 1, 0, 2, 0, 0, 0], &[0.0, 0.0]);

        let mut generator = ShortsGenerator::new(
            test_plan(out.path()),
            Box::new(videos),
            Box::new(sounds),
            Box::new(FakeMedia::new(media_log.clone())),
            Box::new(random),
        );
        let outcome = generator.generate().await;

        assert!(matches!(outcome, RunOutcome::Produced { segments: 2, .. }));
        let media_log = media_log.lock().unwrap();
        assert_eq!(media_log.concat_inputs.len(), 2);
        assert!(media_log.segments[0].output.ends_with("segment_0.mp4"));
        let second = media_log.segments[1].input.file_name().unwrap().to_string_lossy();
        assert!(second.starts_with("clip_2_"));
    }

    #[tokio::test]
    async fn outage_produces_no_video() {
        let out = TempDir::new().unwrap();
        let media_log = Arc::new(Mutex::new(MediaLog::default()));
        let audio_log = Arc::new(Mutex::new(SourceLog::default()));

        let videos = FakeVideos {
            failing_queries: ["forest peaceful", "ocean waves", "sunset nature", "rain window"]
                .into_iter()
                .collect(),
            ..FakeVideos::default()
        };
        let sounds = FakeSounds {
            results: vec![sound(1, true)],
            log: audio_log.clone(),
            ..FakeSounds::default()
        };
        let random = ScriptedRandom::new(&[0, 0, 1, 2], &[]);

        let mut generator = ShortsGenerator::new(
            test_plan(out.path()),
            Box::new(videos),
            Box::new(sounds),
            Box::new(FakeMedia::new(media_log.clone())),
            Box::new(random),
        );

        assert_eq!(generator.generate().await, RunOutcome::InsufficientClips { downloaded: 0 });
        assert!(media_log.lock().unwrap().exports.is_empty());
        assert!(audio_log.lock().unwrap().searches.is_empty());
        assert!(output_files(out.path()).is_empty());
    }

    #[tokio::test]
    async fn one_clip_is_not_enough() {
        let out = TempDir::new().unwrap();
        let media_log = Arc::new(Mutex::new(MediaLog::default()));

        let mut videos = nature_videos();
        videos.broken_links.insert("https://cdn.test/1.mp4".to_string());
        // forest peaceful -> broken download, rain window -> empty, ocean waves -> ok
        let random = ScriptedRandom::new(&[0, 0, 0, 3, 1, 0], &[]);

        let mut generator = ShortsGenerator::new(
            test_plan(out.path()),
            Box::new(videos),
            Box::new(FakeSounds::default()),
            Box::new(FakeMedia::new(media_log.clone())),
            Box::new(random),
        );

        assert_eq!(generator.generate().await, RunOutcome::InsufficientClips { downloaded: 1 });
        assert!(media_log.lock().unwrap().segments.is_empty());
    }

    #[tokio::test]
    async fn candidate_without_files_is_skipped() {
        let out = TempDir::new().unwrap();
        let mut bare = video(7);
        bare.video_files.clear();

        let mut results = HashMap::new();
        results.insert("forest peaceful", vec![bare]);
        results.insert("ocean waves", vec![video(3)]);
        let video_log = Arc::new(Mutex::new(SourceLog::default()));
        let videos = FakeVideos {
            results,
            log: video_log.clone(),
            ..FakeVideos::default()
        };
        let random = ScriptedRandom::new(&[0, 0, 0, 1, 0, 1, 0], &[]);

        let mut generator = ShortsGenerator::new(
            test_plan(out.path()),
            Box::new(videos),
            Box::new(FakeSounds::default()),
            Box::new(FakeMedia::new(Arc::new(Mutex::new(MediaLog::default())))),
            Box::new(random),
        );

        assert!(matches!(generator.generate().await, RunOutcome::Produced { segments: 2, .. }));
        assert_eq!(video_log.lock().unwrap().downloads.len(), 2);
    }

    async fn run_with_sounds(
        sounds: FakeSounds,
        audio_duration: Option<f64>,
    ) -> (RunOutcome, Arc<Mutex<MediaLog>>, TempDir) {
        let out = TempDir::new().unwrap();
        let media_log = Arc::new(Mutex::new(MediaLog::default()));
        let mut media = FakeMedia::new(media_log.clone());
        media.audio_duration = audio_duration;

        let random = ScriptedRandom::new(&[0, 0, 0, 1, 0, 2, 0], &[]);
        let mut generator = ShortsGenerator::new(
            test_plan(out.path()),
            Box::new(nature_videos()),
            Box::new(sounds),
            Box::new(media),
            Box::new(random),
        );
        (generator.generate().await, media_log, out)
    }

    #[tokio::test]
    async fn empty_audio_search_still_produces_silent_video() {
        let (outcome, media_log, _out) = run_with_sounds(FakeSounds::default(), Some(40.0)).await;

        assert!(matches!(outcome, RunOutcome::Produced { with_audio: false, segments: 3, .. }));
        assert!(media_log.lock().unwrap().exports[0].audio.is_none());
    }

    #[tokio::test]
    async fn missing_hq_preview_still_produces_silent_video() {
        let audio_log = Arc::new(Mutex::new(SourceLog::default()));
        let sounds = FakeSounds {
            results: vec![sound(3, false)],
            log: audio_log.clone(),
            ..FakeSounds::default()
        };
        let (outcome, media_log, _out) = run_with_sounds(sounds, Some(40.0)).await;

        assert!(matches!(outcome, RunOutcome::Produced { with_audio: false, .. }));
        assert!(audio_log.lock().unwrap().downloads.is_empty());
        assert!(media_log.lock().unwrap().exports[0].audio.is_none());
    }

    #[tokio::test]
    async fn failed_audio_download_still_produces_silent_video() {
        let sounds = FakeSounds {
            results: vec![sound(3, true)],
            fail_download: true,
            ..FakeSounds::default()
        };
        let (outcome, media_log, _out) = run_with_sounds(sounds, Some(40.0)).await;

        assert!(matches!(outcome, RunOutcome::Produced { with_audio: false, .. }));
        assert!(media_log.lock().unwrap().exports[0].audio.is_none());
    }

    #[tokio::test]
    async fn undecodable_audio_is_dropped() {
        let sounds = FakeSounds {
            results: vec![sound(3, true)],
            ..FakeSounds::default()
        };
        let (outcome, _media_log, _out) = run_with_sounds(sounds, None).await;

        assert!(matches!(outcome, RunOutcome::Produced { with_audio: false, .. }));
    }

    #[tokio::test]
    async fn short_audio_is_not_extended() {
        let sounds = FakeSounds {
            results: vec![sound(3, true)],
            ..FakeSounds::default()
        };
        let (outcome, media_log, _out) = run_with_sounds(sounds, Some(5.0)).await;

        assert!(matches!(outcome, RunOutcome::Produced { with_audio: true, .. }));
        let log = media_log.lock().unwrap();
        assert_eq!(log.exports[0].audio.as_ref().unwrap().trim_to, None);
    }

    #[tokio::test]
    async fn short_clips_are_used_whole() {
        let out = TempDir::new().unwrap();
        let media_log = Arc::new(Mutex::new(MediaLog::default()));
        let mut media = FakeMedia::new(media_log.clone());
        media.clip_info.duration = 2.0;

        let random = ScriptedRandom::new(&[0, 0, 0, 1, 0, 2, 0], &[1.9, 1.9, 1.9]);
        let mut generator = ShortsGenerator::new(
            test_plan(out.path()),
            Box::new(nature_videos()),
            Box::new(FakeSounds::default()),
            Box::new(media),
            Box::new(random),
        );
        generator.generate().await;

        let log = media_log.lock().unwrap();
        assert!(log.segments.iter().all(|s| s.start == 0.0 && s.duration == 2.0));
    }

    #[tokio::test]
    async fn failed_export_removes_partial_output_and_work_dir() {
        let out = TempDir::new().unwrap();
        let media_log = Arc::new(Mutex::new(MediaLog::default()));
        let mut media = FakeMedia::new(media_log.clone());
        media.fail_export = true;

        let random = ScriptedRandom::new(&[0, 0, 0, 1, 0, 2, 0], &[]);
        let mut generator = ShortsGenerator::new(
            test_plan(out.path()),
            Box::new(nature_videos()),
            Box::new(FakeSounds::default()),
            Box::new(media),
            Box::new(random),
        );

        assert_eq!(generator.generate().await, RunOutcome::AssemblyFailed);
        assert!(output_files(out.path()).is_empty());
        let log = media_log.lock().unwrap();
        assert!(log.work_dirs.iter().all(|dir| !dir.exists()));
    }

    #[tokio::test]
    async fn work_dir_is_released_after_success() {
        let (outcome, media_log, _out) = run_with_sounds(FakeSounds::default(), None).await;

        assert!(matches!(outcome, RunOutcome::Produced { .. }));
        let log = media_log.lock().unwrap();
        assert!(!log.work_dirs.is_empty());
        assert!(log.work_dirs.iter().all(|dir| !dir.exists()));
    }
}
