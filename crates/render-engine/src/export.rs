//! Export configuration, jobs and the ffmpeg render backend.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use reframe_common::config::ExportDefaults;
use reframe_common::error::{ReframeError, ReframeResult};
use reframe_timeline::TimelineModel;

use crate::compiler::{compile, FilterExpression};

/// Output container and codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "mp4-h264")]
    Mp4H264,
    #[serde(rename = "mp4-h265")]
    Mp4H265,
    #[serde(rename = "webm")]
    Webm,
    #[serde(rename = "gif")]
    Gif,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Mp4H264 => "mp4-h264",
            ExportFormat::Mp4H265 => "mp4-h265",
            ExportFormat::Webm => "webm",
            ExportFormat::Gif => "gif",
        }
    }

    /// File extension for outputs in this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Mp4H264 | ExportFormat::Mp4H265 => "mp4",
            ExportFormat::Webm => "webm",
            ExportFormat::Gif => "gif",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ReframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4-h264" | "mp4" | "h264" => Ok(ExportFormat::Mp4H264),
            "mp4-h265" | "h265" | "hevc" => Ok(ExportFormat::Mp4H265),
            "webm" => Ok(ExportFormat::Webm),
            "gif" => Ok(ExportFormat::Gif),
            other => Err(ReframeError::config(format!(
                "Unknown export format '{other}' (expected mp4-h264, mp4-h265, webm or gif)"
            ))),
        }
    }
}

/// Encoder settings for one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub format: ExportFormat,

    /// Output resolution in pixels.
    pub width: u32,
    pub height: u32,

    pub fps: u32,

    /// Video bitrate in kbps.
    pub video_bitrate_kbps: u32,
}

impl ExportConfig {
    /// Build from the persisted application defaults.
    pub fn from_defaults(defaults: &ExportDefaults) -> ReframeResult<Self> {
        Ok(Self {
            format: defaults.format.parse()?,
            width: defaults.width,
            height: defaults.height,
            fps: defaults.fps,
            video_bitrate_kbps: defaults.video_bitrate_kbps,
        })
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Mp4H264,
            width: 1280,
            height: 720,
            fps: 30,
            video_bitrate_kbps: 8000,
        }
    }
}

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Source video.
    pub input_path: PathBuf,

    /// Output file path.
    pub output_path: PathBuf,

    pub config: ExportConfig,

    /// Snapshot of the timeline taken when the job was created. Later edits
    /// to the live model do not affect the job.
    pub timeline: TimelineModel,
}

impl ExportJob {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        config: ExportConfig,
        timeline: &TimelineModel,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            config,
            timeline: timeline.clone(),
        }
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    pub frames_rendered: u64,
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
}

/// Something that can turn an [`ExportJob`] into a video file.
pub trait RenderBackend: Send {
    fn render(&mut self, job: &ExportJob, progress: Option<ProgressCallback>) -> ReframeResult<()>;

    /// Whether this backend can run on the current system.
    fn is_available(&self) -> bool;

    fn name(&self) -> &str;
}

/// Render the job's timeline onto its input video.
///
/// Returns the path of the written file.
pub async fn export_timeline(
    job: ExportJob,
    progress: Option<ProgressCallback>,
) -> ReframeResult<PathBuf> {
    tracing::info!(
        input = %job.input_path.display(),
        output = %job.output_path.display(),
        format = %job.config.format,
        "Starting export"
    );

    if !job.input_path.exists() {
        return Err(ReframeError::FileNotFound {
            path: job.input_path,
        });
    }

    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut backend: Box<dyn RenderBackend> = Box::new(FfmpegBackend::new());
    if !backend.is_available() {
        return Err(ReframeError::unsupported(
            "No supported render backend found (expected ffmpeg in PATH)",
        ));
    }

    tracing::info!(backend = backend.name(), "Using render backend");
    let output = job.output_path.clone();
    tokio::task::spawn_blocking(move || backend.render(&job, progress))
        .await
        .map_err(|e| ReframeError::render(format!("Render task failed: {e}")))??;

    Ok(output)
}

/// Whether an `ffmpeg` binary is on `PATH`.
pub fn ffmpeg_available() -> bool {
    command_exists("ffmpeg")
}

/// Renders by piping the compiled zoompan filter through `ffmpeg`.
#[derive(Debug, Default)]
pub struct FfmpegBackend;

#[derive(Debug, Clone)]
struct ExportPlan {
    ffmpeg_args: Vec<String>,
    total_frames: u64,
    expected_duration_secs: f64,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    fn build_plan(&self, job: &ExportJob) -> ReframeResult<ExportPlan> {
        let compiled = compile(&job.timeline);
        if compiled.duration <= 0.0 {
            return Err(ReframeError::render(
                "Export duration resolved to zero seconds",
            ));
        }

        let fps = job.config.fps.max(1);
        let total_frames = (compiled.duration * fps as f64).ceil() as u64;
        let filter = build_filter_graph(&job.config, &compiled);
        let args = build_ffmpeg_args(job, &compiled, filter);

        tracing::info!(
            duration_secs = compiled.duration,
            frames = total_frames,
            effects = job.timeline.effects().len(),
            keyframes = job.timeline.keyframes().len(),
            "Export plan built"
        );

        Ok(ExportPlan {
            ffmpeg_args: args,
            total_frames,
            expected_duration_secs: compiled.duration,
        })
    }

    fn run_ffmpeg(
        &self,
        plan: &ExportPlan,
        progress: Option<ProgressCallback>,
    ) -> ReframeResult<()> {
        tracing::debug!(args = ?plan.ffmpeg_args, "Running ffmpeg");
        let mut cmd = Command::new("ffmpeg");
        cmd.args(&plan.ffmpeg_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| ReframeError::render(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReframeError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReframeError::render("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once the stderr pipe fills up.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut state = ProgressState::default();
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| ReframeError::render(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key == "progress" {
                if let Some(cb) = &progress {
                    cb(progress_report(
                        &state,
                        plan.total_frames,
                        plan.expected_duration_secs,
                        start.elapsed().as_secs_f64(),
                    ));
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| ReframeError::render(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ReframeError::render(format!(
                "ffmpeg export failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        if let Some(cb) = &progress {
            cb(ExportProgress {
                progress: 1.0,
                frames_rendered: plan.total_frames,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: ExportStage::Complete,
            });
        }

        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(&mut self, job: &ExportJob, progress: Option<ProgressCallback>) -> ReframeResult<()> {
        let started = std::time::Instant::now();
        let plan = self.build_plan(job)?;

        if let Some(cb) = &progress {
            cb(ExportProgress {
                progress: 0.0,
                frames_rendered: 0,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: ExportStage::Preparing,
            });
        }

        self.run_ffmpeg(&plan, progress)?;
        tracing::info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Export finished"
        );
        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// `-filter_complex` graph: zoompan onto the output size, then per-format
/// pixel handling. Output pad is `[vout]`.
fn build_filter_graph(config: &ExportConfig, compiled: &FilterExpression) -> String {
    let zoompan = compiled.to_zoompan_filter(config.width, config.height, config.fps);
    match config.format {
        ExportFormat::Gif => format!(
            "[0:v]{zoompan},fps=15,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse[vout]"
        ),
        _ => format!("[0:v]{zoompan},format=yuv420p[vout]"),
    }
}

fn build_ffmpeg_args(job: &ExportJob, compiled: &FilterExpression, filter: String) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-nostats".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-i".to_string(),
        job.input_path.display().to_string(),
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "[vout]".to_string(),
    ];

    if job.config.format != ExportFormat::Gif {
        args.push("-map".to_string());
        args.push("0:a?".to_string());
    }

    args.push("-r".to_string());
    args.push(job.config.fps.max(1).to_string());
    args.push("-t".to_string());
    args.push(format!("{:.6}", compiled.duration));

    args.extend(codec_args_for_config(&job.config));
    args.push(job.output_path.display().to_string());
    args
}

fn codec_args_for_config(config: &ExportConfig) -> Vec<String> {
    let video_bitrate = format!("{}k", config.video_bitrate_kbps.max(1000));

    let video_bitrate = video_bitrate.as_str();
    let args: Vec<&str> = match config.format {
        ExportFormat::Mp4H264 => vec![
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-profile:v",
            "high",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            video_bitrate,
            "-c:a",
            "copy",
            "-movflags",
            "+faststart",
        ],
        ExportFormat::Mp4H265 => vec![
            "-c:v",
            "libx265",
            "-preset",
            "medium",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            video_bitrate,
            "-c:a",
            "copy",
            "-movflags",
            "+faststart",
        ],
        ExportFormat::Webm => vec![
            "-c:v",
            "libvpx-vp9",
            "-b:v",
            video_bitrate,
            "-c:a",
            "libopus",
            "-b:a",
            "128k",
        ],
        ExportFormat::Gif => vec!["-an"],
    };
    args.into_iter().map(str::to_string).collect()
}

fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Accumulated `key=value` pairs from `ffmpeg -progress`.
#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // Despite the name, ffmpeg reports out_time_ms in microseconds.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> ExportProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    ExportProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            ExportStage::Finalizing
        } else {
            ExportStage::Rendering
        },
    }
}
