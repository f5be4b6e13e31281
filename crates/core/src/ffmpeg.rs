//! FFmpeg/FFprobe command utilities.
//!
//! Thin async wrappers around the `ffmpeg` and `ffprobe` binaries. Every
//! invocation runs with `kill_on_drop` under a caller-supplied timeout so a
//! stuck decode cannot hold a request forever.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::process::Command;

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("ffprobe/ffmpeg timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

/// A single stream from ffprobe output.
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_name: Option<String>,
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<String>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
    pub format_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a media file and return the parsed JSON output.
pub async fn probe_video(path: &Path, timeout: Duration) -> Result<FfprobeOutput, FfmpegError> {
    ensure_exists(path)?;

    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ])
    .arg(path);

    let stdout = run_tool(&mut cmd, timeout).await?;
    let stdout = String::from_utf8_lossy(&stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// Copy the first `max_duration_secs` of `input` into `output` without
/// re-encoding.
pub async fn trim_video(
    input: &Path,
    output: &Path,
    max_duration_secs: f64,
    timeout: Duration,
) -> Result<(), FfmpegError> {
    ensure_exists(input)?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args(trim_args(input, output, max_duration_secs));
    run_tool(&mut cmd, timeout).await?;
    Ok(())
}

/// Extract a single JPEG frame at `timestamp_secs`, scaled to `width` pixels
/// wide with the height following the source aspect ratio.
pub async fn extract_scaled_frame(
    video_path: &Path,
    output_path: &Path,
    timestamp_secs: f64,
    width: u32,
    timeout: Duration,
) -> Result<(), FfmpegError> {
    ensure_exists(video_path)?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args(frame_args(video_path, output_path, timestamp_secs, width));
    run_tool(&mut cmd, timeout).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Argument builders
// ---------------------------------------------------------------------------

/// Arguments for a stream-copy trim starting at zero.
pub fn trim_args(input: &Path, output: &Path, max_duration_secs: f64) -> Vec<String> {
    vec![
        "-y".into(),
        "-ss".into(),
        "0".into(),
        "-i".into(),
        input.to_string_lossy().to_string(),
        "-t".into(),
        format!("{max_duration_secs:.3}"),
        "-c".into(),
        "copy".into(),
        "-avoid_negative_ts".into(),
        "make_zero".into(),
        output.to_string_lossy().to_string(),
    ]
}

/// Arguments for a single scaled still frame.
///
/// `-2` keeps the height even, which the JPEG encoder's chroma subsampling
/// requires.
pub fn frame_args(
    video_path: &Path,
    output_path: &Path,
    timestamp_secs: f64,
    width: u32,
) -> Vec<String> {
    vec![
        "-y".into(),
        "-ss".into(),
        format!("{timestamp_secs:.3}"),
        "-i".into(),
        video_path.to_string_lossy().to_string(),
        "-frames:v".into(),
        "1".into(),
        "-vf".into(),
        format!("scale={width}:-2"),
        "-q:v".into(),
        "2".into(),
        output_path.to_string_lossy().to_string(),
    ]
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Find the first video stream in the ffprobe output.
fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Whether the probed file carries at least one video stream.
pub fn has_video_stream(probe: &FfprobeOutput) -> bool {
    first_video_stream(probe).is_some()
}

/// Parse the media duration in seconds from ffprobe output.
pub fn parse_duration(probe: &FfprobeOutput) -> f64 {
    // Try format-level duration first.
    if let Some(d) = &probe.format.duration {
        if let Ok(secs) = d.parse::<f64>() {
            return secs;
        }
    }
    // Fall back to the first video stream's duration.
    first_video_stream(probe)
        .and_then(|s| s.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Process runner
// ---------------------------------------------------------------------------

fn ensure_exists(path: &Path) -> Result<(), FfmpegError> {
    if path.exists() {
        Ok(())
    } else {
        Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ))
    }
}

/// Run `cmd` to completion, returning stdout on a zero exit.
///
/// The child is killed when the timeout elapses (the future owning it is
/// dropped and `kill_on_drop` is set).
async fn run_tool(cmd: &mut Command, timeout: Duration) -> Result<Vec<u8>, FfmpegError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let child = cmd.spawn().map_err(FfmpegError::NotFound)?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(FfmpegError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            })
        }
    };

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(output.stdout)
}
