//! Media transform adapter for live wallpapers.
//!
//! A live upload is trimmed to a bounded duration and a single snapshot is
//! taken from the trimmed copy. [`MediaTransformer`] is the seam the upload
//! pipeline talks to; [`FfmpegTransformer`] is the production implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::ffmpeg::{self, FfmpegError};
use crate::uploads;

/// File extensions treated as video when the declared content type is not
/// conclusive.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv", "avi", "m4v"];

/// Default ceiling for trimmed live wallpapers, in seconds.
pub const DEFAULT_MAX_DURATION_SECS: f64 = 15.0;

/// Default snapshot offset into the trimmed video, in seconds.
pub const DEFAULT_SNAPSHOT_OFFSET_SECS: f64 = 2.0;

/// Default snapshot width in pixels.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 720;

/// Default wall-clock limit for a single ffmpeg/ffprobe run.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors produced while deriving live wallpaper media.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The source could not be decoded as video.
    #[error("'{0}' is not a decodable video")]
    NotVideo(String),

    /// The external tool failed, timed out, or is missing.
    #[error(transparent)]
    Tool(#[from] FfmpegError),

    /// The snapshot offset lies past the end of the trimmed video.
    #[error("snapshot offset {offset_secs:.3}s exceeds video length {duration_secs:.3}s")]
    OffsetBeyondEnd { offset_secs: f64, duration_secs: f64 },
}

/// Tunables for live wallpaper derivation.
#[derive(Debug, Clone)]
pub struct TransformSettings {
    /// Longest duration kept from the start of the video.
    pub max_duration_secs: f64,
    /// Offset into the trimmed video where the snapshot is taken.
    pub snapshot_offset_secs: f64,
    /// Snapshot width; height follows the aspect ratio.
    pub thumbnail_width: u32,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            snapshot_offset_secs: DEFAULT_SNAPSHOT_OFFSET_SECS,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
        }
    }
}

/// Files derived from one live upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMedia {
    pub trimmed_path: PathBuf,
    pub snapshot_path: PathBuf,
}

/// Trim and snapshot operations on stored video files.
///
/// Outputs are written next to the input; the input is never removed.
#[async_trait]
pub trait MediaTransformer: Send + Sync {
    /// Produce a copy of `source` lasting at most `max_duration_secs`.
    async fn trim(&self, source: &Path, max_duration_secs: f64) -> Result<PathBuf, TransformError>;

    /// Extract one still from `video` at `offset_secs`, `width` pixels wide.
    async fn snapshot(
        &self,
        video: &Path,
        offset_secs: f64,
        width: u32,
    ) -> Result<PathBuf, TransformError>;
}

/// Trim `source`, then snapshot the trimmed copy.
///
/// The snapshot is taken once, from the trimmed output, so its offset is
/// always checked against what will actually be served.
pub async fn derive_live_media(
    transformer: &dyn MediaTransformer,
    source: &Path,
    settings: &TransformSettings,
) -> Result<DerivedMedia, TransformError> {
    let trimmed_path = transformer
        .trim(source, settings.max_duration_secs)
        .await?;
    let snapshot_path = transformer
        .snapshot(
            &trimmed_path,
            settings.snapshot_offset_secs,
            settings.thumbnail_width,
        )
        .await?;

    Ok(DerivedMedia {
        trimmed_path,
        snapshot_path,
    })
}

/// Best-effort video detection for an uploaded file.
///
/// A declared `video/*` content type wins; anything else falls back to the
/// file extension.
pub fn looks_like_video(content_type: Option<&str>, file_name: &str) -> bool {
    if content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("video/"))
        .unwrap_or(false)
    {
        return true;
    }

    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

// ---------------------------------------------------------------------------
// FFmpeg implementation
// ---------------------------------------------------------------------------

/// [`MediaTransformer`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegTransformer {
    tool_timeout: Duration,
}

impl FfmpegTransformer {
    pub fn new(tool_timeout: Duration) -> Self {
        Self { tool_timeout }
    }
}

impl Default for FfmpegTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }
}

#[async_trait]
impl MediaTransformer for FfmpegTransformer {
    async fn trim(&self, source: &Path, max_duration_secs: f64) -> Result<PathBuf, TransformError> {
        let probe = ffmpeg::probe_video(source, self.tool_timeout)
            .await
            .map_err(|e| match e {
                FfmpegError::ExecutionFailed { .. } | FfmpegError::ParseError(_) => {
                    TransformError::NotVideo(source.to_string_lossy().to_string())
                }
                other => TransformError::Tool(other),
            })?;
        if !ffmpeg::has_video_stream(&probe) {
            return Err(TransformError::NotVideo(
                source.to_string_lossy().to_string(),
            ));
        }

        let output = sibling_path(source, uploads::trimmed_file_name);
        tracing::debug!(
            source = %source.display(),
            output = %output.display(),
            max_duration_secs,
            "Trimming video"
        );
        ffmpeg::trim_video(source, &output, max_duration_secs, self.tool_timeout).await?;
        Ok(output)
    }

    async fn snapshot(
        &self,
        video: &Path,
        offset_secs: f64,
        width: u32,
    ) -> Result<PathBuf, TransformError> {
        let probe = ffmpeg::probe_video(video, self.tool_timeout).await?;
        let duration_secs = ffmpeg::parse_duration(&probe);
        check_offset(offset_secs, duration_secs)?;

        let output = sibling_path(video, snapshot_source_name);
        tracing::debug!(
            video = %video.display(),
            output = %output.display(),
            offset_secs,
            width,
            "Extracting snapshot"
        );
        ffmpeg::extract_scaled_frame(video, &output, offset_secs, width, self.tool_timeout)
            .await?;
        Ok(output)
    }
}

/// Reject snapshot offsets past the end of the video.
fn check_offset(offset_secs: f64, duration_secs: f64) -> Result<(), TransformError> {
    if offset_secs > duration_secs {
        return Err(TransformError::OffsetBeyondEnd {
            offset_secs,
            duration_secs,
        });
    }
    Ok(())
}

/// Snapshot names are keyed by the original stored name, so a snapshot of
/// `trimmed_X` is named `snapshot_X.jpg`.
fn snapshot_source_name(name: &str) -> String {
    let base = name.strip_prefix(uploads::TRIMMED_PREFIX).unwrap_or(name);
    uploads::snapshot_file_name(base)
}

/// Path in the same directory as `path`, with the file name mapped by `rename`.
fn sibling_path(path: &Path, rename: impl Fn(&str) -> String) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(rename(&name))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;

    /// Records calls and writes empty output files.
    #[derive(Default)]
    struct RecordingTransformer {
        calls: Mutex<Vec<String>>,
        fail_snapshot: bool,
    }

    #[async_trait]
    impl MediaTransformer for RecordingTransformer {
        async fn trim(&self, source: &Path, max: f64) -> Result<PathBuf, TransformError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("trim {} {max}", source.display()));
            Ok(sibling_path(source, uploads::trimmed_file_name))
        }

        async fn snapshot(
            &self,
            video: &Path,
            offset: f64,
            width: u32,
        ) -> Result<PathBuf, TransformError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("snapshot {} {offset} {width}", video.display()));
            if self.fail_snapshot {
                return Err(TransformError::OffsetBeyondEnd {
                    offset_secs: offset,
                    duration_secs: 1.0,
                });
            }
            Ok(sibling_path(video, snapshot_source_name))
        }
    }

    #[tokio::test]
    async fn derive_snapshots_the_trimmed_copy() {
        let transformer = RecordingTransformer::default();
        let derived = derive_live_media(
            &transformer,
            Path::new("/up/1_clip.mp4"),
            &TransformSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(derived.trimmed_path, PathBuf::from("/up/trimmed_1_clip.mp4"));
        assert_eq!(derived.snapshot_path, PathBuf::from("/up/snapshot_1_clip.mp4.jpg"));
        let calls = transformer.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                "trim /up/1_clip.mp4 15".to_string(),
                "snapshot /up/trimmed_1_clip.mp4 2 720".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn derive_propagates_snapshot_failure() {
        let transformer = RecordingTransformer {
            fail_snapshot: true,
            ..Default::default()
        };
        let result = derive_live_media(
            &transformer,
            Path::new("/up/1_clip.mp4"),
            &TransformSettings::default(),
        )
        .await;
        assert_matches!(result, Err(TransformError::OffsetBeyondEnd { .. }));
    }

    #[test]
    fn video_detected_by_content_type() {
        assert!(looks_like_video(Some("video/mp4"), "blob"));
        assert!(looks_like_video(Some("Video/QuickTime"), "blob"));
    }

    #[test]
    fn video_detected_by_extension_fallback() {
        assert!(looks_like_video(Some("application/octet-stream"), "clip.MOV"));
        assert!(looks_like_video(None, "loop.webm"));
    }

    #[test]
    fn non_video_rejected() {
        assert!(!looks_like_video(Some("image/png"), "still.png"));
        assert!(!looks_like_video(None, "notes"));
    }

    #[test]
    fn offset_past_end_is_an_error() {
        assert_matches!(
            check_offset(2.0, 1.5),
            Err(TransformError::OffsetBeyondEnd { .. })
        );
        assert!(check_offset(2.0, 2.0).is_ok());
        assert!(check_offset(0.0, 15.0).is_ok());
    }

    #[test]
    fn snapshot_name_strips_trim_prefix() {
        assert_eq!(snapshot_source_name("trimmed_1_a.mp4"), "snapshot_1_a.mp4.jpg");
        assert_eq!(snapshot_source_name("1_a.mp4"), "snapshot_1_a.mp4.jpg");
    }

    #[tokio::test]
    async fn ffmpeg_transformer_rejects_missing_source() {
        let transformer = FfmpegTransformer::default();
        let result = transformer
            .trim(Path::new("/definitely/not/here.mp4"), 15.0)
            .await;
        assert_matches!(
            result,
            Err(TransformError::Tool(FfmpegError::VideoNotFound(_)))
        );
    }
}
