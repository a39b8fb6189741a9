use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, error, info};

use super::model::Resolution;
use super::paths::{self, DerivationError};

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to launch encoder {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("encoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

#[derive(Debug, Clone)]
pub struct TranscoderSettings {
    pub ffmpeg_bin: PathBuf,
    pub thumbnails_dir: PathBuf,
    pub video_codec: String,
    pub crf: u8,
    pub audio_codec: String,
}

impl TranscoderSettings {
    pub fn new(ffmpeg_bin: impl Into<PathBuf>, thumbnails_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            thumbnails_dir: thumbnails_dir.into(),
            video_codec: "libx264".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
        }
    }
}

/// Where and how big the thumbnail frame is grabbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailSpec {
    pub offset: Duration,
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            offset: Duration::from_secs(1),
            width: 640,
            height: 360,
        }
    }
}

/// Runs the external encoder. Never retries; retry policy belongs to the queue.
#[derive(Debug, Clone)]
pub struct Transcoder {
    settings: TranscoderSettings,
}

impl Transcoder {
    pub fn new(settings: TranscoderSettings) -> Self {
        Self { settings }
    }

    /// Writes `paths::derive(source, resolution.label())` and returns that path.
    pub async fn transcode(
        &self,
        source: &Path,
        resolution: Resolution,
    ) -> Result<PathBuf, TranscodeError> {
        let dest = paths::derive(source, resolution.label())?;
        let args = self.transcode_args(source, resolution, &dest);

        info!("🎞️ Transcoding {} to {}", source.display(), resolution);
        self.run(args, &dest).await?;
        info!("✅ Wrote {}", dest.display());
        Ok(dest)
    }

    /// Writes a single JPEG frame into the thumbnails directory and returns its path.
    pub async fn make_thumbnail(
        &self,
        source: &Path,
        spec: ThumbnailSpec,
    ) -> Result<PathBuf, TranscodeError> {
        let dest = paths::thumbnail_path(&self.settings.thumbnails_dir, source)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| TranscodeError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let args = thumbnail_args(source, spec, &dest);
        debug!("Capturing thumbnail for {}", source.display());
        self.run(args, &dest).await?;
        Ok(dest)
    }

    fn transcode_args(&self, source: &Path, resolution: Resolution, dest: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            source.into(),
            "-s".into(),
            resolution.preset().into(),
            "-c:v".into(),
            self.settings.video_codec.clone().into(),
            "-crf".into(),
            self.settings.crf.to_string().into(),
            "-c:a".into(),
            self.settings.audio_codec.clone().into(),
            "-strict".into(),
            "-2".into(),
            dest.into(),
        ]
    }

    async fn run(&self, args: Vec<OsString>, dest: &Path) -> Result<(), TranscodeError> {
        let program = &self.settings.ffmpeg_bin;
        debug!("Running {} {:?}", program.display(), args);

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        // A failed run must not leave a half-written artifact behind.
        match fs::remove_file(dest).await {
            Ok(()) => debug!("Removed partial output {}", dest.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => error!("Failed to remove partial output {}: {}", dest.display(), e),
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!("❌ Encoder failed ({}) for {}: {}", output.status, dest.display(), stderr);
        Err(TranscodeError::Failed {
            status: output.status.to_string(),
            stderr,
        })
    }
}

fn thumbnail_args(source: &Path, spec: ThumbnailSpec, dest: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        source.into(),
        "-ss".into(),
        format!("{:.3}", spec.offset.as_secs_f64()).into(),
        "-vframes".into(),
        "1".into(),
        "-vf".into(),
        format!("scale={}:{}", spec.width, spec.height).into(),
        dest.into(),
    ]
}
