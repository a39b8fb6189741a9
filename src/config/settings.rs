use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::env::{self, EnvKey};
use crate::modules::video::model::Resolution;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: Option<String>,
    pub amqp_url: Option<String>,
    pub run_transcode_worker: bool,
    pub media_root: PathBuf,
    pub ffmpeg_bin: PathBuf,
    pub target_resolutions: Vec<Resolution>,
    pub transcode_workers: usize,
    pub thumbnail_offset: Duration,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub max_upload_bytes: usize,
    pub jwt_secret: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_url: None,
            amqp_url: None,
            run_transcode_worker: true,
            media_root: PathBuf::from("media"),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            target_resolutions: vec![Resolution::P720],
            transcode_workers: 2,
            thumbnail_offset: Duration::from_secs(1),
            thumbnail_width: 640,
            thumbnail_height: 360,
            max_upload_bytes: 2 * 1024 * 1024 * 1024,
            jwt_secret: String::new(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let target_resolutions = match env::get_opt(EnvKey::TargetResolutions) {
            Some(raw) => parse_resolutions(&raw).map_err(|message| ConfigError::Invalid {
                key: EnvKey::TargetResolutions.as_str(),
                message,
            })?,
            None => defaults.target_resolutions,
        };

        let offset_secs: f64 = env::get_parsed(EnvKey::ThumbnailOffsetSecs, 1.0);
        let thumbnail_offset =
            Duration::try_from_secs_f64(offset_secs).map_err(|e| ConfigError::Invalid {
                key: EnvKey::ThumbnailOffsetSecs.as_str(),
                message: e.to_string(),
            })?;

        let jwt_secret = env::get(EnvKey::JwtSecret)
            .map_err(|_| ConfigError::Missing(EnvKey::JwtSecret.as_str()))?;

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, defaults.server_port),
            database_url: env::get_opt(EnvKey::DatabaseUrl),
            amqp_url: env::get_opt(EnvKey::AmqpUrl),
            run_transcode_worker: env::get_parsed(EnvKey::RunTranscodeWorker, true),
            media_root: PathBuf::from(env::get_or(EnvKey::MediaRoot, "media")),
            ffmpeg_bin: PathBuf::from(env::get_or(EnvKey::FfmpegBin, "ffmpeg")),
            target_resolutions,
            transcode_workers: env::get_parsed(EnvKey::TranscodeWorkers, defaults.transcode_workers)
                .max(1),
            thumbnail_offset,
            thumbnail_width: env::get_parsed(EnvKey::ThumbnailWidth, defaults.thumbnail_width),
            thumbnail_height: env::get_parsed(EnvKey::ThumbnailHeight, defaults.thumbnail_height),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, defaults.max_upload_bytes),
            jwt_secret,
        })
    }
}

/// Parses a comma separated list such as `480p,720p`, dropping duplicates.
pub fn parse_resolutions(raw: &str) -> Result<Vec<Resolution>, String> {
    let mut resolutions = Vec::new();
    for label in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let resolution: Resolution = label.parse().map_err(|e| format!("{e}"))?;
        if !resolutions.contains(&resolution) {
            resolutions.push(resolution);
        }
    }
    if resolutions.is_empty() {
        return Err("at least one resolution is required".to_string());
    }
    Ok(resolutions)
}
