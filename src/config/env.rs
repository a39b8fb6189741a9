use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    AmqpUrl,
    RunTranscodeWorker,
    MediaRoot,
    FfmpegBin,
    TargetResolutions,
    TranscodeWorkers,
    ThumbnailOffsetSecs,
    ThumbnailWidth,
    ThumbnailHeight,
    MaxUploadBytes,
    JwtSecret,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::AmqpUrl => "AMQP_URL",
            EnvKey::RunTranscodeWorker => "RUN_TRANSCODE_WORKER",
            EnvKey::MediaRoot => "MEDIA_ROOT",
            EnvKey::FfmpegBin => "FFMPEG_BIN",
            EnvKey::TargetResolutions => "TARGET_RESOLUTIONS",
            EnvKey::TranscodeWorkers => "TRANSCODE_WORKERS",
            EnvKey::ThumbnailOffsetSecs => "THUMBNAIL_OFFSET_SECS",
            EnvKey::ThumbnailWidth => "THUMBNAIL_WIDTH",
            EnvKey::ThumbnailHeight => "THUMBNAIL_HEIGHT",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
            EnvKey::JwtSecret => "JWT_SECRET",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

/// Unset and blank variables both read as `None`.
pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
