use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{self, File, OpenOptions};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::modules::video::model::Resolution;
use crate::modules::video::paths::{self, DerivationError};

/// Uploads land under `<media_root>/videos`.
pub const UPLOAD_DIR: &str = "videos";
pub const THUMBNAIL_DIR: &str = "thumbnails";

/// Local media root shared by the web process and the transcode workers.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
    reserve_lock: Arc<Mutex<()>>,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reserve_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn ensure_layout(&self) -> io::Result<()> {
        fs::create_dir_all(self.root.join(UPLOAD_DIR)).await?;
        fs::create_dir_all(self.root.join(THUMBNAIL_DIR)).await?;
        info!("✅ Media root ready at {}", self.root.display());
        Ok(())
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.root.join(THUMBNAIL_DIR)
    }

    pub fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Creates an empty upload file named after `file_name`.
    ///
    /// The name is sanitised first. Every artifact of a video is named after
    /// the base name of its upload, so the whole base name is claimed: when
    /// another upload, derived file or thumbnail already uses it, or when it
    /// reads like a derived name (`<stem>_720p`), a short random suffix is
    /// appended to the base name. Returns the path relative to the media root
    /// together with the open file.
    pub async fn reserve_upload(&self, file_name: &str) -> Result<(String, File), ReserveError> {
        let name = sanitize_file_name(file_name);
        let (base, ext) = paths::split_file_name(Path::new(&name))?;
        let labels = Resolution::ALL.map(|r| r.label());

        // Checking and creating must not interleave between two uploads.
        let _guard = self.reserve_lock.lock().await;

        let mut candidate = base.to_string();
        for _ in 0..5 {
            if !paths::is_derived_base(&candidate, labels)
                && !self.base_in_use(&candidate, ext, &labels).await?
            {
                let relative = format!("{UPLOAD_DIR}/{candidate}.{ext}");
                match OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(self.absolute(&relative))
                    .await
                {
                    Ok(file) => return Ok((relative, file)),
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                    Err(e) => return Err(ReserveError::Io(e)),
                }
            }

            debug!("Upload base name '{}' is taken", candidate);
            let suffix = &Uuid::new_v4().as_simple().to_string()[..6];
            candidate = format!("{base}_{suffix}");
        }

        Err(ReserveError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free upload name for {name}"),
        )))
    }

    async fn base_in_use(
        &self,
        base: &str,
        ext: &str,
        labels: &[&str],
    ) -> Result<bool, ReserveError> {
        let source = PathBuf::from(format!("{base}.{ext}"));
        let thumbnail = paths::thumbnail_path(&self.thumbnails_dir(), &source)?;
        if fs::try_exists(&thumbnail).await? {
            return Ok(true);
        }

        let mut entries = fs::read_dir(self.root.join(UPLOAD_DIR)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Ok((file_base, _)) = paths::split_file_name(&path) {
                if paths::shares_base(file_base, base, labels.iter().copied()) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReserveError {
    #[error(transparent)]
    Derivation(#[from] DerivationError),
    #[error("failed to create upload file: {0}")]
    Io(#[from] io::Error),
}

/// Keeps only the last path component and replaces anything outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let last = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    last.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
