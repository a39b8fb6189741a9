#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use movie_town::config::settings::AppConfig;
use movie_town::infrastructure::queue::{JobQueue, QueueError};
use movie_town::infrastructure::storage::media::MediaStorage;
use movie_town::modules::video::events::TranscodeJob;
use movie_town::modules::video::lifecycle::VideoLifecycle;
use movie_town::modules::video::memory::InMemoryVideoRepository;
use movie_town::modules::video::model::{Access, Genre, NewVideo, Resolution, Video};
use movie_town::modules::video::repository::VideoRepository;
use movie_town::modules::video::transcoder::{ThumbnailSpec, Transcoder, TranscoderSettings};
use movie_town::state::AppState;
use tempfile::TempDir;
use uuid::Uuid;

/// Stand-ins for ffmpeg. The last argument is always the output path.
pub struct Encoders {
    _dir: TempDir,
    /// Writes a few bytes to the output and exits 0.
    pub ok: PathBuf,
    /// Writes a partial output, complains on stderr and exits 1.
    pub failing: PathBuf,
    /// Like `ok`, but fails for the 1080p preset.
    pub fails_1080p: PathBuf,
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\nfor last; do :; done\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Scripts are written once per test binary, before any test spawns a process.
pub fn encoders() -> &'static Encoders {
    static ENCODERS: OnceLock<Encoders> = OnceLock::new();
    ENCODERS.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let ok = write_script(dir.path(), "ffmpeg-ok", "printf 'encoded' > \"$last\"\n");
        let failing = write_script(
            dir.path(),
            "ffmpeg-fail",
            "printf 'partial' > \"$last\"\necho 'Invalid data found when processing input' >&2\nexit 1\n",
        );
        let fails_1080p = write_script(
            dir.path(),
            "ffmpeg-no-1080p",
            "case \"$*\" in *hd1080*) echo 'no 1080p today' >&2; exit 1;; esac\nprintf 'encoded' > \"$last\"\n",
        );
        Encoders {
            _dir: dir,
            ok,
            failing,
            fails_1080p,
        }
    })
}

/// Collects jobs instead of running them.
#[derive(Default)]
pub struct RecordingQueue {
    pub jobs: Mutex<Vec<TranscodeJob>>,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<TranscodeJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: TranscodeJob) -> Result<(), QueueError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

pub struct ClosedQueue;

#[async_trait]
impl JobQueue for ClosedQueue {
    async fn enqueue(&self, _job: TranscodeJob) -> Result<(), QueueError> {
        Err(QueueError::Closed)
    }
}

/// Delegates to the in-memory store but cannot record thumbnails.
pub struct UnattachableRepository(pub Arc<InMemoryVideoRepository>);

#[async_trait]
impl VideoRepository for UnattachableRepository {
    async fn create(&self, new: NewVideo) -> anyhow::Result<Video> {
        self.0.create(new).await
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Video>> {
        self.0.find_by_id(id).await
    }

    async fn list_visible(
        &self,
        requester: Option<Uuid>,
        owner: Option<Uuid>,
    ) -> anyhow::Result<Vec<Video>> {
        self.0.list_visible(requester, owner).await
    }

    async fn attach_thumbnail(&self, _id: Uuid, _thumbnail_path: &str) -> anyhow::Result<bool> {
        Err(anyhow::anyhow!("connection reset"))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Video>> {
        self.0.delete(id).await
    }
}

pub const JWT_SECRET: &str = "test-secret";

/// A media root in a temp dir plus everything wired around it.
pub struct Harness {
    pub dir: TempDir,
    pub storage: MediaStorage,
    pub repo: Arc<InMemoryVideoRepository>,
    pub transcoder: Transcoder,
    pub lifecycle: VideoLifecycle,
}

impl Harness {
    pub async fn new(
        encoder: &Path,
        queue: Arc<dyn JobQueue>,
        resolutions: Vec<Resolution>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        storage.ensure_layout().await.unwrap();

        let repo = Arc::new(InMemoryVideoRepository::new());
        let transcoder = Transcoder::new(TranscoderSettings::new(encoder, storage.thumbnails_dir()));
        let lifecycle = VideoLifecycle::new(
            repo.clone(),
            queue,
            transcoder.clone(),
            dir.path(),
            resolutions,
            ThumbnailSpec::default(),
        );

        Self {
            dir,
            storage,
            repo,
            transcoder,
            lifecycle,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a source file under `videos/` and returns its relative path.
    pub async fn upload(&self, file_name: &str) -> String {
        let relative = format!("videos/{file_name}");
        tokio::fs::write(self.storage.absolute(&relative), b"source bytes")
            .await
            .unwrap();
        relative
    }

    pub async fn create_video(&self, file_name: &str, owner_id: Uuid, access: Access) -> Video {
        let source_path = self.upload(file_name).await;
        self.repo
            .create(NewVideo {
                title: "Movie".to_string(),
                description: "A short film".to_string(),
                source_path,
                genre: Genre::Drama,
                access,
                owner_id,
            })
            .await
            .unwrap()
    }

    pub fn state(&self) -> AppState {
        let config = AppConfig {
            media_root: self.root().to_path_buf(),
            jwt_secret: JWT_SECRET.to_string(),
            ..AppConfig::default()
        };
        AppState::new(config, self.repo.clone(), self.storage.clone(), self.lifecycle.clone())
    }
}

pub async fn exists(path: impl AsRef<Path>) -> bool {
    tokio::fs::try_exists(path).await.unwrap()
}

/// Polls until `path` exists or the timeout elapses.
pub async fn wait_for(path: &Path, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if exists(path).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    exists(path).await
}
