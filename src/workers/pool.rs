use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::transcoder::process_job;
use crate::infrastructure::queue::{JobQueue, QueueError};
use crate::modules::video::events::TranscodeJob;
use crate::modules::video::transcoder::Transcoder;

/// In-process job queue backed by a pool of tokio tasks.
///
/// Nothing is persisted: jobs still waiting when the process exits are lost,
/// which matches the at-most-once contract of the queue.
#[derive(Clone)]
pub struct LocalJobQueue {
    sender: async_channel::Sender<TranscodeJob>,
}

impl LocalJobQueue {
    /// Spawns `workers` consumers. Must be called inside a tokio runtime.
    pub fn start(transcoder: Transcoder, workers: usize) -> (Self, Vec<JoinHandle<()>>) {
        let (sender, receiver) = async_channel::unbounded::<TranscodeJob>();

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let receiver = receiver.clone();
                let transcoder = transcoder.clone();
                tokio::spawn(async move {
                    info!("🎥 Local transcode worker {} started", worker_id);
                    while let Ok(job) = receiver.recv().await {
                        let transcoder = transcoder.clone();
                        // Each job gets its own task so a panic stays contained.
                        let run = tokio::spawn(async move {
                            let _ = process_job(&transcoder, &job).await;
                        });
                        if let Err(e) = run.await {
                            error!("Transcode task on worker {} aborted: {}", worker_id, e);
                        }
                    }
                    info!("Local transcode worker {} stopped", worker_id);
                })
            })
            .collect();

        (Self { sender }, handles)
    }

    /// Stops accepting jobs; workers exit once the backlog is drained.
    pub fn close(&self) {
        self.sender.close();
    }
}

#[async_trait]
impl JobQueue for LocalJobQueue {
    async fn enqueue(&self, job: TranscodeJob) -> Result<(), QueueError> {
        self.sender.try_send(job).map_err(|_| QueueError::Closed)
    }
}
