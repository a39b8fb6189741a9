use async_trait::async_trait;
use thiserror::Error;

use crate::modules::video::events::TranscodeJob;

pub mod rabbitmq;

/// Name of the durable RabbitMQ queue transcode jobs travel through.
pub const TRANSCODE_QUEUE: &str = "transcoding_tasks";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to serialize job: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to publish job: {0}")]
    Publish(String),
    #[error("job queue is closed")]
    Closed,
}

/// Out-of-band execution of transcode jobs.
///
/// `enqueue` hands the job over and returns; it never waits for the job to
/// run. Jobs carry no ordering guarantee and are executed at most once.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: TranscodeJob) -> Result<(), QueueError>;
}
