use crate::infrastructure::queue::rabbitmq::RabbitJobQueue;
use crate::modules::video::events::TranscodeJob;
use crate::modules::video::transcoder::{TranscodeError, Transcoder};
use futures_util::StreamExt;
use lapin::options::BasicAckOptions;
use std::io;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Runs one job. The outcome only matters to the logs: success is observable
/// through the derived file, failure through its absence.
pub async fn process_job(
    transcoder: &Transcoder,
    job: &TranscodeJob,
) -> Result<PathBuf, TranscodeError> {
    info!("Processing job: {:?}", job);

    // The record may have been deleted while the job waited in the queue.
    if !tokio::fs::try_exists(&job.source_path).await.unwrap_or(false) {
        warn!(
            "Source {} no longer exists, skipping {}",
            job.source_path.display(),
            job.resolution
        );
        return Err(TranscodeError::Io {
            path: job.source_path.clone(),
            source: io::ErrorKind::NotFound.into(),
        });
    }

    match transcoder.transcode(&job.source_path, job.resolution).await {
        Ok(dest) => {
            info!("✅ Job completed successfully: {:?}", job);
            Ok(dest)
        }
        Err(e) => {
            error!("❌ Failed to process job {:?}: {}", job, e);
            Err(e)
        }
    }
}

/// Consumes the durable RabbitMQ queue until the consumer stream ends.
///
/// Every delivery is acked after its attempt, successful or not, so a
/// failing job is never redelivered.
pub async fn start_transcoder_worker(
    queue: RabbitJobQueue,
    transcoder: Transcoder,
) -> anyhow::Result<()> {
    info!("🎥 Starting Transcoder Worker...");

    let mut consumer = queue.consume("transcoder_worker").await?;

    info!("🎥 Transcoder Worker listening on '{}'", queue.queue_name());

    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(d) => d,
            Err(e) => {
                error!("Consumer error: {}", e);
                continue;
            }
        };

        info!("📦 Received transcoding job");

        match serde_json::from_slice::<TranscodeJob>(&delivery.data) {
            Ok(job) => {
                // Failures are already logged; at-most-once means no requeue.
                let _ = process_job(&transcoder, &job).await;
            }
            Err(e) => {
                error!("❌ Failed to parse job: {}", e);
            }
        }

        if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
            error!("Failed to ack message: {}", e);
        }
    }

    warn!("Transcoder Worker consumer stream ended");
    Ok(())
}
