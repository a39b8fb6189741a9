use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lapin::{
    options::*, types::FieldTable, BasicProperties, Channel, Connection,
    ConnectionProperties, Consumer,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{JobQueue, QueueError};
use crate::modules::video::events::TranscodeJob;

/// Transcode jobs on a durable RabbitMQ queue.
///
/// The web process publishes through [`JobQueue`]; worker processes read the
/// same queue through [`RabbitJobQueue::consume`].
#[derive(Clone)]
pub struct RabbitJobQueue {
    url: String,
    queue: String,
    conn: Arc<Mutex<Connection>>,
    channel: Arc<Mutex<Channel>>,
}

impl RabbitJobQueue {
    async fn connect(url: &str, queue: &str) -> Result<(Connection, Channel)> {
        info!("Connecting to RabbitMQ");
        let conn = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

        let channel = conn
            .create_channel()
            .await
            .map_err(|e| anyhow!("Failed to create channel: {}", e))?;

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to declare queue {}: {}", queue, e))?;

        info!("✅ Connected to RabbitMQ, queue '{}' declared", queue);
        Ok((conn, channel))
    }

    pub async fn new(url: &str, queue: &str) -> Result<Self> {
        let (conn, channel) = Self::connect(url, queue).await?;

        Ok(Self {
            url: url.to_string(),
            queue: queue.to_string(),
            conn: Arc::new(Mutex::new(conn)),
            channel: Arc::new(Mutex::new(channel)),
        })
    }

    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    async fn reconnect(&self) -> Result<()> {
        warn!("RabbitMQ connection dropped, reconnecting...");
        let (conn, channel) = Self::connect(&self.url, &self.queue).await?;
        *self.conn.lock().await = conn;
        *self.channel.lock().await = channel;
        Ok(())
    }

    async fn publish_once(&self, payload: &[u8]) -> Result<()> {
        let channel = self.channel.lock().await;

        channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_delivery_mode(2) // persistent
                    .with_content_type("application/json".into()),
            )
            .await
            .map_err(|e| anyhow!("Failed to publish job: {}", e))?
            .await
            .map_err(|e| anyhow!("Failed to confirm job publication: {}", e))?;

        Ok(())
    }

    /// Starts a consumer that receives one unacked job at a time.
    pub async fn consume(&self, consumer_tag: &str) -> Result<Consumer> {
        let channel = self.channel.lock().await;

        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to set prefetch: {}", e))?;

        channel
            .basic_consume(
                &self.queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create consumer: {}", e))
    }
}

#[async_trait]
impl JobQueue for RabbitJobQueue {
    async fn enqueue(&self, job: TranscodeJob) -> Result<(), QueueError> {
        let payload = serde_json::to_vec(&job)?;

        if let Err(e) = self.publish_once(&payload).await {
            warn!("RabbitMQ publish failed: {}. Retrying after reconnect.", e);
            self.reconnect()
                .await
                .map_err(|e| QueueError::Publish(e.to_string()))?;
            self.publish_once(&payload)
                .await
                .map_err(|e| QueueError::Publish(e.to_string()))?;
        }

        debug!("Published {} job for {}", job.resolution, job.source_path.display());
        Ok(())
    }
}
