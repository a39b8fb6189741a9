use anyhow::{anyhow, Result};
use axum::extract::multipart::Field;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{error, info};

/// Streams a multipart file field into `file` chunk by chunk.
///
/// Only `video/*` parts are accepted. On any failure the partially written
/// file at `path` is removed.
pub async fn stream_to_disk(mut field: Field<'_>, file: File, path: &Path) -> Result<u64> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let result = async {
        if !content_type.starts_with("video/") {
            return Err(anyhow!("Invalid content type: only video/* allowed"));
        }

        let mut writer = BufWriter::new(file);
        let mut written: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| anyhow!("Stream interrupted: {}", e))?
        {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;
        Ok::<u64, anyhow::Error>(written)
    }
    .await;

    match result {
        Ok(written) => {
            info!("Stored {} bytes at {}", written, path.display());
            Ok(written)
        }
        Err(e) => {
            error!("Upload error: {}", e);
            let _ = tokio::fs::remove_file(path).await;
            Err(e)
        }
    }
}
