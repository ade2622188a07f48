//! Model file resolution and download.
//!
//! Whisper model weights are distributed as single ggml files named by
//! size. The server resolves the file for the configured size and
//! precision in the local model directory and fetches it from the upstream
//! whisper.cpp model repository on first use.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::{ComputeType, ModelSize};
use crate::error::{AppError, Result};

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// The ggml file name for a model size and precision.
///
/// Int8-class precisions select the `q8_0` quantized artifact; the
/// remaining precisions use the standard f16 file, which is the only other
/// variant published upstream.
pub fn model_file_name(model: ModelSize, compute_type: ComputeType) -> String {
    if compute_type.is_quantized() {
        format!("ggml-{model}-q8_0.bin")
    } else {
        format!("ggml-{model}.bin")
    }
}

/// The upstream URL a model file is fetched from.
pub fn model_url(file_name: &str) -> String {
    format!("{MODEL_BASE_URL}/{file_name}")
}

/// Resolve the model file for the given configuration, downloading it into
/// `dir` when not already present.
pub async fn ensure_model(
    dir: &Path,
    model: ModelSize,
    compute_type: ComputeType,
) -> Result<PathBuf> {
    let file_name = model_file_name(model, compute_type);
    let dest = dir.join(&file_name);

    if let Ok(meta) = tokio::fs::metadata(&dest).await {
        if meta.len() > 0 {
            return Ok(dest);
        }
    }

    tokio::fs::create_dir_all(dir).await?;

    let url = model_url(&file_name);
    info!("Downloading model {} to {:?}", url, dest);
    let bytes = download_file(&url, &dest).await?;
    info!("Downloaded {} ({} bytes)", file_name, bytes);

    Ok(dest)
}

async fn download_file(url: &str, dest: &Path) -> Result<u64> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| AppError::Download(e.to_string()))?;

    if !response.status().is_success() {
        return Err(AppError::Download(format!(
            "HTTP {}: {}",
            response.status(),
            url
        )));
    }

    let mut file = tokio::fs::File::create(dest).await?;

    let mut stream = response.bytes_stream();
    let mut total = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AppError::Download(e.to_string()))?;
        file.write_all(&chunk).await?;
        total += chunk.len() as u64;
    }

    file.flush().await?;

    Ok(total)
}
