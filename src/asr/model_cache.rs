//! ModelCache (C3): lifetime-managed singleton map from model size to a
//! loaded acoustic model, shared across the detection and transcription
//! passes. Loads on first request and downloads weights if they are not
//! already on disk.

use crate::asr::types::{ASRError, ModelSize};
use crate::asr::whisper::WhisperEngine;
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Where to fetch a model's weights from, and how big we expect them to be.
struct ModelMetadata {
    file_name: &'static str,
    url: String,
    approx_size_mb: u64,
}

fn registry_entry(size: ModelSize) -> ModelMetadata {
    let file_name = size.ggml_file_name();
    ModelMetadata {
        file_name,
        url: format!(
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/{}",
            file_name
        ),
        approx_size_mb: size.approx_size_mb(),
    }
}

/// Process-wide, load-once-per-size acoustic model cache.
///
/// Thread-safe: concurrent first-touch on the same size results in one load;
/// later callers receive the already-loaded instance. The lock is held across
/// the download+load `await`, so a second caller for the same size blocks
/// until the first finishes rather than triggering a second load.
pub struct ModelCache {
    models_dir: PathBuf,
    loaded: Mutex<HashMap<ModelSize, Arc<WhisperEngine>>>,
}

impl ModelCache {
    pub fn new() -> Result<Self, ASRError> {
        let models_dir = Self::models_directory()?;
        Ok(Self { models_dir, loaded: Mutex::new(HashMap::new()) })
    }

    fn models_directory() -> Result<PathBuf, ASRError> {
        let data_dir = dirs::data_dir().ok_or_else(|| ASRError::ModelLoadError {
            message: "failed to resolve platform data directory".to_string(),
        })?;
        let dir = data_dir.join("polyglot-transcribe").join("models");
        std::fs::create_dir_all(&dir).map_err(|e| ASRError::ModelLoadError {
            message: format!("failed to create models directory {:?}: {}", dir, e),
        })?;
        Ok(dir)
    }

    /// Get the model for `size`, loading (and downloading, if necessary) on
    /// first request.
    pub async fn get_or_load(&self, size: ModelSize) -> Result<Arc<WhisperEngine>, ASRError> {
        let mut guard = self.loaded.lock().await;
        if let Some(engine) = guard.get(&size) {
            return Ok(engine.clone());
        }

        Self::check_memory_available(size)?;
        let model_path = self.ensure_model_available(size).await?;
        tracing::info!(?size, path = ?model_path, "loading acoustic model");
        let engine = Arc::new(WhisperEngine::load(&model_path)?);
        guard.insert(size, engine.clone());
        Ok(engine)
    }

    /// Refuse to load a model whisper.cpp would OOM on. Rule of thumb:
    /// whisper.cpp holds roughly 2x the weights file size in resident memory
    /// once the compute buffers are allocated.
    fn check_memory_available(size: ModelSize) -> Result<(), ASRError> {
        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        let available_gb = sys.available_memory() as f32 / (1024.0 * 1024.0 * 1024.0);
        let required_gb = (size.approx_size_mb() as f32 * 2.0) / 1024.0;

        if available_gb < required_gb {
            return Err(ASRError::InsufficientMemory { required: required_gb, available: available_gb });
        }
        Ok(())
    }

    async fn ensure_model_available(&self, size: ModelSize) -> Result<PathBuf, ASRError> {
        let metadata = registry_entry(size);
        let model_path = self.models_dir.join(metadata.file_name);

        if model_path.exists() && self.verify_model_integrity(&model_path, &metadata).await.is_ok()
        {
            return Ok(model_path);
        }

        self.download_model(&model_path, &metadata).await?;
        Ok(model_path)
    }

    async fn download_model(
        &self,
        model_path: &Path,
        metadata: &ModelMetadata,
    ) -> Result<(), ASRError> {
        let temp_path = model_path.with_extension("tmp");
        tracing::info!(url = %metadata.url, "downloading acoustic model");

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(3600))
            .build()
            .map_err(|e| ASRError::ModelLoadError {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let response =
            client.get(&metadata.url).send().await.map_err(|e| ASRError::ModelLoadError {
                message: format!("failed to start model download: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(ASRError::ModelLoadError {
                message: format!("model download failed with status {}", response.status()),
            });
        }

        let mut file =
            tokio::fs::File::create(&temp_path).await.map_err(|e| ASRError::ModelLoadError {
                message: format!("failed to create temp file {:?}: {}", temp_path, e),
            })?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        use tokio::io::AsyncWriteExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ASRError::ModelLoadError {
                message: format!("download error: {}", e),
            })?;
            file.write_all(&chunk).await.map_err(|e| ASRError::ModelLoadError {
                message: format!("failed writing model chunk: {}", e),
            })?;
            downloaded += chunk.len() as u64;
        }
        file.sync_all().await.map_err(|e| ASRError::ModelLoadError {
            message: format!("failed to sync model file: {}", e),
        })?;
        drop(file);

        tokio::fs::rename(&temp_path, model_path).await.map_err(|e| ASRError::ModelLoadError {
            message: format!("failed to move downloaded model into place: {}", e),
        })?;

        tracing::info!(bytes = downloaded, "model download complete");
        Ok(())
    }

    /// Size-tolerance integrity check (~14%), matching the tolerance
    /// quantized/unquantized variants of the same model can legitimately differ by.
    async fn verify_model_integrity(
        &self,
        path: &Path,
        metadata: &ModelMetadata,
    ) -> Result<(), ASRError> {
        let file_metadata =
            tokio::fs::metadata(path).await.map_err(|e| ASRError::ModelVerificationFailed {
                message: format!("cannot read model file {:?}: {}", path, e),
            })?;

        let actual_size = file_metadata.len();
        let expected_size = metadata.approx_size_mb * 1024 * 1024;
        let tolerance = expected_size / 7;

        if actual_size < expected_size.saturating_sub(tolerance)
            || actual_size > expected_size + tolerance
        {
            return Err(ASRError::ModelVerificationFailed {
                message: format!(
                    "model size {}MB outside expected range for {} (~{}MB)",
                    actual_size / (1024 * 1024),
                    metadata.file_name,
                    metadata.approx_size_mb
                ),
            });
        }
        Ok(())
    }

    /// Hash the model file; used by diagnostics, not by integrity verification
    /// (no published checksums are available for these third-party mirrors).
    pub async fn sha256_of(path: &Path) -> Result<String, ASRError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ASRError::ModelVerificationFailed {
            message: format!("cannot read model file {:?}: {}", path, e),
        })?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}
