//! whisper.cpp-backed transcription engine.
//!
//! `WhisperTranscriber` owns the single process-wide model context. The
//! context is read-only shared state; each request creates its own
//! decoding state from it, so no locking is involved. The inference call
//! is one blocking step and runs on the blocking thread pool.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::asr::audio::{audio_len_secs, read_wav_mono_16k};
use crate::asr::model::ensure_model;
use crate::asr::traits::SpeechToText;
use crate::asr::types::{TranscribeOptions, TranscriptSegment, TranscriptionOutput};
use crate::config::{decode, Config, Device};
use crate::error::{AppError, Result};

/// Speech-to-text engine backed by a whisper.cpp model.
pub struct WhisperTranscriber {
    context: Arc<WhisperContext>,
}

impl WhisperTranscriber {
    /// Load the configured model and construct the engine.
    ///
    /// Resolves (and if necessary downloads) the ggml file for the
    /// configured size and precision. Any failure here is fatal to the
    /// caller; a server without a usable model has no degraded mode.
    pub async fn load(config: &Config) -> Result<Self> {
        let model_path = ensure_model(&config.models_dir(), config.model, config.compute_type)
            .await?;

        info!(
            "Loading Whisper model: {} on {} with {}",
            config.model, config.device, config.compute_type
        );

        let use_gpu = !matches!(config.device, Device::Cpu);
        let path = model_path.to_string_lossy().into_owned();
        let context = tokio::task::spawn_blocking(move || {
            let mut params = WhisperContextParameters::default();
            params.use_gpu(use_gpu);
            WhisperContext::new_with_params(&path, params)
        })
        .await
        .map_err(|e| AppError::Model(format!("model load task failed: {e}")))?
        .map_err(|e| AppError::Model(e.to_string()))?;

        info!("Model loaded successfully");

        Ok(Self {
            context: Arc::new(context),
        })
    }
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    async fn transcribe_file(
        &self,
        path: &Path,
        options: &TranscribeOptions,
    ) -> Result<TranscriptionOutput> {
        let samples = read_wav_mono_16k(path)?;
        debug!(
            "Decoded {} samples ({:.2}s) from {:?}",
            samples.len(),
            audio_len_secs(&samples),
            path
        );

        let context = Arc::clone(&self.context);
        let options = options.clone();
        tokio::task::spawn_blocking(move || run_inference(&context, &samples, &options))
            .await
            .map_err(|e| AppError::Inference(format!("inference task failed: {e}")))?
    }
}

/// Run one beam-search decoding pass over the full sample buffer.
fn run_inference(
    context: &WhisperContext,
    samples: &[f32],
    options: &TranscribeOptions,
) -> Result<TranscriptionOutput> {
    let mut state = context
        .create_state()
        .map_err(|e| AppError::Inference(e.to_string()))?;

    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: decode::BEAM_WIDTH,
        patience: -1.0,
    });
    params.set_n_threads(inference_threads());
    params.set_temperature(options.temperature);
    params.set_translate(false);
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    if let Some(language) = options.language.as_deref() {
        params.set_language(Some(language));
    }
    if let Some(prompt) = options.prompt.as_deref() {
        params.set_initial_prompt(prompt);
    }

    state
        .full(params, samples)
        .map_err(|e| AppError::Inference(e.to_string()))?;

    let segment_count = state
        .full_n_segments()
        .map_err(|e| AppError::Inference(e.to_string()))?;

    let mut segments = Vec::with_capacity(segment_count as usize);
    for i in 0..segment_count {
        let text = state
            .full_get_segment_text(i)
            .map_err(|e| AppError::Inference(e.to_string()))?;
        // whisper reports segment bounds in centiseconds
        let start = state
            .full_get_segment_t0(i)
            .map_err(|e| AppError::Inference(e.to_string()))?;
        let end = state
            .full_get_segment_t1(i)
            .map_err(|e| AppError::Inference(e.to_string()))?;
        segments.push(TranscriptSegment {
            start_secs: start as f64 / 100.0,
            end_secs: end as f64 / 100.0,
            text,
        });
    }

    let language = match options.language.clone() {
        Some(language) => Some(language),
        None => state
            .full_lang_id_from_state()
            .ok()
            .and_then(|id| whisper_rs::get_lang_str(id))
            .map(str::to_string),
    };

    Ok(TranscriptionOutput {
        segments,
        language,
        duration_secs: audio_len_secs(samples),
        // whisper.cpp exposes no all-language probability breakdown
        language_probs: None,
    })
}

fn inference_threads() -> std::ffi::c_int {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(decode::MAX_INFERENCE_THREADS) as std::ffi::c_int
}
