//! Trait abstraction for speech-to-text engines.
//!
//! The HTTP layer depends on this trait instead of a concrete backend,
//! which keeps request handling decoupled from inference code and lets
//! tests inject a stub engine.

use async_trait::async_trait;
use std::path::Path;

use crate::asr::types::{TranscribeOptions, TranscriptionOutput};
use crate::error::Result;

/// Defines the contract for a speech-to-text engine.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file on disk.
    ///
    /// # Arguments
    /// * `path` - Path to the audio file
    /// * `options` - Per-request decoding options
    ///
    /// # Returns
    /// The transcription result with timed segments and summary metadata
    async fn transcribe_file(
        &self,
        path: &Path,
        options: &TranscribeOptions,
    ) -> Result<TranscriptionOutput>;
}
