//! Speech-to-text engine integration.
//!
//! This module contains everything between the HTTP layer and the model:
//! the engine trait, the whisper.cpp backend, audio input conversion, and
//! model file resolution.

mod audio;
mod engine;
mod model;
mod traits;
pub mod types;

pub use audio::{audio_len_secs, read_wav_mono_16k};
pub use engine::WhisperTranscriber;
pub use model::{ensure_model, model_file_name, model_url};
pub use traits::SpeechToText;
pub use types::{LanguageProb, TranscribeOptions, TranscriptSegment, TranscriptionOutput};
