//! Core transcription domain types.
//!
//! These types form the contract between the HTTP layer and the inference
//! engine: the options a request carries in, and the timed segments plus
//! summary metadata the engine yields back.

use serde::Serialize;

/// Decoding options for a single transcription request.
#[derive(Debug, Clone, Default)]
pub struct TranscribeOptions {
    /// Optional language hint such as `"en"`. When absent the engine
    /// detects the language.
    pub language: Option<String>,

    /// Optional priming prompt to bias decoding.
    pub prompt: Option<String>,

    /// Sampling temperature; `0.0` biases decoding towards the greedy path.
    pub temperature: f32,
}

/// Timestamped transcript chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// Segment start time in seconds.
    pub start_secs: f64,

    /// Segment end time in seconds.
    pub end_secs: f64,

    /// Text content for this segment.
    pub text: String,
}

/// Probability that the audio is in a given language.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageProb {
    pub language: String,
    pub probability: f32,
}

/// Full inference result returned by an engine.
#[derive(Debug, Clone)]
pub struct TranscriptionOutput {
    /// Segment-level timing and text details.
    pub segments: Vec<TranscriptSegment>,

    /// Detected (or caller-supplied) language code.
    pub language: Option<String>,

    /// Input audio duration in seconds.
    pub duration_secs: f64,

    /// Per-language probability breakdown, when the engine exposes one.
    pub language_probs: Option<Vec<LanguageProb>>,
}

impl TranscriptionOutput {
    /// Concatenate all segment texts with single-space separators.
    ///
    /// Segment texts arrive with engine-dependent padding; each is trimmed
    /// before joining so the result never carries leading or trailing
    /// whitespace.
    pub fn joined_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
