//! Application state for dependency injection.
//!
//! The model handle is constructed once in `main` and injected here rather
//! than living in a global. All request handlers share this state
//! read-only.

use std::sync::Arc;

use crate::asr::SpeechToText;
use crate::config::ModelDescriptor;

/// Shared application state containing dependencies.
#[derive(Clone)]
pub struct AppState {
    /// The speech-to-text engine, absent until model initialization has
    /// completed. `main` never serves without it; the `None` case exists
    /// so the model-not-loaded contract stays observable.
    pub engine: Option<Arc<dyn SpeechToText>>,

    /// The model configuration reported by the status endpoint.
    pub model: ModelDescriptor,
}

impl AppState {
    /// Create application state around a loaded engine.
    pub fn new(engine: Arc<dyn SpeechToText>, model: ModelDescriptor) -> Self {
        Self {
            engine: Some(engine),
            model,
        }
    }

    /// Create application state with no engine attached.
    pub fn without_engine(model: ModelDescriptor) -> Self {
        Self {
            engine: None,
            model,
        }
    }
}
