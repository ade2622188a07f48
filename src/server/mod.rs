//! Web server and API implementation.
//!
//! This module provides the HTTP routes and shared state for the
//! transcription service.

mod handlers;
mod state;

pub use handlers::{create_router, health, root, transcribe, TranscriptionResponse};
pub use state::AppState;
