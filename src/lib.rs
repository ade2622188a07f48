//! The `whisper_api_server` core library.
//!
//! This crate provides an HTTP server around a Whisper speech-to-text
//! engine. One model instance is loaded at startup and shared, read-only,
//! by all request handlers; the HTTP surface is compatible with the OpenAI
//! transcription API.

pub mod asr;
pub mod config;
pub mod error;
pub mod server;
