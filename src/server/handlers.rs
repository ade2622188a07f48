//! HTTP request handlers.
//!
//! This module provides the three routes of the transcription API: the
//! status root, the liveness probe, and the OpenAI-compatible
//! transcription endpoint.

use std::path::{Path, PathBuf};
use std::process;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::asr::types::{LanguageProb, TranscribeOptions};
use crate::config::upload::{DEFAULT_EXTENSION, MAX_UPLOAD_BYTES, TEMP_PREFIX};
use crate::error::{AppError, Result};
use crate::server::AppState;

/// Default value for the accepted-but-unused `model` form field.
const DEFAULT_MODEL_FIELD: &str = "whisper-1";

/// Response body for a successful transcription.
#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    /// Concatenated transcript text, trimmed of surrounding whitespace.
    pub text: String,

    /// Detected (or caller-supplied) language code.
    pub language: Option<String>,

    /// Audio duration in seconds.
    pub duration: f64,

    /// Per-language probability breakdown when the engine exposes one,
    /// `null` otherwise.
    pub segments: Option<Vec<LanguageProb>>,
}

/// Parsed multipart form for `POST /v1/audio/transcriptions`.
#[derive(Debug, Default)]
struct TranscriptionForm {
    /// Original filename and content of the uploaded audio.
    file: Option<(String, Vec<u8>)>,
    model: Option<String>,
    language: Option<String>,
    prompt: Option<String>,
    response_format: Option<String>,
    temperature: Option<f32>,
}

/// Status endpoint reporting the active model configuration.
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model": state.model.model.to_string(),
        "device": state.model.device.to_string(),
        "compute_type": state.model.compute_type.to_string(),
    }))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
    }))
}

/// Transcribe an uploaded audio file.
///
/// Compatible with the OpenAI transcription API form fields. The `model`
/// and `response_format` fields are accepted but do not change behavior;
/// the single pre-loaded engine serves every request with JSON output.
pub async fn transcribe(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TranscriptionResponse>> {
    let engine = state.engine.clone().ok_or(AppError::ModelUnavailable)?;

    let form = parse_form(multipart).await?;
    let (filename, content) = form
        .file
        .ok_or_else(|| AppError::Validation("missing required `file` field".to_string()))?;

    if let Some(model) = form.model.as_deref() {
        if model != DEFAULT_MODEL_FIELD {
            debug!("Ignoring requested model {model:?}; serving with the configured engine");
        }
    }
    if let Some(format) = form.response_format.as_deref() {
        if format != "json" {
            debug!("Ignoring response_format {format:?}; responses are always JSON");
        }
    }

    let options = TranscribeOptions {
        language: form.language,
        prompt: form.prompt,
        temperature: form.temperature.unwrap_or(0.0),
    };

    let temp_path = temp_upload_path(&filename);
    tokio::fs::write(&temp_path, &content).await?;

    info!(
        "Processing audio file: {} ({} bytes)",
        filename,
        content.len()
    );

    let result = engine.transcribe_file(&temp_path, &options).await;

    // Removal failures are swallowed; the file sits under the OS temp dir.
    let _ = tokio::fs::remove_file(&temp_path).await;

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            error!("Transcription failed: {e}");
            return Err(e);
        }
    };

    let text = output.joined_text();
    info!("Transcription complete: {} characters", text.len());

    Ok(Json(TranscriptionResponse {
        text,
        language: output.language,
        duration: output.duration_secs,
        segments: output.language_probs,
    }))
}

/// Derive a unique temporary path for an uploaded file.
///
/// The name embeds the process id and a per-request UUID, so concurrent
/// requests never collide even when they upload files with the same
/// extension.
fn temp_upload_path(original_name: &str) -> PathBuf {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(DEFAULT_EXTENSION);
    std::env::temp_dir().join(format!(
        "{TEMP_PREFIX}_{}_{}.{extension}",
        process::id(),
        Uuid::new_v4()
    ))
}

async fn parse_form(mut multipart: Multipart) -> Result<TranscriptionForm> {
    let mut form = TranscriptionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("failed reading `file` field: {e}"))
                })?;
                form.file = Some((filename, bytes.to_vec()));
            }
            "model" => {
                form.model = Some(read_text_field(field, &name).await?);
            }
            "language" => {
                let value = read_text_field(field, &name).await?;
                if !value.trim().is_empty() {
                    form.language = Some(value.trim().to_string());
                }
            }
            "prompt" => {
                let value = read_text_field(field, &name).await?;
                if !value.is_empty() {
                    form.prompt = Some(value);
                }
            }
            "response_format" => {
                form.response_format = Some(read_text_field(field, &name).await?);
            }
            "temperature" => {
                let value = read_text_field(field, &name).await?;
                let parsed = value.trim().parse::<f32>().map_err(|_| {
                    AppError::Validation(format!("invalid `temperature` value: {value:?}"))
                })?;
                form.temperature = Some(parsed);
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("failed reading `{name}` field: {e}")))
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/v1/audio/transcriptions", post(transcribe))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::types::{TranscriptSegment, TranscriptionOutput};
    use crate::asr::SpeechToText;
    use crate::config::{ComputeType, Device, ModelDescriptor, ModelSize};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    const BOUNDARY: &str = "x-test-boundary";

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor {
            model: ModelSize::Base,
            device: Device::Cpu,
            compute_type: ComputeType::Int8,
        }
    }

    /// What the engine observed when it was invoked.
    struct SeenCall {
        path: PathBuf,
        existed_at_call: bool,
        options: TranscribeOptions,
    }

    #[derive(Default)]
    struct MockEngine {
        fail_with: Option<String>,
        seen: Mutex<Option<SeenCall>>,
    }

    impl MockEngine {
        fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SpeechToText for MockEngine {
        async fn transcribe_file(
            &self,
            path: &Path,
            options: &TranscribeOptions,
        ) -> Result<TranscriptionOutput> {
            *self.seen.lock().unwrap() = Some(SeenCall {
                path: path.to_path_buf(),
                existed_at_call: path.exists(),
                options: options.clone(),
            });

            if let Some(message) = &self.fail_with {
                return Err(AppError::Inference(message.clone()));
            }

            Ok(TranscriptionOutput {
                segments: vec![
                    TranscriptSegment {
                        start_secs: 0.0,
                        end_secs: 0.8,
                        text: " hello".to_string(),
                    },
                    TranscriptSegment {
                        start_secs: 0.8,
                        end_secs: 1.5,
                        text: " world ".to_string(),
                    },
                ],
                language: Some("en".to_string()),
                duration_secs: 1.5,
                language_probs: None,
            })
        }
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(filename: &str, content: &[u8]) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: audio/wav\r\n\r\n{}\r\n",
            String::from_utf8_lossy(content)
        )
    }

    fn multipart_request(parts: &[String]) -> Request<Body> {
        let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
        Request::builder()
            .method("POST")
            .uri("/v1/audio/transcriptions")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_static() {
        let (status, body) = send(AppState::without_engine(descriptor()), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn test_root_reports_startup_configuration() {
        let state = AppState::without_engine(ModelDescriptor {
            model: ModelSize::LargeV2,
            device: Device::Cuda,
            compute_type: ComputeType::Int8Float16,
        });
        let (status, body) = send(state, get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "large-v2");
        assert_eq!(body["device"], "cuda");
        assert_eq!(body["compute_type"], "int8_float16");
    }

    #[tokio::test]
    async fn test_transcribe_without_engine_is_server_error() {
        let request = multipart_request(&[file_part("clip.wav", b"RIFFdata")]);
        let (status, body) = send(AppState::without_engine(descriptor()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Model not loaded");
    }

    #[tokio::test]
    async fn test_transcribe_success_shape() {
        let engine = Arc::new(MockEngine::default());
        let state = AppState::new(engine.clone(), descriptor());
        let request = multipart_request(&[file_part("clip.wav", b"RIFFdata")]);

        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "hello world");
        assert_eq!(body["language"], "en");
        assert_eq!(body["duration"], 1.5);
        assert!(body["segments"].is_null());

        let seen = engine.seen.lock().unwrap();
        let seen = seen.as_ref().expect("engine was invoked");
        assert!(seen.existed_at_call);
        assert!(!seen.path.exists(), "temp file should be removed");
    }

    #[tokio::test]
    async fn test_missing_file_field_is_unprocessable() {
        let engine = Arc::new(MockEngine::default());
        let state = AppState::new(engine.clone(), descriptor());
        let request = multipart_request(&[text_part("model", "whisper-1")]);

        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("file"));
        assert!(engine.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_engine_error_is_reported_and_cleaned_up() {
        let engine = Arc::new(MockEngine::failing("unsupported audio layout"));
        let state = AppState::new(engine.clone(), descriptor());
        let request = multipart_request(&[file_part("clip.ogg", b"OggS")]);

        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("unsupported audio layout"));

        let seen = engine.seen.lock().unwrap();
        let seen = seen.as_ref().expect("engine was invoked");
        assert!(seen.path.to_string_lossy().ends_with(".ogg"));
        assert!(!seen.path.exists(), "temp file should be removed on error");
    }

    #[tokio::test]
    async fn test_omitted_temperature_defaults_to_zero() {
        let engine = Arc::new(MockEngine::default());
        let state = AppState::new(engine.clone(), descriptor());
        let request = multipart_request(&[file_part("clip.wav", b"RIFFdata")]);

        send(state, request).await;

        let seen = engine.seen.lock().unwrap();
        let options = &seen.as_ref().unwrap().options;
        assert_eq!(options.temperature, 0.0);
        assert!(options.language.is_none());
        assert!(options.prompt.is_none());
    }

    #[tokio::test]
    async fn test_optional_fields_are_forwarded() {
        let engine = Arc::new(MockEngine::default());
        let state = AppState::new(engine.clone(), descriptor());
        let request = multipart_request(&[
            file_part("clip.wav", b"RIFFdata"),
            text_part("language", "de"),
            text_part("prompt", "Sehr geehrte Damen und Herren"),
            text_part("temperature", "0.7"),
            text_part("response_format", "text"),
        ]);

        let (status, _) = send(state, request).await;
        assert_eq!(status, StatusCode::OK);

        let seen = engine.seen.lock().unwrap();
        let options = &seen.as_ref().unwrap().options;
        assert_eq!(options.language.as_deref(), Some("de"));
        assert_eq!(
            options.prompt.as_deref(),
            Some("Sehr geehrte Damen und Herren")
        );
        assert!((options.temperature - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_invalid_temperature_is_unprocessable() {
        let engine = Arc::new(MockEngine::default());
        let state = AppState::new(engine.clone(), descriptor());
        let request = multipart_request(&[
            file_part("clip.wav", b"RIFFdata"),
            text_part("temperature", "hot"),
        ]);

        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("temperature"));
    }

    #[test]
    fn test_temp_paths_never_collide() {
        let first = temp_upload_path("speech.mp3");
        let second = temp_upload_path("speech.mp3");
        assert_ne!(first, second);
        assert!(first.to_string_lossy().ends_with(".mp3"));
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains(&process::id().to_string()));
    }

    #[test]
    fn test_temp_path_defaults_extension() {
        let path = temp_upload_path("noextension");
        assert!(path.to_string_lossy().ends_with(".wav"));
    }
}
