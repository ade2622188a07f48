//! Application configuration and fixed constants.
//!
//! This module centralizes all configuration values: the command-line
//! options the server is started with, and the constants that are fixed by
//! the API contract rather than configurable.

use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

use crate::error::{AppError, Result};

/// Audio processing constants
pub mod audio {
    /// Sample rate the inference engine consumes
    pub const SAMPLE_RATE: u32 = 16000;
}

/// Decoding constants
pub mod decode {
    /// Fixed beam width for beam-search decoding
    pub const BEAM_WIDTH: i32 = 5;

    /// Upper bound on inference threads; whisper gains little beyond this
    pub const MAX_INFERENCE_THREADS: usize = 8;
}

/// Upload handling constants
pub mod upload {
    /// Prefix for per-request temporary files
    pub const TEMP_PREFIX: &str = "whisper_upload";

    /// Extension used when the uploaded filename has none
    pub const DEFAULT_EXTENSION: &str = "wav";

    /// Maximum accepted request body size
    pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;
}

/// Whisper model size identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    LargeV2,
    LargeV3,
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::LargeV2 => "large-v2",
            ModelSize::LargeV3 => "large-v3",
        };
        f.write_str(name)
    }
}

/// Execution device for the inference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Device {
    Cpu,
    Cuda,
    Auto,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Numeric precision mode used by the inference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComputeType {
    Int8,
    #[value(name = "int8_float16")]
    Int8Float16,
    Int16,
    Float16,
    Float32,
}

impl ComputeType {
    /// Whether this precision selects a quantized model artifact.
    pub fn is_quantized(self) -> bool {
        matches!(self, ComputeType::Int8 | ComputeType::Int8Float16)
    }
}

impl fmt::Display for ComputeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComputeType::Int8 => "int8",
            ComputeType::Int8Float16 => "int8_float16",
            ComputeType::Int16 => "int16",
            ComputeType::Float16 => "float16",
            ComputeType::Float32 => "float32",
        };
        f.write_str(name)
    }
}

/// The model configuration a server instance was started with.
///
/// Immutable for the process lifetime; the status endpoint reports these
/// values verbatim.
#[derive(Debug, Clone, Copy)]
pub struct ModelDescriptor {
    pub model: ModelSize,
    pub device: Device,
    pub compute_type: ComputeType,
}

/// Application configuration parsed from the command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "whisper-api-server", version, about = "Whisper API server")]
pub struct Config {
    /// Whisper model size
    #[arg(long, value_enum, default_value_t = ModelSize::Base)]
    pub model: ModelSize,

    /// Device to run inference on
    #[arg(long, value_enum, default_value_t = Device::Cpu)]
    pub device: Device,

    /// Compute precision
    #[arg(long = "compute-type", value_enum, default_value_t = ComputeType::Int8)]
    pub compute_type: ComputeType,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind to
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Directory where ggml model files are cached
    #[arg(long = "model-dir")]
    pub model_dir: Option<PathBuf>,
}

impl Config {
    /// Parse and validate configuration from the process arguments.
    pub fn load() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(AppError::Config("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(AppError::Config(
                "port must be between 1 and 65535".to_string(),
            ));
        }

        Ok(())
    }

    /// The directory model files are resolved in, creating the platform
    /// default when none was given.
    pub fn models_dir(&self) -> PathBuf {
        self.model_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("whisper-api-server")
                .join("models")
        })
    }

    /// The immutable model descriptor handed to the HTTP layer.
    pub fn descriptor(&self) -> ModelDescriptor {
        ModelDescriptor {
            model: self.model,
            device: self.device,
            compute_type: self.compute_type,
        }
    }
}
