//! # tts-core
//!
//! Core types, traits, and error definitions for the two-stage TTS inference
//! pipeline (acoustic model → vocoder).
//!
//! This crate provides the foundational abstractions used across all other crates
//! in the workspace, including:
//!
//! - Common data types (`Utterance`, `PhoneticFeatures`, `AudioChunk`, etc.)
//! - The stage hand-off tensor (`InferenceTensor`) and declared input slots (`SlotSpec`)
//! - Trait definitions for the frontend and the inference runtime
//! - Unified error handling via `TtsError`
//! - Configuration structures

pub mod config;
pub mod error;
pub mod tensor;
pub mod traits;
pub mod types;

pub use config::{
    AM_CHOICES, BackendKind, DeviceConfig, DeviceType, FailurePolicy, LoggingConfig,
    MetricsConfig, SynthesisConfig, VOC_CHOICES, WavFormat,
};
pub use error::{TtsError, TtsResult};
pub use tensor::{ElementType, InferenceTensor, SlotSpec, TensorData};
pub use traits::{InferenceRuntime, InferenceSession, TextFrontend};
pub use types::{
    AudioChunk, FrontendOptions, Lang, ModelArtifacts, PhoneticFeatures, SAMPLE_RATE, SpeakerId,
    Stage, Utterance,
};
