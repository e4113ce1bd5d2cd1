//! # runtime
//!
//! Orchestration for the two-stage TTS inference pipeline.
//!
//! This crate provides:
//! - Model variant resolution (which auxiliary inputs go to which slot)
//! - Slot binding with shape checks
//! - The acoustic and vocoder inference stages
//! - Manifest parsing and the batch synthesis pipeline
//! - Structured logging and metrics

pub mod acoustic;
pub mod binding;
pub mod logging;
pub mod manifest;
pub mod metrics;
pub mod pipeline;
pub mod variant;
pub mod vocoder;

pub use acoustic::AcousticStage;
pub use binding::{Shaping, SlotBinding, bind_slots, conform, read_primary_output};
pub use logging::{LogFormat, init_logging, init_logging_from_config};
pub use manifest::{parse_line, parse_manifest, read_manifest};
pub use metrics::TtsMetrics;
pub use pipeline::{
    FailedUtterance, PipelineSettings, RunSummary, TtsPipeline, UtteranceReport, UtteranceState,
};
pub use variant::{
    AcousticFamily, AuxBinding, AuxInput, Dataset, ModelVariant, VariantResolver, split_identifier,
};
pub use vocoder::VocoderStage;
