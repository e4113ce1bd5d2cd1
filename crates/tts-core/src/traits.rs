//! Trait definitions for TTS pipeline components.

use crate::error::TtsResult;
use crate::tensor::{InferenceTensor, SlotSpec};
use crate::types::{FrontendOptions, Lang, ModelArtifacts, PhoneticFeatures};

/// Text frontend trait.
///
/// Implementations convert raw sentence text into phone ids (and optionally
/// tone ids), batched per sentence.
pub trait TextFrontend: Send + Sync {
    /// Language handled by this frontend.
    fn lang(&self) -> Lang;

    /// Convert text into phonetic ids.
    ///
    /// # Arguments
    /// * `text` - Sentence text
    /// * `options` - Merge and tone options
    ///
    /// # Returns
    /// One batch entry per sentence, or a single entry when merging.
    fn get_input_ids(&self, text: &str, options: FrontendOptions) -> TtsResult<PhoneticFeatures>;
}

/// A loaded model with named input and output slots.
///
/// Sessions are stateful: tensors are bound, the model is run, then outputs are
/// read. Calls take `&mut self`, so a session is never driven by two callers at
/// once.
pub trait InferenceSession: Send {
    /// Declared input slots, in model order.
    fn input_slots(&self) -> &[SlotSpec];

    /// Declared output names, in model order.
    fn output_names(&self) -> &[String];

    /// Bind a tensor to the named input slot, replacing any previous binding.
    fn bind(&mut self, slot: &str, tensor: InferenceTensor) -> TtsResult<()>;

    /// Execute the model with the current bindings (blocking).
    fn run(&mut self) -> TtsResult<()>;

    /// Read a named output produced by the last `run`.
    fn read(&mut self, slot: &str) -> TtsResult<InferenceTensor>;
}

/// Loader for inference sessions.
pub trait InferenceRuntime {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Load a model.
    fn load(&self, artifacts: &ModelArtifacts) -> TtsResult<Box<dyn InferenceSession>>;
}
