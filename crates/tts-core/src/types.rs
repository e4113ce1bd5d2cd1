//! Core data types for the TTS pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{TtsError, TtsResult};

/// Speaker identifier bound to multi-speaker acoustic models.
pub type SpeakerId = i64;

/// Supported frontend languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Mandarin Chinese.
    #[default]
    Zh,
    /// English.
    En,
}

impl Lang {
    /// Separator used to join manifest tokens back into a sentence.
    ///
    /// Ideographic text is written without word spacing.
    pub fn token_separator(&self) -> &'static str {
        match self {
            Lang::Zh => "",
            Lang::En => " ",
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lang::Zh => write!(f, "zh"),
            Lang::En => write!(f, "en"),
        }
    }
}

impl std::str::FromStr for Lang {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zh" => Ok(Lang::Zh),
            "en" => Ok(Lang::En),
            _ => Err(TtsError::config(format!(
                "unsupported language: {s}, expected: zh or en"
            ))),
        }
    }
}

/// A single line of the input manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// Utterance id, also the output file stem.
    pub id: String,
    /// Sentence to synthesize.
    pub text: String,
}

impl Utterance {
    /// Create a new utterance.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Frontend call options.
///
/// Resolved once from configuration and the model variant, never decided per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontendOptions {
    /// Concatenate all sentences into a single batch entry.
    pub merge_sentences: bool,
    /// Produce tone ids alongside phone ids.
    pub get_tone_ids: bool,
}

impl Default for FrontendOptions {
    fn default() -> Self {
        Self {
            merge_sentences: true,
            get_tone_ids: false,
        }
    }
}

impl FrontendOptions {
    /// Options with tone ids requested.
    pub fn with_tone_ids(mut self, get_tone_ids: bool) -> Self {
        self.get_tone_ids = get_tone_ids;
        self
    }
}

/// Phone (and optional tone) ids produced by the frontend for one utterance.
///
/// Each outer entry is one sentence; in merge mode there is exactly one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneticFeatures {
    /// Phone ids per batch entry.
    pub phone_ids: Vec<Vec<i64>>,
    /// Tone ids per batch entry, element-aligned with `phone_ids`.
    pub tone_ids: Option<Vec<Vec<i64>>>,
}

impl PhoneticFeatures {
    /// Create features without tone ids.
    pub fn new(phone_ids: Vec<Vec<i64>>) -> Self {
        Self {
            phone_ids,
            tone_ids: None,
        }
    }

    /// Create features with tone ids, checking entry-wise alignment.
    pub fn with_tones(phone_ids: Vec<Vec<i64>>, tone_ids: Vec<Vec<i64>>) -> TtsResult<Self> {
        let features = Self {
            phone_ids,
            tone_ids: Some(tone_ids),
        };
        features.validate()?;
        Ok(features)
    }

    /// Number of batch entries.
    pub fn num_entries(&self) -> usize {
        self.phone_ids.len()
    }

    /// Check that tone ids (if any) are aligned with phone ids.
    pub fn validate(&self) -> TtsResult<()> {
        let Some(tones) = &self.tone_ids else {
            return Ok(());
        };
        if tones.len() != self.phone_ids.len() {
            return Err(TtsError::frontend(format!(
                "tone batch has {} entries, phone batch has {}",
                tones.len(),
                self.phone_ids.len()
            )));
        }
        for (i, (phones, tones)) in self.phone_ids.iter().zip(tones).enumerate() {
            if phones.len() != tones.len() {
                return Err(TtsError::frontend(format!(
                    "entry {i}: {} tone ids for {} phone ids",
                    tones.len(),
                    phones.len()
                )));
            }
        }
        Ok(())
    }
}

/// Per-utterance processing stages, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Text → phone/tone ids.
    Frontend,
    /// Phone ids → intermediate spectrogram.
    Acoustic,
    /// Intermediate → waveform.
    Vocoder,
    /// Waveform → file.
    Persist,
}

impl Stage {
    /// Stable lowercase name, used for log fields and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Frontend => "frontend",
            Stage::Acoustic => "acoustic",
            Stage::Vocoder => "vocoder",
            Stage::Persist => "persist",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of an exported model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifacts {
    /// Model identifier (`{family}_{dataset}`).
    pub id: String,
    /// Path of the serialized graph.
    pub model_path: PathBuf,
}

impl ModelArtifacts {
    /// File extension of exported models.
    pub const EXTENSION: &'static str = "onnx";

    /// Artifacts for `id` inside `inference_dir` (`<dir>/<id>.onnx`).
    pub fn in_dir(inference_dir: impl AsRef<Path>, id: impl Into<String>) -> Self {
        let id = id.into();
        let model_path = inference_dir
            .as_ref()
            .join(format!("{id}.{}", Self::EXTENSION));
        Self { id, model_path }
    }
}

/// Sample rate of every vocoder and of every written WAV, in Hz.
pub const SAMPLE_RATE: u32 = 24000;

/// A block of decoded audio.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM samples (f32, mono).
    pub pcm: Arc<[f32]>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioChunk {
    /// Create a new audio chunk.
    pub fn new(pcm: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            pcm: pcm.into(),
            sample_rate,
        }
    }

    /// Get the duration of this chunk in milliseconds.
    pub fn duration_ms(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.pcm.len() as f32 / self.sample_rate as f32 * 1000.0
    }

    /// Get the number of samples in this chunk.
    pub fn num_samples(&self) -> usize {
        self.pcm.len()
    }
}
