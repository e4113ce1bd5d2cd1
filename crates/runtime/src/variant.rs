//! Acoustic model variants and their auxiliary inputs.
//!
//! An identifier such as `fastspeech2_aishell3` is split at its last `_` into a
//! family and a dataset. The variant decides which auxiliary inputs the
//! acoustic model takes and at which input slot each one is bound.

use std::fmt;

/// Acoustic model family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AcousticFamily {
    SpeedySpeech,
    FastSpeech2,
    Tacotron2,
    /// Any other family; takes no auxiliary inputs.
    Other(String),
}

impl AcousticFamily {
    /// Parse a family name. Unknown names are kept as [`AcousticFamily::Other`].
    pub fn parse(name: &str) -> Self {
        match name {
            "speedyspeech" => Self::SpeedySpeech,
            "fastspeech2" => Self::FastSpeech2,
            "tacotron2" => Self::Tacotron2,
            other => Self::Other(other.to_string()),
        }
    }

    /// Family name as written in identifiers.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SpeedySpeech => "speedyspeech",
            Self::FastSpeech2 => "fastspeech2",
            Self::Tacotron2 => "tacotron2",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for AcousticFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Training dataset of a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dataset {
    Csmsc,
    Aishell3,
    Vctk,
    /// Any other dataset (empty when the identifier has no `_`).
    Other(String),
}

impl Dataset {
    /// Parse a dataset name. Unknown names are kept as [`Dataset::Other`].
    pub fn parse(name: &str) -> Self {
        match name {
            "csmsc" => Self::Csmsc,
            "aishell3" => Self::Aishell3,
            "vctk" => Self::Vctk,
            other => Self::Other(other.to_string()),
        }
    }

    /// Dataset name as written in identifiers.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Csmsc => "csmsc",
            Self::Aishell3 => "aishell3",
            Self::Vctk => "vctk",
            Self::Other(name) => name,
        }
    }

    /// Whether models trained on this dataset are multi-speaker.
    pub fn is_multi_speaker(&self) -> bool {
        matches!(self, Self::Aishell3 | Self::Vctk)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of auxiliary acoustic model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxInput {
    /// Per-phone tone ids, aligned with the phone ids.
    ToneIds,
    /// A single speaker id.
    SpeakerId,
}

impl fmt::Display for AuxInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToneIds => f.write_str("tone_ids"),
            Self::SpeakerId => f.write_str("spk_id"),
        }
    }
}

/// An auxiliary input and the slot it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxBinding {
    pub input: AuxInput,
    pub slot_index: usize,
}

/// Resolved acoustic model variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVariant {
    pub family: AcousticFamily,
    pub dataset: Dataset,
    aux: Vec<AuxBinding>,
}

impl ModelVariant {
    /// Check whether tone ids are bound.
    pub fn needs_tone_ids(&self) -> bool {
        self.has(AuxInput::ToneIds)
    }

    /// Check whether a speaker id is bound.
    pub fn needs_speaker_id(&self) -> bool {
        self.has(AuxInput::SpeakerId)
    }

    /// Auxiliary inputs in slot order.
    pub fn aux_bindings(&self) -> &[AuxBinding] {
        &self.aux
    }

    fn has(&self, input: AuxInput) -> bool {
        self.aux.iter().any(|b| b.input == input)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family, self.dataset)?;
        for aux in &self.aux {
            write!(f, " +{}@{}", aux.input, aux.slot_index)?;
        }
        Ok(())
    }
}

/// Split an identifier at its last `_` into (family, dataset).
pub fn split_identifier(identifier: &str) -> (&str, &str) {
    identifier.rsplit_once('_').unwrap_or((identifier, ""))
}

/// Resolves identifiers into [`ModelVariant`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantResolver {
    speaker_vocab_supplied: bool,
}

impl VariantResolver {
    /// Create a resolver. `speaker_vocab_supplied` tells whether configuration
    /// named a speaker vocabulary.
    pub fn new(speaker_vocab_supplied: bool) -> Self {
        Self {
            speaker_vocab_supplied,
        }
    }

    /// Resolve `identifier`.
    ///
    /// `dataset_aux_available` is true when the loaded acoustic model declares
    /// more than one input slot. Unknown families and datasets resolve to a
    /// variant without auxiliary inputs.
    pub fn resolve(&self, identifier: &str, dataset_aux_available: bool) -> ModelVariant {
        let (family, dataset) = split_identifier(identifier);
        let family = AcousticFamily::parse(family);
        let dataset = Dataset::parse(dataset);

        let needs_tones = family == AcousticFamily::SpeedySpeech;
        let needs_speaker =
            dataset.is_multi_speaker() && self.speaker_vocab_supplied && dataset_aux_available;

        // Consecutive slots from 1: tones first, then speaker
        let aux = [
            (needs_tones, AuxInput::ToneIds),
            (needs_speaker, AuxInput::SpeakerId),
        ]
        .into_iter()
        .filter(|(needed, _)| *needed)
        .enumerate()
        .map(|(i, (_, input))| AuxBinding {
            input,
            slot_index: i + 1,
        })
        .collect();

        ModelVariant {
            family,
            dataset,
            aux,
        }
    }
}
