//! Acoustic inference stage: phonetic ids → intermediate spectrogram.

use tracing::{debug, instrument};
use tts_core::{
    InferenceSession, InferenceTensor, PhoneticFeatures, SlotSpec, SpeakerId, TtsError, TtsResult,
};

use crate::binding::{SlotBinding, Shaping, bind_slots, read_primary_output};
use crate::variant::{AuxInput, ModelVariant};

/// A loaded acoustic model.
pub struct AcousticStage {
    id: String,
    session: Box<dyn InferenceSession>,
}

impl std::fmt::Debug for AcousticStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcousticStage")
            .field("id", &self.id)
            .field("inputs", &self.session.input_slots())
            .finish()
    }
}

impl AcousticStage {
    pub fn new(id: impl Into<String>, session: Box<dyn InferenceSession>) -> Self {
        Self {
            id: id.into(),
            session,
        }
    }

    /// Model identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declared input slots.
    pub fn input_slots(&self) -> &[SlotSpec] {
        self.session.input_slots()
    }

    /// Whether the model declares inputs beyond the phone ids.
    pub fn dataset_aux_available(&self) -> bool {
        self.session.input_slots().len() > 1
    }

    /// Run the model on the first batch entry of `features`.
    ///
    /// Returns output slot 0 unmodified.
    #[instrument(skip_all, fields(model = %self.id))]
    pub fn run(
        &mut self,
        features: PhoneticFeatures,
        variant: &ModelVariant,
        speaker_id: Option<SpeakerId>,
    ) -> TtsResult<InferenceTensor> {
        features.validate()?;
        if features.num_entries() > 1 {
            debug!(entries = features.num_entries(), "using first batch entry only");
        }

        let phones = features.phone_ids.into_iter().next().unwrap_or_default();
        if phones.is_empty() {
            return Err(TtsError::invalid_input("empty phone sequence"));
        }
        let mut tones = features
            .tone_ids
            .and_then(|entries| entries.into_iter().next());

        let mut bindings = vec![SlotBinding::new(0, InferenceTensor::from_ids(phones))];
        for aux in variant.aux_bindings() {
            let tensor = match aux.input {
                AuxInput::ToneIds => {
                    let tones = tones.take().ok_or_else(|| {
                        TtsError::frontend(format!(
                            "{} needs tone ids but the frontend produced none",
                            self.id
                        ))
                    })?;
                    InferenceTensor::from_ids(tones)
                }
                AuxInput::SpeakerId => {
                    let speaker = speaker_id.ok_or_else(|| {
                        TtsError::config(format!("{} needs a speaker id", self.id))
                    })?;
                    InferenceTensor::from_ids(vec![speaker])
                }
            };
            bindings.push(SlotBinding::new(aux.slot_index, tensor));
        }

        bind_slots(self.session.as_mut(), bindings, Shaping::BatchOfOne)?;
        self.session.run()?;
        let output = read_primary_output(self.session.as_mut())?;
        debug!(shape = ?output.shape(), "acoustic output");
        Ok(output)
    }
}
