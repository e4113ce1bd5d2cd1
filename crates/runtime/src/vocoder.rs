//! Vocoder inference stage: intermediate spectrogram → waveform.

use tracing::{debug, instrument};
use tts_core::{InferenceSession, InferenceTensor, SlotSpec, TtsResult};

use crate::binding::{SlotBinding, Shaping, bind_slots, read_primary_output};

/// A loaded vocoder.
pub struct VocoderStage {
    id: String,
    session: Box<dyn InferenceSession>,
}

impl std::fmt::Debug for VocoderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VocoderStage")
            .field("id", &self.id)
            .field("inputs", &self.session.input_slots())
            .finish()
    }
}

impl VocoderStage {
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

    /// Bind `mel` to slot 0 with its exact shape, run, and return output slot 0.
    #[instrument(skip_all, fields(model = %self.id))]
    pub fn run(&mut self, mel: InferenceTensor) -> TtsResult<InferenceTensor> {
        bind_slots(
            self.session.as_mut(),
            vec![SlotBinding::new(0, mel)],
            Shaping::Exact,
        )?;
        self.session.run()?;
        let wav = read_primary_output(self.session.as_mut())?;
        debug!(samples = wav.len(), "vocoder output");
        Ok(wav)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_backend::MockRuntime;
    use inference_backend::mock::{MEL_BINS, SAMPLES_PER_FRAME};
    use tts_core::{InferenceRuntime, ModelArtifacts, TtsError};

    fn stage(runtime: &MockRuntime) -> VocoderStage {
        let session = runtime
            .load(&ModelArtifacts::in_dir("inference", "pwgan_csmsc"))
            .unwrap();
        VocoderStage::new("pwgan_csmsc", session)
    }

    #[test]
    fn test_mel_bound_with_exact_shape() {
        let runtime = MockRuntime::new();
        let mut voc = stage(&runtime);
        let mel = InferenceTensor::from_f32(vec![5, MEL_BINS], vec![0.1; 5 * MEL_BINS]).unwrap();

        let wav = voc.run(mel.clone()).unwrap();

        assert_eq!(wav.len(), 5 * SAMPLES_PER_FRAME);
        let bound = runtime.bindings();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].tensor, mel);
    }

    #[test]
    fn test_wrong_mel_width_rejected() {
        let runtime = MockRuntime::new();
        let mut voc = stage(&runtime);
        let mel = InferenceTensor::from_f32(vec![5, 40], vec![0.1; 200]).unwrap();

        let err = voc.run(mel).unwrap_err();
        assert!(matches!(err, TtsError::BindingShape { .. }));
    }
}
