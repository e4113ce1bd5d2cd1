//! Deterministic mock runtime for tests and model-free runs.
//!
//! Sessions mimic the slot layouts of exported acoustic models and vocoders and
//! record every binding so tests can check what the pipeline bound where.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use tts_core::{
    ElementType, InferenceRuntime, InferenceSession, InferenceTensor, ModelArtifacts, SlotSpec,
    TensorData, TtsError, TtsResult,
};

/// Mel bins produced by mock acoustic models.
pub const MEL_BINS: usize = 80;

/// Mel frames produced per phone.
pub const FRAMES_PER_PHONE: usize = 4;

/// Waveform samples produced per mel frame.
pub const SAMPLES_PER_FRAME: usize = 300;

const VOCODER_FAMILIES: &[&str] = &["pwgan", "mb_melgan", "hifigan", "style_melgan", "wavernn"];

/// A binding captured by a mock session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBinding {
    /// Model identifier of the session.
    pub model: String,
    /// Slot name.
    pub slot: String,
    /// Position of the slot in the declared inputs.
    pub slot_index: usize,
    /// The bound tensor.
    pub tensor: InferenceTensor,
}

type BindingLog = Arc<Mutex<Vec<RecordedBinding>>>;

/// Runtime handing out [`MockSession`]s.
///
/// Clones share the binding log.
#[derive(Debug, Clone, Default)]
pub struct MockRuntime {
    layouts: HashMap<String, Vec<SlotSpec>>,
    log: BindingLog,
}

impl MockRuntime {
    /// Create a runtime using default layouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the input slots declared for model `id`.
    pub fn with_layout(mut self, id: impl Into<String>, slots: Vec<SlotSpec>) -> Self {
        self.layouts.insert(id.into(), slots);
        self
    }

    /// All bindings recorded so far, in call order.
    pub fn bindings(&self) -> Vec<RecordedBinding> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Bindings recorded for model `id`.
    pub fn bindings_for(&self, id: &str) -> Vec<RecordedBinding> {
        self.bindings()
            .into_iter()
            .filter(|b| b.model == id)
            .collect()
    }

    /// Forget recorded bindings.
    pub fn clear(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }
}

impl InferenceRuntime for MockRuntime {
    fn name(&self) -> &str {
        "mock"
    }

    fn load(&self, artifacts: &ModelArtifacts) -> TtsResult<Box<dyn InferenceSession>> {
        let kind = MockKind::of(&artifacts.id);
        let inputs = self
            .layouts
            .get(&artifacts.id)
            .cloned()
            .unwrap_or_else(|| default_layout(&artifacts.id, kind));
        debug!(model = %artifacts.id, slots = inputs.len(), "mock model loaded");

        Ok(Box::new(MockSession {
            model: artifacts.id.clone(),
            kind,
            inputs,
            outputs: vec![kind.output_name().to_string()],
            bindings: HashMap::new(),
            result: None,
            log: Arc::clone(&self.log),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockKind {
    Acoustic,
    Vocoder,
}

impl MockKind {
    fn of(id: &str) -> Self {
        let family = id.rsplit_once('_').map_or(id, |(family, _)| family);
        if VOCODER_FAMILIES.contains(&family) {
            Self::Vocoder
        } else {
            Self::Acoustic
        }
    }

    fn output_name(self) -> &'static str {
        match self {
            Self::Acoustic => "logmel",
            Self::Vocoder => "wav",
        }
    }
}

/// Slot layout of the exported model family behind `id`.
fn default_layout(id: &str, kind: MockKind) -> Vec<SlotSpec> {
    if kind == MockKind::Vocoder {
        return vec![SlotSpec::new(
            "logmel",
            ElementType::F32,
            vec![None, Some(MEL_BINS)],
        )];
    }

    let (family, dataset) = id.rsplit_once('_').unwrap_or((id, ""));
    let mut slots = vec![SlotSpec::new("phone_ids", ElementType::I64, vec![None])];
    if family == "speedyspeech" {
        slots.push(SlotSpec::new("tone_ids", ElementType::I64, vec![None]));
    } else if family == "fastspeech2" && matches!(dataset, "aishell3" | "vctk") {
        slots.push(SlotSpec::new("spk_id", ElementType::I64, vec![Some(1)]));
    }
    slots
}

/// A mock model. Outputs depend only on the bound values.
pub struct MockSession {
    model: String,
    kind: MockKind,
    inputs: Vec<SlotSpec>,
    outputs: Vec<String>,
    bindings: HashMap<String, InferenceTensor>,
    result: Option<InferenceTensor>,
    log: BindingLog,
}

impl MockSession {
    fn acoustic(&self) -> TtsResult<InferenceTensor> {
        let phones = self.primary()?;
        let seed: i64 = self
            .bindings
            .values()
            .filter_map(|t| match t.data() {
                TensorData::I64(v) => Some(v.iter().sum::<i64>()),
                TensorData::F32(_) => None,
            })
            .sum();

        let frames = phones.len() * FRAMES_PER_PHONE;
        let mel = (0..frames * MEL_BINS)
            .map(|i| {
                let x = (seed.unsigned_abs() as usize).wrapping_add(i) % 97;
                x as f32 / 97.0 - 0.5
            })
            .collect();
        InferenceTensor::from_f32(vec![frames, MEL_BINS], mel)
    }

    fn vocoder(&self) -> TtsResult<InferenceTensor> {
        let mel = self.primary()?;
        let TensorData::F32(values) = mel.data() else {
            return Err(TtsError::runtime("vocoder expects f32 input"));
        };

        let samples: Vec<f32> = values
            .chunks(MEL_BINS)
            .flat_map(|frame| {
                let level = frame.iter().sum::<f32>() / frame.len() as f32;
                (0..SAMPLES_PER_FRAME).map(move |i| {
                    let phase = i as f32 / SAMPLES_PER_FRAME as f32 * std::f32::consts::TAU;
                    0.3 * (1.0 + level) * phase.sin()
                })
            })
            .collect();
        let len = samples.len();
        InferenceTensor::from_f32(vec![len], samples)
    }

    fn primary(&self) -> TtsResult<&InferenceTensor> {
        let spec = self
            .inputs
            .first()
            .ok_or_else(|| TtsError::runtime("model declares no inputs"))?;
        self.bindings
            .get(&spec.name)
            .ok_or_else(|| TtsError::runtime(format!("input slot '{}' is not bound", spec.name)))
    }
}

impl InferenceSession for MockSession {
    fn input_slots(&self) -> &[SlotSpec] {
        &self.inputs
    }

    fn output_names(&self) -> &[String] {
        &self.outputs
    }

    fn bind(&mut self, slot: &str, tensor: InferenceTensor) -> TtsResult<()> {
        let Some((slot_index, spec)) = self.inputs.iter().enumerate().find(|(_, s)| s.name == slot)
        else {
            return Err(TtsError::binding_shape(
                slot,
                "a declared input slot",
                tensor.shape(),
            ));
        };
        if !spec.accepts(tensor.shape()) {
            return Err(TtsError::binding_shape(
                slot,
                spec.describe_dims(),
                tensor.shape(),
            ));
        }

        self.log
            .lock()
            .map_err(|_| TtsError::internal("mock binding log poisoned"))?
            .push(RecordedBinding {
                model: self.model.clone(),
                slot: slot.to_string(),
                slot_index,
                tensor: tensor.clone(),
            });
        self.bindings.insert(slot.to_string(), tensor);
        Ok(())
    }

    fn run(&mut self) -> TtsResult<()> {
        let output = match self.kind {
            MockKind::Acoustic => self.acoustic()?,
            MockKind::Vocoder => self.vocoder()?,
        };
        self.bindings.clear();
        self.result = Some(output);
        Ok(())
    }

    fn read(&mut self, slot: &str) -> TtsResult<InferenceTensor> {
        if self.outputs.iter().all(|o| o != slot) {
            return Err(TtsError::runtime(format!("unknown output '{slot}'")));
        }
        self.result.take().ok_or_else(|| {
            TtsError::runtime(format!("output '{slot}' not available, run the model first"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(runtime: &MockRuntime, id: &str) -> Box<dyn InferenceSession> {
        runtime
            .load(&ModelArtifacts::in_dir("inference", id))
            .unwrap()
    }

    #[test]
    fn test_default_layouts() {
        let runtime = MockRuntime::new();

        let names = |id: &str| -> Vec<String> {
            load(&runtime, id)
                .input_slots()
                .iter()
                .map(|s| s.name.clone())
                .collect()
        };
        assert_eq!(names("fastspeech2_csmsc"), vec!["phone_ids"]);
        assert_eq!(names("speedyspeech_csmsc"), vec!["phone_ids", "tone_ids"]);
        assert_eq!(names("fastspeech2_aishell3"), vec!["phone_ids", "spk_id"]);
        assert_eq!(names("mb_melgan_csmsc"), vec!["logmel"]);
    }

    #[test]
    fn test_acoustic_then_vocoder() {
        let runtime = MockRuntime::new();
        let mut am = load(&runtime, "fastspeech2_csmsc");
        am.bind("phone_ids", InferenceTensor::from_ids(vec![1, 2, 3]))
            .unwrap();
        am.run().unwrap();
        let mel = am.read("logmel").unwrap();
        assert_eq!(mel.shape(), &[3 * FRAMES_PER_PHONE, MEL_BINS]);

        let mut voc = load(&runtime, "pwgan_csmsc");
        voc.bind("logmel", mel).unwrap();
        voc.run().unwrap();
        let wav = voc.read("wav").unwrap();
        assert_eq!(wav.len(), 3 * FRAMES_PER_PHONE * SAMPLES_PER_FRAME);
    }

    #[test]
    fn test_outputs_are_deterministic() {
        let runtime = MockRuntime::new();
        let run = || {
            let mut am = load(&runtime, "speedyspeech_csmsc");
            am.bind("phone_ids", InferenceTensor::from_ids(vec![5, 6]))
                .unwrap();
            am.bind("tone_ids", InferenceTensor::from_ids(vec![1, 3]))
                .unwrap();
            am.run().unwrap();
            am.read("logmel").unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_bindings_are_recorded() {
        let runtime = MockRuntime::new();
        let mut am = load(&runtime, "fastspeech2_vctk");
        am.bind("phone_ids", InferenceTensor::from_ids(vec![1])).unwrap();
        am.bind("spk_id", InferenceTensor::from_ids(vec![7])).unwrap();

        let recorded = runtime.bindings_for("fastspeech2_vctk");
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[1].slot, "spk_id");
        assert_eq!(recorded[1].slot_index, 1);
        assert_eq!(recorded[1].tensor, InferenceTensor::from_ids(vec![7]));

        runtime.clear();
        assert!(runtime.bindings().is_empty());
    }

    #[test]
    fn test_bind_rejects_bad_shape_and_unknown_slot() {
        let runtime = MockRuntime::new();
        let mut am = load(&runtime, "fastspeech2_aishell3");

        let err = am
            .bind("spk_id", InferenceTensor::from_ids(vec![1, 2]))
            .unwrap_err();
        assert!(matches!(err, TtsError::BindingShape { .. }));

        let err = am
            .bind("tone_ids", InferenceTensor::from_ids(vec![1]))
            .unwrap_err();
        assert!(matches!(err, TtsError::BindingShape { .. }));
    }

    #[test]
    fn test_run_without_binding_fails() {
        let runtime = MockRuntime::new();
        let mut am = load(&runtime, "fastspeech2_csmsc");
        assert!(matches!(am.run(), Err(TtsError::Runtime(_))));
    }

    #[test]
    fn test_custom_layout() {
        let runtime = MockRuntime::new().with_layout(
            "fastspeech2_csmsc",
            vec![SlotSpec::new("text", ElementType::I64, vec![Some(1), None])],
        );
        let am = load(&runtime, "fastspeech2_csmsc");
        assert_eq!(am.input_slots()[0].rank(), Some(2));
    }
}
