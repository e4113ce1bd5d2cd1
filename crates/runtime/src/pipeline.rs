//! Batch synthesis pipeline: frontend → acoustic model → vocoder → WAV.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use audio_output::{ensure_dir, write_chunk};
use text_frontend::{Frontend, FrontendFiles, IdMap, MockFrontend};
use tts_core::{
    AudioChunk, BackendKind, FailurePolicy, FrontendOptions, InferenceRuntime, ModelArtifacts,
    SAMPLE_RATE, SpeakerId, Stage, SynthesisConfig, TextFrontend, TtsError, TtsResult,
    Utterance, WavFormat,
};

use crate::acoustic::AcousticStage;
use crate::metrics::TtsMetrics;
use crate::variant::{ModelVariant, VariantResolver};
use crate::vocoder::VocoderStage;

/// Vocabulary size of the mock frontend.
const MOCK_VOCAB_SIZE: i64 = 256;

/// Progress of one utterance. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UtteranceState {
    Fetched,
    FrontendDone,
    AcousticDone,
    VocoderDone,
    Persisted,
}

impl UtteranceState {
    /// The stage that leaves this state, `None` once persisted.
    pub fn pending_stage(self) -> Option<Stage> {
        match self {
            Self::Fetched => Some(Stage::Frontend),
            Self::FrontendDone => Some(Stage::Acoustic),
            Self::AcousticDone => Some(Stage::Vocoder),
            Self::VocoderDone => Some(Stage::Persist),
            Self::Persisted => None,
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Fetched => Self::FrontendDone,
            Self::FrontendDone => Self::AcousticDone,
            Self::AcousticDone => Self::VocoderDone,
            Self::VocoderDone | Self::Persisted => Self::Persisted,
        }
    }
}

/// Drives one utterance through its stages.
struct UtteranceRun<'a> {
    id: &'a str,
    state: UtteranceState,
    metrics: TtsMetrics,
}

impl<'a> UtteranceRun<'a> {
    fn new(id: &'a str, metrics: TtsMetrics) -> Self {
        Self {
            id,
            state: UtteranceState::Fetched,
            metrics,
        }
    }

    /// Run the pending stage; on failure the error names the utterance and stage.
    fn step<T>(&mut self, f: impl FnOnce() -> TtsResult<T>) -> TtsResult<T> {
        let Some(stage) = self.state.pending_stage() else {
            return Err(TtsError::internal(format!(
                "utterance '{}' already persisted",
                self.id
            )));
        };

        let start = Instant::now();
        match f() {
            Ok(value) => {
                self.metrics
                    .record_stage_latency(stage, start.elapsed().as_secs_f64() * 1000.0);
                self.state = self.state.next();
                Ok(value)
            }
            Err(e) => {
                self.metrics.utterance_failed(stage);
                Err(e.in_utterance(self.id, stage))
            }
        }
    }
}

/// Output and failure handling settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Speaker id bound for multi-speaker variants.
    pub speaker_id: Option<SpeakerId>,
    /// Directory receiving `<utt_id>.wav`.
    pub output_dir: PathBuf,
    /// Output sample encoding.
    pub wav_format: WavFormat,
    /// What to do when one utterance fails.
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            speaker_id: None,
            output_dir: PathBuf::from("output"),
            wav_format: WavFormat::Float32,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// A successfully written utterance.
#[derive(Debug, Clone)]
pub struct UtteranceReport {
    pub id: String,
    pub path: PathBuf,
    pub num_samples: usize,
    pub duration_ms: f32,
    pub elapsed: Duration,
}

/// An utterance skipped under the `continue` failure policy.
#[derive(Debug)]
pub struct FailedUtterance {
    pub id: String,
    pub error: TtsError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<UtteranceReport>,
    pub failed: Vec<FailedUtterance>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Total audio written, in seconds.
    pub fn audio_seconds(&self) -> f64 {
        self.written
            .iter()
            .map(|r| r.duration_ms as f64 / 1000.0)
            .sum()
    }

    /// Real-time factor over the whole run.
    pub fn rtf(&self) -> f64 {
        let audio = self.audio_seconds();
        if audio > 0.0 {
            self.elapsed.as_secs_f64() / audio
        } else {
            0.0
        }
    }

    /// Check if every utterance was written.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The batch synthesis pipeline.
///
/// Owns the frontend and both loaded models. Sessions are driven through
/// `&mut self`, so utterances are processed strictly one at a time.
pub struct TtsPipeline {
    frontend: Box<dyn TextFrontend>,
    acoustic: AcousticStage,
    vocoder: VocoderStage,
    variant: ModelVariant,
    options: FrontendOptions,
    settings: PipelineSettings,
    metrics: TtsMetrics,
}

impl std::fmt::Debug for TtsPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsPipeline")
            .field("lang", &self.frontend.lang())
            .field("acoustic", &self.acoustic)
            .field("vocoder", &self.vocoder)
            .field("variant", &self.variant)
            .field("settings", &self.settings)
            .finish()
    }
}

impl TtsPipeline {
    /// Assemble a pipeline from loaded parts.
    ///
    /// Merge mode is always on; tone ids are requested iff the variant needs them.
    pub fn new(
        frontend: Box<dyn TextFrontend>,
        acoustic: AcousticStage,
        vocoder: VocoderStage,
        variant: ModelVariant,
        settings: PipelineSettings,
    ) -> Self {
        let options = FrontendOptions {
            merge_sentences: true,
            get_tone_ids: variant.needs_tone_ids(),
        };
        Self {
            frontend,
            acoustic,
            vocoder,
            variant,
            options,
            settings,
            metrics: TtsMetrics::init_noop(),
        }
    }

    /// Load frontend and models as configured.
    ///
    /// Configuration and load errors are returned here, before any utterance runs.
    #[instrument(skip_all, fields(am = %config.am, voc = %config.voc))]
    pub fn from_config(config: &SynthesisConfig, runtime: &dyn InferenceRuntime) -> TtsResult<Self> {
        config.validate()?;

        let frontend = load_frontend(config)?;

        let am_session = runtime.load(&ModelArtifacts::in_dir(&config.inference_dir, &config.am))?;
        let acoustic = AcousticStage::new(&config.am, am_session);
        let slot_names: Vec<&str> = acoustic.input_slots().iter().map(|s| s.name.as_str()).collect();
        info!(inputs = ?slot_names, "acoustic model input slots");

        let voc_session = runtime.load(&ModelArtifacts::in_dir(&config.inference_dir, &config.voc))?;
        let vocoder = VocoderStage::new(&config.voc, voc_session);

        let variant = VariantResolver::new(config.speaker_dict.is_some())
            .resolve(&config.am, acoustic.dataset_aux_available());
        info!(variant = %variant, backend = runtime.name(), "model variant resolved");

        if variant.needs_tone_ids() && config.tones_dict.is_none() && config.phones_dict.is_some() {
            return Err(TtsError::config(format!(
                "{} needs tone ids, set tones_dict",
                config.am
            )));
        }

        let speaker_id = if variant.needs_speaker_id() {
            Some(check_speaker(config)?)
        } else {
            None
        };

        let settings = PipelineSettings {
            speaker_id,
            output_dir: config.output_dir.clone(),
            wav_format: config.wav_format,
            failure_policy: config.failure_policy,
        };
        Ok(Self::new(frontend, acoustic, vocoder, variant, settings))
    }

    /// Report into `metrics` instead of the no-op handle.
    pub fn with_metrics(mut self, metrics: TtsMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// The resolved model variant.
    pub fn variant(&self) -> &ModelVariant {
        &self.variant
    }

    /// Frontend options used for every utterance.
    pub fn frontend_options(&self) -> FrontendOptions {
        self.options
    }

    /// Output settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Path an utterance is written to.
    pub fn output_path(&self, id: &str) -> PathBuf {
        self.settings.output_dir.join(format!("{id}.wav"))
    }

    /// Run one utterance through frontend, acoustic model and vocoder, and write it.
    #[instrument(skip_all, fields(utt_id = %utterance.id))]
    pub fn synthesize_utterance(&mut self, utterance: &Utterance) -> TtsResult<UtteranceReport> {
        let start = Instant::now();
        let mut run = UtteranceRun::new(&utterance.id, self.metrics);

        let features = run.step(|| self.frontend.get_input_ids(&utterance.text, self.options))?;
        let mel = run.step(|| {
            self.acoustic
                .run(features, &self.variant, self.settings.speaker_id)
        })?;
        let wav = run.step(|| self.vocoder.run(mel))?;

        let audio = AudioChunk::new(wav.into_f32_vec(), SAMPLE_RATE);
        let path = self.output_path(&utterance.id);
        run.step(|| write_chunk(&path, &audio, self.settings.wav_format))?;

        let elapsed = start.elapsed();
        let duration_ms = audio.duration_ms();
        if duration_ms > 0.0 {
            self.metrics
                .record_rtf(elapsed.as_secs_f64() / (duration_ms as f64 / 1000.0));
        }
        self.metrics.record_audio_seconds(duration_ms as f64 / 1000.0);

        Ok(UtteranceReport {
            id: utterance.id.clone(),
            path,
            num_samples: audio.num_samples(),
            duration_ms,
            elapsed,
        })
    }

    /// Synthesize every utterance in order.
    ///
    /// The output directory is created first. Under [`FailurePolicy::Abort`] the
    /// first failure ends the run; under [`FailurePolicy::Continue`] it is
    /// logged and recorded in the summary.
    #[instrument(skip_all, fields(utterances = utterances.len()))]
    pub fn run(&mut self, utterances: &[Utterance]) -> TtsResult<RunSummary> {
        let start = Instant::now();
        ensure_dir(&self.settings.output_dir)?;

        let mut summary = RunSummary::default();
        for utterance in utterances {
            self.metrics.utterance_started();
            match self.synthesize_utterance(utterance) {
                Ok(report) => {
                    self.metrics.utterance_completed();
                    info!(
                        utt_id = %report.id,
                        samples = report.num_samples,
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "{} done!",
                        report.id
                    );
                    summary.written.push(report);
                }
                Err(e) => match self.settings.failure_policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::Continue => {
                        error!(utt_id = %utterance.id, error = %e.root(), "{e}, skipping");
                        summary.failed.push(FailedUtterance {
                            id: utterance.id.clone(),
                            error: e,
                        });
                    }
                },
            }
        }

        summary.elapsed = start.elapsed();
        info!(
            written = summary.written.len(),
            failed = summary.failed.len(),
            audio_secs = summary.audio_seconds(),
            rtf = summary.rtf(),
            "synthesis finished"
        );
        Ok(summary)
    }
}

/// Lexicon frontend from the configured files, or the mock frontend for mock runs
/// without vocabularies.
fn load_frontend(config: &SynthesisConfig) -> TtsResult<Box<dyn TextFrontend>> {
    let Some(phones) = &config.phones_dict else {
        if config.backend == BackendKind::Mock {
            info!(lang = %config.lang, "using mock frontend");
            return Ok(Box::new(MockFrontend::new(config.lang, MOCK_VOCAB_SIZE)));
        }
        return Err(TtsError::config("phones_dict is required"));
    };
    let lexicon = config
        .lexicon
        .as_ref()
        .ok_or_else(|| TtsError::config("lexicon is required"))?;

    let mut files = FrontendFiles::new(lexicon, phones);
    if let Some(tones) = &config.tones_dict {
        files = files.with_tones(tones);
    }
    Ok(Box::new(Frontend::load(config.lang, &files)?))
}

/// Load the speaker vocabulary and check the configured id against it.
///
/// An id missing from the vocabulary is bound anyway, with a warning.
fn check_speaker(config: &SynthesisConfig) -> TtsResult<SpeakerId> {
    let path: &Path = config
        .speaker_dict
        .as_deref()
        .ok_or_else(|| TtsError::config("speaker_dict is required for multi-speaker models"))?;
    let speakers = IdMap::from_file(path)?;
    info!(spk_num = speakers.len(), spk_id = config.spk_id, "speaker vocabulary loaded");
    if !speakers.contains_id(config.spk_id) {
        warn!(
            spk_id = config.spk_id,
            path = %path.display(),
            "speaker id not found in speaker vocabulary"
        );
    }
    Ok(config.spk_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_order() {
        let mut state = UtteranceState::Fetched;
        let mut stages = Vec::new();
        while let Some(stage) = state.pending_stage() {
            stages.push(stage);
            let next = state.next();
            assert!(next > state);
            state = next;
        }
        assert_eq!(
            stages,
            vec![Stage::Frontend, Stage::Acoustic, Stage::Vocoder, Stage::Persist]
        );
        assert_eq!(state, UtteranceState::Persisted);
    }

    #[test]
    fn test_step_wraps_error_with_stage() {
        let mut run = UtteranceRun::new("utt1", TtsMetrics::init_noop());
        run.step(|| Ok(())).unwrap();

        let err = run
            .step(|| -> TtsResult<()> { Err(TtsError::runtime("boom")) })
            .unwrap_err();
        match &err {
            TtsError::Utterance { id, stage, .. } => {
                assert_eq!(id, "utt1");
                assert_eq!(*stage, Stage::Acoustic);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(err.root(), TtsError::Runtime(_)));
        // Failed stage does not advance
        assert_eq!(run.state, UtteranceState::FrontendDone);
    }

    #[test]
    fn test_summary_rtf() {
        let summary = RunSummary {
            written: vec![UtteranceReport {
                id: "a".into(),
                path: PathBuf::from("a.wav"),
                num_samples: 48000,
                duration_ms: 2000.0,
                elapsed: Duration::from_millis(500),
            }],
            failed: Vec::new(),
            elapsed: Duration::from_secs(1),
        };
        assert!((summary.audio_seconds() - 2.0).abs() < 1e-9);
        assert!((summary.rtf() - 0.5).abs() < 1e-9);
        assert!(summary.is_success());
        assert_eq!(RunSummary::default().rtf(), 0.0);
    }

    #[test]
    fn test_missing_phones_dict_with_onnx_backend() {
        let config = SynthesisConfig::default();
        let err = load_frontend(&config).err().expect("expected an error");
        assert!(matches!(err, TtsError::Config(_)));
    }
}
