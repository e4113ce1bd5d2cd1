//! Configuration structures for the TTS pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{TtsError, TtsResult};
use crate::types::{Lang, SpeakerId};

/// Supported acoustic model identifiers (`{family}_{dataset}`).
pub const AM_CHOICES: &[&str] = &[
    "speedyspeech_csmsc",
    "fastspeech2_csmsc",
    "fastspeech2_aishell3",
    "fastspeech2_vctk",
    "tacotron2_csmsc",
];

/// Supported vocoder identifiers (`{family}_{dataset}`).
pub const VOC_CHOICES: &[&str] = &[
    "pwgan_csmsc",
    "mb_melgan_csmsc",
    "hifigan_csmsc",
    "pwgan_aishell3",
    "pwgan_vctk",
];

/// Batch synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Acoustic model identifier.
    #[serde(default = "default_am")]
    pub am: String,

    /// Vocoder identifier.
    #[serde(default = "default_voc")]
    pub voc: String,

    /// Frontend language.
    #[serde(default)]
    pub lang: Lang,

    /// Phone vocabulary file.
    #[serde(default)]
    pub phones_dict: Option<PathBuf>,

    /// Tone vocabulary file.
    #[serde(default)]
    pub tones_dict: Option<PathBuf>,

    /// Speaker id map file.
    #[serde(default)]
    pub speaker_dict: Option<PathBuf>,

    /// Pronunciation lexicon used by the frontend.
    #[serde(default)]
    pub lexicon: Option<PathBuf>,

    /// Speaker id for multi-speaker acoustic models.
    #[serde(default)]
    pub spk_id: SpeakerId,

    /// Manifest of `utt_id sentence` lines.
    #[serde(default)]
    pub text: Option<PathBuf>,

    /// Directory holding exported models.
    #[serde(default = "default_inference_dir")]
    pub inference_dir: PathBuf,

    /// Directory receiving `<utt_id>.wav` files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Inference backend.
    #[serde(default)]
    pub backend: BackendKind,

    /// Compute device preference.
    #[serde(default)]
    pub device: DeviceConfig,

    /// What to do when one utterance fails.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Output sample encoding.
    #[serde(default)]
    pub wav_format: WavFormat,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_am() -> String {
    "fastspeech2_csmsc".to_string()
}

fn default_voc() -> String {
    "pwgan_csmsc".to_string()
}

fn default_inference_dir() -> PathBuf {
    PathBuf::from("inference")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            am: default_am(),
            voc: default_voc(),
            lang: Lang::default(),
            phones_dict: None,
            tones_dict: None,
            speaker_dict: None,
            lexicon: None,
            spk_id: 0,
            text: None,
            inference_dir: default_inference_dir(),
            output_dir: default_output_dir(),
            backend: BackendKind::default(),
            device: DeviceConfig::default(),
            failure_policy: FailurePolicy::default(),
            wav_format: WavFormat::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl SynthesisConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> TtsResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TtsError::config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> TtsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check identifiers against the supported sets.
    pub fn validate(&self) -> TtsResult<()> {
        if !AM_CHOICES.contains(&self.am.as_str()) {
            return Err(TtsError::config(format!(
                "unsupported acoustic model: {}, expected one of: {}",
                self.am,
                AM_CHOICES.join(", ")
            )));
        }
        if !VOC_CHOICES.contains(&self.voc.as_str()) {
            return Err(TtsError::config(format!(
                "unsupported vocoder: {}, expected one of: {}",
                self.voc,
                VOC_CHOICES.join(", ")
            )));
        }
        Ok(())
    }
}

/// Inference backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ONNX graphs executed with candle.
    #[default]
    Onnx,
    /// Deterministic mock sessions (no model files needed).
    Mock,
}

/// Per-utterance failure handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run at the first failing utterance.
    #[default]
    Abort,
    /// Log the failing utterance and carry on with the next one.
    Continue,
}

/// Output sample encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavFormat {
    /// 32-bit float samples, written as produced by the vocoder.
    #[default]
    Float32,
    /// 16-bit integer samples, clamped to [-1, 1].
    Pcm16,
}

/// Compute device configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Preferred device type.
    #[serde(default)]
    pub device_type: DeviceType,
    /// Specific GPU device index.
    #[serde(default)]
    pub gpu_index: Option<usize>,
}

/// Device type for computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Best available device.
    #[default]
    Auto,
    /// CPU computation.
    Cpu,
    /// CUDA GPU computation.
    Cuda,
    /// Metal GPU computation (Apple).
    Metal,
}

impl std::str::FromStr for DeviceType {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" | "nvidia" => Ok(Self::Cuda),
            "metal" | "mps" | "apple" => Ok(Self::Metal),
            _ => Err(TtsError::config(format!("unknown device: {s}"))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json or text).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,
    /// Prometheus exporter port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_config_default() {
        let config = SynthesisConfig::default();
        assert_eq!(config.am, "fastspeech2_csmsc");
        assert_eq!(config.voc, "pwgan_csmsc");
        assert_eq!(config.lang, Lang::Zh);
        assert_eq!(config.spk_id, 0);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.wav_format, WavFormat::Float32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_identifiers() {
        let config = SynthesisConfig {
            am: "glowtts_csmsc".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TtsError::Config(_))));

        let config = SynthesisConfig {
            voc: "wavernn_csmsc".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TtsError::Config(_))));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SynthesisConfig::from_json(
            r#"{"am": "speedyspeech_csmsc", "lang": "zh", "failure_policy": "continue"}"#,
        )
        .unwrap();
        assert_eq!(config.am, "speedyspeech_csmsc");
        assert_eq!(config.voc, "pwgan_csmsc");
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_json_rejects_bad_language() {
        let err = SynthesisConfig::from_json(r#"{"lang": "fr"}"#).unwrap_err();
        assert!(matches!(err, TtsError::Serialization(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tts.json");
        std::fs::write(&path, r#"{"voc": "hifigan_csmsc", "spk_id": 3}"#).unwrap();

        let config = SynthesisConfig::from_file(&path).unwrap();
        assert_eq!(config.voc, "hifigan_csmsc");
        assert_eq!(config.spk_id, 3);

        let missing = SynthesisConfig::from_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(TtsError::Config(_))));
    }

    #[test]
    fn test_device_type_parse() {
        assert_eq!("cpu".parse::<DeviceType>().unwrap(), DeviceType::Cpu);
        assert_eq!("GPU".parse::<DeviceType>().unwrap(), DeviceType::Cuda);
        assert_eq!("mps".parse::<DeviceType>().unwrap(), DeviceType::Metal);
        assert!("tpu".parse::<DeviceType>().is_err());
    }

    #[test]
    fn test_metrics_config_default_disabled() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.port, 9090);
    }
}
