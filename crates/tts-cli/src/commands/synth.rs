//! Synthesis command implementation.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Args;
use clap::builder::PossibleValuesParser;
use tracing::info;

use runtime::{TtsMetrics, TtsPipeline, read_manifest};
use tts_core::{
    AM_CHOICES, BackendKind, DeviceType, FailurePolicy, Lang, SpeakerId, SynthesisConfig,
    VOC_CHOICES, WavFormat,
};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum BackendArg {
    Onnx,
    Mock,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum WavFormatArg {
    Float32,
    Pcm16,
}

/// Options of `tts synth`. Flags override the JSON config file.
#[derive(Debug, Args)]
pub struct SynthArgs {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Acoustic model
    #[arg(long, value_parser = PossibleValuesParser::new(AM_CHOICES))]
    pub am: Option<String>,

    /// Vocoder
    #[arg(long, value_parser = PossibleValuesParser::new(VOC_CHOICES))]
    pub voc: Option<String>,

    /// Frontend language (zh or en)
    #[arg(long)]
    pub lang: Option<Lang>,

    /// Phone vocabulary file
    #[arg(long)]
    pub phones_dict: Option<PathBuf>,

    /// Tone vocabulary file
    #[arg(long)]
    pub tones_dict: Option<PathBuf>,

    /// Speaker id map file
    #[arg(long)]
    pub speaker_dict: Option<PathBuf>,

    /// Pronunciation lexicon
    #[arg(long)]
    pub lexicon: Option<PathBuf>,

    /// Speaker id for multi-speaker models
    #[arg(long)]
    pub spk_id: Option<SpeakerId>,

    /// Manifest of `utt_id sentence` lines
    #[arg(long)]
    pub text: Option<PathBuf>,

    /// Directory with exported `<model>.onnx` files
    #[arg(long)]
    pub inference_dir: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Inference backend
    #[arg(long)]
    pub backend: Option<BackendArg>,

    /// Compute device (auto, cpu, cuda, metal)
    #[arg(long)]
    pub device: Option<DeviceType>,

    /// Output sample encoding
    #[arg(long)]
    pub wav_format: Option<WavFormatArg>,

    /// Log failing utterances and continue with the next one
    #[arg(long)]
    pub keep_going: bool,

    /// Serve Prometheus metrics on this port
    #[arg(long)]
    pub metrics_port: Option<u16>,
}

/// Layer command-line flags over the config file (or defaults) and validate.
pub fn resolve_config(args: &SynthArgs) -> Result<SynthesisConfig> {
    let mut config = match &args.config {
        Some(path) => SynthesisConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SynthesisConfig::default(),
    };

    if let Some(am) = &args.am {
        config.am = am.clone();
    }
    if let Some(voc) = &args.voc {
        config.voc = voc.clone();
    }
    if let Some(lang) = args.lang {
        config.lang = lang;
    }
    if let Some(path) = &args.phones_dict {
        config.phones_dict = Some(path.clone());
    }
    if let Some(path) = &args.tones_dict {
        config.tones_dict = Some(path.clone());
    }
    if let Some(path) = &args.speaker_dict {
        config.speaker_dict = Some(path.clone());
    }
    if let Some(path) = &args.lexicon {
        config.lexicon = Some(path.clone());
    }
    if let Some(spk_id) = args.spk_id {
        config.spk_id = spk_id;
    }
    if let Some(path) = &args.text {
        config.text = Some(path.clone());
    }
    if let Some(dir) = &args.inference_dir {
        config.inference_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(backend) = args.backend {
        config.backend = match backend {
            BackendArg::Onnx => BackendKind::Onnx,
            BackendArg::Mock => BackendKind::Mock,
        };
    }
    if let Some(device) = args.device {
        config.device.device_type = device;
    }
    if let Some(format) = args.wav_format {
        config.wav_format = match format {
            WavFormatArg::Float32 => WavFormat::Float32,
            WavFormatArg::Pcm16 => WavFormat::Pcm16,
        };
    }
    if args.keep_going {
        config.failure_policy = FailurePolicy::Continue;
    }
    if let Some(port) = args.metrics_port {
        config.metrics.enabled = true;
        config.metrics.port = port;
    }

    config.validate()?;
    Ok(config)
}

/// Run the synthesis command.
pub fn run(config: SynthesisConfig) -> Result<()> {
    let start = Instant::now();

    let Some(manifest) = &config.text else {
        bail!("no manifest given, use --text");
    };
    let utterances = read_manifest(manifest, config.lang)?;
    if utterances.is_empty() {
        bail!("manifest {} has no utterances", manifest.display());
    }

    let metrics = if config.metrics.enabled {
        TtsMetrics::init(config.metrics.port)?
    } else {
        TtsMetrics::init_noop()
    };

    let runtime = inference_backend::create_runtime(config.backend, &config.device)?;
    let mut pipeline = TtsPipeline::from_config(&config, runtime.as_ref())?.with_metrics(metrics);

    info!(
        utterances = utterances.len(),
        am = %config.am,
        voc = %config.voc,
        lang = %config.lang,
        output = %config.output_dir.display(),
        "Starting synthesis"
    );
    let summary = pipeline.run(&utterances)?;
    let total_duration = start.elapsed();

    // Print summary
    println!("Synthesis complete!");
    println!();
    println!("Models:    {} + {}", config.am, config.voc);
    println!("Variant:   {}", pipeline.variant());
    println!("Language:  {}", config.lang);
    println!("Output:    {}", config.output_dir.display());
    println!();
    println!("Utterances:");
    println!("  Written:     {}", summary.written.len());
    println!("  Failed:      {}", summary.failed.len());
    println!("  Audio:       {:.2} sec", summary.audio_seconds());
    println!();
    println!("Performance:");
    println!("  Synthesis:   {} ms", summary.elapsed.as_millis());
    println!("  Total:       {} ms", total_duration.as_millis());
    println!("  RTF:         {:.3}x", summary.rtf());

    if !summary.is_success() {
        println!();
        println!("Failures:");
        for failed in &summary.failed {
            println!("  {}: {}", failed.id, failed.error.root());
        }
        bail!(
            "{} of {} utterances failed",
            summary.failed.len(),
            utterances.len()
        );
    }

    Ok(())
}
