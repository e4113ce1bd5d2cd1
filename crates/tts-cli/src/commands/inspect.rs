//! Inspect command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use runtime::VariantResolver;
use tts_core::{BackendKind, DeviceConfig, DeviceType, ModelArtifacts, VOC_CHOICES};

use super::synth::BackendArg;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Model identifier, e.g. fastspeech2_aishell3
    #[arg(long)]
    pub model: String,

    /// Directory with exported `<model>.onnx` files
    #[arg(long, default_value = "inference")]
    pub inference_dir: PathBuf,

    /// Inference backend
    #[arg(long, default_value = "onnx")]
    pub backend: BackendArg,

    /// Compute device (auto, cpu, cuda, metal)
    #[arg(long, default_value = "cpu")]
    pub device: DeviceType,

    /// Resolve the variant as if a speaker id map were supplied
    #[arg(long)]
    pub speaker_dict: bool,
}

/// Run the inspect command.
pub fn run(args: &InspectArgs) -> Result<()> {
    let backend = match args.backend {
        BackendArg::Onnx => BackendKind::Onnx,
        BackendArg::Mock => BackendKind::Mock,
    };
    let device = DeviceConfig {
        device_type: args.device,
        gpu_index: None,
    };
    let runtime = inference_backend::create_runtime(backend, &device)?;

    let artifacts = ModelArtifacts::in_dir(&args.inference_dir, &args.model);
    let session = runtime
        .load(&artifacts)
        .with_context(|| format!("loading {}", artifacts.model_path.display()))?;

    println!("Model:   {}", args.model);
    println!("Path:    {}", artifacts.model_path.display());
    println!("Backend: {}", runtime.name());
    println!();
    println!("Inputs:");
    for (i, slot) in session.input_slots().iter().enumerate() {
        let element_type = slot
            .element_type
            .map_or_else(|| "any".to_string(), |t| t.to_string());
        println!(
            "  #{i} {:<12} {element_type} {}",
            slot.name,
            slot.describe_dims()
        );
    }
    println!("Outputs:");
    for (i, name) in session.output_names().iter().enumerate() {
        println!("  #{i} {name}");
    }

    if !VOC_CHOICES.contains(&args.model.as_str()) {
        let variant = VariantResolver::new(args.speaker_dict)
            .resolve(&args.model, session.input_slots().len() > 1);
        println!();
        println!("Variant: {variant}");
        for aux in variant.aux_bindings() {
            println!("  {} -> input #{}", aux.input, aux.slot_index);
        }
    }

    Ok(())
}
