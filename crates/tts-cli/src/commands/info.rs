//! Info command implementation.

use tts_core::{AM_CHOICES, VOC_CHOICES};

/// Run the info command.
pub fn run() {
    println!("Two-stage TTS inference");
    println!("=======================");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));

    let gpu = inference_backend::compiled_gpu_features();
    if gpu.is_empty() {
        println!("  GPU backends: none");
    } else {
        println!("  GPU backends: {}", gpu.join(", "));
    }

    println!();
    println!("Acoustic models:");
    for am in AM_CHOICES {
        println!("  {am}");
    }
    println!("Vocoders:");
    for voc in VOC_CHOICES {
        println!("  {voc}");
    }

    println!();
    println!("Crates:");
    println!("  tts-core: Core types and traits");
    println!("  text-frontend: Text to phone/tone ids (ZH/EN)");
    println!("  inference-backend: ONNX and mock inference sessions");
    println!("  audio-output: WAV writing");
    println!("  runtime: Variant resolution and the synthesis pipeline");
    println!("  tts-cli: This CLI tool");
}
