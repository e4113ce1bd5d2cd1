//! # audio-output
//!
//! Mono WAV persistence for synthesized utterances.
//!
//! `float32` files keep the vocoder output as produced (no clipping); `pcm16`
//! files are clamped to [-1, 1] before quantization.

use std::io;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::debug;
use tts_core::{AudioChunk, TtsError, TtsResult, WavFormat};

/// Create `dir` and its parents if absent.
pub fn ensure_dir(dir: impl AsRef<Path>) -> TtsResult<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| TtsError::persistence(dir, e))
}

/// Write an audio chunk to a WAV file.
pub fn write_chunk(path: impl AsRef<Path>, chunk: &AudioChunk, format: WavFormat) -> TtsResult<()> {
    write_wav(path, &chunk.pcm, chunk.sample_rate, format)
}

/// Write mono samples to a WAV file.
pub fn write_wav(
    path: impl AsRef<Path>,
    samples: &[f32],
    sample_rate: u32,
    format: WavFormat,
) -> TtsResult<()> {
    let path = path.as_ref();
    let to_err = |e: hound::Error| persistence_error(path, e);

    let mut writer = WavWriter::create(path, spec(sample_rate, format)).map_err(to_err)?;
    match format {
        WavFormat::Float32 => {
            for &sample in samples {
                writer.write_sample(sample).map_err(to_err)?;
            }
        }
        WavFormat::Pcm16 => {
            for &sample in samples {
                let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer.write_sample(sample_i16).map_err(to_err)?;
            }
        }
    }
    writer.finalize().map_err(to_err)?;

    debug!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate,
        "wav written"
    );
    Ok(())
}

fn spec(sample_rate: u32, format: WavFormat) -> WavSpec {
    let (bits_per_sample, sample_format) = match format {
        WavFormat::Float32 => (32, SampleFormat::Float),
        WavFormat::Pcm16 => (16, SampleFormat::Int),
    };
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample,
        sample_format,
    }
}

fn persistence_error(path: &Path, e: hound::Error) -> TtsError {
    let source = match e {
        hound::Error::IoError(io_err) => io_err,
        other => io::Error::other(other.to_string()),
    };
    TtsError::persistence(path, source)
}
