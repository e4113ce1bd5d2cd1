//! # inference-backend
//!
//! Inference sessions with named input and output slots.
//!
//! - [`OnnxRuntime`]: exported `.onnx` graphs evaluated with `candle-onnx`
//! - [`MockRuntime`]: deterministic sessions for tests and `--backend mock`
//! - Device selection with Metal/CUDA fallback to CPU

pub mod device;
pub mod mock;
pub mod onnx;

pub use device::{compiled_gpu_features, device_name, select_device};
pub use mock::{MockRuntime, MockSession, RecordedBinding};
pub use onnx::{OnnxRuntime, OnnxSession};

use tts_core::{BackendKind, DeviceConfig, InferenceRuntime, TtsResult};

/// Build the runtime selected by configuration.
pub fn create_runtime(
    backend: BackendKind,
    device: &DeviceConfig,
) -> TtsResult<Box<dyn InferenceRuntime>> {
    Ok(match backend {
        BackendKind::Onnx => Box::new(OnnxRuntime::new(select_device(device)?)),
        BackendKind::Mock => Box::new(MockRuntime::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_runtime() {
        let runtime = create_runtime(BackendKind::Mock, &DeviceConfig::default()).unwrap();
        assert_eq!(runtime.name(), "mock");
    }

    #[test]
    fn test_create_onnx_runtime_on_cpu() {
        let device = DeviceConfig {
            device_type: tts_core::DeviceType::Cpu,
            gpu_index: None,
        };
        let runtime = create_runtime(BackendKind::Onnx, &device).unwrap();
        assert_eq!(runtime.name(), "onnx");
    }
}
