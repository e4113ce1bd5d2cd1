//! Device selection for ONNX execution.
//!
//! `Auto` tries Metal (Apple Silicon), then CUDA (NVIDIA), then falls back to CPU.
//! GPU devices are only reachable when the matching cargo feature is enabled.

use candle_core::Device;
use tracing::{info, warn};

use tts_core::{DeviceConfig, DeviceType, TtsError, TtsResult};

/// Select a device according to configuration and compiled features.
///
/// # Returns
/// * `Ok(Device)` - Selected device
/// * `Err` - If an explicitly requested GPU is not available
pub fn select_device(config: &DeviceConfig) -> TtsResult<Device> {
    let index = config.gpu_index.unwrap_or(0);
    match config.device_type {
        DeviceType::Cpu => {
            info!("Using CPU device (forced)");
            Ok(Device::Cpu)
        }
        DeviceType::Metal => select_metal(index),
        DeviceType::Cuda => select_cuda(index),
        DeviceType::Auto => Ok(select_auto(index)),
    }
}

#[allow(unused_variables)]
fn select_auto(index: usize) -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(index) {
            Ok(device) => {
                info!(index, "Auto-selected Metal GPU");
                return device;
            }
            Err(e) => warn!("Metal GPU not available: {}", e),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(index) {
            Ok(device) => {
                info!(index, "Auto-selected CUDA GPU");
                return device;
            }
            Err(e) => warn!("CUDA GPU not available: {}", e),
        }
    }

    info!("Using CPU device (no GPU available)");
    Device::Cpu
}

#[allow(unused_variables)]
fn select_metal(index: usize) -> TtsResult<Device> {
    #[cfg(feature = "metal")]
    {
        Device::new_metal(index)
            .inspect(|_| info!(index, "Using Metal GPU"))
            .map_err(|e| {
                TtsError::config(format!("Metal GPU {index} requested but not available: {e}"))
            })
    }

    #[cfg(not(feature = "metal"))]
    {
        Err(TtsError::config(
            "Metal GPU requested but 'metal' feature not enabled. \
             Rebuild with: cargo build --features metal",
        ))
    }
}

#[allow(unused_variables)]
fn select_cuda(index: usize) -> TtsResult<Device> {
    #[cfg(feature = "cuda")]
    {
        Device::new_cuda(index)
            .inspect(|_| info!(index, "Using CUDA GPU"))
            .map_err(|e| {
                TtsError::config(format!("CUDA GPU {index} requested but not available: {e}"))
            })
    }

    #[cfg(not(feature = "cuda"))]
    {
        Err(TtsError::config(
            "CUDA GPU requested but 'cuda' feature not enabled. \
             Rebuild with: cargo build --features cuda",
        ))
    }
}

/// Get device name for logging/display.
pub fn device_name(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "CPU",
        Device::Cuda(_) => "CUDA GPU",
        Device::Metal(_) => "Metal GPU",
    }
}

/// Names of the GPU backends compiled into this build.
pub fn compiled_gpu_features() -> Vec<&'static str> {
    let mut features = Vec::new();
    if cfg!(feature = "metal") {
        features.push("metal");
    }
    if cfg!(feature = "cuda") {
        features.push("cuda");
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_cpu() {
        let config = DeviceConfig {
            device_type: DeviceType::Cpu,
            gpu_index: None,
        };
        let device = select_device(&config).unwrap();
        assert!(matches!(device, Device::Cpu));
    }

    #[test]
    fn test_select_auto() {
        // Falls back to CPU when no GPU is present
        let device = select_device(&DeviceConfig::default()).unwrap();
        assert!(matches!(
            device,
            Device::Cpu | Device::Metal(_) | Device::Cuda(_)
        ));
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_cuda_without_feature_is_config_error() {
        let config = DeviceConfig {
            device_type: DeviceType::Cuda,
            gpu_index: Some(0),
        };
        assert!(matches!(select_device(&config), Err(TtsError::Config(_))));
    }

    #[test]
    fn test_device_name() {
        assert_eq!(device_name(&Device::Cpu), "CPU");
    }
}
