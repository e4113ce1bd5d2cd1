//! ONNX sessions executed with `candle-onnx`.

use std::collections::HashMap;

use candle_core::{DType, Device, Tensor};
use candle_onnx::onnx::{self, ModelProto, ValueInfoProto};
use tracing::{debug, info, instrument};

use tts_core::{
    ElementType, InferenceRuntime, InferenceSession, InferenceTensor, ModelArtifacts, SlotSpec,
    TensorData, TtsError, TtsResult,
};

use crate::device::device_name;

/// Loads `.onnx` graphs onto one candle device.
#[derive(Debug, Clone)]
pub struct OnnxRuntime {
    device: Device,
}

impl OnnxRuntime {
    /// Create a runtime executing on `device`.
    pub fn new(device: Device) -> Self {
        Self { device }
    }
}

impl InferenceRuntime for OnnxRuntime {
    fn name(&self) -> &str {
        "onnx"
    }

    #[instrument(skip(self, artifacts), fields(model = %artifacts.id))]
    fn load(&self, artifacts: &ModelArtifacts) -> TtsResult<Box<dyn InferenceSession>> {
        let path = &artifacts.model_path;
        if !path.exists() {
            return Err(TtsError::model_load(path, "file not found"));
        }

        let model = candle_onnx::read_file(path)
            .map_err(|e| TtsError::model_load(path, e.to_string()))?;
        let session = OnnxSession::new(model, self.device.clone())
            .map_err(|e| TtsError::model_load(path, e.to_string()))?;

        info!(
            path = %path.display(),
            device = device_name(&self.device),
            inputs = session.inputs.len(),
            outputs = session.outputs.len(),
            "ONNX model loaded"
        );
        Ok(Box::new(session))
    }
}

/// One loaded graph plus its pending bindings and last outputs.
pub struct OnnxSession {
    model: ModelProto,
    device: Device,
    inputs: Vec<SlotSpec>,
    outputs: Vec<String>,
    bindings: HashMap<String, Tensor>,
    results: HashMap<String, Tensor>,
}

impl OnnxSession {
    /// Wrap a parsed model, reading its declared inputs and outputs.
    pub fn new(model: ModelProto, device: Device) -> TtsResult<Self> {
        let graph = model
            .graph
            .as_ref()
            .ok_or_else(|| TtsError::runtime("model has no graph"))?;

        // Initializers may also be listed as graph inputs
        let initializers: Vec<&str> = graph.initializer.iter().map(|t| t.name.as_str()).collect();
        let inputs: Vec<SlotSpec> = graph
            .input
            .iter()
            .filter(|vi| !initializers.contains(&vi.name.as_str()))
            .map(slot_spec)
            .collect();
        let outputs: Vec<String> = graph.output.iter().map(|vi| vi.name.clone()).collect();

        if inputs.is_empty() || outputs.is_empty() {
            return Err(TtsError::runtime(format!(
                "graph declares {} inputs and {} outputs",
                inputs.len(),
                outputs.len()
            )));
        }

        Ok(Self {
            model,
            device,
            inputs,
            outputs,
            bindings: HashMap::new(),
            results: HashMap::new(),
        })
    }
}

impl InferenceSession for OnnxSession {
    fn input_slots(&self) -> &[SlotSpec] {
        &self.inputs
    }

    fn output_names(&self) -> &[String] {
        &self.outputs
    }

    fn bind(&mut self, slot: &str, tensor: InferenceTensor) -> TtsResult<()> {
        let Some(spec) = self.inputs.iter().find(|s| s.name == slot) else {
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
        let tensor = to_candle(tensor, &self.device)?;
        self.bindings.insert(slot.to_string(), tensor);
        Ok(())
    }

    #[instrument(skip(self))]
    fn run(&mut self) -> TtsResult<()> {
        if let Some(missing) = self
            .inputs
            .iter()
            .find(|s| !self.bindings.contains_key(&s.name))
        {
            return Err(TtsError::runtime(format!(
                "input slot '{}' is not bound",
                missing.name
            )));
        }

        // Bindings are consumed so nothing leaks into the next run
        let inputs = std::mem::take(&mut self.bindings);
        self.results = candle_onnx::simple_eval(&self.model, inputs)
            .map_err(|e| TtsError::runtime(e.to_string()))?;
        debug!(outputs = self.results.len(), "graph evaluated");
        Ok(())
    }

    fn read(&mut self, slot: &str) -> TtsResult<InferenceTensor> {
        let tensor = self.results.remove(slot).ok_or_else(|| {
            TtsError::runtime(format!("output '{slot}' not available, run the model first"))
        })?;
        from_candle(&tensor)
    }
}

/// Declared slot from graph value info.
fn slot_spec(info: &ValueInfoProto) -> SlotSpec {
    use onnx::tensor_shape_proto::dimension::Value as Dim;
    use onnx::type_proto::Value;

    let Some(Value::TensorType(tensor_type)) = info.r#type.as_ref().and_then(|t| t.value.as_ref())
    else {
        return SlotSpec::any(&info.name);
    };

    let element_type = if tensor_type.elem_type == onnx::tensor_proto::DataType::Float as i32 {
        Some(ElementType::F32)
    } else if tensor_type.elem_type == onnx::tensor_proto::DataType::Int64 as i32 {
        Some(ElementType::I64)
    } else {
        None
    };

    let dims = tensor_type.shape.as_ref().map(|shape| {
        shape
            .dim
            .iter()
            .map(|d| match d.value {
                Some(Dim::DimValue(n)) if n > 0 => Some(n as usize),
                _ => None,
            })
            .collect()
    });

    SlotSpec {
        name: info.name.clone(),
        element_type,
        dims,
    }
}

/// Convert a hand-off tensor into a candle tensor on `device`.
pub fn to_candle(tensor: InferenceTensor, device: &Device) -> TtsResult<Tensor> {
    let (shape, data) = tensor.into_parts();
    let result = match data {
        TensorData::F32(values) => Tensor::from_vec(values, shape, device),
        TensorData::I64(values) => Tensor::from_vec(values, shape, device),
    };
    result.map_err(|e| TtsError::runtime(format!("tensor conversion failed: {e}")))
}

/// Convert a candle tensor back into a hand-off tensor.
///
/// Element types other than i64 are read as f32.
pub fn from_candle(tensor: &Tensor) -> TtsResult<InferenceTensor> {
    let shape = tensor.dims().to_vec();
    let convert = |e: candle_core::Error| TtsError::runtime(format!("tensor conversion failed: {e}"));

    let flat = tensor.flatten_all().map_err(convert)?;
    let data = match flat.dtype() {
        DType::I64 => TensorData::I64(flat.to_vec1::<i64>().map_err(convert)?),
        DType::F32 => TensorData::F32(flat.to_vec1::<f32>().map_err(convert)?),
        _ => TensorData::F32(
            flat.to_dtype(DType::F32)
                .and_then(|t| t.to_vec1::<f32>())
                .map_err(convert)?,
        ),
    };
    InferenceTensor::new(shape, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use onnx::tensor_shape_proto::{Dimension, dimension};
    use onnx::{TensorShapeProto, TypeProto, type_proto};

    fn value_info(name: &str, elem_type: i32, dims: &[Option<i64>]) -> ValueInfoProto {
        let dim = dims
            .iter()
            .map(|d| Dimension {
                value: Some(match d {
                    Some(n) => dimension::Value::DimValue(*n),
                    None => dimension::Value::DimParam("T".to_string()),
                }),
                ..Default::default()
            })
            .collect();
        ValueInfoProto {
            name: name.to_string(),
            r#type: Some(TypeProto {
                value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                    elem_type,
                    shape: Some(TensorShapeProto { dim }),
                })),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_slot_spec_from_value_info() {
        let info = value_info(
            "logmel",
            onnx::tensor_proto::DataType::Float as i32,
            &[None, Some(80)],
        );
        let spec = slot_spec(&info);
        assert_eq!(spec.name, "logmel");
        assert_eq!(spec.element_type, Some(ElementType::F32));
        assert_eq!(spec.dims, Some(vec![None, Some(80)]));

        let info = value_info("phone_ids", onnx::tensor_proto::DataType::Int64 as i32, &[None]);
        assert_eq!(slot_spec(&info).element_type, Some(ElementType::I64));
    }

    #[test]
    fn test_slot_spec_without_type_is_any() {
        let info = ValueInfoProto {
            name: "x".to_string(),
            ..Default::default()
        };
        assert_eq!(slot_spec(&info), SlotSpec::any("x"));
    }

    #[test]
    fn test_candle_conversion_keeps_shape_and_values() {
        let original = InferenceTensor::from_f32(vec![2, 3], vec![0.5; 6]).unwrap();
        let tensor = to_candle(original.clone(), &Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[2, 3]);
        assert_eq!(from_candle(&tensor).unwrap(), original);

        let ids = InferenceTensor::from_ids(vec![3, 1, 4]);
        let tensor = to_candle(ids.clone(), &Device::Cpu).unwrap();
        assert_eq!(tensor.dtype(), DType::I64);
        assert_eq!(from_candle(&tensor).unwrap(), ids);
    }

    #[test]
    fn test_other_dtypes_read_as_f32() {
        let tensor = Tensor::new(&[1u32, 2, 3], &Device::Cpu).unwrap();
        let converted = from_candle(&tensor).unwrap();
        assert_eq!(converted.element_type(), ElementType::F32);
        assert_eq!(converted.into_f32_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_session_requires_graph() {
        let result = OnnxSession::new(ModelProto::default(), Device::Cpu);
        assert!(matches!(result, Err(TtsError::Runtime(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let runtime = OnnxRuntime::new(Device::Cpu);
        let artifacts = ModelArtifacts::in_dir("/nonexistent", "fastspeech2_csmsc");
        let err = runtime.load(&artifacts).err().unwrap();
        assert!(matches!(err, TtsError::ModelLoad { .. }));
    }
}
