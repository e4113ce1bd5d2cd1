//! ONNX session tests on small in-memory graphs.

use candle_core::Device;
use candle_onnx::onnx::{
    GraphProto, ModelProto, NodeProto, TensorShapeProto, TypeProto, ValueInfoProto,
    tensor_proto::DataType, tensor_shape_proto::Dimension, tensor_shape_proto::dimension,
    type_proto,
};
use inference_backend::OnnxSession;
use tts_core::{ElementType, InferenceSession, InferenceTensor, TtsError};

fn value_info(name: &str, elem_type: DataType, dims: &[Option<i64>]) -> ValueInfoProto {
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
                elem_type: elem_type as i32,
                shape: Some(TensorShapeProto { dim }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// `wav = Identity(logmel)` with a `[?, 80]` float input.
fn identity_vocoder() -> ModelProto {
    ModelProto {
        graph: Some(GraphProto {
            node: vec![NodeProto {
                op_type: "Identity".to_string(),
                input: vec!["logmel".to_string()],
                output: vec!["wav".to_string()],
                ..Default::default()
            }],
            input: vec![value_info("logmel", DataType::Float, &[None, Some(80)])],
            output: vec![value_info("wav", DataType::Float, &[None, Some(80)])],
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[test]
fn test_declared_slots() {
    let session = OnnxSession::new(identity_vocoder(), Device::Cpu).expect("valid graph");

    let slots = session.input_slots();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].name, "logmel");
    assert_eq!(slots[0].element_type, Some(ElementType::F32));
    assert_eq!(slots[0].describe_dims(), "[?, 80]");
    assert_eq!(session.output_names(), &["wav".to_string()]);
}

#[test]
fn test_bind_run_read() {
    let mut session = OnnxSession::new(identity_vocoder(), Device::Cpu).expect("valid graph");
    let mel = InferenceTensor::from_f32(vec![2, 80], (0..160).map(|i| i as f32).collect())
        .expect("valid tensor");

    session.bind("logmel", mel.clone()).expect("bind");
    session.run().expect("run");
    let out = session.read("wav").expect("read");

    assert_eq!(out, mel);
}

#[test]
fn test_bind_rejects_wrong_shape() {
    let mut session = OnnxSession::new(identity_vocoder(), Device::Cpu).expect("valid graph");
    let mel = InferenceTensor::from_f32(vec![2, 40], vec![0.0; 80]).expect("valid tensor");

    let err = session.bind("logmel", mel).unwrap_err();
    assert!(matches!(err, TtsError::BindingShape { .. }));
}

#[test]
fn test_run_requires_all_inputs() {
    let mut session = OnnxSession::new(identity_vocoder(), Device::Cpu).expect("valid graph");
    let err = session.run().unwrap_err();
    assert!(err.to_string().contains("logmel"));
}

#[test]
fn test_read_before_run() {
    let mut session = OnnxSession::new(identity_vocoder(), Device::Cpu).expect("valid graph");
    assert!(matches!(session.read("wav"), Err(TtsError::Runtime(_))));
}
