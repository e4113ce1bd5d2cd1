//! Binding tensors to declared input slots by index.

use tracing::debug;
use tts_core::{InferenceSession, InferenceTensor, SlotSpec, TtsError, TtsResult};

/// A tensor destined for the input slot at `slot_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotBinding {
    pub slot_index: usize,
    pub tensor: InferenceTensor,
}

impl SlotBinding {
    pub fn new(slot_index: usize, tensor: InferenceTensor) -> Self {
        Self { slot_index, tensor }
    }
}

/// How a tensor may be shaped to fit its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shaping {
    /// Bind with the tensor's own shape.
    Exact,
    /// Also allow a leading batch dimension of one when the slot declares one
    /// more dim than the tensor has and that dim is dynamic or 1.
    BatchOfOne,
}

/// Shape `tensor` for `spec`, or fail with a binding shape error.
pub fn conform(spec: &SlotSpec, tensor: InferenceTensor, shaping: Shaping) -> TtsResult<InferenceTensor> {
    if let Some(expected) = spec.element_type
        && expected != tensor.element_type()
    {
        return Err(TtsError::binding_shape(
            &spec.name,
            format!("{expected} {}", spec.describe_dims()),
            tensor.shape(),
        ));
    }

    if spec.accepts(tensor.shape()) {
        return Ok(tensor);
    }

    if shaping == Shaping::BatchOfOne
        && let Some(dims) = &spec.dims
        && dims.len() == tensor.rank() + 1
        && matches!(dims[0], None | Some(1))
    {
        let mut shape = Vec::with_capacity(dims.len());
        shape.push(1);
        shape.extend_from_slice(tensor.shape());
        if spec.accepts(&shape) {
            return tensor.reshape(shape);
        }
    }

    Err(TtsError::binding_shape(
        &spec.name,
        spec.describe_dims(),
        tensor.shape(),
    ))
}

/// Bind each tensor to the slot its index names.
pub fn bind_slots(
    session: &mut dyn InferenceSession,
    bindings: Vec<SlotBinding>,
    shaping: Shaping,
) -> TtsResult<()> {
    for SlotBinding { slot_index, tensor } in bindings {
        let slots = session.input_slots();
        let Some(spec) = slots.get(slot_index) else {
            return Err(TtsError::binding_shape(
                format!("#{slot_index}"),
                format!("one of {} declared input slots", slots.len()),
                tensor.shape(),
            ));
        };
        let name = spec.name.clone();
        let tensor = conform(spec, tensor, shaping)?;
        debug!(slot = %name, slot_index, shape = ?tensor.shape(), "binding");
        session.bind(&name, tensor)?;
    }
    Ok(())
}

/// Read output slot 0.
pub fn read_primary_output(session: &mut dyn InferenceSession) -> TtsResult<InferenceTensor> {
    let name = session
        .output_names()
        .first()
        .cloned()
        .ok_or_else(|| TtsError::runtime("model declares no outputs"))?;
    session.read(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tts_core::ElementType;

    fn ids(n: usize) -> InferenceTensor {
        InferenceTensor::from_ids((0..n as i64).collect())
    }

    #[test]
    fn test_rank_one_slot_keeps_shape() {
        let spec = SlotSpec::new("phone_ids", ElementType::I64, vec![None]);
        let tensor = conform(&spec, ids(5), Shaping::BatchOfOne).unwrap();
        assert_eq!(tensor.shape(), &[5]);
    }

    #[test]
    fn test_rank_two_slot_gets_batch_dim() {
        let dynamic = SlotSpec::new("text", ElementType::I64, vec![None, None]);
        assert_eq!(
            conform(&dynamic, ids(5), Shaping::BatchOfOne).unwrap().shape(),
            &[1, 5]
        );

        let unit = SlotSpec::new("text", ElementType::I64, vec![Some(1), None]);
        assert_eq!(
            conform(&unit, ids(3), Shaping::BatchOfOne).unwrap().shape(),
            &[1, 3]
        );
    }

    #[test]
    fn test_exact_shaping_never_adds_dims() {
        let spec = SlotSpec::new("text", ElementType::I64, vec![None, None]);
        let err = conform(&spec, ids(5), Shaping::Exact).unwrap_err();
        assert!(matches!(err, TtsError::BindingShape { .. }));
    }

    #[test]
    fn test_fixed_dims_mismatch() {
        let batch_of_two = SlotSpec::new("text", ElementType::I64, vec![Some(2), None]);
        assert!(conform(&batch_of_two, ids(5), Shaping::BatchOfOne).is_err());

        let speaker = SlotSpec::new("spk_id", ElementType::I64, vec![Some(1)]);
        assert!(conform(&speaker, ids(1), Shaping::BatchOfOne).is_ok());
        assert!(conform(&speaker, ids(2), Shaping::BatchOfOne).is_err());

        let rank_three = SlotSpec::new("x", ElementType::I64, vec![None, None, None]);
        assert!(conform(&rank_three, ids(4), Shaping::BatchOfOne).is_err());
    }

    #[test]
    fn test_element_type_mismatch() {
        let spec = SlotSpec::new("logmel", ElementType::F32, vec![None]);
        let err = conform(&spec, ids(3), Shaping::Exact).unwrap_err();
        assert!(err.to_string().contains("f32"));
    }

    #[test]
    fn test_unknown_rank_accepts_anything() {
        let spec = SlotSpec::any("x");
        assert_eq!(conform(&spec, ids(7), Shaping::BatchOfOne).unwrap().shape(), &[7]);
    }
}
