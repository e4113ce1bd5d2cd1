//! Stage hand-off tensors and declared model input slots.

use serde::{Deserialize, Serialize};

use crate::error::{TtsError, TtsResult};

/// Element type of an [`InferenceTensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// 32-bit float (spectrograms, waveforms).
    F32,
    /// 64-bit signed integer (phone, tone and speaker ids).
    I64,
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementType::F32 => write!(f, "f32"),
            ElementType::I64 => write!(f, "i64"),
        }
    }
}

/// Flat, row-major tensor storage.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    I64(Vec<i64>),
}

impl TensorData {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(v) => v.len(),
            TensorData::I64(v) => v.len(),
        }
    }

    /// Check if no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the storage.
    pub fn element_type(&self) -> ElementType {
        match self {
            TensorData::F32(_) => ElementType::F32,
            TensorData::I64(_) => ElementType::I64,
        }
    }
}

/// An owned tensor exchanged between pipeline stages.
///
/// Tensors are moved at every hand-off; a stage never keeps a reference to a
/// tensor it passed on.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceTensor {
    shape: Vec<usize>,
    data: TensorData,
}

impl InferenceTensor {
    /// Create a tensor, checking that `shape` covers exactly `data`.
    pub fn new(shape: Vec<usize>, data: TensorData) -> TtsResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(TtsError::invalid_input(format!(
                "shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// A rank-1 integer tensor holding `ids`.
    pub fn from_ids(ids: Vec<i64>) -> Self {
        Self {
            shape: vec![ids.len()],
            data: TensorData::I64(ids),
        }
    }

    /// A float tensor of the given shape.
    pub fn from_f32(shape: Vec<usize>, values: Vec<f32>) -> TtsResult<Self> {
        Self::new(shape, TensorData::F32(values))
    }

    /// Tensor shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element type.
    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    /// Borrow the raw storage.
    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Split into shape and storage.
    pub fn into_parts(self) -> (Vec<usize>, TensorData) {
        (self.shape, self.data)
    }

    /// Reinterpret the same elements under a new shape.
    pub fn reshape(self, shape: Vec<usize>) -> TtsResult<Self> {
        Self::new(shape, self.data)
    }

    /// Flatten into f32 values (integers are converted).
    pub fn into_f32_vec(self) -> Vec<f32> {
        match self.data {
            TensorData::F32(v) => v,
            TensorData::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        }
    }
}

/// An input slot as declared by a loaded model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    /// Slot name used for binding.
    pub name: String,
    /// Declared element type, if the model states one.
    pub element_type: Option<ElementType>,
    /// Declared dims (`None` entries are dynamic); `None` when the rank is unknown.
    pub dims: Option<Vec<Option<usize>>>,
}

impl SlotSpec {
    /// A slot with unknown type and rank.
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_type: None,
            dims: None,
        }
    }

    /// A slot with a declared type and dims.
    pub fn new(
        name: impl Into<String>,
        element_type: ElementType,
        dims: Vec<Option<usize>>,
    ) -> Self {
        Self {
            name: name.into(),
            element_type: Some(element_type),
            dims: Some(dims),
        }
    }

    /// Declared rank, if known.
    pub fn rank(&self) -> Option<usize> {
        self.dims.as_ref().map(Vec::len)
    }

    /// Check whether a tensor of `shape` satisfies the declared dims.
    pub fn accepts(&self, shape: &[usize]) -> bool {
        let Some(dims) = &self.dims else {
            return true;
        };
        dims.len() == shape.len()
            && dims
                .iter()
                .zip(shape)
                .all(|(declared, actual)| declared.is_none_or(|d| d == *actual))
    }

    /// Human-readable form of the declared dims, e.g. `[?, 80]`.
    pub fn describe_dims(&self) -> String {
        match &self.dims {
            None => "any shape".to_string(),
            Some(dims) => {
                let parts: Vec<String> = dims
                    .iter()
                    .map(|d| d.map_or_else(|| "?".to_string(), |n| n.to_string()))
                    .collect();
                format!("[{}]", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_shape_checked() {
        assert!(InferenceTensor::from_f32(vec![2, 3], vec![0.0; 6]).is_ok());
        assert!(InferenceTensor::from_f32(vec![2, 3], vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_from_ids_is_rank_one() {
        let t = InferenceTensor::from_ids(vec![4, 5, 6]);
        assert_eq!(t.shape(), &[3]);
        assert_eq!(t.element_type(), ElementType::I64);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_reshape_keeps_elements() {
        let t = InferenceTensor::from_ids(vec![1, 2, 3, 4]);
        let t = t.reshape(vec![1, 4]).unwrap();
        assert_eq!(t.shape(), &[1, 4]);
        assert!(t.reshape(vec![3]).is_err());
    }

    #[test]
    fn test_into_f32_vec_converts_ids() {
        let t = InferenceTensor::from_ids(vec![1, -2]);
        assert_eq!(t.into_f32_vec(), vec![1.0, -2.0]);
    }

    #[test]
    fn test_slot_accepts() {
        let slot = SlotSpec::new("logmel", ElementType::F32, vec![None, Some(80)]);
        assert!(slot.accepts(&[120, 80]));
        assert!(!slot.accepts(&[120, 40]));
        assert!(!slot.accepts(&[80]));
        assert_eq!(slot.describe_dims(), "[?, 80]");

        let any = SlotSpec::any("x");
        assert!(any.accepts(&[1, 2, 3]));
        assert_eq!(any.rank(), None);
    }
}
