// src/core/tensor.rs
use serde::{Deserialize, Serialize};

/// Node identifier (newtype so it is never confused with other integers).
/// Doubles as the index of the node's slot in the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Element type of pooled tensors. Only 32-bit floats are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DType {
    #[default]
    Float32,
}

/// Shape of a tensor.
/// []        -> scalar (rank 0, one element)
/// [3]       -> vector (rank 1)
/// [2, 3]    -> 2x3 matrix (rank 2)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape {
    pub dims: Vec<usize>,
}

impl Shape {
    pub fn new<D: Into<Vec<usize>>>(dims: D) -> Self {
        Self { dims: dims.into() }
    }

    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total element count; the empty product makes a scalar hold one element.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Element count, or `None` if the product of the dims overflows `usize`.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

/// Dense row-major f32 tensor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Shape,
    pub data: Vec<f32>,
}

impl Tensor {
    /// Builds a tensor, checking that `data.len()` matches `shape.num_elements()`
    pub fn new(shape: Shape, data: Vec<f32>) -> Result<Self, String> {
        let expected = shape
            .checked_num_elements()
            .ok_or_else(|| format!("Shape {} has too many elements", shape))?;
        if data.len() != expected {
            return Err(format!(
                "Data length {} does not match shape {} (expected {})",
                data.len(),
                shape,
                expected
            ));
        }
        Ok(Self { shape, data })
    }

    pub fn zeros(shape: Shape) -> Self {
        Self::filled(shape, 0.0)
    }

    pub fn filled(shape: Shape, value: f32) -> Self {
        let len = shape.num_elements();
        Self {
            shape,
            data: vec![value; len],
        }
    }

    pub fn dtype(&self) -> DType {
        DType::Float32
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Overwrites the contents with `other`'s. Shapes must agree exactly;
    /// the receiver's shape never changes.
    pub fn copy_from(&mut self, other: &Tensor) -> Result<(), String> {
        if self.shape != other.shape {
            return Err(format!(
                "cannot copy tensor of shape {} into shape {}",
                other.shape, self.shape
            ));
        }
        if self.data.len() != other.data.len() {
            return Err(format!(
                "data length {} does not match shape {} (expected {})",
                other.data.len(),
                other.shape,
                self.data.len()
            ));
        }
        self.data.copy_from_slice(&other.data);
        Ok(())
    }
}
