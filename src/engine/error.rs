use thiserror::Error;

use crate::core::pool::PoolError;
use crate::core::tensor::Shape;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown subgraph: {0}")]
    UnknownSubgraph(String),

    #[error("Subgraph has no nodes: {0}")]
    EmptySubgraph(String),

    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: Shape,
        actual: Shape,
    },

    #[error("Tensor in {context} holds {len} values but has shape {shape}")]
    InvalidTensor {
        context: String,
        len: usize,
        shape: Shape,
    },

    #[error("Operator {op} expects {expected} operands, got {actual}")]
    Arity {
        op: String,
        expected: usize,
        actual: usize,
    },

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}
