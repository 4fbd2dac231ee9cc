// src/lib.rs

pub mod core;

pub mod engine;
pub mod graph;
pub mod module;
pub mod utils;

// Re-exports for a clean API from outside the crate
pub use crate::core::config::{ParserConfig, RuntimeConfig};
pub use crate::core::pool::{BufferPool, PoolError};
pub use crate::core::tensor::{DType, NodeId, Shape, Tensor};
pub use engine::kernels::{add, dispatch, multiply, sub};
pub use engine::{EngineError, Executor, OpKind};
pub use graph::{parse, parse_with, NodeEntry, ParseError, ParsedGraph, Subgraph};
pub use module::{FactoryRegistry, GraphModule, ModuleError, RuntimeModule, SubgraphFn};
