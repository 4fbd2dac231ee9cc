pub mod config;
pub mod pool;
pub mod tensor;

// Re-export commonly used types
pub use config::{ConfigError, ParserConfig, RuntimeConfig};
pub use pool::{BufferPool, PoolError};
pub use tensor::{DType, NodeId, Shape, Tensor};
