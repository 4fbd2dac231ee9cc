pub mod error;
pub mod executor;
pub mod kernels;
pub mod operations;

pub use error::EngineError;
pub use executor::Executor;
pub use kernels::dispatch;
pub use operations::OpKind;
