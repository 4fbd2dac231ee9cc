pub mod error;
pub mod node;
pub mod parser;

pub use error::ParseError;
pub use node::{NodeEntry, OpTable, ParsedGraph, Subgraph};
pub use parser::{parse, parse_with};
