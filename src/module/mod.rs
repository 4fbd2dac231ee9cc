//! Host-facing wrapper around a parsed graph and its executor.

pub mod registry;

use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::core::config::{ConfigError, ParserConfig};
use crate::core::tensor::Tensor;
use crate::engine::{EngineError, Executor};
use crate::graph::{self, ParseError, ParsedGraph};

pub use registry::{FactoryRegistry, LOAD_BINARY_FACTORY, LOAD_FILE_FACTORY, MODULE_CREATE_FACTORY};

pub const TYPE_KEY: &str = "examplejson";

#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Corrupt module binary: {0}")]
    Corrupt(String),

    #[error("Unknown factory: {0}")]
    UnknownFactory(String),
}

/// Capabilities a runtime module exposes to its host.
pub trait RuntimeModule: Sized {
    fn type_key(&self) -> &'static str;

    fn create_from_text(text: &str) -> Result<Self, ModuleError>;

    /// Reads the file line by line, normalising every line ending to `\n`.
    fn create_from_path(path: impl AsRef<Path>) -> Result<Self, ModuleError> {
        Self::create_from_text(&read_lines(path.as_ref())?)
    }

    /// Fails immediately for an unknown subgraph.
    fn get_callable(&mut self, subgraph: &str) -> Result<SubgraphFn<'_>, ModuleError>;

    fn serialize(&self) -> Vec<u8>;

    fn deserialize(bytes: &[u8]) -> Result<Self, ModuleError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ModuleError::Corrupt(format!("graph text is not UTF-8: {}", e)))?;
        Self::create_from_text(text)
    }
}

fn read_lines(path: &Path) -> std::io::Result<String> {
    let raw = std::fs::read_to_string(path)?;
    let mut text = String::with_capacity(raw.len() + 1);
    for line in raw.lines() {
        text.push_str(line);
        text.push('\n');
    }
    Ok(text)
}

/// A parsed graph description plus the text it came from. The text is the
/// persisted form.
#[derive(Debug)]
pub struct GraphModule {
    source: String,
    executor: Executor,
}

impl GraphModule {
    /// Fails with `ModuleError::Config` before parsing if `config` is invalid.
    pub fn create_from_text_with(text: &str, config: &ParserConfig) -> Result<Self, ModuleError> {
        config.validate()?;
        let parsed = graph::parse_with(text, config)?;
        info!(
            subgraphs = parsed.subgraphs.len(),
            slots = parsed.pool.len(),
            "created graph module"
        );
        Ok(Self {
            source: text.to_string(),
            executor: Executor::new(parsed),
        })
    }

    /// `create_from_path` with an explicit parser config.
    pub fn create_from_path_with(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Self, ModuleError> {
        Self::create_from_text_with(&read_lines(path.as_ref())?, config)
    }

    /// Original graph text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn graph(&self) -> &ParsedGraph {
        self.executor.graph()
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn run(&mut self, subgraph: &str, inputs: &[&Tensor], output: &mut Tensor) -> Result<(), ModuleError> {
        self.executor.run(subgraph, inputs, output)?;
        Ok(())
    }

    /// Highest-indexed pool slot, as left by the most recent run.
    pub fn last_slot(&self) -> Option<&Tensor> {
        self.executor.pool().last()
    }

    /// Writes the source as a stream string: u64 LE byte length, then bytes.
    pub fn save_to_binary<W: Write>(&self, mut writer: W) -> Result<(), ModuleError> {
        let bytes = self.source.as_bytes();
        writer.write_all(&(bytes.len() as u64).to_le_bytes())?;
        writer.write_all(bytes)?;
        info!(bytes = bytes.len(), "saved graph module");
        Ok(())
    }

    pub fn load_from_binary<R: Read>(mut reader: R) -> Result<Self, ModuleError> {
        let mut len_buf = [0u8; 8];
        reader
            .read_exact(&mut len_buf)
            .map_err(|e| ModuleError::Corrupt(format!("missing length prefix: {}", e)))?;
        let len = u64::from_le_bytes(len_buf);

        let mut bytes = Vec::new();
        reader.take(len).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != len {
            return Err(ModuleError::Corrupt(format!(
                "expected {} bytes of graph text, found {}",
                len,
                bytes.len()
            )));
        }
        info!(bytes = bytes.len(), "loading graph module");
        Self::deserialize(&bytes)
    }
}

impl RuntimeModule for GraphModule {
    fn type_key(&self) -> &'static str {
        TYPE_KEY
    }

    fn create_from_text(text: &str) -> Result<Self, ModuleError> {
        Self::create_from_text_with(text, &ParserConfig::default())
    }

    fn get_callable(&mut self, subgraph: &str) -> Result<SubgraphFn<'_>, ModuleError> {
        self.executor.subgraph(subgraph)?;
        Ok(SubgraphFn {
            executor: &mut self.executor,
            name: subgraph.to_string(),
        })
    }

    fn serialize(&self) -> Vec<u8> {
        self.source.as_bytes().to_vec()
    }
}

/// A subgraph bound to its executor. Holding it borrows the module mutably.
#[derive(Debug)]
pub struct SubgraphFn<'m> {
    executor: &'m mut Executor,
    name: String,
}

impl SubgraphFn<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&mut self, inputs: &[&Tensor], output: &mut Tensor) -> Result<(), ModuleError> {
        self.executor.run(&self.name, inputs, output)?;
        Ok(())
    }

    /// Highest-indexed pool slot after the last call.
    pub fn last_slot(&self) -> Option<&Tensor> {
        self.executor.pool().last()
    }
}
