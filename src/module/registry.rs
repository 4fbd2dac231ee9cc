//! Adapter mapping host-side global factory names to module constructors.

use std::collections::HashMap;

use super::{GraphModule, ModuleError, RuntimeModule};

pub const MODULE_CREATE_FACTORY: &str = "module.examplejson_module_create";
pub const LOAD_FILE_FACTORY: &str = "module.loadfile_examplejson";
pub const LOAD_BINARY_FACTORY: &str = "module.loadbinary_examplejson";

/// Every factory receives one opaque payload: graph text, a UTF-8 path, or a
/// saved binary stream depending on the name.
pub type Factory = fn(&[u8]) -> Result<GraphModule, ModuleError>;

fn create_from_text_bytes(payload: &[u8]) -> Result<GraphModule, ModuleError> {
    GraphModule::deserialize(payload)
}

fn load_file(payload: &[u8]) -> Result<GraphModule, ModuleError> {
    let path = std::str::from_utf8(payload)
        .map_err(|e| ModuleError::Corrupt(format!("path is not UTF-8: {}", e)))?;
    GraphModule::create_from_path(path)
}

fn load_binary(payload: &[u8]) -> Result<GraphModule, ModuleError> {
    GraphModule::load_from_binary(payload)
}

pub struct FactoryRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl FactoryRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the three graph module factories installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(MODULE_CREATE_FACTORY, create_from_text_bytes);
        registry.register(LOAD_FILE_FACTORY, load_file);
        registry.register(LOAD_BINARY_FACTORY, load_binary);
        registry
    }

    /// Returns the factory previously registered under `name`, if any.
    pub fn register(&mut self, name: &'static str, factory: Factory) -> Option<Factory> {
        self.factories.insert(name, factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    pub fn create(&self, name: &str, payload: &[u8]) -> Result<GraphModule, ModuleError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ModuleError::UnknownFactory(name.to_string()))?;
        factory(payload)
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
