//! Processor registry
//!
//! The host builds processors by name. Each `create` call yields a new,
//! independent instance wired to the port the host hands over.

use super::block::AudioBlockProcessor;
use super::recorder::RecorderProcessor;
use crate::port::MessagePort;
use std::collections::HashMap;
use thiserror::Error;

/// Identifier under which the recorder is registered
pub const RECORDER_PROCESSOR_NAME: &str = "recorder-processor";

/// Builds a processor around the port supplied by the host
pub type ProcessorFactory =
    Box<dyn Fn(Box<dyn MessagePort>) -> Box<dyn AudioBlockProcessor> + Send + Sync>;

/// Registry errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Processor name must not be empty")]
    EmptyName,

    #[error("Processor already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Unknown processor: {0}")]
    UnknownProcessor(String),
}

/// Name to factory mapping
#[derive(Default)]
pub struct ProcessorRegistry {
    factories: HashMap<String, ProcessorFactory>,
}

impl ProcessorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the recorder already registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .factories
            .insert(RECORDER_PROCESSOR_NAME.to_string(), recorder_factory());
        registry
    }

    /// Register `factory` under `name`
    ///
    /// A name can only be registered once.
    pub fn register(&mut self, name: &str, factory: ProcessorFactory) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.factories.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }

        self.factories.insert(name.to_string(), factory);
        tracing::debug!("Processor registered: {}", name);
        Ok(())
    }

    /// Instantiate the processor registered under `name`
    pub fn create(
        &self,
        name: &str,
        port: Box<dyn MessagePort>,
    ) -> Result<Box<dyn AudioBlockProcessor>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownProcessor(name.to_string()))?;

        tracing::debug!("Processor instantiated: {}", name);
        Ok(factory(port))
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn recorder_factory() -> ProcessorFactory {
    Box::new(|port: Box<dyn MessagePort>| -> Box<dyn AudioBlockProcessor> {
        Box::new(RecorderProcessor::new(port))
    })
}
