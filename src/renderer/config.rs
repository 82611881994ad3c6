//! Configuration for rendering and serialization
//!
//! Both structs can be built in code with the `with_*` methods or loaded
//! from TOML:
//!
//! ```toml
//! strict_value_count = true
//! detect_documents = false
//!
//! [serialize]
//! self_close_void = true
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Options for HTML output
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerializeConfig {
    /// Write void elements as `<br/>` instead of `<br>`
    pub self_close_void: bool,
}

impl SerializeConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether void elements are self-closed
    pub fn with_self_close_void(mut self, self_close: bool) -> Self {
        self.self_close_void = self_close;
        self
    }
}

/// Options for a [`Renderer`](crate::Renderer)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub serialize: SerializeConfig,

    /// Fail an update whose value count differs from the template's holes
    ///
    /// When off, missing values render as empty and extra values are ignored.
    pub strict_value_count: bool,

    /// Parse HTML starting with a doctype or `<html>` as a full document
    pub detect_documents: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            serialize: SerializeConfig::default(),
            strict_value_count: false,
            detect_documents: true,
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the serializer options
    pub fn with_serialize(mut self, serialize: SerializeConfig) -> Self {
        self.serialize = serialize;
        self
    }

    /// Set whether value counts are checked
    pub fn with_strict_value_count(mut self, strict: bool) -> Self {
        self.strict_value_count = strict;
        self
    }

    /// Set whether documents are detected
    pub fn with_detect_documents(mut self, detect: bool) -> Self {
        self.detect_documents = detect;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
