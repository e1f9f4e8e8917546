//! Initial document values
//!
//! A [`StoreConfig`] holds the starting value of every managed document. All
//! fields are optional in the serialized form; missing ones fall back to the
//! empty value of their shape and are default-filled by validation when the
//! store is built.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn empty_object() -> Value {
    json!({})
}

fn empty_array() -> Value {
    json!([])
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Top-level page literals with nested `children`
    #[serde(default)]
    pub pages: Vec<Value>,

    #[serde(default = "empty_object")]
    pub importmap: Value,

    #[serde(default = "empty_object")]
    pub credentials: Value,

    #[serde(default = "empty_array")]
    pub fonts: Value,

    #[serde(default = "empty_object")]
    pub feed: Value,

    #[serde(default = "empty_object")]
    pub log: Value,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            importmap: empty_object(),
            credentials: empty_object(),
            fonts: empty_array(),
            feed: empty_object(),
            log: empty_object(),
        }
    }
}

impl StoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a config from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_json_str(&content)?;
        log::debug!(
            "Loaded store config from {} ({} top-level pages)",
            path.display(),
            config.pages.len()
        );
        Ok(config)
    }

    /// Start from a single top-level page
    pub fn with_root(mut self, page: Value) -> Self {
        self.pages = vec![page];
        self
    }
}
