//! Dynamic default providers
//!
//! Schemas may name a provider per property (`"dynamicDefaults": {"id": "uuid"}`).
//! When the property is missing the validator calls the provider and stores
//! the generated value.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Zero-argument generator for a default value
pub type DefaultProvider = Arc<dyn Fn() -> Value + Send + Sync>;

/// A fresh unique id, as used for page and feed item ids
pub fn uid() -> String {
    Uuid::new_v4().to_string()
}

/// Registry mapping provider names to generators.
#[derive(Clone)]
pub struct DefaultProviders {
    providers: HashMap<String, DefaultProvider>,
}

impl DefaultProviders {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// The providers the builtin schemas refer to: `uuid`, `datetime`
    /// (RFC 3339, UTC) and `timestamp` (milliseconds since the epoch).
    pub fn standard() -> Self {
        Self::new()
            .with("uuid", || Value::String(uid()))
            .with("datetime", || Value::String(chrono::Utc::now().to_rfc3339()))
            .with("timestamp", || {
                Value::from(chrono::Utc::now().timestamp_millis())
            })
    }

    /// Register a provider, replacing any previous one with the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: impl Fn() -> Value + Send + Sync + 'static,
    ) {
        self.providers.insert(name.into(), Arc::new(provider));
    }

    pub fn with(
        mut self,
        name: impl Into<String>,
        provider: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        self.register(name, provider);
        self
    }

    pub fn get(&self, name: &str) -> Option<&DefaultProvider> {
        self.providers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}

impl Default for DefaultProviders {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for DefaultProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.providers.keys().collect();
        names.sort();
        f.debug_struct("DefaultProviders")
            .field("providers", &names)
            .finish()
    }
}
