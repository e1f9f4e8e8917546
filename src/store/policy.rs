//! Repair policies run as document watchers
//!
//! - [`PageTreePolicy`]: validate the flat page array; on failure replace the
//!   whole tree with one fresh default-filled page, on success install
//!   navigation on records missing it.
//! - [`ImportMapPolicy`]: validate; on failure clear `imports`.
//! - [`RevalidatePolicy`]: validate only, keeping whatever in-place repairs
//!   the validator made.

use super::document::{DocumentStatus, Watcher};
use crate::schema::defaults::uid;
use crate::schema::definitions::{IMPORTMAP, NODES, PAGE};
use crate::schema::SchemaRegistry;
use crate::tree::FlatTree;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn status(valid: bool) -> DocumentStatus {
    if valid {
        DocumentStatus::Valid
    } else {
        DocumentStatus::InvalidRepaired
    }
}

/// Validate `value` against `schema`, logging every error found.
fn check(registry: &SchemaRegistry, schema: &str, value: &mut Value) -> bool {
    match registry.report(schema, value) {
        Ok(report) => {
            for issue in report.errors() {
                log::debug!("{} {}: {}", schema, issue.path, issue.message);
            }
            report.is_valid()
        }
        Err(e) => {
            log::error!("Cannot validate {}: {}", schema, e);
            false
        }
    }
}

/// A fresh default-filled page with a generated id
pub fn default_page(registry: &SchemaRegistry) -> Value {
    registry.instantiate(PAGE).unwrap_or_else(|e| {
        log::error!("Cannot instantiate page: {}", e);
        json!({ "id": uid() })
    })
}

pub struct PageTreePolicy {
    registry: Arc<SchemaRegistry>,
}

impl PageTreePolicy {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }
}

impl Watcher<FlatTree> for PageTreePolicy {
    fn name(&self) -> &str {
        "page-tree"
    }

    fn observe(&self, tree: &mut FlatTree) -> DocumentStatus {
        let mut nodes = tree.to_flat_value();
        let conforms = check(&self.registry, NODES, &mut nodes);

        let valid = conforms
            && match nodes {
                Value::Array(values) => tree.replace_fields(values),
                _ => false,
            }
            && tree.has_unique_ids();

        if !valid {
            log::warn!(
                "Page tree failed validation; resetting {} records to a single page",
                tree.len()
            );
            tree.reset(default_page(&self.registry));
        }

        let attached = tree.attach();
        if attached > 0 {
            log::debug!("Attached navigation to {} pages", attached);
        }
        status(valid)
    }
}

pub struct ImportMapPolicy {
    registry: Arc<SchemaRegistry>,
}

impl ImportMapPolicy {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }
}

impl Watcher<Value> for ImportMapPolicy {
    fn name(&self) -> &str {
        "importmap"
    }

    fn observe(&self, value: &mut Value) -> DocumentStatus {
        if check(&self.registry, IMPORTMAP, value) {
            return DocumentStatus::Valid;
        }

        log::warn!("Import map failed validation; clearing imports");
        match value.as_object_mut() {
            Some(map) => {
                map.insert("imports".to_string(), Value::Object(Map::new()));
            }
            None => *value = json!({ "imports": {} }),
        }
        DocumentStatus::InvalidRepaired
    }
}

pub struct RevalidatePolicy {
    registry: Arc<SchemaRegistry>,
    schema: String,
}

impl RevalidatePolicy {
    pub fn new(registry: Arc<SchemaRegistry>, schema: impl Into<String>) -> Self {
        Self {
            registry,
            schema: schema.into(),
        }
    }
}

impl Watcher<Value> for RevalidatePolicy {
    fn name(&self) -> &str {
        &self.schema
    }

    fn observe(&self, value: &mut Value) -> DocumentStatus {
        status(check(&self.registry, &self.schema, value))
    }
}
