//! Page records
//!
//! A record keeps the page's persisted fields as a raw JSON value so that
//! bulk-assigned input can be held as-is until validation repairs or rejects
//! it. Typed access goes through the helpers below or [`PageData`].

use super::attach::Navigation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Internal handle linking a record to its parent. Independent of the page
/// id so that linkage survives ids being missing or repaired.
pub(crate) type RecordKey = u64;

/// One entry of the flat page sequence
#[derive(Clone, Debug)]
pub struct PageRecord {
    pub(crate) key: RecordKey,
    pub(crate) parent: Option<RecordKey>,
    pub(crate) fields: Value,
    pub(crate) nav: Option<Navigation>,
}

impl PageRecord {
    pub(crate) fn new(key: RecordKey, parent: Option<RecordKey>, fields: Value) -> Self {
        Self {
            key,
            parent,
            fields,
            nav: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn header(&self) -> Option<&str> {
        self.str_field("header")
    }

    pub fn icon(&self) -> Option<&str> {
        self.str_field("icon")
    }

    pub fn loc(&self) -> Option<&str> {
        self.str_field("loc")
    }

    /// Missing means enabled, matching the schema default.
    pub fn enabled(&self) -> bool {
        self.fields
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// The persisted fields (never includes `children`)
    pub fn fields(&self) -> &Value {
        &self.fields
    }

    /// Typed view of the fields, if they have the page shape
    pub fn data(&self) -> Option<PageData> {
        serde_json::from_value(self.fields.clone()).ok()
    }

    /// Derived navigation installed by [`FlatTree::attach`](super::FlatTree::attach)
    pub fn navigation(&self) -> Option<&Navigation> {
        self.nav.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.nav.is_some()
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

fn default_true() -> bool {
    true
}

/// An image attached to a page (Open Graph)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageImage {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Typed page fields, as described by the `page` schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub loc: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub flat: bool,
    /// Open Graph type
    #[serde(rename = "type", default)]
    pub og_type: Option<String>,
    #[serde(default)]
    pub changefreq: Option<String>,
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default)]
    pub images: Vec<PageImage>,
    #[serde(default)]
    pub class: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lastmod: Option<String>,
    #[serde(default)]
    pub frontmatter: Map<String, Value>,
}

impl PageData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            header: None,
            icon: None,
            loc: None,
            enabled: true,
            flat: true,
            og_type: None,
            changefreq: None,
            priority: None,
            images: Vec::new(),
            class: vec!["prose".to_string(), "max-w-none".to_string()],
            keywords: Vec::new(),
            description: None,
            lastmod: None,
            frontmatter: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Convert into the raw field value a record stores
    pub fn to_fields(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
