//! Schema registry for the managed documents
//!
//! Every document the store manages (page tree, import map, credentials,
//! fonts, feed, chat log) is described by a JSON schema. The registry compiles
//! the schemas once at startup and hands out validators that repair values in
//! place: scalar coercion, stripping of undeclared properties and default
//! filling, including dynamic defaults such as generated ids.

pub mod defaults;
pub mod definitions;
mod error;
mod registry;
mod validator;

pub use defaults::{uid, DefaultProvider, DefaultProviders};
pub use error::SchemaError;
pub use registry::{SchemaRegistry, Validator};

/// A validation issue found while checking a value
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationIssue {
    /// JSON pointer of the offending location ("" for the root)
    pub path: String,
    pub severity: IssueSeverity,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueSeverity {
    /// The walk repaired the value (coercion, stripping, default filling)
    Warning,
    /// The value does not conform and could not be repaired
    Error,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            severity: IssueSeverity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

/// Outcome of a validation pass
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when no issue is an error. Repairs alone keep a value valid.
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn repairs(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    pub(crate) fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }
}
