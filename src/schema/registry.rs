//! Registry mapping schema names to compiled validators.
//!
//! Schemas are registered under their full `$id` (`urn:jsonschema:page`) and
//! looked up by the last segment of that id (`page`). Compilation checks the
//! whole set up front: duplicate ids, dangling `$ref`s, unknown dynamic
//! default providers and schemas `jsonschema` refuses to build are
//! configuration errors.
//!
//! Each schema compiles twice: into a [`SchemaNode`] for the repairing walk,
//! and into a `jsonschema` validator that checks the repaired value. The
//! other schemas of the set are registered with it as resources so `$ref`s
//! between documents resolve.

use super::defaults::DefaultProviders;
use super::definitions;
use super::validator::{conformance_schema, walk, CompileContext, SchemaNode, WalkContext};
use super::{SchemaError, ValidationIssue, ValidationReport};
use jsonschema::Draft;
use serde_json::Value;
use std::collections::HashMap;

pub struct SchemaRegistry {
    /// Compiled schemas keyed by full `$id`
    schemas: HashMap<String, SchemaNode>,
    /// Conformance validators keyed by full `$id`
    checkers: HashMap<String, jsonschema::Validator>,
    /// Short name -> full `$id`
    names: HashMap<String, String>,
    providers: DefaultProviders,
}

impl SchemaRegistry {
    /// Compile a schema set.
    ///
    /// Every schema must carry a string `$id`; the short name is the part
    /// after the last `:`.
    pub fn compile(
        schemas: impl IntoIterator<Item = Value>,
        providers: DefaultProviders,
    ) -> Result<Self, SchemaError> {
        let mut compiled = HashMap::new();
        let mut names = HashMap::new();
        let mut refs: Vec<(String, String)> = Vec::new();
        let mut documents: Vec<(String, Value)> = Vec::new();

        for (position, schema) in schemas.into_iter().enumerate() {
            let id = schema
                .get("$id")
                .and_then(Value::as_str)
                .ok_or_else(|| SchemaError::MissingId(format!("#{}", position)))?
                .to_string();
            if compiled.contains_key(&id) {
                return Err(SchemaError::DuplicateId(id));
            }

            let short = id.rsplit(':').next().unwrap_or(id.as_str()).to_string();
            if names.contains_key(&short) {
                return Err(SchemaError::DuplicateId(short));
            }

            let mut ctx = CompileContext {
                schema_id: &id,
                providers: &providers,
                refs: Vec::new(),
            };
            let node = SchemaNode::compile(&schema, &mut ctx)?;
            refs.extend(ctx.refs.into_iter().map(|target| (id.clone(), target)));

            documents.push((id.clone(), conformance_schema(&schema)));
            names.insert(short, id.clone());
            compiled.insert(id, node);
        }

        for (schema, target) in refs {
            if !compiled.contains_key(&target) {
                return Err(SchemaError::DanglingRef { schema, target });
            }
        }

        let mut checkers = HashMap::new();
        for (id, document) in &documents {
            let siblings = documents
                .iter()
                .filter(|(other, _)| other != id)
                .map(|(other, doc)| (other.clone(), Draft::Draft7.create_resource(doc.clone())));
            let checker = jsonschema::options()
                .with_draft(Draft::Draft7)
                .with_resources(siblings)
                .build(document)
                .map_err(|e| SchemaError::InvalidSchema {
                    schema: id.clone(),
                    message: e.to_string(),
                })?;
            checkers.insert(id.clone(), checker);
        }

        log::debug!("Compiled {} schemas", compiled.len());

        Ok(Self {
            schemas: compiled,
            checkers,
            names,
            providers,
        })
    }

    /// The builtin schema set with the standard default providers
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::compile(definitions::builtin(), DefaultProviders::standard())
    }

    /// Get a validator by short name (`page`, `nodes`, `importmap`, ...).
    pub fn validator_for(&self, name: &str) -> Option<Validator<'_>> {
        let id = self.names.get(name)?;
        let node = self.schemas.get(id)?;
        let checker = self.checkers.get(id)?;
        Some(Validator {
            name: id,
            node,
            checker,
            registry: self,
        })
    }

    /// Validate and repair `value` in place against the named schema.
    pub fn validate(&self, name: &str, value: &mut Value) -> Result<bool, SchemaError> {
        Ok(self.validator(name)?.validate(value))
    }

    /// Like [`validate`](Self::validate) but returns every issue found.
    pub fn report(&self, name: &str, value: &mut Value) -> Result<ValidationReport, SchemaError> {
        Ok(self.validator(name)?.report(value))
    }

    /// A fresh, default-filled value for the named schema
    pub fn instantiate(&self, name: &str) -> Result<Value, SchemaError> {
        let validator = self.validator(name)?;
        let mut value = self.resolve(validator.node).empty_instance();
        validator.validate(&mut value);
        Ok(value)
    }

    /// Short names of every registered schema, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn providers(&self) -> &DefaultProviders {
        &self.providers
    }

    fn validator(&self, name: &str) -> Result<Validator<'_>, SchemaError> {
        self.validator_for(name)
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))
    }

    /// Follow `$ref`s until a concrete node is reached.
    fn resolve<'a>(&'a self, mut node: &'a SchemaNode) -> &'a SchemaNode {
        // Compilation guarantees targets exist; the bound guards against cycles.
        for _ in 0..self.schemas.len() {
            match node.reference().and_then(|target| self.schemas.get(target)) {
                Some(next) => node = next,
                None => break,
            }
        }
        node
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.names())
            .field("providers", &self.providers)
            .finish()
    }
}

/// A compiled validator borrowed from the registry
#[derive(Clone, Copy)]
pub struct Validator<'a> {
    name: &'a str,
    node: &'a SchemaNode,
    checker: &'a jsonschema::Validator,
    registry: &'a SchemaRegistry,
}

impl Validator<'_> {
    /// Full `$id` of the schema this validator checks against
    pub fn schema_id(&self) -> &str {
        self.name
    }

    /// Repair `value` in place and report whether it conforms afterwards.
    pub fn validate(&self, value: &mut Value) -> bool {
        self.report(value).is_valid()
    }

    /// Repair `value` in place, then check it.
    ///
    /// Repairs come back as warnings, conformance failures of the repaired
    /// value as errors located by JSON pointer.
    pub fn report(&self, value: &mut Value) -> ValidationReport {
        let ctx = WalkContext {
            schemas: &self.registry.schemas,
            providers: &self.registry.providers,
        };
        let mut report = ValidationReport::default();
        walk(self.node, value, "", &ctx, &mut report);
        for error in self.checker.iter_errors(&*value) {
            let path = error.instance_path.to_string();
            report.push(ValidationIssue::error(error.to_string()).at(path));
        }
        report
    }
}
