//! Compiled schema nodes and the repairing walk
//!
//! The walk only repairs. It follows `type` (with `nullable`), `properties`,
//! `additionalProperties`, `items`, `default`, `dynamicDefaults` and `$ref`,
//! and mutates the value:
//!
//! - a string is coerced into a declared `number`, `integer`, `boolean` or
//!   `null` type when it parses exactly;
//! - properties missing from an object get their literal default, then their
//!   dynamic default;
//! - undeclared properties are dropped where `additionalProperties` is false.
//!
//! Every repair is reported as a warning. Conformance of the repaired value is
//! checked afterwards by a `jsonschema` validator compiled from
//! [`conformance_schema`].

use super::defaults::DefaultProviders;
use super::{SchemaError, ValidationIssue, ValidationReport};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(JsonType::Null),
            "boolean" => Some(JsonType::Boolean),
            "integer" => Some(JsonType::Integer),
            "number" => Some(JsonType::Number),
            "string" => Some(JsonType::String),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            _ => None,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::Null => value.is_null(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Integer => match value {
                Value::Number(n) => {
                    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
                }
                _ => false,
            },
            JsonType::Number => value.is_number(),
            JsonType::String => value.is_string(),
            JsonType::Array => value.is_array(),
            JsonType::Object => value.is_object(),
        }
    }

    /// Coerce a string into this type, if the string parses exactly.
    fn coerce(self, text: &str) -> Option<Value> {
        match self {
            JsonType::Integer => text.parse::<i64>().ok().map(Value::from),
            JsonType::Number => match text.parse::<i64>() {
                Ok(n) => Some(Value::from(n)),
                Err(_) => text
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .and_then(Number::from_f64)
                    .map(Value::Number),
            },
            JsonType::Boolean => match text {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            JsonType::Null if text.is_empty() => Some(Value::Null),
            _ => None,
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn pointer(base: &str, segment: &str) -> String {
    format!("{}/{}", base, segment.replace('~', "~0").replace('/', "~1"))
}

/// How an object treats properties it does not declare
#[derive(Clone, Debug)]
pub(crate) enum Additional {
    Allow,
    Strip,
    Schema(Box<SchemaNode>),
}

/// A compiled schema (or subschema)
#[derive(Clone, Debug)]
pub(crate) struct SchemaNode {
    reference: Option<String>,
    types: Vec<JsonType>,
    properties: Vec<(String, SchemaNode)>,
    additional: Additional,
    items: Option<Box<SchemaNode>>,
    default: Option<Value>,
    dynamic_defaults: Vec<(String, String)>,
}

/// State shared while compiling one top-level schema
pub(crate) struct CompileContext<'a> {
    pub schema_id: &'a str,
    pub providers: &'a DefaultProviders,
    /// `$ref` targets seen so far, checked once every schema is known
    pub refs: Vec<String>,
}

impl CompileContext<'_> {
    fn invalid(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::InvalidSchema {
            schema: self.schema_id.to_string(),
            message: message.into(),
        }
    }
}

impl SchemaNode {
    pub(crate) fn compile(
        schema: &Value,
        ctx: &mut CompileContext<'_>,
    ) -> Result<Self, SchemaError> {
        let obj = schema.as_object().ok_or_else(|| {
            ctx.invalid(format!("expected an object, found {}", kind_of(schema)))
        })?;

        let mut node = SchemaNode {
            reference: None,
            types: Vec::new(),
            properties: Vec::new(),
            additional: Additional::Allow,
            items: None,
            default: obj.get("default").cloned(),
            dynamic_defaults: Vec::new(),
        };

        if let Some(target) = obj.get("$ref") {
            let target = target
                .as_str()
                .ok_or_else(|| ctx.invalid("$ref must be a string"))?;
            ctx.refs.push(target.to_string());
            node.reference = Some(target.to_string());
            return Ok(node);
        }

        match obj.get("type") {
            None => {}
            Some(Value::String(name)) => node.types.push(
                JsonType::parse(name).ok_or_else(|| ctx.invalid(format!("unknown type {}", name)))?,
            ),
            Some(Value::Array(names)) => {
                for name in names {
                    let parsed = name
                        .as_str()
                        .and_then(JsonType::parse)
                        .ok_or_else(|| ctx.invalid(format!("unknown type {}", name)))?;
                    node.types.push(parsed);
                }
            }
            Some(other) => return Err(ctx.invalid(format!("invalid type keyword {}", other))),
        }
        if obj.get("nullable").and_then(Value::as_bool) == Some(true)
            && !node.types.is_empty()
            && !node.types.contains(&JsonType::Null)
        {
            node.types.push(JsonType::Null);
        }

        if let Some(props) = obj.get("properties") {
            let props = props
                .as_object()
                .ok_or_else(|| ctx.invalid("properties must be an object"))?;
            for (name, sub) in props {
                node.properties.push((name.clone(), SchemaNode::compile(sub, ctx)?));
            }
        }

        node.additional = match obj.get("additionalProperties") {
            None | Some(Value::Bool(true)) => Additional::Allow,
            Some(Value::Bool(false)) => Additional::Strip,
            Some(sub @ Value::Object(_)) => {
                Additional::Schema(Box::new(SchemaNode::compile(sub, ctx)?))
            }
            Some(other) => {
                return Err(ctx.invalid(format!("invalid additionalProperties {}", other)))
            }
        };

        if let Some(items) = obj.get("items") {
            node.items = Some(Box::new(SchemaNode::compile(items, ctx)?));
        }

        if let Some(dynamic) = obj.get("dynamicDefaults") {
            let dynamic = dynamic
                .as_object()
                .ok_or_else(|| ctx.invalid("dynamicDefaults must be an object"))?;
            for (property, provider) in dynamic {
                let provider = provider
                    .as_str()
                    .ok_or_else(|| ctx.invalid("dynamicDefaults values must be strings"))?;
                if !ctx.providers.contains(provider) {
                    return Err(SchemaError::UnknownDefaultProvider {
                        schema: ctx.schema_id.to_string(),
                        provider: provider.to_string(),
                    });
                }
                node.dynamic_defaults.push((property.clone(), provider.to_string()));
            }
        }

        Ok(node)
    }

    pub(crate) fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// The value a fresh document starts from before defaults are filled.
    pub(crate) fn empty_instance(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        match self.types.first() {
            Some(JsonType::Object) => Value::Object(Map::new()),
            Some(JsonType::Array) => Value::Array(Vec::new()),
            Some(JsonType::String) => Value::String(String::new()),
            Some(JsonType::Boolean) => Value::Bool(false),
            Some(JsonType::Integer) | Some(JsonType::Number) => Value::from(0),
            Some(JsonType::Null) | None => Value::Null,
        }
    }

    fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }
}

/// Everything the walk needs besides the node and the value
pub(crate) struct WalkContext<'a> {
    pub schemas: &'a HashMap<String, SchemaNode>,
    pub providers: &'a DefaultProviders,
}

pub(crate) fn walk(
    node: &SchemaNode,
    value: &mut Value,
    path: &str,
    ctx: &WalkContext<'_>,
    report: &mut ValidationReport,
) {
    if let Some(target) = &node.reference {
        if let Some(resolved) = ctx.schemas.get(target) {
            walk(resolved, value, path, ctx, report);
        }
        return;
    }

    if !node.types.is_empty() && !node.types.iter().any(|t| t.matches(value)) {
        let coerced = match value {
            Value::String(text) => {
                let text = text.as_str();
                node.types.iter().find_map(|t| t.coerce(text))
            }
            _ => None,
        };
        match coerced {
            Some(repaired) => {
                report.push(
                    ValidationIssue::warning(format!(
                        "coerced string to {}",
                        kind_of(&repaired)
                    ))
                    .at(path),
                );
                *value = repaired;
            }
            // left for the conformance check to report
            None => return,
        }
    }

    match value {
        Value::Object(map) => walk_object(node, map, path, ctx, report),
        Value::Array(items) => {
            if let Some(item_node) = &node.items {
                for (i, item) in items.iter_mut().enumerate() {
                    walk(item_node, item, &pointer(path, &i.to_string()), ctx, report);
                }
            }
        }
        _ => {}
    }
}

fn walk_object(
    node: &SchemaNode,
    map: &mut Map<String, Value>,
    path: &str,
    ctx: &WalkContext<'_>,
    report: &mut ValidationReport,
) {
    for (name, prop) in &node.properties {
        if map.contains_key(name) {
            continue;
        }
        if let Some(default) = &prop.default {
            map.insert(name.clone(), default.clone());
            report.push(ValidationIssue::warning("filled default").at(pointer(path, name)));
        }
    }

    for (name, provider) in &node.dynamic_defaults {
        if map.contains_key(name) {
            continue;
        }
        if let Some(generate) = ctx.providers.get(provider) {
            map.insert(name.clone(), generate());
            report.push(
                ValidationIssue::warning(format!("generated {} default", provider))
                    .at(pointer(path, name)),
            );
        }
    }

    if let Additional::Strip = node.additional {
        let before: Vec<String> = map.keys().cloned().collect();
        map.retain(|key, _| node.property(key).is_some());
        for key in before.iter().filter(|k| !map.contains_key(k.as_str())) {
            report.push(
                ValidationIssue::warning("removed undeclared property").at(pointer(path, key)),
            );
        }
    }

    for (key, child) in map.iter_mut() {
        let child_path = pointer(path, key);
        if let Some(prop) = node.property(key) {
            walk(prop, child, &child_path, ctx, report);
        } else if let Additional::Schema(extra) = &node.additional {
            walk(extra, child, &child_path, ctx, report);
        }
    }
}

/// Rewrite a schema for the conformance check.
///
/// `nullable: true` widens `type` to include `"null"`; `nullable` and
/// `dynamicDefaults` are dropped. Subschemas are rewritten recursively, while
/// `enum`, `const` and `default` values are copied untouched.
pub(crate) fn conformance_schema(schema: &Value) -> Value {
    let Value::Object(obj) = schema else {
        return schema.clone();
    };

    let mut out = Map::new();
    for (key, value) in obj {
        let rewritten = match key.as_str() {
            "nullable" | "dynamicDefaults" => continue,
            "properties" | "patternProperties" | "definitions" | "$defs" => match value {
                Value::Object(subs) => Value::Object(
                    subs.iter()
                        .map(|(name, sub)| (name.clone(), conformance_schema(sub)))
                        .collect(),
                ),
                other => other.clone(),
            },
            "items" | "additionalItems" | "additionalProperties" | "contains"
            | "propertyNames" | "not" | "if" | "then" | "else" | "allOf" | "anyOf"
            | "oneOf" => match value {
                Value::Array(subs) => Value::Array(subs.iter().map(conformance_schema).collect()),
                sub => conformance_schema(sub),
            },
            _ => value.clone(),
        };
        out.insert(key.clone(), rewritten);
    }

    if obj.get("nullable").and_then(Value::as_bool) == Some(true) {
        let widened = match out.get("type") {
            Some(Value::String(name)) if name != "null" => Some(Value::Array(vec![
                Value::String(name.clone()),
                Value::from("null"),
            ])),
            Some(Value::Array(names)) if !names.iter().any(|n| n == "null") => {
                let mut names = names.clone();
                names.push(Value::from("null"));
                Some(Value::Array(names))
            }
            _ => None,
        };
        if let Some(types) = widened {
            out.insert("type".to_string(), types);
        }
    }

    Value::Object(out)
}
