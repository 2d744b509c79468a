// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload schema validation and composition.
//!
//! A task payload is one JSON object shared by two consumers: the engine and
//! the plugin pipeline. Each consumer declares a [`PayloadSchema`] over the
//! fields it cares about; schemas are composed so that no two consumers
//! *require* the same field, while any consumer may observe a shared field
//! as optional. Parsing a schema against the payload yields the subtree the
//! schema declares and nothing else.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors from payload validation or schema composition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("schema '{schema}': missing required field '{field}'")]
    MissingField { schema: String, field: String },
    #[error("schema '{schema}': field '{field}' is not {expected}")]
    WrongKind {
        schema: String,
        field: String,
        expected: FieldKind,
    },
    #[error("field '{field}' is required by both '{first}' and '{second}'")]
    OverlappingField {
        field: String,
        first: String,
        second: String,
    },
}

/// Expected shape of a payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any JSON value.
    Any,
    Bool,
    Integer,
    String,
    Object,
    Array,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::Any => true,
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::String => value.is_string(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Any => write!(f, "any value"),
            FieldKind::Bool => write!(f, "a boolean"),
            FieldKind::Integer => write!(f, "an integer"),
            FieldKind::String => write!(f, "a string"),
            FieldKind::Object => write!(f, "an object"),
            FieldKind::Array => write!(f, "an array"),
        }
    }
}

#[derive(Debug, Clone)]
struct Field {
    key: String,
    kind: FieldKind,
    required: bool,
}

#[derive(Debug, Clone)]
struct SchemaPart {
    name: String,
    fields: Vec<Field>,
}

/// Validator for the object-shaped task payload.
///
/// A schema is a list of named parts, each declaring the fields it requires
/// or observes. A single consumer builds a one-part schema with
/// [`PayloadSchema::part`]; the pipeline composes its members' schemas with
/// [`PayloadSchema::compose`].
#[derive(Debug, Clone)]
pub struct PayloadSchema {
    parts: Vec<SchemaPart>,
}

impl PayloadSchema {
    /// Start a single-part schema named after its consumer.
    pub fn part(name: impl Into<String>) -> PartBuilder {
        PartBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// A schema with no payload interest. Parses any object to an empty one.
    pub fn empty() -> Self {
        Self { parts: Vec::new() }
    }

    /// Compose schemas into one.
    ///
    /// Fails if two parts require the same field; a field required by one
    /// part and optional in another is fine (shared envelope observation).
    pub fn compose(
        schemas: impl IntoIterator<Item = PayloadSchema>,
    ) -> Result<PayloadSchema, PayloadError> {
        let mut parts: Vec<SchemaPart> = Vec::new();
        let mut required_by: HashMap<String, String> = HashMap::new();
        for schema in schemas {
            for part in schema.parts {
                for field in part.fields.iter().filter(|f| f.required) {
                    if let Some(first) = required_by.get(&field.key) {
                        return Err(PayloadError::OverlappingField {
                            field: field.key.clone(),
                            first: first.clone(),
                            second: part.name.clone(),
                        });
                    }
                    required_by.insert(field.key.clone(), part.name.clone());
                }
                parts.push(part);
            }
        }
        Ok(PayloadSchema { parts })
    }

    /// Validate the payload object and extract the declared subtree.
    ///
    /// Fields the schema does not declare belong to another consumer and are
    /// ignored, never rejected.
    pub fn parse(&self, payload: &Map<String, Value>) -> Result<Value, PayloadError> {
        let mut out = Map::new();
        for part in &self.parts {
            for field in &part.fields {
                match payload.get(&field.key) {
                    Some(value) => {
                        if !field.kind.matches(value) {
                            return Err(PayloadError::WrongKind {
                                schema: part.name.clone(),
                                field: field.key.clone(),
                                expected: field.kind,
                            });
                        }
                        out.insert(field.key.clone(), value.clone());
                    }
                    None if field.required => {
                        return Err(PayloadError::MissingField {
                            schema: part.name.clone(),
                            field: field.key.clone(),
                        });
                    }
                    None => {}
                }
            }
        }
        Ok(Value::Object(out))
    }

    /// Parse a raw JSON value, requiring it to be an object.
    pub fn parse_value(&self, payload: &Value) -> Result<Value, PayloadError> {
        let object = payload.as_object().ok_or(PayloadError::NotAnObject)?;
        self.parse(object)
    }
}

/// Builder for a single schema part.
pub struct PartBuilder {
    name: String,
    fields: Vec<Field>,
}

impl PartBuilder {
    pub fn required(mut self, key: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(Field {
            key: key.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, key: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(Field {
            key: key.into(),
            kind,
            required: false,
        });
        self
    }

    pub fn build(self) -> PayloadSchema {
        PayloadSchema {
            parts: vec![SchemaPart {
                name: self.name,
                fields: self.fields,
            }],
        }
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
