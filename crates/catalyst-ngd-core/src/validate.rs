//! Schema-driven validation of query parameters.
//!
//! Declared fields are type-coerced; undeclared keys pass through unchanged
//! so that downstream-only parameters keep working without wrapper releases.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::schema::{CapabilitySchema, FieldKind};

/// A validated query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::List(values) => Some(values),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    /// Wire rendering: lists re-join with commas, scalars print plainly.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::String(value) => write!(f, "{value}"),
            ParamValue::Integer(value) => write!(f, "{value}"),
            ParamValue::Boolean(value) => write!(f, "{value}"),
            ParamValue::List(values) => write!(f, "{}", values.join(",")),
        }
    }
}

/// Field-level validation errors, keyed by wire name. All failing fields are
/// reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_field_errors(.field_errors))]
pub struct ValidationFailure {
    pub field_errors: BTreeMap<String, String>,
}

fn render_field_errors(field_errors: &BTreeMap<String, String>) -> String {
    field_errors
        .values()
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The outcome of successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedParams {
    /// Coerced declared fields plus pass-through undeclared keys.
    pub values: BTreeMap<String, ParamValue>,
    /// Whether the schema carries the Collection capability.
    pub is_multi_collection: bool,
}

/// Validate raw query parameters against a schema.
///
/// Returns the validated mapping, or a [`ValidationFailure`] naming every
/// field that was missing or could not be coerced.
pub fn validate(
    params: &BTreeMap<String, String>,
    schema: &CapabilitySchema,
) -> Result<ValidatedParams, ValidationFailure> {
    let mut values = BTreeMap::new();
    let mut field_errors = BTreeMap::new();

    for field in schema.fields() {
        match params.get(field.wire_name) {
            Some(raw) => match coerce(raw, field.kind, field.wire_name) {
                Ok(value) => {
                    values.insert(field.wire_name.to_string(), value);
                }
                Err(message) => {
                    field_errors.insert(field.wire_name.to_string(), message);
                }
            },
            None if field.required => {
                field_errors.insert(
                    field.wire_name.to_string(),
                    format!("The '{}' parameter is required.", field.wire_name),
                );
            }
            None => {}
        }
    }

    for (key, raw) in params {
        if schema.field(key).is_none() {
            values.insert(key.clone(), ParamValue::String(raw.clone()));
        }
    }

    if field_errors.is_empty() {
        Ok(ValidatedParams {
            values,
            is_multi_collection: schema.is_multi_collection(),
        })
    } else {
        Err(ValidationFailure { field_errors })
    }
}

fn coerce(raw: &str, kind: FieldKind, wire_name: &str) -> Result<ParamValue, String> {
    match kind {
        FieldKind::String => Ok(ParamValue::String(raw.to_string())),
        FieldKind::Integer => raw
            .parse::<i64>()
            .map(ParamValue::Integer)
            .map_err(|_| format!("The '{wire_name}' parameter must be an integer.")),
        // Literal match only; "True" and "1" are not booleans on this wire.
        FieldKind::Boolean => match raw {
            "true" => Ok(ParamValue::Boolean(true)),
            "false" => Ok(ParamValue::Boolean(false)),
            _ => Err(format!(
                "The '{wire_name}' parameter must be 'true' or 'false'."
            )),
        },
        FieldKind::StringList => {
            if raw.is_empty() {
                return Err(format!("The '{wire_name}' parameter cannot be empty."));
            }
            Ok(ParamValue::List(
                raw.split(',').map(str::to_string).collect(),
            ))
        }
    }
}
