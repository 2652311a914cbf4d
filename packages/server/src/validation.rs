//! Field-level rule evaluation against a [`ResourceSchema`].
//!
//! [`sanitize`] keeps only fillable fields and coerces loosely typed input
//! (multipart text, empty strings) into the JSON shape each field kind
//! expects. [`validate`] then checks a complete field map and reports every
//! violation at once. Rules that need the store (uniqueness, foreign keys)
//! live in the lifecycle.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{FieldKind, FieldSpec, ResourceSchema};

/// Field name to violation messages.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Merge messages only for fields that have none yet.
    pub fn merge_absent(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_insert(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when no violation was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", names.join(", "))
    }
}

/// Keep fillable fields only and coerce each value to its kind.
///
/// Empty strings become `null`. Values that cannot be coerced are reported
/// and dropped from the returned map.
pub fn sanitize(schema: &ResourceSchema, input: Map<String, Value>) -> (Map<String, Value>, FieldErrors) {
    let mut clean = Map::new();
    let mut errors = FieldErrors::new();

    for (name, value) in input {
        let Some(spec) = schema.field(&name).filter(|f| !f.is_author()) else {
            continue;
        };
        match coerce(spec, value) {
            Ok(value) => {
                clean.insert(name, value);
            }
            Err(message) => errors.add(&name, message),
        }
    }

    (clean, errors)
}

fn coerce(spec: &FieldSpec, value: Value) -> Result<Value, String> {
    let value = match value {
        Value::String(s) if s.trim().is_empty() => return Ok(Value::Null),
        other => other,
    };
    if value.is_null() {
        return Ok(Value::Null);
    }

    match spec.kind {
        FieldKind::Integer { .. } | FieldKind::ForeignKey { .. } => match &value {
            Value::Number(n) if n.is_i64() => Ok(value),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("The {} field must be an integer.", spec.label())),
            _ => Err(format!("The {} field must be an integer.", spec.label())),
        },
        FieldKind::Boolean => {
            let parsed = match &value {
                Value::Bool(b) => Some(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Some(false),
                    Some(1) => Some(true),
                    _ => None,
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "on" | "yes" => Some(true),
                    "false" | "0" | "off" | "no" => Some(false),
                    _ => None,
                },
                _ => None,
            };
            parsed
                .map(Value::Bool)
                .ok_or_else(|| format!("The {} field must be true or false.", spec.label()))
        }
        FieldKind::Password { .. } => match value {
            // Passwords keep surrounding whitespace.
            Value::String(_) => Ok(value),
            _ => Err(format!("The {} field must be a string.", spec.label())),
        },
        _ => match value {
            Value::String(s) => Ok(Value::String(s.trim().to_string())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            _ => Err(format!("The {} field must be a string.", spec.label())),
        },
    }
}

/// Check a complete field map against the schema's rules.
pub fn validate(schema: &ResourceSchema, fields: &Map<String, Value>) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for spec in schema.fields {
        let value = fields.get(spec.name).filter(|v| !v.is_null());
        let Some(value) = value else {
            if spec.required {
                errors.add(spec.name, format!("The {} field is required.", spec.label()));
            }
            continue;
        };
        if let Err(message) = check(spec, value) {
            errors.add(spec.name, message);
        }
    }

    errors
}

fn check(spec: &FieldSpec, value: &Value) -> Result<(), String> {
    let label = spec.label();
    match spec.kind {
        FieldKind::Text { max } => {
            let text = value.as_str().unwrap_or_default();
            if text.chars().count() > max {
                return Err(format!(
                    "The {label} field must not be greater than {max} characters."
                ));
            }
        }
        FieldKind::LongText
        | FieldKind::Boolean
        | FieldKind::ForeignKey { .. }
        | FieldKind::Author { .. } => {}
        FieldKind::Date => {
            let text = value.as_str().unwrap_or_default();
            if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_err() {
                return Err(format!("The {label} field must be a valid date (YYYY-MM-DD)."));
            }
        }
        FieldKind::Email => {
            if !is_email(value.as_str().unwrap_or_default()) {
                return Err(format!("The {label} field must be a valid email address."));
            }
        }
        FieldKind::Url => {
            if !is_url(value.as_str().unwrap_or_default()) {
                return Err(format!("The {label} field must be a valid URL."));
            }
        }
        FieldKind::Integer { min, max } => {
            let n = value.as_i64().unwrap_or(i64::MIN);
            if n < min || n > max {
                return Err(format!("The {label} field must be between {min} and {max}."));
            }
        }
        FieldKind::Enum { values } => {
            let text = value.as_str().unwrap_or_default();
            if !values.contains(&text) {
                return Err(format!(
                    "The selected {label} is invalid. Expected one of: {}.",
                    values.join(", ")
                ));
            }
        }
        FieldKind::Password { min } => {
            if value.as_str().unwrap_or_default().chars().count() < min {
                return Err(format!("The {label} field must be at least {min} characters."));
            }
        }
    }
    Ok(())
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.chars().any(char::is_whitespace)
}

fn is_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
