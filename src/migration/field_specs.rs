//! Static field specifications for rebuilding create payloads
//!
//! Payloads are built from an allowlist so that tenant-bound identifiers,
//! timestamps and server-computed attributes never reach the destination.

use serde_json::{Map, Value};

/// How a field is carried over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Copy as-is; null when absent
    Value,
    /// Copy as-is; `{}` when absent or null
    Object,
    /// Only included when present in the source
    Optional,
    /// Must be present in the source
    Required,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Name in the fetched JSON
    pub source_name: &'static str,
    /// Name in the create payload
    pub field_name: &'static str,
    pub field_type: FieldType,
}

macro_rules! field {
    ($name:expr, $kind:ident) => {
        FieldSpec {
            source_name: $name,
            field_name: $name,
            field_type: FieldType::$kind,
        }
    };
}

/// Custom field definition; every attribute is mandatory
pub const CUSTOM_FIELD_FIELDS: &[FieldSpec] = &[
    field!("element_type", Required),
    field!("metadata", Required),
    field!("multiple", Required),
    field!("name", Required),
    field!("options", Required),
    field!("target", Required),
    field!("type", Required),
];

/// Questionnaire base (`id` and `name` are set by the remapper)
pub const QUESTIONNAIRE_BASE_FIELDS: &[FieldSpec] = &[
    field!("info", Object),
    field!("metadata", Object),
];

/// Questionnaire version attributes (`draft`, `version` and `sections` are set by the remapper)
pub const QUESTIONNAIRE_VERSION_FIELDS: &[FieldSpec] = &[
    field!("info", Object),
    field!("metadata", Object),
];

pub const SECTION_FIELDS: &[FieldSpec] = &[
    field!("description", Value),
    field!("title", Value),
];

pub const QUESTION_FIELDS: &[FieldSpec] = &[
    field!("question", Value),
    field!("evidence_type", Value),
    field!("required", Value),
    field!("hidden", Value),
    field!("multiple", Value),
    field!("alert_triggers", Value),
    field!("description", Value),
    field!("select_options", Optional),
];

/// Build a payload object from raw data using field specifications
pub fn build_payload(raw: &Value, fields: &[FieldSpec]) -> Result<Map<String, Value>, String> {
    let mut payload = Map::new();

    for spec in fields {
        let value = raw.get(spec.source_name);

        match spec.field_type {
            FieldType::Value => {
                payload.insert(spec.field_name.to_string(), value.cloned().unwrap_or(Value::Null));
            }
            FieldType::Object => {
                let value = match value {
                    Some(v) if !v.is_null() => v.clone(),
                    _ => Value::Object(Map::new()),
                };
                payload.insert(spec.field_name.to_string(), value);
            }
            FieldType::Optional => {
                if let Some(v) = value {
                    payload.insert(spec.field_name.to_string(), v.clone());
                }
            }
            FieldType::Required => {
                let v = value.ok_or_else(|| format!("missing required attribute `{}`", spec.source_name))?;
                payload.insert(spec.field_name.to_string(), v.clone());
            }
        }
    }

    Ok(payload)
}
