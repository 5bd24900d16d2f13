//! Helpers for the JSON:API documents the platform exchanges
//!
//! Every response wraps its payload in a top-level `data` member: an object for
//! single resources and an array for collections.

use super::error::ApiError;
use serde_json::{Map, Value, json};

/// Media type of a request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    JsonApi,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => super::constants::headers::CONTENT_TYPE_JSON,
            Self::JsonApi => super::constants::headers::CONTENT_TYPE_JSON_API,
        }
    }
}

/// Borrow the `data` array of a collection document
pub fn data_array<'a>(document: &'a Value, context: &str) -> Result<&'a Vec<Value>, ApiError> {
    document
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::malformed(context, "expected a `data` array"))
}

/// Borrow the `data` object of a single-resource document
pub fn data_object<'a>(document: &'a Value, context: &str) -> Result<&'a Map<String, Value>, ApiError> {
    document
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| ApiError::malformed(context, "expected a `data` object"))
}

/// Read an identifier that may be serialized as a string or a number
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read the `id` member of a resource object
pub fn resource_id(resource: &Value) -> Option<String> {
    resource.get("id").and_then(id_string)
}

/// Read the `id` of the resource inside a single-resource document
pub fn document_id(document: &Value) -> Option<String> {
    document.get("data").and_then(resource_id)
}

/// Wrap attributes into a create request document
pub fn envelope(resource_type: Option<&str>, attributes: Value) -> Value {
    let mut data = json!({ "attributes": attributes });
    if let Some(resource_type) = resource_type {
        data["type"] = json!(resource_type);
    }
    json!({ "data": data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_string_accepts_numbers() {
        assert_eq!(id_string(&json!("abc")), Some("abc".to_string()));
        assert_eq!(id_string(&json!(42)), Some("42".to_string()));
        assert_eq!(id_string(&json!("")), None);
        assert_eq!(id_string(&Value::Null), None);
    }

    #[test]
    fn test_data_accessors() {
        let collection = json!({ "data": [{ "id": "a" }, { "id": "b" }] });
        assert_eq!(data_array(&collection, "test").map(Vec::len).ok(), Some(2));
        assert!(data_object(&collection, "test").is_err());

        let single = json!({ "data": { "id": "q+1", "attributes": {} } });
        assert_eq!(document_id(&single), Some("q+1".to_string()));
    }

    #[test]
    fn test_envelope() {
        let doc = envelope(Some("custom_fields"), json!({ "name": "Owner" }));
        assert_eq!(doc["data"]["type"], "custom_fields");
        assert_eq!(doc["data"]["attributes"]["name"], "Owner");

        let untyped = envelope(None, json!({}));
        assert!(untyped["data"].get("type").is_none());
    }
}
