//! Domain model for the resources being migrated
//!
//! Each type keeps the typed fields the migration reasons about plus the raw JSON
//! it was parsed from, so payloads can be rebuilt from an allowlist of fields.

use crate::api::ApiError;
use crate::api::models::{data_array, data_object, id_string, resource_id};
use serde_json::{Map, Value};

/// A questionnaire version with its ordered sections
#[derive(Clone, Debug)]
pub struct Questionnaire {
    pub id: String,
    pub key: Option<String>,
    pub name: String,
    pub version: u32,
    /// The `attributes` object of the resource
    pub raw: Value,
    pub sections: Vec<Section>,
}

/// A section holds an ordered list of questions
#[derive(Clone, Debug)]
pub struct Section {
    pub id: String,
    pub title: Option<String>,
    pub raw: Value,
    pub questions: Vec<Question>,
}

#[derive(Clone, Debug)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub evidence_type: Option<String>,
    pub select_options: Option<Vec<Value>>,
    pub raw: Value,
}

/// A rule firing on a question/answer condition
#[derive(Clone, Debug)]
pub struct Trigger {
    pub id: String,
    pub trigger_type: Option<String>,
    pub description: Option<String>,
    pub questionnaire_id: Option<String>,
    pub question_id: Option<String>,
    pub section_id: Option<String>,
    pub options: Option<Value>,
    pub raw: Value,
}

/// An effect executed when one of its triggers fires
#[derive(Clone, Debug)]
pub struct Action {
    pub id: String,
    pub action_type: Option<String>,
    pub description: Option<String>,
    pub show_visual_alert: bool,
    pub trigger_ids: Vec<String>,
    /// Effect payload; may reference questions and sections of the questionnaire
    pub data: Value,
    pub raw: Value,
}

/// A tenant-defined metadata field
#[derive(Clone, Debug)]
pub struct CustomField {
    pub id: String,
    pub name: String,
    pub field_type: Option<String>,
    pub raw: Value,
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn attributes_of(resource: &Value) -> Value {
    resource
        .get("attributes")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

fn require_id(resource: &Value, context: &str) -> Result<String, ApiError> {
    resource_id(resource).ok_or_else(|| ApiError::malformed(context, "resource without an `id`"))
}

/// Versions come back as numbers or numeric strings
fn parse_version(value: Option<&Value>) -> Result<u32, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| ApiError::malformed("questionnaire", format!("invalid version {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map_err(|e| ApiError::malformed("questionnaire", format!("invalid version '{}': {}", s, e))),
        Some(other) => Err(ApiError::malformed("questionnaire", format!("invalid version {}", other))),
    }
}

fn collection<T>(document: &Value, context: &str, parse: impl Fn(&Value) -> Result<T, ApiError>) -> Result<Vec<T>, ApiError> {
    data_array(document, context)?.iter().map(parse).collect()
}

impl Questionnaire {
    /// Parse a single-questionnaire document (`{"data": {"id", "attributes"}}`)
    pub fn from_document(document: &Value) -> Result<Self, ApiError> {
        let data = data_object(document, "questionnaire")?;
        let id = data
            .get("id")
            .and_then(id_string)
            .ok_or_else(|| ApiError::malformed("questionnaire", "resource without an `id`"))?;

        let raw = data.get("attributes").cloned().unwrap_or_else(|| Value::Object(Map::new()));
        let sections = raw
            .get("sections")
            .and_then(Value::as_array)
            .map(|sections| sections.iter().map(Section::from_value).collect::<Result<Vec<_>, _>>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            id,
            key: str_field(&raw, "key"),
            name: str_field(&raw, "name").unwrap_or_else(|| "Unnamed".to_string()),
            version: parse_version(raw.get("version"))?,
            raw,
            sections,
        })
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// Find a question and the section containing it
    pub fn find_question(&self, question_id: &str) -> Option<(usize, usize)> {
        self.sections.iter().enumerate().find_map(|(section_index, section)| {
            section
                .questions
                .iter()
                .position(|q| q.id == question_id)
                .map(|question_index| (section_index, question_index))
        })
    }
}

impl Section {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        let id = require_id(value, "questionnaire section")?;
        let questions = value
            .get("questions")
            .and_then(Value::as_array)
            .map(|questions| questions.iter().map(Question::from_value).collect::<Result<Vec<_>, _>>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            id,
            title: str_field(value, "title"),
            raw: value.clone(),
            questions,
        })
    }
}

impl Question {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        Ok(Self {
            id: require_id(value, "questionnaire question")?,
            text: str_field(value, "question").unwrap_or_default(),
            evidence_type: str_field(value, "evidence_type"),
            select_options: value.get("select_options").and_then(Value::as_array).cloned(),
            raw: value.clone(),
        })
    }
}

impl Trigger {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        let raw = attributes_of(value);
        let data = raw.get("data").cloned().unwrap_or(Value::Null);
        let options = data.get("options").filter(|o| !is_empty_value(o)).cloned();

        Ok(Self {
            id: require_id(value, "trigger")?,
            trigger_type: str_field(&raw, "type"),
            description: str_field(&raw, "description"),
            questionnaire_id: data.get("questionnaire_id").and_then(id_string),
            question_id: data.get("question_id").and_then(id_string),
            section_id: data.get("section_id").and_then(id_string),
            options,
            raw,
        })
    }

    pub fn collection(document: &Value) -> Result<Vec<Self>, ApiError> {
        collection(document, "triggers", Self::from_value)
    }
}

impl Action {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        let raw = attributes_of(value);
        let trigger_ids = raw
            .get("trigger_ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(id_string).collect())
            .unwrap_or_default();

        Ok(Self {
            id: require_id(value, "trigger action")?,
            action_type: str_field(&raw, "type"),
            description: str_field(&raw, "description"),
            show_visual_alert: raw.get("show_visual_alert").and_then(Value::as_bool).unwrap_or(false),
            trigger_ids,
            data: raw.get("data").cloned().unwrap_or_else(|| Value::Object(Map::new())),
            raw,
        })
    }

    pub fn collection(document: &Value) -> Result<Vec<Self>, ApiError> {
        collection(document, "trigger actions", Self::from_value)
    }
}

impl CustomField {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        let raw = attributes_of(value);
        Ok(Self {
            id: require_id(value, "custom field")?,
            name: str_field(&raw, "name").unwrap_or_else(|| "unknown".to_string()),
            field_type: str_field(&raw, "type"),
            raw,
        })
    }

    pub fn collection(document: &Value) -> Result<Vec<Self>, ApiError> {
        collection(document, "custom fields", Self::from_value)
    }
}

/// Null, `{}`, `[]` and `""` carry no information for the API
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
