//! Identifier remapping between a source tree and its destination copy
//!
//! Everything here is pure: payload builders strip tenant-bound identifiers,
//! and [`SectionPairs`] reconnects source question/section ids to the ids the
//! destination assigned, so triggers and actions can be rewired before upload.
//!
//! The destination owns versioning. Copying source version N creates a base
//! `<id>_COPY` whose first version the platform numbers itself, so the created
//! questionnaire usually comes back as `<id>_COPY+1`. Ids from creation
//! responses are authoritative; [`expected_copy_id`] is only used for logging.

use super::domain::{Action, CustomField, Questionnaire, Section, Trigger};
use super::field_specs::{self, build_payload};
use crate::api::constants::envelope_types;
use crate::api::models::envelope;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use thiserror::Error;

pub const COPY_SUFFIX: &str = "_COPY";
pub const COPY_NAME_PREFIX: &str = "Copy of ";

#[derive(Debug, Error)]
pub enum RemapError {
    #[error("{resource} {id}: {reason}")]
    Invalid {
        resource: &'static str,
        id: String,
        reason: String,
    },
}

impl RemapError {
    fn invalid(resource: &'static str, id: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            resource,
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Base id requested for the copy of a source questionnaire
pub fn copy_base_id(source_id: &str) -> String {
    format!("{}{}", source_id, COPY_SUFFIX)
}

/// Id the destination is expected to assign to a version of a base
pub fn expected_copy_id(base_id: &str, version: u32) -> String {
    format!("{}+{}", base_id, version)
}

// ============================================================================
// Payload builders
// ============================================================================

pub fn custom_field_payload(field: &CustomField) -> Result<Value, RemapError> {
    let attributes = build_payload(&field.raw, field_specs::CUSTOM_FIELD_FIELDS)
        .map_err(|e| RemapError::invalid("custom field", &field.id, e))?;
    Ok(envelope(Some(envelope_types::CUSTOM_FIELDS), Value::Object(attributes)))
}

pub fn questionnaire_base_payload(questionnaire: &Questionnaire, base_id: &str) -> Result<Value, RemapError> {
    let mut attributes = build_payload(&questionnaire.raw, field_specs::QUESTIONNAIRE_BASE_FIELDS)
        .map_err(|e| RemapError::invalid("questionnaire", &questionnaire.id, e))?;
    attributes.insert("id".to_string(), json!(base_id));
    attributes.insert("name".to_string(), json!(format!("{}{}", COPY_NAME_PREFIX, questionnaire.name)));
    Ok(envelope(Some(envelope_types::QUESTIONNAIRE_BASE), Value::Object(attributes)))
}

/// Version payload: the full section/question tree with every id stripped
pub fn questionnaire_version_payload(questionnaire: &Questionnaire) -> Result<Value, RemapError> {
    let invalid = |e: String| RemapError::invalid("questionnaire", &questionnaire.id, e);

    let mut attributes = build_payload(&questionnaire.raw, field_specs::QUESTIONNAIRE_VERSION_FIELDS).map_err(invalid)?;
    attributes.insert("draft".to_string(), json!(false));
    attributes.insert("version".to_string(), json!(questionnaire.version));

    let mut sections = Vec::with_capacity(questionnaire.sections.len());
    for section in &questionnaire.sections {
        let mut new_section = build_payload(&section.raw, field_specs::SECTION_FIELDS).map_err(invalid)?;
        let questions = section
            .questions
            .iter()
            .map(|q| build_payload(&q.raw, field_specs::QUESTION_FIELDS).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
        new_section.insert("questions".to_string(), Value::Array(questions));
        sections.push(Value::Object(new_section));
    }
    attributes.insert("sections".to_string(), Value::Array(sections));

    Ok(envelope(None, Value::Object(attributes)))
}

/// Overwrite the version of a version payload
pub fn set_payload_version(payload: &mut Value, version: u32) {
    payload["data"]["attributes"]["version"] = json!(version);
}

// ============================================================================
// Section pairing
// ============================================================================

/// Positional pairing of source sections (and their questions) with the
/// sections of the destination copy
#[derive(Debug, Clone, Default)]
pub struct SectionPairs {
    pairs: Vec<(Section, Section)>,
    id_map: HashMap<String, String>,
}

impl SectionPairs {
    pub fn pair(original: &Questionnaire, copy: &Questionnaire) -> Self {
        if original.section_count() != copy.section_count() {
            log::warn!(
                "Section count differs between source ({}) and copy ({}); pairing the first {}",
                original.section_count(),
                copy.section_count(),
                original.section_count().min(copy.section_count())
            );
        }

        let mut id_map = HashMap::new();
        let mut pairs = Vec::with_capacity(original.sections.len());

        for (orig, new) in original.sections.iter().zip(&copy.sections) {
            id_map.insert(orig.id.clone(), new.id.clone());

            if orig.questions.len() != new.questions.len() {
                log::warn!(
                    "Section '{}' has {} questions in the source and {} in the copy",
                    orig.title.as_deref().unwrap_or(&orig.id),
                    orig.questions.len(),
                    new.questions.len()
                );
            }
            for (oq, nq) in orig.questions.iter().zip(&new.questions) {
                id_map.insert(oq.id.clone(), nq.id.clone());
            }

            pairs.push((orig.clone(), new.clone()));
        }

        Self { pairs, id_map }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Section, Section)> {
        self.pairs.iter()
    }

    /// Destination id of a source section or question
    pub fn map_id(&self, source_id: &str) -> Option<&str> {
        self.id_map.get(source_id).map(String::as_str)
    }

    /// JSON record of the pairing, written as an artifact
    pub fn to_artifact(&self, new_questionnaire_id: &str) -> Value {
        let pairs: Vec<Value> = self
            .pairs
            .iter()
            .map(|(orig, copy)| json!({ "original": orig.raw, "copy": copy.raw }))
            .collect();
        json!({
            "old_new_questionnaire_map": pairs,
            "new_questionnaire_id": new_questionnaire_id,
        })
    }
}

// ============================================================================
// Triggers and actions
// ============================================================================

/// Destination question (and its section) a trigger must point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerTarget {
    pub question_id: String,
    pub section_id: String,
}

/// Find the copied question for a trigger's source question. Questions are
/// matched by text inside the paired section, then by position.
pub fn locate_trigger_target(trigger: &Trigger, pairs: &SectionPairs) -> Option<TriggerTarget> {
    let source_question_id = trigger.question_id.as_deref()?;

    pairs.iter().find_map(|(orig, copy)| {
        let index = orig.questions.iter().position(|q| q.id == source_question_id)?;
        let text = &orig.questions[index].text;

        let copied = copy
            .questions
            .iter()
            .find(|q| !text.is_empty() && &q.text == text)
            .or_else(|| copy.questions.get(index))?;

        Some(TriggerTarget {
            question_id: copied.id.clone(),
            section_id: copy.id.clone(),
        })
    })
}

pub fn trigger_payload(trigger: &Trigger, target: &TriggerTarget, questionnaire_id: &str) -> Result<Value, RemapError> {
    let trigger_type = trigger
        .trigger_type
        .as_deref()
        .ok_or_else(|| RemapError::invalid("trigger", &trigger.id, "missing trigger type"))?;
    let description = trigger
        .description
        .as_deref()
        .ok_or_else(|| RemapError::invalid("trigger", &trigger.id, "missing trigger description"))?;

    let mut data = json!({
        "questionnaire_id": questionnaire_id,
        "question_id": target.question_id,
        "section_id": target.section_id,
    });
    if let Some(options) = &trigger.options {
        data["options"] = options.clone();
    }

    Ok(envelope(
        None,
        json!({
            "type": trigger_type,
            "description": description,
            "data": data,
        }),
    ))
}

/// Link between a source trigger and the trigger created for it. `new_trigger_id`
/// is `None` when the destination reported the trigger as already existing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerLink {
    pub old_trigger_id: String,
    pub new_trigger_id: Option<String>,
}

/// Pair actions with the migrated source triggers they are attached to
pub fn find_matching_actions<'a>(actions: &'a [Action], links: &[TriggerLink]) -> Vec<(&'a Action, String)> {
    let mut matches = Vec::new();

    for action in actions {
        let matching: Vec<&String> = action
            .trigger_ids
            .iter()
            .filter(|tid| links.iter().any(|link| &&link.old_trigger_id == tid))
            .collect();

        if matching.is_empty() {
            continue;
        }

        if action.trigger_ids.len() > 1 {
            log::warn!("Multiple triggers found for action: {}", action.id);
        }

        for tid in matching {
            matches.push((action, tid.clone()));
        }
    }

    log::info!("Number of matched trigger-action pairs: {}", matches.len());
    matches
}

/// Action payload pointing at the new trigger, with question/section
/// references rewritten through the section pairing
pub fn action_payload(action: &Action, new_trigger_id: &str, pairs: &SectionPairs) -> Value {
    let mut data = action.data.clone();

    for key in ["question_id", "section_id"] {
        let Some(old_id) = data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string) else {
            continue;
        };
        let new_id = match pairs.map_id(&old_id) {
            Some(id) => id.to_string(),
            None => {
                log::warn!("Action {}: no copied counterpart for {} {}", action.id, key, old_id);
                String::new()
            }
        };
        data[key] = json!(new_id);
    }

    envelope(
        None,
        json!({
            "type": action.action_type.as_deref().unwrap_or_default(),
            "description": action.description.as_deref().unwrap_or_default(),
            "show_visual_alert": action.show_visual_alert,
            "data": data,
            "trigger_ids": [new_trigger_id],
        }),
    )
}
