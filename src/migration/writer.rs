//! Creates resources in the destination tenant
//!
//! HTTP 422 on a create means the resource already exists: it is logged and
//! counted as skipped. Every other failure is returned to the caller, and
//! resources created before it stay in place.

use super::domain::{CustomField, Questionnaire};
use super::remap::{self, custom_field_payload};
use crate::api::constants::resources;
use crate::api::models::document_id;
use crate::api::{ApiError, MediaType, TenantClient};
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::Value;

/// Outcome of a batch of creates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadStats {
    pub created: usize,
    pub skipped: usize,
}

impl UploadStats {
    pub fn total(&self) -> usize {
        self.created + self.skipped
    }
}

pub struct ResourceWriter<'a> {
    client: &'a TenantClient,
}

impl<'a> ResourceWriter<'a> {
    pub fn new(client: &'a TenantClient) -> Self {
        Self { client }
    }

    /// POST a payload, mapping 422 to `Ok(None)`
    async fn create(&self, url: &str, payload: &Value, media_type: MediaType) -> Result<Option<Value>, ApiError> {
        match self.client.post(url, payload, media_type).await {
            Ok(response) => Ok(Some(response)),
            Err(e) if e.is_conflict() => {
                log::debug!("{}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn create_custom_fields(&self, fields: &[CustomField]) -> Result<UploadStats> {
        let url = self.client.endpoint(resources::CUSTOM_FIELDS);
        let mut stats = UploadStats::default();

        for field in fields {
            let payload = custom_field_payload(field)?;
            match self.create(&url, &payload, MediaType::Json).await? {
                Some(_) => {
                    log::info!("Custom field '{}' created", field.name);
                    stats.created += 1;
                }
                None => {
                    log::info!("Custom field '{}' already exists, skipping", field.name);
                    stats.skipped += 1;
                }
            }
        }

        log::info!("Custom fields: {} created, {} skipped", stats.created, stats.skipped);
        Ok(stats)
    }

    /// Create the questionnaire base, returning its id. When the base already
    /// exists the requested id is reused.
    pub async fn create_questionnaire_base(&self, payload: &Value, requested_id: &str) -> Result<String> {
        let url = self.client.endpoint(resources::QUESTIONNAIRE_BASES);

        match self.create(&url, payload, MediaType::JsonApi).await? {
            Some(response) => {
                let id = document_id(&response).unwrap_or_else(|| requested_id.to_string());
                log::info!("Questionnaire base created with id {}", id);
                Ok(id)
            }
            None => {
                log::warn!("Questionnaire base {} already exists, adding a version to it", requested_id);
                Ok(requested_id.to_string())
            }
        }
    }

    /// Post a version on top of a base. A 422 is a version conflict and is
    /// retried exactly once with the next version number.
    pub async fn create_questionnaire_version(&self, base_id: &str, payload: &Value, version: u32) -> Result<Questionnaire> {
        let url = self.client.questionnaire_versions_endpoint(base_id);
        let mut payload = payload.clone();
        remap::set_payload_version(&mut payload, version);

        let response = match self.client.post(&url, &payload, MediaType::JsonApi).await {
            Ok(response) => response,
            Err(e) if e.is_conflict() => {
                let next = version
                    .checked_add(1)
                    .ok_or_else(|| anyhow!("Version {} of {} conflicts and cannot be incremented", version, base_id))?;
                log::warn!("Version {} of {} conflicts, retrying with version {}", version, base_id, next);
                remap::set_payload_version(&mut payload, next);
                self.client
                    .post(&url, &payload, MediaType::JsonApi)
                    .await
                    .with_context(|| format!("Retry with version {} failed", next))?
            }
            Err(e) => return Err(e.into()),
        };

        let created = Questionnaire::from_document(&response).context("Unexpected questionnaire creation response")?;
        log::info!(
            "Questionnaire version created: {} ({} sections, {} questions)",
            created.id,
            created.section_count(),
            created.question_count()
        );
        Ok(created)
    }

    /// Create a trigger, returning its id, or `None` when it already exists
    pub async fn create_trigger(&self, payload: &Value) -> Result<Option<String>> {
        let url = self.client.endpoint(resources::TRIGGERS);

        match self.create(&url, payload, MediaType::Json).await? {
            Some(response) => {
                let id = document_id(&response).ok_or_else(|| anyhow!("Trigger creation response carries no id"))?;
                log::info!("Trigger created with id {}", id);
                Ok(Some(id))
            }
            None => {
                log::warn!("Trigger already exists, skipping");
                Ok(None)
            }
        }
    }

    /// Create a trigger action, returning the created document
    pub async fn create_action(&self, payload: &Value) -> Result<Option<Value>> {
        let url = self.client.endpoint(resources::TRIGGER_ACTIONS);

        let created = self.create(&url, payload, MediaType::Json).await?;
        match &created {
            Some(response) => log::info!(
                "Trigger action created with id {}",
                document_id(response).unwrap_or_else(|| "<none>".to_string())
            ),
            None => log::warn!("Trigger action already exists, skipping"),
        }
        Ok(created)
    }
}
