//! Downloads resources from the source tenant
//!
//! Every fetched document is saved verbatim as an artifact before it is parsed.

use super::artifacts::{ArtifactStore, names};
use super::domain::{Action, CustomField, Questionnaire, Trigger};
use crate::api::constants::resources;
use crate::api::models::data_array;
use crate::api::{MediaType, TenantClient};
use anyhow::{Context, Result};
use serde_json::Value;

pub struct ResourceReader<'a> {
    client: &'a TenantClient,
    artifacts: &'a ArtifactStore,
}

impl<'a> ResourceReader<'a> {
    pub fn new(client: &'a TenantClient, artifacts: &'a ArtifactStore) -> Self {
        Self { client, artifacts }
    }

    async fn fetch_document(&self, url: &str, media_type: MediaType, artifact: &str) -> Result<Value> {
        let document = self
            .client
            .get(url, media_type)
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        self.artifacts.write(artifact, &document)?;
        Ok(document)
    }

    /// Fetch one questionnaire version with its full section/question tree
    pub async fn fetch_questionnaire(&self, id: &str, version: u32) -> Result<Questionnaire> {
        log::info!("Downloading questionnaire {} version {} from {}", id, version, self.client.tenant());

        let url = self.client.questionnaire_endpoint(id, version);
        let document = self
            .fetch_document(&url, MediaType::JsonApi, &names::src_questionnaire(id, version))
            .await?;

        let questionnaire = Questionnaire::from_document(&document)?;
        log::info!(
            "Questionnaire '{}' has {} sections and {} questions",
            questionnaire.name,
            questionnaire.section_count(),
            questionnaire.question_count()
        );
        Ok(questionnaire)
    }

    /// Ids of the questionnaire bases defined in the tenant
    pub async fn list_questionnaire_bases(&self) -> Result<Vec<String>> {
        let url = self.client.endpoint(resources::QUESTIONNAIRE_BASES);
        let document = self
            .client
            .get(&url, MediaType::JsonApi)
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let ids: Vec<String> = data_array(&document, "questionnaire bases")?
            .iter()
            .filter_map(crate::api::models::resource_id)
            .collect();
        log::info!("Found {} questionnaire bases in {}", ids.len(), self.client.tenant());
        Ok(ids)
    }

    pub async fn fetch_custom_fields(&self) -> Result<Vec<CustomField>> {
        let url = self.client.endpoint(resources::CUSTOM_FIELDS);
        let document = self.fetch_document(&url, MediaType::Json, names::SRC_CUSTOM_FIELDS).await?;
        let fields = CustomField::collection(&document)?;
        log::info!("Fetched {} custom fields", fields.len());
        Ok(fields)
    }

    pub async fn fetch_triggers(&self) -> Result<Vec<Trigger>> {
        let url = self.client.endpoint(resources::TRIGGERS);
        let document = self.fetch_document(&url, MediaType::Json, names::SRC_TRIGGERS).await?;
        let triggers = Trigger::collection(&document)?;
        log::info!("Fetched {} triggers", triggers.len());
        Ok(triggers)
    }

    pub async fn fetch_actions(&self) -> Result<Vec<Action>> {
        let url = self.client.endpoint(resources::TRIGGER_ACTIONS);
        let document = self.fetch_document(&url, MediaType::Json, names::SRC_TRIGGER_ACTIONS).await?;
        let actions = Action::collection(&document)?;
        log::info!("Fetched {} trigger actions", actions.len());
        Ok(actions)
    }
}
