//! Step-by-step migration from the source tenant to the destination tenant
//!
//! Steps run strictly in order, one request at a time. The first failing step
//! stops the run; resources created by earlier steps are left in place.

use super::artifacts::{ArtifactStore, names};
use super::domain::{Questionnaire, Trigger};
use super::reader::ResourceReader;
use super::remap::{self, SectionPairs, TriggerLink};
use super::writer::{ResourceWriter, UploadStats};
use crate::api::{ApiError, TenantClient, build_http_client};
use crate::auth::{Side, TokenProvider};
use crate::config::EnvConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Instant;
use thiserror::Error;

/// Migration steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationStep {
    Authenticating,
    CopyingCustomFields,
    DownloadingQuestionnaire,
    UploadingQuestionnaire,
    CopyingTriggers,
    CopyingActions,
}

impl MigrationStep {
    pub const ALL: [MigrationStep; 6] = [
        MigrationStep::Authenticating,
        MigrationStep::CopyingCustomFields,
        MigrationStep::DownloadingQuestionnaire,
        MigrationStep::UploadingQuestionnaire,
        MigrationStep::CopyingTriggers,
        MigrationStep::CopyingActions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MigrationStep::Authenticating => "Authenticating",
            MigrationStep::CopyingCustomFields => "Copying custom fields",
            MigrationStep::DownloadingQuestionnaire => "Downloading questionnaire",
            MigrationStep::UploadingQuestionnaire => "Uploading questionnaire",
            MigrationStep::CopyingTriggers => "Copying triggers",
            MigrationStep::CopyingActions => "Copying trigger actions",
        }
    }

    /// 1-based position
    pub fn number(&self) -> usize {
        match self {
            MigrationStep::Authenticating => 1,
            MigrationStep::CopyingCustomFields => 2,
            MigrationStep::DownloadingQuestionnaire => 3,
            MigrationStep::UploadingQuestionnaire => 4,
            MigrationStep::CopyingTriggers => 5,
            MigrationStep::CopyingActions => 6,
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("step {}/{} ({}) failed: {message}", .step.number(), MigrationStep::ALL.len(), .step)]
pub struct StepError {
    pub step: MigrationStep,
    pub message: String,
}

impl StepError {
    fn new(step: MigrationStep, error: anyhow::Error) -> Self {
        log::error!("{} failed: {:#}", step, error);
        Self {
            step,
            message: format!("{:#}", error),
        }
    }
}

/// Receives progress notifications while the migration runs
pub trait StepObserver {
    fn step_started(&mut self, _step: MigrationStep) {}

    fn step_finished(&mut self, _step: MigrationStep, _summary: &str) {}
}

impl StepObserver for () {}

/// Outcome of a complete run, also written as the summary artifact
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub source_questionnaire_id: String,
    pub destination_questionnaire_id: String,
    pub sections: usize,
    pub questions: usize,
    pub custom_fields: UploadStats,
    pub triggers: UploadStats,
    pub actions: UploadStats,
    pub trigger_mapping: Vec<TriggerLink>,
}

/// Runs the migration described by an [`EnvConfig`]
pub struct Orchestrator {
    config: EnvConfig,
    http_client: reqwest::Client,
    tokens: TokenProvider,
    artifacts: ArtifactStore,
}

/// Clients for both tenants after authentication
struct Tenants {
    source: TenantClient,
    destination: TenantClient,
}

struct QuestionnaireCopy {
    copy: Questionnaire,
    pairs: SectionPairs,
}

impl Orchestrator {
    pub fn new(config: EnvConfig) -> Result<Self, ApiError> {
        Ok(Self::with_client(config, build_http_client()?))
    }

    pub fn with_client(config: EnvConfig, http_client: reqwest::Client) -> Self {
        let mut tokens = TokenProvider::with_client(http_client.clone());
        if config.env_path.is_file() {
            tokens = tokens.persist_to(&config.env_path);
        }
        let artifacts = ArtifactStore::new(&config.output_dir);

        Self {
            config,
            http_client,
            tokens,
            artifacts,
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Run every step in order
    pub async fn run(&self, observer: &mut dyn StepObserver) -> Result<MigrationReport, StepError> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        log::info!(
            "Migrating questionnaire {} version {} from {} to {}",
            self.config.questionnaire.id,
            self.config.questionnaire.version,
            self.config.source.tenant,
            self.config.destination.tenant
        );

        // Step 1: Authenticate against both tenants
        observer.step_started(MigrationStep::Authenticating);
        let tenants = match self.authenticate().await {
            Ok(tenants) => tenants,
            Err(e) => return Err(StepError::new(MigrationStep::Authenticating, e)),
        };
        observer.step_finished(MigrationStep::Authenticating, "tokens obtained for both tenants");

        // Step 2: Custom fields
        observer.step_started(MigrationStep::CopyingCustomFields);
        let custom_fields = match self.copy_custom_fields(&tenants).await {
            Ok(stats) => stats,
            Err(e) => return Err(StepError::new(MigrationStep::CopyingCustomFields, e)),
        };
        observer.step_finished(
            MigrationStep::CopyingCustomFields,
            &format!("{} created, {} skipped", custom_fields.created, custom_fields.skipped),
        );

        // Step 3: Download the questionnaire tree
        observer.step_started(MigrationStep::DownloadingQuestionnaire);
        let source = match self.download_questionnaire(&tenants).await {
            Ok(questionnaire) => questionnaire,
            Err(e) => return Err(StepError::new(MigrationStep::DownloadingQuestionnaire, e)),
        };
        observer.step_finished(
            MigrationStep::DownloadingQuestionnaire,
            &format!("{} sections, {} questions", source.section_count(), source.question_count()),
        );

        // Step 4: Upload base and version
        observer.step_started(MigrationStep::UploadingQuestionnaire);
        let copied = match self.upload_questionnaire(&tenants, &source).await {
            Ok(copied) => copied,
            Err(e) => return Err(StepError::new(MigrationStep::UploadingQuestionnaire, e)),
        };
        observer.step_finished(MigrationStep::UploadingQuestionnaire, &format!("created {}", copied.copy.id));

        // Step 5: Triggers
        observer.step_started(MigrationStep::CopyingTriggers);
        let (trigger_mapping, triggers) = match self.copy_triggers(&tenants, &copied).await {
            Ok(result) => result,
            Err(e) => return Err(StepError::new(MigrationStep::CopyingTriggers, e)),
        };
        observer.step_finished(
            MigrationStep::CopyingTriggers,
            &format!("{} created, {} skipped", triggers.created, triggers.skipped),
        );

        // Step 6: Actions
        observer.step_started(MigrationStep::CopyingActions);
        let actions = match self.copy_actions(&tenants, &copied.pairs, &trigger_mapping).await {
            Ok(stats) => stats,
            Err(e) => return Err(StepError::new(MigrationStep::CopyingActions, e)),
        };
        observer.step_finished(
            MigrationStep::CopyingActions,
            &format!("{} created, {} skipped", actions.created, actions.skipped),
        );

        let report = MigrationReport {
            started_at,
            finished_at: Utc::now(),
            elapsed_ms: u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX),
            source_questionnaire_id: source.id.clone(),
            destination_questionnaire_id: copied.copy.id.clone(),
            sections: copied.copy.section_count(),
            questions: copied.copy.question_count(),
            custom_fields,
            triggers,
            actions,
            trigger_mapping,
        };

        if let Err(e) = self.artifacts.write(names::MIGRATION_SUMMARY, &report) {
            log::warn!("Failed to write migration summary: {:#}", e);
        }

        log::info!(
            "Migration complete in {}ms: {} triggers and {} actions created",
            report.elapsed_ms,
            report.triggers.created,
            report.actions.created
        );
        Ok(report)
    }

    async fn authenticate(&self) -> Result<Tenants> {
        let mut clients = Vec::with_capacity(2);

        for side in [Side::Source, Side::Destination] {
            let tenant = self.config.tenant(side);
            let token = self
                .tokens
                .token_for(tenant)
                .await
                .with_context(|| format!("Failed to authenticate against {} tenant {}", side, tenant.tenant))?;
            clients.push(TenantClient::with_custom_client(
                &tenant.base_path,
                &tenant.tenant,
                token,
                self.http_client.clone(),
            ));
        }

        let destination = clients.pop().context("destination client missing")?;
        let source = clients.pop().context("source client missing")?;
        Ok(Tenants { source, destination })
    }

    async fn copy_custom_fields(&self, tenants: &Tenants) -> Result<UploadStats> {
        let fields = ResourceReader::new(&tenants.source, &self.artifacts).fetch_custom_fields().await?;
        let stats = ResourceWriter::new(&tenants.destination).create_custom_fields(&fields).await?;
        self.artifacts.write(names::CUSTOM_FIELD_UPLOAD_STATS, &stats)?;
        Ok(stats)
    }

    async fn download_questionnaire(&self, tenants: &Tenants) -> Result<Questionnaire> {
        let reader = ResourceReader::new(&tenants.source, &self.artifacts);
        let wanted = &self.config.questionnaire;

        // The listing is informational only
        match reader.list_questionnaire_bases().await {
            Ok(bases) if !bases.iter().any(|id| id == &wanted.id) => {
                log::warn!("Questionnaire base {} not listed in {}", wanted.id, tenants.source.tenant());
            }
            Ok(_) => {}
            Err(e) => log::warn!("Could not list questionnaire bases: {:#}", e),
        }

        reader.fetch_questionnaire(&wanted.id, wanted.version).await?;

        // Continue from the saved artifact so later steps see exactly what was stored
        let artifact = names::src_questionnaire(&wanted.id, wanted.version);
        let document = self.artifacts.read(&artifact)?;
        Questionnaire::from_document(&document).with_context(|| format!("Failed to parse artifact {}", artifact))
    }

    async fn upload_questionnaire(&self, tenants: &Tenants, source: &Questionnaire) -> Result<QuestionnaireCopy> {
        let writer = ResourceWriter::new(&tenants.destination);

        let requested_base_id = remap::copy_base_id(&self.config.questionnaire.id);
        let base_payload = remap::questionnaire_base_payload(source, &requested_base_id)?;
        let base_id = writer.create_questionnaire_base(&base_payload, &requested_base_id).await?;

        let version_payload = remap::questionnaire_version_payload(source)?;
        let copy = writer
            .create_questionnaire_version(&base_id, &version_payload, source.version)
            .await?;

        let expected = remap::expected_copy_id(&base_id, 1);
        if copy.id != expected {
            log::info!("Destination assigned id {} (first version would be {})", copy.id, expected);
        }

        if copy.section_count() != source.section_count() || copy.question_count() != source.question_count() {
            log::warn!(
                "Copy structure differs: source {} sections/{} questions, copy {} sections/{} questions",
                source.section_count(),
                source.question_count(),
                copy.section_count(),
                copy.question_count()
            );
        }

        let pairs = SectionPairs::pair(source, &copy);
        self.artifacts
            .write(names::QUESTIONNAIRE_COPY_RESULT, &pairs.to_artifact(&copy.id))?;

        Ok(QuestionnaireCopy { copy, pairs })
    }

    async fn copy_triggers(&self, tenants: &Tenants, copied: &QuestionnaireCopy) -> Result<(Vec<TriggerLink>, UploadStats)> {
        let triggers: Vec<Trigger> = ResourceReader::new(&tenants.source, &self.artifacts).fetch_triggers().await?;
        let writer = ResourceWriter::new(&tenants.destination);

        let mut links = Vec::new();
        let mut stats = UploadStats::default();

        for trigger in &triggers {
            let Some(target) = remap::locate_trigger_target(trigger, &copied.pairs) else {
                log::warn!("Skipped trigger (no matching section): {}", trigger.id);
                continue;
            };

            let payload = remap::trigger_payload(trigger, &target, &copied.copy.id)?;
            let new_trigger_id = writer.create_trigger(&payload).await?;
            match new_trigger_id {
                Some(_) => stats.created += 1,
                None => stats.skipped += 1,
            }

            links.push(TriggerLink {
                old_trigger_id: trigger.id.clone(),
                new_trigger_id,
            });
        }

        log::info!("Migrated {} of {} source triggers", links.len(), triggers.len());
        self.artifacts.write(names::TRIGGER_MAPPING, &links)?;
        Ok((links, stats))
    }

    async fn copy_actions(&self, tenants: &Tenants, pairs: &SectionPairs, links: &[TriggerLink]) -> Result<UploadStats> {
        let actions = ResourceReader::new(&tenants.source, &self.artifacts).fetch_actions().await?;
        let writer = ResourceWriter::new(&tenants.destination);

        let mut created: Vec<Value> = Vec::new();
        let mut stats = UploadStats::default();

        for (action, old_trigger_id) in remap::find_matching_actions(&actions, links) {
            let new_trigger_id = links
                .iter()
                .find(|link| link.old_trigger_id == old_trigger_id)
                .and_then(|link| link.new_trigger_id.as_deref());

            let Some(new_trigger_id) = new_trigger_id else {
                log::warn!("No new trigger for {}, skipping action {}", old_trigger_id, action.id);
                stats.skipped += 1;
                continue;
            };

            let payload = remap::action_payload(action, new_trigger_id, pairs);
            match writer.create_action(&payload).await? {
                Some(response) => {
                    created.push(response);
                    stats.created += 1;
                }
                None => stats.skipped += 1,
            }
        }

        self.artifacts.write(names::CREATED_TRIGGER_ACTIONS, &created)?;
        Ok(stats)
    }
}
