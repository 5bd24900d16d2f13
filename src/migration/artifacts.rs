//! JSON artifacts written between migration steps

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Artifact base names
pub mod names {
    pub const SRC_CUSTOM_FIELDS: &str = "src-custom-fields";
    pub const CUSTOM_FIELD_UPLOAD_STATS: &str = "custom-field-upload-stats";
    pub const QUESTIONNAIRE_COPY_RESULT: &str = "questionnaire-copy-result";
    pub const SRC_TRIGGERS: &str = "src-triggers";
    pub const TRIGGER_MAPPING: &str = "trigger-mapping";
    pub const SRC_TRIGGER_ACTIONS: &str = "src-trigger-actions";
    pub const CREATED_TRIGGER_ACTIONS: &str = "created-trigger-actions";
    pub const MIGRATION_SUMMARY: &str = "migration-summary";

    pub fn src_questionnaire(id: &str, version: u32) -> String {
        format!("src-questionnaire-id-{}-ver-{}", id, version)
    }
}

/// Directory of pretty-printed JSON files
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an artifact; a `.json` extension is always enforced
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file_name = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{}.json", name)
        };
        self.dir.join(file_name)
    }

    pub fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory {}", self.dir.display()))?;

        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(value).context("Failed to serialize artifact")?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!("Saved {}", path.display());
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<Value> {
        let path = self.path_for(name);
        let contents = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_extension_enforced() {
        let store = ArtifactStore::new("out");
        assert_eq!(store.path_for("src-triggers"), PathBuf::from("out/src-triggers.json"));
        assert_eq!(store.path_for("src-triggers.json"), PathBuf::from("out/src-triggers.json"));
        assert_eq!(names::src_questionnaire("RISK", 4), "src-questionnaire-id-RISK-ver-4");
    }

    #[test]
    fn test_write_creates_directory_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested").join("output"));

        let path = store.write(names::SRC_TRIGGERS, &json!({ "data": [{ "id": "t1" }] })).unwrap();
        assert!(path.is_file());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\n  \"data\""));

        let value = store.read(names::SRC_TRIGGERS).unwrap();
        assert_eq!(value["data"][0]["id"], "t1");
    }

    #[test]
    fn test_read_missing_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.read("nothing-here").is_err());
    }
}
