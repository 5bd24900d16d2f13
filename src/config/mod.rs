//! Environment-driven configuration
//!
//! Everything the tool needs comes from a `.env` file in the working directory
//! (or the path given with `--env-file`), with the process environment taking
//! precedence for the same keys:
//! - source and destination tenant credentials and base URLs
//! - the questionnaire id and version to copy
//! - the artifact output directory

pub mod env_file;

use crate::auth::credentials::non_empty;
use crate::auth::{Side, TenantConfig};
use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

pub const QUESTIONNAIRE_ID_KEY: &str = "SRC_QUESTIONNAIRE_ID";
pub const QUESTIONNAIRE_VERSION_KEY: &str = "SRC_QUESTIONNAIRE_VERSION";
pub const OUTPUT_DIR_KEY: &str = "RESOURCE_CLONER_OUTPUT_DIR";

/// Every key the tool reads
pub const KNOWN_KEYS: &[&str] = &[
    "SRC_API_TOKEN",
    "SRC_JWT_TOKEN",
    "SRC_TENANT",
    "SRC_BASE_PATH",
    QUESTIONNAIRE_ID_KEY,
    QUESTIONNAIRE_VERSION_KEY,
    "DEST_API_TOKEN",
    "DEST_JWT_TOKEN",
    "DEST_TENANT",
    "DEST_BASE_PATH",
    OUTPUT_DIR_KEY,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("missing required configuration: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue { key: String, value: String, reason: String },
}

/// The questionnaire selected for copying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuestionnaire {
    pub id: String,
    pub version: u32,
}

/// Full run configuration
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub env_path: PathBuf,
    pub source: TenantConfig,
    pub destination: TenantConfig,
    pub questionnaire: SourceQuestionnaire,
    pub output_dir: PathBuf,
}

impl EnvConfig {
    /// Load from a `.env` file (if it exists), overlaid with process env
    pub fn load(env_path: &Path) -> Result<Self> {
        let mut vars = HashMap::new();

        if env_path.exists() {
            info!("Loading configuration from {}", env_path.display());
            let iter = dotenvy::from_path_iter(env_path).map_err(|source| ConfigError::EnvFile {
                path: env_path.to_path_buf(),
                source,
            })?;
            for item in iter {
                let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                    path: env_path.to_path_buf(),
                    source,
                })?;
                vars.insert(key, value);
            }
        } else {
            info!("No env file at {}, using process environment only", env_path.display());
        }

        overlay_env(&mut vars, |key| std::env::var(key).ok());

        Self::from_vars(env_path, &vars).with_context(|| format!("invalid configuration in {}", env_path.display()))
    }

    /// Validate and assemble the configuration from raw key/value pairs
    pub fn from_vars(env_path: &Path, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut missing = TenantConfig::missing_keys(Side::Source, vars);
        for key in [QUESTIONNAIRE_ID_KEY, QUESTIONNAIRE_VERSION_KEY] {
            if non_empty(vars, key).is_none() {
                missing.push(key.to_string());
            }
        }
        missing.extend(TenantConfig::missing_keys(Side::Destination, vars));

        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys(missing));
        }

        let raw_version = non_empty(vars, QUESTIONNAIRE_VERSION_KEY).unwrap_or_default();
        let version = raw_version.parse::<u32>().map_err(|e| ConfigError::InvalidValue {
            key: QUESTIONNAIRE_VERSION_KEY.to_string(),
            value: raw_version.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            env_path: env_path.to_path_buf(),
            source: TenantConfig::from_vars(Side::Source, vars),
            destination: TenantConfig::from_vars(Side::Destination, vars),
            questionnaire: SourceQuestionnaire {
                id: non_empty(vars, QUESTIONNAIRE_ID_KEY).unwrap_or_default(),
                version,
            },
            output_dir: non_empty(vars, OUTPUT_DIR_KEY)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        })
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn tenant(&self, side: Side) -> &TenantConfig {
        match side {
            Side::Source => &self.source,
            Side::Destination => &self.destination,
        }
    }
}

/// Overlay known keys from the environment. Blank values never replace a
/// value read from the file.
fn overlay_env(vars: &mut HashMap<String, String>, lookup: impl Fn(&str) -> Option<String>) {
    for key in KNOWN_KEYS {
        let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        debug!("{} taken from process environment", key);
        vars.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_vars() -> HashMap<String, String> {
        [
            ("SRC_API_TOKEN", "src-api"),
            ("SRC_TENANT", "old-co"),
            ("SRC_BASE_PATH", "https://api.example.com"),
            ("SRC_QUESTIONNAIRE_ID", "EU-AI-ACT"),
            ("SRC_QUESTIONNAIRE_VERSION", "3"),
            ("DEST_API_TOKEN", "dest-api"),
            ("DEST_TENANT", "new-co"),
            ("DEST_BASE_PATH", "https://api.example.com"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_complete_config() {
        let config = EnvConfig::from_vars(Path::new(".env"), &complete_vars()).unwrap();
        assert_eq!(config.source.tenant, "old-co");
        assert_eq!(config.destination.tenant, "new-co");
        assert_eq!(config.questionnaire, SourceQuestionnaire { id: "EU-AI-ACT".to_string(), version: 3 });
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.tenant(Side::Destination).api_token.as_deref(), Some("dest-api"));
    }

    #[test]
    fn test_reports_every_missing_key() {
        let mut vars = complete_vars();
        vars.remove("SRC_QUESTIONNAIRE_ID");
        vars.remove("DEST_BASE_PATH");

        match EnvConfig::from_vars(Path::new(".env"), &vars) {
            Err(ConfigError::MissingKeys(keys)) => {
                assert_eq!(keys, vec!["SRC_QUESTIONNAIRE_ID".to_string(), "DEST_BASE_PATH".to_string()]);
            }
            other => panic!("expected missing keys, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_numeric_version() {
        let mut vars = complete_vars();
        vars.insert("SRC_QUESTIONNAIRE_VERSION".to_string(), "latest".to_string());
        assert!(matches!(
            EnvConfig::from_vars(Path::new(".env"), &vars),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_blank_environment_value_keeps_file_value() {
        let mut vars = complete_vars();
        vars.insert("SRC_JWT_TOKEN".to_string(), "from-file".to_string());

        overlay_env(&mut vars, |key| match key {
            "SRC_JWT_TOKEN" => Some(String::new()),
            "DEST_TENANT" => Some("  ".to_string()),
            "SRC_TENANT" => Some("env-co".to_string()),
            _ => None,
        });

        assert_eq!(vars["SRC_JWT_TOKEN"], "from-file");
        assert_eq!(vars["DEST_TENANT"], "new-co");
        assert_eq!(vars["SRC_TENANT"], "env-co");
    }

    #[test]
    fn test_load_reads_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let contents: String = complete_vars()
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, v))
            .collect::<String>()
            + "RESOURCE_CLONER_OUTPUT_DIR=artifacts\n";
        std::fs::write(&path, contents).unwrap();

        let config = EnvConfig::load(&path).unwrap();
        assert_eq!(config.env_path, path);
        assert_eq!(config.questionnaire.version, 3);
    }
}
