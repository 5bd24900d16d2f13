use super::credentials::TenantConfig;
use crate::api::{ApiError, build_http_client};
use crate::api::constants;
use crate::config::env_file;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::{Value, json};
use std::path::PathBuf;

/// Exchanges a tenant's API token for a short-lived JWT
///
/// One request per call, no refresh. A run that outlives the token has to be
/// restarted.
pub struct TokenProvider {
    client: Client,
    env_file: Option<PathBuf>,
}

impl TokenProvider {
    pub fn new() -> Result<Self, ApiError> {
        Ok(Self::with_client(build_http_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client, env_file: None }
    }

    /// Write exchanged tokens back to this `.env` file
    pub fn persist_to(mut self, env_file: impl Into<PathBuf>) -> Self {
        self.env_file = Some(env_file.into());
        self
    }

    /// Token to use for a tenant: exchange the API token when one is
    /// configured, otherwise fall back to the stored JWT.
    pub async fn token_for(&self, config: &TenantConfig) -> Result<String, ApiError> {
        if config.api_token.is_some() {
            return self.exchange(config).await;
        }

        match &config.jwt_token {
            Some(jwt) => {
                info!("Using stored JWT for {} tenant {}", config.side, config.tenant);
                Ok(jwt.clone())
            }
            None => Err(ApiError::Auth {
                tenant: config.tenant.clone(),
                reason: format!("neither {} nor {} is set", config.side.key("API_TOKEN"), config.side.jwt_key()),
            }),
        }
    }

    /// POST `{base}/auth/exchange` and return the `access_token`
    pub async fn exchange(&self, config: &TenantConfig) -> Result<String, ApiError> {
        let api_token = config.api_token.as_deref().ok_or_else(|| ApiError::Auth {
            tenant: config.tenant.clone(),
            reason: format!("{} is not set", config.side.key("API_TOKEN")),
        })?;

        let url = constants::auth_endpoint(&config.base_path);
        debug!("Retrieving JWT for {} tenant {} from {}", config.side, config.tenant, url);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "api_token": api_token,
                "tenant": config.tenant,
            }))
            .send()
            .await
            .map_err(|source| ApiError::Transport { url: url.clone(), source })?;

        let status = response.status();
        debug!("Token request status: {}", status);

        let text = response
            .text()
            .await
            .map_err(|source| ApiError::Transport { url: url.clone(), source })?;

        if !status.is_success() {
            return Err(ApiError::Auth {
                tenant: config.tenant.clone(),
                reason: format!("token exchange returned {}: {}", status, text),
            });
        }

        let token_data: Value = serde_json::from_str(&text).map_err(|e| ApiError::malformed(&url, e.to_string()))?;

        let token = token_data
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Auth {
                tenant: config.tenant.clone(),
                reason: "no access_token in exchange response".to_string(),
            })?
            .to_string();

        info!("Successfully retrieved token for {} tenant {}", config.side, config.tenant);
        self.persist(config, &token);

        Ok(token)
    }

    fn persist(&self, config: &TenantConfig, token: &str) {
        let Some(path) = &self.env_file else {
            return;
        };

        match env_file::set_key(path, &config.side.jwt_key(), token) {
            Ok(()) => debug!("Stored {} in {}", config.side.jwt_key(), path.display()),
            Err(e) => warn!("Failed to write {} to {}: {:#}", config.side.jwt_key(), path.display(), e),
        }
    }
}
