use super::constants::{self, headers};
use super::error::ApiError;
use super::models::MediaType;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

/// Build the shared HTTP client. Its timeouts are the only timeout handling
/// the tool does.
pub fn build_http_client() -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("resource-cloner/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|source| ApiError::Transport {
            url: "<client builder>".to_string(),
            source,
        })
}

/// Authenticated client for one tenant
#[derive(Clone)]
pub struct TenantClient {
    base_url: String,
    tenant: String,
    http_client: reqwest::Client,
    access_token: String,
}

impl TenantClient {
    pub fn new(base_url: impl Into<String>, tenant: impl Into<String>, access_token: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self::with_custom_client(base_url, tenant, access_token, build_http_client()?))
    }

    /// Create a new client reusing an existing HTTP client
    pub fn with_custom_client(
        base_url: impl Into<String>,
        tenant: impl Into<String>,
        access_token: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            tenant: tenant.into(),
            http_client,
            access_token: access_token.into(),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a tenant collection
    pub fn endpoint(&self, resource: &str) -> String {
        constants::tenant_endpoint(&self.base_url, &self.tenant, resource)
    }

    /// URL of a questionnaire version
    pub fn questionnaire_endpoint(&self, id: &str, version: u32) -> String {
        constants::questionnaire_endpoint(&self.base_url, &self.tenant, id, version)
    }

    /// URL for posting versions to a questionnaire base
    pub fn questionnaire_versions_endpoint(&self, base_id: &str) -> String {
        constants::questionnaire_versions_endpoint(&self.base_url, &self.tenant, base_id)
    }

    /// GET a document. Any non-2xx status is an error.
    pub async fn get(&self, url: &str, media_type: MediaType) -> Result<Value, ApiError> {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        log::debug!("GET {} [{}]", url, correlation_id);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, media_type.as_str())
            .header(headers::X_CORRELATION_ID, &correlation_id)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        self.parse_response("GET", url, response).await
    }

    /// POST a document. Any non-2xx status is an error; callers that treat
    /// 422 as "already exists" check [`ApiError::is_conflict`].
    pub async fn post(&self, url: &str, body: &Value, media_type: MediaType) -> Result<Value, ApiError> {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        log::debug!("POST {} [{}]", url, correlation_id);

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.access_token)
            .header(CONTENT_TYPE, media_type.as_str())
            .header(ACCEPT, media_type.as_str())
            .header(headers::X_CORRELATION_ID, &correlation_id)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        self.parse_response("POST", url, response).await
    }

    /// Turn a response into its JSON body, or a `Status` error
    async fn parse_response(&self, method: &'static str, url: &str, response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        log::debug!("{} {} -> {}", method, url, status);

        let text = response.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::malformed(format!("{} {}", method, url), e.to_string()))
    }
}
