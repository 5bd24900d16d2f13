//! API constants and endpoint builders for the platform's v2 REST API

/// Platform API version
pub const API_VERSION: &str = "v2";

/// Base API path
pub const API_BASE_PATH: &str = "/api";

/// Full API path with version
pub fn api_path() -> String {
    format!("{}/{}", API_BASE_PATH, API_VERSION)
}

/// Token exchange endpoint (not tenant scoped)
pub const AUTH_EXCHANGE_PATH: &str = "/auth/exchange";

/// Request headers
pub mod headers {
    /// Plain JSON, used by custom fields, triggers and actions
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// JSON:API media type, used by the questionnaire endpoints
    pub const CONTENT_TYPE_JSON_API: &str = "application/vnd.api+json";

    /// Correlation header attached to every request
    pub const X_CORRELATION_ID: &str = "X-Correlation-Id";
}

/// Tenant-scoped resource collections
pub mod resources {
    pub const QUESTIONNAIRES: &str = "questionnaires";
    pub const QUESTIONNAIRE_BASES: &str = "questionnaire_bases";
    pub const CUSTOM_FIELDS: &str = "custom_fields";
    pub const TRIGGERS: &str = "triggers";
    pub const TRIGGER_ACTIONS: &str = "trigger_actions";
}

/// `data.type` values the create endpoints expect
pub mod envelope_types {
    pub const CUSTOM_FIELDS: &str = "custom_fields";
    pub const QUESTIONNAIRE_BASE: &str = "resource-type";
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Build the token exchange URL
pub fn auth_endpoint(base_url: &str) -> String {
    format!("{}{}", trim_base(base_url), AUTH_EXCHANGE_PATH)
}

/// Build a tenant collection URL, e.g. `{base}/api/v2/{tenant}/triggers`
pub fn tenant_endpoint(base_url: &str, tenant: &str, resource: &str) -> String {
    format!("{}{}/{}/{}", trim_base(base_url), api_path(), tenant, resource)
}

/// Build the URL of one questionnaire version, addressed as `{id}+{version}`
pub fn questionnaire_endpoint(base_url: &str, tenant: &str, id: &str, version: u32) -> String {
    format!(
        "{}/{}+{}",
        tenant_endpoint(base_url, tenant, resources::QUESTIONNAIRES),
        urlencoding::encode(id),
        version
    )
}

/// Build the URL used to post a new version on top of a questionnaire base
pub fn questionnaire_versions_endpoint(base_url: &str, tenant: &str, base_id: &str) -> String {
    format!(
        "{}/{}/versions",
        tenant_endpoint(base_url, tenant, resources::QUESTIONNAIRE_BASES),
        urlencoding::encode(base_id)
    )
}
