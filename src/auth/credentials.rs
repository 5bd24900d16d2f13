use std::collections::HashMap;
use std::fmt;

/// Which tenant a set of credentials belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Destination,
}

impl Side {
    /// Prefix of this side's keys in the `.env` file
    pub fn prefix(&self) -> &'static str {
        match self {
            Side::Source => "SRC",
            Side::Destination => "DEST",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Destination => "destination",
        }
    }

    pub fn key(&self, suffix: &str) -> String {
        format!("{}_{}", self.prefix(), suffix)
    }

    /// Key under which an exchanged JWT is persisted
    pub fn jwt_key(&self) -> String {
        self.key("JWT_TOKEN")
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Credentials and location of one tenant
#[derive(Clone)]
pub struct TenantConfig {
    pub side: Side,
    pub api_token: Option<String>,
    pub jwt_token: Option<String>,
    pub tenant: String,
    pub base_path: String,
}

impl TenantConfig {
    /// Keys that must be present for this side
    pub fn required_keys(side: Side) -> Vec<String> {
        vec![side.key("TENANT"), side.key("BASE_PATH")]
    }

    /// Collect the keys missing for this side. An API token or a stored JWT
    /// satisfies the credential requirement.
    pub fn missing_keys(side: Side, vars: &HashMap<String, String>) -> Vec<String> {
        let mut missing: Vec<String> = Self::required_keys(side)
            .into_iter()
            .filter(|key| non_empty(vars, key).is_none())
            .collect();

        if non_empty(vars, &side.key("API_TOKEN")).is_none() && non_empty(vars, &side.jwt_key()).is_none() {
            missing.push(format!("{} (or {})", side.key("API_TOKEN"), side.jwt_key()));
        }

        missing
    }

    /// Build the config for one side. Callers validate with [`missing_keys`]
    /// first; absent values come back empty.
    ///
    /// [`missing_keys`]: TenantConfig::missing_keys
    pub fn from_vars(side: Side, vars: &HashMap<String, String>) -> TenantConfig {
        TenantConfig {
            side,
            api_token: non_empty(vars, &side.key("API_TOKEN")),
            jwt_token: non_empty(vars, &side.jwt_key()),
            tenant: non_empty(vars, &side.key("TENANT")).unwrap_or_default(),
            base_path: non_empty(vars, &side.key("BASE_PATH")).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantConfig")
            .field("side", &self.side)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("jwt_token", &self.jwt_token.as_ref().map(|_| "<redacted>"))
            .field("tenant", &self.tenant)
            .field("base_path", &self.base_path)
            .finish()
    }
}

pub(crate) fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
