// Copyright (c) 2025 - Cowboy AI, Inc.
//! Credential and per-invocation configuration
//!
//! The credentials file is JSON:
//!
//! ```json
//! {
//!   "username": "admin",
//!   "password": "secret",
//!   "tenant_name": "demo",
//!   "auth_url": "http://keystone:5000/v2.0",
//!   "region": "RegionOne"
//! }
//! ```
//!
//! Its location is decided once at the process boundary by
//! [`CredentialSource::from_env`] and then injected.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{ProvisionerError, ProvisionerResult};

/// Environment variable overriding the credentials file location
pub const CONFIG_PATH_ENV: &str = "KEYSTONE_CONFIG_PATH";

/// File name looked up in the home directory when the variable is unset
pub const DEFAULT_CONFIG_FILE: &str = "keystone_config.json";

/// Identity credentials for the cloud provider
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CloudCredentials {
    pub username: String,
    pub password: String,
    pub tenant_name: String,
    pub auth_url: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl CloudCredentials {
    /// Parse and validate credentials from JSON text
    pub fn from_json(text: &str) -> ProvisionerResult<Self> {
        #[derive(Deserialize)]
        struct Raw {
            username: Option<String>,
            password: Option<String>,
            tenant_name: Option<String>,
            auth_url: Option<String>,
            region: Option<String>,
        }

        let raw: Raw = serde_json::from_str(text)
            .map_err(|e| ProvisionerError::Config(format!("invalid credentials JSON: {}", e)))?;

        Ok(Self {
            username: required("username", raw.username)?,
            password: required("password", raw.password)?,
            tenant_name: required("tenant_name", raw.tenant_name)?,
            auth_url: required("auth_url", raw.auth_url)?,
            region: raw.region.filter(|r| !r.is_empty()),
        })
    }
}

fn required(field: &str, value: Option<String>) -> ProvisionerResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(ProvisionerError::Config(format!(
            "credentials field '{}' is empty",
            field
        ))),
        None => Err(ProvisionerError::Config(format!(
            "credentials field '{}' is missing",
            field
        ))),
    }
}

impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tenant_name", &self.tenant_name)
            .field("auth_url", &self.auth_url)
            .field("region", &self.region)
            .finish()
    }
}

/// Per-invocation cloud settings supplied by the caller
///
/// `region` has three states:
/// - absent (`None`): use the region recorded with the credentials
/// - `null` or `""` (`Some(None)`): bind the provider default
/// - a name (`Some(Some(_))`): bind that region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(
        default,
        deserialize_with = "explicit_region",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<Option<String>>,
}

impl CloudConfig {
    pub fn with_region(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            region: Some(Some(region).filter(|r| !r.is_empty())),
        }
    }

    /// Ignore the credentials region and bind the provider default
    pub fn provider_default() -> Self {
        Self { region: Some(None) }
    }

    /// Region override as passed to the resolver
    pub fn region_override(&self) -> Option<Option<&str>> {
        self.region.as_ref().map(|r| r.as_deref())
    }
}

/// A present `region` key is an override even when `null` or empty
fn explicit_region<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let region = Option::<String>::deserialize(deserializer)?;
    Ok(Some(region.filter(|r| !r.is_empty())))
}

/// Location of the credentials file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSource {
    path: PathBuf,
}

impl CredentialSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$KEYSTONE_CONFIG_PATH`, else `$HOME/keystone_config.json`
    pub fn from_env() -> ProvisionerResult<Self> {
        Self::from_vars(
            std::env::var(CONFIG_PATH_ENV).ok(),
            std::env::var("HOME").ok(),
        )
    }

    /// Resolve the location from explicit variable values
    pub fn from_vars(config_path: Option<String>, home: Option<String>) -> ProvisionerResult<Self> {
        if let Some(path) = config_path.filter(|p| !p.is_empty()) {
            return Ok(Self::new(path));
        }

        let home = home.filter(|h| !h.is_empty()).ok_or_else(|| {
            ProvisionerError::Config(format!(
                "{} is not set and the home directory is unknown",
                CONFIG_PATH_ENV
            ))
        })?;

        Ok(Self::new(Path::new(&home).join(DEFAULT_CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the credentials file
    pub async fn load(&self) -> ProvisionerResult<CloudCredentials> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProvisionerError::Config(format!(
                "cannot read credentials file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        CloudCredentials::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const VALID: &str = r#"{
        "username": "admin",
        "password": "hunter2",
        "tenant_name": "demo",
        "auth_url": "http://keystone:5000/v2.0",
        "region": "RegionOne"
    }"#;

    #[test]
    fn test_parse_valid_credentials() {
        let creds = CloudCredentials::from_json(VALID).unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.tenant_name, "demo");
        assert_eq!(creds.region.as_deref(), Some("RegionOne"));
    }

    #[test_case(r#"{"password": "p", "tenant_name": "t", "auth_url": "u"}"#, "username" ; "missing username")]
    #[test_case(r#"{"username": "u", "tenant_name": "t", "auth_url": "u"}"#, "password" ; "missing password")]
    #[test_case(r#"{"username": "u", "password": "p", "auth_url": "u"}"#, "tenant_name" ; "missing tenant")]
    #[test_case(r#"{"username": "u", "password": "p", "tenant_name": "t", "auth_url": " "}"#, "auth_url" ; "blank auth url")]
    fn test_required_fields(json: &str, field: &str) {
        let err = CloudCredentials::from_json(json).unwrap_err();
        assert!(matches!(err, ProvisionerError::Config(_)));
        assert!(err.to_string().contains(field));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = CloudCredentials::from_json("{not json").unwrap_err();
        assert!(matches!(err, ProvisionerError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = CloudCredentials::from_json(VALID).unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_source_prefers_env_path() {
        let source =
            CredentialSource::from_vars(Some("/etc/keystone.json".into()), Some("/home/u".into()))
                .unwrap();
        assert_eq!(source.path(), Path::new("/etc/keystone.json"));
    }

    #[test]
    fn test_source_defaults_to_home() {
        let source = CredentialSource::from_vars(None, Some("/home/u".into())).unwrap();
        assert_eq!(source.path(), Path::new("/home/u/keystone_config.json"));
    }

    #[test]
    fn test_source_without_home_fails() {
        assert!(matches!(
            CredentialSource::from_vars(None, None),
            Err(ProvisionerError::Config(_))
        ));
    }

    #[test_case(r#"{}"#, None ; "absent inherits")]
    #[test_case(r#"{"region": null}"#, Some(None) ; "null is provider default")]
    #[test_case(r#"{"region": ""}"#, Some(None) ; "empty is provider default")]
    #[test_case(r#"{"region": "RegionTwo"}"#, Some(Some("RegionTwo")) ; "named")]
    fn test_cloud_config_region(json: &str, expected: Option<Option<&str>>) {
        let config: CloudConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.region_override(), expected);
    }

    #[test]
    fn test_empty_region_constructor_is_provider_default() {
        assert_eq!(CloudConfig::with_region(""), CloudConfig::provider_default());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let source = CredentialSource::new("/nonexistent/keystone_config.json");
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, ProvisionerError::Config(_)));
    }
}
