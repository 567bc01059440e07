// Copyright (c) 2025 - Cowboy AI, Inc.
//! OpenStack Nova security group client
//!
//! Authenticates against Keystone v2.0 and drives the Nova compute
//! extension for security groups:
//!
//! ```text
//! POST   {auth_url}/tokens                  → token + service catalog
//! GET    {compute}/os-security-groups       → list_groups
//! POST   {compute}/os-security-groups       → create_group
//! DELETE {compute}/os-security-groups/{id}  → delete_group
//! POST   {compute}/os-security-group-rules  → create_rule
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use cosmo_sg_provisioner::config::CredentialSource;
//! use cosmo_sg_provisioner::provider::{NovaClientConfig, NovaClientFactory, SecurityGroupProvider};
//! use cosmo_sg_provisioner::resolver::CredentialResolver;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = CredentialResolver::new(
//!         CredentialSource::from_env()?,
//!         NovaClientFactory::new(NovaClientConfig::default()),
//!     );
//!     let client = resolver.resolve(None).await?;
//!     for group in client.list_groups().await? {
//!         println!("{} {}", group.id, group.name);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{ClientFactory, ProviderError, ProviderResult, SecurityGroupProvider};
use crate::config::CloudCredentials;
use crate::domain::security_group::id_string;
use crate::domain::{NewRule, RuleSource, SecurityGroup, SecurityGroupRule};

/// Service type of the compute endpoint in the Keystone catalog
const COMPUTE_SERVICE_TYPE: &str = "compute";

/// HTTP settings for the Nova client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovaClientConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for NovaClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

// Keystone v2.0 wire types

#[derive(Serialize)]
struct TokenRequest<'a> {
    auth: AuthBody<'a>,
}

#[derive(Serialize)]
struct AuthBody<'a> {
    #[serde(rename = "passwordCredentials")]
    password_credentials: PasswordCredentials<'a>,
    #[serde(rename = "tenantName")]
    tenant_name: &'a str,
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access: Access,
}

#[derive(Deserialize)]
struct Access {
    token: Token,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct Token {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    #[serde(default)]
    region: Option<String>,
    #[serde(rename = "publicURL")]
    public_url: String,
}

// Nova wire types

#[derive(Deserialize)]
struct GroupList {
    security_groups: Vec<NovaGroup>,
}

#[derive(Deserialize)]
struct GroupEnvelope {
    security_group: NovaGroup,
}

#[derive(Deserialize)]
struct RuleEnvelope {
    security_group_rule: NovaRule,
}

#[derive(Serialize)]
struct CreateGroupRequest<'a> {
    security_group: NewGroup<'a>,
}

#[derive(Serialize)]
struct NewGroup<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct CreateRuleRequest<'a> {
    security_group_rule: &'a NewRule,
}

#[derive(Debug, Deserialize)]
struct NovaGroup {
    #[serde(deserialize_with = "id_string")]
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    rules: Vec<NovaRule>,
}

#[derive(Debug, Deserialize)]
struct NovaRule {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    ip_protocol: Option<String>,
    #[serde(default)]
    from_port: Option<i32>,
    #[serde(default)]
    to_port: Option<i32>,
    #[serde(default)]
    ip_range: Option<IpRange>,
    #[serde(default)]
    group: Option<GroupRef>,
}

#[derive(Debug, Deserialize)]
struct IpRange {
    #[serde(default)]
    cidr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupRef {
    #[serde(default)]
    name: Option<String>,
}

impl From<NovaRule> for SecurityGroupRule {
    fn from(rule: NovaRule) -> Self {
        let cidr = rule.ip_range.and_then(|r| r.cidr);
        let group = rule.group.and_then(|g| g.name);
        let source = match (cidr, group) {
            (Some(cidr), _) => RuleSource::Cidr(cidr),
            (None, Some(name)) => RuleSource::Group(name),
            (None, None) => RuleSource::Any,
        };

        Self {
            id: rule.id,
            ip_protocol: rule.ip_protocol,
            from_port: rule.from_port,
            to_port: rule.to_port,
            source,
        }
    }
}

impl From<NovaGroup> for SecurityGroup {
    fn from(group: NovaGroup) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description.unwrap_or_default(),
            rules: group.rules.into_iter().map(SecurityGroupRule::from).collect(),
        }
    }
}

/// Pick the public compute URL, matching `region` when one is given
fn compute_endpoint(catalog: &[CatalogEntry], region: Option<&str>) -> ProviderResult<String> {
    let endpoints = catalog
        .iter()
        .filter(|entry| entry.service_type == COMPUTE_SERVICE_TYPE)
        .flat_map(|entry| entry.endpoints.iter());

    let mut endpoints = endpoints.peekable();
    if endpoints.peek().is_none() {
        return Err(ProviderError::Catalog("no compute service".to_string()));
    }

    let endpoint = match region {
        Some(region) => endpoints.find(|e| e.region.as_deref() == Some(region)),
        None => endpoints.next(),
    };

    endpoint
        .map(|e| e.public_url.trim_end_matches('/').to_string())
        .ok_or_else(|| {
            ProviderError::Catalog(format!("no compute endpoint for region {:?}", region))
        })
}

/// Turn a non-success response into [`ProviderError::Api`]
async fn check(response: Response, operation: &'static str) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        operation,
        status: status.as_u16(),
        body,
    })
}

fn transport(e: reqwest::Error) -> ProviderError {
    ProviderError::Transport(e.to_string())
}

fn malformed(e: reqwest::Error) -> ProviderError {
    ProviderError::MalformedResponse(e.to_string())
}

/// Nova client bound to one tenant and compute endpoint
#[derive(Debug, Clone)]
pub struct NovaClient {
    client: Client,
    endpoint: String,
}

impl NovaClient {
    /// Authenticate and bind to the compute endpoint of `region`
    pub async fn connect(
        config: &NovaClientConfig,
        credentials: &CloudCredentials,
        region: Option<&str>,
    ) -> ProviderResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let auth_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let url = format!("{}/tokens", credentials.auth_url.trim_end_matches('/'));
        debug!(url = %url, tenant = %credentials.tenant_name, "Requesting Keystone token");

        let response = auth_client
            .post(&url)
            .json(&TokenRequest {
                auth: AuthBody {
                    password_credentials: PasswordCredentials {
                        username: &credentials.username,
                        password: &credentials.password,
                    },
                    tenant_name: &credentials.tenant_name,
                },
            })
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Authentication(format!(
                "Keystone rejected credentials for user '{}'",
                credentials.username
            )));
        }

        let access = check(response, "authenticate")
            .await?
            .json::<TokenResponse>()
            .await
            .map_err(malformed)?
            .access;

        let endpoint = compute_endpoint(&access.service_catalog, region)?;

        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    "X-Auth-Token",
                    access.token.id.parse().map_err(|e| {
                        ProviderError::Authentication(format!("Invalid token: {}", e))
                    })?,
                );
                headers.insert(
                    "Accept",
                    "application/json"
                        .parse()
                        .map_err(|e| ProviderError::Transport(format!("Invalid header: {}", e)))?,
                );
                headers
            })
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        info!(endpoint = %endpoint, region = ?region, "Bound Nova client");

        Ok(Self { client, endpoint })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }
}

#[async_trait]
impl SecurityGroupProvider for NovaClient {
    async fn list_groups(&self) -> ProviderResult<Vec<SecurityGroup>> {
        let response = self
            .client
            .get(self.url("os-security-groups"))
            .send()
            .await
            .map_err(transport)?;

        let list: GroupList = check(response, "list security groups")
            .await?
            .json()
            .await
            .map_err(malformed)?;

        Ok(list.security_groups.into_iter().map(SecurityGroup::from).collect())
    }

    async fn create_group(&self, name: &str, description: &str) -> ProviderResult<SecurityGroup> {
        let response = self
            .client
            .post(self.url("os-security-groups"))
            .json(&CreateGroupRequest {
                security_group: NewGroup { name, description },
            })
            .send()
            .await
            .map_err(transport)?;

        let created: GroupEnvelope = check(response, "create security group")
            .await?
            .json()
            .await
            .map_err(malformed)?;

        debug!(sg_id = %created.security_group.id, name = %name, "Nova created security group");
        Ok(created.security_group.into())
    }

    async fn delete_group(&self, id: &str) -> ProviderResult<()> {
        let path = format!("os-security-groups/{}", urlencoding::encode(id));
        let response = self
            .client
            .delete(self.url(&path))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::NoSuchGroup(id.to_string()));
        }
        check(response, "delete security group").await?;
        Ok(())
    }

    async fn create_rule(&self, rule: &NewRule) -> ProviderResult<SecurityGroupRule> {
        let response = self
            .client
            .post(self.url("os-security-group-rules"))
            .json(&CreateRuleRequest {
                security_group_rule: rule,
            })
            .send()
            .await
            .map_err(transport)?;

        let created: RuleEnvelope = check(response, "create security group rule")
            .await?
            .json()
            .await
            .map_err(malformed)?;

        Ok(created.security_group_rule.into())
    }
}

/// [`ClientFactory`] producing authenticated [`NovaClient`]s
#[derive(Debug, Clone, Default)]
pub struct NovaClientFactory {
    config: NovaClientConfig,
}

impl NovaClientFactory {
    pub fn new(config: NovaClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ClientFactory for NovaClientFactory {
    type Client = NovaClient;

    async fn connect(
        &self,
        credentials: &CloudCredentials,
        region: Option<&str>,
    ) -> ProviderResult<Self::Client> {
        NovaClient::connect(&self.config, credentials, region).await
    }
}
