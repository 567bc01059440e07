// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security group specs and realized groups

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Description stored when the spec does not carry one
pub const DEFAULT_DESCRIPTION: &str = "(no description)";

/// Every rule created from a spec is a TCP ingress rule
pub const RULE_PROTOCOL: &str = "tcp";

/// Desired security group, as supplied by the orchestration manager
///
/// # Examples
///
/// ```rust
/// use cosmo_sg_provisioner::domain::SecurityGroupSpec;
///
/// let spec: SecurityGroupSpec = serde_json::from_str(
///     r#"{"name": "web", "rules": [{"port": 80, "cidr": "0.0.0.0/0"}]}"#,
/// ).unwrap();
/// assert_eq!(spec.description_or_default(), "(no description)");
/// assert_eq!(spec.rules[0].port, 80);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    /// Unique key within the credential scope
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ingress rules, realized in order
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl SecurityGroupSpec {
    /// Create a spec with no description and no rules
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            rules: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a rule
    pub fn with_rule(mut self, rule: RuleSpec) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION)
    }
}

/// A single TCP ingress rule in a spec
///
/// Neither source is validated here: both, one or none are handed to the
/// provider as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,

    /// Source security group identifier (`group_id` on the wire)
    #[serde(
        default,
        rename = "group_id",
        alias = "source_group_id",
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_group_id: Option<String>,
}

impl RuleSpec {
    /// Rule admitting `port` from a CIDR block
    pub fn from_cidr(port: u16, cidr: impl Into<String>) -> Self {
        Self {
            port,
            cidr: Some(cidr.into()),
            source_group_id: None,
        }
    }

    /// Rule admitting `port` from members of another group
    pub fn from_group(port: u16, group_id: impl Into<String>) -> Self {
        Self {
            port,
            cidr: None,
            source_group_id: Some(group_id.into()),
        }
    }
}

/// Rule-creation request sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRule {
    pub parent_group_id: String,
    pub ip_protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    pub cidr: Option<String>,
    pub group_id: Option<String>,
}

impl NewRule {
    /// Single-port TCP ingress rule for `parent_group_id` built from a spec rule
    pub fn tcp_ingress(parent_group_id: impl Into<String>, rule: &RuleSpec) -> Self {
        Self {
            parent_group_id: parent_group_id.into(),
            ip_protocol: RULE_PROTOCOL.to_string(),
            from_port: rule.port,
            to_port: rule.port,
            cidr: rule.cidr.clone(),
            group_id: rule.source_group_id.clone(),
        }
    }
}

/// Where a realized rule admits traffic from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RuleSource {
    Cidr(String),
    /// Members of the named group
    Group(String),
    /// The provider reported no source
    Any,
}

impl RuleSource {
    pub fn cidr(&self) -> Option<&str> {
        match self {
            RuleSource::Cidr(cidr) => Some(cidr),
            _ => None,
        }
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Cidr(cidr) => write!(f, "{}", cidr),
            RuleSource::Group(name) => write!(f, "group:{}", name),
            RuleSource::Any => write!(f, "any"),
        }
    }
}

/// A rule as realized by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    pub id: String,
    pub ip_protocol: Option<String>,
    pub from_port: Option<i32>,
    pub to_port: Option<i32>,
    pub source: RuleSource,
}

/// A security group as stored by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    /// Provider-assigned identifier
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub rules: Vec<SecurityGroupRule>,
}

/// Identifier written as a JSON string or number
///
/// nova-network hands out integer ids, neutron-backed deployments use UUIDs.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

#[cfg_attr(not(feature = "openstack"), allow(dead_code))]
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    WireId::deserialize(deserializer).map(WireId::into_string)
}

pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<WireId>::deserialize(deserializer)?.map(WireId::into_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_spec_parses_task_payload() {
        let spec: SecurityGroupSpec = serde_json::from_value(serde_json::json!({
            "name": "cosmo_test_sg1",
            "description": "description for cosmo_test_sg1",
            "rules": [
                {"port": 65000, "cidr": "1.2.3.0/24"},
                {"port": 22, "group_id": 17}
            ]
        }))
        .unwrap();

        assert_eq!(spec.description_or_default(), "description for cosmo_test_sg1");
        assert_eq!(spec.rules[0], RuleSpec::from_cidr(65000, "1.2.3.0/24"));
        assert_eq!(spec.rules[1], RuleSpec::from_group(22, "17"));
    }

    #[test]
    fn test_missing_rules_and_description_default() {
        let spec: SecurityGroupSpec = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert!(spec.rules.is_empty());
        assert_eq!(spec.description_or_default(), DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_tcp_ingress_passes_sources_through() {
        let rule = RuleSpec {
            port: 8080,
            cidr: Some("10.0.0.0/8".to_string()),
            source_group_id: Some("abc".to_string()),
        };
        let new_rule = NewRule::tcp_ingress("sg-1", &rule);

        assert_eq!(new_rule.ip_protocol, "tcp");
        assert_eq!(new_rule.from_port, 8080);
        assert_eq!(new_rule.to_port, 8080);
        assert_eq!(new_rule.cidr.as_deref(), Some("10.0.0.0/8"));
        assert_eq!(new_rule.group_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_rule_without_source_is_accepted() {
        let rule: RuleSpec = serde_json::from_str(r#"{"port": 443}"#).unwrap();
        let new_rule = NewRule::tcp_ingress("sg-1", &rule);
        assert_eq!(new_rule.cidr, None);
        assert_eq!(new_rule.group_id, None);
    }

    #[test]
    fn test_rule_source_display() {
        assert_eq!(RuleSource::Cidr("1.2.3.0/24".into()).to_string(), "1.2.3.0/24");
        assert_eq!(RuleSource::Group("web".into()).to_string(), "group:web");
        assert_eq!(RuleSource::Any.to_string(), "any");
    }
}
