// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory provider
//!
//! Behaves like a single-tenant Nova security group API held in process
//! memory. Clones share state, so a test can keep a handle while the service
//! drives another one. Every call is recorded for later inspection.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ClientFactory, ProviderError, ProviderResult, SecurityGroupProvider};
use crate::config::CloudCredentials;
use crate::domain::{NewRule, RuleSource, SecurityGroup, SecurityGroupRule};

/// A call made against the in-memory provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ListGroups,
    CreateGroup { name: String, description: String },
    DeleteGroup { id: String },
    CreateRule(NewRule),
}

impl ProviderCall {
    /// Whether the call changes provider state
    pub fn is_mutation(&self) -> bool {
        !matches!(self, ProviderCall::ListGroups)
    }
}

#[derive(Debug, Default)]
struct ProviderState {
    groups: Vec<SecurityGroup>,
    next_id: u64,
    calls: Vec<ProviderCall>,
    rules_created: usize,
    /// Rule creation fails once this many rules have been created
    fail_rules_after: Option<usize>,
}

impl ProviderState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }
}

/// Process-local security group store implementing [`SecurityGroupProvider`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    state: Arc<RwLock<ProviderState>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a group directly, bypassing every check
    ///
    /// Lets a test put the provider into states the service would refuse to
    /// create, such as two groups sharing a name.
    pub async fn insert_group(&self, name: &str, description: &str) -> SecurityGroup {
        let mut state = self.state.write().await;
        let group = SecurityGroup {
            id: state.allocate_id(),
            name: name.to_string(),
            description: description.to_string(),
            rules: Vec::new(),
        };
        state.groups.push(group.clone());
        group
    }

    /// Make rule creation fail after `count` further successful rule creations
    pub async fn fail_rules_after(&self, count: usize) {
        let mut state = self.state.write().await;
        state.fail_rules_after = Some(state.rules_created + count);
    }

    /// Snapshot of all stored groups
    pub async fn groups(&self) -> Vec<SecurityGroup> {
        self.state.read().await.groups.clone()
    }

    /// Number of stored groups carrying `name`
    pub async fn count_named(&self, name: &str) -> usize {
        self.state
            .read()
            .await
            .groups
            .iter()
            .filter(|g| g.name == name)
            .count()
    }

    /// Every call made so far, in order
    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.state.read().await.calls.clone()
    }
}

#[async_trait]
impl SecurityGroupProvider for InMemoryProvider {
    async fn list_groups(&self) -> ProviderResult<Vec<SecurityGroup>> {
        let mut state = self.state.write().await;
        state.calls.push(ProviderCall::ListGroups);
        Ok(state.groups.clone())
    }

    async fn create_group(&self, name: &str, description: &str) -> ProviderResult<SecurityGroup> {
        let mut state = self.state.write().await;
        state.calls.push(ProviderCall::CreateGroup {
            name: name.to_string(),
            description: description.to_string(),
        });

        let group = SecurityGroup {
            id: state.allocate_id(),
            name: name.to_string(),
            description: description.to_string(),
            rules: Vec::new(),
        };
        state.groups.push(group.clone());

        debug!(sg_id = %group.id, name = %name, "Created in-memory security group");
        Ok(group)
    }

    async fn delete_group(&self, id: &str) -> ProviderResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(ProviderCall::DeleteGroup { id: id.to_string() });

        let before = state.groups.len();
        state.groups.retain(|g| g.id != id);
        if state.groups.len() == before {
            return Err(ProviderError::NoSuchGroup(id.to_string()));
        }
        Ok(())
    }

    async fn create_rule(&self, rule: &NewRule) -> ProviderResult<SecurityGroupRule> {
        let mut state = self.state.write().await;
        state.calls.push(ProviderCall::CreateRule(rule.clone()));

        if state
            .fail_rules_after
            .is_some_and(|limit| state.rules_created >= limit)
        {
            return Err(ProviderError::Injected(format!(
                "rule creation refused for port {}",
                rule.from_port
            )));
        }

        let source = match (&rule.cidr, &rule.group_id) {
            (Some(cidr), _) => RuleSource::Cidr(cidr.clone()),
            (None, Some(group_id)) => {
                let name = state
                    .groups
                    .iter()
                    .find(|g| &g.id == group_id)
                    .map(|g| g.name.clone())
                    .unwrap_or_else(|| group_id.clone());
                RuleSource::Group(name)
            }
            (None, None) => RuleSource::Any,
        };

        let realized = SecurityGroupRule {
            id: state.allocate_id(),
            ip_protocol: Some(rule.ip_protocol.clone()),
            from_port: Some(i32::from(rule.from_port)),
            to_port: Some(i32::from(rule.to_port)),
            source,
        };

        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == rule.parent_group_id)
            .ok_or_else(|| ProviderError::NoSuchGroup(rule.parent_group_id.clone()))?;
        group.rules.push(realized.clone());
        state.rules_created += 1;

        Ok(realized)
    }
}

/// Hands out clones of one [`InMemoryProvider`] and records each connection
#[derive(Debug, Clone, Default)]
pub struct InMemoryClientFactory {
    provider: InMemoryProvider,
    connections: Arc<RwLock<Vec<Option<String>>>>,
}

impl InMemoryClientFactory {
    pub fn new(provider: InMemoryProvider) -> Self {
        Self {
            provider,
            connections: Arc::default(),
        }
    }

    /// Region each connection was bound to, in order
    pub async fn connected_regions(&self) -> Vec<Option<String>> {
        self.connections.read().await.clone()
    }
}

#[async_trait]
impl ClientFactory for InMemoryClientFactory {
    type Client = InMemoryProvider;

    async fn connect(
        &self,
        _credentials: &CloudCredentials,
        region: Option<&str>,
    ) -> ProviderResult<Self::Client> {
        self.connections
            .write()
            .await
            .push(region.map(str::to_string));
        Ok(self.provider.clone())
    }
}
