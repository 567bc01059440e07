// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security group provisioning and termination
//!
//! # Provision
//!
//! 1. Resolve a client (region override from the invocation)
//! 2. Refuse if a group with the name already exists
//! 3. Create the group
//! 4. Create one TCP rule per requested rule, in order
//! 5. Report `running`
//!
//! A rule failure in step 4 leaves the group behind with the rules created
//! so far. The error is returned as is; cleanup belongs to the caller.
//!
//! # Terminate
//!
//! Resolve, strict lookup, delete by id. Termination reports no event.
//!
//! Two concurrent provisions of the same name can both pass step 2. Nothing
//! here serializes them.

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::CloudConfig;
use crate::domain::{NewRule, SecurityGroup, SecurityGroupSpec};
use crate::errors::{ProvisionerError, ProvisionerResult};
use crate::events::{EventNotifier, StateTransition};
use crate::locator;
use crate::provider::{ClientFactory, SecurityGroupProvider};
use crate::resolver::CredentialResolver;

/// Security group lifecycle operations invoked by the task handlers
#[async_trait]
pub trait SecurityGroupService: Send + Sync {
    /// Create the group described by `spec` and report it running
    ///
    /// # Errors
    /// - `Config` when credentials cannot be loaded
    /// - `AlreadyExists` when the name is taken (nothing is created)
    /// - `AmbiguousName` when the name is already duplicated
    /// - `Provider` when any provider call fails
    /// - `Notification` when the running event cannot be delivered
    async fn provision(
        &self,
        correlation_id: &str,
        cloud_config: &CloudConfig,
        spec: &SecurityGroupSpec,
    ) -> ProvisionerResult<SecurityGroup>;

    /// Delete the group named `spec.name`
    async fn terminate(
        &self,
        cloud_config: &CloudConfig,
        spec: &SecurityGroupSpec,
    ) -> ProvisionerResult<()>;

    /// Non-strict lookup by name
    async fn find(
        &self,
        cloud_config: &CloudConfig,
        name: &str,
    ) -> ProvisionerResult<Option<SecurityGroup>>;

    /// Every group visible to the resolved scope
    async fn list_groups(&self, cloud_config: &CloudConfig) -> ProvisionerResult<Vec<SecurityGroup>>;
}

/// [`SecurityGroupService`] over an injected client factory and notifier
pub struct ProvisioningService<F, N> {
    resolver: CredentialResolver<F>,
    notifier: N,
}

impl<F, N> ProvisioningService<F, N>
where
    F: ClientFactory,
    N: EventNotifier,
{
    pub fn new(resolver: CredentialResolver<F>, notifier: N) -> Self {
        Self { resolver, notifier }
    }

    async fn client(&self, cloud_config: &CloudConfig) -> ProvisionerResult<F::Client> {
        self.resolver.resolve(cloud_config.region_override()).await
    }

    /// Create the group and its rules on a bound client
    async fn create_with_rules(
        client: &F::Client,
        spec: &SecurityGroupSpec,
    ) -> ProvisionerResult<SecurityGroup> {
        let mut group = client
            .create_group(&spec.name, spec.description_or_default())
            .await?;

        info!(sg_id = %group.id, name = %spec.name, rules = spec.rules.len(), "Created security group, adding rules");

        for (index, rule) in spec.rules.iter().enumerate() {
            let request = NewRule::tcp_ingress(&group.id, rule);
            match client.create_rule(&request).await {
                Ok(realized) => group.rules.push(realized),
                Err(e) => {
                    error!(
                        sg_id = %group.id,
                        name = %spec.name,
                        rule_index = index,
                        port = rule.port,
                        created_rules = group.rules.len(),
                        error = %e,
                        "Rule creation failed; security group left partially configured"
                    );
                    return Err(e.into());
                }
            }
        }

        Ok(group)
    }
}

#[async_trait]
impl<F, N> SecurityGroupService for ProvisioningService<F, N>
where
    F: ClientFactory,
    N: EventNotifier,
{
    async fn provision(
        &self,
        correlation_id: &str,
        cloud_config: &CloudConfig,
        spec: &SecurityGroupSpec,
    ) -> ProvisionerResult<SecurityGroup> {
        info!(correlation_id = %correlation_id, name = %spec.name, "Provisioning security group");

        let client = self.client(cloud_config).await?;

        if let Some(existing) = locator::find_by_name(&client, &spec.name).await? {
            return Err(ProvisionerError::AlreadyExists {
                name: existing.name,
            });
        }

        let group = Self::create_with_rules(&client, spec).await?;

        self.notifier
            .notify(&StateTransition::sg_running(correlation_id))
            .await
            .map_err(|e| ProvisionerError::Notification(e.to_string()))?;

        info!(correlation_id = %correlation_id, sg_id = %group.id, name = %group.name, "Security group running");
        Ok(group)
    }

    async fn terminate(
        &self,
        cloud_config: &CloudConfig,
        spec: &SecurityGroupSpec,
    ) -> ProvisionerResult<()> {
        info!(name = %spec.name, "Terminating security group");

        let client = self.client(cloud_config).await?;
        let group = locator::find_by_name_or_fail(&client, &spec.name).await?;

        client.delete_group(&group.id).await?;

        info!(sg_id = %group.id, name = %group.name, "Security group deleted");
        Ok(())
    }

    async fn find(
        &self,
        cloud_config: &CloudConfig,
        name: &str,
    ) -> ProvisionerResult<Option<SecurityGroup>> {
        let client = self.client(cloud_config).await?;
        locator::find_by_name(&client, name).await
    }

    async fn list_groups(&self, cloud_config: &CloudConfig) -> ProvisionerResult<Vec<SecurityGroup>> {
        let client = self.client(cloud_config).await?;
        Ok(client.list_groups().await?)
    }
}
