// Copyright (c) 2025 - Cowboy AI, Inc.
//! Task handlers invoked by the orchestration manager
//!
//! Tasks arrive as JSON tagged by `task`:
//!
//! ```json
//! {"task": "provision", "correlation_id": "node_1", "cloud_config": {"region": "RegionOne"},
//!  "security_group": {"name": "web", "rules": [{"port": 80, "cidr": "0.0.0.0/0"}]}}
//! {"task": "terminate", "cloud_config": {}, "security_group": {"name": "web"}}
//! ```
//!
//! Fields the handlers do not know are ignored.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::CloudConfig;
use crate::domain::SecurityGroupSpec;
use crate::errors::{InfrastructureResult, ProvisionerResult};
use crate::nats::MessageHandler;
use crate::service::SecurityGroupService;

/// Default subject prefix tasks are received on
pub const DEFAULT_TASK_SUBJECT_PREFIX: &str = "cosmo.tasks.sg";

/// A security group task invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskRequest {
    Provision {
        #[serde(alias = "__cloudify_id")]
        correlation_id: String,
        #[serde(default, alias = "nova_config")]
        cloud_config: CloudConfig,
        security_group: SecurityGroupSpec,
    },
    Terminate {
        #[serde(default, alias = "nova_config")]
        cloud_config: CloudConfig,
        security_group: SecurityGroupSpec,
    },
}

impl TaskRequest {
    pub fn name(&self) -> &'static str {
        match self {
            TaskRequest::Provision { .. } => "provision",
            TaskRequest::Terminate { .. } => "terminate",
        }
    }

    pub fn security_group(&self) -> &SecurityGroupSpec {
        match self {
            TaskRequest::Provision { security_group, .. }
            | TaskRequest::Terminate { security_group, .. } => security_group,
        }
    }
}

/// Dispatches [`TaskRequest`]s to a [`SecurityGroupService`]
pub struct TaskHandler<S> {
    service: Arc<S>,
    subject: String,
}

impl<S: SecurityGroupService> TaskHandler<S> {
    /// Handle tasks published under `{prefix}.>`
    pub fn new(service: Arc<S>, prefix: &str) -> Self {
        Self {
            service,
            subject: format!("{}.>", prefix),
        }
    }

    /// Run one task against the service
    pub async fn execute(&self, request: TaskRequest) -> ProvisionerResult<()> {
        let task = request.name();
        let name = request.security_group().name.clone();

        let result = match request {
            TaskRequest::Provision {
                correlation_id,
                cloud_config,
                security_group,
            } => self
                .service
                .provision(&correlation_id, &cloud_config, &security_group)
                .await
                .map(|_| ()),
            TaskRequest::Terminate {
                cloud_config,
                security_group,
            } => self.service.terminate(&cloud_config, &security_group).await,
        };

        match &result {
            Ok(()) => info!(task, name = %name, "Task succeeded"),
            Err(e) => error!(task, name = %name, kind = e.kind(), error = %e, "Task failed"),
        }

        result
    }
}

#[async_trait]
impl<S: SecurityGroupService + 'static> MessageHandler for TaskHandler<S> {
    type Message = TaskRequest;

    async fn handle(&self, message: Self::Message) -> InfrastructureResult<()> {
        Ok(self.execute(message).await?)
    }

    fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_provision_with_extra_fields() {
        let request: TaskRequest = serde_json::from_value(serde_json::json!({
            "task": "provision",
            "__cloudify_id": "node_1",
            "nova_config": {"region": "RegionOne"},
            "security_group": {"name": "web", "rules": [{"port": 80, "cidr": "0.0.0.0/0"}]},
            "policy_service": "http://localhost:8080"
        }))
        .unwrap();

        assert_eq!(request.name(), "provision");
        assert_eq!(
            request,
            TaskRequest::Provision {
                correlation_id: "node_1".to_string(),
                cloud_config: CloudConfig::with_region("RegionOne"),
                security_group: serde_json::from_value(serde_json::json!({
                    "name": "web", "rules": [{"port": 80, "cidr": "0.0.0.0/0"}]
                }))
                .unwrap(),
            }
        );
    }

    #[test]
    fn test_parse_terminate_without_cloud_config() {
        let request: TaskRequest = serde_json::from_str(
            r#"{"task": "terminate", "security_group": {"name": "web"}}"#,
        )
        .unwrap();

        assert_eq!(request.name(), "terminate");
        assert_eq!(request.security_group().name, "web");
    }

    #[test]
    fn test_unknown_task_rejected() {
        let result = serde_json::from_str::<TaskRequest>(
            r#"{"task": "resize", "security_group": {"name": "web"}}"#,
        );
        assert!(result.is_err());
    }
}
