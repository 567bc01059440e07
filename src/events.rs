// Copyright (c) 2025 - Cowboy AI, Inc.
//! Lifecycle state transitions and their delivery
//!
//! A successful provisioning reports one [`StateTransition`]:
//!
//! ```text
//! (correlation_id, "cosmo_manager", "sg status", "state", "running")
//! ```
//!
//! Delivery goes through an [`EventNotifier`]. [`NatsEventNotifier`] publishes
//! the transition as JSON on `cosmo.events.{source}.{category}`;
//! [`LoggingNotifier`] only writes it to the trace log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::InfrastructureResult;
use crate::nats::NatsClient;

/// Component name reported as the event source
pub const EVENT_SOURCE: &str = "cosmo_manager";

/// Category of security group status events
pub const SG_STATUS_CATEGORY: &str = "sg status";

/// Key of the reported state
pub const STATE_KEY: &str = "state";

/// State reported once a group and all its rules exist
pub const STATE_RUNNING: &str = "running";

/// Root of the event subject hierarchy
pub const EVENT_SUBJECT_ROOT: &str = "cosmo.events";

/// A state change of a provisioned resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Unique event identifier (UUID v7 for time ordering)
    pub event_id: Uuid,

    pub timestamp: DateTime<Utc>,

    /// Identifier the orchestration manager attached to the invocation
    pub correlation_id: String,

    pub source: String,
    pub category: String,
    pub key: String,
    pub value: String,
}

impl StateTransition {
    /// Security group reached the running state
    pub fn sg_running(correlation_id: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            correlation_id: correlation_id.into(),
            source: EVENT_SOURCE.to_string(),
            category: SG_STATUS_CATEGORY.to_string(),
            key: STATE_KEY.to_string(),
            value: STATE_RUNNING.to_string(),
        }
    }

    /// NATS subject the transition is published on
    pub fn subject(&self) -> String {
        format!(
            "{}.{}.{}",
            EVENT_SUBJECT_ROOT,
            subject_token(&self.source),
            subject_token(&self.category)
        )
    }
}

/// Make a free-form label usable as a single subject token
fn subject_token(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            ' ' | '.' | '*' | '>' => '_',
            c => c,
        })
        .collect()
}

/// Receives lifecycle state transitions
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify(&self, transition: &StateTransition) -> InfrastructureResult<()>;
}

/// Writes transitions to the trace log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl EventNotifier for LoggingNotifier {
    async fn notify(&self, transition: &StateTransition) -> InfrastructureResult<()> {
        info!(
            correlation_id = %transition.correlation_id,
            source = %transition.source,
            category = %transition.category,
            key = %transition.key,
            value = %transition.value,
            "State transition"
        );
        Ok(())
    }
}

/// Publishes transitions to NATS
#[derive(Clone)]
pub struct NatsEventNotifier {
    client: NatsClient,
}

impl NatsEventNotifier {
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventNotifier for NatsEventNotifier {
    async fn notify(&self, transition: &StateTransition) -> InfrastructureResult<()> {
        self.client.publish(&transition.subject(), transition).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_running_transition_fields() {
        let transition = StateTransition::sg_running("node_1");
        assert_eq!(transition.correlation_id, "node_1");
        assert_eq!(transition.source, "cosmo_manager");
        assert_eq!(transition.category, "sg status");
        assert_eq!(transition.key, "state");
        assert_eq!(transition.value, "running");
    }

    #[test]
    fn test_subject_sanitizes_category() {
        let transition = StateTransition::sg_running("node_1");
        assert_eq!(transition.subject(), "cosmo.events.cosmo_manager.sg_status");
    }

    #[test]
    fn test_transition_json_shape() {
        let transition = StateTransition::sg_running("node_1");
        let json = serde_json::to_value(&transition).unwrap();
        assert_eq!(json["correlation_id"], "node_1");
        assert_eq!(json["value"], "running");
        assert!(json["event_id"].is_string());
    }

    #[tokio::test]
    async fn test_logging_notifier_accepts() {
        let result = LoggingNotifier.notify(&StateTransition::sg_running("x")).await;
        assert!(result.is_ok());
    }
}
