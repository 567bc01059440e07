// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for security group provisioning
//!
//! Two layers:
//! - [`ProvisionerError`]: the closed taxonomy surfaced by the task handlers
//! - [`InfrastructureError`]: NATS transport failures at the task boundary
//!
//! Provider capability failures are [`ProviderError`] and are wrapped
//! verbatim into [`ProvisionerError::Provider`].

use thiserror::Error;

pub use crate::provider::ProviderError;

/// Failures of a provision/terminate/lookup invocation
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// Credential source missing, unreadable or incomplete
    #[error("Configuration error: {0}")]
    Config(String),

    /// More than one group carries the name; the uniqueness invariant is broken
    #[error("Lookup of security group by name failed: there are {count} groups named '{name}'")]
    AmbiguousName { name: String, count: usize },

    /// Provisioning requested for a name that is already taken
    #[error("Cannot provision security group '{name}': a group with this name already exists")]
    AlreadyExists { name: String },

    /// Strict lookup found no group with the name
    #[error("Lookup of security group by name failed: no group named '{name}'")]
    NotFound { name: String },

    /// Any failure of the underlying provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The state transition could not be delivered after provisioning succeeded
    #[error("Event notification error: {0}")]
    Notification(String),
}

impl ProvisionerError {
    /// Short machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionerError::Config(_) => "config",
            ProvisionerError::AmbiguousName { .. } => "ambiguous_name",
            ProvisionerError::AlreadyExists { .. } => "already_exists",
            ProvisionerError::NotFound { .. } => "not_found",
            ProvisionerError::Provider(_) => "provider",
            ProvisionerError::Notification(_) => "notification",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvisionerError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ProvisionerError::AlreadyExists { .. })
    }

    /// Whether repeating the same invocation could succeed
    ///
    /// Invocations are never retried here; the caller decides.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProvisionerError::Config(_)
            | ProvisionerError::AmbiguousName { .. }
            | ProvisionerError::AlreadyExists { .. }
            | ProvisionerError::NotFound { .. }
            | ProvisionerError::Provider(_)
            | ProvisionerError::Notification(_) => false,
        }
    }
}

/// Result type for provisioning operations
pub type ProvisionerResult<T> = Result<T, ProvisionerError>;

/// Errors that can occur in the messaging infrastructure
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// NATS connection error
    #[error("NATS connection error: {0}")]
    NatsConnection(String),

    /// NATS publish error
    #[error("NATS publish error: {0}")]
    NatsPublish(String),

    /// NATS subscribe error
    #[error("NATS subscribe error: {0}")]
    NatsSubscribe(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// A task handler returned a failure
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// Result type for infrastructure operations
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

impl From<async_nats::Error> for InfrastructureError {
    fn from(err: async_nats::Error) -> Self {
        InfrastructureError::NatsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for InfrastructureError {
    fn from(err: serde_json::Error) -> Self {
        InfrastructureError::Serialization(err.to_string())
    }
}

impl From<ProvisionerError> for InfrastructureError {
    fn from(err: ProvisionerError) -> Self {
        InfrastructureError::TaskFailed(format!("[{}] {}", err.kind(), err))
    }
}
