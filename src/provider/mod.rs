// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud provider capability
//!
//! The provisioning core never talks HTTP itself. It drives a bound client
//! through [`SecurityGroupProvider`] (list/create/delete groups, create
//! rules) and obtains that client from a [`ClientFactory`].
//!
//! # Implementations
//!
//! - [`memory::InMemoryProvider`] - process-local fake for tests and dry runs
//! - [`nova::NovaClient`] - Keystone v2.0 + Nova `os-security-groups` (feature `openstack`)

use async_trait::async_trait;
use thiserror::Error;

use crate::config::CloudCredentials;
use crate::domain::{NewRule, SecurityGroup, SecurityGroupRule};

pub mod memory;

#[cfg(feature = "openstack")]
pub mod nova;

pub use memory::{InMemoryClientFactory, InMemoryProvider, ProviderCall};

#[cfg(feature = "openstack")]
pub use nova::{NovaClient, NovaClientConfig, NovaClientFactory};

/// Failures of the provider API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Network-level failure reaching the API
    #[error("transport error: {0}")]
    Transport(String),

    /// Identity service rejected the credentials
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Service catalog has no usable compute endpoint
    #[error("no compute endpoint in service catalog: {0}")]
    Catalog(String),

    /// API answered with a non-success status
    #[error("{operation} returned {status}: {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// API answered with a body we could not interpret
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Group id does not exist on the provider
    #[error("security group {0} does not exist")]
    NoSuchGroup(String),

    /// Failure raised deliberately by a fake provider
    #[error("injected failure: {0}")]
    Injected(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Security group operations of a client bound to one region and tenant
#[async_trait]
pub trait SecurityGroupProvider: Send + Sync {
    /// List every group visible to the bound scope
    async fn list_groups(&self) -> ProviderResult<Vec<SecurityGroup>>;

    /// Create an empty group
    async fn create_group(&self, name: &str, description: &str) -> ProviderResult<SecurityGroup>;

    /// Delete a group by provider identifier
    async fn delete_group(&self, id: &str) -> ProviderResult<()>;

    /// Add a rule to an existing group
    async fn create_rule(&self, rule: &NewRule) -> ProviderResult<SecurityGroupRule>;
}

/// Builds a bound client from credentials and a resolved region
#[async_trait]
pub trait ClientFactory: Send + Sync {
    type Client: SecurityGroupProvider;

    async fn connect(
        &self,
        credentials: &CloudCredentials,
        region: Option<&str>,
    ) -> ProviderResult<Self::Client>;
}
