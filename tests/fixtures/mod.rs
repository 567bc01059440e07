// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cosmo-sg-provisioner
//!
//! Builds services over the in-memory provider with a throwaway credentials
//! file, plus a notifier that records every transition it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use cosmo_sg_provisioner::config::CredentialSource;
use cosmo_sg_provisioner::domain::{RuleSpec, SecurityGroupSpec};
use cosmo_sg_provisioner::errors::{InfrastructureError, InfrastructureResult};
use cosmo_sg_provisioner::events::{EventNotifier, StateTransition};
use cosmo_sg_provisioner::provider::{InMemoryClientFactory, InMemoryProvider};
use cosmo_sg_provisioner::resolver::CredentialResolver;
use cosmo_sg_provisioner::service::ProvisioningService;

pub const PORT: u16 = 65000;
pub const CIDR: &str = "1.2.3.0/24";
pub const CORRELATION_ID: &str = "cosmo_test_node_1";

pub const CREDENTIALS_JSON: &str = r#"{
    "username": "cosmo",
    "password": "secret",
    "tenant_name": "cosmo-tenant",
    "auth_url": "http://keystone.test:5000/v2.0",
    "region": "RegionOne"
}"#;

/// Notifier keeping every transition in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    transitions: Arc<Mutex<Vec<StateTransition>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            transitions: Arc::default(),
            fail: true,
        }
    }

    pub async fn transitions(&self) -> Vec<StateTransition> {
        self.transitions.lock().await.clone()
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn notify(&self, transition: &StateTransition) -> InfrastructureResult<()> {
        if self.fail {
            return Err(InfrastructureError::NatsPublish("channel closed".to_string()));
        }
        self.transitions.lock().await.push(transition.clone());
        Ok(())
    }
}

/// Everything a lifecycle test needs to drive and inspect the service
pub struct Harness {
    pub provider: InMemoryProvider,
    pub factory: InMemoryClientFactory,
    pub notifier: RecordingNotifier,
    pub service: ProvisioningService<InMemoryClientFactory, RecordingNotifier>,
    // Keeps the credentials file alive for the duration of the test
    _credentials: NamedTempFile,
}

pub fn credentials_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create credentials file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write credentials file");
    file
}

pub fn harness() -> Harness {
    harness_with_notifier(RecordingNotifier::default())
}

pub fn harness_with_notifier(notifier: RecordingNotifier) -> Harness {
    let provider = InMemoryProvider::new();
    let factory = InMemoryClientFactory::new(provider.clone());
    let credentials = credentials_file(CREDENTIALS_JSON);

    let service = ProvisioningService::new(
        CredentialResolver::new(CredentialSource::new(credentials.path()), factory.clone()),
        notifier.clone(),
    );

    Harness {
        provider,
        factory,
        notifier,
        service,
        _credentials: credentials,
    }
}

/// Spec with one CIDR rule, as the orchestration manager sends it
pub fn single_rule_spec(name: &str) -> SecurityGroupSpec {
    SecurityGroupSpec::new(name)
        .with_description(format!("description for {}", name))
        .with_rule(RuleSpec::from_cidr(PORT, CIDR))
}
