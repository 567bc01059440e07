// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Group Provisioner Worker
//!
//! Receives provision/terminate tasks over NATS and runs them against
//! OpenStack Nova. Successful provisions publish a `running` state event.
//!
//! Usage:
//!   sg-provisioner [worker]        consume tasks until the subscription closes
//!   sg-provisioner list [REGION]   print every visible security group as JSON
//!
//! Environment:
//!   KEYSTONE_CONFIG_PATH     credentials file (default: ~/keystone_config.json)
//!   NATS_URL                 NATS server (default: nats://localhost:4222)
//!   SG_TASK_SUBJECT_PREFIX   task subject prefix (default: cosmo.tasks.sg)

use anyhow::{bail, Context, Result};
use cosmo_sg_provisioner::{
    config::{CloudConfig, CredentialSource},
    events::{LoggingNotifier, NatsEventNotifier},
    nats::{MessageProcessor, NatsClient, NatsConfig},
    provider::{NovaClientConfig, NovaClientFactory},
    resolver::CredentialResolver,
    service::{ProvisioningService, SecurityGroupService},
    tasks::{TaskHandler, DEFAULT_TASK_SUBJECT_PREFIX},
};
use std::sync::Arc;
use tracing::info;

/// Configuration for the worker process
#[derive(Debug, Clone)]
struct WorkerConfig {
    /// NATS connection settings
    nats: NatsConfig,
    /// Tasks are received on `{prefix}.>`
    task_subject_prefix: String,
    /// Credentials file location
    credentials: CredentialSource,
}

impl WorkerConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let mut nats = NatsConfig::default();
        if let Ok(url) = std::env::var("NATS_URL") {
            nats.servers = url.split(',').map(str::to_string).collect();
        }

        let task_subject_prefix = std::env::var("SG_TASK_SUBJECT_PREFIX")
            .unwrap_or_else(|_| DEFAULT_TASK_SUBJECT_PREFIX.to_string());

        let credentials =
            CredentialSource::from_env().context("Failed to locate credentials file")?;

        Ok(Self {
            nats,
            task_subject_prefix,
            credentials,
        })
    }
}

fn resolver(config: &WorkerConfig) -> CredentialResolver<NovaClientFactory> {
    CredentialResolver::new(
        config.credentials.clone(),
        NovaClientFactory::new(NovaClientConfig::default()),
    )
}

async fn run_worker(config: WorkerConfig) -> Result<()> {
    info!(
        servers = ?config.nats.servers,
        prefix = %config.task_subject_prefix,
        credentials = %config.credentials.path().display(),
        "Starting security group worker"
    );

    let client = NatsClient::new(config.nats.clone())
        .await
        .context("Failed to connect to NATS")?;

    let service = Arc::new(ProvisioningService::new(
        resolver(&config),
        NatsEventNotifier::new(client.clone()),
    ));
    let handler = Arc::new(TaskHandler::new(service, &config.task_subject_prefix));

    let processor = MessageProcessor::new(client);
    let worker = processor
        .run_handler(handler)
        .await
        .context("Failed to subscribe to task subject")?;

    worker.await.context("Worker task panicked")?;
    Ok(())
}

async fn list_groups(config: WorkerConfig, region: Option<String>) -> Result<()> {
    let service = ProvisioningService::new(resolver(&config), LoggingNotifier);
    let groups = service
        .list_groups(&region.map(CloudConfig::with_region).unwrap_or_default())
        .await
        .context("Failed to list security groups")?;

    println!("{}", serde_json::to_string_pretty(&groups)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = WorkerConfig::from_env()?;
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        None | Some("worker") => run_worker(config).await,
        Some("list") => list_groups(config, args.next()).await,
        Some(other) => bail!("unknown command '{}'; expected 'worker' or 'list'", other),
    }
}
