// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS client abstraction for task delivery and event publishing

use async_nats::{Client, ConnectOptions, Subscriber};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::{InfrastructureError, InfrastructureResult};

/// Configuration for NATS connection
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "sg-provisioner".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// NATS client wrapper publishing JSON payloads
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Create a new NATS client with the given configuration
    pub async fn new(config: NatsConfig) -> InfrastructureResult<Self> {
        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout)
            .request_timeout(Some(config.request_timeout));

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(|e| InfrastructureError::NatsConnection(e.to_string()))?;

        info!(servers = ?config.servers, "Connected to NATS");

        Ok(Self { client })
    }

    /// Publish a message to a subject
    pub async fn publish<T>(&self, subject: &str, message: &T) -> InfrastructureResult<()>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| InfrastructureError::NatsPublish(e.to_string()))?;

        debug!(subject = %subject, "Published message");
        Ok(())
    }

    /// Subscribe to a subject
    pub async fn subscribe(&self, subject: &str) -> InfrastructureResult<Subscriber> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| InfrastructureError::NatsSubscribe(e.to_string()))?;

        info!(subject = %subject, "Subscribed");
        Ok(subscriber)
    }
}

/// Reply sent to a requester once a handler finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandlerReply {
    pub fn from_result(result: &InfrastructureResult<()>) -> Self {
        match result {
            Ok(()) => Self { ok: true, error: None },
            Err(e) => Self {
                ok: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Trait for handling messages from NATS
#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync {
    /// The type of message this handler processes
    type Message: DeserializeOwned + Send;

    /// Handle a message
    async fn handle(&self, message: Self::Message) -> InfrastructureResult<()>;

    /// Get the subject this handler subscribes to
    fn subject(&self) -> &str;
}

/// Runs handlers for subscriptions
pub struct MessageProcessor {
    client: NatsClient,
}

impl MessageProcessor {
    /// Create a new message processor
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }

    /// Feed every message on the handler's subject to the handler
    ///
    /// Messages are handled one at a time. When a message carries a reply
    /// subject the outcome is sent back as a [`HandlerReply`]. The returned
    /// task ends when the subscription closes.
    pub async fn run_handler<H>(&self, handler: Arc<H>) -> InfrastructureResult<JoinHandle<()>>
    where
        H: MessageHandler + 'static,
    {
        let subject = handler.subject().to_string();
        let mut subscriber = self.client.subscribe(&subject).await?;
        let client = self.client.clone();

        Ok(tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                let result = match serde_json::from_slice::<H::Message>(&msg.payload) {
                    Ok(message) => handler.handle(message).await,
                    Err(e) => {
                        error!(subject = %msg.subject, error = %e, "Failed to deserialize message");
                        Err(InfrastructureError::Deserialization(e.to_string()))
                    }
                };

                if let Err(ref e) = result {
                    error!(subject = %msg.subject, error = %e, "Handler failed");
                }

                if let Some(reply) = msg.reply {
                    let outcome = HandlerReply::from_result(&result);
                    if let Err(e) = client.publish(&reply.to_string(), &outcome).await {
                        warn!(error = %e, "Failed to send handler reply");
                    }
                }
            }

            warn!(subject = %subject, "Subscription closed");
        }))
    }
}
