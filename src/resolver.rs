// Copyright (c) 2025 - Cowboy AI, Inc.
//! Credential Resolver
//!
//! Turns the injected [`CredentialSource`] into a bound provider client.
//! Nothing is cached: every [`CredentialResolver::resolve`] re-reads the
//! credentials file and connects a fresh client.

use tracing::debug;

use crate::config::{CloudCredentials, CredentialSource};
use crate::errors::ProvisionerResult;
use crate::provider::ClientFactory;

/// Pick the region a client is bound to
///
/// An explicit override wins, even when it names no region; otherwise the
/// region stored with the credentials. `None` binds the provider default.
/// Empty names count as no region on both paths.
pub fn select_region<'a>(
    override_region: Option<Option<&'a str>>,
    credentials: &'a CloudCredentials,
) -> Option<&'a str> {
    let region = match override_region {
        Some(explicit) => explicit,
        None => credentials.region.as_deref(),
    };
    region.filter(|r| !r.is_empty())
}

/// Reads credentials and builds clients through a [`ClientFactory`]
#[derive(Debug, Clone)]
pub struct CredentialResolver<F> {
    source: CredentialSource,
    factory: F,
}

impl<F: ClientFactory> CredentialResolver<F> {
    pub fn new(source: CredentialSource, factory: F) -> Self {
        Self { source, factory }
    }

    /// Load credentials and connect a client
    ///
    /// Fails with `ProvisionerError::Config` before any provider call when the
    /// credentials file is missing or incomplete.
    pub async fn resolve(
        &self,
        override_region: Option<Option<&str>>,
    ) -> ProvisionerResult<F::Client> {
        let credentials = self.source.load().await?;
        let region = select_region(override_region, &credentials);

        debug!(
            path = %self.source.path().display(),
            tenant = %credentials.tenant_name,
            region = ?region,
            "Resolving provider client"
        );

        Ok(self.factory.connect(&credentials, region).await?)
    }
}
