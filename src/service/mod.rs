// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Security Group Lifecycle
//!
//! Orchestrates credential resolution, name lookup, provider mutation and
//! event notification for one task invocation.
//!
//! # Architecture
//!
//! ```text
//! Task (provision / terminate)
//!     ↓
//! Service Layer (this module)
//!     ↓
//! Credential Resolver → bound provider client
//!     ↓
//! Locator (uniqueness check)
//!     ↓
//! Provider mutation (create group + rules / delete group)
//!     ↓
//! Event Notifier (provision only)
//! ```
//!
//! # Design Principles
//!
//! 1. **Stateless**: every invocation re-resolves credentials and re-queries the provider
//! 2. **Injected capabilities**: provider client factory and notifier are generic parameters
//! 3. **No rollback**: partial rule creation is reported, never undone
//!
//! # Example
//!
//! ```rust,ignore
//! use cosmo_sg_provisioner::service::{ProvisioningService, SecurityGroupService};
//!
//! let service = ProvisioningService::new(resolver, notifier);
//! service.provision("node_1", &CloudConfig::default(), &spec).await?;
//! service.terminate(&CloudConfig::default(), &spec).await?;
//! ```

pub mod security_group;

pub use security_group::{ProvisioningService, SecurityGroupService};
