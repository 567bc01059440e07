//! Security group provisioning for OpenStack compute
//!
//! Task handlers that create and delete Nova security groups on behalf of an
//! orchestration manager, with a one-group-per-name guard and a `running`
//! state event after provisioning.

pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod locator;
pub mod nats;
pub mod provider;
pub mod resolver;
pub mod service;
pub mod tasks;

// Re-export commonly used types
pub use config::{CloudConfig, CloudCredentials, CredentialSource};
pub use domain::{RuleSpec, SecurityGroup, SecurityGroupSpec};
pub use errors::{InfrastructureError, InfrastructureResult, ProvisionerError, ProvisionerResult};
pub use events::{EventNotifier, StateTransition};
pub use provider::{ClientFactory, ProviderError, SecurityGroupProvider};
pub use resolver::CredentialResolver;
pub use service::{ProvisioningService, SecurityGroupService};
