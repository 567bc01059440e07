// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Group Domain Models
//!
//! Value types exchanged between the task handlers, the service layer and
//! the provider capability:
//!
//! - [`SecurityGroupSpec`] / [`RuleSpec`] - caller-supplied desired state
//! - [`SecurityGroup`] / [`SecurityGroupRule`] - provider-realized state
//! - [`NewRule`] - a single rule-creation request
//!
//! Specs are consumed once per invocation. Realized groups are never cached;
//! every lookup goes back to the provider.

pub mod security_group;

pub use security_group::{
    NewRule, RuleSource, RuleSpec, SecurityGroup, SecurityGroupRule, SecurityGroupSpec,
    DEFAULT_DESCRIPTION, RULE_PROTOCOL,
};
