// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for task dispatch
//!
//! Task payloads are decoded the way they arrive from NATS and run through
//! the handler against the in-memory provider. No NATS server is needed.

mod fixtures;

use std::sync::Arc;

use cosmo_sg_provisioner::errors::ProvisionerError;
use cosmo_sg_provisioner::nats::MessageHandler;
use cosmo_sg_provisioner::tasks::{TaskHandler, TaskRequest, DEFAULT_TASK_SUBJECT_PREFIX};

use fixtures::*;

fn provision_payload(name: &str) -> serde_json::Value {
    serde_json::json!({
        "task": "provision",
        "correlation_id": CORRELATION_ID,
        "cloud_config": {},
        "security_group": {
            "name": name,
            "description": format!("description for {}", name),
            "rules": [{"port": PORT, "cidr": CIDR}]
        }
    })
}

fn terminate_payload(name: &str) -> serde_json::Value {
    serde_json::json!({
        "task": "terminate",
        "cloud_config": {},
        "security_group": {"name": name}
    })
}

fn decode(payload: serde_json::Value) -> TaskRequest {
    serde_json::from_value(payload).expect("Invalid task payload")
}

#[tokio::test]
async fn test_handler_subject() {
    let h = harness();
    let handler = TaskHandler::new(Arc::new(h.service), DEFAULT_TASK_SUBJECT_PREFIX);
    assert_eq!(handler.subject(), "cosmo.tasks.sg.>");
}

#[tokio::test]
async fn test_provision_and_terminate_tasks() {
    let h = harness();
    let provider = h.provider.clone();
    let notifier = h.notifier.clone();
    let handler = TaskHandler::new(Arc::new(h.service), DEFAULT_TASK_SUBJECT_PREFIX);

    handler
        .handle(decode(provision_payload("cosmo_test_task")))
        .await
        .expect("Provision task failed");
    assert_eq!(provider.count_named("cosmo_test_task").await, 1);
    assert_eq!(notifier.transitions().await.len(), 1);

    handler
        .handle(decode(terminate_payload("cosmo_test_task")))
        .await
        .expect("Terminate task failed");
    assert_eq!(provider.count_named("cosmo_test_task").await, 0);
}

#[tokio::test]
async fn test_failed_task_keeps_error_kind() {
    let h = harness();
    let handler = TaskHandler::new(Arc::new(h.service), DEFAULT_TASK_SUBJECT_PREFIX);

    let err = handler
        .execute(decode(terminate_payload("cosmo_test_absent")))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionerError::NotFound { .. }));

    let err = handler
        .handle(decode(terminate_payload("cosmo_test_absent")))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("[not_found]"));
}

#[tokio::test]
async fn test_duplicate_provision_task_fails() {
    let h = harness();
    let handler = TaskHandler::new(Arc::new(h.service), DEFAULT_TASK_SUBJECT_PREFIX);

    handler
        .execute(decode(provision_payload("cosmo_test_again")))
        .await
        .unwrap();
    let err = handler
        .execute(decode(provision_payload("cosmo_test_again")))
        .await
        .unwrap_err();

    assert!(err.is_already_exists());
}
