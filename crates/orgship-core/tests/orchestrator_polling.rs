//! Poll-loop behaviour of the deployment orchestrator.

mod support;

use std::time::Duration;

use orgship_core::Error;
use orgship_core::deploy::{
    ComponentFailure, DeployDetails, DeployState, DeployStatus, DeploymentRequest, Orchestrator,
    PollSettings, TestLevel, TestPlan,
};
use tokio_util::sync::CancellationToken;

use support::service::{ScriptedService, done, in_progress};

fn poll(max_attempts: u32) -> PollSettings {
    PollSettings {
        interval: Duration::from_secs(30),
        max_attempts,
    }
}

fn request() -> DeploymentRequest {
    DeploymentRequest {
        archive: b"PK".to_vec(),
        validate_only: false,
        tests: TestPlan {
            level: TestLevel::NoTestRun,
            tests: Vec::new(),
        },
        contains_code: false,
    }
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn times_out_after_max_attempts() {
    let service = ScriptedService::never_done();
    let outcome = Orchestrator::new(&service, poll(5))
        .deploy(&request())
        .await
        .unwrap();

    assert_eq!(
        outcome.state,
        DeployState::TimedOut {
            async_id: service.async_id().to_string()
        }
    );
    assert_eq!(outcome.status_checks, 5);
    assert_eq!(
        service.detail_flags(),
        vec![false, false, true, false, false]
    );
}

#[tokio::test(start_paused = true)]
async fn timeout_converts_to_error_with_async_id() {
    let service = ScriptedService::never_done();
    let err = Orchestrator::new(&service, poll(5))
        .deploy(&request())
        .await
        .unwrap()
        .into_result()
        .unwrap_err();

    match err {
        Error::Timeout { async_id, attempts } => {
            assert_eq!(async_id, service.async_id());
            assert_eq!(attempts, 5);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

// =============================================================================
// Detail cadence
// =============================================================================

#[tokio::test(start_paused = true)]
async fn fetches_details_once_more_when_done_on_a_plain_check() {
    let service = ScriptedService::new([in_progress(), done(true)]);
    let outcome = Orchestrator::new(&service, poll(10))
        .deploy(&request())
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(service.detail_flags(), vec![false, false, true]);
    assert_eq!(outcome.status_checks, 3);
}

#[tokio::test(start_paused = true)]
async fn no_extra_fetch_when_done_on_a_detailed_check() {
    let service = ScriptedService::new([in_progress(), in_progress(), done(true)]);
    let outcome = Orchestrator::new(&service, poll(10))
        .deploy(&request())
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(service.detail_flags(), vec![false, false, true]);
}

#[tokio::test(start_paused = true)]
async fn failed_deployment_carries_component_failures() {
    let mut failed = done(false);
    failed.details = Some(DeployDetails {
        component_failures: vec![ComponentFailure {
            file_name: "classes/A.cls".into(),
            full_name: "A".into(),
            component_type: Some("ApexClass".into()),
            line: Some(3),
            column: Some(7),
            problem: "Unexpected token".into(),
        }],
        ..DeployDetails::default()
    });
    let service = ScriptedService::new([failed]);
    let outcome = Orchestrator::new(&service, poll(10))
        .deploy(&request())
        .await
        .unwrap();

    assert_eq!(outcome.state, DeployState::Failed);
    assert_eq!(outcome.component_failures.len(), 1);
    assert_eq!(outcome.component_failures[0].problem, "Unexpected token");
}

// =============================================================================
// Service errors
// =============================================================================

#[tokio::test(start_paused = true)]
async fn error_code_stops_polling() {
    let rejected = DeployStatus {
        error_status_code: Some("INVALID_CROSS_REFERENCE_KEY".into()),
        error_message: Some("bad reference".into()),
        ..in_progress()
    };
    let service = ScriptedService::new([in_progress(), rejected]);
    let outcome = Orchestrator::new(&service, poll(10))
        .deploy(&request())
        .await
        .unwrap();

    assert_eq!(
        outcome.state,
        DeployState::ServiceError {
            code: "INVALID_CROSS_REFERENCE_KEY".into(),
            message: "bad reference".into()
        }
    );
    assert_eq!(service.detail_flags().len(), 2);
    assert!(matches!(
        outcome.into_result(),
        Err(Error::Service { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn submit_failure_is_not_retried() {
    let service = ScriptedService::failing_submit();
    let err = Orchestrator::new(&service, poll(10))
        .deploy(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Service { ref code, .. } if code == "INVALID_SESSION_ID"));
    assert!(service.detail_flags().is_empty());
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn cancelled_before_polling() {
    let service = ScriptedService::never_done();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = Orchestrator::new(&service, poll(10))
        .with_cancellation(cancel)
        .deploy(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled { .. }));
    assert!(service.detail_flags().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_sleep() {
    let service = ScriptedService::never_done();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(45)).await;
        token.cancel();
    });

    let err = Orchestrator::new(&service, poll(100))
        .with_cancellation(cancel)
        .deploy(&request())
        .await
        .unwrap_err();

    match err {
        Error::Cancelled { async_id } => assert_eq!(async_id, service.async_id()),
        other => panic!("expected cancellation, got {other:?}"),
    }
    assert_eq!(service.detail_flags().len(), 1);
}
