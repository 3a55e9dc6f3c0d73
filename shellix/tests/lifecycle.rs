//! Integration tests for the lifecycle controller (create, destroy, restart).

use shellix::lifecycle::LifecycleOutcome;
use shellix::{ShellixError, UserId};
use shellix_test_utils::{EngineCall, TestRuntime};

// ============================================================================
// CREATE
// ============================================================================

#[tokio::test]
async fn create_starts_container_from_catalog_image() {
    let ctx = TestRuntime::new();
    let user = UserId::from(42);

    let outcome = ctx.runtime.lifecycle().create_for(&user, "alpine").await.unwrap();

    match outcome {
        LifecycleOutcome::Created(d) => assert_eq!(d.image, "alpine:latest"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        ctx.engine.image_of("user_container_42").as_deref(),
        Some("alpine:latest")
    );
    assert!(
        ctx.engine
            .labels_of("user_container_42")
            .contains(&("shellix.user".to_string(), "42".to_string()))
    );
    assert!(ctx.runtime.registry().is_live(&user).await.unwrap());
}

#[tokio::test]
async fn create_twice_is_idempotent() {
    let ctx = TestRuntime::new();
    let user = UserId::from(7);

    let first = ctx.runtime.lifecycle().create_for(&user, "Ubuntu").await.unwrap();
    let second = ctx.runtime.lifecycle().create_for(&user, "Ubuntu").await.unwrap();

    assert!(matches!(first, LifecycleOutcome::Created(_)));
    assert_eq!(second, LifecycleOutcome::AlreadyExists);
    assert_eq!(ctx.engine.create_calls(), 1);
    assert!(ctx.runtime.registry().is_live(&user).await.unwrap());
}

#[tokio::test]
async fn create_with_unknown_label_makes_no_engine_create() {
    let ctx = TestRuntime::new();
    let err = ctx
        .runtime
        .lifecycle()
        .create_for(&UserId::from(1), "Plan 9")
        .await
        .unwrap_err();

    assert!(matches!(err, ShellixError::Validation(_)));
    assert_eq!(ctx.engine.create_calls(), 0);
}

#[tokio::test]
async fn create_failure_is_distinct_from_validation() {
    let ctx = TestRuntime::new();
    ctx.engine.fail_create(true);
    let user = UserId::from(1);

    let err = ctx.runtime.lifecycle().create_for(&user, "Debian").await.unwrap_err();

    assert!(matches!(err, ShellixError::EngineOperation { op: "create", .. }));
    assert!(!ctx.runtime.registry().is_live(&user).await.unwrap());
}

// ============================================================================
// DESTROY
// ============================================================================

#[tokio::test]
async fn destroy_absent_reports_not_found_without_remove() {
    let ctx = TestRuntime::new();
    let err = ctx
        .runtime
        .lifecycle()
        .destroy_for(&UserId::from(3))
        .await
        .unwrap_err();

    assert!(matches!(err, ShellixError::NotFound(_)));
    assert_eq!(ctx.engine.remove_calls(), 0);
}

#[tokio::test]
async fn destroy_live_makes_user_absent() {
    let ctx = TestRuntime::new();
    let user = UserId::from(3);
    ctx.runtime.lifecycle().create_for(&user, "Alpine").await.unwrap();

    let outcome = ctx.runtime.lifecycle().destroy_for(&user).await.unwrap();

    assert_eq!(outcome, LifecycleOutcome::Destroyed);
    assert!(!ctx.runtime.registry().is_live(&user).await.unwrap());
    assert_eq!(ctx.engine.remove_calls(), 1);
}

#[tokio::test]
async fn failed_destroy_leaves_container_live() {
    let ctx = TestRuntime::new();
    let user = UserId::from(3);
    ctx.runtime.lifecycle().create_for(&user, "Alpine").await.unwrap();
    ctx.engine.fail_remove(true);

    let err = ctx.runtime.lifecycle().destroy_for(&user).await.unwrap_err();

    assert!(matches!(err, ShellixError::EngineOperation { op: "remove", .. }));
    assert!(ctx.runtime.registry().is_live(&user).await.unwrap());
}

// ============================================================================
// RESTART
// ============================================================================

#[tokio::test]
async fn restart_absent_is_not_found() {
    let ctx = TestRuntime::new();
    let err = ctx
        .runtime
        .lifecycle()
        .restart_for(&UserId::from(9))
        .await
        .unwrap_err();
    assert!(matches!(err, ShellixError::NotFound(_)));
    assert_eq!(ctx.engine.restart_calls(), 0);
}

#[tokio::test]
async fn restart_failure_keeps_container() {
    let ctx = TestRuntime::new();
    let user = UserId::from(9);
    ctx.runtime.lifecycle().create_for(&user, "Fedora").await.unwrap();

    assert_eq!(
        ctx.runtime.lifecycle().restart_for(&user).await.unwrap(),
        LifecycleOutcome::Restarted
    );

    ctx.engine.fail_restart(true);
    let err = ctx.runtime.lifecycle().restart_for(&user).await.unwrap_err();
    assert!(matches!(err, ShellixError::EngineOperation { op: "restart", .. }));
    assert!(ctx.runtime.registry().is_live(&user).await.unwrap());
    assert_eq!(ctx.engine.remove_calls(), 0);
}

// ============================================================================
// ENGINE AVAILABILITY
// ============================================================================

#[tokio::test]
async fn unreachable_engine_is_reported_as_such() {
    let ctx = TestRuntime::new();
    ctx.engine.set_unreachable(true);

    let err = ctx
        .runtime
        .lifecycle()
        .create_for(&UserId::from(5), "Alpine")
        .await
        .unwrap_err();

    assert!(matches!(err, ShellixError::EngineUnreachable(_)));
    assert_eq!(
        ctx.engine.calls(),
        vec![EngineCall::Exists("user_container_5".into())]
    );
}
