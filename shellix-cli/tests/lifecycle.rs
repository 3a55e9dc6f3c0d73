use predicates::prelude::*;
use rstest::rstest;

mod common;

#[test]
fn test_create_then_exists() {
    let mut ctx = common::shellix();

    ctx.cmd
        .args(["create", "42", "Alpine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user_container_42"))
        .stderr(predicate::str::contains("alpine:latest"));
    assert!(ctx.has_container("user_container_42"));

    ctx.new_cmd()
        .args(["create", "42", "Alpine"])
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_create_unknown_distribution() {
    let mut ctx = common::shellix();
    ctx.cmd
        .args(["create", "42", "Plan9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown distribution"));
    assert!(!ctx.has_container("user_container_42"));
}

#[test]
fn test_rm_created() {
    let mut ctx = common::shellix();
    ctx.cmd.args(["create", "7"]).assert().success();

    ctx.new_cmd()
        .args(["rm", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user_container_7"));
    assert!(!ctx.has_container("user_container_7"));
}

#[test]
fn test_restart_created() {
    let mut ctx = common::shellix();
    ctx.cmd.args(["create", "8", "Debian"]).assert().success();

    ctx.new_cmd()
        .args(["restart", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user_container_8"));
    assert!(ctx.has_container("user_container_8"));
}

#[rstest]
#[case::rm("rm")]
#[case::restart("restart")]
fn test_unknown_user(#[case] verb: &str) {
    let mut ctx = common::shellix();
    ctx.cmd
        .args([verb, "non-existent-user"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_rm_partial_failure_summary() {
    let mut ctx = common::shellix();
    ctx.cmd.args(["create", "1"]).assert().success();

    ctx.new_cmd()
        .args(["rm", "1", "2"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("user_container_1"))
        .stderr(predicate::str::contains("Failed to remove 1 of 2 container(s)"));
}

#[test]
fn test_unreachable_engine() {
    let mut ctx = common::shellix();
    ctx.cmd
        .env("FAKE_DOCKER_DOWN", "1")
        .args(["create", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unreachable"));
}
