use predicates::prelude::*;

mod common;

#[test]
fn test_exec_prints_merged_output() {
    let mut ctx = common::shellix();
    ctx.cmd.args(["create", "5", "Alpine"]).assert().success();

    ctx.new_cmd()
        .args(["exec", "5", "echo", "hello;", "echo", "oops", ">&2"])
        .assert()
        .success()
        .stdout("hello\noops\n");
}

#[test]
fn test_exec_failure_sets_exit_status() {
    let mut ctx = common::shellix();
    ctx.cmd.args(["create", "5"]).assert().success();

    ctx.new_cmd()
        .args(["exec", "5", "echo partial; exit 3"])
        .assert()
        .failure()
        .stdout("partial\n")
        .stderr(predicate::str::contains("non-zero"));
}

#[test]
fn test_exec_without_container() {
    let mut ctx = common::shellix();
    ctx.cmd
        .args(["exec", "6", "ls"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No container for user 6"));
}

#[test]
fn test_exec_timeout() {
    let mut ctx = common::shellix();
    ctx.cmd.args(["create", "5"]).assert().success();

    ctx.new_cmd()
        .args(["--exec-timeout", "1", "exec", "5", "sleep 10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timed out"));
}

#[test]
fn test_exec_writes_activity_log() {
    let mut ctx = common::shellix();
    ctx.cmd.args(["create", "9"]).assert().success();

    ctx.new_cmd().args(["exec", "9", "true"]).assert().success();

    let log = std::fs::read_to_string(ctx.logs.join("user_9.log")).unwrap();
    assert!(log.trim_end().ends_with("] true"));
}
