use predicates::prelude::*;

mod common;

#[test]
fn test_serve_requires_token() {
    let mut ctx = common::shellix();
    ctx.cmd
        .arg("serve")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Token not found"));
}

#[test]
fn test_serve_rejects_blank_token() {
    let mut ctx = common::shellix();
    ctx.cmd
        .args(["serve", "--token", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Token not found"));
}

#[test]
fn test_serve_rejects_bad_config() {
    let mut ctx = common::shellix();
    let config = ctx.dir.path().join("shellix.json");
    std::fs::write(&config, r#"{"distributions": []}"#).unwrap();

    ctx.cmd
        .arg("--config")
        .arg(&config)
        .args(["serve", "--token", "123:abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("catalog must not be empty"));
}
