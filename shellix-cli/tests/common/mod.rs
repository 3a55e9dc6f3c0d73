#![allow(dead_code)]

use assert_cmd::Command;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Stand-in for the docker CLI. Containers are marker files in
/// $FAKE_DOCKER_STATE and `exec` runs the command on the host.
const FAKE_DOCKER: &str = r#"#!/bin/sh
state="${FAKE_DOCKER_STATE:?}"
if [ -n "$FAKE_DOCKER_DOWN" ]; then
  echo "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?" >&2
  exit 1
fi
cmd="$1"; shift
case "$cmd" in
  inspect)
    for last; do :; done
    [ -f "$state/$last" ] && exit 0
    echo "Error: No such object: $last" >&2
    exit 1 ;;
  run)
    name=""
    while [ $# -gt 0 ]; do
      [ "$1" = "--name" ] && name="$2"
      shift
    done
    touch "$state/$name"
    echo "0123456789ab" ;;
  rm)
    for last; do :; done
    if [ -f "$state/$last" ]; then rm "$state/$last"; echo "$last"; exit 0; fi
    echo "Error: No such container: $last" >&2
    exit 1 ;;
  restart)
    [ -f "$state/$1" ] || { echo "Error: No such container: $1" >&2; exit 1; }
    echo "$1" ;;
  exec)
    name="$1"; shift
    [ -f "$state/$name" ] || { echo "Error: No such container: $name" >&2; exit 1; }
    exec "$@" ;;
  *)
    echo "unknown command: $cmd" >&2
    exit 1 ;;
esac
"#;

pub struct TestContext {
    pub cmd: Command,
    pub dir: TempDir,
    pub engine: PathBuf,
    pub state: PathBuf,
    pub logs: PathBuf,
}

impl TestContext {
    /// A fresh command sharing this context's engine state.
    pub fn new_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_shellix");
        let mut cmd = Command::new(bin_path);
        cmd.timeout(Duration::from_secs(30));
        cmd.env("FAKE_DOCKER_STATE", &self.state);
        cmd.env_remove("TOKEN");
        cmd.env_remove("SHELLIX_CONFIG");
        cmd.env_remove("SHELLIX_ENGINE");
        cmd.env_remove("SHELLIX_LOG_DIR");
        cmd.env_remove("FAKE_DOCKER_DOWN");
        cmd.arg("--engine-bin").arg(&self.engine);
        cmd.arg("--log-dir").arg(&self.logs);
        cmd
    }

    pub fn has_container(&self, name: &str) -> bool {
        self.state.join(name).exists()
    }
}

pub fn shellix() -> TestContext {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let state = dir.path().join("state");
    let logs = dir.path().join("logs");
    std::fs::create_dir_all(&state).expect("Failed to create state dir");

    let engine = dir.path().join("fake-docker");
    std::fs::write(&engine, FAKE_DOCKER).expect("Failed to write fake engine");
    std::fs::set_permissions(&engine, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake engine executable");

    let mut ctx = TestContext {
        cmd: Command::new(env!("CARGO_BIN_EXE_shellix")),
        dir,
        engine,
        state,
        logs,
    };
    ctx.cmd = ctx.new_cmd();
    ctx
}
