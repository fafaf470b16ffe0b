mod common;

use common::TestEnv;
use predicates::prelude::*;
use predicates::str::contains;

#[test]
fn help_lists_period_flags() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("-S <YYYY-MM-DD>"))
        .stdout(contains("-E <YYYY-MM-DD>"))
        .stdout(contains("--mail-to"));
}

#[test]
fn version_prints_package_version() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn period_flags_are_required() {
    let env = TestEnv::new();
    env.cmd()
        .args(["labX", "-S", "2023-01-01"])
        .assert()
        .failure()
        .stderr(contains("-E <YYYY-MM-DD>"));
}

#[test]
fn text_mode_reports_written_file() {
    let env = TestEnv::new();
    let pdf = env.pdf("labx.pdf");
    env.cmd()
        .arg("--source")
        .arg(&env.snapshot)
        .args(["labX", "-S", "2023-01-01", "-E", "2023-01-31", "-o"])
        .arg(&pdf)
        .assert()
        .success()
        .stdout(contains("wrote "))
        .stdout(contains("for group labX, 2023-01-01 to 2023-01-31"))
        .stdout(contains("mailed").not());
    assert!(pdf.exists());
}

#[test]
fn text_mode_errors_go_to_stderr_with_code() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--source")
        .arg(&env.snapshot)
        .args(["nosuchgroup", "-S", "2023-01-01", "-E", "2023-01-31", "-o"])
        .arg(env.pdf("x.pdf"))
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(contains("error[UNKNOWN_GROUP]"));
}

#[test]
fn verbose_logs_pipeline_steps_to_stderr() {
    let env = TestEnv::new();
    env.cmd()
        .arg("-v")
        .arg("--source")
        .arg(&env.snapshot)
        .args(["labX", "-S", "2023-01-01", "-E", "2023-01-31", "-o"])
        .arg(env.pdf("v.pdf"))
        .assert()
        .success()
        .stderr(contains("aggregated usage"));
}

#[test]
fn missing_explicit_config_fails() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--config")
        .arg(env.root.join("absent.toml"))
        .arg("--source")
        .arg(&env.snapshot)
        .args(["labX", "-S", "2023-01-01", "-E", "2023-01-31", "-o"])
        .arg(env.pdf("c.pdf"))
        .assert()
        .code(1)
        .stderr(contains("error[ERROR]"));
    assert!(!env.pdf("c.pdf").exists());
}
