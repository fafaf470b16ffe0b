#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Sum of the ten in-period `labX` records, in CPU-seconds.
pub const LABX_CPU_SECONDS: u64 = 36_000;

pub struct TestEnv {
    _tmp: TempDir,
    pub root: PathBuf,
    pub home: PathBuf,
    pub snapshot: PathBuf,
    pub out: PathBuf,
    cargo_home: PathBuf,
    rustup_home: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().to_path_buf();
        let home = root.join("home");
        fs::create_dir_all(&home).expect("create isolated home");
        let out = root.join("out");

        let snapshot = make_fixture_snapshot(&root);

        let orig_home = std::env::var("HOME").unwrap_or_default();
        let cargo_home = PathBuf::from(&orig_home).join(".cargo");
        let rustup_home = PathBuf::from(&orig_home).join(".rustup");

        Self {
            _tmp: tmp,
            root,
            home,
            snapshot,
            out,
            cargo_home,
            rustup_home,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("group-report");
        cmd.env("HOME", &self.home)
            .env("CARGO_HOME", &self.cargo_home)
            .env("RUSTUP_HOME", &self.rustup_home)
            .env_remove("GROUP_REPORT_LOG");
        cmd
    }

    pub fn pdf(&self, name: &str) -> PathBuf {
        self.out.join(name)
    }

    /// Runs a report against the fixture snapshot with `--json`.
    pub fn report_cmd(&self, group: &str, start: &str, end: &str, output: &Path) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("--json")
            .arg("--source")
            .arg(self.snapshot.to_str().expect("snapshot path utf8"))
            .args([group, "-S", start, "-E", end, "-o"])
            .arg(output);
        cmd
    }

    pub fn run_json(&self, group: &str, start: &str, end: &str, output: &Path) -> Value {
        let out = self
            .report_cmd(group, start, end, output)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn run_json_failure(
        &self,
        group: &str,
        start: &str,
        end: &str,
        output: &Path,
        code: i32,
    ) -> Value {
        let out = self
            .report_cmd(group, start, end, output)
            .assert()
            .code(code)
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("error json output")
    }

    pub fn write_config(&self, body: &str) -> PathBuf {
        let path = self.home.join(".config/group-report/config.toml");
        fs::create_dir_all(path.parent().expect("config parent")).expect("create config dir");
        fs::write(&path, body).expect("write config");
        path
    }
}

pub fn section<'a>(report: &'a Value, title: &str) -> &'a Value {
    report["sections"]
        .as_array()
        .expect("sections array")
        .iter()
        .find(|s| s["title"] == title)
        .unwrap_or_else(|| panic!("section {} present", title))
}

pub fn first_block<'a>(section: &'a Value, kind: &str) -> &'a Value {
    section["blocks"]
        .as_array()
        .expect("blocks array")
        .iter()
        .find(|b| b["kind"] == kind)
        .unwrap_or_else(|| panic!("{} block present", kind))
}

fn job(user: &str, resource: &str, quantity: u64, ts: &str) -> Value {
    json!({"user": user, "resource": resource, "quantity": quantity, "timestamp": ts})
}

fn make_fixture_snapshot(base: &Path) -> PathBuf {
    let dir = base.join("cluster");
    fs::create_dir_all(&dir).expect("create snapshot dir");

    let snapshot = json!({
        "groups": [
            {"name": "labX", "gid": 5001, "members": ["carol"]},
            {"name": "quietlab", "gid": 5002, "members": ["dave"]},
            {"name": "ghostlab", "gid": 5003, "members": []},
            {"name": "brokenlab", "gid": 5004, "members": ["nobody"]},
            {"name": "priority1", "gid": 6001, "members": ["alice"]},
            {"name": "pri-gpu", "gid": 6002, "members": ["alice", "bob"]}
        ],
        "users": [
            {"user": "alice", "uid": 1001, "gid": 5001, "gecos": "Alice Smith,,,,alice@example.edu"},
            {"user": "bob", "uid": 1002, "gid": 5001, "gecos": "Bob Jones"},
            {"user": "carol", "uid": 1003, "gid": 100, "gecos": "Carol King,,,,carol@example.edu"},
            {"user": "dave", "uid": 1004, "gid": 100, "gecos": ""},
            {"user": "mallory", "uid": 1005, "gid": 100, "gecos": "Mallory"}
        ],
        "usage": [
            job("alice", "batch", 3600, "2023-01-02T09:00:00"),
            job("alice", "batch", 7200, "2023-01-03T09:00:00"),
            job("alice", "gpu", 1800, "2023-01-10T14:00:00"),
            job("alice", "bigmem", 5400, "2023-01-15T08:30:00"),
            job("bob", "batch", 3600, "2023-01-05T10:00:00"),
            job("bob", "batch", 1800, "2023-01-06T11:00:00"),
            job("bob", "gpu", 3600, "2023-01-31T23:30:00"),
            job("carol", "batch", 900, "2023-01-01T00:00:00"),
            job("carol", "gpu", 2700, "2023-01-20T16:45:00"),
            job("carol", "batch", 5400, "2023-01-25T07:15:00"),
            job("alice", "batch", 99_999, "2023-02-01T00:00:00"),
            job("bob", "batch", 88_888, "2022-12-31T23:59:59"),
            job("mallory", "batch", 50_000, "2023-01-10T10:00:00")
        ],
        "storage": {
            "labX": [
                {"user": "alice", "filesystem": "/data/labx", "bytes_used": 128_849_018_880u64, "quota": 1_099_511_627_776u64},
                {"user": "bob", "filesystem": "/data/labx", "bytes_used": 1_020_054_732_800u64, "quota": 1_099_511_627_776u64},
                {"user": "mallory", "filesystem": "/data/labx", "bytes_used": 5_000, "quota": null}
            ]
        }
    });
    let path = dir.join("snapshot.json");
    fs::write(
        &path,
        serde_json::to_string_pretty(&snapshot).expect("serialize snapshot"),
    )
    .expect("write snapshot");
    path
}
