use crate::cli::DEFAULT_SOURCE;
use crate::domain::constants::SNAPSHOT_FILE;
use crate::domain::models::{
    ConfigFile, GroupEntry, GroupMembership, PasswdEntry, ReportPeriod, StorageRecord,
    UsageRecord, UserProfile,
};
use crate::error::ReportError;
use crate::services::directory::{build_profile, resolve_membership};
use crate::services::slurm::SlurmSource;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub trait DataSource {
    fn membership(&self, group: &str) -> anyhow::Result<GroupMembership>;
    fn profile(&self, user: &str) -> anyhow::Result<UserProfile>;
    fn usage(&self, users: &[String], period: &ReportPeriod) -> anyhow::Result<Vec<UsageRecord>>;
    /// `None` when no quota report exists for the group.
    fn storage(&self, group: &str) -> anyhow::Result<Option<Vec<StorageRecord>>>;
    fn describe(&self) -> String;
}

pub fn resolve_snapshot_file(source: &str) -> PathBuf {
    let p = Path::new(source);
    if p.is_dir() {
        p.join(SNAPSHOT_FILE)
    } else {
        p.to_path_buf()
    }
}

pub fn open_source(source: &str, config: &ConfigFile) -> anyhow::Result<Box<dyn DataSource>> {
    if source == DEFAULT_SOURCE {
        return Ok(Box::new(SlurmSource::from_config(config)));
    }
    let file = resolve_snapshot_file(source);
    Ok(Box::new(SnapshotSource::load(&file, config)?))
}

#[derive(Debug, Deserialize)]
struct SnapshotUser {
    #[serde(flatten)]
    entry: PasswdEntry,
    #[serde(default)]
    groups: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    groups: Vec<GroupEntry>,
    #[serde(default)]
    users: Vec<SnapshotUser>,
    #[serde(default)]
    usage: Vec<UsageRecord>,
    #[serde(default)]
    storage: BTreeMap<String, Vec<StorageRecord>>,
}

pub struct SnapshotSource {
    path: PathBuf,
    snapshot: Snapshot,
    premium: BTreeMap<String, Vec<String>>,
}

impl SnapshotSource {
    pub fn load(path: &Path, config: &ConfigFile) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReportError::MissingData(format!("cannot read snapshot {}: {}", path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            ReportError::MissingData(format!("invalid snapshot {}: {}", path.display(), e))
        })?;
        tracing::info!(
            path = %path.display(),
            groups = snapshot.groups.len(),
            users = snapshot.users.len(),
            usage = snapshot.usage.len(),
            "loaded snapshot"
        );
        Ok(Self {
            path: path.to_path_buf(),
            snapshot,
            premium: config.premium.clone(),
        })
    }

    fn passwd(&self) -> Vec<PasswdEntry> {
        self.snapshot.users.iter().map(|u| u.entry.clone()).collect()
    }
}

impl DataSource for SnapshotSource {
    fn membership(&self, group: &str) -> anyhow::Result<GroupMembership> {
        let entry = self
            .snapshot
            .groups
            .iter()
            .find(|g| g.name == group)
            .ok_or_else(|| ReportError::UnknownGroup(group.to_string()))?;
        Ok(resolve_membership(entry, &self.passwd()))
    }

    fn profile(&self, user: &str) -> anyhow::Result<UserProfile> {
        let found = self
            .snapshot
            .users
            .iter()
            .find(|u| u.entry.user == user)
            .ok_or_else(|| ReportError::MissingData(format!("no passwd entry for {}", user)))?;
        let mut groups = found.groups.clone();
        for g in &self.snapshot.groups {
            let listed = g.members.iter().any(|m| m == user);
            if (listed || g.gid == found.entry.gid) && !groups.contains(&g.name) {
                groups.push(g.name.clone());
            }
        }
        Ok(build_profile(&found.entry, &groups, &self.premium))
    }

    fn usage(&self, users: &[String], _period: &ReportPeriod) -> anyhow::Result<Vec<UsageRecord>> {
        Ok(self
            .snapshot
            .usage
            .iter()
            .filter(|r| users.contains(&r.user))
            .cloned()
            .collect())
    }

    fn storage(&self, group: &str) -> anyhow::Result<Option<Vec<StorageRecord>>> {
        Ok(self.snapshot.storage.get(group).cloned())
    }

    fn describe(&self) -> String {
        format!("snapshot:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::report_error;
    use tempfile::TempDir;

    fn write_snapshot(dir: &Path) {
        let snapshot = serde_json::json!({
            "groups": [
                {"name": "labx", "gid": 5001, "members": ["carol"]},
                {"name": "priority2", "gid": 6002, "members": ["alice"]}
            ],
            "users": [
                {"user": "alice", "uid": 1001, "gid": 5001, "gecos": "Alice,,,,alice@example.edu"},
                {"user": "carol", "uid": 1003, "gid": 100, "gecos": "Carol", "groups": ["gpu-he"]}
            ],
            "usage": [
                {"user": "alice", "resource": "batch", "quantity": 60, "timestamp": "2023-01-02T08:00:00"},
                {"user": "mallory", "resource": "batch", "quantity": 99, "timestamp": "2023-01-02T08:00:00"}
            ],
            "storage": {
                "labx": [{"user": "alice", "filesystem": "/data/labx", "bytes_used": 10, "quota": 100}]
            }
        });
        std::fs::write(dir.join("snapshot.json"), snapshot.to_string()).unwrap();
    }

    #[test]
    fn directory_source_resolves_snapshot_file_and_answers_queries() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path());
        let config = ConfigFile::default();
        let source = open_source(dir.path().to_str().unwrap(), &config).unwrap();

        let m = source.membership("labx").unwrap();
        assert_eq!(m.user_ids(), vec!["alice", "carol"]);

        let alice = source.profile("alice").unwrap();
        assert_eq!(alice.email, "alice@example.edu");
        assert_eq!(alice.account_types, vec!["priority"]);
        let carol = source.profile("carol").unwrap();
        assert_eq!(carol.account_types, vec!["gpu-he"]);

        let period = ReportPeriod::parse("2023-01-01", "2023-01-31").unwrap();
        let usage = source.usage(&m.user_ids(), &period).unwrap();
        assert_eq!(usage.len(), 1);

        assert_eq!(source.storage("labx").unwrap().unwrap().len(), 1);
        assert!(source.storage("priority2").unwrap().is_none());
    }

    #[test]
    fn unknown_group_and_user_map_to_typed_errors() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path());
        let source = SnapshotSource::load(&dir.path().join("snapshot.json"), &ConfigFile::default())
            .unwrap();

        let err = source.membership("nope").unwrap_err();
        assert_eq!(report_error(&err).unwrap().code(), "UNKNOWN_GROUP");
        let err = source.profile("ghost").unwrap_err();
        assert_eq!(report_error(&err).unwrap().code(), "MISSING_DATA");
    }

    #[test]
    fn unreadable_snapshot_is_missing_data() {
        let dir = TempDir::new().unwrap();
        let err = open_source(
            dir.path().join("absent.json").to_str().unwrap(),
            &ConfigFile::default(),
        )
        .err()
        .expect("missing snapshot fails");
        assert_eq!(report_error(&err).unwrap().code(), "MISSING_DATA");
    }
}
