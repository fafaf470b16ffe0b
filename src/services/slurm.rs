use crate::domain::models::{
    ConfigFile, GroupMembership, ReportPeriod, StorageRecord, UsageRecord, UserProfile,
};
use crate::error::ReportError;
use crate::services::directory::{
    build_profile, parse_group_line, parse_passwd, parse_passwd_line, resolve_membership,
};
use crate::services::quota::load_quota_report;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Output};

// `getent` exit status for "key not found".
const GETENT_NOT_FOUND: i32 = 2;

const SACCT_FORMAT: &str = "--format=User,Partition,CPUTimeRaw,Submit";
const SLURM_TIME_FORMAT: &str = "SLURM_TIME_FORMAT";

pub struct SlurmSource {
    sacct: String,
    partitions: Vec<String>,
    quota_report: String,
    premium: BTreeMap<String, Vec<String>>,
}

impl SlurmSource {
    pub fn from_config(config: &ConfigFile) -> Self {
        Self {
            sacct: config.slurm.sacct.clone(),
            partitions: config.slurm.partitions.clone(),
            quota_report: config.storage.quota_report.clone(),
            premium: config.premium.clone(),
        }
    }

    fn quota_report_path(&self, group: &str) -> PathBuf {
        PathBuf::from(self.quota_report.replace("{group}", group))
    }
}

fn run(program: &str, args: &[String]) -> Result<Output, ReportError> {
    run_with_env(program, args, &[])
}

fn run_with_env(
    program: &str,
    args: &[String],
    env: &[(&str, &str)],
) -> Result<Output, ReportError> {
    tracing::debug!(program, ?args, ?env, "running");
    Command::new(program)
        .args(args)
        .envs(env.iter().copied())
        .output()
        .map_err(|e| ReportError::MissingData(format!("cannot run {}: {}", program, e)))
}

fn stdout_of(program: &str, output: Output) -> Result<String, ReportError> {
    if !output.status.success() {
        return Err(ReportError::MissingData(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl crate::services::source::DataSource for SlurmSource {
    fn membership(&self, group: &str) -> anyhow::Result<GroupMembership> {
        let out = run("getent", &["group".to_string(), group.to_string()])?;
        if out.status.code() == Some(GETENT_NOT_FOUND) {
            return Err(ReportError::UnknownGroup(group.to_string()).into());
        }
        let raw = stdout_of("getent group", out)?;
        let line = raw
            .lines()
            .next()
            .ok_or_else(|| ReportError::UnknownGroup(group.to_string()))?;
        let entry = parse_group_line(line)?;

        let passwd_out = run("getent", &["passwd".to_string()])?;
        let passwd = parse_passwd(&stdout_of("getent passwd", passwd_out)?)?;
        let membership = resolve_membership(&entry, &passwd);
        tracing::info!(
            group,
            gid = entry.gid,
            members = membership.members.len(),
            "resolved membership"
        );
        Ok(membership)
    }

    fn profile(&self, user: &str) -> anyhow::Result<UserProfile> {
        let out = run("getent", &["passwd".to_string(), user.to_string()])?;
        if out.status.code() == Some(GETENT_NOT_FOUND) {
            return Err(ReportError::MissingData(format!("no passwd entry for {}", user)).into());
        }
        let raw = stdout_of("getent passwd", out)?;
        let line = raw
            .lines()
            .next()
            .ok_or_else(|| ReportError::MissingData(format!("no passwd entry for {}", user)))?;
        let entry = parse_passwd_line(line)?;

        let id_out = run("id", &["-Gn".to_string(), user.to_string()])?;
        let groups: Vec<String> = stdout_of("id", id_out)?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        Ok(build_profile(&entry, &groups, &self.premium))
    }

    fn usage(&self, users: &[String], period: &ReportPeriod) -> anyhow::Result<Vec<UsageRecord>> {
        if users.is_empty() {
            return Ok(Vec::new());
        }
        let mut args = vec![
            "-u".to_string(),
            users.join(","),
            "-S".to_string(),
            period.first_instant().format("%Y-%m-%dT%H:%M:%S").to_string(),
            "-E".to_string(),
            period.last_instant().format("%Y-%m-%dT%H:%M:%S").to_string(),
        ];
        if !self.partitions.is_empty() {
            args.push("-r".to_string());
            args.push(self.partitions.join(","));
        }
        args.extend(["-X", "-n", "-P", SACCT_FORMAT].iter().map(|s| s.to_string()));

        // Submit is parsed as ISO 8601, so override any user SLURM_TIME_FORMAT.
        let out = run_with_env(&self.sacct, &args, &[(SLURM_TIME_FORMAT, "standard")])?;
        let raw = stdout_of(&self.sacct, out)?;
        let records = parse_sacct(&raw)?;
        tracing::info!(records = records.len(), "fetched accounting records");
        Ok(records)
    }

    fn storage(&self, group: &str) -> anyhow::Result<Option<Vec<StorageRecord>>> {
        let path = self.quota_report_path(group);
        Ok(load_quota_report(&path)?)
    }

    fn describe(&self) -> String {
        format!("slurm:{}", self.sacct)
    }
}

pub fn parse_sacct(raw: &str) -> Result<Vec<UsageRecord>, ReportError> {
    let mut out = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < 4 {
            return Err(ReportError::MissingData(format!(
                "unexpected sacct line: {}",
                line
            )));
        }
        let quantity = fields[2].trim().parse::<u64>().map_err(|_| {
            ReportError::MissingData(format!("bad CPUTimeRaw in sacct line: {}", line))
        })?;
        let timestamp = NaiveDateTime::parse_from_str(fields[3].trim(), "%Y-%m-%dT%H:%M:%S")
            .map_err(|_| {
                ReportError::MissingData(format!("bad Submit time in sacct line: {}", line))
            })?;
        // Pending jobs may list several candidate partitions.
        let resource = fields[1].split(',').next().unwrap_or_default().trim();
        out.push(UsageRecord {
            user: fields[0].trim().to_string(),
            resource: resource.to_string(),
            quantity,
            timestamp,
        });
    }
    Ok(out)
}
