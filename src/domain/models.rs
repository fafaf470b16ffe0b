use crate::domain::constants::{
    DEFAULT_PARTITIONS, DEFAULT_QUOTA_REPORT, DEFAULT_SACCT, DEFAULT_SENDMAIL, DEFAULT_TITLE,
    DEFAULT_TOP_CONSUMERS, DEFAULT_WARN_RATIO, PREMIUM_ACCOUNTS,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct JsonErr {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

// ---- configuration -------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub slurm: SlurmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default = "default_premium")]
    pub premium: BTreeMap<String, Vec<String>>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            slurm: SlurmConfig::default(),
            storage: StorageConfig::default(),
            report: ReportConfig::default(),
            mail: MailConfig::default(),
            premium: default_premium(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SlurmConfig {
    #[serde(default = "default_sacct")]
    pub sacct: String,
    #[serde(default = "default_partitions")]
    pub partitions: Vec<String>,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        Self {
            sacct: default_sacct(),
            partitions: default_partitions(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_quota_report")]
    pub quota_report: String,
    #[serde(default = "default_warn_ratio")]
    pub warn_ratio: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            quota_report: default_quota_report(),
            warn_ratio: default_warn_ratio(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_top_consumers")]
    pub top_consumers: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            output_dir: default_output_dir(),
            top_consumers: default_top_consumers(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_sendmail")]
    pub sendmail: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub recipients: BTreeMap<String, String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sendmail: default_sendmail(),
            from: None,
            subject: None,
            recipients: BTreeMap::new(),
        }
    }
}

fn default_sacct() -> String {
    DEFAULT_SACCT.to_string()
}

fn default_partitions() -> Vec<String> {
    DEFAULT_PARTITIONS.iter().map(|p| p.to_string()).collect()
}

fn default_quota_report() -> String {
    DEFAULT_QUOTA_REPORT.to_string()
}

fn default_warn_ratio() -> f64 {
    DEFAULT_WARN_RATIO
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_top_consumers() -> usize {
    DEFAULT_TOP_CONSUMERS
}

fn default_sendmail() -> String {
    DEFAULT_SENDMAIL.to_string()
}

fn default_premium() -> BTreeMap<String, Vec<String>> {
    PREMIUM_ACCOUNTS
        .iter()
        .map(|(account, groups)| {
            (
                account.to_string(),
                groups.iter().map(|g| g.to_string()).collect(),
            )
        })
        .collect()
}

// ---- source records ------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user: String,
    pub resource: String,
    /// CPU time in CPU-seconds.
    pub quantity: u64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub user: String,
    pub filesystem: String,
    pub bytes_used: u64,
    #[serde(default)]
    pub quota: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub name: String,
    pub gid: u32,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswdEntry {
    pub user: String,
    pub uid: u32,
    pub gid: u32,
    #[serde(default)]
    pub gecos: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affiliation {
    Primary,
    Secondary,
}

impl Affiliation {
    pub fn label(self) -> &'static str {
        match self {
            Affiliation::Primary => "primary",
            Affiliation::Secondary => "secondary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub user: String,
    pub affiliation: Affiliation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMembership {
    pub group: String,
    pub gid: u32,
    pub members: Vec<Member>,
}

impl GroupMembership {
    pub fn user_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.user.clone()).collect()
    }

    pub fn contains(&self, user: &str) -> bool {
        self.members.iter().any(|m| m.user == user)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user: String,
    pub name: String,
    pub email: String,
    pub account_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

// ---- aggregates ----------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceTotals {
    pub jobs: u64,
    pub total: u64,
    pub max: u64,
}

impl ResourceTotals {
    pub fn add(&mut self, quantity: u64) -> Option<()> {
        let total = self.total.checked_add(quantity)?;
        self.jobs += 1;
        self.total = total;
        self.max = self.max.max(quantity);
        Some(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUsage {
    pub user: String,
    pub resources: BTreeMap<String, ResourceTotals>,
    pub jobs: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Consumer {
    pub user: String,
    pub jobs: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub resources: Vec<String>,
    pub per_user: Vec<UserUsage>,
    pub per_resource: BTreeMap<String, ResourceTotals>,
    pub record_count: u64,
    pub total: u64,
    pub top_consumers: Vec<Consumer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageSummary {
    pub rows: Vec<StorageRecord>,
    pub total_used: u64,
    pub total_quota: u64,
    pub warn_ratio: f64,
    pub near_quota: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub period: ReportPeriod,
    pub usage: UsageSummary,
    pub storage: Option<StorageSummary>,
}

// ---- report document -----------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Fields {
        fields: Vec<Field>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Note {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub title: String,
    pub group: String,
    pub gid: u32,
    pub period: ReportPeriod,
    pub sections: Vec<Section>,
}

// ---- command output ------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub path: String,
    pub bytes: usize,
    pub sha256: String,
    pub pages: usize,
}

#[derive(Debug, Serialize)]
pub struct ReportOutcome {
    pub group: String,
    pub period: ReportPeriod,
    pub output: String,
    pub bytes: usize,
    pub sha256: String,
    pub pages: usize,
    pub mailed_to: Option<String>,
    pub report: GroupReport,
}
