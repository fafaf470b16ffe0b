use crate::domain::constants::{SECTION_MEMBERS, SECTION_STORAGE, SECTION_SUMMARY, SECTION_USAGE};
use crate::domain::models::{
    Affiliation, Aggregate, Block, Field, GroupMembership, GroupReport, Section, StorageSummary,
    UsageSummary, UserProfile,
};
use crate::error::ReportError;
use std::collections::BTreeMap;

pub const NO_USAGE_NOTE: &str = "No usage recorded in this period.";
pub const NO_QUOTA_REPORT_NOTE: &str = "No quota report available for this group.";
pub const NO_MEMBERS_NOTE: &str = "This group has no members.";

pub struct ReportInputs<'a> {
    pub membership: &'a GroupMembership,
    pub profiles: &'a BTreeMap<String, UserProfile>,
    pub aggregate: &'a Aggregate,
}

pub fn build_report(inputs: &ReportInputs<'_>, title: &str) -> Result<GroupReport, ReportError> {
    let membership = inputs.membership;
    let aggregate = inputs.aggregate;

    let mut profiles = Vec::with_capacity(membership.members.len());
    for m in &membership.members {
        let profile = inputs.profiles.get(&m.user).ok_or_else(|| {
            ReportError::MissingData(format!("no user profile for member {}", m.user))
        })?;
        profiles.push((m.affiliation, profile));
    }

    Ok(GroupReport {
        title: title.to_string(),
        group: membership.group.clone(),
        gid: membership.gid,
        period: aggregate.period,
        sections: vec![
            summary_section(membership, aggregate),
            storage_section(aggregate.storage.as_ref()),
            usage_section(&aggregate.usage),
            members_section(&profiles),
        ],
    })
}

pub fn cpu_hours(cpu_seconds: u64) -> String {
    format!("{:.2}", cpu_seconds as f64 / 3600.0)
}

pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

fn percent(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", part as f64 * 100.0 / whole as f64)
}

fn field(label: &str, value: impl Into<String>) -> Field {
    Field {
        label: label.to_string(),
        value: value.into(),
    }
}

fn note(text: &str) -> Block {
    Block::Note {
        text: text.to_string(),
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|h| h.to_string()).collect()
}

fn summary_section(membership: &GroupMembership, aggregate: &Aggregate) -> Section {
    let usage = &aggregate.usage;
    let primary = membership
        .members
        .iter()
        .filter(|m| m.affiliation == Affiliation::Primary)
        .count();
    let secondary = membership.members.len() - primary;

    let mut fields = vec![
        field(
            "Group",
            format!("{} (gid {})", membership.group, membership.gid),
        ),
        field(
            "Period",
            format!("{} ({} days)", aggregate.period.label(), aggregate.period.days()),
        ),
        field(
            "Members",
            format!(
                "{} ({} primary, {} secondary)",
                membership.members.len(),
                primary,
                secondary
            ),
        ),
        field("Jobs", usage.record_count.to_string()),
        field("CPU hours", cpu_hours(usage.total)),
    ];
    for resource in &usage.resources {
        let totals = usage.per_resource.get(resource).copied().unwrap_or_default();
        fields.push(field(
            &format!("CPU hours ({})", resource),
            format!("{} in {} jobs", cpu_hours(totals.total), totals.jobs),
        ));
    }
    match &aggregate.storage {
        Some(storage) => {
            fields.push(field(
                "Storage used",
                format!(
                    "{} of {} quota",
                    human_bytes(storage.total_used),
                    human_bytes(storage.total_quota)
                ),
            ));
            fields.push(field(
                &format!("Members at or above {:.0}% of quota", storage.warn_ratio * 100.0),
                if storage.near_quota.is_empty() {
                    "none".to_string()
                } else {
                    storage.near_quota.join(", ")
                },
            ));
        }
        None => fields.push(field("Storage used", "no quota report")),
    }

    let mut blocks = vec![Block::Fields { fields }];
    if usage.record_count == 0 {
        blocks.push(note(NO_USAGE_NOTE));
    } else if !usage.top_consumers.is_empty() {
        blocks.push(Block::Table {
            headers: headers(&["Rank", "User", "Jobs", "CPU hours", "Share"]),
            rows: usage
                .top_consumers
                .iter()
                .enumerate()
                .map(|(idx, c)| {
                    vec![
                        (idx + 1).to_string(),
                        c.user.clone(),
                        c.jobs.to_string(),
                        cpu_hours(c.total),
                        percent(c.total, usage.total),
                    ]
                })
                .collect(),
        });
    }

    Section {
        title: SECTION_SUMMARY.to_string(),
        blocks,
    }
}

fn storage_section(storage: Option<&StorageSummary>) -> Section {
    let Some(storage) = storage else {
        return Section {
            title: SECTION_STORAGE.to_string(),
            blocks: vec![note(NO_QUOTA_REPORT_NOTE)],
        };
    };

    let rows: Vec<Vec<String>> = storage
        .rows
        .iter()
        .map(|r| {
            vec![
                r.user.clone(),
                r.filesystem.clone(),
                human_bytes(r.bytes_used),
                r.quota.map(human_bytes).unwrap_or_else(|| "none".to_string()),
                r.quota
                    .map(|q| percent(r.bytes_used, q))
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let mut blocks = vec![Block::Table {
        headers: headers(&["User", "Filesystem", "Used", "Quota", "% used"]),
        rows,
    }];
    if storage.rows.is_empty() {
        blocks.push(note("The quota report has no entries for group members."));
    } else {
        blocks.push(Block::Fields {
            fields: vec![
                field("Total used", human_bytes(storage.total_used)),
                field("Total quota", human_bytes(storage.total_quota)),
            ],
        });
    }
    Section {
        title: SECTION_STORAGE.to_string(),
        blocks,
    }
}

fn usage_section(usage: &UsageSummary) -> Section {
    let mut head = vec!["User".to_string()];
    for resource in &usage.resources {
        head.push(format!("{} jobs", resource));
        head.push(format!("{} CPU h", resource));
    }
    head.push("Jobs".to_string());
    head.push("CPU h".to_string());

    let mut rows: Vec<Vec<String>> = usage
        .per_user
        .iter()
        .filter(|u| u.jobs > 0)
        .map(|u| {
            let mut row = vec![u.user.clone()];
            for resource in &usage.resources {
                let t = u.resources.get(resource).copied().unwrap_or_default();
                row.push(t.jobs.to_string());
                row.push(cpu_hours(t.total));
            }
            row.push(u.jobs.to_string());
            row.push(cpu_hours(u.total));
            row
        })
        .collect();

    let empty = rows.is_empty();
    if !empty {
        let mut total = vec!["TOTAL".to_string()];
        for resource in &usage.resources {
            let t = usage.per_resource.get(resource).copied().unwrap_or_default();
            total.push(t.jobs.to_string());
            total.push(cpu_hours(t.total));
        }
        total.push(usage.record_count.to_string());
        total.push(cpu_hours(usage.total));
        rows.push(total);
    }

    let mut blocks = vec![Block::Table {
        headers: head,
        rows,
    }];
    if empty {
        blocks.push(note(NO_USAGE_NOTE));
    }
    Section {
        title: SECTION_USAGE.to_string(),
        blocks,
    }
}

fn members_section(profiles: &[(Affiliation, &UserProfile)]) -> Section {
    let rows: Vec<Vec<String>> = profiles
        .iter()
        .map(|(affiliation, p)| {
            vec![
                p.user.clone(),
                p.name.clone(),
                p.email.clone(),
                affiliation.label().to_string(),
                if p.account_types.is_empty() {
                    "-".to_string()
                } else {
                    p.account_types.join(", ")
                },
            ]
        })
        .collect();

    let mut blocks = vec![Block::Table {
        headers: headers(&["User", "Name", "Email", "Affiliation", "Premium accounts"]),
        rows,
    }];
    if profiles.is_empty() {
        blocks.push(note(NO_MEMBERS_NOTE));
    }
    Section {
        title: SECTION_MEMBERS.to_string(),
        blocks,
    }
}
