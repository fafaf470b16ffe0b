use crate::domain::models::{
    Aggregate, Consumer, GroupMembership, ReportPeriod, ResourceTotals, StorageRecord,
    StorageSummary, UsageRecord, UsageSummary, UserUsage,
};
use crate::error::ReportError;
use std::collections::BTreeMap;

pub struct AggregateOptions<'a> {
    pub resources: &'a [String],
    pub top_consumers: usize,
    pub warn_ratio: f64,
}

pub fn aggregate(
    membership: &GroupMembership,
    usage: &[UsageRecord],
    storage: Option<&[StorageRecord]>,
    period: &ReportPeriod,
    options: &AggregateOptions<'_>,
) -> Result<Aggregate, ReportError> {
    if period.start > period.end {
        return Err(ReportError::InvalidPeriod(format!(
            "start {} is after end {}",
            period.start, period.end
        )));
    }

    let mut per_user: BTreeMap<&str, UserUsage> = membership
        .members
        .iter()
        .map(|m| {
            (
                m.user.as_str(),
                UserUsage {
                    user: m.user.clone(),
                    resources: BTreeMap::new(),
                    jobs: 0,
                    total: 0,
                },
            )
        })
        .collect();
    let mut per_resource: BTreeMap<String, ResourceTotals> = options
        .resources
        .iter()
        .map(|r| (r.clone(), ResourceTotals::default()))
        .collect();
    let mut record_count = 0u64;
    let mut total = 0u64;
    let mut skipped = 0usize;

    for record in usage {
        let Some(user) = per_user.get_mut(record.user.as_str()) else {
            skipped += 1;
            continue;
        };
        if !period.contains(&record.timestamp) {
            skipped += 1;
            continue;
        }
        let overflow = || {
            ReportError::MissingData(format!(
                "CPU time of {} overflows the usage totals ({} CPU-seconds)",
                record.user, record.quantity
            ))
        };
        user.resources
            .entry(record.resource.clone())
            .or_default()
            .add(record.quantity)
            .ok_or_else(overflow)?;
        user.jobs += 1;
        user.total = user.total.checked_add(record.quantity).ok_or_else(overflow)?;
        per_resource
            .entry(record.resource.clone())
            .or_default()
            .add(record.quantity)
            .ok_or_else(overflow)?;
        record_count += 1;
        total = total.checked_add(record.quantity).ok_or_else(overflow)?;
    }
    if skipped > 0 {
        tracing::debug!(skipped, "ignored records outside group or period");
    }

    let mut resources: Vec<String> = options.resources.to_vec();
    for name in per_resource.keys() {
        if !resources.contains(name) {
            resources.push(name.clone());
        }
    }

    let per_user: Vec<UserUsage> = per_user.into_values().collect();
    let mut top: Vec<Consumer> = per_user
        .iter()
        .filter(|u| u.total > 0)
        .map(|u| Consumer {
            user: u.user.clone(),
            jobs: u.jobs,
            total: u.total,
        })
        .collect();
    top.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.user.cmp(&b.user)));
    top.truncate(options.top_consumers);

    Ok(Aggregate {
        period: *period,
        usage: UsageSummary {
            resources,
            per_user,
            per_resource,
            record_count,
            total,
            top_consumers: top,
        },
        storage: storage
            .map(|rows| summarize_storage(membership, rows, options.warn_ratio))
            .transpose()?,
    })
}

fn summarize_storage(
    membership: &GroupMembership,
    rows: &[StorageRecord],
    warn_ratio: f64,
) -> Result<StorageSummary, ReportError> {
    let mut rows: Vec<StorageRecord> = rows
        .iter()
        .filter(|r| membership.contains(&r.user))
        .cloned()
        .collect();
    rows.sort_by(|a, b| a.user.cmp(&b.user).then_with(|| a.filesystem.cmp(&b.filesystem)));

    let mut near_quota: Vec<String> = Vec::new();
    for r in &rows {
        if let Some(quota) = r.quota {
            if r.bytes_used as f64 >= quota as f64 * warn_ratio && !near_quota.contains(&r.user) {
                near_quota.push(r.user.clone());
            }
        }
    }

    let overflow = |what: &str| {
        ReportError::MissingData(format!("storage {} overflows the group total", what))
    };
    let total_used =
        checked_sum(rows.iter().map(|r| r.bytes_used)).ok_or_else(|| overflow("usage"))?;
    let total_quota =
        checked_sum(rows.iter().filter_map(|r| r.quota)).ok_or_else(|| overflow("quota"))?;

    Ok(StorageSummary {
        total_used,
        total_quota,
        warn_ratio,
        near_quota,
        rows,
    })
}

fn checked_sum(values: impl Iterator<Item = u64>) -> Option<u64> {
    values.fold(Some(0u64), |acc, v| acc?.checked_add(v))
}
