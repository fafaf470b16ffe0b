use crate::domain::models::{ConfigFile, GroupReport, ReportPeriod};
use crate::services::aggregate::{aggregate, AggregateOptions};
use crate::services::report::{build_report, ReportInputs};
use crate::services::source::DataSource;
use anyhow::Context;
use std::collections::BTreeMap;

pub fn generate_report(
    source: &dyn DataSource,
    group: &str,
    period: &ReportPeriod,
    config: &ConfigFile,
) -> anyhow::Result<GroupReport> {
    tracing::info!(
        group,
        period = %period.label(),
        source = %source.describe(),
        "gathering report data"
    );

    let membership = source
        .membership(group)
        .with_context(|| format!("looking up members of {}", group))?;
    let users = membership.user_ids();

    let mut profiles = BTreeMap::new();
    for user in &users {
        let profile = source
            .profile(user)
            .with_context(|| format!("looking up user {}", user))?;
        profiles.insert(user.clone(), profile);
    }

    let usage = source
        .usage(&users, period)
        .with_context(|| format!("querying usage for {}", group))?;
    let storage = source
        .storage(group)
        .with_context(|| format!("reading quota report for {}", group))?;

    let aggregated = aggregate(
        &membership,
        &usage,
        storage.as_deref(),
        period,
        &AggregateOptions {
            resources: &config.slurm.partitions,
            top_consumers: config.report.top_consumers,
            warn_ratio: config.storage.warn_ratio,
        },
    )?;
    tracing::info!(
        members = users.len(),
        records = aggregated.usage.record_count,
        cpu_seconds = aggregated.usage.total,
        "aggregated usage"
    );

    let report = build_report(
        &ReportInputs {
            membership: &membership,
            profiles: &profiles,
            aggregate: &aggregated,
        },
        &config.report.title,
    )?;
    Ok(report)
}
