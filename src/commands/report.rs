use crate::*;
use std::path::PathBuf;

fn default_output_path(config: &ConfigFile, group: &str, period: &ReportPeriod) -> PathBuf {
    PathBuf::from(&config.report.output_dir).join(format!(
        "{}_{}_{}.pdf",
        group,
        period.start.format("%Y-%m-%d"),
        period.end.format("%Y-%m-%d")
    ))
}

pub fn handle_report(cli: &Cli) -> anyhow::Result<()> {
    let period = ReportPeriod::parse(&cli.start, &cli.end)?;
    let config = load_config(cli.config.as_deref())?;

    let recipient = if cli.mail || cli.mail_to.is_some() {
        Some(resolve_recipient(
            cli.mail_to.as_deref(),
            &cli.groupname,
            &config.mail,
        )?)
    } else {
        None
    };

    let source = open_source(&cli.source, &config)?;
    let report = generate_report(source.as_ref(), &cli.groupname, &period, &config)?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&config, &cli.groupname, &period));
    let rendered = write_pdf(&report, &output)?;

    if let Some(to) = &recipient {
        dispatch(&report, &rendered, to, &config.mail)?;
    }

    let outcome = ReportOutcome {
        group: report.group.clone(),
        period,
        output: rendered.path,
        bytes: rendered.bytes,
        sha256: rendered.sha256,
        pages: rendered.pages,
        mailed_to: recipient,
        report,
    };
    print_one(cli.json, outcome, |o| {
        let mut line = format!(
            "wrote {} ({} pages, {} bytes) for group {}, {}",
            o.output,
            o.pages,
            o.bytes,
            o.group,
            o.period.label()
        );
        if let Some(to) = &o.mailed_to {
            line.push_str(&format!("; mailed to {}", to));
        }
        line
    })
}
