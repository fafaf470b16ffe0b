use crate::domain::models::{GroupReport, MailConfig, Rendered};
use crate::error::ReportError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

const BASE64_LINE: usize = 76;

pub fn resolve_recipient(
    explicit: Option<&str>,
    group: &str,
    mail: &MailConfig,
) -> Result<String, ReportError> {
    explicit
        .map(str::to_string)
        .or_else(|| mail.recipients.get(group).cloned())
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| {
            ReportError::DispatchError(format!(
                "no recipient for group {} (use --mail-to or [mail.recipients])",
                group
            ))
        })
}

fn wrap_base64(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE * 2);
    for chunk in encoded.as_bytes().chunks(BASE64_LINE) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out
}

pub fn build_message(
    report: &GroupReport,
    rendered: &Rendered,
    pdf: &[u8],
    to: &str,
    mail: &MailConfig,
) -> String {
    let boundary = format!("group-report-{}", &rendered.sha256[..16.min(rendered.sha256.len())]);
    let filename = Path::new(&rendered.path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("{}.pdf", report.group));
    let subject = mail.subject.clone().unwrap_or_else(|| {
        format!(
            "{}: {} ({})",
            report.title,
            report.group,
            report.period.label()
        )
    });

    let mut msg = String::new();
    if let Some(from) = &mail.from {
        msg.push_str(&format!("From: {}\r\n", from));
    }
    msg.push_str(&format!("To: {}\r\n", to));
    msg.push_str(&format!("Subject: {}\r\n", subject));
    msg.push_str("MIME-Version: 1.0\r\n");
    msg.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
        boundary
    ));
    msg.push_str(&format!("--{}\r\n", boundary));
    msg.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
    msg.push_str(&format!(
        "Attached is the resource usage report for group {} covering {}.\r\n\r\n",
        report.group,
        report.period.label()
    ));
    msg.push_str(&format!("--{}\r\n", boundary));
    msg.push_str(&format!(
        "Content-Type: application/pdf; name=\"{}\"\r\n",
        filename
    ));
    msg.push_str("Content-Transfer-Encoding: base64\r\n");
    msg.push_str(&format!(
        "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
        filename
    ));
    msg.push_str(&wrap_base64(pdf));
    msg.push_str(&format!("--{}--\r\n", boundary));
    msg
}

pub fn send(message: &str, mail: &MailConfig) -> Result<(), ReportError> {
    let mut child = Command::new(&mail.sendmail)
        .args(["-t", "-oi"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ReportError::DispatchError(format!("cannot run {}: {}", mail.sendmail, e)))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(message.as_bytes())
            .map_err(|e| ReportError::DispatchError(format!("writing to sendmail: {}", e)))?;
    }
    let output = child
        .wait_with_output()
        .map_err(|e| ReportError::DispatchError(format!("waiting for sendmail: {}", e)))?;
    if !output.status.success() {
        return Err(ReportError::DispatchError(format!(
            "{} exited with {}: {}",
            mail.sendmail,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

pub fn dispatch(
    report: &GroupReport,
    rendered: &Rendered,
    to: &str,
    mail: &MailConfig,
) -> Result<(), ReportError> {
    let pdf = std::fs::read(&rendered.path)
        .map_err(|e| ReportError::DispatchError(format!("{}: {}", rendered.path, e)))?;
    let message = build_message(report, rendered, &pdf, to, mail);
    send(&message, mail)?;
    tracing::info!(to, group = %report.group, "mailed report");
    Ok(())
}
