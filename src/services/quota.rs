use crate::domain::models::StorageRecord;
use crate::error::ReportError;
use std::path::Path;

pub fn parse_size(raw: &str) -> Option<u64> {
    let s = raw.trim();
    let s = s
        .strip_suffix("iB")
        .or_else(|| s.strip_suffix('B'))
        .unwrap_or(s);
    let (digits, shift) = match s.chars().last()? {
        'K' | 'k' => (&s[..s.len() - 1], 10),
        'M' | 'm' => (&s[..s.len() - 1], 20),
        'G' | 'g' => (&s[..s.len() - 1], 30),
        'T' | 't' => (&s[..s.len() - 1], 40),
        'P' | 'p' => (&s[..s.len() - 1], 50),
        _ => (s, 0),
    };
    if digits.contains('.') {
        let value: f64 = digits.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let bytes = (value * (1u64 << shift) as f64).round();
        // 2^64 is the first value `as u64` would saturate.
        if bytes >= u64::MAX as f64 {
            return None;
        }
        return Some(bytes as u64);
    }
    let value: u64 = digits.parse().ok()?;
    value.checked_mul(1u64 << shift)
}

fn parse_quota(raw: &str) -> Option<Option<u64>> {
    match raw.trim() {
        "-" | "none" | "NONE" => Some(None),
        other => match parse_size(other)? {
            0 => Some(None),
            n => Some(Some(n)),
        },
    }
}

pub fn parse_quota_report(raw: &str) -> Result<Vec<StorageRecord>, ReportError> {
    let mut out = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let bad = || {
            ReportError::MissingData(format!("quota report line {}: `{}`", idx + 1, line))
        };
        if fields.len() != 4 {
            return Err(bad());
        }
        out.push(StorageRecord {
            user: fields[0].to_string(),
            filesystem: fields[1].to_string(),
            bytes_used: parse_size(fields[2]).ok_or_else(bad)?,
            quota: parse_quota(fields[3]).ok_or_else(bad)?,
        });
    }
    Ok(out)
}

pub fn load_quota_report(path: &Path) -> Result<Option<Vec<StorageRecord>>, ReportError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "no quota report");
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ReportError::MissingData(format!("cannot read quota report {}: {}", path.display(), e))
    })?;
    parse_quota_report(&raw).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sizes_accept_binary_suffixes() {
        assert_eq!(parse_size("512"), Some(512));
        assert_eq!(parse_size("2K"), Some(2048));
        assert_eq!(parse_size("1.5G"), Some(1_610_612_736));
        assert_eq!(parse_size("3TiB"), Some(3 << 40));
        assert_eq!(parse_size("10GB"), Some(10 << 30));
        assert_eq!(parse_size("ten"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn sizes_beyond_u64_are_rejected() {
        assert_eq!(parse_size("20000.5P"), None);
        assert_eq!(parse_size("16384P"), None);
        assert_eq!(parse_size("16383.5P"), Some(16383 * (1 << 50) + (1 << 49)));
        let err = parse_quota_report("alice /data/labx 1G 20000.5P").unwrap_err();
        assert!(matches!(err, ReportError::MissingData(_)));
    }

    #[test]
    fn parses_report_with_comments_and_unlimited_quota() {
        let raw = "# user fs used quota\n\nalice /data/labx 120G 1T\nbob /data/labx 4096 -\n";
        let rows = parse_quota_report(raw).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bytes_used, 120 << 30);
        assert_eq!(rows[0].quota, Some(1 << 40));
        assert_eq!(rows[1].quota, None);
    }

    #[test]
    fn malformed_line_is_missing_data() {
        let err = parse_quota_report("alice /data/labx lots 1T").unwrap_err();
        assert!(matches!(err, ReportError::MissingData(_)));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn absent_report_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_quota_report(&dir.path().join("labx-quota-report.txt"))
            .unwrap()
            .is_none());
    }
}
