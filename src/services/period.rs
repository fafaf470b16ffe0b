use crate::domain::models::ReportPeriod;
use crate::error::ReportError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMAT: &str = "%Y-%m-%d";

impl ReportPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidPeriod(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ReportError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn first_instant(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    pub fn last_instant(&self) -> NaiveDateTime {
        // 23:59:59 is always representable.
        self.end
            .and_hms_opt(23, 59, 59)
            .unwrap_or_else(|| self.end.and_time(NaiveTime::MIN))
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        let day = ts.date();
        day >= self.start && day <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn label(&self) -> String {
        format!(
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
        ReportError::InvalidPeriod(format!("`{}` is not a YYYY-MM-DD date ({})", raw, e))
    })
}
