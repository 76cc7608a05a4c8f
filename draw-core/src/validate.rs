//! Stateful validation (spec.md section 4.5): time parsing and the
//! non-regression check, both of which need information the pure
//! `draw-model` structural validator does not have (the current date,
//! the last-committed-issue pointer).

use chrono::{NaiveDateTime, TimeZone, Utc};
use draw_model::Issue;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::time::source_offset;

/// Parses a source's wall-clock time string in the fixed `+08:00` zone
/// into an absolute instant. Accepts `YYYY-MM-DD HH:MM:SS` or, when the
/// year is omitted, `MM-DD HH:MM:SS` with the current `+08:00` year
/// substituted in (spec.md section 4.5). The compensating UTC-shift the
/// teacher's ORM layer required is deliberately absent here: this is
/// the only place a zone conversion happens (spec.md section 9, "Time
/// handling").
pub fn parse_open_time(raw: &str, now: chrono::DateTime<Utc>) -> Result<chrono::DateTime<Utc>> {
    let offset = source_offset();
    let raw = raw.trim();

    let naive = if let Ok(n) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        n
    } else {
        let current_year = now.with_timezone(&offset).format("%Y").to_string();
        let with_year = format!("{current_year}-{raw}");
        NaiveDateTime::parse_from_str(&with_year, "%Y-%m-%d %H:%M:%S")
            .map_err(|_| PipelineError::Parse(format!("unrecognized open_time: {raw:?}")))?
    };

    match offset.from_local_datetime(&naive).single() {
        Some(local) => Ok(local.with_timezone(&Utc)),
        None => Err(PipelineError::Parse(format!(
            "ambiguous or invalid local time: {raw:?}"
        ))),
    }
}

/// Non-regression check (spec.md section 4.5): does not abort
/// processing, only warns, since concurrent multi-source back-fill is
/// expected.
pub fn check_non_regression(issue: &Issue, last_issue: Option<&Issue>) {
    if let Some(last) = last_issue {
        if issue <= last {
            warn!(issue = %issue, last_issue = %last, "issue did not advance last-issue pointer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_year_form() {
        let now = Utc::now();
        let t = parse_open_time("2025-12-10 15:30:00", now).unwrap();
        let local = t.with_timezone(&source_offset());
        assert_eq!(local.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-12-10 15:30:00");
    }

    #[test]
    fn parses_year_omitted_form_using_current_year() {
        let now = chrono::DateTime::parse_from_rfc3339("2025-06-01T00:00:00+08:00")
            .unwrap()
            .with_timezone(&Utc);
        let t = parse_open_time("12-10 15:30:00", now).unwrap();
        let local = t.with_timezone(&source_offset());
        assert_eq!(local.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-12-10 15:30:00");
    }

    #[test]
    fn rejects_garbage() {
        let now = Utc::now();
        assert!(parse_open_time("not-a-time", now).is_err());
    }
}
