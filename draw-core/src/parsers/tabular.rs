//! Tabular sum feed parser (spec.md section 6.1): `{code, data:[{qihao,
//! opentime, opennum, sum}]}` or an equivalent shape; only the first
//! element of `data` is used.

use serde::Deserialize;

use crate::error::{PipelineError, Result};

use super::{normalize::normalize_numbers, ParsedDraw};

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<Row>,
}

#[derive(Deserialize)]
struct Row {
    qihao: String,
    opentime: String,
    opennum: String,
    #[serde(default)]
    sum: Option<u8>,
}

pub fn parse(body: &[u8]) -> Result<Option<ParsedDraw>> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| PipelineError::Parse(format!("tabular sum feed: {e}")))?;

    let Some(row) = envelope.data.into_iter().next() else {
        return Ok(None);
    };

    let Some(open_nums_raw) = normalize_numbers(&row.opennum) else {
        return Ok(None);
    };

    Ok(Some(ParsedDraw {
        issue: row.qihao,
        open_time_raw: row.opentime,
        open_nums_raw,
        sum: row.sum,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_row() {
        let body = br#"{"code":0,"data":[{"qihao":"2025001","opentime":"2025-12-10 15:30:00","opennum":"3+5+8","sum":16}]}"#;
        let parsed = parse(body).unwrap().unwrap();
        assert_eq!(parsed.issue, "2025001");
        assert_eq!(parsed.open_nums_raw, "3+5+8");
        assert_eq!(parsed.sum, Some(16));
    }

    #[test]
    fn empty_data_is_no_record() {
        let body = br#"{"code":0,"data":[]}"#;
        assert!(parse(body).unwrap().is_none());
    }
}
