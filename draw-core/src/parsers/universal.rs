//! Universal parser (spec.md section 4.2): tolerates varied container
//! shapes and field names via a fixed name table, rather than the
//! dynamic reflection the original system used (spec.md section 9,
//! "Dynamic field maps vs typed enrichment").

use serde_json::Value;

use crate::error::{PipelineError, Result};

use super::{normalize::normalize_numbers, ParsedDraw};

const ISSUE_KEYS: &[&str] = &["issue", "qihao", "expect", "drawNbr", "code"];
const TIME_KEYS: &[&str] = &["open_time", "opentime", "time", "drawDate", "date"];
const NUMS_KEYS: &[&str] = &["open_nums", "opennum", "numbers", "nums"];
const SUM_KEYS: &[&str] = &["sum", "total"];
const CONTAINER_KEYS: &[&str] = &["data", "result", "list", "items"];

pub fn parse(body: &[u8]) -> Result<Option<ParsedDraw>> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| PipelineError::Parse(format!("universal: {e}")))?;

    let Some(row) = first_record(&value) else {
        return Ok(None);
    };

    let Some(issue) = lookup_string(row, ISSUE_KEYS) else {
        return Ok(None);
    };
    let Some(open_time_raw) = lookup_string(row, TIME_KEYS) else {
        return Ok(None);
    };
    let Some(nums_raw) = lookup_string(row, NUMS_KEYS) else {
        return Ok(None);
    };
    let Some(open_nums_raw) = normalize_numbers(&nums_raw) else {
        return Ok(None);
    };

    let sum = lookup_string(row, SUM_KEYS).and_then(|s| s.parse::<u8>().ok());

    Ok(Some(ParsedDraw {
        issue,
        open_time_raw,
        open_nums_raw,
        sum,
    }))
}

/// Resolves the container shape: a bare object, a bare array, or an
/// object wrapping an array under one of `CONTAINER_KEYS`. Returns the
/// first element in the array cases.
fn first_record(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            for key in CONTAINER_KEYS {
                if let Some(Value::Array(arr)) = map.get(*key) {
                    return arr.first();
                }
            }
            Some(value)
        }
        Value::Array(arr) => arr.first(),
        _ => None,
    }
}

fn lookup_string(row: &Value, keys: &[&str]) -> Option<String> {
    let obj = row.as_object()?;
    for key in keys {
        if let Some(v) = obj.get(*key) {
            return match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_nested_container_and_alt_names() {
        let body = br#"{"result":[{"expect":"2025001","date":"2025-12-10 15:30:00","nums":"3,5,8"}]}"#;
        let parsed = parse(body).unwrap().unwrap();
        assert_eq!(parsed.issue, "2025001");
        assert_eq!(parsed.open_nums_raw, "3+5+8");
        assert_eq!(parsed.sum, None);
    }

    #[test]
    fn bare_array_top_level() {
        let body = br#"[{"issue":"2025002","time":"2025-12-11 10:00:00","numbers":"1+2+3","sum":6}]"#;
        let parsed = parse(body).unwrap().unwrap();
        assert_eq!(parsed.issue, "2025002");
        assert_eq!(parsed.sum, Some(6));
    }
}
