//! Keno reduction feed parser (spec.md section 6.1): a JSON array whose
//! first element carries `drawNbr`, `drawDate`, `drawTime`, and
//! `drawNbrs` (20 raw keno numbers), reduced to a 3-digit sum draw by a
//! fixed index rule.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::error::{PipelineError, Result};

use super::ParsedDraw;

const A_INDICES: [usize; 6] = [1, 4, 7, 10, 13, 16];
const B_INDICES: [usize; 6] = [2, 5, 8, 11, 14, 17];
const C_INDICES: [usize; 6] = [3, 6, 9, 12, 15, 18];

#[derive(Deserialize)]
struct Row {
    #[serde(rename = "drawNbr")]
    draw_nbr: u64,
    #[serde(rename = "drawDate")]
    draw_date: String,
    #[serde(rename = "drawTime")]
    draw_time: String,
    #[serde(rename = "drawNbrs")]
    draw_nbrs: Vec<u32>,
}

pub fn parse(body: &[u8]) -> Result<Option<ParsedDraw>> {
    let rows: Vec<Row> = serde_json::from_slice(body)
        .map_err(|e| PipelineError::Parse(format!("keno reduction feed: {e}")))?;

    let Some(row) = rows.into_iter().next() else {
        return Ok(None);
    };

    if row.draw_nbrs.len() < 19 {
        return Ok(None);
    }

    let reduce = |indices: [usize; 6]| -> u8 {
        (indices.iter().map(|&i| row.draw_nbrs[i] as u64).sum::<u64>() % 10) as u8
    };
    let a = reduce(A_INDICES);
    let b = reduce(B_INDICES);
    let c = reduce(C_INDICES);
    let sum = a + b + c;

    let date = NaiveDate::parse_from_str(&row.draw_date, "%b %d, %Y")
        .map_err(|e| PipelineError::Parse(format!("drawDate {:?}: {e}", row.draw_date)))?;
    let time = NaiveTime::parse_from_str(&row.draw_time, "%I:%M:%S %p")
        .map_err(|e| PipelineError::Parse(format!("drawTime {:?}: {e}", row.draw_time)))?;
    let open_time_raw = date.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string();

    Ok(Some(ParsedDraw {
        issue: row.draw_nbr.to_string(),
        open_time_raw,
        open_nums_raw: format!("{a}+{b}+{c}"),
        sum: Some(sum),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_and_normalizes_time() {
        let mut nbrs = vec![0u32; 20];
        for &i in &A_INDICES {
            nbrs[i] = 1;
        }
        for &i in &B_INDICES {
            nbrs[i] = 2;
        }
        for &i in &C_INDICES {
            nbrs[i] = 3;
        }
        let body = serde_json::json!([{
            "drawNbr": 2025001,
            "drawDate": "Dec 10, 2025",
            "drawTime": "03:30:00 PM",
            "drawNbrs": nbrs,
        }]);
        let parsed = parse(body.to_string().as_bytes()).unwrap().unwrap();
        assert_eq!(parsed.issue, "2025001");
        assert_eq!(parsed.open_nums_raw, "6+2+8");
        assert_eq!(parsed.sum, Some(16));
        assert_eq!(parsed.open_time_raw, "2025-12-10 15:30:00");
    }
}
