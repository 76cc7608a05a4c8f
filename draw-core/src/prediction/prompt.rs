//! Prompt construction (spec.md section 4.8 step 3): recent history, a
//! same-day count summary, a 3-draw trend string, and a bias-balancing
//! hint when one label has dominated the last 10 predictions.

use draw_model::{Draw, PredictionType};

use crate::time::local_date;

const BIAS_THRESHOLD: f64 = 0.7;

pub fn build(kind: PredictionType, recent_draws: &[Draw], recent_values: &[String]) -> draw_contracts::Prompt {
    let system = format!(
        "You are predicting the {} of the next 3-digit sum draw. \
         Respond with only the predicted value in the required grammar, no explanation.",
        kind.key()
    );

    let history = history_lines(recent_draws);
    let same_day = same_day_summary(recent_draws);
    let trend = trend_string(recent_draws);
    let bias_hint = bias_hint(recent_values);

    let mut user = format!(
        "Recent draws (newest first):\n{history}\n\nSame-day count: {same_day}\nLast 3-draw trend: {trend}\n"
    );
    if let Some(hint) = bias_hint {
        user.push_str(&format!("\n{hint}\n"));
    }
    user.push_str(&format!("\nPredict the {}.", kind.key()));

    draw_contracts::Prompt { system, user }
}

fn history_lines(draws: &[Draw]) -> String {
    draws
        .iter()
        .map(|d| format!("{}: {} (sum={})", d.issue, d.open_nums, d.sum))
        .collect::<Vec<_>>()
        .join("\n")
}

fn same_day_summary(draws: &[Draw]) -> String {
    if draws.is_empty() {
        return "0 draws".to_string();
    }
    let today = local_date(draws[0].open_time);
    let count = draws.iter().filter(|d| local_date(d.open_time) == today).count();
    format!("{count} draws so far today")
}

/// A short textual trend over the most recent three draws' magnitude
/// and parity, newest first.
fn trend_string(draws: &[Draw]) -> String {
    draws
        .iter()
        .take(3)
        .map(|d| {
            let magnitude = if d.is_big { "big" } else { "small" };
            let parity = if d.is_odd { "odd" } else { "even" };
            format!("{magnitude}-{parity}")
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// When one label occupies more than 70% of the last 10 predicted
/// values, returns a hint nudging the model toward balance (spec.md
/// section 4.8 step 3, section 9 open question on the threshold).
fn bias_hint(recent_values: &[String]) -> Option<String> {
    if recent_values.is_empty() {
        return None;
    }
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for v in recent_values {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    let total = recent_values.len() as f64;
    counts.into_iter().find_map(|(label, count)| {
        if count as f64 / total > BIAS_THRESHOLD {
            Some(format!(
                "Note: the last {} predictions were \"{label}\" {count} times ({:.0}%); consider balancing.",
                recent_values.len(),
                count as f64 / total * 100.0
            ))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bias_hint_fires_over_threshold() {
        let values: Vec<String> = std::iter::repeat("单".to_string()).take(9).chain(std::iter::once("双".to_string())).collect();
        assert!(bias_hint(&values).is_some());
    }

    #[test]
    fn bias_hint_silent_under_threshold() {
        let values: Vec<String> = vec!["单".into(), "双".into(), "单".into(), "双".into()];
        assert!(bias_hint(&values).is_none());
    }
}
