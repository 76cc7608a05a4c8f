//! Normalizes the varied number-string forms upstream sources emit
//! (spec.md section 4.2) to the canonical `a+b+c` grammar `draw-model`
//! accepts. Pure, side-effect free, as required of every parser.

/// Accepts `a+b+c`, `a,b,c`, `a b c`, or the bare concatenated `abc`
/// form and rewrites it to `a+b+c`. Returns `None` if the input can't
/// be resolved to exactly three digits by any of those forms.
pub fn normalize_numbers(raw: &str) -> Option<String> {
    let raw = raw.trim();

    for sep in ['+', ',', ' '] {
        let parts: Vec<&str> = raw.split(sep).map(str::trim).filter(|p| !p.is_empty()).collect();
        if parts.len() == 3 && parts.iter().all(|p| p.len() == 1 && p.bytes().all(|b| b.is_ascii_digit())) {
            return Some(parts.join("+"));
        }
    }

    if raw.len() == 3 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let bytes = raw.as_bytes();
        return Some(format!(
            "{}+{}+{}",
            (bytes[0] - b'0'),
            (bytes[1] - b'0'),
            (bytes[2] - b'0')
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_normalized_forms() {
        assert_eq!(normalize_numbers("3+5+8"), Some("3+5+8".to_string()));
        assert_eq!(normalize_numbers("3,5,8"), Some("3+5+8".to_string()));
        assert_eq!(normalize_numbers("3 5 8"), Some("3+5+8".to_string()));
        assert_eq!(normalize_numbers("358"), Some("3+5+8".to_string()));
    }

    #[test]
    fn rejects_multi_digit_and_dash() {
        assert_eq!(normalize_numbers("10+5+8"), None);
        assert_eq!(normalize_numbers("3-5-8"), None);
    }
}
