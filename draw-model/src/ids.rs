use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A 7-digit draw identifier. Compares and orders as an integer even
/// though it is stored and transmitted as a zero-padded ASCII string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Issue(String);

impl Issue {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.len() == 7 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw))
        } else {
            Err(ModelError::InvalidIssue(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_u64(&self) -> u64 {
        self.0.parse().expect("Issue is validated as all-digits at construction")
    }

    /// The issue immediately following this one, used to address the draw a
    /// prediction made after this commit is targeting.
    pub fn next(&self) -> Self {
        let n = self.as_u64() + 1;
        Self(format!("{n:07}"))
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialOrd for Issue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Issue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_u64().cmp(&other.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(Issue::parse("123456").is_err());
        assert!(Issue::parse("123456789").is_err());
    }

    #[test]
    fn rejects_non_digits() {
        assert!(Issue::parse("202500a").is_err());
    }

    #[test]
    fn orders_as_integer() {
        let a = Issue::parse("2025001").unwrap();
        let b = Issue::parse("2025002").unwrap();
        assert!(a < b);
        assert_eq!(a.next(), b);
    }
}
