//! Issue Tracker (spec.md section 4.1, component A): an in-process,
//! single-writer high-water mark over issue numbers. This is the first,
//! cheapest layer of the three-layer dedup funnel — it never touches
//! Redis or Postgres and exists purely to let a poller skip re-parsing
//! a response body it has already seen this process's lifetime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use draw_model::Issue;

/// Tracks the newest issue committed so far, within this process.
/// Cloning a `Draw`'s issue into here on every successful write keeps
/// the check cheap (a read-lock compare) relative to a round trip to
/// Redis.
pub struct IssueTracker {
    newest: RwLock<Option<Issue>>,
    unready: AtomicBool,
}

impl IssueTracker {
    pub fn new() -> Self {
        Self {
            newest: RwLock::new(None),
            unready: AtomicBool::new(false),
        }
    }

    pub fn seed(newest: Option<Issue>) -> Self {
        Self {
            newest: RwLock::new(newest),
            unready: AtomicBool::new(false),
        }
    }

    /// Fails open: a startup query error degrades the tracker to an
    /// unready high-water mark of "0" rather than aborting the process.
    /// While unready, every issue is treated as new (`is_stale` always
    /// returns `false`) until the next successful `advance`.
    pub fn seed_or_degrade(result: draw_contracts::Result<Option<Issue>>) -> Self {
        match result {
            Ok(newest) => Self::seed(newest),
            Err(_) => Self {
                newest: RwLock::new(None),
                unready: AtomicBool::new(true),
            },
        }
    }

    /// True if `issue` is not newer than the tracked high-water mark,
    /// i.e. a poller can skip it without consulting the distributed
    /// seen-set. Always `false` while the tracker is unready.
    pub fn is_stale(&self, issue: &Issue) -> bool {
        if self.unready.load(Ordering::Acquire) {
            return false;
        }
        match self.newest.read().expect("tracker lock poisoned").as_ref() {
            Some(newest) => issue <= newest,
            None => false,
        }
    }

    pub fn newest(&self) -> Option<Issue> {
        self.newest.read().expect("tracker lock poisoned").clone()
    }

    /// Advances the high-water mark if `issue` is newer. Never moves
    /// backwards, even if called out of order.
    pub fn advance(&self, issue: &Issue) {
        let mut guard = self.newest.write().expect("tracker lock poisoned");
        match guard.as_ref() {
            Some(current) if issue <= current => {}
            _ => *guard = Some(issue.clone()),
        }
        drop(guard);
        self.unready.store(false, Ordering::Release);
    }
}

impl Default for IssueTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(s: &str) -> Issue {
        Issue::parse(s).unwrap()
    }

    #[test]
    fn fresh_tracker_treats_everything_as_new() {
        let t = IssueTracker::new();
        assert!(!t.is_stale(&issue("2024001")));
    }

    #[test]
    fn advance_never_moves_backwards() {
        let t = IssueTracker::new();
        t.advance(&issue("2024010"));
        t.advance(&issue("2024005"));
        assert_eq!(t.newest(), Some(issue("2024010")));
    }

    #[test]
    fn stale_check_is_inclusive_of_current() {
        let t = IssueTracker::new();
        t.advance(&issue("2024010"));
        assert!(t.is_stale(&issue("2024010")));
        assert!(t.is_stale(&issue("2024009")));
        assert!(!t.is_stale(&issue("2024011")));
    }

    #[test]
    fn degraded_tracker_treats_everything_as_new_until_advanced() {
        let t = IssueTracker::seed_or_degrade(Err(draw_contracts::ContractError::Backend(
            "connection refused".into(),
        )));
        assert!(t.newest().is_none());
        assert!(!t.is_stale(&issue("2024001")));

        t.advance(&issue("2024001"));
        assert!(t.is_stale(&issue("2024001")));
    }
}
