//! Process-lifetime suppression memory.
//!
//! # Invariants
//! - Keys live exactly as long as the owning engine instance.
//! - Membership test and insert are serialized through one mutex.
//!
//! Key shapes:
//! - `task-<taskId>`: written by task completion, checked before due-date
//!   classification.
//! - bare remainder of a dismissed alert id (`overdue-5` -> `5`,
//!   `follow-up-7` -> `7`): written by dismissal, checked by follow-up
//!   grouping. Task gating never reads these, so dismissing a due-date alert
//!   does not stop it from being derived again.
//!
//! Task and follow-up dismissals share the bare-id namespace: dismissing
//! `overdue-5` also hides the follow-up alert for contact 5.

use crate::model::record::RecordId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

static ALERT_ID_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(overdue|due-today|due-tomorrow|follow-up)-").expect("valid alert prefix regex")
});

/// Strips one known alert-id prefix and returns the remainder.
///
/// Ids without a known prefix are returned unchanged.
pub fn normalize_alert_id(alert_id: &str) -> String {
    ALERT_ID_PREFIX_RE.replace(alert_id, "").into_owned()
}

/// Key written on task completion and consulted before task classification.
pub fn task_key(task_id: RecordId) -> String {
    format!("task-{task_id}")
}

/// Key a dismissed `follow-up-<contactId>` alert normalizes to.
pub fn follow_up_key(contact_id: RecordId) -> String {
    contact_id.to_string()
}

/// Set of suppressed alert keys.
#[derive(Debug, Default)]
pub struct SuppressionSet {
    keys: Mutex<HashSet<String>>,
}

impl SuppressionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.guard().contains(key)
    }

    /// Adds `key`; returns `false` when it was already present.
    pub fn insert(&self, key: impl Into<String>) -> bool {
        self.guard().insert(key.into())
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    // A panic while holding the lock cannot leave a HashSet half-inserted,
    // so a poisoned guard is still usable.
    fn guard(&self) -> MutexGuard<'_, HashSet<String>> {
        self.keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::{follow_up_key, normalize_alert_id, task_key, SuppressionSet};

    #[test]
    fn normalize_strips_each_known_prefix_once() {
        assert_eq!(normalize_alert_id("overdue-5"), "5");
        assert_eq!(normalize_alert_id("due-today-12"), "12");
        assert_eq!(normalize_alert_id("due-tomorrow-3"), "3");
        assert_eq!(normalize_alert_id("follow-up-7"), "7");
        assert_eq!(normalize_alert_id("follow-up-follow-up-7"), "follow-up-7");
    }

    #[test]
    fn normalize_keeps_unknown_ids() {
        assert_eq!(normalize_alert_id("task-9"), "task-9");
        assert_eq!(normalize_alert_id("x-overdue-9"), "x-overdue-9");
    }

    #[test]
    fn task_and_follow_up_keys_do_not_collide() {
        assert_eq!(task_key(4), "task-4");
        assert_eq!(follow_up_key(4), "4");
        assert_ne!(task_key(4), follow_up_key(4));
    }

    #[test]
    fn dismissed_task_id_matches_follow_up_key_of_same_number() {
        assert_eq!(normalize_alert_id("overdue-5"), follow_up_key(5));
        assert_eq!(normalize_alert_id("due-tomorrow-5"), follow_up_key(5));
    }

    #[test]
    fn insert_contains_and_clear() {
        let set = SuppressionSet::new();
        assert!(set.is_empty());
        assert!(set.insert("task-1"));
        assert!(!set.insert("task-1"));
        assert!(set.contains("task-1"));
        assert_eq!(set.len(), 1);

        set.clear();
        assert!(!set.contains("task-1"));
        assert!(set.is_empty());
    }
}
