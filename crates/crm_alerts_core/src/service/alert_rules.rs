//! Pure alert derivation rules.
//!
//! # Responsibility
//! - Classify open tasks into due-date buckets.
//! - Collapse recent activities into one follow-up alert per contact.
//! - Rank the merged list.
//!
//! # Invariants
//! - Calendar days are evaluated in the time zone of the evaluation instant,
//!   so a DST transition between now and the due instant moves no boundary.
//! - The follow-up window is inclusive on both ends.
//! - Ranking is stable: equal (priority, timestamp) alerts keep derivation
//!   order (tasks in snapshot order, then follow-ups by ascending contact id).

use crate::model::alert::{Alert, AlertKind, AlertSource};
use crate::model::record::{Activity, Contact, RecordId, Task};
use crate::service::suppression::{follow_up_key, task_key, SuppressionSet};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};

/// One consistent read of the three record collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSnapshot {
    pub tasks: Vec<Task>,
    pub activities: Vec<Activity>,
    pub contacts: Vec<Contact>,
}

/// Classifies a due instant relative to `now`.
///
/// Returns `None` when the task is due later than tomorrow.
pub fn classify_due<Tz: TimeZone>(due: DateTime<Utc>, now: &DateTime<Tz>) -> Option<AlertKind> {
    if due < now.with_timezone(&Utc) {
        return Some(AlertKind::TaskOverdue);
    }

    let today = now.date_naive();
    let due_day = due.with_timezone(&now.timezone()).date_naive();
    if due_day == today {
        Some(AlertKind::TaskDueToday)
    } else if today.succ_opt() == Some(due_day) {
        Some(AlertKind::TaskDueTomorrow)
    } else {
        None
    }
}

/// Derives due-date alerts for open, unsuppressed tasks.
pub fn task_alerts<Tz: TimeZone>(
    tasks: &[Task],
    now: &DateTime<Tz>,
    suppression: &SuppressionSet,
) -> Vec<Alert> {
    tasks
        .iter()
        .filter(|task| !task.completed)
        .filter(|task| !suppression.contains(&task_key(task.id)))
        .filter_map(|task| {
            let kind = classify_due(task.due_date, now)?;
            Some(Alert {
                id: kind.alert_id(task.id),
                kind,
                priority: kind.priority(),
                title: kind.title().to_string(),
                message: task_message(kind, task, now),
                timestamp: task.due_date,
                source: AlertSource::Task { task: task.clone() },
                actions: kind.actions(),
            })
        })
        .collect()
}

fn task_message<Tz: TimeZone>(kind: AlertKind, task: &Task, now: &DateTime<Tz>) -> String {
    match kind {
        AlertKind::TaskOverdue => format!(
            "\"{}\" was due {}",
            task.title,
            task.due_date
                .with_timezone(&now.timezone())
                .date_naive()
                .format("%b %-d, %Y")
        ),
        AlertKind::TaskDueToday => format!("\"{}\" is due today", task.title),
        _ => format!("\"{}\" is due tomorrow", task.title),
    }
}

/// Derives one follow-up alert per contact with activity inside `window`.
///
/// Activities without an owning contact, and groups whose contact is not in
/// `contacts`, produce nothing. A window reaching past the earliest
/// representable instant covers all history.
pub fn follow_up_alerts<Tz: TimeZone>(
    activities: &[Activity],
    contacts: &[Contact],
    now: &DateTime<Tz>,
    window: Duration,
    suppression: &SuppressionSet,
) -> Vec<Alert> {
    let now_utc = now.with_timezone(&Utc);
    let window_start = now_utc
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut recent: Vec<(RecordId, &Activity)> = activities
        .iter()
        .filter(|activity| activity.timestamp >= window_start && activity.timestamp <= now_utc)
        .filter_map(|activity| activity.contact_key().map(|contact_id| (contact_id, activity)))
        .collect();
    recent.sort_by(|(_, left), (_, right)| right.timestamp.cmp(&left.timestamp));

    let mut groups: BTreeMap<RecordId, Vec<&Activity>> = BTreeMap::new();
    for (contact_id, activity) in recent {
        groups.entry(contact_id).or_default().push(activity);
    }

    let contacts_by_id: HashMap<RecordId, &Contact> =
        contacts.iter().map(|contact| (contact.id, contact)).collect();

    groups
        .into_iter()
        .filter(|(contact_id, _)| !suppression.contains(&follow_up_key(*contact_id)))
        .filter_map(|(contact_id, group)| {
            let contact = *contacts_by_id.get(&contact_id)?;
            let latest = group.first()?.timestamp;
            let kind = AlertKind::ContactFollowUp;
            Some(Alert {
                id: kind.alert_id(contact_id),
                kind,
                priority: kind.priority(),
                title: kind.title().to_string(),
                message: follow_up_message(&contact.name, group.len()),
                timestamp: latest,
                source: AlertSource::FollowUp {
                    contact: contact.clone(),
                    activities: group.into_iter().cloned().collect(),
                },
                actions: kind.actions(),
            })
        })
        .collect()
}

fn follow_up_message(contact_name: &str, count: usize) -> String {
    let noun = if count == 1 { "activity" } else { "activities" };
    format!("{contact_name} - {count} recent {noun}")
}

/// Sorts by priority (high first), then newest reference timestamp.
pub fn rank_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|left, right| {
        left.priority
            .cmp(&right.priority)
            .then_with(|| right.timestamp.cmp(&left.timestamp))
    });
}

/// Runs the full derivation pass over one snapshot.
pub fn derive_alerts<Tz: TimeZone>(
    snapshot: &RecordSnapshot,
    now: &DateTime<Tz>,
    follow_up_window: Duration,
    suppression: &SuppressionSet,
) -> Vec<Alert> {
    let mut alerts = task_alerts(&snapshot.tasks, now, suppression);
    alerts.extend(follow_up_alerts(
        &snapshot.activities,
        &snapshot.contacts,
        now,
        follow_up_window,
        suppression,
    ));
    rank_alerts(&mut alerts);
    alerts
}

#[cfg(test)]
mod tests {
    use super::{classify_due, follow_up_alerts, rank_alerts, task_alerts};
    use crate::model::alert::{AlertActionKind, AlertKind, AlertPriority};
    use crate::model::record::{Activity, Contact, RecordRef, Task};
    use crate::service::suppression::SuppressionSet;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
    use chrono_tz::Europe::Berlin;

    // 2026-03-10 14:00 at UTC+02:00.
    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, 14, 0, 0)
            .unwrap()
    }

    fn utc(now: DateTime<FixedOffset>, delta: Duration) -> DateTime<Utc> {
        (now + delta).with_timezone(&Utc)
    }

    #[test]
    fn classify_due_buckets() {
        let now = now();
        assert_eq!(
            classify_due(utc(now, -Duration::seconds(1)), &now),
            Some(AlertKind::TaskOverdue)
        );
        assert_eq!(
            classify_due(utc(now, Duration::zero()), &now),
            Some(AlertKind::TaskDueToday)
        );
        assert_eq!(
            classify_due(utc(now, Duration::hours(9)), &now),
            Some(AlertKind::TaskDueToday)
        );
        assert_eq!(
            classify_due(utc(now, Duration::hours(10)), &now),
            Some(AlertKind::TaskDueTomorrow)
        );
        assert_eq!(
            classify_due(utc(now, Duration::hours(33) + Duration::minutes(59)), &now),
            Some(AlertKind::TaskDueTomorrow)
        );
        assert_eq!(classify_due(utc(now, Duration::hours(34)), &now), None);
    }

    #[test]
    fn calendar_day_follows_evaluation_offset() {
        // 23:30 UTC on the 10th is already the 11th at UTC+02:00.
        let now = now();
        let due = Utc.with_ymd_and_hms(2026, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(classify_due(due, &now), Some(AlertKind::TaskDueTomorrow));
    }

    #[test]
    fn calendar_day_follows_zone_across_dst_end() {
        // Berlin leaves CEST on 2026-10-25; 22:30 UTC that day is 23:30 CET.
        let now = Berlin.with_ymd_and_hms(2026, 10, 24, 12, 0, 0).unwrap();
        let due = Utc.with_ymd_and_hms(2026, 10, 25, 22, 30, 0).unwrap();
        assert_eq!(classify_due(due, &now), Some(AlertKind::TaskDueTomorrow));
    }

    #[test]
    fn calendar_day_follows_zone_across_dst_start() {
        // Berlin enters CEST on 2026-03-29; 22:30 UTC that day is 00:30 on the 30th.
        let now = Berlin.with_ymd_and_hms(2026, 3, 28, 12, 0, 0).unwrap();
        let due = Utc.with_ymd_and_hms(2026, 3, 29, 22, 30, 0).unwrap();
        assert_eq!(classify_due(due, &now), None);

        let due = Utc.with_ymd_and_hms(2026, 3, 29, 21, 30, 0).unwrap();
        assert_eq!(classify_due(due, &now), Some(AlertKind::TaskDueTomorrow));
    }

    #[test]
    fn overdue_message_uses_zone_date_after_dst_change() {
        let now = Berlin.with_ymd_and_hms(2026, 11, 2, 9, 0, 0).unwrap();
        // 22:30 UTC on Oct 24 is 00:30 CEST on Oct 25, though `now` is in CET.
        let task = Task::new(6, "Renewal", Utc.with_ymd_and_hms(2026, 10, 24, 22, 30, 0).unwrap());
        let alerts = task_alerts(&[task], &now, &SuppressionSet::new());
        assert_eq!(alerts[0].message, "\"Renewal\" was due Oct 25, 2026");
    }

    #[test]
    fn earlier_today_counts_as_overdue() {
        let now = now();
        let due = utc(now, -Duration::hours(2));
        assert_eq!(classify_due(due, &now), Some(AlertKind::TaskOverdue));
    }

    #[test]
    fn task_alerts_skip_completed_and_task_suppressed() {
        let now = now();
        let mut done = Task::new(1, "done", utc(now, -Duration::days(1)));
        done.completed = true;
        let open = Task::new(2, "open", utc(now, -Duration::days(1)));
        let suppressed = Task::new(3, "suppressed", utc(now, -Duration::days(1)));

        let suppression = SuppressionSet::new();
        suppression.insert("task-3");
        let alerts = task_alerts(&[done, open, suppressed], &now, &suppression);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "overdue-2");
        assert_eq!(alerts[0].priority, AlertPriority::High);
    }

    #[test]
    fn overdue_message_formats_local_due_date() {
        let now = now();
        let task = Task::new(5, "Call Bob", Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap());
        let alerts = task_alerts(&[task], &now, &SuppressionSet::new());
        assert_eq!(alerts[0].message, "\"Call Bob\" was due Mar 2, 2026");
        assert_eq!(alerts[0].title, "Overdue Task");
    }

    #[test]
    fn due_tomorrow_only_offers_dismiss() {
        let now = now();
        let task = Task::new(8, "Send deck", utc(now, Duration::hours(20)));
        let alerts = task_alerts(&[task], &now, &SuppressionSet::new());
        assert_eq!(alerts[0].id, "due-tomorrow-8");
        assert_eq!(alerts[0].message, "\"Send deck\" is due tomorrow");
        let kinds: Vec<_> = alerts[0].actions.iter().map(|action| action.kind).collect();
        assert_eq!(kinds, vec![AlertActionKind::Dismiss]);
    }

    #[test]
    fn follow_up_window_is_inclusive() {
        let now = now();
        let mut at_start = Activity::new(1, "call", utc(now, -Duration::days(7)));
        at_start.contact_id = Some(RecordRef::Id(4));
        let mut at_now = Activity::new(2, "email", utc(now, Duration::zero()));
        at_now.contact_id = Some(RecordRef::Id(4));
        let mut too_old = Activity::new(3, "call", utc(now, -Duration::days(7) - Duration::seconds(1)));
        too_old.contact_id = Some(RecordRef::Id(4));
        let mut future = Activity::new(4, "meeting", utc(now, Duration::seconds(1)));
        future.contact_id = Some(RecordRef::Id(4));

        let alerts = follow_up_alerts(
            &[at_start, too_old, at_now, future],
            &[Contact::new(4, "Ada")],
            &now,
            Duration::days(7),
            &SuppressionSet::new(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "Ada - 2 recent activities");
        assert_eq!(alerts[0].timestamp, utc(now, Duration::zero()));
    }

    #[test]
    fn oversized_window_covers_all_history() {
        let now = now();
        let mut ancient = Activity::new(1, "call", Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
        ancient.contact_id = Some(RecordRef::Id(2));

        let alerts = follow_up_alerts(
            &[ancient],
            &[Contact::new(2, "Edsger")],
            &now,
            Duration::days(i64::from(u32::MAX)),
            &SuppressionSet::new(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "follow-up-2");
    }

    #[test]
    fn follow_up_groups_lookup_and_scalar_refs_together() {
        let now = now();
        let mut scalar = Activity::new(1, "call", utc(now, -Duration::days(1)));
        scalar.contact_id = Some(RecordRef::Id(9));
        let mut lookup = Activity::new(2, "email", utc(now, -Duration::days(2)));
        lookup.contact_id = Some(RecordRef::Lookup {
            id: 9,
            name: Some("Grace".to_string()),
        });
        let orphan = Activity::new(3, "note", utc(now, -Duration::days(1)));

        let alerts = follow_up_alerts(
            &[lookup, orphan, scalar],
            &[Contact::new(9, "Grace")],
            &now,
            Duration::days(7),
            &SuppressionSet::new(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "follow-up-9");
        assert_eq!(alerts[0].contact_id(), Some(9));
    }

    #[test]
    fn follow_up_singular_noun_and_unknown_contact() {
        let now = now();
        let mut known = Activity::new(1, "call", utc(now, -Duration::hours(1)));
        known.contact_id = Some(RecordRef::Id(1));
        let mut unknown = Activity::new(2, "call", utc(now, -Duration::hours(1)));
        unknown.contact_id = Some(RecordRef::Id(404));

        let alerts = follow_up_alerts(
            &[known, unknown],
            &[Contact::new(1, "Linus")],
            &now,
            Duration::days(7),
            &SuppressionSet::new(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "Linus - 1 recent activity");
        assert_eq!(alerts[0].priority, AlertPriority::Medium);
    }

    #[test]
    fn rank_orders_priority_then_newest_first() {
        let now = now();
        let tomorrow = Task::new(1, "low", utc(now, Duration::hours(20)));
        let old_overdue = Task::new(2, "older", utc(now, -Duration::days(3)));
        let today = Task::new(3, "medium", utc(now, Duration::hours(1)));
        let new_overdue = Task::new(4, "newer", utc(now, -Duration::days(1)));

        let mut alerts = task_alerts(
            &[tomorrow, old_overdue, today, new_overdue],
            &now,
            &SuppressionSet::new(),
        );
        rank_alerts(&mut alerts);

        let ids: Vec<_> = alerts.iter().map(|alert| alert.id.as_str()).collect();
        assert_eq!(ids, vec!["overdue-4", "overdue-2", "due-today-3", "due-tomorrow-1"]);
    }
}
