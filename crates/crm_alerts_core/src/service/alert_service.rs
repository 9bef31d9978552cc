//! Alert engine use-case service.
//!
//! # Responsibility
//! - Load task/activity/contact snapshots and derive the ranked alert list.
//! - Own the suppression memory for one engine lifetime.
//! - Expose dismiss/complete/clear actions consistent with the record store.
//!
//! # Invariants
//! - `get_all` never returns a partial list: any failed read fails the call.
//! - `complete_task` suppresses only after the store update succeeded.
//! - Store error details are carried as `source()`, never in the message.

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, EngineConfig};
use crate::model::alert::{ActionAck, Alert};
use crate::model::record::RecordId;
use crate::repo::record_store::{RecordStore, StoreError, StoreResult};
use crate::service::alert_rules::{derive_alerts, RecordSnapshot};
use crate::service::suppression::{normalize_alert_id, task_key, SuppressionSet};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

/// Domain-level failure of an engine operation.
#[derive(Debug)]
pub enum AlertServiceError {
    LoadAlerts(StoreError),
    CompleteTask(StoreError),
}

impl Display for AlertServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadAlerts(_) => write!(f, "failed to load alerts"),
            Self::CompleteTask(_) => write!(f, "failed to complete task"),
        }
    }
}

impl Error for AlertServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LoadAlerts(err) | Self::CompleteTask(err) => Some(err),
        }
    }
}

/// Alert derivation engine over a record store.
///
/// Construct one per session; dropping it forgets every dismissal.
pub struct AlertService<S: RecordStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    config: EngineConfig,
    suppression: SuppressionSet,
}

impl<S: RecordStore> AlertService<S, SystemClock> {
    /// Creates an engine on the local wall clock with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: RecordStore, C: Clock> AlertService<S, C> {
    /// Creates an engine with an explicit clock and default configuration.
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            config: EngineConfig::default(),
            suppression: SuppressionSet::new(),
        }
    }

    /// Creates an engine with explicit clock and configuration.
    pub fn with_config(store: S, clock: C, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            config,
            suppression: SuppressionSet::new(),
        })
    }

    /// Underlying record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recomputes the full ranked alert list.
    ///
    /// Reads only; suppression state is consulted, never changed.
    pub fn get_all(&self) -> Result<Vec<Alert>, AlertServiceError> {
        let started_at = Instant::now();
        debug!("event=alerts_load module=alert_service status=start");

        let snapshot = self.load_snapshot().map_err(|err| {
            error!(
                "event=alerts_load module=alert_service status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            AlertServiceError::LoadAlerts(err)
        })?;

        let now = self.clock.now();
        let alerts = derive_alerts(
            &snapshot,
            &now,
            self.config.follow_up_window(),
            &self.suppression,
        );

        info!(
            "event=alerts_load module=alert_service status=ok tasks={} activities={} contacts={} alerts={} suppressed_keys={} duration_ms={}",
            snapshot.tasks.len(),
            snapshot.activities.len(),
            snapshot.contacts.len(),
            alerts.len(),
            self.suppression.len(),
            started_at.elapsed().as_millis()
        );
        Ok(alerts)
    }

    /// Suppresses an alert by the remainder of its id after the kind prefix.
    ///
    /// For task alerts this key is not the one task classification checks,
    /// so a dismissed due-date alert is derived again on the next pass. Only
    /// `complete_task` hides a task alert.
    pub fn dismiss_alert(&self, alert_id: &str) -> ActionAck {
        let key = normalize_alert_id(alert_id);
        let newly_added = self.suppression.insert(key);
        info!(
            "event=alert_dismiss module=alert_service status=ok alert_id={alert_id} newly_added={newly_added}"
        );
        ActionAck::ok()
    }

    /// Marks a task completed in the store, then suppresses its alerts.
    ///
    /// # Errors
    /// - `CompleteTask` when the store update fails; suppression is untouched.
    pub fn complete_task(&self, task_id: RecordId) -> Result<ActionAck, AlertServiceError> {
        let started_at = Instant::now();
        if let Err(err) = self.store.update_task_completion(task_id, true) {
            error!(
                "event=task_complete module=alert_service status=error task_id={task_id} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(AlertServiceError::CompleteTask(err));
        }

        self.suppression.insert(task_key(task_id));
        info!(
            "event=task_complete module=alert_service status=ok task_id={task_id} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(ActionAck::ok())
    }

    /// Forgets every dismissal and completion suppression.
    pub fn clear_dismissed_alerts(&self) {
        let cleared = self.suppression.len();
        self.suppression.clear();
        info!("event=alerts_clear module=alert_service status=ok cleared_keys={cleared}");
    }

    /// Number of keys currently suppressed.
    pub fn dismissed_count(&self) -> usize {
        self.suppression.len()
    }

    /// Issues the three reads concurrently and waits for all of them.
    ///
    /// The first failure in (tasks, activities, contacts) order is returned.
    fn load_snapshot(&self) -> StoreResult<RecordSnapshot> {
        let store = &self.store;
        thread::scope(|scope| -> StoreResult<RecordSnapshot> {
            let tasks = scope.spawn(move || store.fetch_all_tasks());
            let activities = scope.spawn(move || store.fetch_all_activities());
            let contacts = store.fetch_all_contacts();

            let tasks = join_fetch(tasks);
            let activities = join_fetch(activities);

            Ok(RecordSnapshot {
                tasks: tasks?,
                activities: activities?,
                contacts: contacts?,
            })
        })
    }
}

// Panics in a store read are logic faults, not store errors: re-raise them.
fn join_fetch<T>(handle: ScopedJoinHandle<'_, StoreResult<T>>) -> StoreResult<T> {
    match handle.join() {
        Ok(result) => result,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}
