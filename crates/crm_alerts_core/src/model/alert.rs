//! Alert projection derived from CRM records.
//!
//! # Responsibility
//! - Define alert categories, priorities and permitted actions.
//! - Keep per-category constants (id prefix, title, priority) in one place.
//!
//! # Invariants
//! - `AlertPriority` orders `High < Medium < Low` so ascending sort ranks
//!   the most urgent alerts first.
//! - Alert ids have the form `<kind prefix>-<record id>`.

use crate::model::record::{Activity, Contact, RecordId, Task};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Open task whose due instant already passed.
    TaskOverdue,
    /// Open task due later on the current calendar day.
    TaskDueToday,
    /// Open task due on the next calendar day.
    TaskDueTomorrow,
    /// Contact with recent activity worth following up.
    ContactFollowUp,
}

impl AlertKind {
    /// Prefix used when building alert ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::TaskOverdue => "overdue",
            Self::TaskDueToday => "due-today",
            Self::TaskDueTomorrow => "due-tomorrow",
            Self::ContactFollowUp => "follow-up",
        }
    }

    /// Fixed priority for this category.
    pub fn priority(self) -> AlertPriority {
        match self {
            Self::TaskOverdue => AlertPriority::High,
            Self::TaskDueToday | Self::ContactFollowUp => AlertPriority::Medium,
            Self::TaskDueTomorrow => AlertPriority::Low,
        }
    }

    /// Short human-readable headline.
    pub fn title(self) -> &'static str {
        match self {
            Self::TaskOverdue => "Overdue Task",
            Self::TaskDueToday => "Due Today",
            Self::TaskDueTomorrow => "Due Tomorrow",
            Self::ContactFollowUp => "Follow-up Needed",
        }
    }

    /// Actions a caller may take on alerts of this category, in display order.
    pub fn actions(self) -> Vec<AlertAction> {
        match self {
            Self::TaskOverdue | Self::TaskDueToday => {
                vec![AlertAction::complete(), AlertAction::dismiss()]
            }
            Self::TaskDueTomorrow | Self::ContactFollowUp => vec![AlertAction::dismiss()],
        }
    }

    /// Builds the alert id for a record of this category.
    pub fn alert_id(self, record_id: RecordId) -> String {
        format!("{}-{record_id}", self.id_prefix())
    }
}

/// Alert urgency. Declaration order is ranking order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    High,
    Medium,
    Low,
}

impl AlertPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Action kinds exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertActionKind {
    Complete,
    Dismiss,
}

/// One permitted action with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertAction {
    #[serde(rename = "type")]
    pub kind: AlertActionKind,
    pub label: String,
}

impl AlertAction {
    pub fn complete() -> Self {
        Self {
            kind: AlertActionKind::Complete,
            label: "Mark Complete".to_string(),
        }
    }

    pub fn dismiss() -> Self {
        Self {
            kind: AlertActionKind::Dismiss,
            label: "Dismiss".to_string(),
        }
    }
}

/// Back-reference to the records an alert was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AlertSource {
    Task {
        task: Task,
    },
    FollowUp {
        contact: Contact,
        /// Activities in the follow-up window, newest first.
        activities: Vec<Activity>,
    },
}

/// Actionable notification derived by the alert engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    /// Reference instant used as the ranking tie-break.
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub source: AlertSource,
    pub actions: Vec<AlertAction>,
}

impl Alert {
    /// Returns whether callers may complete the underlying task from this alert.
    pub fn can_complete(&self) -> bool {
        self.actions
            .iter()
            .any(|action| action.kind == AlertActionKind::Complete)
    }

    /// Task id for task alerts.
    pub fn task_id(&self) -> Option<RecordId> {
        match &self.source {
            AlertSource::Task { task } => Some(task.id),
            AlertSource::FollowUp { .. } => None,
        }
    }

    /// Contact id for follow-up alerts.
    pub fn contact_id(&self) -> Option<RecordId> {
        match &self.source {
            AlertSource::Task { .. } => None,
            AlertSource::FollowUp { contact, .. } => Some(contact.id),
        }
    }
}

/// Acknowledgment returned by mutation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAck {
    pub success: bool,
}

impl ActionAck {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
