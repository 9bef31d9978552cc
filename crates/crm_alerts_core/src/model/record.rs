//! Record snapshots consumed by the alert engine.
//!
//! # Responsibility
//! - Define task, activity and contact records as served by the hosted store.
//! - Normalize reference fields that arrive either as a scalar id or as a
//!   lookup object.
//!
//! # Invariants
//! - Wire field names match the hosted store (`Id`, `title_c`, ...).
//! - `RecordRef::id()` is the only way reference fields are resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Integer identifier assigned by the hosted record store.
pub type RecordId = i64;

/// Reference to another record.
///
/// Lookup fields come back from the store as `{ "Id": 7, "Name": "Ada" }`
/// when expanded and as a bare `7` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordRef {
    Id(RecordId),
    Lookup {
        #[serde(rename = "Id")]
        id: RecordId,
        #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl RecordRef {
    /// Returns the scalar id regardless of wire shape.
    pub fn id(&self) -> RecordId {
        match self {
            Self::Id(id) => *id,
            Self::Lookup { id, .. } => *id,
        }
    }
}

impl From<RecordId> for RecordRef {
    fn from(value: RecordId) -> Self {
        Self::Id(value)
    }
}

/// Follow-up task owned by a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "title_c")]
    pub title: String,
    #[serde(rename = "completed_c", default)]
    pub completed: bool,
    #[serde(rename = "contact_id_c", default)]
    pub contact_id: Option<RecordRef>,
    #[serde(rename = "due_date_c")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates an open task without audit timestamps.
    pub fn new(id: RecordId, title: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
            contact_id: None,
            due_date,
            created_on: None,
            modified_on: None,
        }
    }

    /// Returns the owning contact id, if any.
    pub fn contact_key(&self) -> Option<RecordId> {
        self.contact_id.as_ref().map(RecordRef::id)
    }
}

/// Logged interaction (call, email, meeting, note) with a contact or deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "description_c", default)]
    pub description: String,
    /// Category tag such as `call`, `email` or `meeting`.
    #[serde(rename = "type_c", default)]
    pub kind: String,
    #[serde(rename = "timestamp_c")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "contact_id_c", default)]
    pub contact_id: Option<RecordRef>,
    #[serde(rename = "deal_id_c", default)]
    pub deal_id: Option<RecordRef>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Activity {
    /// Creates an activity with no owner links.
    pub fn new(id: RecordId, kind: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            description: String::new(),
            kind: kind.into(),
            timestamp,
            contact_id: None,
            deal_id: None,
            created_on: None,
            modified_on: None,
        }
    }

    /// Returns the owning contact id with lookup objects flattened.
    pub fn contact_key(&self) -> Option<RecordId> {
        self.contact_id.as_ref().map(RecordRef::id)
    }
}

/// Person tracked by the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "name_c")]
    pub name: String,
    #[serde(rename = "email_c", default)]
    pub email: Option<String>,
    #[serde(rename = "company_c", default)]
    pub company: Option<String>,
    #[serde(rename = "phone_c", default)]
    pub phone: Option<String>,
    #[serde(rename = "notes_c", default)]
    pub notes: Option<String>,
    /// Comma-separated tag list as stored upstream.
    #[serde(rename = "tags_c", default)]
    pub tags: Option<String>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Contact {
    /// Creates a contact with only a display name.
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            company: None,
            phone: None,
            notes: None,
            tags: None,
            created_on: None,
            modified_on: None,
        }
    }
}
