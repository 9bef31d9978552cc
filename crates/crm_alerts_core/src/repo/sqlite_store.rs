//! SQLite-backed record store.
//!
//! # Responsibility
//! - Serve task/activity/contact snapshots from a local database.
//! - Apply task completion updates.
//!
//! # Invariants
//! - Timestamps are stored as RFC 3339 UTC text and parsed on every read.
//! - The connection is guarded by a mutex so the store is `Sync`.

use crate::db::{open_db, open_db_in_memory};
use crate::model::record::{Activity, Contact, RecordId, RecordRef, Task};
use crate::repo::record_store::{RecordStore, StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    completed,
    contact_id,
    due_date,
    created_on,
    modified_on
FROM tasks";

const ACTIVITY_SELECT_SQL: &str = "SELECT
    id,
    description,
    type,
    timestamp,
    contact_id,
    deal_id,
    created_on,
    modified_on
FROM activities";

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    company,
    phone,
    notes,
    tags,
    created_on,
    modified_on
FROM contacts";

/// Record store over one owned SQLite connection.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Inserts one contact keeping its id.
    pub fn insert_contact(&self, contact: &Contact) -> StoreResult<RecordId> {
        self.lock()?.execute(
            "INSERT INTO contacts (
                id, name, email, company, phone, notes, tags, created_on, modified_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                contact.id,
                contact.name.as_str(),
                contact.email.as_deref(),
                contact.company.as_deref(),
                contact.phone.as_deref(),
                contact.notes.as_deref(),
                contact.tags.as_deref(),
                contact.created_on.map(timestamp_to_db),
                contact.modified_on.map(timestamp_to_db),
            ],
        )?;
        Ok(contact.id)
    }

    /// Inserts one task keeping its id.
    pub fn insert_task(&self, task: &Task) -> StoreResult<RecordId> {
        self.lock()?.execute(
            "INSERT INTO tasks (
                id, title, completed, contact_id, due_date, created_on, modified_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                task.id,
                task.title.as_str(),
                task.completed,
                task.contact_key(),
                timestamp_to_db(task.due_date),
                task.created_on.map(timestamp_to_db),
                task.modified_on.map(timestamp_to_db),
            ],
        )?;
        Ok(task.id)
    }

    /// Inserts one activity keeping its id.
    pub fn insert_activity(&self, activity: &Activity) -> StoreResult<RecordId> {
        self.lock()?.execute(
            "INSERT INTO activities (
                id, description, type, timestamp, contact_id, deal_id, created_on, modified_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                activity.id,
                activity.description.as_str(),
                activity.kind.as_str(),
                timestamp_to_db(activity.timestamp),
                activity.contact_key(),
                activity.deal_id.as_ref().map(RecordRef::id),
                activity.created_on.map(timestamp_to_db),
                activity.modified_on.map(timestamp_to_db),
            ],
        )?;
        Ok(activity.id)
    }

    /// Releases the underlying connection.
    pub fn into_inner(self) -> Connection {
        self.conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("record store connection lock poisoned".into()))
    }

    fn get_task(conn: &Connection, id: RecordId) -> StoreResult<Option<Task>> {
        let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }
}

impl RecordStore for SqliteRecordStore {
    fn fetch_all_tasks(&self) -> StoreResult<Vec<Task>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn fetch_all_activities(&self) -> StoreResult<Vec<Activity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{ACTIVITY_SELECT_SQL} ORDER BY timestamp DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }

    fn fetch_all_contacts(&self) -> StoreResult<Vec<Contact>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{CONTACT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }

    fn update_task_completion(&self, id: RecordId, completed: bool) -> StoreResult<Task> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE tasks
             SET completed = ?1, modified_on = ?2
             WHERE id = ?3;",
            params![completed, timestamp_to_db(Utc::now()), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Self::get_task(&conn, id)?.ok_or(StoreError::NotFound(id))
    }
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        completed: parse_flag(row.get("completed")?, "tasks.completed")?,
        contact_id: row.get::<_, Option<RecordId>>("contact_id")?.map(RecordRef::Id),
        due_date: parse_timestamp(&row.get::<_, String>("due_date")?, "tasks.due_date")?,
        created_on: parse_optional_timestamp(row.get("created_on")?, "tasks.created_on")?,
        modified_on: parse_optional_timestamp(row.get("modified_on")?, "tasks.modified_on")?,
    })
}

fn parse_activity_row(row: &Row<'_>) -> StoreResult<Activity> {
    Ok(Activity {
        id: row.get("id")?,
        description: row.get("description")?,
        kind: row.get("type")?,
        timestamp: parse_timestamp(
            &row.get::<_, String>("timestamp")?,
            "activities.timestamp",
        )?,
        contact_id: row.get::<_, Option<RecordId>>("contact_id")?.map(RecordRef::Id),
        deal_id: row.get::<_, Option<RecordId>>("deal_id")?.map(RecordRef::Id),
        created_on: parse_optional_timestamp(row.get("created_on")?, "activities.created_on")?,
        modified_on: parse_optional_timestamp(row.get("modified_on")?, "activities.modified_on")?,
    })
}

fn parse_contact_row(row: &Row<'_>) -> StoreResult<Contact> {
    Ok(Contact {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        company: row.get("company")?,
        phone: row.get("phone")?,
        notes: row.get("notes")?,
        tags: row.get("tags")?,
        created_on: parse_optional_timestamp(row.get("created_on")?, "contacts.created_on")?,
        modified_on: parse_optional_timestamp(row.get("modified_on")?, "contacts.modified_on")?,
    })
}

fn parse_flag(value: i64, column: &str) -> StoreResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StoreError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn parse_timestamp(value: &str, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

fn parse_optional_timestamp(
    value: Option<String>,
    column: &str,
) -> StoreResult<Option<DateTime<Utc>>> {
    value
        .map(|text| parse_timestamp(&text, column))
        .transpose()
}

fn timestamp_to_db(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
