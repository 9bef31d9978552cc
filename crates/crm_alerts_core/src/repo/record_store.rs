//! Collaborator contract for the hosted record store.

use crate::db::DbError;
use crate::model::record::{Activity, Contact, RecordId, Task};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Transport or storage failure reported by a record store.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound(RecordId),
    InvalidData(String),
    /// Remote service or connection not usable (network, auth, poisoned lock).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid stored record data: {message}"),
            Self::Unavailable(message) => write!(f, "record store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Operations the alert engine needs from the record store.
///
/// Implementations must be shareable across threads: the engine issues the
/// three reads concurrently.
pub trait RecordStore: Send + Sync {
    /// All tasks, unfiltered.
    fn fetch_all_tasks(&self) -> StoreResult<Vec<Task>>;
    /// All activities, unfiltered. Order is not part of the contract.
    fn fetch_all_activities(&self) -> StoreResult<Vec<Activity>>;
    /// All contacts, unfiltered.
    fn fetch_all_contacts(&self) -> StoreResult<Vec<Contact>>;
    /// Sets the completion flag of one task and returns the updated record.
    ///
    /// Idempotent: completing an already completed task succeeds.
    fn update_task_completion(&self, id: RecordId, completed: bool) -> StoreResult<Task>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn fetch_all_tasks(&self) -> StoreResult<Vec<Task>> {
        (**self).fetch_all_tasks()
    }

    fn fetch_all_activities(&self) -> StoreResult<Vec<Activity>> {
        (**self).fetch_all_activities()
    }

    fn fetch_all_contacts(&self) -> StoreResult<Vec<Contact>> {
        (**self).fetch_all_contacts()
    }

    fn update_task_completion(&self, id: RecordId, completed: bool) -> StoreResult<Task> {
        (**self).update_task_completion(id, completed)
    }
}
