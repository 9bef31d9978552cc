//! Alert derivation engine for the CRM client.
//!
//! Reads task, activity and contact snapshots from a record store, derives a
//! ranked list of actionable alerts, and keeps the dismissal memory for one
//! engine lifetime.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig, DEFAULT_FOLLOW_UP_WINDOW_DAYS};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::alert::{
    ActionAck, Alert, AlertAction, AlertActionKind, AlertKind, AlertPriority, AlertSource,
};
pub use model::record::{Activity, Contact, RecordId, RecordRef, Task};
pub use repo::record_store::{RecordStore, StoreError, StoreResult};
pub use repo::sqlite_store::SqliteRecordStore;
pub use service::alert_rules::{derive_alerts, RecordSnapshot};
pub use service::alert_service::{AlertService, AlertServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
