//! Record store contract and local adapter.
//!
//! # Responsibility
//! - Define the read/update contract the alert engine consumes.
//! - Provide a SQLite-backed implementation for local use and tests.
//!
//! # Invariants
//! - Adapters surface store failures as `StoreError`; they never retry.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod record_store;
pub mod sqlite_store;
