//! Domain model for CRM records and derived alerts.
//!
//! # Responsibility
//! - Mirror the hosted record store's task/activity/contact shapes.
//! - Define the transient `Alert` projection produced by the engine.
//!
//! # Invariants
//! - Records are read-only snapshots; the engine never mutates them locally.
//! - Alerts are never persisted.

pub mod alert;
pub mod record;
