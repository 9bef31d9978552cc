//! Alert derivation use-cases.
//!
//! # Responsibility
//! - Turn record snapshots into a ranked, deduplicated alert list.
//! - Own the per-instance suppression memory and the mutation actions.
//!
//! # Invariants
//! - Derivation is side-effect free apart from store reads.
//! - Suppressed keys are never re-emitted until cleared or the engine is
//!   rebuilt.

pub mod alert_rules;
pub mod alert_service;
pub mod suppression;
