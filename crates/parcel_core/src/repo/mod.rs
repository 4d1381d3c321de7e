//! Repository layer for parcel persistence.
//!
//! # Responsibility
//! - Define the parcel data-access contract.
//! - Isolate SQLite query details from workflow rules.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod parcel_repo;
