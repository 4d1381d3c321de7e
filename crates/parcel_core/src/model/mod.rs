//! Domain model for parcel tracking.
//!
//! # Responsibility
//! - Define canonical data structures used by the store and services.
//!
//! # Invariants
//! - Every persisted parcel is identified by a store-assigned `ParcelNumber`.
//! - Deletion is a hard delete; numbers are never reused.

pub mod parcel;
