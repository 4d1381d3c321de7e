//! Core persistence and workflow logic for parcel tracking.
//! This crate is the single source of truth for parcel invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::parcel::{
    now_rfc3339, ClientId, Parcel, ParcelNumber, ParcelStatus, ParcelValidationError,
    UNASSIGNED_NUMBER,
};
pub use repo::parcel_repo::{ParcelRepository, ParcelStore, RepoError, RepoResult};
pub use service::parcel_service::{ParcelService, ParcelServiceError, ParcelServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
