//! Parcel domain model.
//!
//! # Responsibility
//! - Define the canonical shipment record persisted by the parcel store.
//! - Own the workflow rules of `ParcelStatus`.
//!
//! # Invariants
//! - `number` is `0` until the store assigns one; never reassigned afterward.
//! - `created_at` is RFC3339 text set once at creation.
//! - Status only moves forward: `registered -> sent -> delivered`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned parcel identifier.
pub type ParcelNumber = i64;

/// External client identifier. Clients are not modeled by this crate.
pub type ClientId = i64;

/// Number carried by a parcel that has not been persisted yet.
pub const UNASSIGNED_NUMBER: ParcelNumber = 0;

/// Workflow stage of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted from the client, not yet handed to a carrier.
    Registered,
    /// In transit.
    Sent,
    /// Handed to the recipient. Terminal.
    Delivered,
}

impl ParcelStatus {
    /// Storage/wire name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Parses a storage/wire name. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registered" => Some(Self::Registered),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Returns the only legal successor, or `None` for terminal states.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Whether `next` is a legal forward step from `self`.
    ///
    /// Skipping a stage, going back, and staying in place are all rejected.
    pub fn can_transition_to(self, next: Self) -> bool {
        self.next() == Some(next)
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for parcel records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcelValidationError {
    /// Address is empty or whitespace only.
    EmptyAddress,
    /// `created_at` is not an RFC3339 timestamp.
    InvalidCreatedAt(String),
}

impl Display for ParcelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAddress => write!(f, "parcel address must not be empty"),
            Self::InvalidCreatedAt(value) => {
                write!(f, "created_at `{value}` is not an RFC3339 timestamp")
            }
        }
    }
}

impl Error for ParcelValidationError {}

/// Shipment record tracked by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Store-assigned identifier, `0` before insertion.
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: ParcelStatus,
    /// Free-text delivery address.
    pub address: String,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl Parcel {
    /// Creates an unsaved `Registered` parcel stamped with the current UTC time.
    pub fn new(client: ClientId, address: impl Into<String>) -> Self {
        Self::with_created_at(client, address, now_rfc3339())
    }

    /// Creates an unsaved `Registered` parcel stamped with `created_at` as given.
    ///
    /// The timestamp is not checked here; `validate` rejects non-RFC3339 text.
    pub fn with_created_at(
        client: ClientId,
        address: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            number: UNASSIGNED_NUMBER,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: created_at.into(),
        }
    }

    /// Whether the store has assigned a number to this parcel.
    pub fn is_persisted(&self) -> bool {
        self.number != UNASSIGNED_NUMBER
    }

    /// Validates field-level invariants.
    pub fn validate(&self) -> Result<(), ParcelValidationError> {
        validate_address(&self.address)?;
        if DateTime::parse_from_rfc3339(&self.created_at).is_err() {
            return Err(ParcelValidationError::InvalidCreatedAt(
                self.created_at.clone(),
            ));
        }
        Ok(())
    }
}

/// Rejects blank delivery addresses.
pub fn validate_address(address: &str) -> Result<(), ParcelValidationError> {
    if address.trim().is_empty() {
        return Err(ParcelValidationError::EmptyAddress);
    }
    Ok(())
}

/// Current UTC time as RFC3339 with second precision, e.g. `2026-10-19T08:00:00Z`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
