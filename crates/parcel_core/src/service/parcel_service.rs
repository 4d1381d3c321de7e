//! Parcel tracking use-case service.
//!
//! # Responsibility
//! - Enforce parcel workflow rules above the repository layer.
//! - Provide register, read, re-address, advance and remove operations.
//!
//! # Invariants
//! - Address changes and removal are allowed only while `Registered`.
//! - Status changes follow `ParcelStatus::can_transition_to`.
//! - Service APIs never bypass repository validation/persistence contracts.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ParcelServiceResult<T> = Result<T, ParcelServiceError>;

/// Errors from parcel service operations.
#[derive(Debug)]
pub enum ParcelServiceError {
    /// Operation requires the parcel to still be `Registered`.
    NotRegistered {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    /// Requested status is not the next workflow stage.
    InvalidTransition {
        number: ParcelNumber,
        from: ParcelStatus,
        to: Option<ParcelStatus>,
    },
    /// Repository-level failure, including `NotFound`.
    Repo(RepoError),
}

impl ParcelServiceError {
    /// Whether the underlying cause is a missing parcel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_not_found())
    }
}

impl Display for ParcelServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRegistered { number, status } => write!(
                f,
                "parcel {number} is `{status}`; only registered parcels can be changed"
            ),
            Self::InvalidTransition {
                number,
                from,
                to: Some(to),
            } => write!(f, "parcel {number} cannot move from `{from}` to `{to}`"),
            Self::InvalidTransition {
                number,
                from,
                to: None,
            } => write!(f, "parcel {number} is `{from}` and has no further stage"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ParcelServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotRegistered { .. } | Self::InvalidTransition { .. } => None,
        }
    }
}

impl From<RepoError> for ParcelServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for parcel tracking.
pub struct ParcelService<R: ParcelRepository> {
    repo: R,
}

impl<R: ParcelRepository> ParcelService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new parcel for `client` and returns it with its number.
    pub fn register(
        &self,
        client: ClientId,
        address: impl Into<String>,
    ) -> ParcelServiceResult<Parcel> {
        let mut parcel = Parcel::new(client, address);
        parcel.number = self.repo.add(&parcel)?;
        info!(
            "event=parcel_register module=service status=ok number={} client={}",
            parcel.number, client
        );
        Ok(parcel)
    }

    /// Gets one parcel by number.
    pub fn parcel(&self, number: ParcelNumber) -> ParcelServiceResult<Parcel> {
        Ok(self.repo.get(number)?)
    }

    /// Lists all parcels of a client ordered by number.
    pub fn client_parcels(&self, client: ClientId) -> ParcelServiceResult<Vec<Parcel>> {
        Ok(self.repo.get_by_client(client)?)
    }

    /// Changes the delivery address of a parcel that has not been sent yet.
    pub fn change_address(&self, number: ParcelNumber, address: &str) -> ParcelServiceResult<()> {
        if self
            .repo
            .set_address_if_status(number, address, ParcelStatus::Registered)?
        {
            return Ok(());
        }
        Err(self.not_registered(number))
    }

    /// Moves a parcel to its next workflow stage and returns the new status.
    pub fn advance(&self, number: ParcelNumber) -> ParcelServiceResult<ParcelStatus> {
        let current = self.repo.get(number)?.status;
        let Some(next) = current.next() else {
            return Err(rejected_transition(number, current, None));
        };

        self.transition(number, current, next)?;
        Ok(next)
    }

    /// Sets a parcel status, accepting only the next workflow stage.
    pub fn change_status(
        &self,
        number: ParcelNumber,
        status: ParcelStatus,
    ) -> ParcelServiceResult<()> {
        let current = self.repo.get(number)?.status;
        if !current.can_transition_to(status) {
            return Err(rejected_transition(number, current, Some(status)));
        }

        self.transition(number, current, status)
    }

    /// Removes a parcel that has not been sent yet.
    pub fn remove(&self, number: ParcelNumber) -> ParcelServiceResult<()> {
        if self
            .repo
            .delete_if_status(number, ParcelStatus::Registered)?
        {
            info!("event=parcel_remove module=service status=ok number={number}");
            return Ok(());
        }
        Err(self.not_registered(number))
    }

    // The write only lands if the status is still `from`; another writer may
    // have moved the parcel since it was read.
    fn transition(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> ParcelServiceResult<()> {
        if self.repo.set_status_if_status(number, from, to)? {
            return Ok(());
        }
        let actual = self.repo.get(number)?.status;
        Err(rejected_transition(number, actual, Some(to)))
    }

    // Called after a guarded write matched nothing: tells a missing parcel
    // apart from one that has left `Registered`.
    fn not_registered(&self, number: ParcelNumber) -> ParcelServiceError {
        let status = match self.repo.get(number) {
            Ok(parcel) => parcel.status,
            Err(err) => return err.into(),
        };
        warn!(
            "event=parcel_guard module=service status=rejected number={} parcel_status={}",
            number, status
        );
        ParcelServiceError::NotRegistered { number, status }
    }
}

fn rejected_transition(
    number: ParcelNumber,
    from: ParcelStatus,
    to: Option<ParcelStatus>,
) -> ParcelServiceError {
    warn!(
        "event=parcel_transition module=service status=rejected number={} from={} to={}",
        number,
        from,
        to.map_or("none", ParcelStatus::as_str)
    );
    ParcelServiceError::InvalidTransition { number, from, to }
}
