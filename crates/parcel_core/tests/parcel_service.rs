use parcel_core::db::{open_db, open_db_in_memory};
use parcel_core::{
    ClientId, Parcel, ParcelNumber, ParcelRepository, ParcelService, ParcelServiceError,
    ParcelStatus, ParcelStore, RepoError, RepoResult,
};
use rusqlite::Connection;
use std::path::Path;

/// Store whose every guarded write is preceded by a courier on another
/// connection shipping the parcel.
struct ShippedMeanwhile<'conn> {
    store: ParcelStore<'conn>,
    courier: Connection,
}

impl<'conn> ShippedMeanwhile<'conn> {
    fn new(conn: &'conn Connection, path: &Path) -> Self {
        Self {
            store: ParcelStore::try_new(conn).unwrap(),
            courier: open_db(path).unwrap(),
        }
    }

    fn ship(&self, number: ParcelNumber) {
        ParcelStore::try_new(&self.courier)
            .unwrap()
            .set_status(number, ParcelStatus::Sent)
            .unwrap();
    }
}

impl ParcelRepository for ShippedMeanwhile<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        self.store.add(parcel)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        self.store.get(number)
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        self.store.get_by_client(client)
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        self.store.set_address(number, address)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        self.store.set_status(number, status)
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.store.delete(number)
    }

    fn set_address_if_status(
        &self,
        number: ParcelNumber,
        address: &str,
        expected: ParcelStatus,
    ) -> RepoResult<bool> {
        self.ship(number);
        self.store.set_address_if_status(number, address, expected)
    }

    fn set_status_if_status(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> RepoResult<bool> {
        self.ship(number);
        self.store.set_status_if_status(number, from, to)
    }

    fn delete_if_status(
        &self,
        number: ParcelNumber,
        expected: ParcelStatus,
    ) -> RepoResult<bool> {
        self.ship(number);
        self.store.delete_if_status(number, expected)
    }
}

#[test]
fn register_persists_a_registered_parcel() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(ParcelStore::try_new(&conn).unwrap());

    let parcel = service.register(5, "Baker st. 221b").unwrap();
    assert!(parcel.is_persisted());
    assert_eq!(parcel.status, ParcelStatus::Registered);

    assert_eq!(service.parcel(parcel.number).unwrap(), parcel);
    assert_eq!(service.client_parcels(5).unwrap(), vec![parcel]);
}

#[test]
fn address_can_change_only_while_registered() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(ParcelStore::try_new(&conn).unwrap());
    let number = service.register(5, "old").unwrap().number;

    service.change_address(number, "new").unwrap();
    assert_eq!(service.parcel(number).unwrap().address, "new");

    service.advance(number).unwrap();
    let err = service.change_address(number, "too late").unwrap_err();
    assert!(matches!(
        err,
        ParcelServiceError::NotRegistered {
            status: ParcelStatus::Sent,
            ..
        }
    ));
    assert_eq!(service.parcel(number).unwrap().address, "new");
}

#[test]
fn advance_walks_forward_and_stops_at_delivered() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(ParcelStore::try_new(&conn).unwrap());
    let number = service.register(5, "street").unwrap().number;

    assert_eq!(service.advance(number).unwrap(), ParcelStatus::Sent);
    assert_eq!(service.advance(number).unwrap(), ParcelStatus::Delivered);

    let err = service.advance(number).unwrap_err();
    assert!(matches!(
        err,
        ParcelServiceError::InvalidTransition {
            from: ParcelStatus::Delivered,
            to: None,
            ..
        }
    ));
    assert_eq!(service.parcel(number).unwrap().status, ParcelStatus::Delivered);
}

#[test]
fn change_status_rejects_skips_and_reversals() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(ParcelStore::try_new(&conn).unwrap());
    let number = service.register(5, "street").unwrap().number;

    let skip = service
        .change_status(number, ParcelStatus::Delivered)
        .unwrap_err();
    assert!(matches!(
        skip,
        ParcelServiceError::InvalidTransition {
            from: ParcelStatus::Registered,
            to: Some(ParcelStatus::Delivered),
            ..
        }
    ));

    service.change_status(number, ParcelStatus::Sent).unwrap();

    let back = service
        .change_status(number, ParcelStatus::Registered)
        .unwrap_err();
    assert!(matches!(back, ParcelServiceError::InvalidTransition { .. }));

    let same = service.change_status(number, ParcelStatus::Sent).unwrap_err();
    assert!(matches!(same, ParcelServiceError::InvalidTransition { .. }));
}

#[test]
fn remove_is_allowed_only_while_registered() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(ParcelStore::try_new(&conn).unwrap());
    let draft = service.register(5, "draft").unwrap().number;
    let shipped = service.register(5, "shipped").unwrap().number;
    service.advance(shipped).unwrap();

    service.remove(draft).unwrap();
    assert!(service.parcel(draft).unwrap_err().is_not_found());

    let err = service.remove(shipped).unwrap_err();
    assert!(matches!(err, ParcelServiceError::NotRegistered { .. }));
    assert_eq!(service.client_parcels(5).unwrap().len(), 1);
}

#[test]
fn missing_parcel_surfaces_repository_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(ParcelStore::try_new(&conn).unwrap());

    let err = service.change_address(404, "nowhere").unwrap_err();
    assert!(matches!(err, ParcelServiceError::Repo(RepoError::NotFound(404))));
    assert!(service.advance(404).unwrap_err().is_not_found());
    assert!(service.remove(404).unwrap_err().is_not_found());
}

#[test]
fn rules_hold_when_another_connection_ships_the_parcel_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");
    let conn = open_db(&path).unwrap();
    let service = ParcelService::new(ShippedMeanwhile::new(&conn, &path));
    let readdressed = service.register(8, "original").unwrap().number;
    let removed = service.register(8, "keep me").unwrap().number;
    let advanced = service.register(8, "moving").unwrap().number;

    let err = service
        .change_address(readdressed, "changed after ship")
        .unwrap_err();
    assert!(matches!(
        err,
        ParcelServiceError::NotRegistered {
            status: ParcelStatus::Sent,
            ..
        }
    ));

    let err = service.remove(removed).unwrap_err();
    assert!(matches!(err, ParcelServiceError::NotRegistered { .. }));

    let err = service.advance(advanced).unwrap_err();
    assert!(matches!(
        err,
        ParcelServiceError::InvalidTransition {
            from: ParcelStatus::Sent,
            to: Some(ParcelStatus::Sent),
            ..
        }
    ));

    let stored = ParcelStore::try_new(&conn).unwrap();
    assert_eq!(stored.get(readdressed).unwrap().address, "original");
    assert_eq!(stored.get(removed).unwrap().status, ParcelStatus::Sent);
    assert_eq!(stored.get(advanced).unwrap().status, ParcelStatus::Sent);
}
