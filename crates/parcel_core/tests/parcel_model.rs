use chrono::DateTime;
use parcel_core::{Parcel, ParcelStatus, ParcelValidationError, UNASSIGNED_NUMBER};

#[test]
fn parcel_new_sets_defaults() {
    let parcel = Parcel::new(1000, "test");

    assert_eq!(parcel.number, UNASSIGNED_NUMBER);
    assert!(!parcel.is_persisted());
    assert_eq!(parcel.client, 1000);
    assert_eq!(parcel.status, ParcelStatus::Registered);
    assert_eq!(parcel.address, "test");
    assert!(parcel.created_at.ends_with('Z'));
    assert!(DateTime::parse_from_rfc3339(&parcel.created_at).is_ok());
    parcel.validate().unwrap();
}

#[test]
fn validate_rejects_blank_address_and_bad_timestamp() {
    let blank = Parcel::with_created_at(1, " \t", "2026-10-19T08:00:00Z");
    assert_eq!(blank.validate(), Err(ParcelValidationError::EmptyAddress));

    let bad_time = Parcel::with_created_at(1, "street", "2026-10-19 08:00");
    assert_eq!(
        bad_time.validate(),
        Err(ParcelValidationError::InvalidCreatedAt(
            "2026-10-19 08:00".to_string()
        ))
    );

    let offset = Parcel::with_created_at(1, "street", "2026-10-19T11:00:00+03:00");
    offset.validate().unwrap();
}

#[test]
fn status_advances_through_the_workflow_once() {
    assert_eq!(ParcelStatus::Registered.next(), Some(ParcelStatus::Sent));
    assert_eq!(ParcelStatus::Sent.next(), Some(ParcelStatus::Delivered));
    assert_eq!(ParcelStatus::Delivered.next(), None);
}

#[test]
fn parcel_serialization_uses_expected_wire_fields() {
    let mut parcel = Parcel::with_created_at(42, "Main st. 1", "2026-10-19T08:00:00Z");
    parcel.number = 7;
    parcel.status = ParcelStatus::Sent;

    let json = serde_json::to_value(&parcel).unwrap();
    assert_eq!(json["number"], 7);
    assert_eq!(json["client"], 42);
    assert_eq!(json["status"], "sent");
    assert_eq!(json["address"], "Main st. 1");
    assert_eq!(json["created_at"], "2026-10-19T08:00:00Z");

    let decoded: Parcel = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, parcel);
}
