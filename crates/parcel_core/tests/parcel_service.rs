use parcel_core::db::open_db_in_memory;
use parcel_core::{ParcelService, ParcelStatus, RepoError, SqliteParcelRepository};
use std::collections::HashSet;

#[test]
fn register_returns_stored_registered_parcel() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelRepository::try_new(&conn).unwrap());

    let parcel = service.register(1000, "test").unwrap();
    assert_ne!(parcel.number, 0);
    assert_eq!(parcel.status, ParcelStatus::Registered);

    let stored = service.parcel(parcel.number).unwrap();
    assert_eq!(stored, parcel);
}

#[test]
fn next_status_walks_lifecycle_then_stops() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelRepository::try_new(&conn).unwrap());
    let number = service.register(1, "pier 9").unwrap().number;

    assert_eq!(service.next_status(number).unwrap(), Some(ParcelStatus::Sent));
    assert_eq!(
        service.next_status(number).unwrap(),
        Some(ParcelStatus::Delivered)
    );
    assert_eq!(service.next_status(number).unwrap(), None);
    assert_eq!(
        service.parcel(number).unwrap().status,
        ParcelStatus::Delivered
    );
}

#[test]
fn next_status_on_missing_parcel_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelRepository::try_new(&conn).unwrap());

    let err = service.next_status(404).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(404)));
}

#[test]
fn change_address_and_delete_are_guarded_after_dispatch() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelRepository::try_new(&conn).unwrap());
    let editable = service.register(2, "old street").unwrap().number;
    let dispatched = service.register(2, "far street").unwrap().number;

    service.change_address(editable, "new street").unwrap();
    assert_eq!(service.parcel(editable).unwrap().address, "new street");

    service.next_status(dispatched).unwrap();
    assert!(matches!(
        service.change_address(dispatched, "elsewhere").unwrap_err(),
        RepoError::InvalidState {
            status: ParcelStatus::Sent,
            ..
        }
    ));
    assert!(matches!(
        service.delete(dispatched).unwrap_err(),
        RepoError::InvalidState { .. }
    ));

    service.delete(editable).unwrap();
    let remaining: HashSet<_> = service
        .client_parcels(2)
        .unwrap()
        .into_iter()
        .map(|parcel| parcel.number)
        .collect();
    assert_eq!(remaining, HashSet::from([dispatched]));
}

#[test]
fn parcel_serializes_status_as_snake_case() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelRepository::try_new(&conn).unwrap());
    let parcel = service.register(3, "quay 1").unwrap();

    let json = serde_json::to_value(&parcel).unwrap();
    assert_eq!(json["status"], "registered");
    assert_eq!(json["number"], parcel.number);
    assert_eq!(json["client"], 3);
}
