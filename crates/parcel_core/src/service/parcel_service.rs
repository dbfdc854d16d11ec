//! Parcel use-case service.
//!
//! # Responsibility
//! - Provide register/track/advance entry points for core callers.
//! - Delegate persistence and lifecycle guards to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository guards.
//! - Service layer remains storage-agnostic.
//! - Log events carry identifiers and states only, never addresses.

use crate::model::parcel::{ClientId, Parcel, ParcelId, ParcelStatus};
use crate::repo::parcel_repo::{ParcelRepository, RepoResult};
use log::{info, warn};

/// Use-case service wrapper for parcel lifecycle operations.
pub struct ParcelService<R: ParcelRepository> {
    repo: R,
}

impl<R: ParcelRepository> ParcelService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new parcel for `client` and returns it with its number.
    ///
    /// # Contract
    /// - Status starts as `registered`.
    /// - `created_at` is stamped with the current UTC time.
    pub fn register(&self, client: ClientId, address: impl Into<String>) -> RepoResult<Parcel> {
        let mut parcel = Parcel::new(client, address);
        match self.repo.add_parcel(&parcel) {
            Ok(number) => {
                parcel.number = number;
                info!(
                    "event=parcel_register module=service status=ok number={} client={}",
                    number, client
                );
                Ok(parcel)
            }
            Err(err) => {
                warn!(
                    "event=parcel_register module=service status=error client={} error={}",
                    client, err
                );
                Err(err)
            }
        }
    }

    /// Loads one parcel by number.
    pub fn parcel(&self, number: ParcelId) -> RepoResult<Parcel> {
        self.repo.get_parcel(number)
    }

    /// Lists every parcel owned by `client`.
    pub fn client_parcels(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let parcels = self.repo.list_client_parcels(client)?;
        info!(
            "event=parcel_list module=service status=ok client={} count={}",
            client,
            parcels.len()
        );
        Ok(parcels)
    }

    /// Moves a parcel one step forward through its lifecycle.
    ///
    /// Returns the new status, or `None` when the parcel is already
    /// delivered and was left unchanged.
    pub fn next_status(&self, number: ParcelId) -> RepoResult<Option<ParcelStatus>> {
        let parcel = self.repo.get_parcel(number)?;
        let Some(next) = parcel.status.next() else {
            info!(
                "event=parcel_advance module=service status=skipped number={} from={}",
                number, parcel.status
            );
            return Ok(None);
        };

        self.repo.set_status(number, next)?;
        info!(
            "event=parcel_advance module=service status=ok number={} from={} to={}",
            number, parcel.status, next
        );
        Ok(Some(next))
    }

    /// Replaces the address of a `registered` parcel.
    pub fn change_address(&self, number: ParcelId, address: &str) -> RepoResult<()> {
        let result = self.repo.set_address(number, address);
        log_guarded("parcel_change_address", number, &result);
        result
    }

    /// Deletes a `registered` parcel.
    pub fn delete(&self, number: ParcelId) -> RepoResult<()> {
        let result = self.repo.delete_parcel(number);
        log_guarded("parcel_delete", number, &result);
        result
    }
}

fn log_guarded(event: &str, number: ParcelId, result: &RepoResult<()>) {
    match result {
        Ok(()) => info!("event={event} module=service status=ok number={number}"),
        Err(err) => warn!("event={event} module=service status=error number={number} error={err}"),
    }
}
