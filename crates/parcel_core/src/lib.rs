//! Core domain logic for parcel tracking.
//! This crate is the single source of truth for the parcel lifecycle rules.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::parcel::{ClientId, Parcel, ParcelId, ParcelStatus, ParcelValidationError};
pub use repo::parcel_repo::{ParcelRepository, RepoError, RepoResult, SqliteParcelRepository};
pub use service::parcel_service::ParcelService;
