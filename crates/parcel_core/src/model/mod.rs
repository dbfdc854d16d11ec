//! Parcel domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every persisted parcel is identified by a storage-assigned `ParcelId`.
//! - Deletion is physical; there is no tombstone state.

pub mod parcel;
