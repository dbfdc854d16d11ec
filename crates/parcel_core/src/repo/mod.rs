//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Parcel::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidState`) in
//!   addition to DB transport errors.

pub mod parcel_repo;
