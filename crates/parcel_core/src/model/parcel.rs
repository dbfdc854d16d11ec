//! Parcel domain model.
//!
//! # Responsibility
//! - Define the canonical shipment record persisted in the `parcel` table.
//! - Own the status vocabulary and the forward lifecycle order.
//!
//! # Invariants
//! - `number` is assigned by storage and never reused for another parcel.
//! - `address` must not be blank.
//! - `created_at` is an ISO-8601 timestamp fixed at creation. New parcels
//!   carry RFC 3339 UTC; offset-less `YYYY-MM-DDTHH:MM:SS[.f]` is accepted.
//! - Only `ParcelStatus::Registered` permits address edits and deletion.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned parcel identity.
///
/// `0` marks a parcel that has not been persisted yet.
pub type ParcelId = i64;

/// Identifier of the client owning a parcel.
pub type ClientId = i64;

/// Lifecycle state of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted but not handed to a carrier. Address may still change.
    Registered,
    /// Handed to a carrier.
    Sent,
    /// Received by the client.
    Delivered,
}

impl ParcelStatus {
    /// Returns the canonical storage text for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Parses canonical storage text. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registered" => Some(Self::Registered),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Returns the next forward state, or `None` from `Delivered`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parcel invariant violations detected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcelValidationError {
    /// Address is empty after trimming.
    BlankAddress,
    /// `created_at` is not an ISO-8601 timestamp.
    InvalidCreatedAt(String),
}

impl Display for ParcelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankAddress => write!(f, "parcel address must not be blank"),
            Self::InvalidCreatedAt(value) => {
                write!(f, "parcel created_at `{value}` is not an ISO-8601 timestamp")
            }
        }
    }
}

impl Error for ParcelValidationError {}

/// Canonical shipment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Storage identity. `0` until the parcel is added.
    pub number: ParcelId,
    /// Owning client.
    pub client: ClientId,
    /// Current lifecycle state.
    pub status: ParcelStatus,
    /// Free-text delivery address.
    pub address: String,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
}

impl Parcel {
    /// Creates an unsaved `registered` parcel stamped with the current UTC time.
    pub fn new(client: ClientId, address: impl Into<String>) -> Self {
        Self::with_created_at(
            client,
            ParcelStatus::Registered,
            address,
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }

    /// Creates an unsaved parcel with caller-provided fields.
    ///
    /// Used by import and test paths where the timestamp already exists.
    /// This constructor does not validate; writes call [`Parcel::validate`].
    pub fn with_created_at(
        client: ClientId,
        status: ParcelStatus,
        address: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            number: 0,
            client,
            status,
            address: address.into(),
            created_at: created_at.into(),
        }
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ParcelValidationError> {
        validate_address(&self.address)?;
        validate_created_at(&self.created_at)
    }
}

/// Accepts RFC 3339 or an offset-less `YYYY-MM-DDTHH:MM:SS[.f]` timestamp.
pub fn validate_created_at(created_at: &str) -> Result<(), ParcelValidationError> {
    let with_offset = DateTime::parse_from_rfc3339(created_at).is_ok();
    let local = NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%S%.f").is_ok();
    if with_offset || local {
        return Ok(());
    }
    Err(ParcelValidationError::InvalidCreatedAt(created_at.to_string()))
}

/// Rejects addresses that are empty after trimming.
pub fn validate_address(address: &str) -> Result<(), ParcelValidationError> {
    if address.trim().is_empty() {
        return Err(ParcelValidationError::BlankAddress);
    }
    Ok(())
}
