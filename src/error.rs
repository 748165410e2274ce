//! Error types for the booking engine.
//!
//! Lookups never fail: a missing record is reported as `None` or an empty
//! list. Errors are reserved for input that cannot be accepted and for
//! workflow steps taken out of order.

use crate::booking::Step;
use crate::models::TimeSlot;
use chrono::NaiveDate;

/// Input rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),
    #[error("An account with email '{0}' already exists")]
    DuplicateEmail(String),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid time slot: '{0}'. Must be one of the catalog hours 09:00 AM - 04:00 PM")]
    InvalidTimeSlot(String),
    #[error("Invalid status: '{0}'. Must be one of: pending, confirmed, completed, cancelled")]
    InvalidStatus(String),
    #[error("Invalid role: '{0}'. Must be one of: patient, doctor, admin")]
    InvalidRole(String),
    #[error("Unavailability ends ({end}) before it starts ({start})")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("Account '{0}' is not a doctor")]
    NotADoctor(String),
}

/// Booking workflow misuse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("{0} requires input before continuing")]
    MissingInput(Step),
    #[error("Cannot do that during {actual}; expected {expected}")]
    WrongStep { expected: Step, actual: Step },
    #[error("Doctor '{0}' is not offered for the selected date and specialization")]
    DoctorNotOffered(String),
    #[error("Time slot {0} is not open for the selected doctor")]
    SlotTaken(TimeSlot),
    #[error("Patient '{0}' not found")]
    UnknownPatient(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
