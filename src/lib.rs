//! HealEasy booking engine.
//!
//! Patients describe symptoms, get matched to a specialization, and book a
//! one-hour slot with an available doctor. Doctors manage their
//! unavailability and appointment outcomes; admins oversee everything.

pub mod availability;
pub mod booking;
pub mod clinic;
pub mod config;
pub mod error;
pub mod models;
pub mod predictor;
pub mod store;

pub use availability::{AvailabilityFilter, SlotPolicy};
pub use booking::{BookingWizard, Step};
pub use clinic::Clinic;
pub use config::AppConfig;
pub use error::{BookingError, Error, Result, ValidationError};
pub use store::{MemoryStore, Repository};
