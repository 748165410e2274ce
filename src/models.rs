//! Data models for the booking engine.
//!
//! This module defines the core data structures used throughout the system:
//! - Account: a registered user, with a role-specific profile
//! - UnavailabilityRange: a doctor-declared span of blocked dates
//! - TimeSlot: one hour of the fixed daily slot catalog
//! - Appointment: a booked visit and its lifecycle status
//! - Prediction: a condition/specialization guess for a set of symptoms

use crate::error::ValidationError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Lifecycle of an appointment.
///
/// Patients create appointments as `Pending`; doctors and admins move them
/// through the remaining states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    /// Convert a string to a status value.
    pub fn from_string(value: &str) -> Result<Self, ValidationError> {
        match value.to_lowercase().trim() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(ValidationError::InvalidStatus(value.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and confirmed appointments are still ahead of the patient.
    pub fn is_upcoming(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// One hour of the daily slot catalog.
///
/// Serialized as its display label, e.g. `"01:00 PM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    hour: u32,
}

impl TimeSlot {
    pub const DURATION_MINUTES: i64 = 60;

    /// The eight bookable hours, 09:00 AM through 04:00 PM.
    pub const CATALOG: [TimeSlot; 8] = [
        TimeSlot { hour: 9 },
        TimeSlot { hour: 10 },
        TimeSlot { hour: 11 },
        TimeSlot { hour: 12 },
        TimeSlot { hour: 13 },
        TimeSlot { hour: 14 },
        TimeSlot { hour: 15 },
        TimeSlot { hour: 16 },
    ];

    /// Look up the catalog slot starting at `hour` (24-hour clock).
    pub fn at_hour(hour: u32) -> Option<Self> {
        Self::CATALOG.iter().copied().find(|slot| slot.hour == hour)
    }

    /// Parse either the `hh:mm AM` label or a 24-hour `HH:MM` time.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim().to_uppercase();
        let time = NaiveTime::parse_from_str(&trimmed, "%I:%M %p")
            .or_else(|_| NaiveTime::parse_from_str(&trimmed, "%H:%M"))
            .map_err(|_| ValidationError::InvalidTimeSlot(value.to_string()))?;

        if time.minute() != 0 {
            return Err(ValidationError::InvalidTimeSlot(value.to_string()));
        }

        Self::at_hour(time.hour()).ok_or_else(|| ValidationError::InvalidTimeSlot(value.to_string()))
    }

    pub fn start(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, 0, 0).unwrap_or_default()
    }

    pub fn end(&self) -> NaiveTime {
        self.start() + Duration::minutes(Self::DURATION_MINUTES)
    }

    /// The moment this slot begins on `date`.
    pub fn starts_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start())
    }

    pub fn label(&self) -> String {
        self.start().format("%I:%M %p").to_string()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.label()
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl FromStr for TimeSlot {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A doctor-declared inclusive span of dates with no bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

impl UnavailabilityRange {
    /// Create a new range with validation.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
    ) -> Result<Self, ValidationError> {
        if end_date < start_date {
            return Err(ValidationError::InvertedRange {
                start: start_date,
                end: end_date,
            });
        }
        if reason.trim().is_empty() {
            return Err(ValidationError::EmptyField("Reason"));
        }

        Ok(UnavailabilityRange {
            start_date,
            end_date,
            reason,
        })
    }

    /// Check if a date falls within this range, both ends inclusive.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Full,
    Limited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: String,
    pub license_number: String,
    pub specialization: String,
    pub unavailability: Vec<UnavailabilityRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub access_level: AccessLevel,
}

/// Role-specific data attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Role {
    Patient(PatientProfile),
    Doctor(DoctorProfile),
    Admin(AdminProfile),
}

/// Role discriminant without the profile payload, used for login and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Patient,
    Doctor,
    Admin,
}

impl RoleKind {
    pub fn from_string(value: &str) -> Result<Self, ValidationError> {
        match value.to_lowercase().trim() {
            "patient" => Ok(RoleKind::Patient),
            "doctor" => Ok(RoleKind::Doctor),
            "admin" => Ok(RoleKind::Admin),
            _ => Err(ValidationError::InvalidRole(value.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoleKind::Patient => "patient",
            RoleKind::Doctor => "doctor",
            RoleKind::Admin => "admin",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Role {
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Patient(_) => RoleKind::Patient,
            Role::Doctor(_) => RoleKind::Doctor,
            Role::Admin(_) => RoleKind::Admin,
        }
    }
}

/// A registered user of any role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub role: Role,
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn kind(&self) -> RoleKind {
        self.role.kind()
    }

    pub fn as_doctor(&self) -> Option<&DoctorProfile> {
        match &self.role {
            Role::Doctor(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_doctor_mut(&mut self) -> Option<&mut DoctorProfile> {
        match &mut self.role {
            Role::Doctor(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_patient(&self) -> Option<&PatientProfile> {
        match &self.role {
            Role::Patient(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn phone_number(&self) -> Option<&str> {
        match &self.role {
            Role::Patient(p) => Some(&p.phone_number),
            Role::Doctor(d) => Some(&d.phone_number),
            Role::Admin(_) => None,
        }
    }
}

/// Fields supplied when registering; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// A booked visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub specialization: String,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: AppointmentStatus,
    pub symptoms: String,
    pub predicted_condition: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.time_slot.starts_on(self.date)
    }
}

/// Fields supplied when booking; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub specialization: String,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: AppointmentStatus,
    pub symptoms: String,
    pub predicted_condition: Option<String>,
}

/// A condition/specialization guess produced from free-text symptoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Prediction {
    pub condition: &'static str,
    pub specialization: &'static str,
}
