//! Step-by-step appointment booking.
//!
//! The wizard walks a patient through five ordered steps. Each step owns one
//! selection; moving forward needs that selection, moving back is always
//! allowed and keeps everything. Changing an upstream selection clears every
//! selection downstream of it so a stale doctor or slot can never reach
//! confirmation.

use crate::availability::AvailabilityFilter;
use crate::error::BookingError;
use crate::models::{Account, Appointment, AppointmentStatus, NewAppointment, Prediction, TimeSlot};
use crate::predictor;
use crate::store::Repository;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Step {
    Symptoms = 1,
    ChooseDate = 2,
    ChooseDoctor = 3,
    ChooseTime = 4,
    Confirmation = 5,
}

impl Step {
    pub fn next(&self) -> Option<Step> {
        match self {
            Step::Symptoms => Some(Step::ChooseDate),
            Step::ChooseDate => Some(Step::ChooseDoctor),
            Step::ChooseDoctor => Some(Step::ChooseTime),
            Step::ChooseTime => Some(Step::Confirmation),
            Step::Confirmation => None,
        }
    }

    pub fn previous(&self) -> Option<Step> {
        match self {
            Step::Symptoms => None,
            Step::ChooseDate => Some(Step::Symptoms),
            Step::ChooseDoctor => Some(Step::ChooseDate),
            Step::ChooseTime => Some(Step::ChooseDoctor),
            Step::Confirmation => Some(Step::ChooseTime),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Symptoms => "Symptoms",
            Step::ChooseDate => "Choose date",
            Step::ChooseDoctor => "Choose doctor",
            Step::ChooseTime => "Choose time",
            Step::Confirmation => "Confirmation",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-progress booking for one patient.
#[derive(Debug, Clone)]
pub struct BookingWizard {
    patient_id: String,
    filter: AvailabilityFilter,
    step: Step,
    symptoms: String,
    predictions: Vec<Prediction>,
    suggestion: Option<Prediction>,
    date: Option<NaiveDate>,
    doctors: Vec<Account>,
    doctor_id: Option<String>,
    open_slots: Vec<TimeSlot>,
    slot: Option<TimeSlot>,
}

impl BookingWizard {
    pub fn new(patient_id: impl Into<String>, filter: AvailabilityFilter) -> Self {
        BookingWizard {
            patient_id: patient_id.into(),
            filter,
            step: Step::Symptoms,
            symptoms: String::new(),
            predictions: Vec::new(),
            suggestion: None,
            date: None,
            doctors: Vec::new(),
            doctor_id: None,
            open_slots: Vec::new(),
            slot: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn symptoms(&self) -> &str {
        &self.symptoms
    }

    /// All predictions from the last symptom analysis.
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// The top prediction; its specialization filters doctors.
    pub fn suggestion(&self) -> Option<Prediction> {
        self.suggestion
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Doctors offered for the selected date and suggested specialization.
    pub fn doctors(&self) -> &[Account] {
        &self.doctors
    }

    pub fn doctor_id(&self) -> Option<&str> {
        self.doctor_id.as_deref()
    }

    pub fn doctor(&self) -> Option<&Account> {
        let id = self.doctor_id.as_deref()?;
        self.doctors.iter().find(|doctor| doctor.id == id)
    }

    pub fn open_slots(&self) -> &[TimeSlot] {
        &self.open_slots
    }

    pub fn slot(&self) -> Option<TimeSlot> {
        self.slot
    }

    fn expect_step(&self, expected: Step) -> Result<(), BookingError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(BookingError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    fn clear_doctor(&mut self) {
        self.doctor_id = None;
        self.open_slots.clear();
        self.slot = None;
    }

    pub fn set_symptoms(&mut self, symptoms: impl Into<String>) -> Result<(), BookingError> {
        self.expect_step(Step::Symptoms)?;
        self.symptoms = symptoms.into();
        Ok(())
    }

    /// Pick the appointment date. A different date invalidates doctor and slot.
    pub fn select_date<R: Repository>(
        &mut self,
        repo: &R,
        date: NaiveDate,
    ) -> Result<(), BookingError> {
        self.expect_step(Step::ChooseDate)?;
        if self.date == Some(date) {
            return Ok(());
        }

        self.date = Some(date);
        self.clear_doctor();
        self.refresh_doctors(repo);
        tracing::debug!(%date, doctors = self.doctors.len(), "Booking date selected");
        Ok(())
    }

    /// Pick a doctor from the offered list. A different doctor invalidates the slot.
    pub fn select_doctor<R: Repository>(
        &mut self,
        repo: &R,
        doctor_id: &str,
    ) -> Result<(), BookingError> {
        self.expect_step(Step::ChooseDoctor)?;
        if !self.doctors.iter().any(|doctor| doctor.id == doctor_id) {
            return Err(BookingError::DoctorNotOffered(doctor_id.to_string()));
        }
        if self.doctor_id.as_deref() == Some(doctor_id) {
            return Ok(());
        }

        self.doctor_id = Some(doctor_id.to_string());
        self.slot = None;
        self.refresh_slots(repo);
        tracing::debug!(doctor_id, open = self.open_slots.len(), "Booking doctor selected");
        Ok(())
    }

    pub fn select_slot(&mut self, slot: TimeSlot) -> Result<(), BookingError> {
        self.expect_step(Step::ChooseTime)?;
        if !self.open_slots.contains(&slot) {
            return Err(BookingError::SlotTaken(slot));
        }
        self.slot = Some(slot);
        Ok(())
    }

    fn refresh_doctors<R: Repository>(&mut self, repo: &R) {
        self.doctors = match (self.date, self.suggestion) {
            (Some(date), Some(suggestion)) => {
                self.filter
                    .available_doctors(repo, date, suggestion.specialization)
            }
            _ => Vec::new(),
        };
        if self.doctor().is_none() {
            self.clear_doctor();
        }
    }

    fn refresh_slots<R: Repository>(&mut self, repo: &R) {
        self.open_slots = match (self.doctor_id.as_deref(), self.date) {
            (Some(doctor_id), Some(date)) => self.filter.open_slots(repo, doctor_id, date),
            _ => Vec::new(),
        };
        if let Some(slot) = self.slot {
            if !self.open_slots.contains(&slot) {
                self.slot = None;
            }
        }
    }

    /// Move to the next step if the current one has its input.
    ///
    /// Leaving `Symptoms` runs the symptom predictor and fixes the suggested
    /// specialization. Entering `ChooseDoctor` and `ChooseTime` recompute the
    /// offered doctors and open slots from the repository.
    pub fn advance<R: Repository>(&mut self, repo: &R) -> Result<Step, BookingError> {
        match self.step {
            Step::Symptoms => {
                if self.symptoms.trim().is_empty() {
                    return Err(BookingError::MissingInput(Step::Symptoms));
                }
                let predictions = predictor::predict(&self.symptoms);
                let top = predictions.first().copied().unwrap_or(predictor::GENERAL_CHECK_UP);

                let changed = self
                    .suggestion
                    .map_or(false, |old| old.specialization != top.specialization);
                if changed {
                    self.doctors.clear();
                    self.clear_doctor();
                }

                tracing::debug!(
                    condition = top.condition,
                    specialization = top.specialization,
                    "Symptoms analysed"
                );
                self.predictions = predictions;
                self.suggestion = Some(top);
            }
            Step::ChooseDate => {
                if self.date.is_none() {
                    return Err(BookingError::MissingInput(Step::ChooseDate));
                }
                self.refresh_doctors(repo);
            }
            Step::ChooseDoctor => {
                if self.doctor_id.is_none() {
                    return Err(BookingError::MissingInput(Step::ChooseDoctor));
                }
                self.refresh_slots(repo);
            }
            Step::ChooseTime => {
                if self.slot.is_none() {
                    return Err(BookingError::MissingInput(Step::ChooseTime));
                }
            }
            Step::Confirmation => return Ok(self.step),
        }

        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Step back one screen. Selections are kept.
    pub fn back(&mut self) -> Step {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Submit the booking as a pending appointment and start over.
    ///
    /// The slot is not re-checked here; two wizards holding the same slot
    /// can both confirm.
    pub fn confirm<R: Repository>(&mut self, repo: &mut R) -> Result<Appointment, BookingError> {
        self.expect_step(Step::Confirmation)?;

        let suggestion = self
            .suggestion
            .ok_or(BookingError::MissingInput(Step::Symptoms))?;
        let date = self.date.ok_or(BookingError::MissingInput(Step::ChooseDate))?;
        let slot = self.slot.ok_or(BookingError::MissingInput(Step::ChooseTime))?;
        let doctor = self
            .doctor()
            .cloned()
            .ok_or(BookingError::MissingInput(Step::ChooseDoctor))?;
        let patient = repo
            .account(&self.patient_id)
            .filter(|account| account.as_patient().is_some())
            .ok_or_else(|| BookingError::UnknownPatient(self.patient_id.clone()))?;

        let appointment = repo.create_appointment(NewAppointment {
            patient_id: patient.id.clone(),
            doctor_id: doctor.id.clone(),
            patient_name: patient.full_name(),
            doctor_name: doctor.full_name(),
            specialization: suggestion.specialization.to_string(),
            date,
            time_slot: slot,
            status: AppointmentStatus::Pending,
            symptoms: self.symptoms.clone(),
            predicted_condition: Some(suggestion.condition.to_string()),
        });

        tracing::info!(
            id = %appointment.id,
            patient = %appointment.patient_id,
            doctor = %appointment.doctor_id,
            date = %appointment.date,
            slot = %appointment.time_slot,
            "Appointment booked"
        );

        *self = BookingWizard::new(std::mem::take(&mut self.patient_id), self.filter);
        Ok(appointment)
    }
}
