//! Role-level operations behind the patient, doctor and admin dashboards.
//!
//! [`Clinic`] owns the repository and the availability rules and is the
//! single place where records are created or changed on behalf of a user.

use crate::availability::AvailabilityFilter;
use crate::booking::BookingWizard;
use crate::config::AppConfig;
use crate::error::ValidationError;
use crate::models::{
    AccessLevel, Account, Appointment, AppointmentStatus, NewAccount, Role,
    RoleKind, UnavailabilityRange,
};
use crate::store::{ForeignKey, Repository};
use chrono::NaiveDate;
use serde::Serialize;

/// Profile fields a user may change. `None` or blank values leave the field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub blood_group: Option<String>,
    pub specialization: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Headline counts for the admin overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClinicStats {
    pub patients: usize,
    pub doctors: usize,
    pub admins: usize,
    pub appointments: usize,
    pub active_appointments: usize,
}

/// One page of a longer listing. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `items` into the requested page. Page 0 is treated as page 1.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let start = (page - 1).saturating_mul(page_size);

    Page {
        items: items.iter().skip(start).take(page_size).cloned().collect(),
        page,
        total_pages: items.len().div_ceil(page_size),
        total_items: items.len(),
    }
}

/// Keep only digits, `+`, `-` and spaces.
pub fn sanitize_phone(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' '))
        .collect()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidEmail(email.to_string())),
    }
}

pub struct Clinic<R: Repository> {
    repo: R,
    filter: AvailabilityFilter,
    config: AppConfig,
}

impl<R: Repository> Clinic<R> {
    pub fn new(repo: R, config: AppConfig) -> Self {
        Clinic {
            repo,
            filter: AvailabilityFilter::new(config.slot_policy),
            config,
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn filter(&self) -> AvailabilityFilter {
        self.filter
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Start a booking for `patient_id` under this clinic's slot policy.
    pub fn start_booking(&self, patient_id: &str) -> BookingWizard {
        BookingWizard::new(patient_id, self.filter)
    }

    fn email_taken(&self, email: &str, except_id: Option<&str>) -> bool {
        self.repo.accounts().iter().any(|account| {
            account.email.eq_ignore_ascii_case(email.trim()) && Some(account.id.as_str()) != except_id
        })
    }

    /// Register a new account of any role.
    ///
    /// Self-registered admins always receive limited access.
    pub fn register(&mut self, mut draft: NewAccount) -> Result<Account, ValidationError> {
        require(&draft.first_name, "First name")?;
        require(&draft.last_name, "Last name")?;
        require(&draft.email, "Email")?;
        require(&draft.password, "Password")?;
        validate_email(&draft.email)?;
        draft.email = draft.email.trim().to_string();
        if self.email_taken(&draft.email, None) {
            return Err(ValidationError::DuplicateEmail(draft.email));
        }

        match &mut draft.role {
            Role::Patient(patient) => {
                patient.phone_number = sanitize_phone(&patient.phone_number);
                if patient.blood_group.trim().is_empty() {
                    patient.blood_group = "Not specified".to_string();
                }
            }
            Role::Doctor(doctor) => {
                require(&doctor.specialization, "Specialization")?;
                require(&doctor.license_number, "License number")?;
                doctor.phone_number = sanitize_phone(&doctor.phone_number);
                doctor.unavailability.clear();
            }
            Role::Admin(admin) => admin.access_level = AccessLevel::Limited,
        }

        let account = self.repo.create_account(draft);
        tracing::info!(id = %account.id, role = %account.kind(), "Account registered");
        Ok(account)
    }

    /// Find the account matching the credentials and role.
    pub fn login(&self, email: &str, password: &str, role: RoleKind) -> Option<Account> {
        let account = self.repo.accounts().into_iter().find(|account| {
            account.email.eq_ignore_ascii_case(email.trim())
                && account.password == password
                && account.kind() == role
        });
        match &account {
            Some(account) => tracing::info!(id = %account.id, %role, "Login succeeded"),
            None => tracing::warn!(%role, "Login failed"),
        }
        account
    }

    /// Apply profile changes. Returns `Ok(None)` for an unknown id.
    pub fn update_profile(
        &mut self,
        id: &str,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, ValidationError> {
        let new_password = non_blank(&update.new_password).map(str::to_string);
        if let Some(password) = &new_password {
            if non_blank(&update.confirm_password) != Some(password.as_str()) {
                return Err(ValidationError::PasswordMismatch);
            }
        }

        let new_email = non_blank(&update.email).map(str::to_string);
        if let Some(email) = &new_email {
            validate_email(email)?;
            if self.email_taken(email, Some(id)) {
                return Err(ValidationError::DuplicateEmail(email.clone()));
            }
        }

        let updated = self.repo.update_account(id, |account| {
            if let Some(first_name) = non_blank(&update.first_name) {
                account.first_name = first_name.to_string();
            }
            if let Some(last_name) = non_blank(&update.last_name) {
                account.last_name = last_name.to_string();
            }
            if let Some(email) = new_email {
                account.email = email;
            }
            if let Some(password) = new_password {
                account.password = password;
            }

            let phone = non_blank(&update.phone_number).map(sanitize_phone);
            match &mut account.role {
                Role::Patient(patient) => {
                    if let Some(phone) = phone {
                        patient.phone_number = phone;
                    }
                    if let Some(blood_group) = non_blank(&update.blood_group) {
                        patient.blood_group = blood_group.to_string();
                    }
                }
                Role::Doctor(doctor) => {
                    if let Some(phone) = phone {
                        doctor.phone_number = phone;
                    }
                    if let Some(specialization) = non_blank(&update.specialization) {
                        doctor.specialization = specialization.to_string();
                    }
                }
                Role::Admin(_) => {}
            }
        });

        if let Some(account) = &updated {
            tracing::info!(id = %account.id, "Profile updated");
        }
        Ok(updated)
    }

    /// Block a date range for a doctor. Returns `Ok(None)` for an unknown id.
    pub fn add_unavailability(
        &mut self,
        doctor_id: &str,
        range: UnavailabilityRange,
    ) -> Result<Option<Account>, ValidationError> {
        match self.repo.account(doctor_id) {
            None => return Ok(None),
            Some(account) if account.as_doctor().is_none() => {
                return Err(ValidationError::NotADoctor(doctor_id.to_string()))
            }
            Some(_) => {}
        }

        tracing::info!(
            doctor_id,
            start = %range.start_date,
            end = %range.end_date,
            "Unavailability added"
        );
        Ok(self.repo.update_account(doctor_id, |account| {
            if let Some(doctor) = account.as_doctor_mut() {
                doctor.unavailability.push(range);
            }
        }))
    }

    /// Remove every range with exactly these bounds.
    pub fn remove_unavailability(
        &mut self,
        doctor_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Option<Account> {
        self.repo.doctor(doctor_id)?;
        self.repo.update_account(doctor_id, |account| {
            if let Some(doctor) = account.as_doctor_mut() {
                doctor
                    .unavailability
                    .retain(|range| !(range.start_date == start_date && range.end_date == end_date));
            }
        })
    }

    /// Change an appointment's status; diagnosis and prescription only overwrite when given.
    pub fn set_status(
        &mut self,
        appointment_id: &str,
        status: AppointmentStatus,
        diagnosis: Option<String>,
        prescription: Option<String>,
    ) -> Option<Appointment> {
        let updated = self.repo.update_appointment(appointment_id, |appointment| {
            appointment.status = status;
            if let Some(diagnosis) = diagnosis.filter(|d| !d.trim().is_empty()) {
                appointment.diagnosis = Some(diagnosis);
            }
            if let Some(prescription) = prescription.filter(|p| !p.trim().is_empty()) {
                appointment.prescription = Some(prescription);
            }
        });
        if updated.is_some() {
            tracing::info!(appointment_id, %status, "Appointment status changed");
        }
        updated
    }

    pub fn cancel_appointment(&mut self, appointment_id: &str) -> Option<Appointment> {
        self.set_status(appointment_id, AppointmentStatus::Cancelled, None, None)
    }

    /// Delete an account. Its appointments are left in place.
    pub fn delete_account(&mut self, id: &str) -> bool {
        self.repo.delete_account(id)
    }

    pub fn delete_appointment(&mut self, id: &str) -> bool {
        self.repo.delete_appointment(id)
    }

    /// Pending and confirmed appointments of a patient.
    pub fn patient_upcoming(&self, patient_id: &str) -> Vec<Appointment> {
        self.repo
            .appointments_by(ForeignKey::Patient, patient_id)
            .into_iter()
            .filter(|a| a.status.is_upcoming())
            .collect()
    }

    /// Completed and cancelled appointments of a patient.
    pub fn patient_past(&self, patient_id: &str) -> Vec<Appointment> {
        self.repo
            .appointments_by(ForeignKey::Patient, patient_id)
            .into_iter()
            .filter(|a| !a.status.is_upcoming())
            .collect()
    }

    pub fn doctor_appointments(&self, doctor_id: &str) -> Vec<Appointment> {
        self.repo.appointments_by(ForeignKey::Doctor, doctor_id)
    }

    pub fn stats(&self) -> ClinicStats {
        let accounts = self.repo.accounts();
        let count = |kind: RoleKind| accounts.iter().filter(|a| a.kind() == kind).count();
        let appointments = self.repo.appointments();

        ClinicStats {
            patients: count(RoleKind::Patient),
            doctors: count(RoleKind::Doctor),
            admins: count(RoleKind::Admin),
            appointments: appointments.len(),
            active_appointments: appointments.iter().filter(|a| a.status.is_upcoming()).count(),
        }
    }

    /// Most recently created appointments first.
    pub fn recent_appointments(&self, limit: usize) -> Vec<Appointment> {
        let mut appointments = self.repo.appointments();
        appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        appointments.truncate(limit);
        appointments
    }

    /// Accounts of one role whose names, email, phone or specialization contain `term`.
    pub fn search_accounts(&self, role: RoleKind, term: &str) -> Vec<Account> {
        let needle = term.trim().to_lowercase();
        self.repo
            .accounts_of(role)
            .into_iter()
            .filter(|account| {
                let mut haystack = format!(
                    "{} {} {}",
                    account.first_name, account.last_name, account.email
                );
                if let Some(doctor) = account.as_doctor() {
                    haystack.push(' ');
                    haystack.push_str(&doctor.specialization);
                }
                if let Some(phone) = account.phone_number() {
                    haystack.push(' ');
                    haystack.push_str(phone);
                }
                haystack.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Appointments matching `term` and `status`, latest date first.
    pub fn search_appointments(
        &self,
        term: &str,
        status: Option<AppointmentStatus>,
    ) -> Vec<Appointment> {
        let needle = term.trim().to_lowercase();
        let mut matches: Vec<Appointment> = self
            .repo
            .appointments()
            .into_iter()
            .filter(|a| status.map_or(true, |status| a.status == status))
            .filter(|a| {
                format!("{} {} {}", a.patient_name, a.doctor_name, a.specialization)
                    .to_lowercase()
                    .contains(&needle)
            })
            .collect();
        matches.sort_by(|a, b| b.date.cmp(&a.date));
        matches
    }

    /// Paginate with the configured page size.
    pub fn page<T: Clone>(&self, items: &[T], page: usize) -> Page<T> {
        paginate(items, page, self.config.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_date, AdminProfile, DoctorProfile, PatientProfile, TimeSlot};
    use crate::store::MemoryStore;

    fn clinic() -> Clinic<MemoryStore> {
        Clinic::new(MemoryStore::seeded(), AppConfig::default())
    }

    fn patient_draft(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password: "hunter2".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: Role::Patient(PatientProfile {
                date_of_birth: parse_date("1990-01-01").ok(),
                blood_group: String::new(),
                phone_number: "(555) 010-2030 ext".to_string(),
            }),
        }
    }

    #[test]
    fn register_patient_normalizes_fields() {
        let mut clinic = clinic();
        let account = clinic.register(patient_draft(" grace@example.com ")).unwrap();

        assert!(account.id.starts_with("user-"));
        assert_eq!(account.email, "grace@example.com");
        let patient = account.as_patient().unwrap();
        assert_eq!(patient.phone_number, "555 010-2030 ");
        assert_eq!(patient.blood_group, "Not specified");
        assert_eq!(clinic.stats().patients, 3);
    }

    #[test]
    fn register_rejects_bad_input() {
        let mut clinic = clinic();

        let mut draft = patient_draft("grace@example.com");
        draft.first_name = " ".to_string();
        assert_eq!(
            clinic.register(draft),
            Err(ValidationError::EmptyField("First name"))
        );
        assert_eq!(
            clinic.register(patient_draft("not-an-email")),
            Err(ValidationError::InvalidEmail("not-an-email".to_string()))
        );
        assert_eq!(
            clinic.register(patient_draft("PATIENT1@example.com")),
            Err(ValidationError::DuplicateEmail("PATIENT1@example.com".to_string()))
        );

        let doctor = NewAccount {
            role: Role::Doctor(DoctorProfile {
                date_of_birth: None,
                phone_number: String::new(),
                license_number: "MD1".to_string(),
                specialization: String::new(),
                unavailability: Vec::new(),
            }),
            ..patient_draft("doc@example.com")
        };
        assert_eq!(
            clinic.register(doctor),
            Err(ValidationError::EmptyField("Specialization"))
        );
    }

    #[test]
    fn registered_admin_has_limited_access() {
        let mut clinic = clinic();
        let admin = clinic
            .register(NewAccount {
                role: Role::Admin(AdminProfile {
                    access_level: AccessLevel::Full,
                }),
                ..patient_draft("ops@example.com")
            })
            .unwrap();
        assert_eq!(
            admin.role,
            Role::Admin(AdminProfile {
                access_level: AccessLevel::Limited
            })
        );
    }

    #[test]
    fn login_checks_role() {
        let clinic = clinic();
        assert!(clinic
            .login("doctor1@example.com", "password3", RoleKind::Doctor)
            .is_some());
        assert!(clinic
            .login("doctor1@example.com", "password3", RoleKind::Patient)
            .is_none());
        assert!(clinic
            .login("doctor1@example.com", "wrong", RoleKind::Doctor)
            .is_none());
    }

    #[test]
    fn profile_update_requires_matching_password() {
        let mut clinic = clinic();
        let mismatch = ProfileUpdate {
            new_password: Some("new".to_string()),
            confirm_password: Some("other".to_string()),
            ..ProfileUpdate::default()
        };
        assert_eq!(
            clinic.update_profile("patient1", mismatch),
            Err(ValidationError::PasswordMismatch)
        );

        let update = ProfileUpdate {
            last_name: Some("Jones".to_string()),
            first_name: Some("   ".to_string()),
            blood_group: Some("O+".to_string()),
            new_password: Some("new".to_string()),
            confirm_password: Some("new".to_string()),
            ..ProfileUpdate::default()
        };
        let updated = clinic.update_profile("patient1", update).unwrap().unwrap();
        assert_eq!(updated.full_name(), "Alice Jones");
        assert_eq!(updated.password, "new");
        assert_eq!(updated.as_patient().unwrap().blood_group, "O+");

        assert_eq!(
            clinic.update_profile("missing", ProfileUpdate::default()),
            Ok(None)
        );
    }

    #[test]
    fn unavailability_round_trip_through_filter() {
        let mut clinic = clinic();
        let start = parse_date("2024-07-01").unwrap();
        let end = parse_date("2024-07-05").unwrap();
        let range = UnavailabilityRange::new(start, end, "Leave".to_string()).unwrap();

        clinic
            .add_unavailability("doctor1", range.clone())
            .unwrap()
            .unwrap();
        clinic.add_unavailability("doctor1", range).unwrap().unwrap();
        let filter = clinic.filter();
        assert!(!filter.is_available(clinic.repo(), "doctor1", start));

        let doctor = clinic.remove_unavailability("doctor1", start, end).unwrap();
        assert!(doctor.as_doctor().unwrap().unavailability.is_empty());
        assert!(filter.is_available(clinic.repo(), "doctor1", start));
    }

    #[test]
    fn unavailability_for_non_doctor() {
        let mut clinic = clinic();
        let day = parse_date("2024-07-01").unwrap();
        let range = UnavailabilityRange::new(day, day, "Leave".to_string()).unwrap();
        assert_eq!(
            clinic.add_unavailability("patient1", range.clone()),
            Err(ValidationError::NotADoctor("patient1".to_string()))
        );
        assert_eq!(clinic.add_unavailability("ghost", range), Ok(None));
        assert!(clinic.remove_unavailability("patient1", day, day).is_none());
    }

    #[test]
    fn status_update_keeps_existing_notes() {
        let mut clinic = clinic();
        let updated = clinic
            .set_status("appointment1", AppointmentStatus::Completed, None, None)
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Completed);
        assert_eq!(updated.diagnosis.as_deref(), Some("Possible angina"));

        let updated = clinic
            .set_status(
                "appointment2",
                AppointmentStatus::Confirmed,
                Some("Contact dermatitis".to_string()),
                None,
            )
            .unwrap();
        assert_eq!(updated.diagnosis.as_deref(), Some("Contact dermatitis"));
        assert_eq!(updated.prescription, None);

        assert!(clinic
            .set_status("missing", AppointmentStatus::Completed, None, None)
            .is_none());
    }

    #[test]
    fn patient_dashboard_splits_by_status() {
        let mut clinic = clinic();
        assert_eq!(clinic.patient_upcoming("patient1").len(), 1);
        assert!(clinic.patient_past("patient1").is_empty());

        clinic.cancel_appointment("appointment1").unwrap();
        assert!(clinic.patient_upcoming("patient1").is_empty());
        assert_eq!(clinic.patient_past("patient1").len(), 1);
    }

    #[test]
    fn cancelled_slot_follows_configured_policy() {
        let mut config = AppConfig::default();
        config.slot_policy.cancelled_frees_slot = true;
        let mut clinic = Clinic::new(MemoryStore::seeded(), config);
        let day = parse_date("2024-07-10").unwrap();
        let ten = TimeSlot::parse("10:00 AM").unwrap();

        assert!(!clinic.filter().open_slots(clinic.repo(), "doctor1", day).contains(&ten));
        clinic.cancel_appointment("appointment1");
        assert!(clinic.filter().open_slots(clinic.repo(), "doctor1", day).contains(&ten));
    }

    #[test]
    fn stats_count_roles_and_active_appointments() {
        let mut clinic = clinic();
        clinic.set_status("appointment2", AppointmentStatus::Completed, None, None);
        assert_eq!(
            clinic.stats(),
            ClinicStats {
                patients: 2,
                doctors: 2,
                admins: 1,
                appointments: 2,
                active_appointments: 1,
            }
        );
    }

    #[test]
    fn search_accounts_matches_any_field() {
        let clinic = clinic();
        let by_specialization = clinic.search_accounts(RoleKind::Doctor, "DERMA");
        assert_eq!(by_specialization.len(), 1);
        assert_eq!(by_specialization[0].id, "doctor2");

        let by_phone = clinic.search_accounts(RoleKind::Patient, "987-654");
        assert_eq!(by_phone[0].id, "patient2");

        assert_eq!(clinic.search_accounts(RoleKind::Admin, "").len(), 1);
        assert!(clinic.search_accounts(RoleKind::Patient, "Cardiology").is_empty());
    }

    #[test]
    fn search_appointments_filters_and_sorts_by_date_desc() {
        let clinic = clinic();
        let all: Vec<String> = clinic
            .search_appointments("", None)
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(all, vec!["appointment2".to_string(), "appointment1".to_string()]);

        let pending = clinic.search_appointments("bob", Some(AppointmentStatus::Pending));
        assert_eq!(pending.len(), 1);
        assert!(clinic
            .search_appointments("bob", Some(AppointmentStatus::Confirmed))
            .is_empty());
    }

    #[test]
    fn deleting_account_keeps_appointments() {
        let mut clinic = clinic();
        assert!(clinic.delete_account("patient1"));
        assert_eq!(clinic.repo().appointments().len(), 2);
        assert!(clinic.delete_appointment("appointment1"));
        assert!(!clinic.delete_appointment("appointment1"));
    }

    #[test]
    fn pagination_arithmetic() {
        let items: Vec<u32> = (1..=23).collect();
        let page = paginate(&items, 3, 10);
        assert_eq!(page.items, vec![21, 22, 23]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 23);

        assert_eq!(paginate(&items, 0, 10).items[0], 1);
        assert!(paginate(&items, 4, 10).items.is_empty());
        assert_eq!(paginate::<u32>(&[], 1, 10).total_pages, 0);
    }
}
