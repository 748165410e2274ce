//! In-memory record storage.
//!
//! The [`Repository`] trait is the only way the rest of the crate touches
//! persisted records, so tests and front ends can inject their own store.
//! [`MemoryStore`] is the default implementation: one [`Table`] per entity,
//! linear scans, no locking, no referential integrity.

use crate::models::{
    AccessLevel, Account, AdminProfile, Appointment, AppointmentStatus, DoctorProfile,
    NewAccount, NewAppointment, PatientProfile, Role, RoleKind, TimeSlot,
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// A record type that can live in a [`Table`].
pub trait Entity: Clone {
    /// Fields supplied by the caller on creation.
    type Draft;

    /// Prefix of generated ids, e.g. `appointment-<uuid>`.
    const PREFIX: &'static str;

    fn id(&self) -> &str;

    fn build(id: String, created_at: DateTime<Utc>, draft: Self::Draft) -> Self;

    /// Value of a foreign-key column, if this entity has one.
    fn foreign_key(&self, _key: ForeignKey) -> Option<&str> {
        None
    }
}

/// Columns that reference another record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKey {
    Patient,
    Doctor,
}

impl Entity for Account {
    type Draft = NewAccount;
    const PREFIX: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, created_at: DateTime<Utc>, draft: NewAccount) -> Self {
        Account {
            id,
            email: draft.email,
            password: draft.password,
            first_name: draft.first_name,
            last_name: draft.last_name,
            created_at,
            role: draft.role,
        }
    }
}

impl Entity for Appointment {
    type Draft = NewAppointment;
    const PREFIX: &'static str = "appointment";

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, created_at: DateTime<Utc>, draft: NewAppointment) -> Self {
        Appointment {
            id,
            patient_id: draft.patient_id,
            doctor_id: draft.doctor_id,
            patient_name: draft.patient_name,
            doctor_name: draft.doctor_name,
            specialization: draft.specialization,
            date: draft.date,
            time_slot: draft.time_slot,
            status: draft.status,
            symptoms: draft.symptoms,
            predicted_condition: draft.predicted_condition,
            diagnosis: None,
            prescription: None,
            created_at,
        }
    }

    fn foreign_key(&self, key: ForeignKey) -> Option<&str> {
        match key {
            ForeignKey::Patient => Some(&self.patient_id),
            ForeignKey::Doctor => Some(&self.doctor_id),
        }
    }
}

/// Insertion-ordered records of one entity type.
#[derive(Debug, Clone)]
pub struct Table<E> {
    rows: Vec<E>,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Table { rows: Vec::new() }
    }
}

impl<E: Entity> Table<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record with a generated id and creation timestamp.
    pub fn create(&mut self, draft: E::Draft) -> E {
        let id = format!("{}-{}", E::PREFIX, Uuid::new_v4());
        let record = E::build(id, Utc::now(), draft);
        self.rows.push(record.clone());
        record
    }

    /// Insert a fully formed record as-is. Ids are not checked for clashes.
    pub fn insert(&mut self, record: E) {
        self.rows.push(record);
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn all(&self) -> &[E] {
        &self.rows
    }

    pub fn by_foreign_key(&self, key: ForeignKey, value: &str) -> Vec<E> {
        self.rows
            .iter()
            .filter(|row| row.foreign_key(key) == Some(value))
            .cloned()
            .collect()
    }

    /// Apply `patch` to the record with `id` and return the updated copy.
    pub fn update(&mut self, id: &str, patch: impl FnOnce(&mut E)) -> Option<E> {
        let row = self.rows.iter_mut().find(|row| row.id() == id)?;
        patch(row);
        Some(row.clone())
    }

    pub fn delete(&mut self, id: &str) -> bool {
        match self.rows.iter().position(|row| row.id() == id) {
            Some(index) => {
                self.rows.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Persistence collaborator for accounts and appointments.
///
/// Missing ids yield `None`/`false`; nothing here returns an error.
pub trait Repository {
    fn create_account(&mut self, draft: NewAccount) -> Account;
    fn account(&self, id: &str) -> Option<Account>;
    fn accounts(&self) -> Vec<Account>;
    fn update_account(&mut self, id: &str, patch: impl FnOnce(&mut Account)) -> Option<Account>;
    fn delete_account(&mut self, id: &str) -> bool;

    fn create_appointment(&mut self, draft: NewAppointment) -> Appointment;
    fn appointment(&self, id: &str) -> Option<Appointment>;
    fn appointments(&self) -> Vec<Appointment>;
    fn appointments_by(&self, key: ForeignKey, value: &str) -> Vec<Appointment>;
    fn update_appointment(
        &mut self,
        id: &str,
        patch: impl FnOnce(&mut Appointment),
    ) -> Option<Appointment>;
    fn delete_appointment(&mut self, id: &str) -> bool;

    fn accounts_of(&self, kind: RoleKind) -> Vec<Account> {
        self.accounts()
            .into_iter()
            .filter(|account| account.kind() == kind)
            .collect()
    }

    fn doctors(&self) -> Vec<Account> {
        self.accounts_of(RoleKind::Doctor)
    }

    /// The account with `id`, only if it is a doctor.
    fn doctor(&self, id: &str) -> Option<Account> {
        self.account(id).filter(|account| account.as_doctor().is_some())
    }
}

/// Composition root for all in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: Table<Account>,
    appointments: Table<Appointment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with the demo accounts and appointments.
    pub fn seeded() -> Self {
        let mut store = MemoryStore::new();
        for account in seed_accounts() {
            store.accounts.insert(account);
        }
        for appointment in seed_appointments() {
            store.appointments.insert(appointment);
        }
        tracing::debug!(
            accounts = store.accounts.len(),
            appointments = store.appointments.len(),
            "Seeded in-memory store"
        );
        store
    }
}

impl Repository for MemoryStore {
    fn create_account(&mut self, draft: NewAccount) -> Account {
        let account = self.accounts.create(draft);
        tracing::debug!(id = %account.id, role = %account.kind(), "Account created");
        account
    }

    fn account(&self, id: &str) -> Option<Account> {
        self.accounts.get(id).cloned()
    }

    fn accounts(&self) -> Vec<Account> {
        self.accounts.all().to_vec()
    }

    fn update_account(&mut self, id: &str, patch: impl FnOnce(&mut Account)) -> Option<Account> {
        self.accounts.update(id, patch)
    }

    fn delete_account(&mut self, id: &str) -> bool {
        let deleted = self.accounts.delete(id);
        if deleted {
            tracing::debug!(id, "Account deleted");
        }
        deleted
    }

    fn create_appointment(&mut self, draft: NewAppointment) -> Appointment {
        let appointment = self.appointments.create(draft);
        tracing::debug!(id = %appointment.id, "Appointment created");
        appointment
    }

    fn appointment(&self, id: &str) -> Option<Appointment> {
        self.appointments.get(id).cloned()
    }

    fn appointments(&self) -> Vec<Appointment> {
        self.appointments.all().to_vec()
    }

    fn appointments_by(&self, key: ForeignKey, value: &str) -> Vec<Appointment> {
        self.appointments.by_foreign_key(key, value)
    }

    fn update_appointment(
        &mut self,
        id: &str,
        patch: impl FnOnce(&mut Appointment),
    ) -> Option<Appointment> {
        self.appointments.update(id, patch)
    }

    fn delete_appointment(&mut self, id: &str) -> bool {
        let deleted = self.appointments.delete(id);
        if deleted {
            tracing::debug!(id, "Appointment deleted");
        }
        deleted
    }
}

fn seed_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn seed_account(
    id: &str,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> Account {
    Account {
        id: id.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        created_at: Utc::now(),
        role,
    }
}

fn seed_accounts() -> Vec<Account> {
    vec![
        seed_account(
            "admin1",
            "admin@example.com",
            "admin",
            "Admin",
            "User",
            Role::Admin(AdminProfile {
                access_level: AccessLevel::Full,
            }),
        ),
        seed_account(
            "patient1",
            "patient1@example.com",
            "password1",
            "Alice",
            "Smith",
            Role::Patient(PatientProfile {
                date_of_birth: seed_date(1990, 5, 15),
                blood_group: "A+".to_string(),
                phone_number: "123-456-7890".to_string(),
            }),
        ),
        seed_account(
            "patient2",
            "patient2@example.com",
            "password2",
            "Bob",
            "Johnson",
            Role::Patient(PatientProfile {
                date_of_birth: seed_date(1985, 12, 20),
                blood_group: "B-".to_string(),
                phone_number: "987-654-3210".to_string(),
            }),
        ),
        seed_account(
            "doctor1",
            "doctor1@example.com",
            "password3",
            "Charlie",
            "Williams",
            Role::Doctor(DoctorProfile {
                date_of_birth: seed_date(1978, 8, 3),
                phone_number: "555-123-4567".to_string(),
                license_number: "MD12345".to_string(),
                specialization: "Cardiology".to_string(),
                unavailability: Vec::new(),
            }),
        ),
        seed_account(
            "doctor2",
            "doctor2@example.com",
            "password4",
            "Diana",
            "Brown",
            Role::Doctor(DoctorProfile {
                date_of_birth: seed_date(1982, 2, 10),
                phone_number: "555-987-6543".to_string(),
                license_number: "MD67890".to_string(),
                specialization: "Dermatology".to_string(),
                unavailability: Vec::new(),
            }),
        ),
    ]
}

fn seed_appointments() -> Vec<Appointment> {
    let mut appointments = Vec::new();

    if let (Some(date), Some(slot)) = (seed_date(2024, 7, 10), TimeSlot::at_hour(10)) {
        appointments.push(Appointment {
            id: "appointment1".to_string(),
            patient_id: "patient1".to_string(),
            doctor_id: "doctor1".to_string(),
            patient_name: "Alice Smith".to_string(),
            doctor_name: "Charlie Williams".to_string(),
            specialization: "Cardiology".to_string(),
            date,
            time_slot: slot,
            status: AppointmentStatus::Confirmed,
            symptoms: "Chest pain and shortness of breath".to_string(),
            predicted_condition: Some("Angina".to_string()),
            diagnosis: Some("Possible angina".to_string()),
            prescription: Some("Rest and consult a cardiologist".to_string()),
            created_at: Utc::now(),
        });
    }

    if let (Some(date), Some(slot)) = (seed_date(2024, 7, 12), TimeSlot::at_hour(14)) {
        appointments.push(Appointment {
            id: "appointment2".to_string(),
            patient_id: "patient2".to_string(),
            doctor_id: "doctor2".to_string(),
            patient_name: "Bob Johnson".to_string(),
            doctor_name: "Diana Brown".to_string(),
            specialization: "Dermatology".to_string(),
            date,
            time_slot: slot,
            status: AppointmentStatus::Pending,
            symptoms: "Rash on arms and face".to_string(),
            predicted_condition: None,
            diagnosis: None,
            prescription: None,
            created_at: Utc::now(),
        });
    }

    appointments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_date;

    fn draft(patient: &str, doctor: &str, date: &str, slot: &str) -> NewAppointment {
        NewAppointment {
            patient_id: patient.to_string(),
            doctor_id: doctor.to_string(),
            patient_name: "Test Patient".to_string(),
            doctor_name: "Test Doctor".to_string(),
            specialization: "Cardiology".to_string(),
            date: parse_date(date).unwrap(),
            time_slot: TimeSlot::parse(slot).unwrap(),
            status: AppointmentStatus::Pending,
            symptoms: "chest pain".to_string(),
            predicted_condition: None,
        }
    }

    #[test]
    fn create_assigns_prefixed_id() {
        let mut store = MemoryStore::new();
        let appointment = store.create_appointment(draft("p", "d", "2024-07-01", "09:00 AM"));
        assert!(appointment.id.starts_with("appointment-"));
        assert_eq!(store.appointment(&appointment.id), Some(appointment));
    }

    #[test]
    fn foreign_key_listing_keeps_insertion_order() {
        let mut store = MemoryStore::new();
        let first = store.create_appointment(draft("p1", "d1", "2024-07-02", "11:00 AM"));
        store.create_appointment(draft("p2", "d1", "2024-07-01", "09:00 AM"));
        let third = store.create_appointment(draft("p1", "d2", "2024-07-01", "10:00 AM"));

        let for_patient: Vec<String> = store
            .appointments_by(ForeignKey::Patient, "p1")
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(for_patient, vec![first.id, third.id]);
        assert_eq!(store.appointments_by(ForeignKey::Doctor, "d1").len(), 2);
        assert!(store.appointments_by(ForeignKey::Doctor, "nobody").is_empty());
    }

    #[test]
    fn update_and_delete_missing_ids() {
        let mut store = MemoryStore::new();
        assert!(store
            .update_appointment("missing", |a| a.status = AppointmentStatus::Completed)
            .is_none());
        assert!(!store.delete_appointment("missing"));
        assert!(!store.delete_account("missing"));
    }

    #[test]
    fn update_returns_patched_copy() {
        let mut store = MemoryStore::seeded();
        let updated = store
            .update_appointment("appointment2", |a| a.status = AppointmentStatus::Confirmed)
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(
            store.appointment("appointment2").unwrap().status,
            AppointmentStatus::Confirmed
        );
    }

    #[test]
    fn deleting_doctor_leaves_appointments() {
        let mut store = MemoryStore::seeded();
        assert!(store.delete_account("doctor1"));
        assert!(store.doctor("doctor1").is_none());
        assert_eq!(store.appointments_by(ForeignKey::Doctor, "doctor1").len(), 1);
    }

    #[test]
    fn seeded_store_contents() {
        let store = MemoryStore::seeded();
        assert_eq!(store.accounts_of(RoleKind::Patient).len(), 2);
        assert_eq!(store.doctors().len(), 2);
        assert_eq!(store.accounts_of(RoleKind::Admin).len(), 1);
        assert_eq!(store.appointments().len(), 2);
        assert!(store.doctor("patient1").is_none());
    }
}
