//! Doctor availability and open time slots.
//!
//! A doctor is bookable on a date unless one of their unavailability ranges
//! covers it. Within a bookable day, every catalog slot not already taken by
//! one of the doctor's appointments on that date is open.

use crate::models::{Account, Appointment, AppointmentStatus, TimeSlot, UnavailabilityRange};
use crate::store::{ForeignKey, Repository};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// How existing appointments claim slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotPolicy {
    /// When false (the default), a cancelled appointment keeps its slot.
    pub cancelled_frees_slot: bool,
}

impl SlotPolicy {
    /// Check if `appointment` holds its slot under this policy.
    pub fn occupies(&self, appointment: &Appointment) -> bool {
        !(self.cancelled_frees_slot && appointment.status == AppointmentStatus::Cancelled)
    }
}

/// Check if any range covers `date`. Ranges may overlap.
pub fn is_blocked(ranges: &[UnavailabilityRange], date: NaiveDate) -> bool {
    ranges.iter().any(|range| range.covers(date))
}

/// Catalog slots left open on `date` given a doctor's appointments.
pub fn open_slots_among(
    appointments: &[Appointment],
    date: NaiveDate,
    policy: SlotPolicy,
) -> Vec<TimeSlot> {
    TimeSlot::CATALOG
        .iter()
        .copied()
        .filter(|slot| {
            !appointments.iter().any(|appointment| {
                appointment.date == date
                    && appointment.time_slot == *slot
                    && policy.occupies(appointment)
            })
        })
        .collect()
}

/// Check if a slot on `date` has already started at `now`.
pub fn is_slot_past(date: NaiveDate, slot: TimeSlot, now: NaiveDateTime) -> bool {
    now > slot.starts_on(date)
}

/// A confirmed appointment can be completed from its start until one hour after.
pub fn is_completable(appointment: &Appointment, now: NaiveDateTime) -> bool {
    if appointment.status != AppointmentStatus::Confirmed {
        return false;
    }
    let start = appointment.starts_at();
    let end = start + Duration::minutes(TimeSlot::DURATION_MINUTES);
    start <= now && now <= end
}

/// Availability queries over a [`Repository`].
///
/// Every query reads fresh from the repository; nothing is cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityFilter {
    policy: SlotPolicy,
}

impl AvailabilityFilter {
    pub fn new(policy: SlotPolicy) -> Self {
        AvailabilityFilter { policy }
    }

    pub fn policy(&self) -> SlotPolicy {
        self.policy
    }

    /// Check if the doctor can be booked on `date`.
    ///
    /// Unknown ids and non-doctor accounts are reported as unavailable.
    pub fn is_available<R: Repository>(&self, repo: &R, doctor_id: &str, date: NaiveDate) -> bool {
        repo.doctor(doctor_id)
            .as_ref()
            .and_then(Account::as_doctor)
            .map(|doctor| !is_blocked(&doctor.unavailability, date))
            .unwrap_or(false)
    }

    /// Doctors with exactly `specialization` who are not blocked on `date`.
    pub fn available_doctors<R: Repository>(
        &self,
        repo: &R,
        date: NaiveDate,
        specialization: &str,
    ) -> Vec<Account> {
        repo.doctors()
            .into_iter()
            .filter(|account| {
                account.as_doctor().map_or(false, |doctor| {
                    doctor.specialization == specialization
                        && !is_blocked(&doctor.unavailability, date)
                })
            })
            .collect()
    }

    /// Catalog slots still open for the doctor on `date`, in catalog order.
    ///
    /// Returns an empty list for an unknown doctor. The slot check and any
    /// later booking are separate steps; nothing reserves the slot.
    pub fn open_slots<R: Repository>(
        &self,
        repo: &R,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Vec<TimeSlot> {
        if repo.doctor(doctor_id).is_none() {
            return Vec::new();
        }
        let appointments = repo.appointments_by(ForeignKey::Doctor, doctor_id);
        open_slots_among(&appointments, date, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_date, NewAppointment};
    use crate::store::MemoryStore;

    fn date(value: &str) -> NaiveDate {
        parse_date(value).unwrap()
    }

    fn block(store: &mut MemoryStore, doctor_id: &str, start: &str, end: &str) {
        let range =
            UnavailabilityRange::new(date(start), date(end), "Conference".to_string()).unwrap();
        store
            .update_account(doctor_id, |account| {
                if let Some(doctor) = account.as_doctor_mut() {
                    doctor.unavailability.push(range);
                }
            })
            .unwrap();
    }

    fn book(store: &mut MemoryStore, doctor_id: &str, on: &str, slot: &str) -> Appointment {
        store.create_appointment(NewAppointment {
            patient_id: "patient1".to_string(),
            doctor_id: doctor_id.to_string(),
            patient_name: "Alice Smith".to_string(),
            doctor_name: "Charlie Williams".to_string(),
            specialization: "Cardiology".to_string(),
            date: date(on),
            time_slot: TimeSlot::parse(slot).unwrap(),
            status: AppointmentStatus::Pending,
            symptoms: "chest pain".to_string(),
            predicted_condition: None,
        })
    }

    #[test]
    fn unavailability_range_is_inclusive() {
        let mut store = MemoryStore::seeded();
        block(&mut store, "doctor1", "2024-07-01", "2024-07-05");
        let filter = AvailabilityFilter::default();

        assert!(!filter.is_available(&store, "doctor1", date("2024-07-03")));
        assert!(filter.is_available(&store, "doctor1", date("2024-07-06")));
        assert!(!filter.is_available(&store, "doctor1", date("2024-07-01")));
        assert!(!filter.is_available(&store, "doctor1", date("2024-07-05")));
        assert!(filter.is_available(&store, "doctor1", date("2024-06-30")));
    }

    #[test]
    fn unknown_or_non_doctor_is_unavailable() {
        let store = MemoryStore::seeded();
        let filter = AvailabilityFilter::default();
        assert!(!filter.is_available(&store, "nobody", date("2024-07-03")));
        assert!(!filter.is_available(&store, "patient1", date("2024-07-03")));
        assert!(filter.is_available(&store, "doctor2", date("2024-07-03")));
    }

    #[test]
    fn overlapping_ranges_are_allowed() {
        let mut store = MemoryStore::seeded();
        block(&mut store, "doctor1", "2024-07-01", "2024-07-05");
        block(&mut store, "doctor1", "2024-07-04", "2024-07-08");
        let filter = AvailabilityFilter::default();
        assert!(!filter.is_available(&store, "doctor1", date("2024-07-08")));
        assert!(filter.is_available(&store, "doctor1", date("2024-07-09")));
    }

    #[test]
    fn available_doctors_match_specialization_exactly() {
        let mut store = MemoryStore::seeded();
        let filter = AvailabilityFilter::default();
        let on = date("2024-07-03");

        let ids: Vec<String> = filter
            .available_doctors(&store, on, "Cardiology")
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["doctor1".to_string()]);
        assert!(filter.available_doctors(&store, on, "cardiology").is_empty());

        block(&mut store, "doctor1", "2024-07-03", "2024-07-03");
        assert!(filter.available_doctors(&store, on, "Cardiology").is_empty());
    }

    #[test]
    fn contracts_a_and_b_agree() {
        let mut store = MemoryStore::seeded();
        block(&mut store, "doctor1", "2024-07-01", "2024-07-05");
        let filter = AvailabilityFilter::default();

        for day in 1..=10 {
            let on = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap() + Duration::days(day);
            let listed = filter
                .available_doctors(&store, on, "Cardiology")
                .iter()
                .any(|d| d.id == "doctor1");
            assert_eq!(listed, filter.is_available(&store, "doctor1", on), "date {on}");
        }
    }

    #[test]
    fn open_slots_drop_booked_hour_in_catalog_order() {
        let mut store = MemoryStore::new();
        let doctor = store.create_account(crate::models::NewAccount {
            email: "doc@example.com".to_string(),
            password: "pw".to_string(),
            first_name: "Charlie".to_string(),
            last_name: "Williams".to_string(),
            role: crate::models::Role::Doctor(crate::models::DoctorProfile {
                date_of_birth: None,
                phone_number: String::new(),
                license_number: "MD1".to_string(),
                specialization: "Cardiology".to_string(),
                unavailability: Vec::new(),
            }),
        });
        book(&mut store, &doctor.id, "2024-07-10", "10:00 AM");
        book(&mut store, &doctor.id, "2024-07-11", "11:00 AM");

        let slots = AvailabilityFilter::default().open_slots(&store, &doctor.id, date("2024-07-10"));
        let expected: Vec<TimeSlot> = TimeSlot::CATALOG
            .iter()
            .copied()
            .filter(|slot| slot.label() != "10:00 AM")
            .collect();
        assert_eq!(slots, expected);
        assert_eq!(slots.len(), 7);
    }

    #[test]
    fn cancelled_appointment_holds_slot_by_default() {
        let mut store = MemoryStore::seeded();
        let booked = book(&mut store, "doctor1", "2024-07-15", "09:00 AM");
        store.update_appointment(&booked.id, |a| a.status = AppointmentStatus::Cancelled);

        let on = date("2024-07-15");
        let holding = AvailabilityFilter::default().open_slots(&store, "doctor1", on);
        assert!(!holding.contains(&TimeSlot::CATALOG[0]));

        let freeing = AvailabilityFilter::new(SlotPolicy {
            cancelled_frees_slot: true,
        })
        .open_slots(&store, "doctor1", on);
        assert_eq!(freeing, TimeSlot::CATALOG.to_vec());
    }

    #[test]
    fn fully_booked_day_is_empty_like_unknown_doctor() {
        let mut store = MemoryStore::seeded();
        for slot in TimeSlot::CATALOG {
            book(&mut store, "doctor1", "2024-07-20", &slot.label());
        }
        let filter = AvailabilityFilter::default();
        assert!(filter.open_slots(&store, "doctor1", date("2024-07-20")).is_empty());
        assert!(filter.open_slots(&store, "nobody", date("2024-07-20")).is_empty());
    }

    #[test]
    fn slot_past_and_completable_windows() {
        let mut store = MemoryStore::seeded();
        let appointment = store.appointment("appointment1").unwrap();
        let start = appointment.starts_at();

        assert!(is_completable(&appointment, start));
        assert!(is_completable(&appointment, start + Duration::minutes(60)));
        assert!(!is_completable(&appointment, start + Duration::minutes(61)));
        assert!(!is_completable(&appointment, start - Duration::minutes(1)));

        let pending = store
            .update_appointment("appointment1", |a| a.status = AppointmentStatus::Pending)
            .unwrap();
        assert!(!is_completable(&pending, start));

        assert!(is_slot_past(appointment.date, appointment.time_slot, start + Duration::seconds(1)));
        assert!(!is_slot_past(appointment.date, appointment.time_slot, start));
    }
}
