//! Command-line interface for the HealEasy booking engine.
//!
//! This binary provides an interactive menu for logging in as a patient,
//! doctor or admin, booking appointments from symptoms, and managing
//! appointments and doctor availability.

use chrono::{Local, NaiveDate};
use healeasy::booking::Step;
use healeasy::clinic::ProfileUpdate;
use healeasy::config::{self, AppConfig};
use healeasy::models::{
    parse_date, Account, Appointment, AppointmentStatus, NewAccount, PatientProfile, Role,
    RoleKind, TimeSlot, UnavailabilityRange,
};
use healeasy::store::{MemoryStore, Repository};
use healeasy::{availability, predictor, Clinic, Result};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

struct HealEasyCli {
    clinic: Clinic<MemoryStore>,
    session: Option<Account>,
    running: bool,
}

impl HealEasyCli {
    fn new(config: AppConfig) -> Self {
        HealEasyCli {
            clinic: Clinic::new(MemoryStore::seeded(), config),
            session: None,
            running: true,
        }
    }

    fn print_header(&self) {
        println!("\n{}", "=".repeat(60));
        println!("       {} HOSPITAL APPOINTMENTS v{}", config::APP_NAME.to_uppercase(), config::APP_VERSION);
        println!("{}", "=".repeat(60));
    }

    fn print_menu(&self) {
        match &self.session {
            Some(account) => println!("\n--- Main Menu ({}, {}) ---", account.full_name(), account.kind()),
            None => println!("\n--- Main Menu (not logged in) ---"),
        }
        println!("1. Log in");
        println!("2. Register as patient");
        println!("3. Check symptoms");
        println!("4. Book appointment");
        println!("5. View my appointments");
        println!("6. Manage unavailability");
        println!("7. Update appointment status");
        println!("8. Admin overview");
        println!("9. Update profile");
        println!("10. Run demo");
        println!("0. Exit");
        println!("{}", "-".repeat(20));
    }

    fn get_input(&self, prompt: &str, default: Option<&str>) -> io::Result<String> {
        if let Some(def) = default {
            print!("{} [{}]: ", prompt, def);
        } else {
            print!("{}: ", prompt);
        }
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        let input = input.trim();

        if input.is_empty() {
            Ok(default.unwrap_or("").to_string())
        } else {
            Ok(input.to_string())
        }
    }

    fn get_int_input(&self, prompt: &str, default: Option<i32>) -> io::Result<i32> {
        loop {
            let default_str = default.map(|d| d.to_string());
            let input = self.get_input(prompt, default_str.as_deref())?;

            if let Ok(value) = input.parse::<i32>() {
                return Ok(value);
            }
            println!("Please enter a valid number");
        }
    }

    fn get_date_input(&self, prompt: &str, default: Option<&str>) -> Result<NaiveDate> {
        let input = self.get_input(prompt, default)?;
        Ok(parse_date(&input)?)
    }

    /// The logged-in account, if it has the given role.
    fn session_as(&self, role: RoleKind) -> Option<Account> {
        match &self.session {
            Some(account) if account.kind() == role => Some(account.clone()),
            _ => {
                println!("\nPlease log in as {} first (option 1)", role);
                None
            }
        }
    }

    fn print_appointment(&self, appointment: &Appointment) {
        println!(
            "  {} {} - {} with Dr. {} ({}) [{}]",
            appointment.date.format("%Y-%m-%d"),
            appointment.time_slot,
            appointment.patient_name,
            appointment.doctor_name,
            appointment.specialization,
            appointment.status
        );
        println!("    ID: {}", appointment.id);
    }

    fn login(&mut self) -> Result<()> {
        println!("\n--- Log In ---");
        let role = self.get_input("Role (patient/doctor/admin)", Some("patient"))?;
        let role = RoleKind::from_string(&role)?;
        let email = self.get_input("Email", None)?;
        let password = self.get_input("Password", None)?;

        match self.clinic.login(&email, &password, role) {
            Some(account) => {
                println!("\nWelcome, {}", account.full_name());
                self.session = Some(account);
            }
            None => println!("\nInvalid credentials"),
        }
        Ok(())
    }

    fn register(&mut self) -> Result<()> {
        println!("\n--- Register Patient ---");
        let first_name = self.get_input("First name", None)?;
        let last_name = self.get_input("Last name", None)?;
        let email = self.get_input("Email", None)?;
        let password = self.get_input("Password", None)?;
        let date_of_birth = self.get_date_input("Date of birth (YYYY-MM-DD)", None)?;
        let blood_group = self.get_input("Blood group", Some("A+"))?;
        let phone_number = self.get_input("Phone number", None)?;

        let account = self.clinic.register(NewAccount {
            email,
            password,
            first_name,
            last_name,
            role: Role::Patient(PatientProfile {
                date_of_birth: Some(date_of_birth),
                blood_group,
                phone_number,
            }),
        })?;
        println!("\nRegistration successful. Your account ID is {}", account.id);
        Ok(())
    }

    fn check_symptoms(&self) -> Result<()> {
        println!("\n--- Check Symptoms ---");
        let symptoms = self.get_input("Describe your symptoms", None)?;
        let predictions = predictor::predict(&symptoms);

        println!("\nPossible conditions (most likely first):");
        for prediction in &predictions {
            println!("  - {} ({})", prediction.condition, prediction.specialization);
        }
        println!("\nAll specializations: {}", predictor::all_specializations().join(", "));
        Ok(())
    }

    fn book_appointment(&mut self) -> Result<()> {
        let Some(patient) = self.session_as(RoleKind::Patient) else {
            return Ok(());
        };

        println!("\n--- Book Appointment ---");
        println!("Enter 'b' at any step to go back, 'q' to quit.");
        let mut wizard = self.clinic.start_booking(&patient.id);

        loop {
            println!("\n[Step {} of 5] {}", wizard.step() as u8, wizard.step());
            match wizard.step() {
                Step::Symptoms => {
                    let input = self.get_input(
                        "Describe your symptoms",
                        Some(wizard.symptoms()).filter(|s| !s.is_empty()),
                    )?;
                    if input.is_empty() || input == "q" {
                        return Ok(());
                    }
                    wizard.set_symptoms(input)?;
                }
                Step::ChooseDate => {
                    if let Some(suggestion) = wizard.suggestion() {
                        println!(
                            "We suggest you see a {} (potential condition: {})",
                            suggestion.specialization, suggestion.condition
                        );
                    }
                    let default = wizard
                        .date()
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
                    let input = self.get_input("Date (YYYY-MM-DD)", Some(&default))?;
                    match input.as_str() {
                        "q" => return Ok(()),
                        "b" => {
                            wizard.back();
                            continue;
                        }
                        _ => match parse_date(&input) {
                            Ok(date) => wizard.select_date(self.clinic.repo(), date)?,
                            Err(e) => {
                                println!("{}", e);
                                continue;
                            }
                        },
                    }
                }
                Step::ChooseDoctor => {
                    if wizard.doctors().is_empty() {
                        println!("No doctors available on this date. Please choose another date.");
                        wizard.back();
                        continue;
                    }
                    for (i, doctor) in wizard.doctors().iter().enumerate() {
                        println!("  {}. Dr. {}", i + 1, doctor.full_name());
                    }
                    let input = self.get_input("Select doctor", Some("1"))?;
                    match input.as_str() {
                        "q" => return Ok(()),
                        "b" => {
                            wizard.back();
                            continue;
                        }
                        _ => {
                            let chosen = input
                                .parse::<usize>()
                                .ok()
                                .and_then(|n| n.checked_sub(1))
                                .and_then(|i| wizard.doctors().get(i))
                                .map(|doctor| doctor.id.clone());
                            match chosen {
                                Some(id) => wizard.select_doctor(self.clinic.repo(), &id)?,
                                None => {
                                    println!("Invalid choice");
                                    continue;
                                }
                            }
                        }
                    }
                }
                Step::ChooseTime => {
                    if wizard.open_slots().is_empty() {
                        println!("No open slots for this doctor. Please choose another doctor.");
                        wizard.back();
                        continue;
                    }
                    let labels: Vec<String> =
                        wizard.open_slots().iter().map(TimeSlot::label).collect();
                    println!("Open slots: {}", labels.join(", "));
                    let input = self.get_input("Time slot", labels.first().map(String::as_str))?;
                    match input.as_str() {
                        "q" => return Ok(()),
                        "b" => {
                            wizard.back();
                            continue;
                        }
                        _ => match TimeSlot::parse(&input) {
                            Ok(slot) => {
                                if let Err(e) = wizard.select_slot(slot) {
                                    println!("{}", e);
                                    continue;
                                }
                            }
                            Err(e) => {
                                println!("{}", e);
                                continue;
                            }
                        },
                    }
                }
                Step::Confirmation => {
                    if let (Some(doctor), Some(date), Some(slot)) =
                        (wizard.doctor(), wizard.date(), wizard.slot())
                    {
                        println!("  Doctor: Dr. {}", doctor.full_name());
                        println!("  Date:   {}", date.format("%A, %Y-%m-%d"));
                        println!("  Time:   {}", slot);
                    }
                    let input = self.get_input("Confirm booking? (y/n/b)", Some("y"))?;
                    match input.to_lowercase().as_str() {
                        "y" => {
                            let appointment = wizard.confirm(self.clinic.repo_mut())?;
                            println!("\nAppointment booked (status: {})", appointment.status);
                            println!("  ID: {}", appointment.id);
                            return Ok(());
                        }
                        "b" => {
                            wizard.back();
                        }
                        _ => return Ok(()),
                    }
                    continue;
                }
            }

            if let Err(e) = wizard.advance(self.clinic.repo()) {
                println!("{}", e);
            }
        }
    }

    fn view_appointments(&self) -> Result<()> {
        let Some(account) = self.session.clone() else {
            println!("\nPlease log in first (option 1)");
            return Ok(());
        };

        match account.kind() {
            RoleKind::Patient => {
                let upcoming = self.clinic.patient_upcoming(&account.id);
                println!("\n--- Upcoming Appointments ({}) ---", upcoming.len());
                upcoming.iter().for_each(|a| self.print_appointment(a));

                let past = self.clinic.patient_past(&account.id);
                println!("\n--- Past Appointments ({}) ---", past.len());
                past.iter().for_each(|a| self.print_appointment(a));
            }
            RoleKind::Doctor => {
                let appointments = self.clinic.doctor_appointments(&account.id);
                println!("\n--- Your Appointments ({}) ---", appointments.len());
                let now = Local::now().naive_local();
                for appointment in &appointments {
                    self.print_appointment(appointment);
                    if availability::is_completable(appointment, now) {
                        println!("    (in progress - can be marked completed)");
                    }
                }
            }
            RoleKind::Admin => {
                println!("\nAdmins see all appointments in the overview (option 8)");
            }
        }
        Ok(())
    }

    fn manage_unavailability(&mut self) -> Result<()> {
        let Some(doctor) = self.session_as(RoleKind::Doctor) else {
            return Ok(());
        };

        println!("\n--- Manage Unavailability ---");
        if let Some(account) = self.clinic.repo().doctor(&doctor.id) {
            if let Some(profile) = account.as_doctor() {
                for range in &profile.unavailability {
                    println!("  {} to {}: {}", range.start_date, range.end_date, range.reason);
                }
            }
        }

        println!("\n1. Add period");
        println!("2. Remove period");
        let choice = self.get_int_input("Select option (0 to go back)", Some(0))?;
        match choice {
            1 => {
                let start = self.get_date_input("Start date (YYYY-MM-DD)", None)?;
                let end = self.get_date_input("End date (YYYY-MM-DD)", None)?;
                let reason = self.get_input("Reason", None)?;
                let range = UnavailabilityRange::new(start, end, reason)?;
                if self.clinic.add_unavailability(&doctor.id, range)?.is_some() {
                    println!("\nUnavailability period added");
                }
            }
            2 => {
                let start = self.get_date_input("Start date (YYYY-MM-DD)", None)?;
                let end = self.get_date_input("End date (YYYY-MM-DD)", None)?;
                if self.clinic.remove_unavailability(&doctor.id, start, end).is_some() {
                    println!("\nUnavailability period removed");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn update_status(&mut self) -> Result<()> {
        let allowed = matches!(
            self.session.as_ref().map(Account::kind),
            Some(RoleKind::Doctor) | Some(RoleKind::Admin)
        );
        if !allowed {
            println!("\nPlease log in as doctor or admin first (option 1)");
            return Ok(());
        }

        println!("\n--- Update Appointment Status ---");
        let id = self.get_input("Appointment ID", None)?;
        let status = self.get_input("New status (pending/confirmed/completed/cancelled)", None)?;
        let status = AppointmentStatus::from_string(&status)?;
        let diagnosis = self.get_input("Diagnosis (optional)", None)?;
        let prescription = self.get_input("Prescription (optional)", None)?;

        match self
            .clinic
            .set_status(&id, status, Some(diagnosis), Some(prescription))
        {
            Some(appointment) => println!("\nAppointment status changed to {}", appointment.status),
            None => println!("\nAppointment not found"),
        }
        Ok(())
    }

    fn admin_overview(&mut self) -> Result<()> {
        if self.session_as(RoleKind::Admin).is_none() {
            return Ok(());
        }

        let stats = self.clinic.stats();
        println!("\n--- Overview ---");
        println!("{}", serde_json::to_string_pretty(&stats)?);

        println!("\nRecent appointments:");
        for appointment in self.clinic.recent_appointments(5) {
            self.print_appointment(&appointment);
        }

        let tab = self.get_input("Search (patients/doctors/admins/appointments)", Some("appointments"))?;
        let term = self.get_input("Search term", Some(""))?;
        let page = self.get_int_input("Page", Some(1))?.max(1) as usize;

        if tab == "appointments" {
            let status = self.get_input("Status filter (all/pending/confirmed/completed/cancelled)", Some("all"))?;
            let status = match status.as_str() {
                "all" => None,
                other => Some(AppointmentStatus::from_string(other)?),
            };
            let results = self.clinic.search_appointments(&term, status);
            let page = self.clinic.page(&results, page);
            println!("\nPage {} of {} ({} matches)", page.page, page.total_pages, page.total_items);
            page.items.iter().for_each(|a| self.print_appointment(a));
        } else {
            let role = RoleKind::from_string(tab.trim_end_matches('s'))?;
            let results = self.clinic.search_accounts(role, &term);
            let page = self.clinic.page(&results, page);
            println!("\nPage {} of {} ({} matches)", page.page, page.total_pages, page.total_items);
            for account in &page.items {
                println!("  {} <{}> [{}]", account.full_name(), account.email, account.id);
            }

            let delete = self.get_input("Delete account ID (blank to skip)", Some(""))?;
            if !delete.is_empty() {
                if self.clinic.delete_account(&delete) {
                    println!("\nAccount deleted");
                } else {
                    println!("\nAccount not found");
                }
            }
        }
        Ok(())
    }

    fn update_profile(&mut self) -> Result<()> {
        let Some(account) = self.session.clone() else {
            println!("\nPlease log in first (option 1)");
            return Ok(());
        };

        println!("\n--- Update Profile (blank keeps current value) ---");
        let update = ProfileUpdate {
            first_name: Some(self.get_input("First name", Some(&account.first_name))?),
            last_name: Some(self.get_input("Last name", Some(&account.last_name))?),
            phone_number: Some(self.get_input("Phone number", account.phone_number())?),
            new_password: Some(self.get_input("New password", Some(""))?),
            confirm_password: Some(self.get_input("Confirm password", Some(""))?),
            ..ProfileUpdate::default()
        };

        if let Some(updated) = self.clinic.update_profile(&account.id, update)? {
            println!("\nProfile updated for {}", updated.full_name());
            self.session = Some(updated);
        }
        Ok(())
    }

    fn run_demo(&mut self) -> Result<()> {
        println!("\n--- Running Demo ---");

        let mut clinic = Clinic::new(MemoryStore::seeded(), *self.clinic.config());
        let symptoms = "Sharp chest pain and a mild headache";
        println!("Patient Alice Smith reports: \"{}\"", symptoms);

        let date = parse_date("2024-07-10")?;
        let mut wizard = clinic.start_booking("patient1");
        wizard.set_symptoms(symptoms)?;
        wizard.advance(clinic.repo())?;
        if let Some(suggestion) = wizard.suggestion() {
            println!(
                "Suggested: {} -> {}",
                suggestion.condition, suggestion.specialization
            );
        }

        wizard.select_date(clinic.repo(), date)?;
        wizard.advance(clinic.repo())?;
        let doctor_id = match wizard.doctors().first() {
            Some(doctor) => doctor.id.clone(),
            None => {
                println!("No doctors available on {}", date);
                return Ok(());
            }
        };
        wizard.select_doctor(clinic.repo(), &doctor_id)?;
        wizard.advance(clinic.repo())?;

        let labels: Vec<String> = wizard.open_slots().iter().map(TimeSlot::label).collect();
        println!("Open slots on {}: {}", date, labels.join(", "));
        println!("(10:00 AM is already taken by an existing appointment)");

        if let Some(slot) = wizard.open_slots().first().copied() {
            wizard.select_slot(slot)?;
        }
        wizard.advance(clinic.repo())?;
        let appointment = wizard.confirm(clinic.repo_mut())?;

        println!("\nBooked appointment:");
        println!("{}", serde_json::to_string_pretty(&appointment)?);

        clinic.set_status(&appointment.id, AppointmentStatus::Confirmed, None, None);
        println!("\nDoctor confirmed it. Stats now:");
        println!("{}", serde_json::to_string_pretty(&clinic.stats())?);
        Ok(())
    }

    fn run(&mut self) {
        self.print_header();

        while self.running {
            self.print_menu();

            let choice = match self.get_int_input("Enter choice", Some(10)) {
                Ok(choice) => choice,
                Err(e) => {
                    tracing::error!("Failed to read input: {e}");
                    break;
                }
            };

            let result = match choice {
                1 => self.login(),
                2 => self.register(),
                3 => self.check_symptoms(),
                4 => self.book_appointment(),
                5 => self.view_appointments(),
                6 => self.manage_unavailability(),
                7 => self.update_status(),
                8 => self.admin_overview(),
                9 => self.update_profile(),
                10 => self.run_demo(),
                0 => {
                    self.running = false;
                    println!("\nGoodbye!");
                    Ok(())
                }
                _ => {
                    println!("Invalid choice");
                    Ok(())
                }
            };

            if let Err(e) = result {
                println!("\nError: {}", e);
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        version = config::APP_VERSION,
        cancelled_frees_slot = config.slot_policy.cancelled_frees_slot,
        "{} starting",
        config::APP_NAME
    );

    let mut cli = HealEasyCli::new(config);
    cli.run();
}
