//! Symptom-driven specialization matching.
//!
//! A fixed keyword table maps lowercase symptom phrases to the conditions
//! they commonly indicate and the specialization that treats each one.
//! Matching is plain substring search in table order; there is no scoring.

use crate::models::{Account, Prediction};
use std::collections::BTreeSet;

const fn p(condition: &'static str, specialization: &'static str) -> Prediction {
    Prediction {
        condition,
        specialization,
    }
}

/// Returned when no keyword matches.
pub const GENERAL_CHECK_UP: Prediction = p("General Check-up", "General Medicine");

/// Symptom phrase to predictions, in matching order.
pub static SYMPTOM_TABLE: &[(&str, [Prediction; 3])] = &[
    (
        "headache",
        [
            p("Migraine", "Neurology"),
            p("Tension Headache", "Neurology"),
            p("Sinusitis", "ENT Specialist"),
        ],
    ),
    (
        "fever",
        [
            p("Viral Infection", "Internal Medicine"),
            p("Bacterial Infection", "Infectious Disease"),
            p("Malaria", "Infectious Disease"),
        ],
    ),
    (
        "cough",
        [
            p("Common Cold", "General Medicine"),
            p("Bronchitis", "Pulmonology"),
            p("Asthma", "Pulmonology"),
        ],
    ),
    (
        "joint pain",
        [
            p("Arthritis", "Rheumatology"),
            p("Osteoporosis", "Orthopedic"),
            p("Gout", "Rheumatology"),
        ],
    ),
    (
        "chest pain",
        [
            p("Angina", "Cardiology"),
            p("Heart Disease", "Cardiology"),
            p("Muscle Strain", "Physical Medicine"),
        ],
    ),
    (
        "stomach pain",
        [
            p("Gastritis", "Gastroenterology"),
            p("Ulcer", "Gastroenterology"),
            p("Appendicitis", "General Surgery"),
        ],
    ),
    (
        "skin rash",
        [
            p("Eczema", "Dermatology"),
            p("Psoriasis", "Dermatology"),
            p("Allergic Reaction", "Allergist"),
        ],
    ),
    (
        "eye problem",
        [
            p("Glaucoma", "Ophthalmology"),
            p("Cataract", "Ophthalmology"),
            p("Conjunctivitis", "Ophthalmology"),
        ],
    ),
    (
        "mental health",
        [
            p("Depression", "Psychiatry"),
            p("Anxiety", "Psychiatry"),
            p("Stress", "Psychology"),
        ],
    ),
    (
        "diabetes",
        [
            p("Type 1 Diabetes", "Endocrinology"),
            p("Type 2 Diabetes", "Endocrinology"),
            p("Gestational Diabetes", "Endocrinology"),
        ],
    ),
    (
        "ear pain",
        [
            p("Ear Infection", "ENT Specialist"),
            p("Tinnitus", "ENT Specialist"),
            p("Hearing Loss", "Audiologist"),
        ],
    ),
    (
        "back pain",
        [
            p("Herniated Disc", "Orthopedic"),
            p("Muscle Sprain", "Physical Medicine"),
            p("Sciatica", "Neurology"),
        ],
    ),
    (
        "pregnancy",
        [
            p("Regular Checkup", "Obstetrics & Gynecology"),
            p("High Risk Pregnancy", "Obstetrics & Gynecology"),
            p("Gestational Issues", "Obstetrics & Gynecology"),
        ],
    ),
];

/// Predict likely conditions for free-text symptoms.
///
/// Every phrase contained in the lowercased input contributes all of its
/// predictions, concatenated in table order. The result is never empty:
/// input matching nothing yields [`GENERAL_CHECK_UP`].
pub fn predict(symptoms: &str) -> Vec<Prediction> {
    let lowered = symptoms.to_lowercase();

    let predictions: Vec<Prediction> = SYMPTOM_TABLE
        .iter()
        .filter(|(phrase, _)| lowered.contains(phrase))
        .flat_map(|(_, predictions)| predictions.iter().copied())
        .collect();

    if predictions.is_empty() {
        vec![GENERAL_CHECK_UP]
    } else {
        predictions
    }
}

/// The first prediction for the input, used to pick a specialization.
pub fn most_likely(symptoms: &str) -> Prediction {
    predict(symptoms)
        .into_iter()
        .next()
        .unwrap_or(GENERAL_CHECK_UP)
}

/// Every specialization in the table, deduplicated and sorted.
pub fn all_specializations() -> Vec<&'static str> {
    SYMPTOM_TABLE
        .iter()
        .flat_map(|(_, predictions)| predictions.iter().map(|p| p.specialization))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Specializations of registered doctors, first occurrence order.
pub fn specializations_in_use<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Vec<String> {
    let mut seen = Vec::new();
    for doctor in accounts.into_iter().filter_map(Account::as_doctor) {
        if !seen.contains(&doctor.specialization) {
            seen.push(doctor.specialization.clone());
        }
    }
    seen
}
