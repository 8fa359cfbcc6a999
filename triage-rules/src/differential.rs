//! Ranks candidate conditions by symptom and vital-finding overlap.

use std::cmp::Ordering;

use triage_core::{ClinicalFindings, DifferentialEntry, PatientRecord};

use crate::catalog::{ConditionProfile, RuleCatalog};
use crate::round3;

const REQUIRED_SYMPTOM_WEIGHT: f64 = 2.0;
const OPTIONAL_SYMPTOM_WEIGHT: f64 = 1.0;
const VITAL_INDICATOR_WEIGHT: f64 = 1.0;

/// Conditions with no symptom overlap, or outside their age window, are excluded.
/// At most `limit` entries are returned.
pub fn rank_differentials(
    record: &PatientRecord,
    symptom_text: &str,
    findings: &ClinicalFindings,
    catalog: &RuleCatalog,
    limit: usize,
) -> Vec<DifferentialEntry> {
    let mut entries: Vec<DifferentialEntry> = catalog
        .conditions
        .iter()
        .filter(|(_, profile)| {
            record
                .age
                .map_or(true, |age| profile.age_range.contains(age))
        })
        .filter_map(|(key, profile)| score_condition(key, profile, record, symptom_text, findings))
        .collect();

    entries.sort_by(compare_entries);
    entries.truncate(limit);
    entries
}

fn score_condition(
    key: &str,
    profile: &ConditionProfile,
    record: &PatientRecord,
    symptom_text: &str,
    findings: &ClinicalFindings,
) -> Option<DifferentialEntry> {
    let matches = |phrases: &[String]| -> Vec<String> {
        phrases
            .iter()
            .filter(|phrase| symptom_text.contains(&phrase.to_lowercase()))
            .cloned()
            .collect()
    };
    let required = matches(profile.required_symptoms.as_slice());
    let optional = matches(profile.optional_symptoms.as_slice());
    if required.is_empty() && optional.is_empty() {
        return None;
    }

    let matched_vitals: Vec<_> = profile
        .vital_indicators
        .iter()
        .copied()
        .filter(|finding| findings.contains(*finding))
        .collect();

    let match_score = required.len() as f64 * REQUIRED_SYMPTOM_WEIGHT
        + optional.len() as f64 * OPTIONAL_SYMPTOM_WEIGHT
        + matched_vitals.len() as f64 * VITAL_INDICATOR_WEIGHT;
    let max_score = profile.required_symptoms.len() as f64 * REQUIRED_SYMPTOM_WEIGHT
        + profile.optional_symptoms.len() as f64 * OPTIONAL_SYMPTOM_WEIGHT
        + profile.vital_indicators.len() as f64 * VITAL_INDICATOR_WEIGHT;

    let multiplier: f64 = profile
        .modifiers
        .iter()
        .filter(|modifier| {
            modifier.applies(record.age, record.gender, &record.medical_history)
        })
        .map(|modifier| modifier.multiplier)
        .product();

    let mut matched_symptoms = required;
    matched_symptoms.extend(optional);

    Some(DifferentialEntry {
        condition: profile.name.clone(),
        key: key.to_string(),
        code: profile.code.clone(),
        matched_symptoms,
        matched_vitals,
        match_score,
        confidence_score: round3(match_score / max_score),
        adjusted_score: round3(match_score * profile.prevalence * multiplier),
        severity: profile.severity,
        prevalence: profile.prevalence,
        recommendations: profile.recommendations.clone(),
    })
}

/// Match score first, then the demographic-adjusted score, prevalence and name.
fn compare_entries(a: &DifferentialEntry, b: &DifferentialEntry) -> Ordering {
    b.match_score
        .total_cmp(&a.match_score)
        .then_with(|| b.adjusted_score.total_cmp(&a.adjusted_score))
        .then_with(|| b.prevalence.total_cmp(&a.prevalence))
        .then_with(|| a.condition.cmp(&b.condition))
        .then_with(|| a.key.cmp(&b.key))
}
