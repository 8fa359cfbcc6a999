//! Complication forecasting per body system.

use triage_core::{ClinicalFindings, ComplicationPrediction, PatientRecord, RiskLevel};

use crate::catalog::{ComplicationProfile, RuleCatalog};
use crate::round3;

const FACTOR_WEIGHT: f64 = 1.0;
const INDICATOR_WEIGHT: f64 = 0.5;

pub const HIGH_RISK_THRESHOLD: f64 = 0.6;
pub const MODERATE_RISK_THRESHOLD: f64 = 0.3;

/// Scores every catalog complication and keeps those at or above `min_score`,
/// highest risk first.
pub fn forecast_complications(
    record: &PatientRecord,
    symptom_text: &str,
    findings: &ClinicalFindings,
    catalog: &RuleCatalog,
    min_score: f64,
) -> Vec<ComplicationPrediction> {
    let mut predictions: Vec<ComplicationPrediction> = catalog
        .complications
        .iter()
        .filter_map(|(key, profile)| predict(key, profile, record, symptom_text, findings))
        .filter(|prediction| prediction.risk_score >= min_score)
        .collect();

    predictions.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| a.complication.cmp(&b.complication))
            .then_with(|| a.key.cmp(&b.key))
    });
    predictions
}

fn predict(
    key: &str,
    profile: &ComplicationProfile,
    record: &PatientRecord,
    symptom_text: &str,
    findings: &ClinicalFindings,
) -> Option<ComplicationPrediction> {
    let risk_factors_present: Vec<String> = profile
        .risk_factors
        .iter()
        .filter(|factor| factor.is_present(symptom_text, &record.medical_history, record.age))
        .map(|factor| factor.label.clone())
        .collect();
    let indicators_present: Vec<_> = profile
        .indicators
        .iter()
        .copied()
        .filter(|indicator| findings.contains(*indicator))
        .collect();

    let raw = risk_factors_present.len() as f64 * FACTOR_WEIGHT
        + indicators_present.len() as f64 * INDICATOR_WEIGHT;
    let max = profile.risk_factors.len() as f64 * FACTOR_WEIGHT
        + profile.indicators.len() as f64 * INDICATOR_WEIGHT;
    if raw <= 0.0 || max <= 0.0 {
        return None;
    }

    let risk_score = round3(raw / max);
    let level = risk_level(risk_score);
    let monitoring_recommendations = match level {
        RiskLevel::High => &profile.monitoring.high,
        RiskLevel::Moderate => &profile.monitoring.moderate,
        RiskLevel::Low => &profile.monitoring.low,
    }
    .clone();

    Some(ComplicationPrediction {
        complication: profile.name.clone(),
        key: key.to_string(),
        system: profile.system,
        risk_score,
        risk_level: level,
        risk_factors_present,
        indicators_present,
        prevention_strategies: profile.prevention_strategies.clone(),
        monitoring_recommendations,
    })
}

pub fn risk_level(score: f64) -> RiskLevel {
    if score >= HIGH_RISK_THRESHOLD {
        RiskLevel::High
    } else if score >= MODERATE_RISK_THRESHOLD {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{BodySystem, Finding, Symptoms};

    fn forecast(
        record: &PatientRecord,
        findings: &ClinicalFindings,
        min_score: f64,
    ) -> Vec<ComplicationPrediction> {
        let catalog = RuleCatalog::standard().unwrap();
        forecast_complications(
            record,
            &record.symptoms.normalized_text(),
            findings,
            &catalog,
            min_score,
        )
    }

    #[test]
    fn cardiac_history_without_symptoms_is_high_risk() {
        let record = PatientRecord {
            symptoms: Symptoms::Text("mild headache".into()),
            age: Some(70),
            medical_history: vec!["hypertension".into(), "diabetes".into(), "smoker".into()],
            ..PatientRecord::default()
        };
        let predictions = forecast(&record, &ClinicalFindings::default(), 0.1);
        let cardiac = predictions
            .iter()
            .find(|p| p.system == BodySystem::Cardiac)
            .unwrap();

        assert_eq!(cardiac.risk_factors_present.len(), 4);
        assert_eq!(cardiac.risk_score, 0.615);
        assert_eq!(cardiac.risk_level, RiskLevel::High);
        assert_eq!(cardiac.monitoring_recommendations, "Continuous cardiac monitoring required");
        for pair in predictions.windows(2) {
            assert!(pair[0].risk_score >= pair[1].risk_score);
        }
    }

    #[test]
    fn indicators_count_half() {
        let record = PatientRecord {
            age: Some(40),
            ..PatientRecord::default()
        };
        let findings: ClinicalFindings = [Finding::AlteredMentalStatus].into_iter().collect();
        let predictions = forecast(&record, &findings, 0.0);
        let neuro = predictions
            .iter()
            .find(|p| p.key == "neurological_complications")
            .unwrap();
        // 0.5 out of 5 factors + 2 indicators.
        assert_eq!(neuro.risk_score, 0.083);
        assert_eq!(neuro.risk_level, RiskLevel::Low);
    }

    #[test]
    fn scores_below_minimum_are_dropped() {
        let record = PatientRecord {
            age: Some(40),
            ..PatientRecord::default()
        };
        let findings: ClinicalFindings = [Finding::AlteredMentalStatus].into_iter().collect();
        let predictions = forecast(&record, &findings, 0.1);
        assert!(predictions
            .iter()
            .all(|p| p.key != "neurological_complications"));
    }

    #[test]
    fn nothing_present_yields_nothing() {
        let record = PatientRecord {
            age: Some(40),
            ..PatientRecord::default()
        };
        assert!(forecast(&record, &ClinicalFindings::default(), 0.0).is_empty());
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(risk_level(0.6), RiskLevel::High);
        assert_eq!(risk_level(0.59), RiskLevel::Moderate);
        assert_eq!(risk_level(0.3), RiskLevel::Moderate);
        assert_eq!(risk_level(0.29), RiskLevel::Low);
    }
}
