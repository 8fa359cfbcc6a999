//! Composite risk score: age, vital abnormalities, symptoms and chronic history,
//! each capped and normalized by the configured weight total.

use triage_core::{
    PatientRecord, RiskAssessment, RiskCategory, RiskContributions, RiskFactor, RiskFactors,
    SymptomProfile, TriageConfig, VitalAssessment,
};

use crate::catalog::{history_mentions, RuleCatalog};
use crate::round3;

const PEDIATRIC_AGE_LIMIT: u32 = 5;
const GERIATRIC_AGE_LIMIT: u32 = 65;

pub fn score_risk(
    record: &PatientRecord,
    assessments: &[VitalAssessment],
    profile: &SymptomProfile,
    catalog: &RuleCatalog,
    config: &TriageConfig,
) -> RiskAssessment {
    if has_insufficient_data(record, assessments) {
        return RiskAssessment {
            risk_score: 0.0,
            risk_category: RiskCategory::Low,
            factors: RiskFactors::default(),
            contributions: RiskContributions::default(),
            explanation: "Insufficient data: no vital signs, symptoms or age were provided."
                .to_string(),
            insufficient_data: true,
        };
    }

    let weights = &config.risk_weights;
    let mut factors = RiskFactors::default();

    let age = match record.age {
        Some(age) if age < PEDIATRIC_AGE_LIMIT || age > GERIATRIC_AGE_LIMIT => {
            let band = if age < PEDIATRIC_AGE_LIMIT {
                format!("pediatric risk band (< {PEDIATRIC_AGE_LIMIT})")
            } else {
                format!("geriatric risk band (> {GERIATRIC_AGE_LIMIT})")
            };
            factors.demographic_risks.insert(
                "age".to_string(),
                RiskFactor {
                    weight: weights.age_max,
                    description: format!("Age {age} is in the {band}"),
                },
            );
            weights.age_max
        }
        _ => 0.0,
    };

    let mut vitals = 0.0;
    for assessment in assessments.iter().filter(|a| a.is_abnormal()) {
        vitals += assessment.severity_weight;
        factors.vital_risks.insert(
            assessment.vital.label().to_string(),
            RiskFactor {
                weight: assessment.severity_weight,
                description: assessment.clinical_significance.clone(),
            },
        );
    }

    let mut symptoms = 0.0;
    for phrase in &profile.critical_symptoms {
        symptoms += weights.critical_symptom;
        factors.symptom_risks.insert(
            format!("critical:{phrase}"),
            RiskFactor {
                weight: weights.critical_symptom,
                description: format!("Critical symptom: {phrase}"),
            },
        );
    }
    for (category, phrases) in &profile.categories {
        for phrase in phrases {
            symptoms += weights.categorized_symptom;
            factors.symptom_risks.insert(
                format!("{category}:{phrase}"),
                RiskFactor {
                    weight: weights.categorized_symptom,
                    description: format!("{phrase} ({category})"),
                },
            );
        }
    }

    let mut history = 0.0;
    for keyword in &catalog.chronic_history_keywords {
        if history_mentions(&record.medical_history, keyword) {
            history += weights.history_item;
            factors.demographic_risks.insert(
                format!("history:{keyword}"),
                RiskFactor {
                    weight: weights.history_item,
                    description: format!("History of {keyword}"),
                },
            );
        }
    }

    let contributions = RiskContributions {
        age,
        vitals: vitals.min(weights.vitals_cap),
        symptoms: symptoms.min(weights.symptoms_cap),
        history: history.min(weights.history_cap),
    };

    let max_total = weights.max_total();
    let risk_score = if max_total > 0.0 {
        round3((contributions.total() / max_total).clamp(0.0, 1.0))
    } else {
        0.0
    };
    let risk_category = RiskCategory::from_score(risk_score, &config.risk_thresholds);
    let explanation = explain(risk_score, risk_category, &factors, profile);

    RiskAssessment {
        risk_score,
        risk_category,
        factors,
        contributions,
        explanation,
        insufficient_data: false,
    }
}

/// No vitals, no symptoms and no known age. History alone does not count.
fn has_insufficient_data(record: &PatientRecord, assessments: &[VitalAssessment]) -> bool {
    assessments.iter().all(|a| !a.is_recorded())
        && record.symptoms.is_empty()
        && record.known_age().is_none()
}

fn explain(
    score: f64,
    category: RiskCategory,
    factors: &RiskFactors,
    profile: &SymptomProfile,
) -> String {
    let mut parts = Vec::new();

    if !factors.vital_risks.is_empty() {
        let vitals: Vec<&str> = factors.vital_risks.keys().map(String::as_str).collect();
        parts.push(format!("Abnormal vital signs: {}", vitals.join(", ")));
    }

    if profile.critical_present {
        parts.push(format!(
            "Critical symptoms: {}",
            profile.critical_symptoms.join(", ")
        ));
    } else if !profile.categories.is_empty() {
        let categories: Vec<&str> = profile.categories.keys().map(String::as_str).collect();
        parts.push(format!("Symptom categories: {}", categories.join(", ")));
    }

    if !factors.demographic_risks.is_empty() {
        let demographics: Vec<&str> = factors
            .demographic_risks
            .values()
            .map(|factor| factor.description.as_str())
            .collect();
        parts.push(format!("Demographic factors: {}", demographics.join("; ")));
    }

    let label = match category {
        RiskCategory::Low => "Low",
        RiskCategory::Moderate => "Moderate",
        RiskCategory::High => "High",
        RiskCategory::Critical => "Critical",
    };

    if parts.is_empty() {
        format!("{label} risk ({score:.2}). No significant risk factors identified.")
    } else {
        format!("{label} risk ({score:.2}). {}.", parts.join(". "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symptoms::classify_symptoms;
    use crate::vitals::evaluate_vitals;
    use triage_core::{Reading, Symptoms, Vitals};

    fn assess(record: &PatientRecord) -> RiskAssessment {
        let catalog = RuleCatalog::standard().unwrap();
        let config = TriageConfig::default();
        let assessments = evaluate_vitals(&record.vitals, record.age, &catalog);
        let profile = classify_symptoms(&record.symptoms.normalized_text(), &catalog);
        score_risk(record, &assessments, &profile, &catalog, &config)
    }

    #[test]
    fn chest_pain_with_tachycardia_is_high() {
        let record = PatientRecord {
            symptoms: Symptoms::Text("chest pain and shortness of breath".into()),
            vitals: Vitals {
                heart_rate: Some(Reading::Text("110".into())),
                blood_pressure: Some(Reading::Text("140/90".into())),
                temperature: Some(Reading::Text("37.8".into())),
                ..Vitals::default()
            },
            age: Some(58),
            ..PatientRecord::default()
        };
        let risk = assess(&record);

        assert_eq!(risk.risk_score, 0.65);
        assert_eq!(risk.risk_category, RiskCategory::High);
        assert_eq!(risk.contributions.symptoms, 3.5);
        assert!(risk.factors.vital_risks.contains_key("heart_rate"));
        assert!(risk.explanation.contains("Critical symptoms: chest pain"));
        assert!(!risk.insufficient_data);
    }

    #[test]
    fn mild_headache_is_low() {
        let record = PatientRecord {
            symptoms: Symptoms::Text("mild headache".into()),
            vitals: Vitals {
                heart_rate: Some(Reading::Number(72.0)),
                blood_pressure: Some(Reading::Text("118/76".into())),
                temperature: Some(Reading::Number(36.8)),
                ..Vitals::default()
            },
            age: Some(30),
            ..PatientRecord::default()
        };
        let risk = assess(&record);
        assert_eq!(risk.risk_score, 0.042);
        assert_eq!(risk.risk_category, RiskCategory::Low);
    }

    #[test]
    fn empty_record_is_flagged_insufficient() {
        let record = PatientRecord {
            medical_history: vec!["hypertension".into()],
            ..PatientRecord::default()
        };
        let risk = assess(&record);
        assert!(risk.insufficient_data);
        assert_eq!(risk.risk_score, 0.0);
        assert_eq!(risk.risk_category, RiskCategory::Low);
        assert!(risk.factors.demographic_risks.is_empty());
    }

    #[test]
    fn age_alone_is_sufficient_data() {
        let record = PatientRecord {
            age: Some(80),
            ..PatientRecord::default()
        };
        let risk = assess(&record);
        assert!(!risk.insufficient_data);
        assert_eq!(risk.contributions.age, 0.5);
        assert_eq!(risk.risk_score, 0.083);
    }

    #[test]
    fn history_contribution_is_capped() {
        let record = PatientRecord {
            age: Some(40),
            medical_history: vec![
                "Hypertension".into(),
                "Type 2 diabetes".into(),
                "COPD".into(),
            ],
            ..PatientRecord::default()
        };
        let risk = assess(&record);
        assert_eq!(risk.factors.demographic_risks.len(), 3);
        assert_eq!(risk.contributions.history, 0.5);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let record = PatientRecord {
            symptoms: Symptoms::Text(
                "chest pain, shortness of breath, seizure, loss of consciousness, confusion".into(),
            ),
            vitals: Vitals {
                heart_rate: Some(Reading::Number(190.0)),
                blood_pressure: Some(Reading::Text("70/40".into())),
                temperature: Some(Reading::Number(41.0)),
                respiratory_rate: Some(Reading::Number(40.0)),
                oxygen_saturation: Some(Reading::Number(80.0)),
            },
            age: Some(88),
            medical_history: vec!["heart failure".into(), "copd".into(), "cancer".into()],
            ..PatientRecord::default()
        };
        let risk = assess(&record);
        assert_eq!(risk.risk_score, 1.0);
        assert_eq!(risk.risk_category, RiskCategory::Critical);
    }
}
