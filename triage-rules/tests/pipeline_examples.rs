use std::fs;

use triage_core::{
    EscalationSignal, Finding, Gender, PatientRecord, RiskCategory, Severity, Symptoms,
    TriageConfig, UrgencyLevel, VitalKind, VitalStatus,
};
use triage_rules::catalog::{AgeRange, ConditionProfile};
use triage_rules::{assess_patient_str, CatalogBuilder, RuleCatalog, TriagePipeline};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn assess_fixture(name: &str) -> triage_core::FinalRecommendation {
    let patient = fs::read_to_string(fixture_path(name)).expect("Không đọc được hồ sơ mẫu");
    assess_patient_str(&patient, &TriageConfig::default()).expect("Không chạy được triage")
}

fn status_of(result: &triage_core::FinalRecommendation, kind: VitalKind) -> VitalStatus {
    result
        .vital_assessments
        .iter()
        .find(|assessment| assessment.vital == kind)
        .map(|assessment| assessment.status)
        .expect("thiếu chỉ số")
}

#[test]
fn chest_pain_with_tachycardia_is_orange() {
    let result = assess_fixture("example_chest_pain.json");

    assert_eq!(status_of(&result, VitalKind::HeartRate), VitalStatus::Abnormal);
    assert_eq!(
        status_of(&result, VitalKind::SystolicBloodPressure),
        VitalStatus::Normal
    );
    assert_eq!(
        result.symptom_profile.critical_symptoms,
        vec!["chest pain".to_string(), "shortness of breath".to_string()]
    );
    assert_eq!(result.risk_assessment.risk_score, 0.65);
    assert_eq!(result.risk_assessment.risk_category, RiskCategory::High);
    assert_eq!(result.urgency_level, UrgencyLevel::Orange);
    assert_eq!(result.priority, 2);
    assert_eq!(result.recommended_action, "Urgent evaluation within 1 hour");
    assert!(result
        .escalations
        .iter()
        .any(|escalation| escalation.signal == EscalationSignal::CriticalSymptom));

    assert_eq!(
        result.differential_diagnosis[0].key,
        "myocardial_infarction"
    );
    assert!(result.advisory.is_some());
}

#[test]
fn mild_headache_is_green() {
    let result = assess_fixture("example_mild_headache.json");
    assert!(result.risk_assessment.risk_score < 0.3);
    assert_eq!(result.risk_assessment.risk_category, RiskCategory::Low);
    assert_eq!(result.urgency_level, UrgencyLevel::Green);
    assert!(!result.insufficient_data);
    assert!(result
        .vital_assessments
        .iter()
        .all(|assessment| assessment.status == VitalStatus::Normal));
}

#[test]
fn empty_record_reports_insufficient_data() {
    let result = assess_fixture("example_empty.json");
    assert!(result.insufficient_data);
    assert!(result.risk_assessment.insufficient_data);
    assert_eq!(result.risk_assessment.risk_score, 0.0);
    assert_eq!(result.urgency_level, UrgencyLevel::Green);
    assert!(result.differential_diagnosis.is_empty());
}

#[test]
fn high_risk_complication_escalates_low_risk_patient() {
    let result = assess_fixture("elderly_complication.json");
    assert_eq!(result.risk_assessment.risk_category, RiskCategory::Low);
    assert_eq!(result.urgency_level, UrgencyLevel::Orange);

    let cardiac = result
        .complication_predictions
        .iter()
        .find(|prediction| prediction.key == "cardiac_complications")
        .unwrap();
    assert_eq!(cardiac.risk_score, 0.615);
    assert_eq!(
        cardiac.risk_factors_present,
        vec!["hypertension", "diabetes", "smoking", "age over 65"]
    );
    assert!(result
        .escalations
        .iter()
        .any(|escalation| escalation.signal == EscalationSignal::HighRiskComplication));
}

#[test]
fn intake_form_fields_are_accepted() {
    let result = assess_fixture("intake_form_fields.json");

    let temperature = result
        .vital_assessments
        .iter()
        .find(|assessment| assessment.vital == VitalKind::Temperature)
        .unwrap();
    assert_eq!(temperature.value, Some(39.0));
    assert_eq!(
        status_of(&result, VitalKind::SystolicBloodPressure),
        VitalStatus::Invalid
    );
    assert!(result.clinical_findings.contains(Finding::Fever));
    assert!(result.clinical_findings.contains(Finding::AlteredMentalStatus));
    assert!(result.clinical_findings.contains(Finding::LowOxygen));
    assert!(result.urgency_level >= UrgencyLevel::Yellow);
}

#[test]
fn non_scalar_vital_is_invalid_not_fatal() {
    let result = assess_patient_str(
        r#"{"symptoms": "cough", "age": "40", "vitals": {"heart_rate": true, "blood_pressure": "120/80"}}"#,
        &TriageConfig::default(),
    )
    .unwrap();

    assert_eq!(status_of(&result, VitalKind::HeartRate), VitalStatus::Invalid);
    assert_eq!(
        status_of(&result, VitalKind::SystolicBloodPressure),
        VitalStatus::Normal
    );
    assert_eq!(result.risk_assessment.contributions.vitals, 0.0);
    assert!(!result.insufficient_data);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let patient = fs::read_to_string(fixture_path("intake_form_fields.json")).unwrap();
    let config = TriageConfig::default();
    let first = serde_json::to_string(&assess_patient_str(&patient, &config).unwrap()).unwrap();
    let second = serde_json::to_string(&assess_patient_str(&patient, &config).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn catalog_loaded_from_file_matches_builtin() {
    let config = TriageConfig {
        catalog_path: Some(
            format!("{}/catalog/standard.json", env!("CARGO_MANIFEST_DIR")).into(),
        ),
        ..TriageConfig::default()
    };
    let patient = fs::read_to_string(fixture_path("example_chest_pain.json")).unwrap();
    assert_eq!(
        assess_patient_str(&patient, &config).unwrap(),
        assess_fixture("example_chest_pain.json")
    );
}

#[test]
fn scores_stay_bounded_and_ordered() {
    let pipeline = TriagePipeline::from_config(TriageConfig::default()).unwrap();
    let symptom_sets = [
        "",
        "mild headache",
        "cough and fever",
        "chest pain, shortness of breath, seizure, loss of consciousness, severe bleeding",
    ];
    let heart_rates = [None, Some("40"), Some("75"), Some("135"), Some("290")];
    let ages = [None, Some(0), Some(3), Some(45), Some(90)];

    for symptoms in symptom_sets {
        for heart_rate in heart_rates {
            for age in ages {
                let record: PatientRecord = serde_json::from_value(serde_json::json!({
                    "symptoms": symptoms,
                    "vitals": {
                        "heart_rate": heart_rate,
                        "blood_pressure": "85/50",
                        "oxygen_saturation": 88
                    },
                    "age": age,
                    "medical_history": ["COPD", "heart failure", "diabetes"]
                }))
                .unwrap();
                let result = pipeline.run(&record).unwrap();
                let risk = &result.risk_assessment;
                assert!((0.0..=1.0).contains(&risk.risk_score));
                assert!(result.urgency_level >= UrgencyLevel::from_risk_category(risk.risk_category));

                let scores: Vec<f64> = result
                    .differential_diagnosis
                    .iter()
                    .map(|entry| entry.match_score)
                    .collect();
                assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
                assert!(result
                    .differential_diagnosis
                    .iter()
                    .all(|entry| !entry.matched_symptoms.is_empty()));

                let complication_scores: Vec<f64> = result
                    .complication_predictions
                    .iter()
                    .map(|prediction| prediction.risk_score)
                    .collect();
                assert!(complication_scores.windows(2).all(|pair| pair[0] >= pair[1]));
                assert!(complication_scores.iter().all(|score| *score >= 0.1));
            }
        }
    }
}

#[test]
fn adding_critical_symptom_never_lowers_urgency() {
    let pipeline = TriagePipeline::from_config(TriageConfig::default()).unwrap();
    for base in ["", "mild headache", "cough", "fever and fatigue"] {
        let record = PatientRecord {
            symptoms: Symptoms::Text(base.to_string()),
            age: Some(40),
            gender: Gender::Female,
            ..PatientRecord::default()
        };
        let escalated = PatientRecord {
            symptoms: Symptoms::Text(format!("{base}, slurred speech")),
            ..record.clone()
        };
        let before = pipeline.run(&record).unwrap().urgency_level;
        let after = pipeline.run(&escalated).unwrap().urgency_level;
        assert!(after >= before);
        assert!(after >= UrgencyLevel::Orange);
    }
}

fn twin_condition(name: &str) -> ConditionProfile {
    ConditionProfile {
        name: name.to_string(),
        code: "R68.89".to_string(),
        system: None,
        required_symptoms: vec!["dizziness".to_string()],
        optional_symptoms: vec!["nausea".to_string()],
        vital_indicators: vec![],
        prevalence: 0.4,
        severity: Severity::Moderate,
        age_range: AgeRange::default(),
        modifiers: vec![],
        recommendations: vec![],
    }
}

#[test]
fn identical_conditions_rank_deterministically() {
    // Inserted in reverse so only the tie-break can put Alpha first.
    let catalog = CatalogBuilder::extend(RuleCatalog::standard().unwrap(), "twins")
        .without_conditions()
        .condition("zeta_key", twin_condition("Beta Vertigo"))
        .unwrap()
        .condition("alpha_key", twin_condition("Alpha Vertigo"))
        .unwrap()
        .build()
        .unwrap();
    let pipeline = TriagePipeline::new(TriageConfig::default(), catalog).unwrap();
    let record = PatientRecord {
        symptoms: Symptoms::Text("dizziness and nausea".into()),
        age: Some(35),
        ..PatientRecord::default()
    };

    let names = |pipeline: &TriagePipeline| -> Vec<String> {
        pipeline
            .run(&record)
            .unwrap()
            .differential_diagnosis
            .into_iter()
            .map(|entry| entry.condition)
            .collect()
    };
    let first = names(&pipeline);
    assert_eq!(first, vec!["Alpha Vertigo", "Beta Vertigo"]);
    assert_eq!(first, names(&pipeline));
}
