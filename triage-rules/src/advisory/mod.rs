//! Advisory agents layered on top of the triage result. They read the scoring
//! outputs and never change urgency.

mod drugs;
mod followup;
mod quality;
mod specialist;
mod treatment;

pub use drugs::screen_medications;
pub use followup::plan_followup;
pub use quality::review_quality;
pub use specialist::recommend_specialists;
pub use treatment::plan_treatment;

use triage_core::{
    AdvisoryBundle, ClinicalFindings, ComplicationPrediction, Deviation, DifferentialEntry,
    Finding, PatientRecord, Problem, RiskAssessment, SymptomProfile, UrgencyLevel,
    VitalAssessment, VitalKind,
};

use crate::catalog::RuleCatalog;

/// Read-only view of everything the scoring stages produced for one patient.
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryInput<'a> {
    pub record: &'a PatientRecord,
    pub symptom_text: &'a str,
    pub vital_assessments: &'a [VitalAssessment],
    pub symptom_profile: &'a SymptomProfile,
    pub findings: &'a ClinicalFindings,
    pub risk: &'a RiskAssessment,
    pub differentials: &'a [DifferentialEntry],
    pub complications: &'a [ComplicationPrediction],
    pub urgency: UrgencyLevel,
}

impl AdvisoryInput<'_> {
    pub(crate) fn vital(&self, kind: VitalKind) -> Option<f64> {
        self.vital_assessments
            .iter()
            .find(|assessment| assessment.vital == kind)
            .and_then(|assessment| assessment.value)
    }
}

pub fn advise(input: &AdvisoryInput<'_>, catalog: &RuleCatalog) -> AdvisoryBundle {
    let problems = identify_problems(input);
    let treatment = plan_treatment(input, &problems, catalog);
    let followup = plan_followup(input, &problems, &treatment, catalog);
    let drug_safety = screen_medications(input, &treatment, catalog);
    let specialists = recommend_specialists(input, &problems, catalog);
    let quality = review_quality(input, &treatment, &followup, &drug_safety, &specialists);

    tracing::debug!(
        problems = problems.len(),
        safety = ?drug_safety.safety_level,
        referrals = specialists.referrals.len(),
        quality = quality.overall_score,
        "advisory completed"
    );

    AdvisoryBundle {
        treatment,
        followup,
        drug_safety,
        specialists,
        quality,
    }
}

/// Presenting problems that drive the guideline tables.
pub fn identify_problems(input: &AdvisoryInput<'_>) -> Vec<Problem> {
    let text = input.symptom_text;
    let mut problems = Vec::new();

    if text.contains("chest pain") {
        problems.push(Problem::ChestPain);
    }
    if text.contains("shortness of breath") || text.contains("difficulty breathing") {
        problems.push(Problem::ShortnessOfBreath);
    }
    if text.contains("fever") || input.findings.contains(Finding::Fever) {
        problems.push(Problem::Fever);
    }
    let diastolic_high = input.vital_assessments.iter().any(|assessment| {
        assessment.vital == VitalKind::DiastolicBloodPressure
            && assessment.deviation == Some(Deviation::High)
    });
    if input.findings.contains(Finding::HighBloodPressure) || diastolic_high {
        problems.push(Problem::Hypertension);
    }

    problems
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CriticalVital {
    pub label: &'static str,
    pub severe: bool,
}

/// Vital readings far enough out of range to affect case complexity and safety review.
pub(crate) fn critical_vitals(input: &AdvisoryInput<'_>) -> Vec<CriticalVital> {
    let mut found = Vec::new();
    let mut push = |label, severe| found.push(CriticalVital { label, severe });

    if let Some(rate) = input.vital(VitalKind::HeartRate) {
        if rate > 130.0 {
            push("severe tachycardia", true);
        } else if rate < 50.0 {
            push("severe bradycardia", false);
        }
    }

    let systolic = input.vital(VitalKind::SystolicBloodPressure);
    let diastolic = input.vital(VitalKind::DiastolicBloodPressure);
    if systolic.is_some_and(|s| s > 180.0) || diastolic.is_some_and(|d| d > 120.0) {
        push("hypertensive crisis", true);
    } else if systolic.is_some_and(|s| s < 80.0) || diastolic.is_some_and(|d| d < 50.0) {
        push("severe hypotension", true);
    }

    if let Some(temperature) = input.vital(VitalKind::Temperature) {
        if temperature > 39.5 {
            push("high fever", false);
        } else if temperature < 35.0 {
            push("hypothermia", false);
        }
    }

    if input
        .vital(VitalKind::OxygenSaturation)
        .is_some_and(|saturation| saturation < 90.0)
    {
        push("hypoxia", true);
    }

    found
}

pub(crate) fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::aggregate::resolve_urgency;
    use crate::complications::forecast_complications;
    use crate::differential::rank_differentials;
    use crate::findings::derive_findings;
    use crate::risk::score_risk;
    use crate::symptoms::classify_symptoms;
    use crate::vitals::evaluate_vitals;
    use triage_core::TriageConfig;

    /// Owned scoring outputs so advisory tests can borrow an [`AdvisoryInput`].
    pub struct Scored {
        pub record: PatientRecord,
        pub text: String,
        pub assessments: Vec<VitalAssessment>,
        pub profile: SymptomProfile,
        pub findings: ClinicalFindings,
        pub risk: RiskAssessment,
        pub differentials: Vec<DifferentialEntry>,
        pub complications: Vec<ComplicationPrediction>,
        pub urgency: UrgencyLevel,
        pub catalog: RuleCatalog,
    }

    impl Scored {
        pub fn new(record: PatientRecord) -> Self {
            let catalog = RuleCatalog::standard().unwrap();
            let config = TriageConfig::default();
            let text = record.symptoms.normalized_text();
            let assessments = evaluate_vitals(&record.vitals, record.age, &catalog);
            let profile = classify_symptoms(&text, &catalog);
            let findings = derive_findings(&assessments, &text);
            let risk = score_risk(&record, &assessments, &profile, &catalog, &config);
            let differentials = rank_differentials(&record, &text, &findings, &catalog, 5);
            let complications =
                forecast_complications(&record, &text, &findings, &catalog, 0.1);
            let urgency = resolve_urgency(&risk, &profile, &complications).level;
            Self {
                record,
                text,
                assessments,
                profile,
                findings,
                risk,
                differentials,
                complications,
                urgency,
                catalog,
            }
        }

        pub fn input(&self) -> AdvisoryInput<'_> {
            AdvisoryInput {
                record: &self.record,
                symptom_text: &self.text,
                vital_assessments: &self.assessments,
                symptom_profile: &self.profile,
                findings: &self.findings,
                risk: &self.risk,
                differentials: &self.differentials,
                complications: &self.complications,
                urgency: self.urgency,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::Scored;
    use super::*;
    use triage_core::{Reading, Symptoms, Vitals};

    #[test]
    fn problems_come_from_text_and_vitals() {
        let scored = Scored::new(PatientRecord {
            symptoms: Symptoms::Text("Chest pain, difficulty breathing".into()),
            vitals: Vitals {
                blood_pressure: Some(Reading::Text("150/95".into())),
                temperature: Some(Reading::Number(38.6)),
                ..Vitals::default()
            },
            age: Some(60),
            ..PatientRecord::default()
        });
        assert_eq!(
            identify_problems(&scored.input()),
            vec![
                Problem::ChestPain,
                Problem::ShortnessOfBreath,
                Problem::Fever,
                Problem::Hypertension
            ]
        );
    }

    #[test]
    fn critical_vitals_flag_severe_readings() {
        let scored = Scored::new(PatientRecord {
            vitals: Vitals {
                heart_rate: Some(Reading::Number(140.0)),
                blood_pressure: Some(Reading::Text("75/45".into())),
                oxygen_saturation: Some(Reading::Number(86.0)),
                ..Vitals::default()
            },
            age: Some(50),
            ..PatientRecord::default()
        });
        let labels: Vec<&str> = critical_vitals(&scored.input())
            .iter()
            .map(|vital| vital.label)
            .collect();
        assert_eq!(
            labels,
            vec!["severe tachycardia", "severe hypotension", "hypoxia"]
        );
    }
}
