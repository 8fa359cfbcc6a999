use triage_core::{
    ComplexityLevel, DrugSafetyReport, FollowupPlan, QualityIssue, QualityReport, Severity,
    SpecialistReferrals, TreatmentPlan, VitalKind,
};

use super::{critical_vitals, AdvisoryInput};
use crate::round2;

const COMPLETENESS_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.4;
const SAFETY_WEIGHT: f64 = 0.3;

const MINIMUM_PRIMARY: usize = 3;
const UNDER_TRIAGE_RISK: f64 = 0.7;
const CRITICAL_CONCERNS: [&str; 3] = ["chest pain", "shortness of breath", "loss of consciousness"];

/// Treatment families expected for each symptom category.
const EXPECTED_TREATMENTS: [(&str, &[&str]); 3] = [
    ("cardiac", &["aspirin", "nitroglycerin"]),
    ("respiratory", &["oxygen"]),
    ("infectious", &["antibiotic"]),
];

struct Check {
    points: f64,
    issues: Vec<QualityIssue>,
}

impl Check {
    fn new() -> Self {
        Self {
            points: 1.0,
            issues: Vec::new(),
        }
    }

    fn flag(&mut self, kind: &str, description: String, severity: Severity, penalty: f64) {
        self.points -= penalty;
        self.issues.push(QualityIssue {
            kind: kind.to_string(),
            description,
            severity,
        });
    }

    fn has(&self, kind: &str) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }

    fn score(&self) -> f64 {
        round2(self.points.max(0.0))
    }
}

/// Reviews the advisory output for completeness, consistency and safety.
pub fn review_quality(
    input: &AdvisoryInput<'_>,
    treatment: &TreatmentPlan,
    followup: &FollowupPlan,
    drugs: &DrugSafetyReport,
    specialists: &SpecialistReferrals,
) -> QualityReport {
    let completeness = check_completeness(input, treatment, followup);
    let consistency = check_consistency(input, treatment, followup, specialists);
    let safety = check_safety(input, drugs);

    let overall_score = round2(
        completeness.score() * COMPLETENESS_WEIGHT
            + consistency.score() * CONSISTENCY_WEIGHT
            + safety.score() * SAFETY_WEIGHT,
    );
    let assessment = if overall_score >= 0.8 {
        "High quality - recommendations are comprehensive and consistent"
    } else if overall_score >= 0.6 {
        "Moderate quality - some improvements needed"
    } else {
        "Low quality - significant issues identified requiring attention"
    };
    let suggestions = suggestions(&completeness, &consistency, &safety);

    QualityReport {
        overall_score,
        completeness: completeness.score(),
        consistency: consistency.score(),
        safety: safety.score(),
        issues: completeness
            .issues
            .into_iter()
            .chain(consistency.issues)
            .chain(safety.issues)
            .collect(),
        assessment: assessment.to_string(),
        suggestions,
    }
}

fn check_completeness(
    input: &AdvisoryInput<'_>,
    treatment: &TreatmentPlan,
    followup: &FollowupPlan,
) -> Check {
    let mut check = Check::new();

    let primary = treatment.primary.len();
    if primary < MINIMUM_PRIMARY {
        check.flag(
            "insufficient_recommendations",
            format!("Only {primary} primary treatment recommendations provided (minimum {MINIMUM_PRIMARY})"),
            if primary < 2 { Severity::Moderate } else { Severity::Low },
            0.1 * (MINIMUM_PRIMARY - primary) as f64,
        );
    }

    let required = [
        (VitalKind::HeartRate, "heart_rate"),
        (VitalKind::SystolicBloodPressure, "blood_pressure"),
        (VitalKind::Temperature, "temperature"),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(kind, _)| {
            !input
                .vital_assessments
                .iter()
                .any(|assessment| assessment.vital == *kind && assessment.is_recorded())
        })
        .map(|(_, label)| *label)
        .collect();
    if !missing.is_empty() {
        check.flag(
            "missing_vitals",
            format!("Missing vital signs: {}", missing.join(", ")),
            if missing.len() > 1 { Severity::Moderate } else { Severity::Low },
            0.05 * missing.len() as f64,
        );
    }

    if followup.immediate.is_empty() && followup.short_term.is_empty() {
        check.flag(
            "incomplete_followup",
            "Follow-up plan lacks immediate or short-term components".to_string(),
            Severity::Moderate,
            0.1,
        );
    }

    check
}

fn check_consistency(
    input: &AdvisoryInput<'_>,
    treatment: &TreatmentPlan,
    followup: &FollowupPlan,
    specialists: &SpecialistReferrals,
) -> Check {
    let mut check = Check::new();

    let risk_score = input.risk.risk_score;
    let severity = symptom_severity(input);
    if (risk_score > 0.7 && severity < 0.5) || (risk_score < 0.3 && severity > 0.7) {
        check.flag(
            "risk_symptom_mismatch",
            format!("Risk score ({risk_score}) does not align with symptom severity ({severity})"),
            Severity::High,
            0.2,
        );
    }

    let treatment_text = treatment
        .primary
        .iter()
        .chain(&treatment.secondary)
        .chain(&treatment.follow_up)
        .map(|line| line.to_lowercase())
        .collect::<Vec<_>>()
        .join(" | ");
    let unmatched: Vec<&str> = EXPECTED_TREATMENTS
        .iter()
        .filter(|(category, _)| {
            input
                .symptom_profile
                .categories
                .get(*category)
                .is_some_and(|phrases| !phrases.is_empty())
        })
        .filter(|(_, expected)| !expected.iter().any(|t| treatment_text.contains(t)))
        .map(|(category, _)| *category)
        .collect();
    if !unmatched.is_empty() {
        check.flag(
            "treatment_condition_mismatch",
            format!(
                "Recommended treatments do not cover {} presentation",
                unmatched.join(", ")
            ),
            Severity::Moderate,
            0.15,
        );
    }

    if specialists.complexity == ComplexityLevel::High && followup.immediate.is_empty() {
        check.flag(
            "followup_intensity_mismatch",
            "High complexity case lacks immediate follow-up plan".to_string(),
            Severity::Moderate,
            0.1,
        );
    }

    check
}

fn check_safety(input: &AdvisoryInput<'_>, drugs: &DrugSafetyReport) -> Check {
    let mut check = Check::new();

    let critical_symptom = CRITICAL_CONCERNS
        .iter()
        .any(|concern| input.symptom_text.contains(concern));
    let critical_vital = !critical_vitals(input).is_empty();
    if (critical_symptom || critical_vital) && input.risk.risk_score < UNDER_TRIAGE_RISK {
        check.flag(
            "under_triage",
            "Critical symptoms or vitals present but risk score is low".to_string(),
            Severity::High,
            0.3,
        );
    }

    let major = drugs.contraindications.iter().filter(|c| c.major).count();
    if major > 0 {
        check.flag(
            "major_contraindications",
            format!("{major} major contraindications identified"),
            Severity::High,
            0.25 * major as f64,
        );
    }

    let high = drugs
        .interactions
        .iter()
        .filter(|interaction| interaction.severity <= Severity::High)
        .count();
    if high > 0 {
        check.flag(
            "high_risk_interactions",
            format!("{high} high-risk drug interactions identified"),
            Severity::High,
            0.2 * high as f64,
        );
    }

    check
}

fn symptom_severity(input: &AdvisoryInput<'_>) -> f64 {
    if CRITICAL_CONCERNS
        .iter()
        .any(|concern| input.symptom_text.contains(concern))
    {
        return 0.9;
    }
    match input.symptom_profile.distinct_symptoms().len() {
        0 => 0.1,
        1 | 2 => 0.4,
        _ => 0.7,
    }
}

fn suggestions(completeness: &Check, consistency: &Check, safety: &Check) -> Vec<String> {
    let table = [
        (
            completeness,
            "insufficient_recommendations",
            "Add more specific treatment recommendations based on diagnosed conditions",
        ),
        (
            completeness,
            "missing_vitals",
            "Collect all required vital signs for comprehensive assessment",
        ),
        (
            completeness,
            "incomplete_followup",
            "Define immediate or short-term follow-up before discharge",
        ),
        (
            consistency,
            "risk_symptom_mismatch",
            "Reassess risk score to ensure alignment with symptom severity",
        ),
        (
            consistency,
            "treatment_condition_mismatch",
            "Review treatment recommendations to ensure they match diagnosed conditions",
        ),
        (
            consistency,
            "followup_intensity_mismatch",
            "Schedule immediate follow-up for high complexity cases",
        ),
        (
            safety,
            "under_triage",
            "Reassess patient urgency level given critical symptoms or vitals",
        ),
        (
            safety,
            "major_contraindications",
            "Review and address all identified contraindications before implementation",
        ),
        (
            safety,
            "high_risk_interactions",
            "Consult with clinical pharmacist to resolve high-risk drug interactions",
        ),
    ];

    let mut suggestions: Vec<String> = table
        .iter()
        .filter(|(check, kind, _)| check.has(kind))
        .map(|(_, _, suggestion)| suggestion.to_string())
        .collect();
    if suggestions.is_empty() {
        suggestions.push(
            "All quality checks passed - recommendations appear comprehensive and consistent"
                .to_string(),
        );
        suggestions.push("Continue with standard implementation procedures".to_string());
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::fixtures::Scored;
    use crate::advisory::{
        identify_problems, plan_followup, plan_treatment, recommend_specialists,
        screen_medications,
    };
    use triage_core::{PatientRecord, Reading, Symptoms, Vitals};

    fn review(record: PatientRecord) -> QualityReport {
        let scored = Scored::new(record);
        let input = scored.input();
        let catalog = &scored.catalog;
        let problems = identify_problems(&input);
        let treatment = plan_treatment(&input, &problems, catalog);
        let followup = plan_followup(&input, &problems, &treatment, catalog);
        let drugs = screen_medications(&input, &treatment, catalog);
        let specialists = recommend_specialists(&input, &problems, catalog);
        review_quality(&input, &treatment, &followup, &drugs, &specialists)
    }

    fn kinds(report: &QualityReport) -> Vec<&str> {
        report.issues.iter().map(|issue| issue.kind.as_str()).collect()
    }

    #[test]
    fn chest_pain_below_high_risk_is_flagged_as_under_triage() {
        let report = review(PatientRecord {
            symptoms: Symptoms::Text("chest pain and shortness of breath".into()),
            vitals: Vitals {
                heart_rate: Some(Reading::Number(110.0)),
                ..Vitals::default()
            },
            age: Some(58),
            ..PatientRecord::default()
        });

        assert_eq!(kinds(&report), vec!["missing_vitals", "under_triage"]);
        assert_eq!(report.completeness, 0.9);
        assert_eq!(report.consistency, 1.0);
        assert_eq!(report.safety, 0.7);
        assert_eq!(report.overall_score, 0.88);
        assert!(report.assessment.starts_with("High quality"));
        assert_eq!(report.suggestions.len(), 2);
    }

    #[test]
    fn sparse_record_loses_completeness() {
        let report = review(PatientRecord {
            symptoms: Symptoms::Text("mild headache".into()),
            age: Some(30),
            ..PatientRecord::default()
        });
        assert_eq!(kinds(&report), vec!["missing_vitals", "incomplete_followup"]);
        assert_eq!(report.completeness, 0.75);
        assert_eq!(report.issues[0].severity, Severity::Moderate);
        assert_eq!(report.safety, 1.0);
    }

    #[test]
    fn high_risk_interaction_reduces_safety() {
        let report = review(PatientRecord {
            symptoms: Symptoms::Text("chest pain".into()),
            vitals: Vitals {
                heart_rate: Some(Reading::Number(88.0)),
                blood_pressure: Some(Reading::Text("130/85".into())),
                temperature: Some(Reading::Number(36.8)),
                ..Vitals::default()
            },
            age: Some(62),
            current_medications: vec!["warfarin".into()],
            ..PatientRecord::default()
        });
        assert!(kinds(&report).contains(&"high_risk_interactions"));
        assert!(report
            .suggestions
            .contains(&"Consult with clinical pharmacist to resolve high-risk drug interactions".to_string()));
        // Under-triage 0.3 plus one high interaction 0.2.
        assert_eq!(report.safety, 0.5);
    }
}
