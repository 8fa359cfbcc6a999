use triage_core::{ClinicalFindings, Deviation, Finding, VitalAssessment, VitalKind};

const ALTERED_MENTAL_STATUS_TERMS: [&str; 4] = [
    "confusion",
    "confused",
    "altered mental status",
    "disoriented",
];

/// Derives the finding set shared by the differential and complication stages.
/// Vital findings follow the age-appropriate deviation, so only readable values count.
pub fn derive_findings(assessments: &[VitalAssessment], symptom_text: &str) -> ClinicalFindings {
    let mut findings: ClinicalFindings = assessments
        .iter()
        .filter_map(|assessment| {
            let deviation = assessment.deviation?;
            match (assessment.vital, deviation) {
                (VitalKind::Temperature, Deviation::High) => Some(Finding::Fever),
                (VitalKind::SystolicBloodPressure, Deviation::High) => {
                    Some(Finding::HighBloodPressure)
                }
                (VitalKind::SystolicBloodPressure, Deviation::Low) => Some(Finding::Hypotension),
                (VitalKind::HeartRate, Deviation::High) => Some(Finding::RapidHeartRate),
                (VitalKind::HeartRate, Deviation::Low) => Some(Finding::Bradycardia),
                (VitalKind::RespiratoryRate, Deviation::High) => Some(Finding::RapidBreathing),
                (VitalKind::OxygenSaturation, Deviation::Low) => Some(Finding::LowOxygen),
                _ => None,
            }
        })
        .collect();

    if ALTERED_MENTAL_STATUS_TERMS
        .iter()
        .any(|term| symptom_text.contains(term))
    {
        findings.insert(Finding::AlteredMentalStatus);
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RuleCatalog;
    use crate::vitals::evaluate_vitals;
    use triage_core::{Reading, Vitals};

    #[test]
    fn findings_follow_vital_deviations() {
        let vitals = Vitals {
            heart_rate: Some(Reading::Number(124.0)),
            blood_pressure: Some(Reading::Text("85/50".into())),
            temperature: Some(Reading::Number(39.2)),
            oxygen_saturation: Some(Reading::Number(91.0)),
            ..Vitals::default()
        };
        let catalog = RuleCatalog::standard().unwrap();
        let assessments = evaluate_vitals(&vitals, Some(70), &catalog);
        let findings = derive_findings(&assessments, "feels confused since morning");

        let found: Vec<Finding> = findings.iter().collect();
        assert_eq!(
            found,
            vec![
                Finding::Fever,
                Finding::Hypotension,
                Finding::RapidHeartRate,
                Finding::LowOxygen,
                Finding::AlteredMentalStatus,
            ]
        );
    }

    #[test]
    fn boundary_values_produce_no_findings() {
        let vitals = Vitals {
            heart_rate: Some(Reading::Number(100.0)),
            blood_pressure: Some(Reading::Text("140/90".into())),
            temperature: Some(Reading::Number(38.0)),
            ..Vitals::default()
        };
        let catalog = RuleCatalog::standard().unwrap();
        let assessments = evaluate_vitals(&vitals, Some(40), &catalog);
        assert!(derive_findings(&assessments, "mild headache").is_empty());
    }
}
