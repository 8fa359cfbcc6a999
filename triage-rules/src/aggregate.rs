use triage_core::{
    AdvisoryBundle, ClinicalFindings, ComplicationPrediction, DifferentialEntry, Escalation,
    EscalationSignal, FinalRecommendation, RiskAssessment, RiskLevel, SymptomProfile,
    UrgencyLevel, VitalAssessment,
};

/// Minimum urgency forced by a high-risk complication or a critical symptom.
const ESCALATION_FLOOR: UrgencyLevel = UrgencyLevel::Orange;

/// Outputs of the scoring stages, consumed by [`assemble`].
#[derive(Debug, Clone)]
pub struct StageOutputs {
    pub risk: RiskAssessment,
    pub vital_assessments: Vec<VitalAssessment>,
    pub symptom_profile: SymptomProfile,
    pub clinical_findings: ClinicalFindings,
    pub differentials: Vec<DifferentialEntry>,
    pub complications: Vec<ComplicationPrediction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrgencyDecision {
    pub level: UrgencyLevel,
    pub escalations: Vec<Escalation>,
}

/// Maps the risk category to a base urgency, then applies independent escalation
/// signals. Urgency only ever rises.
pub fn resolve_urgency(
    risk: &RiskAssessment,
    profile: &SymptomProfile,
    complications: &[ComplicationPrediction],
) -> UrgencyDecision {
    let base = UrgencyLevel::from_risk_category(risk.risk_category);
    let mut escalations = vec![Escalation {
        signal: EscalationSignal::RiskCategory,
        level: base,
        detail: format!(
            "Risk category {:?} (score {:.3})",
            risk.risk_category, risk.risk_score
        ),
    }];

    let high_risk: Vec<&str> = complications
        .iter()
        .filter(|c| c.risk_level == RiskLevel::High)
        .map(|c| c.complication.as_str())
        .collect();
    if !high_risk.is_empty() {
        escalations.push(Escalation {
            signal: EscalationSignal::HighRiskComplication,
            level: ESCALATION_FLOOR,
            detail: format!("High-risk complications: {}", high_risk.join(", ")),
        });
    }

    if profile.critical_present {
        escalations.push(Escalation {
            signal: EscalationSignal::CriticalSymptom,
            level: ESCALATION_FLOOR,
            detail: format!(
                "Critical symptoms: {}",
                profile.critical_symptoms.join(", ")
            ),
        });
    }

    let level = escalations
        .iter()
        .map(|escalation| escalation.level)
        .max()
        .unwrap_or(base);

    UrgencyDecision { level, escalations }
}

pub fn assemble(
    outputs: StageOutputs,
    urgency: UrgencyDecision,
    advisory: Option<AdvisoryBundle>,
) -> FinalRecommendation {
    let (action, next_steps) = response_for(urgency.level);
    FinalRecommendation {
        urgency_level: urgency.level,
        priority: urgency.level.priority(),
        recommended_action: action.to_string(),
        next_steps: next_steps.iter().map(|step| step.to_string()).collect(),
        escalations: urgency.escalations,
        insufficient_data: outputs.risk.insufficient_data,
        risk_assessment: outputs.risk,
        vital_assessments: outputs.vital_assessments,
        symptom_profile: outputs.symptom_profile,
        clinical_findings: outputs.clinical_findings,
        differential_diagnosis: outputs.differentials,
        complication_predictions: outputs.complications,
        advisory,
    }
}

const RED_STEPS: &[&str] = &[
    "Contact emergency services immediately",
    "Begin continuous monitoring of vital signs",
    "Prepare for emergency department handover",
    "Document all findings in patient record",
];

const ORANGE_STEPS: &[&str] = &[
    "Arrange urgent clinician assessment",
    "Repeat vital signs every 15 minutes",
    "Consider specialist consultation",
    "Document all findings in patient record",
];

const YELLOW_STEPS: &[&str] = &[
    "Schedule appointment with healthcare provider within 24 hours",
    "Repeat vital signs within 4 hours",
    "Document all findings in patient record",
];

const GREEN_STEPS: &[&str] = &[
    "Monitor symptoms and follow up if they worsen",
    "Provide self-care guidance",
    "Document all findings in patient record",
];

fn response_for(level: UrgencyLevel) -> (&'static str, &'static [&'static str]) {
    match level {
        UrgencyLevel::Red => ("Immediate medical attention required", RED_STEPS),
        UrgencyLevel::Orange => ("Urgent evaluation within 1 hour", ORANGE_STEPS),
        UrgencyLevel::Yellow => ("Prompt medical evaluation recommended", YELLOW_STEPS),
        UrgencyLevel::Green => ("Routine care recommended", GREEN_STEPS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{BodySystem, RiskCategory, RiskContributions, RiskFactors};

    fn risk(category: RiskCategory, score: f64) -> RiskAssessment {
        RiskAssessment {
            risk_score: score,
            risk_category: category,
            factors: RiskFactors::default(),
            contributions: RiskContributions::default(),
            explanation: String::new(),
            insufficient_data: false,
        }
    }

    fn complication(level: RiskLevel) -> ComplicationPrediction {
        ComplicationPrediction {
            complication: "Cardiac Complications".into(),
            key: "cardiac_complications".into(),
            system: BodySystem::Cardiac,
            risk_score: 0.7,
            risk_level: level,
            risk_factors_present: vec![],
            indicators_present: vec![],
            prevention_strategies: vec![],
            monitoring_recommendations: String::new(),
        }
    }

    #[test]
    fn base_urgency_follows_category() {
        let decision = resolve_urgency(
            &risk(RiskCategory::Moderate, 0.4),
            &SymptomProfile::default(),
            &[],
        );
        assert_eq!(decision.level, UrgencyLevel::Yellow);
        assert_eq!(decision.escalations.len(), 1);
    }

    #[test]
    fn high_complication_escalates_to_orange() {
        let decision = resolve_urgency(
            &risk(RiskCategory::Low, 0.1),
            &SymptomProfile::default(),
            &[complication(RiskLevel::High)],
        );
        assert_eq!(decision.level, UrgencyLevel::Orange);
        assert_eq!(
            decision.escalations[1].signal,
            EscalationSignal::HighRiskComplication
        );
    }

    #[test]
    fn critical_symptom_escalates_but_never_lowers() {
        let profile = SymptomProfile {
            critical_present: true,
            critical_symptoms: vec!["seizure".into()],
            ..SymptomProfile::default()
        };
        let low = resolve_urgency(&risk(RiskCategory::Low, 0.1), &profile, &[]);
        assert_eq!(low.level, UrgencyLevel::Orange);

        let critical = resolve_urgency(&risk(RiskCategory::Critical, 0.9), &profile, &[]);
        assert_eq!(critical.level, UrgencyLevel::Red);
    }

    #[test]
    fn moderate_complication_does_not_escalate() {
        let decision = resolve_urgency(
            &risk(RiskCategory::Low, 0.1),
            &SymptomProfile::default(),
            &[complication(RiskLevel::Moderate)],
        );
        assert_eq!(decision.level, UrgencyLevel::Green);
    }

    #[test]
    fn every_level_has_a_response() {
        for level in [
            UrgencyLevel::Green,
            UrgencyLevel::Yellow,
            UrgencyLevel::Orange,
            UrgencyLevel::Red,
        ] {
            let (action, steps) = response_for(level);
            assert!(!action.is_empty());
            assert!(!steps.is_empty());
        }
    }
}
