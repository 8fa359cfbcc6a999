use triage_core::{
    ContraindicationNote, Gender, Problem, TreatmentPlan, TreatmentRationale, TreatmentUrgency,
};

use super::{push_unique, AdvisoryInput};
use crate::catalog::RuleCatalog;
use crate::round2;

const SUPPORTIVE_CARE: [&str; 3] = [
    "Monitor vital signs every 15 minutes",
    "Establish IV access",
    "Provide emotional support to patient",
];

/// Guideline-based treatment suggestions for the identified problems.
pub fn plan_treatment(
    input: &AdvisoryInput<'_>,
    problems: &[Problem],
    catalog: &RuleCatalog,
) -> TreatmentPlan {
    let risk_score = input.risk.risk_score;
    let mut plan = TreatmentPlan {
        problems: problems.to_vec(),
        contraindication_notes: contraindication_notes(input),
        ..TreatmentPlan::default()
    };

    for problem in problems {
        let Some(guideline) = catalog.treatment_guidelines.get(problem) else {
            continue;
        };
        push_unique(&mut plan.primary, &guideline.primary);
        push_unique(&mut plan.secondary, &guideline.secondary);
        push_unique(&mut plan.follow_up, &guideline.follow_up);
        plan.rationale.push(TreatmentRationale {
            problem: Some(*problem),
            guideline_reference: format!("Clinical guidelines for {}", problem.label()),
            urgency: treatment_urgency(*problem, risk_score),
        });
    }

    if plan.primary.is_empty() {
        plan.primary = SUPPORTIVE_CARE.iter().map(|s| s.to_string()).collect();
        plan.rationale.push(TreatmentRationale {
            problem: None,
            guideline_reference: "Standard emergency care protocols".to_string(),
            urgency: TreatmentUrgency::Routine,
        });
    }

    apply_risk_modifications(&mut plan, risk_score);
    plan.confidence_score = confidence(problems.len());
    plan
}

fn treatment_urgency(problem: Problem, risk_score: f64) -> TreatmentUrgency {
    match problem {
        Problem::ChestPain | Problem::ShortnessOfBreath => {
            if risk_score > 0.7 {
                TreatmentUrgency::Immediate
            } else if risk_score > 0.4 {
                TreatmentUrgency::Urgent
            } else {
                TreatmentUrgency::Prompt
            }
        }
        Problem::Fever | Problem::Hypertension => {
            if risk_score > 0.6 {
                TreatmentUrgency::Urgent
            } else if risk_score > 0.3 {
                TreatmentUrgency::Prompt
            } else {
                TreatmentUrgency::Routine
            }
        }
    }
}

fn apply_risk_modifications(plan: &mut TreatmentPlan, risk_score: f64) {
    let mut prepend = |items: &[&str]| {
        for (index, item) in items.iter().enumerate() {
            let item = item.to_string();
            if !plan.primary.contains(&item) {
                plan.primary.insert(index, item);
            }
        }
    };

    if risk_score > 0.7 {
        prepend(&[
            "Continuous cardiac monitoring",
            "Frequent neurologic assessments",
        ]);
        push_unique(&mut plan.secondary, &["STAT cardiac enzymes".to_string()]);
    } else if risk_score > 0.4 {
        prepend(&["Hourly vital signs monitoring"]);
        push_unique(&mut plan.secondary, &["Repeat ECG in 30 minutes".to_string()]);
    }
}

fn contraindication_notes(input: &AdvisoryInput<'_>) -> Vec<ContraindicationNote> {
    let mut notes = Vec::new();
    let Some(age) = input.record.known_age() else {
        return notes;
    };

    if age > 75 {
        notes.push(ContraindicationNote {
            medication: "aggressive antihypertensives".to_string(),
            reason: "Increased fall risk in elderly".to_string(),
            recommendation: "Use caution with blood pressure lowering agents".to_string(),
        });
    }
    if input.record.gender == Gender::Female && (12..=50).contains(&age) {
        notes.push(ContraindicationNote {
            medication: "ace inhibitors".to_string(),
            reason: "Pregnancy potential".to_string(),
            recommendation: "Verify pregnancy status before ACE inhibitor use".to_string(),
        });
    }
    notes
}

fn confidence(problem_count: usize) -> f64 {
    if problem_count == 0 {
        return 0.3;
    }
    round2((0.7 + 0.1 * problem_count as f64).min(0.95))
}
