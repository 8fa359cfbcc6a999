use std::collections::BTreeMap;

use triage_core::{
    FollowupItem, FollowupPlan, Gender, Problem, SpecialConsideration, TreatmentPlan,
};

use super::AdvisoryInput;
use crate::catalog::{FollowupStage, RuleCatalog};
use crate::round2;

const SHORT_TERM_START_HOURS: u32 = 24;
const LONG_TERM_START_HOURS: u32 = 168;

const VITAL_SIGN_PARAMETERS: [&str; 5] = [
    "heart_rate",
    "blood_pressure",
    "temperature",
    "respiratory_rate",
    "oxygen_saturation",
];

const MEDICATION_RESPONSE: [(&str, [&str; 2]); 4] = [
    ("aspirin", ["bleeding_signs", "platelet_function"]),
    ("nitroglycerin", ["blood_pressure", "headache"]),
    ("oxygen", ["oxygen_saturation", "respiratory_status"]),
    ("ace inhibitors", ["renal_function", "potassium_levels"]),
];

/// Follow-up schedule with start offsets relative to the triage, not wall-clock times.
pub fn plan_followup(
    input: &AdvisoryInput<'_>,
    problems: &[Problem],
    treatment: &TreatmentPlan,
    catalog: &RuleCatalog,
) -> FollowupPlan {
    let risk_score = input.risk.risk_score;
    let mut plan = FollowupPlan::default();

    for problem in problems {
        let Some(protocol) = catalog.followup_protocols.get(problem) else {
            continue;
        };
        let mut immediate = item(*problem, &protocol.immediate, 0);
        adjust_for_risk(&mut immediate, risk_score);
        plan.immediate.push(immediate);
        plan.short_term
            .push(item(*problem, &protocol.short_term, SHORT_TERM_START_HOURS));
        plan.long_term
            .push(item(*problem, &protocol.long_term, LONG_TERM_START_HOURS));
    }

    plan.monitoring_parameters = monitoring_parameters(problems, treatment);
    plan.special_considerations = special_considerations(input);
    plan.confidence_score = if problems.is_empty() {
        0.4
    } else {
        round2((0.75 + 0.05 * problems.len() as f64).min(0.95))
    };
    plan
}

fn item(problem: Problem, stage: &FollowupStage, starts_after_hours: u32) -> FollowupItem {
    FollowupItem {
        problem,
        frequency: stage.frequency.clone(),
        duration: stage.duration.clone(),
        parameters: stage.parameters.clone(),
        urgency: stage.urgency.clone(),
        starts_after_hours,
    }
}

/// High risk tightens immediate follow-up to hourly; moderate risk halves long intervals.
fn adjust_for_risk(item: &mut FollowupItem, risk_score: f64) {
    if risk_score > 0.7 {
        item.frequency = "1 hour".to_string();
        item.urgency = "continuous".to_string();
    } else if risk_score > 0.4 && matches!(item.frequency.as_str(), "4 hours" | "6 hours" | "8 hours")
    {
        item.frequency = "2 hours".to_string();
    }
}

fn monitoring_parameters(
    problems: &[Problem],
    treatment: &TreatmentPlan,
) -> BTreeMap<String, Vec<String>> {
    let mut parameters = BTreeMap::new();
    parameters.insert("vital_signs".to_string(), owned(&VITAL_SIGN_PARAMETERS));

    for problem in problems {
        let (group, items): (&str, [&str; 3]) = match problem {
            Problem::ChestPain => ("cardiac", ["ecg", "cardiac_enzymes", "chest_pain_scale"]),
            Problem::ShortnessOfBreath => (
                "respiratory",
                ["oxygen_saturation", "respiratory_rate", "breath_sounds"],
            ),
            Problem::Fever => (
                "infectious",
                ["temperature", "white_blood_cell_count", "inflammatory_markers"],
            ),
            Problem::Hypertension => (
                "cardiovascular",
                ["blood_pressure", "heart_rate", "renal_function"],
            ),
        };
        parameters.insert(group.to_string(), owned(&items));
    }

    let treatment_text = treatment
        .primary
        .iter()
        .chain(&treatment.secondary)
        .map(|line| line.to_lowercase())
        .collect::<Vec<_>>()
        .join(" | ");
    let mut response = Vec::new();
    for (keyword, items) in MEDICATION_RESPONSE {
        if treatment_text.contains(keyword) {
            for item in items {
                let item = item.to_string();
                if !response.contains(&item) {
                    response.push(item);
                }
            }
        }
    }
    if !response.is_empty() {
        parameters.insert("medication_response".to_string(), response);
    }

    parameters
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn special_considerations(input: &AdvisoryInput<'_>) -> Vec<SpecialConsideration> {
    let consideration = |kind: &str, text: &str, recommendation: &str| SpecialConsideration {
        kind: kind.to_string(),
        consideration: text.to_string(),
        recommendation: recommendation.to_string(),
    };
    let mut considerations = Vec::new();

    if let Some(age) = input.record.known_age() {
        if age > 65 {
            considerations.push(consideration(
                "geriatric",
                "Increased fall risk",
                "Implement fall precautions and assess mobility",
            ));
        }
        if age > 75 {
            considerations.push(consideration(
                "polypharmacy",
                "Polypharmacy risk",
                "Review all medications for interactions and appropriateness",
            ));
        }
        if input.record.gender == Gender::Female && (12..=50).contains(&age) {
            considerations.push(consideration(
                "reproductive_health",
                "Reproductive health considerations",
                "Consider pregnancy testing before initiating new medications",
            ));
        }
    }

    let risk_score = input.risk.risk_score;
    if risk_score > 0.7 {
        considerations.push(consideration(
            "high_risk",
            "High risk of clinical deterioration",
            "Keep an escalation plan in place and reassess frequently",
        ));
    } else if risk_score > 0.4 {
        considerations.push(consideration(
            "moderate_risk",
            "Moderate risk of clinical deterioration",
            "Reassess within 4 hours",
        ));
    }

    considerations
}
