use triage_core::{
    ComplexityLevel, Problem, Referral, ReferralUrgency, RiskLevel, Severity,
    SpecialistReferrals, UrgencyLevel,
};

use super::{critical_vitals, AdvisoryInput};
use crate::catalog::{RuleCatalog, SpecialtyProfile};

const HIGH_COMPLEXITY: u32 = 10;
const MODERATE_COMPLEXITY: u32 = 6;
const DIFFERENTIALS_CONSIDERED: usize = 3;

/// Specialty referrals for the case, with a complexity grade.
pub fn recommend_specialists(
    input: &AdvisoryInput<'_>,
    problems: &[Problem],
    catalog: &RuleCatalog,
) -> SpecialistReferrals {
    let complexity_score = complexity_score(input, problems);
    let complexity = if complexity_score >= HIGH_COMPLEXITY {
        ComplexityLevel::High
    } else if complexity_score >= MODERATE_COMPLEXITY {
        ComplexityLevel::Moderate
    } else {
        ComplexityLevel::Low
    };

    let urgency = referral_urgency(input.urgency);
    let referrals = catalog
        .specialties
        .values()
        .filter_map(|specialty| {
            let reasons = referral_reasons(specialty, input, problems, catalog);
            (!reasons.is_empty()).then(|| Referral {
                specialty: specialty.name.clone(),
                reason: reasons.join("; "),
                urgency,
                timeframe: match urgency {
                    ReferralUrgency::Immediate => specialty.timeframes.immediate.clone(),
                    ReferralUrgency::Urgent => specialty.timeframes.urgent.clone(),
                    ReferralUrgency::Routine => specialty.timeframes.routine.clone(),
                },
                preparation: match urgency {
                    ReferralUrgency::Routine => specialty.preparation.routine.clone(),
                    _ => specialty.preparation.emergency.clone(),
                },
            })
        })
        .collect();

    SpecialistReferrals {
        complexity,
        complexity_score,
        referrals,
    }
}

fn referral_urgency(level: UrgencyLevel) -> ReferralUrgency {
    match level {
        UrgencyLevel::Red => ReferralUrgency::Immediate,
        UrgencyLevel::Orange => ReferralUrgency::Urgent,
        UrgencyLevel::Yellow | UrgencyLevel::Green => ReferralUrgency::Routine,
    }
}

fn complexity_score(input: &AdvisoryInput<'_>, problems: &[Problem]) -> u32 {
    let risk_score = input.risk.risk_score;
    let mut score = if risk_score > 0.85 {
        4
    } else if risk_score > 0.7 {
        3
    } else if risk_score > 0.5 {
        2
    } else if risk_score > 0.3 {
        1
    } else {
        0
    };

    score += problems.len() as u32;
    score += input
        .differentials
        .iter()
        .take(DIFFERENTIALS_CONSIDERED)
        .map(|entry| match entry.severity {
            Severity::Critical => 2,
            Severity::High => 1,
            Severity::Moderate | Severity::Low => 0,
        })
        .sum::<u32>();
    score += critical_vitals(input)
        .iter()
        .map(|vital| if vital.severe { 2 } else { 1 })
        .sum::<u32>();
    score += 2 * input
        .complications
        .iter()
        .filter(|prediction| prediction.risk_level == RiskLevel::High)
        .count() as u32;
    score
}

fn referral_reasons(
    specialty: &SpecialtyProfile,
    input: &AdvisoryInput<'_>,
    problems: &[Problem],
    catalog: &RuleCatalog,
) -> Vec<String> {
    let mut reasons = Vec::new();

    for problem in problems.iter().filter(|p| specialty.problems.contains(p)) {
        reasons.push(format!("Presenting with {}", problem.label()));
    }

    for entry in input.differentials.iter().take(DIFFERENTIALS_CONSIDERED) {
        let system = catalog
            .conditions
            .get(&entry.key)
            .and_then(|profile| profile.system);
        if system.is_some_and(|system| specialty.systems.contains(&system)) {
            reasons.push(format!("Differential includes {}", entry.condition));
        }
    }

    for prediction in input.complications.iter().filter(|prediction| {
        prediction.risk_level >= RiskLevel::Moderate && specialty.systems.contains(&prediction.system)
    }) {
        reasons.push(format!(
            "{:?} risk of {}",
            prediction.risk_level, prediction.complication
        ));
    }

    if specialty
        .min_urgency
        .is_some_and(|min_urgency| input.urgency >= min_urgency)
    {
        reasons.push(format!("Urgency level {:?}", input.urgency));
    }

    reasons
}
