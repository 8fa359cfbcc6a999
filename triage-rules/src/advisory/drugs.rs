use triage_core::{
    Contraindication, DrugInteraction, DrugSafetyReport, Gender, SafetyLevel, Severity,
    TreatmentPlan, VitalKind,
};

use super::AdvisoryInput;
use crate::catalog::{history_mentions, RuleCatalog};
use crate::round2;

/// Screens medications named in the treatment plan against current medications,
/// history, demographics, presenting symptoms and blood pressure.
pub fn screen_medications(
    input: &AdvisoryInput<'_>,
    treatment: &TreatmentPlan,
    catalog: &RuleCatalog,
) -> DrugSafetyReport {
    let proposed = proposed_medications(treatment, catalog);
    let current: Vec<String> = input
        .record
        .current_medications
        .iter()
        .map(|medication| medication.trim().to_lowercase())
        .filter(|medication| !medication.is_empty())
        .collect();

    let interactions = find_interactions(&proposed, &current, catalog);
    let contraindications = find_contraindications(&proposed, input, catalog);

    let major_count = contraindications.iter().filter(|c| c.major).count();
    let high_interactions = interactions
        .iter()
        .filter(|i| i.severity <= Severity::High)
        .count();
    let safety_level = if high_interactions > 0 || major_count > 0 {
        SafetyLevel::Unsafe
    } else if !interactions.is_empty() || !contraindications.is_empty() {
        SafetyLevel::Caution
    } else {
        SafetyLevel::Safe
    };

    let recommendations = recommendations(&interactions, &contraindications);
    let total = interactions.len() + contraindications.len();
    let confidence_score = if high_interactions + major_count > 0 {
        round2((0.85 + 0.05 * (high_interactions + major_count) as f64).min(0.95))
    } else if total > 5 {
        round2((0.85 - 0.03 * total as f64).max(0.6))
    } else {
        0.85
    };

    if safety_level == SafetyLevel::Unsafe {
        tracing::warn!(
            interactions = interactions.len(),
            contraindications = contraindications.len(),
            "unsafe medication combination in treatment plan"
        );
    }

    DrugSafetyReport {
        safety_level,
        proposed_medications: proposed,
        interactions,
        contraindications,
        recommendations,
        confidence_score,
    }
}

fn proposed_medications(treatment: &TreatmentPlan, catalog: &RuleCatalog) -> Vec<String> {
    let text = treatment
        .primary
        .iter()
        .chain(&treatment.secondary)
        .chain(&treatment.follow_up)
        .map(|line| line.to_lowercase())
        .collect::<Vec<_>>()
        .join(" | ");
    catalog
        .medication_keywords
        .iter()
        .filter(|keyword| text.contains(&keyword.to_lowercase()))
        .cloned()
        .collect()
}

fn find_interactions(
    proposed: &[String],
    current: &[String],
    catalog: &RuleCatalog,
) -> Vec<DrugInteraction> {
    catalog
        .drug_interactions
        .iter()
        .filter(|rule| proposed.contains(&rule.drug))
        .filter(|rule| {
            proposed.contains(&rule.interacting_drug)
                || current
                    .iter()
                    .any(|medication| medication.contains(&rule.interacting_drug))
        })
        .map(|rule| DrugInteraction {
            drug: rule.drug.clone(),
            interacting_drug: rule.interacting_drug.clone(),
            severity: rule.severity,
            description: rule.description.clone(),
            management: rule.management.clone(),
        })
        .collect()
}

fn find_contraindications(
    proposed: &[String],
    input: &AdvisoryInput<'_>,
    catalog: &RuleCatalog,
) -> Vec<Contraindication> {
    let record = input.record;
    let mut found = Vec::new();
    let mut flag = |medication: &str, condition: &str, description: &str, reason: String| {
        found.push(Contraindication {
            medication: medication.to_string(),
            condition: condition.to_string(),
            description: description.to_string(),
            reason,
            major: catalog.is_major_contraindication(condition),
        });
    };

    for rule in catalog
        .contraindications
        .iter()
        .filter(|rule| proposed.contains(&rule.medication))
    {
        for condition in &rule.conditions {
            if history_mentions(&record.medical_history, condition) {
                flag(
                    &rule.medication,
                    condition,
                    &rule.description,
                    format!("History of {}", condition.replace('_', " ")),
                );
            }
        }
    }

    let age = record.known_age();
    let systolic = input.vital(VitalKind::SystolicBloodPressure);
    let active_bleeding = input.symptom_text.contains("active bleeding");

    for medication in proposed {
        let medication = medication.as_str();
        if age.is_some_and(|age| age > 75) && matches!(medication, "aspirin" | "warfarin") {
            flag(
                medication,
                "advanced_age",
                "Increased bleeding risk in elderly patients",
                "Patient age > 75 years".to_string(),
            );
        }
        if record.gender == Gender::Female
            && age.is_some_and(|age| (12..=50).contains(&age))
            && matches!(medication, "ace inhibitors" | "arb")
        {
            flag(
                medication,
                "pregnancy_potential",
                "Contraindicated in pregnancy",
                "Female patient of childbearing age".to_string(),
            );
        }
        if active_bleeding && matches!(medication, "aspirin" | "warfarin" | "clopidogrel") {
            flag(
                medication,
                "active_bleeding",
                "Contraindicated in active bleeding",
                "Patient presenting with active bleeding".to_string(),
            );
        }
        if systolic.is_some_and(|s| s < 80.0)
            && matches!(medication, "nitroglycerin" | "ace inhibitors")
        {
            flag(
                medication,
                "severe_hypotension",
                "Contraindicated in severe hypotension",
                "Patient has severe hypotension".to_string(),
            );
        }
    }

    found
}

fn recommendations(
    interactions: &[DrugInteraction],
    contraindications: &[Contraindication],
) -> Vec<String> {
    let mut lines = Vec::new();

    let (high, moderate): (Vec<_>, Vec<_>) = interactions
        .iter()
        .partition(|interaction| interaction.severity <= Severity::High);
    for interaction in high {
        lines.push(format!(
            "CONTRAINDICATED: {} with {} - {}. {}",
            interaction.drug,
            interaction.interacting_drug,
            interaction.description,
            interaction.management
        ));
    }
    for interaction in moderate {
        lines.push(format!(
            "CAUTION: {} with {} - {}. {}",
            interaction.drug,
            interaction.interacting_drug,
            interaction.description,
            interaction.management
        ));
    }

    let (major, minor): (Vec<_>, Vec<_>) = contraindications.iter().partition(|c| c.major);
    for contraindication in major {
        lines.push(format!(
            "CONTRAINDICATED: {} - {}. Reason: {}",
            contraindication.medication, contraindication.description, contraindication.reason
        ));
    }
    for contraindication in minor {
        lines.push(format!(
            "CAUTION: {} - {}. Reason: {}",
            contraindication.medication, contraindication.description, contraindication.reason
        ));
    }

    let closing: [&str; 3] = if lines.is_empty() {
        [
            "No significant drug interactions or contraindications identified.",
            "Continue with prescribed treatment plan.",
            "Monitor patient for expected therapeutic response and adverse effects.",
        ]
    } else {
        [
            "Consult with clinical pharmacist for detailed review of identified interactions.",
            "Monitor patient closely for adverse effects and therapeutic response.",
            "Document all findings in patient medical record and communicate with prescribing physician.",
        ]
    };
    lines.extend(closing.iter().map(|line| line.to_string()));
    lines
}
