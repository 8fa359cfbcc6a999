use triage_core::SymptomProfile;

use crate::catalog::RuleCatalog;

/// Groups symptom phrases into clinical categories and flags critical ones.
///
/// Matching is a case-insensitive substring test of each catalog phrase against the
/// normalized symptom text, so a phrase may land in several categories.
pub fn classify_symptoms(symptom_text: &str, catalog: &RuleCatalog) -> SymptomProfile {
    let contains = |phrase: &String| symptom_text.contains(&phrase.to_lowercase());

    let categories = catalog
        .symptom_categories
        .iter()
        .filter_map(|(category, phrases)| {
            let matched: Vec<String> = phrases.iter().filter(|p| contains(p)).cloned().collect();
            (!matched.is_empty()).then(|| (category.clone(), matched))
        })
        .collect();

    let critical_symptoms: Vec<String> = catalog
        .critical_symptoms
        .iter()
        .filter(|p| contains(p))
        .cloned()
        .collect();

    SymptomProfile {
        categories,
        critical_present: !critical_symptoms.is_empty(),
        critical_symptoms,
    }
}
