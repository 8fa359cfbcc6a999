use triage_core::{FinalRecommendation, PatientRecord, TriageConfig, TriageError};

use crate::advisory::{advise, AdvisoryInput};
use crate::aggregate::{assemble, resolve_urgency, StageOutputs};
use crate::catalog::RuleCatalog;
use crate::complications::forecast_complications;
use crate::differential::rank_differentials;
use crate::findings::derive_findings;
use crate::risk::score_risk;
use crate::symptoms::classify_symptoms;
use crate::vitals::evaluate_vitals;

const MAX_AGE: u32 = 150;

/// Configured scoring pipeline. Holds no mutable state, so one instance can serve
/// any number of records concurrently.
#[derive(Debug, Clone)]
pub struct TriagePipeline {
    config: TriageConfig,
    catalog: RuleCatalog,
}

impl TriagePipeline {
    pub fn new(config: TriageConfig, catalog: RuleCatalog) -> Result<Self, TriageError> {
        if !config.risk_thresholds.is_valid() {
            return Err(TriageError::Other(format!(
                "Risk thresholds must increase within (0, 1]: {:?}",
                config.risk_thresholds
            )));
        }
        let weights = config.risk_weights;
        let all_weights = [
            weights.age_max,
            weights.vitals_cap,
            weights.critical_symptom,
            weights.categorized_symptom,
            weights.symptoms_cap,
            weights.history_item,
            weights.history_cap,
        ];
        if all_weights.iter().any(|w| !w.is_finite() || *w < 0.0) || weights.max_total() <= 0.0 {
            return Err(TriageError::Other(format!(
                "Risk weights must be non-negative with a positive total: {weights:?}"
            )));
        }
        if !(0.0..=1.0).contains(&config.min_complication_score) {
            return Err(TriageError::Other(format!(
                "min_complication_score must lie in [0, 1], got {}",
                config.min_complication_score
            )));
        }
        Ok(Self { config, catalog })
    }

    /// Uses `config.catalog_path` when set, the built-in catalog otherwise.
    pub fn from_config(config: TriageConfig) -> Result<Self, TriageError> {
        let catalog = match &config.catalog_path {
            Some(path) => RuleCatalog::load(path)?,
            None => RuleCatalog::standard()?,
        };
        Self::new(config, catalog)
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn run(&self, record: &PatientRecord) -> Result<FinalRecommendation, TriageError> {
        if let Some(age) = record.age.filter(|age| *age > MAX_AGE) {
            return Err(TriageError::InvalidRecord(format!(
                "Age {age} is outside 0-{MAX_AGE}"
            )));
        }

        let span = tracing::debug_span!("triage", catalog = %self.catalog.version);
        let _guard = span.enter();

        let catalog = &self.catalog;
        let text = record.symptoms.normalized_text();

        let vital_assessments = evaluate_vitals(&record.vitals, record.age, catalog);
        let symptom_profile = classify_symptoms(&text, catalog);
        let clinical_findings = derive_findings(&vital_assessments, &text);
        tracing::debug!(
            abnormal = vital_assessments.iter().filter(|a| a.is_abnormal()).count(),
            categories = symptom_profile.categories.len(),
            critical = symptom_profile.critical_present,
            "inputs normalized"
        );

        let risk = score_risk(
            record,
            &vital_assessments,
            &symptom_profile,
            catalog,
            &self.config,
        );
        let differentials = rank_differentials(
            record,
            &text,
            &clinical_findings,
            catalog,
            self.config.max_differentials,
        );
        let complications = forecast_complications(
            record,
            &text,
            &clinical_findings,
            catalog,
            self.config.min_complication_score,
        );
        tracing::debug!(
            risk = risk.risk_score,
            differentials = differentials.len(),
            complications = complications.len(),
            "scoring completed"
        );

        let urgency = resolve_urgency(&risk, &symptom_profile, &complications);

        let advisory = self.config.include_advisory.then(|| {
            advise(
                &AdvisoryInput {
                    record,
                    symptom_text: &text,
                    vital_assessments: &vital_assessments,
                    symptom_profile: &symptom_profile,
                    findings: &clinical_findings,
                    risk: &risk,
                    differentials: &differentials,
                    complications: &complications,
                    urgency: urgency.level,
                },
                catalog,
            )
        });

        tracing::info!(
            urgency = ?urgency.level,
            risk = risk.risk_score,
            insufficient_data = risk.insufficient_data,
            "triage completed"
        );

        Ok(assemble(
            StageOutputs {
                risk,
                vital_assessments,
                symptom_profile,
                clinical_findings,
                differentials,
                complications,
            },
            urgency,
            advisory,
        ))
    }
}
