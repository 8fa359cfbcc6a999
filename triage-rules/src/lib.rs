//! Rule-based triage scoring: vital sign evaluation, symptom classification, risk
//! stratification, differential ranking, complication forecasting and the final
//! urgency aggregation, driven by a loadable [`RuleCatalog`].

use serde::Deserialize;
use serde_json::Value;
use triage_core::{FinalRecommendation, PatientRecord, TriageConfig, TriageError};

pub mod advisory;
pub mod aggregate;
pub mod catalog;
pub mod complications;
pub mod differential;
pub mod findings;
mod pipeline;
pub mod risk;
pub mod symptoms;
pub mod vitals;

pub use advisory::{advise, AdvisoryInput};
pub use aggregate::{assemble, resolve_urgency, StageOutputs, UrgencyDecision};
pub use catalog::{CatalogBuilder, RuleCatalog};
pub use complications::forecast_complications;
pub use differential::rank_differentials;
pub use findings::derive_findings;
pub use pipeline::TriagePipeline;
pub use risk::score_risk;
pub use symptoms::classify_symptoms;
pub use vitals::evaluate_vitals;

/// Assess a patient from a JSON string.
pub fn assess_patient_str(
    patient_json: &str,
    config: &TriageConfig,
) -> Result<FinalRecommendation, TriageError> {
    let value: Value =
        serde_json::from_str(patient_json).map_err(|err| TriageError::Parse(err.to_string()))?;
    assess_patient_value(&value, config)
}

/// Assess a patient from a `serde_json::Value`.
pub fn assess_patient_value(
    patient: &Value,
    config: &TriageConfig,
) -> Result<FinalRecommendation, TriageError> {
    let record = parse_record(patient)?;
    TriagePipeline::from_config(config.clone())?.run(&record)
}

/// Decode a patient record. Only shape errors fail; clinical oddities are left to the stages.
pub fn parse_record(patient: &Value) -> Result<PatientRecord, TriageError> {
    if !patient.is_object() {
        return Err(TriageError::InvalidRecord(
            "Expected a JSON object for the patient record".to_string(),
        ));
    }
    PatientRecord::deserialize(patient).map_err(|err| match err.classify() {
        serde_json::error::Category::Data => TriageError::InvalidRecord(err.to_string()),
        _ => TriageError::Parse(err.to_string()),
    })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
