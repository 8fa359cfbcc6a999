//! Versioned clinical rule data: normal ranges, symptom dictionaries, condition and
//! complication profiles, and the tables used by the advisory agents.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use triage_core::{
    BodySystem, Finding, Gender, NormalRange, Problem, Severity, TriageError, UrgencyLevel,
    VitalKind,
};

const STANDARD_CATALOG: &str = include_str!("../catalog/standard.json");

/// Age bracket used to pick a normal range. Adult ranges carry no bracket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    /// Under one year.
    Infant,
    /// One to twelve years.
    Child,
}

impl AgeBracket {
    pub fn for_age(age: Option<u32>) -> Option<Self> {
        match age? {
            0 => Some(AgeBracket::Infant),
            1..=12 => Some(AgeBracket::Child),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangeRule {
    pub vital: VitalKind,
    #[serde(default)]
    pub bracket: Option<AgeBracket>,
    pub low: f64,
    pub high: f64,
}

/// Inclusive age window, defaulting to every age.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl Default for AgeRange {
    fn default() -> Self {
        Self { min: 0, max: 150 }
    }
}

impl AgeRange {
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min && age <= self.max
    }
}

/// Demographic or history multiplier applied to a condition's prevalence.
/// Every predicate that is set must hold for the multiplier to apply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrevalenceModifier {
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub history_keyword: Option<String>,
    pub multiplier: f64,
}

impl PrevalenceModifier {
    pub fn applies(&self, age: Option<u32>, gender: Gender, history: &[String]) -> bool {
        if self.min_age.is_some() || self.max_age.is_some() {
            let Some(age) = age else {
                return false;
            };
            if self.min_age.is_some_and(|min| age < min) || self.max_age.is_some_and(|max| age > max)
            {
                return false;
            }
        }
        if self.gender.is_some_and(|wanted| wanted != gender) {
            return false;
        }
        if let Some(keyword) = &self.history_keyword {
            return history_mentions(history, keyword);
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionProfile {
    pub name: String,
    /// ICD-10 code.
    pub code: String,
    #[serde(default)]
    pub system: Option<BodySystem>,
    #[serde(default)]
    pub required_symptoms: Vec<String>,
    #[serde(default)]
    pub optional_symptoms: Vec<String>,
    #[serde(default)]
    pub vital_indicators: Vec<Finding>,
    pub prevalence: f64,
    pub severity: Severity,
    #[serde(default)]
    pub age_range: AgeRange,
    #[serde(default)]
    pub modifiers: Vec<PrevalenceModifier>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// A complication risk factor, present when any of its predicates match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorRule {
    pub label: String,
    #[serde(default)]
    pub symptom_keywords: Vec<String>,
    #[serde(default)]
    pub history_keywords: Vec<String>,
    #[serde(default)]
    pub older_than: Option<u32>,
}

impl FactorRule {
    pub fn is_present(&self, symptom_text: &str, history: &[String], age: Option<u32>) -> bool {
        self.symptom_keywords
            .iter()
            .any(|keyword| symptom_text.contains(&keyword.to_lowercase()))
            || self
                .history_keywords
                .iter()
                .any(|keyword| history_mentions(history, keyword))
            || matches!((self.older_than, age), (Some(limit), Some(age)) if age > limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitoringTiers {
    pub low: String,
    pub moderate: String,
    pub high: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplicationProfile {
    pub name: String,
    pub system: BodySystem,
    #[serde(default)]
    pub risk_factors: Vec<FactorRule>,
    #[serde(default)]
    pub indicators: Vec<Finding>,
    #[serde(default)]
    pub prevention_strategies: Vec<String>,
    pub monitoring: MonitoringTiers,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TreatmentGuideline {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    pub follow_up: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowupStage {
    pub frequency: String,
    pub duration: String,
    pub parameters: Vec<String>,
    pub urgency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowupProtocol {
    pub immediate: FollowupStage,
    pub short_term: FollowupStage,
    pub long_term: FollowupStage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRule {
    pub drug: String,
    pub interacting_drug: String,
    pub severity: Severity,
    pub description: String,
    pub management: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContraindicationRule {
    pub medication: String,
    /// History conditions, written with underscores (`active_bleeding`).
    pub conditions: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timeframes {
    pub immediate: String,
    pub urgent: String,
    pub routine: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preparation {
    pub emergency: String,
    pub routine: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialtyProfile {
    pub name: String,
    #[serde(default)]
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub systems: Vec<BodySystem>,
    /// Referred whenever the final urgency reaches this level.
    #[serde(default)]
    pub min_urgency: Option<UrgencyLevel>,
    pub timeframes: Timeframes,
    pub preparation: Preparation,
}

/// Read-only rule catalog shared by every stage of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleCatalog {
    pub version: String,
    pub normal_ranges: Vec<RangeRule>,
    pub symptom_categories: BTreeMap<String, Vec<String>>,
    pub critical_symptoms: Vec<String>,
    pub chronic_history_keywords: Vec<String>,
    pub conditions: BTreeMap<String, ConditionProfile>,
    pub complications: BTreeMap<String, ComplicationProfile>,
    #[serde(default)]
    pub treatment_guidelines: BTreeMap<Problem, TreatmentGuideline>,
    #[serde(default)]
    pub followup_protocols: BTreeMap<Problem, FollowupProtocol>,
    #[serde(default)]
    pub medication_keywords: Vec<String>,
    #[serde(default)]
    pub drug_interactions: Vec<InteractionRule>,
    #[serde(default)]
    pub contraindications: Vec<ContraindicationRule>,
    #[serde(default)]
    pub major_contraindications: Vec<String>,
    #[serde(default)]
    pub specialties: BTreeMap<String, SpecialtyProfile>,
}

impl RuleCatalog {
    /// The built-in catalog (`standard-1`).
    pub fn standard() -> Result<Self, TriageError> {
        Self::from_json_str(STANDARD_CATALOG)
    }

    pub fn from_json_str(json: &str) -> Result<Self, TriageError> {
        let catalog: RuleCatalog =
            serde_json::from_str(json).map_err(|err| TriageError::Catalog(err.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| TriageError::Io(format!("{}: {err}", path.display())))?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            version = %catalog.version,
            conditions = catalog.conditions.len(),
            "loaded rule catalog"
        );
        Ok(catalog)
    }

    /// Range for the patient's age bracket, falling back to the adult range.
    pub fn normal_range(&self, vital: VitalKind, age: Option<u32>) -> Option<NormalRange> {
        let bracket = AgeBracket::for_age(age);
        let lookup = |wanted: Option<AgeBracket>| {
            self.normal_ranges
                .iter()
                .find(|rule| rule.vital == vital && rule.bracket == wanted)
                .map(|rule| NormalRange::new(rule.low, rule.high))
        };
        bracket.and_then(|b| lookup(Some(b))).or_else(|| lookup(None))
    }

    pub fn is_major_contraindication(&self, condition: &str) -> bool {
        self.major_contraindications
            .iter()
            .any(|major| major == condition)
    }

    pub fn validate(&self) -> Result<(), TriageError> {
        if self.version.trim().is_empty() {
            return Err(catalog_error("version must not be empty"));
        }

        // An empty phrase is a substring of every text, so it would match every patient.
        reject_blank("critical_symptoms", &self.critical_symptoms)?;
        reject_blank("chronic_history_keywords", &self.chronic_history_keywords)?;
        reject_blank("medication_keywords", &self.medication_keywords)?;
        for (category, phrases) in &self.symptom_categories {
            reject_blank(&format!("symptom category {category}"), phrases)?;
        }

        let mut seen_ranges = BTreeSet::new();
        for rule in &self.normal_ranges {
            if !(rule.low.is_finite() && rule.high.is_finite()) || rule.low > rule.high {
                return Err(catalog_error(format!(
                    "normal range for {} has low {} above high {}",
                    rule.vital.label(),
                    rule.low,
                    rule.high
                )));
            }
            if !seen_ranges.insert((rule.vital, rule.bracket)) {
                return Err(catalog_error(format!(
                    "duplicate normal range for {}",
                    rule.vital.label()
                )));
            }
        }
        if let Some(missing) = VitalKind::ALL
            .iter()
            .find(|vital| !seen_ranges.contains(&(**vital, None)))
        {
            return Err(catalog_error(format!(
                "missing adult normal range for {}",
                missing.label()
            )));
        }

        for (key, condition) in &self.conditions {
            if !(0.0..=1.0).contains(&condition.prevalence) {
                return Err(catalog_error(format!(
                    "condition {key} has prevalence {} outside [0, 1]",
                    condition.prevalence
                )));
            }
            reject_blank(&format!("condition {key}"), &condition.required_symptoms)?;
            reject_blank(&format!("condition {key}"), &condition.optional_symptoms)?;
            if condition.required_symptoms.is_empty() && condition.optional_symptoms.is_empty() {
                return Err(catalog_error(format!("condition {key} lists no symptoms")));
            }
            if condition.age_range.min > condition.age_range.max {
                return Err(catalog_error(format!("condition {key} has an empty age range")));
            }
            if let Some(modifier) = condition
                .modifiers
                .iter()
                .find(|modifier| !(modifier.multiplier.is_finite() && modifier.multiplier > 0.0))
            {
                return Err(catalog_error(format!(
                    "condition {key} has non-positive multiplier {}",
                    modifier.multiplier
                )));
            }
        }

        for (key, complication) in &self.complications {
            for factor in &complication.risk_factors {
                let owner = format!("complication {key} factor {}", factor.label);
                reject_blank(&owner, &factor.symptom_keywords)?;
                reject_blank(&owner, &factor.history_keywords)?;
            }
            if complication.risk_factors.is_empty() && complication.indicators.is_empty() {
                return Err(catalog_error(format!(
                    "complication {key} has no risk factors or indicators"
                )));
            }
        }

        Ok(())
    }
}

/// Assembles a catalog in code, rejecting duplicate keys.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    catalog: RuleCatalog,
}

impl CatalogBuilder {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            catalog: RuleCatalog {
                version: version.into(),
                normal_ranges: Vec::new(),
                symptom_categories: BTreeMap::new(),
                critical_symptoms: Vec::new(),
                chronic_history_keywords: Vec::new(),
                conditions: BTreeMap::new(),
                complications: BTreeMap::new(),
                treatment_guidelines: BTreeMap::new(),
                followup_protocols: BTreeMap::new(),
                medication_keywords: Vec::new(),
                drug_interactions: Vec::new(),
                contraindications: Vec::new(),
                major_contraindications: Vec::new(),
                specialties: BTreeMap::new(),
            },
        }
    }

    /// Starts from an existing catalog under a new version label.
    pub fn extend(base: RuleCatalog, version: impl Into<String>) -> Self {
        let mut builder = Self { catalog: base };
        builder.catalog.version = version.into();
        builder
    }

    pub fn without_conditions(mut self) -> Self {
        self.catalog.conditions.clear();
        self
    }

    pub fn without_complications(mut self) -> Self {
        self.catalog.complications.clear();
        self
    }

    pub fn normal_range(
        mut self,
        vital: VitalKind,
        bracket: Option<AgeBracket>,
        range: NormalRange,
    ) -> Self {
        self.catalog
            .normal_ranges
            .retain(|rule| !(rule.vital == vital && rule.bracket == bracket));
        self.catalog.normal_ranges.push(RangeRule {
            vital,
            bracket,
            low: range.low,
            high: range.high,
        });
        self
    }

    pub fn symptom_category<I, S>(mut self, category: &str, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.catalog.symptom_categories.insert(
            category.to_string(),
            phrases.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn critical_symptom(mut self, phrase: impl Into<String>) -> Self {
        self.catalog.critical_symptoms.push(phrase.into());
        self
    }

    pub fn chronic_history_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.catalog.chronic_history_keywords.push(keyword.into());
        self
    }

    pub fn condition(
        mut self,
        key: impl Into<String>,
        profile: ConditionProfile,
    ) -> Result<Self, TriageError> {
        let key = key.into();
        if self.catalog.conditions.contains_key(&key) {
            return Err(catalog_error(format!("duplicate condition key {key}")));
        }
        self.catalog.conditions.insert(key, profile);
        Ok(self)
    }

    pub fn complication(
        mut self,
        key: impl Into<String>,
        profile: ComplicationProfile,
    ) -> Result<Self, TriageError> {
        let key = key.into();
        if self.catalog.complications.contains_key(&key) {
            return Err(catalog_error(format!("duplicate complication key {key}")));
        }
        self.catalog.complications.insert(key, profile);
        Ok(self)
    }

    pub fn build(self) -> Result<RuleCatalog, TriageError> {
        self.catalog.validate()?;
        Ok(self.catalog)
    }
}

/// Case-insensitive match of a keyword against history entries. Underscores in the
/// keyword stand for spaces.
pub(crate) fn history_mentions(history: &[String], keyword: &str) -> bool {
    let needle = keyword.replace('_', " ").to_lowercase();
    history
        .iter()
        .any(|item| item.replace('_', " ").to_lowercase().contains(&needle))
}

fn catalog_error(message: impl Into<String>) -> TriageError {
    TriageError::Catalog(message.into())
}

fn reject_blank(owner: &str, phrases: &[String]) -> Result<(), TriageError> {
    if phrases.iter().any(|phrase| phrase.trim().is_empty()) {
        return Err(catalog_error(format!("{owner} contains a blank phrase")));
    }
    Ok(())
}
