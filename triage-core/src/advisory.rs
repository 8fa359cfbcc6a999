use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Severity;

/// Vấn đề lâm sàng được các agent tư vấn nhận diện.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Problem {
    ChestPain,
    ShortnessOfBreath,
    Fever,
    Hypertension,
}

impl Problem {
    pub fn label(self) -> &'static str {
        match self {
            Problem::ChestPain => "chest pain",
            Problem::ShortnessOfBreath => "shortness of breath",
            Problem::Fever => "fever",
            Problem::Hypertension => "hypertension",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentUrgency {
    Immediate,
    Urgent,
    Prompt,
    Routine,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContraindicationNote {
    pub medication: String,
    pub reason: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentRationale {
    /// `None` nghĩa là chăm sóc hỗ trợ chung.
    pub problem: Option<Problem>,
    pub guideline_reference: String,
    pub urgency: TreatmentUrgency,
}

/// Kế hoạch điều trị gợi ý.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TreatmentPlan {
    pub problems: Vec<Problem>,
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    pub follow_up: Vec<String>,
    pub contraindication_notes: Vec<ContraindicationNote>,
    pub rationale: Vec<TreatmentRationale>,
    pub confidence_score: f64,
}

/// Một mốc theo dõi. Thời điểm bắt đầu tính tương đối để kết quả không phụ thuộc đồng hồ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowupItem {
    pub problem: Problem,
    pub frequency: String,
    pub duration: String,
    pub parameters: Vec<String>,
    pub urgency: String,
    pub starts_after_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialConsideration {
    pub kind: String,
    pub consideration: String,
    pub recommendation: String,
}

/// Lịch theo dõi sau triage.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FollowupPlan {
    pub immediate: Vec<FollowupItem>,
    pub short_term: Vec<FollowupItem>,
    pub long_term: Vec<FollowupItem>,
    pub monitoring_parameters: BTreeMap<String, Vec<String>>,
    pub special_considerations: Vec<SpecialConsideration>,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Safe,
    Caution,
    Unsafe,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugInteraction {
    pub drug: String,
    pub interacting_drug: String,
    pub severity: Severity,
    pub description: String,
    pub management: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contraindication {
    pub medication: String,
    pub condition: String,
    pub description: String,
    pub reason: String,
    /// Chống chỉ định tuyệt đối (chảy máu, bệnh gan nặng, thai kỳ...).
    pub major: bool,
}

/// Báo cáo an toàn thuốc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugSafetyReport {
    pub safety_level: SafetyLevel,
    pub proposed_medications: Vec<String>,
    pub interactions: Vec<DrugInteraction>,
    pub contraindications: Vec<Contraindication>,
    pub recommendations: Vec<String>,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReferralUrgency {
    Immediate,
    Urgent,
    Routine,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Referral {
    pub specialty: String,
    pub reason: String,
    pub urgency: ReferralUrgency,
    pub timeframe: String,
    pub preparation: String,
}

/// Đề xuất hội chẩn chuyên khoa.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialistReferrals {
    pub complexity: ComplexityLevel,
    pub complexity_score: u32,
    pub referrals: Vec<Referral>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityIssue {
    pub kind: String,
    pub description: String,
    pub severity: Severity,
}

/// Đánh giá chất lượng khuyến nghị: đầy đủ, nhất quán và an toàn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityReport {
    pub overall_score: f64,
    pub completeness: f64,
    pub consistency: f64,
    pub safety: f64,
    pub issues: Vec<QualityIssue>,
    pub assessment: String,
    pub suggestions: Vec<String>,
}

/// Kết quả của các agent tư vấn bổ sung.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvisoryBundle {
    pub treatment: TreatmentPlan,
    pub followup: FollowupPlan,
    pub drug_safety: DrugSafetyReport,
    pub specialists: SpecialistReferrals,
    pub quality: QualityReport,
}
