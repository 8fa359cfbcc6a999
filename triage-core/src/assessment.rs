use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{AdvisoryBundle, RiskThresholds};

/// Loại chỉ số sống được đánh giá. Huyết áp tách thành tâm thu và tâm trương.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VitalKind {
    HeartRate,
    SystolicBloodPressure,
    DiastolicBloodPressure,
    Temperature,
    RespiratoryRate,
    OxygenSaturation,
}

impl VitalKind {
    pub const ALL: [VitalKind; 6] = [
        VitalKind::HeartRate,
        VitalKind::SystolicBloodPressure,
        VitalKind::DiastolicBloodPressure,
        VitalKind::Temperature,
        VitalKind::RespiratoryRate,
        VitalKind::OxygenSaturation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VitalKind::HeartRate => "heart_rate",
            VitalKind::SystolicBloodPressure => "systolic_blood_pressure",
            VitalKind::DiastolicBloodPressure => "diastolic_blood_pressure",
            VitalKind::Temperature => "temperature",
            VitalKind::RespiratoryRate => "respiratory_rate",
            VitalKind::OxygenSaturation => "oxygen_saturation",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            VitalKind::HeartRate => "bpm",
            VitalKind::SystolicBloodPressure | VitalKind::DiastolicBloodPressure => "mmHg",
            VitalKind::Temperature => "°C",
            VitalKind::RespiratoryRate => "breaths/min",
            VitalKind::OxygenSaturation => "%",
        }
    }
}

/// Khoảng bình thường, hai đầu bao gồm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalRange {
    pub low: f64,
    pub high: f64,
}

impl NormalRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VitalStatus {
    Normal,
    Abnormal,
    Invalid,
    NotRecorded,
}

/// Hướng lệch khỏi khoảng bình thường.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    Low,
    High,
}

/// Kết quả đánh giá một chỉ số sống.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalAssessment {
    pub vital: VitalKind,
    pub value: Option<f64>,
    /// Giá trị gốc để hiển thị, kể cả khi không hợp lệ.
    pub display: Option<String>,
    pub unit: String,
    pub normal_range: NormalRange,
    pub status: VitalStatus,
    pub deviation: Option<Deviation>,
    /// Trọng số mức độ nặng trong [0, 1]; bằng 0 khi bình thường, không hợp lệ hoặc thiếu.
    pub severity_weight: f64,
    pub clinical_significance: String,
}

impl VitalAssessment {
    pub fn is_recorded(&self) -> bool {
        self.status != VitalStatus::NotRecorded
    }

    pub fn is_abnormal(&self) -> bool {
        self.status == VitalStatus::Abnormal
    }
}

/// Ánh xạ tên nhóm lâm sàng -> các triệu chứng khớp.
pub type SymptomCategorySet = BTreeMap<String, Vec<String>>;

/// Kết quả phân loại triệu chứng.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SymptomProfile {
    pub categories: SymptomCategorySet,
    pub critical_present: bool,
    pub critical_symptoms: Vec<String>,
}

impl SymptomProfile {
    /// Số cặp (nhóm, triệu chứng); triệu chứng thuộc nhiều nhóm được đếm nhiều lần.
    pub fn category_memberships(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Các triệu chứng khác nhau đã khớp ở bất kỳ nhóm nào.
    pub fn distinct_symptoms(&self) -> BTreeSet<&str> {
        self.categories
            .values()
            .flatten()
            .map(String::as_str)
            .chain(self.critical_symptoms.iter().map(String::as_str))
            .collect()
    }
}

/// Dấu hiệu lâm sàng rút ra từ chỉ số sống và triệu chứng.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    Fever,
    HighBloodPressure,
    Hypotension,
    RapidHeartRate,
    Bradycardia,
    RapidBreathing,
    LowOxygen,
    AlteredMentalStatus,
}

impl Finding {
    pub fn label(self) -> &'static str {
        match self {
            Finding::Fever => "fever",
            Finding::HighBloodPressure => "high blood pressure",
            Finding::Hypotension => "hypotension",
            Finding::RapidHeartRate => "rapid heart rate",
            Finding::Bradycardia => "bradycardia",
            Finding::RapidBreathing => "rapid breathing",
            Finding::LowOxygen => "low oxygen",
            Finding::AlteredMentalStatus => "altered mental status",
        }
    }
}

/// Tập dấu hiệu có mặt ở bệnh nhân.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct ClinicalFindings(BTreeSet<Finding>);

impl ClinicalFindings {
    pub fn insert(&mut self, finding: Finding) {
        self.0.insert(finding);
    }

    pub fn contains(&self, finding: Finding) -> bool {
        self.0.contains(&finding)
    }

    pub fn iter(&self) -> impl Iterator<Item = Finding> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Finding> for ClinicalFindings {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Tầng nguy cơ, sắp xếp tăng dần theo mức khẩn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskCategory {
    pub fn from_score(score: f64, thresholds: &RiskThresholds) -> Self {
        if score >= thresholds.critical {
            RiskCategory::Critical
        } else if score >= thresholds.high {
            RiskCategory::High
        } else if score >= thresholds.moderate {
            RiskCategory::Moderate
        } else {
            RiskCategory::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFactor {
    pub weight: f64,
    pub description: String,
}

/// Các yếu tố góp phần vào điểm nguy cơ, theo từng nhóm.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RiskFactors {
    pub vital_risks: BTreeMap<String, RiskFactor>,
    pub symptom_risks: BTreeMap<String, RiskFactor>,
    /// Tuổi và tiền sử bệnh mạn tính.
    pub demographic_risks: BTreeMap<String, RiskFactor>,
}

/// Đóng góp (đã áp trần) của từng nhóm trước khi chuẩn hóa.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct RiskContributions {
    pub age: f64,
    pub vitals: f64,
    pub symptoms: f64,
    pub history: f64,
}

impl RiskContributions {
    pub fn total(&self) -> f64 {
        self.age + self.vitals + self.symptoms + self.history
    }
}

/// Kết quả phân tầng nguy cơ. Luôn có `0.0 <= risk_score <= 1.0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    pub factors: RiskFactors,
    pub contributions: RiskContributions,
    pub explanation: String,
    pub insufficient_data: bool,
}

/// Mức độ nghiêm trọng dùng chung cho bệnh, tương tác thuốc và vấn đề chất lượng.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Low,
}

/// Một chẩn đoán phân biệt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DifferentialEntry {
    pub condition: String,
    pub key: String,
    /// Mã ICD-10.
    pub code: String,
    pub matched_symptoms: Vec<String>,
    pub matched_vitals: Vec<Finding>,
    /// Điểm khớp thô, không bị điều chỉnh theo nhân khẩu học.
    pub match_score: f64,
    pub confidence_score: f64,
    /// Tín hiệu xếp hạng phụ: điểm khớp x tỷ lệ lưu hành x hệ số nhân khẩu học.
    pub adjusted_score: f64,
    pub severity: Severity,
    pub prevalence: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BodySystem {
    Cardiac,
    Respiratory,
    Infectious,
    Neurological,
    Renal,
    Metabolic,
}

/// Mức nguy cơ biến chứng, tăng dần.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

/// Dự báo một biến chứng tiềm ẩn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplicationPrediction {
    pub complication: String,
    pub key: String,
    pub system: BodySystem,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub risk_factors_present: Vec<String>,
    pub indicators_present: Vec<Finding>,
    pub prevention_strategies: Vec<String>,
    pub monitoring_recommendations: String,
}

/// Mức khẩn cấp cuối cùng, sắp xếp tăng dần: Green < Yellow < Orange < Red.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl UrgencyLevel {
    pub fn from_risk_category(category: RiskCategory) -> Self {
        match category {
            RiskCategory::Low => UrgencyLevel::Green,
            RiskCategory::Moderate => UrgencyLevel::Yellow,
            RiskCategory::High => UrgencyLevel::Orange,
            RiskCategory::Critical => UrgencyLevel::Red,
        }
    }

    /// Thứ tự ưu tiên: 1 là khẩn nhất.
    pub fn priority(self) -> u8 {
        match self {
            UrgencyLevel::Red => 1,
            UrgencyLevel::Orange => 2,
            UrgencyLevel::Yellow => 3,
            UrgencyLevel::Green => 4,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "green" | "minimal" | "low" => Some(UrgencyLevel::Green),
            "yellow" | "moderate" | "medium" => Some(UrgencyLevel::Yellow),
            "orange" | "high" => Some(UrgencyLevel::Orange),
            "red" | "critical" => Some(UrgencyLevel::Red),
            _ => None,
        }
    }
}

/// Tín hiệu độc lập có thể nâng mức khẩn cấp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EscalationSignal {
    RiskCategory,
    HighRiskComplication,
    CriticalSymptom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Escalation {
    pub signal: EscalationSignal,
    pub level: UrgencyLevel,
    pub detail: String,
}

/// Khuyến nghị cuối cùng của pipeline. Chỉ đọc với tầng trình bày.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalRecommendation {
    pub urgency_level: UrgencyLevel,
    pub priority: u8,
    pub recommended_action: String,
    pub next_steps: Vec<String>,
    /// Các tín hiệu đã quyết định mức khẩn cấp, theo thứ tự đánh giá.
    pub escalations: Vec<Escalation>,
    pub insufficient_data: bool,
    pub risk_assessment: RiskAssessment,
    pub vital_assessments: Vec<VitalAssessment>,
    pub symptom_profile: SymptomProfile,
    pub clinical_findings: ClinicalFindings,
    pub differential_diagnosis: Vec<DifferentialEntry>,
    pub complication_predictions: Vec<ComplicationPrediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<AdvisoryBundle>,
}
