//! Kiểu dữ liệu lõi cho quy trình phân loại cấp cứu (triage).

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

mod advisory;
mod assessment;
mod patient;
mod task;

pub use advisory::*;
pub use assessment::*;
pub use patient::*;
pub use task::*;

/// Bộ lọc log mặc định khi biến môi trường `RUST_LOG` không được đặt.
pub fn default_log_filter() -> &'static str {
    "warn,triage_rules=info,triage_queue=info"
}

/// Cấu hình pipeline: ngưỡng phân tầng, trọng số và nguồn bộ luật.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TriageConfig {
    /// File JSON chứa bộ luật lâm sàng. `None` dùng bộ luật chuẩn dựng sẵn.
    pub catalog_path: Option<PathBuf>,
    /// Mô hình embedding cho tầng tra cứu hướng dẫn (không dùng khi chấm điểm).
    pub embedding_model_id: Option<String>,
    pub risk_thresholds: RiskThresholds,
    pub risk_weights: RiskWeights,
    /// Số chẩn đoán phân biệt tối đa trả về.
    pub max_differentials: usize,
    /// Điểm tối thiểu để một biến chứng xuất hiện trong kết quả.
    pub min_complication_score: f64,
    /// Có chạy các agent tư vấn (điều trị, theo dõi, thuốc, chuyên khoa, chất lượng) hay không.
    pub include_advisory: bool,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            embedding_model_id: None,
            risk_thresholds: RiskThresholds::default(),
            risk_weights: RiskWeights::default(),
            max_differentials: 5,
            min_complication_score: 0.1,
            include_advisory: true,
        }
    }
}

/// Các điểm cắt phân tầng nguy cơ, phải tăng dần trong khoảng (0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskThresholds {
    pub moderate: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.3,
            high: 0.6,
            critical: 0.8,
        }
    }
}

impl RiskThresholds {
    pub fn is_valid(&self) -> bool {
        0.0 < self.moderate
            && self.moderate < self.high
            && self.high < self.critical
            && self.critical <= 1.0
    }
}

/// Trọng số từng nhóm đóng góp vào điểm nguy cơ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskWeights {
    /// Trọng số cố định cho nhóm tuổi nguy cơ (< 5 hoặc > 65).
    pub age_max: f64,
    /// Trần tổng trọng số bất thường chỉ số sống.
    pub vitals_cap: f64,
    pub critical_symptom: f64,
    /// Trọng số cho mỗi cặp (nhóm, triệu chứng) khớp; triệu chứng thuộc nhiều nhóm được tính nhiều lần.
    pub categorized_symptom: f64,
    pub symptoms_cap: f64,
    pub history_item: f64,
    pub history_cap: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            age_max: 0.5,
            vitals_cap: 1.5,
            critical_symptom: 1.75,
            categorized_symptom: 0.25,
            symptoms_cap: 3.5,
            history_item: 0.25,
            history_cap: 0.5,
        }
    }
}

impl RiskWeights {
    /// Tổng trọng số tối đa, dùng làm mẫu số chuẩn hóa.
    pub fn max_total(&self) -> f64 {
        self.age_max + self.vitals_cap + self.symptoms_cap + self.history_cap
    }
}

/// Lỗi chung của lõi triage.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TriageError {
    #[error("Hồ sơ bệnh nhân không hợp lệ: {0}")]
    InvalidRecord(String),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Bộ luật lâm sàng không hợp lệ: {0}")]
    Catalog(String),
    #[error("Lỗi đọc file: {0}")]
    Io(String),
    #[error("Lỗi khác: {0}")]
    Other(String),
}

/// Giá trị `null` trong JSON được hiểu như giá trị mặc định.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
