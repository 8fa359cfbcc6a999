//! Bridge WASM <-> JavaScript cho pipeline triage, dùng bộ luật chuẩn dựng sẵn.

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use triage_core::{TriageConfig, TriageError};
use wasm_bindgen::prelude::*;

/// Cấu hình từ JS; trường nào có mặt sẽ ghi đè giá trị mặc định.
#[derive(Deserialize, Default)]
struct JsTriageConfig {
    #[serde(default)]
    max_differentials: Option<usize>,
    #[serde(default)]
    min_complication_score: Option<f64>,
    #[serde(default)]
    include_advisory: Option<bool>,
    #[serde(default)]
    moderate_threshold: Option<f64>,
    #[serde(default)]
    high_threshold: Option<f64>,
    #[serde(default)]
    critical_threshold: Option<f64>,
}

impl From<JsTriageConfig> for TriageConfig {
    fn from(cfg: JsTriageConfig) -> Self {
        let mut base = TriageConfig::default();
        if let Some(limit) = cfg.max_differentials {
            base.max_differentials = limit;
        }
        if let Some(score) = cfg.min_complication_score {
            base.min_complication_score = score;
        }
        if let Some(include) = cfg.include_advisory {
            base.include_advisory = include;
        }
        if let Some(moderate) = cfg.moderate_threshold {
            base.risk_thresholds.moderate = moderate;
        }
        if let Some(high) = cfg.high_threshold {
            base.risk_thresholds.high = high;
        }
        if let Some(critical) = cfg.critical_threshold {
            base.risk_thresholds.critical = critical;
        }
        base
    }
}

#[wasm_bindgen]
pub fn assess_patient(patient: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let patient_value = from_value::<serde_json::Value>(patient)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được hồ sơ bệnh nhân: {err}")))?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsTriageConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            TriageConfig::from(cfg)
        }
        None => TriageConfig::default(),
    };

    let recommendation = triage_rules::assess_patient_value(&patient_value, &cfg)
        .map_err(|err| JsValue::from_str(&format_triage_error(err)))?;

    to_value(&recommendation)
        .map_err(|err| JsValue::from_str(&format!("Không serialize khuyến nghị: {err}")))
}

fn format_triage_error(err: TriageError) -> String {
    format!("Triage error: {err}")
}
