//! Vital sign evaluation against age-appropriate normal ranges.

use triage_core::{
    Deviation, NormalRange, Reading, VitalAssessment, VitalKind, VitalStatus, Vitals,
};

use crate::catalog::RuleCatalog;
use crate::round3;

/// Fractional distance beyond a bound that earns the full severity weight.
const FULL_SEVERITY_DEVIATION: f64 = 0.25;

/// Temperatures above this are read as Fahrenheit.
const FAHRENHEIT_CUTOFF: f64 = 50.0;

/// Unit suffixes accepted after the number, lowercase. An empty suffix is always allowed.
fn accepted_units(kind: VitalKind) -> &'static [&'static str] {
    match kind {
        VitalKind::HeartRate => &["", "bpm", "/min", "beats/min"],
        VitalKind::SystolicBloodPressure | VitalKind::DiastolicBloodPressure => &["", "mmhg"],
        VitalKind::Temperature => &["", "c", "°c", "f", "°f"],
        VitalKind::RespiratoryRate => &["", "/min", "breaths/min", "rpm"],
        VitalKind::OxygenSaturation => &["", "%"],
    }
}

/// Evaluates every vital kind in a fixed order. Unrecorded vitals are reported as
/// `NotRecorded`, never as abnormal.
pub fn evaluate_vitals(
    vitals: &Vitals,
    age: Option<u32>,
    catalog: &RuleCatalog,
) -> Vec<VitalAssessment> {
    let range = |kind: VitalKind| {
        catalog.normal_range(kind, age).unwrap_or_else(|| {
            let (low, high) = plausible_bounds(kind);
            NormalRange::new(low, high)
        })
    };

    let [systolic, diastolic] = evaluate_blood_pressure(
        vitals.blood_pressure.as_ref(),
        range(VitalKind::SystolicBloodPressure),
        range(VitalKind::DiastolicBloodPressure),
    );

    vec![
        evaluate_reading(
            VitalKind::HeartRate,
            vitals.heart_rate.as_ref(),
            range(VitalKind::HeartRate),
        ),
        systolic,
        diastolic,
        evaluate_reading(
            VitalKind::Temperature,
            vitals.temperature.as_ref(),
            range(VitalKind::Temperature),
        ),
        evaluate_reading(
            VitalKind::RespiratoryRate,
            vitals.respiratory_rate.as_ref(),
            range(VitalKind::RespiratoryRate),
        ),
        evaluate_reading(
            VitalKind::OxygenSaturation,
            vitals.oxygen_saturation.as_ref(),
            range(VitalKind::OxygenSaturation),
        ),
    ]
}

fn evaluate_reading(
    kind: VitalKind,
    reading: Option<&Reading>,
    range: NormalRange,
) -> VitalAssessment {
    let Some(reading) = reading else {
        return not_recorded(kind, range);
    };

    let raw = reading.display();
    let parsed = match reading {
        Reading::Number(value) => Some((*value, String::new())),
        Reading::Text(text) => split_value(kind, text),
        Reading::Unreadable(_) => None,
    };
    let Some((value, unit)) = parsed.filter(|(value, _)| value.is_finite()) else {
        return invalid(kind, raw, range, "value could not be read as a number");
    };

    let value = if kind == VitalKind::Temperature
        && (unit.ends_with('f') || value > FAHRENHEIT_CUTOFF)
    {
        round1((value - 32.0) * 5.0 / 9.0)
    } else {
        value
    };

    if !is_plausible(kind, value) {
        return invalid(kind, raw, range, "value is outside the physiological range");
    }

    classify(kind, value, raw, range)
}

fn evaluate_blood_pressure(
    reading: Option<&Reading>,
    systolic_range: NormalRange,
    diastolic_range: NormalRange,
) -> [VitalAssessment; 2] {
    use VitalKind::{DiastolicBloodPressure as Diastolic, SystolicBloodPressure as Systolic};

    let Some(reading) = reading else {
        return [
            not_recorded(Systolic, systolic_range),
            not_recorded(Diastolic, diastolic_range),
        ];
    };

    let raw = reading.display();
    let both_invalid = |reason: &str| {
        [
            invalid(Systolic, raw.clone(), systolic_range, reason),
            invalid(Diastolic, raw.clone(), diastolic_range, reason),
        ]
    };

    let parsed = match reading {
        Reading::Text(text) => text.split_once('/').and_then(|(systolic, diastolic)| {
            Some((
                split_value(Systolic, systolic)?.0,
                split_value(Diastolic, diastolic)?.0,
            ))
        }),
        Reading::Number(_) | Reading::Unreadable(_) => None,
    };
    let Some((systolic, diastolic)) = parsed else {
        return both_invalid("expected systolic/diastolic, e.g. 120/80");
    };

    if !is_plausible(Systolic, systolic) || !is_plausible(Diastolic, diastolic) {
        return both_invalid("value is outside the physiological range");
    }
    if diastolic >= systolic {
        return both_invalid("diastolic pressure must be below systolic pressure");
    }

    [
        classify(Systolic, systolic, raw.clone(), systolic_range),
        classify(Diastolic, diastolic, raw, diastolic_range),
    ]
}

fn classify(kind: VitalKind, value: f64, display: String, range: NormalRange) -> VitalAssessment {
    let deviation = if value < range.low {
        Some(Deviation::Low)
    } else if value > range.high {
        Some(Deviation::High)
    } else {
        None
    };

    let (status, severity_weight, clinical_significance) = match deviation {
        None => (VitalStatus::Normal, 0.0, "Within normal range".to_string()),
        Some(direction) => {
            let bound = match direction {
                Deviation::Low => range.low,
                Deviation::High => range.high,
            };
            let side = match direction {
                Deviation::Low => "below",
                Deviation::High => "above",
            };
            (
                VitalStatus::Abnormal,
                deviation_weight(value, bound),
                format!(
                    "{}: {} {} {side} normal range {}-{}",
                    clinical_term(kind, direction),
                    format_value(value),
                    kind.unit(),
                    format_value(range.low),
                    format_value(range.high),
                ),
            )
        }
    };

    VitalAssessment {
        vital: kind,
        value: Some(value),
        display: Some(display),
        unit: kind.unit().to_string(),
        normal_range: range,
        status,
        deviation,
        severity_weight,
        clinical_significance,
    }
}

/// Linear in the fractional distance past the bound, clamped to 1.
fn deviation_weight(value: f64, bound: f64) -> f64 {
    if bound <= 0.0 {
        return 1.0;
    }
    let fraction = (value - bound).abs() / bound;
    round3((fraction / FULL_SEVERITY_DEVIATION).min(1.0))
}

fn not_recorded(kind: VitalKind, range: NormalRange) -> VitalAssessment {
    VitalAssessment {
        vital: kind,
        value: None,
        display: None,
        unit: kind.unit().to_string(),
        normal_range: range,
        status: VitalStatus::NotRecorded,
        deviation: None,
        severity_weight: 0.0,
        clinical_significance: "Not recorded".to_string(),
    }
}

fn invalid(kind: VitalKind, raw: String, range: NormalRange, reason: &str) -> VitalAssessment {
    tracing::warn!(vital = kind.label(), value = %raw, reason, "invalid vital sign");
    VitalAssessment {
        vital: kind,
        value: None,
        clinical_significance: format!("Invalid reading '{raw}': {reason}"),
        display: Some(raw),
        unit: kind.unit().to_string(),
        normal_range: range,
        status: VitalStatus::Invalid,
        deviation: None,
        severity_weight: 0.0,
    }
}

/// Splits "110 bpm" into the number and a lowercase unit. Units foreign to `kind` are rejected.
fn split_value(kind: VitalKind, text: &str) -> Option<(f64, String)> {
    let text = text.trim().to_lowercase();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value = number.parse::<f64>().ok()?;
    let unit = unit.trim();
    accepted_units(kind)
        .contains(&unit)
        .then(|| (value, unit.to_string()))
}

fn plausible_bounds(kind: VitalKind) -> (f64, f64) {
    match kind {
        VitalKind::HeartRate => (1.0, 300.0),
        VitalKind::SystolicBloodPressure => (30.0, 300.0),
        VitalKind::DiastolicBloodPressure => (10.0, 200.0),
        VitalKind::Temperature => (25.0, 45.0),
        VitalKind::RespiratoryRate => (1.0, 80.0),
        VitalKind::OxygenSaturation => (30.0, 100.0),
    }
}

fn is_plausible(kind: VitalKind, value: f64) -> bool {
    let (low, high) = plausible_bounds(kind);
    value >= low && value <= high
}

fn clinical_term(kind: VitalKind, direction: Deviation) -> &'static str {
    match (kind, direction) {
        (VitalKind::HeartRate, Deviation::High) => "Tachycardia",
        (VitalKind::HeartRate, Deviation::Low) => "Bradycardia",
        (VitalKind::SystolicBloodPressure, Deviation::High) => "Elevated systolic pressure",
        (VitalKind::SystolicBloodPressure, Deviation::Low) => "Hypotension",
        (VitalKind::DiastolicBloodPressure, Deviation::High) => "Elevated diastolic pressure",
        (VitalKind::DiastolicBloodPressure, Deviation::Low) => "Low diastolic pressure",
        (VitalKind::Temperature, Deviation::High) => "Fever",
        (VitalKind::Temperature, Deviation::Low) => "Hypothermia",
        (VitalKind::RespiratoryRate, Deviation::High) => "Tachypnea",
        (VitalKind::RespiratoryRate, Deviation::Low) => "Bradypnea",
        (VitalKind::OxygenSaturation, Deviation::Low) => "Hypoxemia",
        (VitalKind::OxygenSaturation, Deviation::High) => "Oxygen saturation above range",
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> RuleCatalog {
        RuleCatalog::standard().unwrap()
    }

    fn text(value: &str) -> Option<Reading> {
        Some(Reading::Text(value.to_string()))
    }

    fn find(assessments: &[VitalAssessment], kind: VitalKind) -> &VitalAssessment {
        assessments.iter().find(|a| a.vital == kind).unwrap()
    }

    #[test]
    fn tachycardia_weight_scales_with_distance_past_bound() {
        let vitals = Vitals {
            heart_rate: text("110"),
            ..Vitals::default()
        };
        let assessments = evaluate_vitals(&vitals, Some(58), &catalog());
        let heart_rate = find(&assessments, VitalKind::HeartRate);

        assert_eq!(heart_rate.status, VitalStatus::Abnormal);
        assert_eq!(heart_rate.deviation, Some(Deviation::High));
        assert!((heart_rate.severity_weight - 0.4).abs() < 1e-9);
        assert!(heart_rate.clinical_significance.starts_with("Tachycardia"));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let vitals = Vitals {
            blood_pressure: text("140/90"),
            temperature: Some(Reading::Number(38.0)),
            ..Vitals::default()
        };
        let assessments = evaluate_vitals(&vitals, Some(40), &catalog());
        for kind in [
            VitalKind::SystolicBloodPressure,
            VitalKind::DiastolicBloodPressure,
            VitalKind::Temperature,
        ] {
            assert_eq!(find(&assessments, kind).status, VitalStatus::Normal, "{kind:?}");
        }
    }

    #[test]
    fn missing_vitals_are_not_recorded() {
        let assessments = evaluate_vitals(&Vitals::default(), None, &catalog());
        assert_eq!(assessments.len(), 6);
        assert!(assessments
            .iter()
            .all(|a| a.status == VitalStatus::NotRecorded && a.severity_weight == 0.0));
    }

    #[test]
    fn unreadable_and_implausible_values_are_invalid() {
        let vitals = Vitals {
            heart_rate: text("fast"),
            blood_pressure: text("80/120"),
            respiratory_rate: Some(Reading::Number(400.0)),
            oxygen_saturation: text("97 furlongs"),
            ..Vitals::default()
        };
        let assessments = evaluate_vitals(&vitals, Some(30), &catalog());

        for kind in [
            VitalKind::HeartRate,
            VitalKind::SystolicBloodPressure,
            VitalKind::DiastolicBloodPressure,
            VitalKind::RespiratoryRate,
            VitalKind::OxygenSaturation,
        ] {
            let assessment = find(&assessments, kind);
            assert_eq!(assessment.status, VitalStatus::Invalid, "{kind:?}");
            assert_eq!(assessment.severity_weight, 0.0);
            assert!(assessment.display.is_some());
        }
    }

    #[test]
    fn fahrenheit_temperatures_are_converted() {
        let vitals = Vitals {
            temperature: text("102.2 F"),
            ..Vitals::default()
        };
        let assessments = evaluate_vitals(&vitals, Some(30), &catalog());
        let temperature = find(&assessments, VitalKind::Temperature);
        assert_eq!(temperature.value, Some(39.0));
        assert_eq!(temperature.deviation, Some(Deviation::High));

        let bare = Vitals {
            temperature: Some(Reading::Number(98.6)),
            ..Vitals::default()
        };
        let assessments = evaluate_vitals(&bare, Some(30), &catalog());
        assert_eq!(find(&assessments, VitalKind::Temperature).value, Some(37.0));
    }

    #[test]
    fn units_are_accepted() {
        let vitals = Vitals {
            heart_rate: text("72 bpm"),
            blood_pressure: text("118/76 mmHg"),
            oxygen_saturation: text("98%"),
            ..Vitals::default()
        };
        let assessments = evaluate_vitals(&vitals, Some(30), &catalog());
        assert_eq!(find(&assessments, VitalKind::HeartRate).value, Some(72.0));
        assert_eq!(find(&assessments, VitalKind::DiastolicBloodPressure).value, Some(76.0));
        assert_eq!(find(&assessments, VitalKind::OxygenSaturation).status, VitalStatus::Normal);
    }

    #[test]
    fn units_of_another_vital_are_rejected() {
        let vitals = Vitals {
            heart_rate: text("72 %"),
            temperature: text("37 mmHg"),
            oxygen_saturation: text("98 bpm"),
            respiratory_rate: text("16 breaths/min"),
            ..Vitals::default()
        };
        let assessments = evaluate_vitals(&vitals, Some(30), &catalog());
        for kind in [
            VitalKind::HeartRate,
            VitalKind::Temperature,
            VitalKind::OxygenSaturation,
        ] {
            assert_eq!(find(&assessments, kind).status, VitalStatus::Invalid, "{kind:?}");
        }
        assert_eq!(find(&assessments, VitalKind::RespiratoryRate).value, Some(16.0));
    }

    #[test]
    fn non_scalar_reading_is_invalid() {
        let vitals = Vitals {
            heart_rate: Some(Reading::Unreadable("true".into())),
            blood_pressure: Some(Reading::Unreadable("{...}".into())),
            ..Vitals::default()
        };
        let assessments = evaluate_vitals(&vitals, Some(30), &catalog());
        for kind in [
            VitalKind::HeartRate,
            VitalKind::SystolicBloodPressure,
            VitalKind::DiastolicBloodPressure,
        ] {
            let assessment = find(&assessments, kind);
            assert_eq!(assessment.status, VitalStatus::Invalid, "{kind:?}");
            assert_eq!(assessment.severity_weight, 0.0);
        }
    }

    #[test]
    fn child_heart_rate_uses_pediatric_range() {
        let vitals = Vitals {
            heart_rate: Some(Reading::Number(115.0)),
            ..Vitals::default()
        };
        let child = evaluate_vitals(&vitals, Some(6), &catalog());
        let adult = evaluate_vitals(&vitals, Some(30), &catalog());
        assert_eq!(find(&child, VitalKind::HeartRate).status, VitalStatus::Normal);
        assert_eq!(find(&adult, VitalKind::HeartRate).status, VitalStatus::Abnormal);
    }

    #[test]
    fn severity_weight_saturates() {
        let vitals = Vitals {
            oxygen_saturation: Some(Reading::Number(60.0)),
            ..Vitals::default()
        };
        let assessments = evaluate_vitals(&vitals, Some(30), &catalog());
        assert_eq!(find(&assessments, VitalKind::OxygenSaturation).severity_weight, 1.0);
    }
}
