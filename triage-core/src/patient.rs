use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::null_as_default;

/// Hồ sơ đầu vào của một yêu cầu triage. Không thay đổi sau khi tạo.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PatientRecord {
    #[serde(default, alias = "chief_complaint", deserialize_with = "null_as_default")]
    pub symptoms: Symptoms,
    #[serde(default, alias = "vital_signs", deserialize_with = "null_as_default")]
    pub vitals: Vitals,
    /// Số nguyên hoặc chuỗi số nguyên; số lẻ, số âm hay chữ đều bị từ chối.
    #[serde(default, deserialize_with = "lenient_age")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: Gender,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medical_history: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_medications: Vec<String>,
    /// Đường dẫn ảnh y khoa đã tải lên, chỉ được mang theo.
    #[serde(default)]
    pub image_path: Option<String>,
}

impl PatientRecord {
    /// Tuổi dùng cho phân tích; tuổi 0 được coi là chưa ghi nhận khi xét dữ liệu tối thiểu.
    pub fn known_age(&self) -> Option<u32> {
        self.age.filter(|age| *age > 0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AgeInput {
    Number(u32),
    Text(String),
}

fn lenient_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<AgeInput>::deserialize(deserializer) {
        Ok(None) => Ok(None),
        Ok(Some(AgeInput::Number(age))) => Ok(Some(age)),
        Ok(Some(AgeInput::Text(raw))) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("tuổi không hợp lệ: {raw:?}"))),
        Err(_) => Err(de::Error::custom(
            "tuổi phải là số nguyên không âm hoặc chuỗi số nguyên",
        )),
    }
}

/// Triệu chứng dạng văn bản tự do hoặc danh sách.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Symptoms {
    Text(String),
    List(Vec<String>),
}

impl Default for Symptoms {
    fn default() -> Self {
        Symptoms::Text(String::new())
    }
}

impl Symptoms {
    /// Văn bản chữ thường để so khớp từ khóa; danh sách được nối bằng dấu phẩy.
    pub fn normalized_text(&self) -> String {
        match self {
            Symptoms::Text(text) => text.trim().to_lowercase(),
            Symptoms::List(items) => items
                .iter()
                .map(|item| item.trim().to_lowercase())
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Symptoms::Text(text) => text.trim().is_empty(),
            Symptoms::List(items) => items.iter().all(|item| item.trim().is_empty()),
        }
    }
}

/// Giới tính, đọc không phân biệt hoa thường.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

impl Gender {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "male" | "m" | "man" => Gender::Male,
            "female" | "f" | "woman" => Gender::Female,
            "" | "unknown" => Gender::Unknown,
            _ => Gender::Other,
        }
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Gender::parse(&raw))
    }
}

/// Chỉ số sống như người dùng nhập, chưa chuẩn hóa.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Vitals {
    #[serde(default)]
    pub heart_rate: Option<Reading>,
    /// Dạng "tâm thu/tâm trương", ví dụ "120/80".
    #[serde(default)]
    pub blood_pressure: Option<Reading>,
    #[serde(default)]
    pub temperature: Option<Reading>,
    #[serde(default)]
    pub respiratory_rate: Option<Reading>,
    #[serde(default)]
    pub oxygen_saturation: Option<Reading>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.blood_pressure.is_none()
            && self.temperature.is_none()
            && self.respiratory_rate.is_none()
            && self.oxygen_saturation.is_none()
    }
}

/// Một giá trị đo: số hoặc chuỗi (có thể kèm đơn vị). Kiểu JSON khác (bool, mảng,
/// object) được giữ lại dưới dạng `Unreadable` để bước đánh giá đánh dấu là không hợp lệ.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
    Unreadable(String),
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ReadingVisitor)
    }
}

struct ReadingVisitor;

impl<'de> Visitor<'de> for ReadingVisitor {
    type Value = Reading;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a vital sign reading")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Reading, E> {
        Ok(Reading::Number(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Reading, E> {
        Ok(Reading::Number(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Reading, E> {
        Ok(Reading::Number(value as f64))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Reading, E> {
        Ok(Reading::Text(value.to_string()))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Reading, E> {
        Ok(Reading::Unreadable(value.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Reading, E> {
        Ok(Reading::Unreadable("null".to_string()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Reading, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Reading::Unreadable("[...]".to_string()))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Reading, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Reading::Unreadable("{...}".to_string()))
    }
}

impl Reading {
    pub fn display(&self) -> String {
        match self {
            Reading::Number(value) => {
                if value.fract() == 0.0 && value.is_finite() {
                    format!("{value:.0}")
                } else {
                    format!("{value}")
                }
            }
            Reading::Text(text) => text.trim().to_string(),
            Reading::Unreadable(raw) => raw.clone(),
        }
    }
}
